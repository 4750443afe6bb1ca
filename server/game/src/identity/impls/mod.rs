//! One identity adapter per supported protocol revision. They share no state, only the
//! helpers below for picking the announced skin.

/*
* every revision module is a single invocation:
* identity_adapter!(wire module under crate::data, display name type, doc)
*
* the wire module provides `REVISION`, `DisplayName` and the two player info packets.
*/

macro_rules! identity_adapter {
    ($wire:ident, $text:ident, $doc:literal) => {
        use super::*;
        use crate::data::$wire as wire;

        #[doc = $doc]
        #[derive(Debug)]
        pub struct Adapter {
            require_signed: bool,
        }

        impl Adapter {
            pub fn new(require_signed: bool) -> Self {
                Self { require_signed }
            }

            fn encode(
                player: &PlayerHandle,
                name: String,
                properties: Vec<ProfileProperty>,
                display_name: Option<wire::DisplayName>,
            ) -> EncodedPacket {
                EncodedPacket::new(wire::REVISION)
                    .with(&wire::PlayerInfoRemovePacket {
                        uuids: vec![player.uuid()],
                    })
                    .with(&wire::PlayerInfoUpdatePacket {
                        actions: identity_actions(),
                        entries: vec![identity_entry(player, name, properties, display_name)],
                    })
            }
        }

        impl IdentityAdapter for Adapter {
            fn revision(&self) -> ProtocolRevision {
                wire::REVISION
            }

            fn requires_signed_textures(&self) -> bool {
                self.require_signed
            }

            fn build_identity_packet(&self, player: &PlayerHandle, profile: &CharacterProfile) -> IdentityResult<EncodedPacket> {
                let properties = profile_properties(player, profile, self.require_signed)?;
                let display_name = $text(profile.display_name.clone());
                Ok(Self::encode(player, profile.wire_name(), properties, Some(display_name)))
            }

            fn build_default_packet(&self, player: &PlayerHandle) -> EncodedPacket {
                Self::encode(player, player.original.name.clone(), original_properties(player), None)
            }
        }
    };
}

pub mod v1_20_r1;
pub mod v1_20_r2;
pub mod v1_20_r3;
pub mod v1_20_r4;
pub mod v1_21_r1;

use std::sync::Arc;

use super::{IdentityAdapter, IdentityError, IdentityResult, PlayerHandle};
use crate::data::*;

/// Create the adapter for `revision`. `require_signed` decides whether unsigned textures are refused.
pub fn create_adapter(revision: ProtocolRevision, require_signed: bool) -> Arc<dyn IdentityAdapter> {
    match revision {
        ProtocolRevision::V1_20_R1 => Arc::new(v1_20_r1::Adapter::new(require_signed)),
        ProtocolRevision::V1_20_R2 => Arc::new(v1_20_r2::Adapter::new(require_signed)),
        ProtocolRevision::V1_20_R3 => Arc::new(v1_20_r3::Adapter::new(require_signed)),
        ProtocolRevision::V1_20_R4 => Arc::new(v1_20_r4::Adapter::new(require_signed)),
        ProtocolRevision::V1_21_R1 => Arc::new(v1_21_r1::Adapter::new(require_signed)),
    }
}

/// Properties of the skin the player logged in with.
fn original_properties(player: &PlayerHandle) -> Vec<ProfileProperty> {
    player.original.skin.iter().map(TextureBlob::to_property).collect()
}

/// Properties announcing the profile's texture, or the original skin if it has none.
fn profile_properties(player: &PlayerHandle, profile: &CharacterProfile, require_signed: bool) -> IdentityResult<Vec<ProfileProperty>> {
    match profile.texture.as_ref() {
        Some(texture) if require_signed && !texture.is_signed() => Err(IdentityError::UnsignedTexture),
        Some(texture) => Ok(vec![texture.to_property()]),
        None => Ok(original_properties(player)),
    }
}

fn identity_entry<D>(player: &PlayerHandle, name: String, properties: Vec<ProfileProperty>, display_name: Option<D>) -> PlayerInfoEntry<D> {
    PlayerInfoEntry {
        uuid: player.uuid(),
        name,
        properties,
        game_mode: player.game_mode,
        listed: player.listed,
        latency: player.latency,
        display_name,
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn player() -> PlayerHandle {
        let original = IdentityData::new(Uuid::from_u64_pair(7, 7), "Steve", Some(TextureBlob::signed("b3JpZ2luYWw=", "b3NpZw==")));
        PlayerHandle::new(12, original)
    }

    fn profile(texture: Option<TextureBlob>) -> CharacterProfile {
        let mut profile = CharacterProfile::new(Uuid::from_u64_pair(7, 7), "Sir Alice", 0);
        profile.texture = texture;
        profile
    }

    fn frame_ids(packet: &EncodedPacket) -> Vec<PacketId> {
        packet.frames.iter().map(|f| f.split().unwrap().0).collect()
    }

    #[test]
    fn packet_ids_per_revision() {
        let expected = [
            (ProtocolRevision::V1_20_R1, [0x39, 0x3a]),
            (ProtocolRevision::V1_20_R2, [0x3b, 0x3c]),
            (ProtocolRevision::V1_20_R3, [0x3b, 0x3c]),
            (ProtocolRevision::V1_20_R4, [0x3d, 0x3e]),
            (ProtocolRevision::V1_21_R1, [0x3d, 0x3e]),
        ];

        for (revision, ids) in expected {
            let adapter = create_adapter(revision, false);
            assert_eq!(adapter.revision(), revision);

            let packet = adapter.build_identity_packet(&player(), &profile(None)).unwrap();
            assert_eq!(packet.revision, revision);
            assert_eq!(frame_ids(&packet), ids, "wrong ids for {revision}");
        }
    }

    #[test]
    fn json_display_name_before_r3() {
        let adapter = create_adapter(ProtocolRevision::V1_20_R2, false);
        let packet = adapter.build_identity_packet(&player(), &profile(None)).unwrap();

        let (_, body) = packet.frames[1].split().unwrap();
        let mut reader = ByteReader::from_bytes(&body);
        let update = reader.read_value::<crate::data::v1_20_r2::PlayerInfoUpdatePacket>().unwrap();

        let entry = &update.entries[0];
        assert_eq!(entry.name, "Sir_Alice");
        assert_eq!(entry.display_name, Some(JsonText("Sir Alice".to_owned())));
        // no texture, so the original skin is announced
        assert_eq!(entry.properties[0].value, "b3JpZ2luYWw=");
    }

    #[test]
    fn nbt_display_name_keeps_signature() {
        let adapter = create_adapter(ProtocolRevision::V1_21_R1, true);
        let texture = TextureBlob::signed("bmV3", "c2lnbmF0dXJl/+==");
        let packet = adapter.build_identity_packet(&player(), &profile(Some(texture))).unwrap();

        let (_, body) = packet.frames[1].split().unwrap();
        let mut reader = ByteReader::from_bytes(&body);
        let update = reader.read_value::<crate::data::v1_21_r1::PlayerInfoUpdatePacket>().unwrap();

        let entry = &update.entries[0];
        assert_eq!(entry.uuid, Uuid::from_u64_pair(7, 7));
        assert_eq!(entry.display_name, Some(NbtText("Sir Alice".to_owned())));
        assert_eq!(entry.properties[0].signature.as_deref(), Some("c2lnbmF0dXJl/+=="));
    }

    #[test]
    fn unsigned_texture_only_rejected_when_required() {
        let unsigned = profile(Some(TextureBlob::unsigned("bmV3")));

        let strict = create_adapter(ProtocolRevision::V1_20_R4, true);
        assert_eq!(
            strict.build_identity_packet(&player(), &unsigned).unwrap_err(),
            IdentityError::UnsignedTexture
        );
        assert!(strict.build_identity_packet(&player(), &unsigned.without_texture()).is_ok());

        let lenient = create_adapter(ProtocolRevision::V1_20_R3, false);
        assert!(lenient.build_identity_packet(&player(), &unsigned).is_ok());
    }

    #[test]
    fn default_packet_uses_original_identity() {
        let adapter = create_adapter(ProtocolRevision::V1_20_R3, false);
        let packet = adapter.build_default_packet(&player());

        let (_, body) = packet.frames[1].split().unwrap();
        let mut reader = ByteReader::from_bytes(&body);
        let update = reader.read_value::<crate::data::v1_20_r3::PlayerInfoUpdatePacket>().unwrap();

        assert_eq!(update.entries[0].name, "Steve");
        assert_eq!(update.entries[0].display_name, None);
        assert_eq!(update.entries[0].properties[0].signature.as_deref(), Some("b3NpZw=="));
    }
}
