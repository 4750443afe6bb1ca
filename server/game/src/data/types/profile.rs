use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::{MAX_DISPLAY_NAME_LEN, TextureBlob};

/// Account id of the player that owns a set of profiles.
pub type OwnerId = Uuid;
/// Unique, immutable id of a single character profile.
pub type ProfileId = Uuid;

/// A named, persisted identity owned by a player account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub profile_id: ProfileId,
    pub owner_id: OwnerId,
    pub display_name: String,
    /// player name or uuid the skin is resolved from, `None` means the owner's own skin
    #[serde(default)]
    pub skin_reference: Option<String>,
    /// `None` until the skin reference is resolved for the first time
    #[serde(default)]
    pub texture: Option<TextureBlob>,
    pub created_at: i64, // seconds since unix epoch
    #[serde(default)]
    pub last_activated_at: Option<i64>,
}

impl CharacterProfile {
    pub fn new(owner_id: OwnerId, display_name: &str, created_at: i64) -> Self {
        Self {
            profile_id: Uuid::new_v4(),
            owner_id,
            display_name: display_name.to_owned(),
            skin_reference: None,
            texture: None,
            created_at,
            last_activated_at: None,
        }
    }

    #[inline]
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// The name as it is sent in the game profile, spaces are not permitted there.
    pub fn wire_name(&self) -> String {
        self.display_name.replace(' ', "_")
    }

    /// 16 hex characters derived from the profile id, for systems that key users by a short name.
    pub fn internal_username(&self) -> String {
        let mut simple = self.profile_id.simple().to_string();
        simple.truncate(16);
        simple
    }

    /// Copy of this profile with the texture stripped, the owner's original skin gets used in its place.
    #[must_use]
    pub fn without_texture(&self) -> Self {
        Self {
            texture: None,
            ..self.clone()
        }
    }
}

/// Whether `name` can be used as a display name: 1 to 16 ASCII letters, digits, underscores or spaces,
/// not starting or ending with a space.
pub fn is_valid_display_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_DISPLAY_NAME_LEN
        && !name.starts_with(' ')
        && !name.ends_with(' ')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_rules() {
        assert!(is_valid_display_name("Alice"));
        assert!(is_valid_display_name("Sir Lancelot_2"));
        assert!(!is_valid_display_name(""));
        assert!(!is_valid_display_name(" Alice"));
        assert!(!is_valid_display_name("ThisNameIsWayTooLong"));
        assert!(!is_valid_display_name("Ålice"));
        assert!(!is_valid_display_name("a-b"));
    }

    #[test]
    fn wire_name_and_internal_username() {
        let mut profile = CharacterProfile::new(Uuid::new_v4(), "Sir Lancelot", 0);
        profile.profile_id = Uuid::parse_str("0f3c2b1a-9d8e-4f70-8a6b-5c4d3e2f1a0b").unwrap();

        assert_eq!(profile.wire_name(), "Sir_Lancelot");
        assert_eq!(profile.internal_username(), "0f3c2b1a9d8e4f70");
    }
}
