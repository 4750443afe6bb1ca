use uuid::Uuid;

use crate::data::*;

/// Chat component encoding used for display names.
pub type DisplayName = NbtText;

packet!(PlayerInfoRemovePacket, 0x3D, {
    uuids: Vec<Uuid>,
});

encode_impl!(PlayerInfoRemovePacket, buf, self, buf.write_value_vec(&self.uuids));
decode_impl!(PlayerInfoRemovePacket, buf, Ok(Self { uuids: buf.read_value_vec()? }));

packet!(PlayerInfoUpdatePacket, 0x3E, {
    actions: PlayerInfoActions,
    entries: Vec<PlayerInfoEntry<DisplayName>>,
});

encode_impl!(PlayerInfoUpdatePacket, buf, self, write_player_info_update(buf, &self.actions, &self.entries));

decode_impl!(PlayerInfoUpdatePacket, buf, {
    let (actions, entries) = read_player_info_update(buf)?;
    Ok(Self { actions, entries })
});
