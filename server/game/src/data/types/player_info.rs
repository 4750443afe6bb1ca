use uuid::Uuid;

use crate::data::*;

/// Which fields are present in every entry of a player info update.
pub type PlayerInfoActions = FixedBitSet<6>;

pub const ACTION_ADD_PLAYER: usize = 0;
pub const ACTION_INITIALIZE_CHAT: usize = 1;
pub const ACTION_UPDATE_GAME_MODE: usize = 2;
pub const ACTION_UPDATE_LISTED: usize = 3;
pub const ACTION_UPDATE_LATENCY: usize = 4;
pub const ACTION_UPDATE_DISPLAY_NAME: usize = 5;

/// The actions we send when (re)announcing a player: everything except chat session data.
pub fn identity_actions() -> PlayerInfoActions {
    let mut actions = PlayerInfoActions::new();
    actions.set_bit(ACTION_ADD_PLAYER);
    actions.set_bit(ACTION_UPDATE_GAME_MODE);
    actions.set_bit(ACTION_UPDATE_LISTED);
    actions.set_bit(ACTION_UPDATE_LATENCY);
    actions.set_bit(ACTION_UPDATE_DISPLAY_NAME);
    actions
}

/// One player in a player info update. `D` is the chat component encoding of the revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerInfoEntry<D> {
    pub uuid: Uuid,
    pub name: String,
    pub properties: Vec<ProfileProperty>,
    pub game_mode: GameMode,
    pub listed: bool,
    pub latency: i32,
    pub display_name: Option<D>,
}

impl<D: Encodable> PlayerInfoEntry<D> {
    pub fn write(&self, buf: &mut ByteBuffer, actions: &PlayerInfoActions) {
        buf.write_value(&self.uuid);

        for action in actions.iter_set() {
            match action {
                ACTION_ADD_PLAYER => {
                    buf.write_prefixed_str(&self.name);
                    buf.write_value_vec(&self.properties);
                }
                // no chat session
                ACTION_INITIALIZE_CHAT => buf.write_bool(false),
                ACTION_UPDATE_GAME_MODE => buf.write_value(&self.game_mode),
                ACTION_UPDATE_LISTED => buf.write_bool(self.listed),
                ACTION_UPDATE_LATENCY => buf.write_var_int(self.latency),
                ACTION_UPDATE_DISPLAY_NAME => buf.write_optional_value(self.display_name.as_ref()),
                _ => unreachable!(),
            }
        }
    }
}

impl<D: Decodable> PlayerInfoEntry<D> {
    pub fn read(buf: &mut ByteReader, actions: &PlayerInfoActions) -> DecodeResult<Self> {
        let mut entry = Self {
            uuid: buf.read_value()?,
            name: String::new(),
            properties: Vec::new(),
            game_mode: GameMode::default(),
            listed: false,
            latency: 0,
            display_name: None,
        };

        for action in actions.iter_set() {
            match action {
                ACTION_ADD_PLAYER => {
                    entry.name = buf.read_prefixed_str(MAX_DISPLAY_NAME_LEN)?;
                    entry.properties = buf.read_value_vec()?;
                }
                ACTION_INITIALIZE_CHAT => {
                    if buf.read_bool()? {
                        return Err(DecodeError::InvalidEnumValue);
                    }
                }
                ACTION_UPDATE_GAME_MODE => entry.game_mode = buf.read_value()?,
                ACTION_UPDATE_LISTED => entry.listed = buf.read_bool()?,
                ACTION_UPDATE_LATENCY => entry.latency = buf.read_var_int()?,
                ACTION_UPDATE_DISPLAY_NAME => entry.display_name = buf.read_optional_value()?,
                _ => unreachable!(),
            }
        }

        Ok(entry)
    }
}

/// Body of a player info update packet, identical across revisions apart from the display name encoding.
pub fn write_player_info_update<D: Encodable>(buf: &mut ByteBuffer, actions: &PlayerInfoActions, entries: &[PlayerInfoEntry<D>]) {
    buf.write_value(actions);
    buf.write_var_int(entries.len() as i32);
    for entry in entries {
        entry.write(buf, actions);
    }
}

pub fn read_player_info_update<D: Decodable>(buf: &mut ByteReader) -> DecodeResult<(PlayerInfoActions, Vec<PlayerInfoEntry<D>>)> {
    let actions = buf.read_value::<PlayerInfoActions>()?;
    let count = usize::try_from(buf.read_var_int()?).map_err(|_| DecodeError::NotEnoughData)?;

    let mut entries = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        entries.push(PlayerInfoEntry::read(buf, &actions)?);
    }

    Ok((actions, entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> PlayerInfoEntry<NbtText> {
        PlayerInfoEntry {
            uuid: Uuid::from_u64_pair(1, 2),
            name: "Alice".to_owned(),
            properties: vec![TextureBlob::signed("dmFsdWU=", "c2ln").to_property()],
            game_mode: GameMode::Creative,
            listed: true,
            latency: 42,
            display_name: Some(NbtText("Alice".to_owned())),
        }
    }

    #[test]
    fn identity_actions_bits() {
        let mut buf = ByteBuffer::new();
        buf.write_value(&identity_actions());
        assert_eq!(buf.as_bytes(), &[0b0011_1101]);
    }

    #[test]
    fn entry_layout_follows_actions() {
        let actions = identity_actions();
        let mut buf = ByteBuffer::new();
        write_player_info_update(&mut buf, &actions, &[entry()]);

        let mut reader = ByteReader::from_bytes(buf.as_bytes());
        let (read_actions, entries) = read_player_info_update::<NbtText>(&mut reader).unwrap();
        assert_eq!(read_actions, actions);
        assert_eq!(entries, vec![entry()]);
        assert_eq!(reader.get_rpos(), buf.len());
    }

    #[test]
    fn chat_session_is_empty() {
        let mut actions = PlayerInfoActions::new();
        actions.set_bit(ACTION_INITIALIZE_CHAT);

        let mut buf = ByteBuffer::new();
        entry().write(&mut buf, &actions);
        // uuid followed by a single `false`
        assert_eq!(buf.len(), 17);
        assert_eq!(buf.as_bytes()[16], 0);
    }
}
