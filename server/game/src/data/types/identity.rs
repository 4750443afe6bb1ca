use uuid::Uuid;

use crate::data::*;

/// The name and skin a client renders for a player entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityData {
    pub uuid: Uuid,
    pub name: String,
    pub skin: Option<TextureBlob>,
}

impl IdentityData {
    pub fn new(uuid: Uuid, name: impl Into<String>, skin: Option<TextureBlob>) -> Self {
        Self {
            uuid,
            name: name.into(),
            skin,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum GameMode {
    #[default]
    Survival = 0,
    Creative = 1,
    Adventure = 2,
    Spectator = 3,
}

encode_impl!(GameMode, buf, self, buf.write_var_int(*self as i32));

decode_impl!(GameMode, buf, {
    match buf.read_var_int()? {
        0 => Ok(Self::Survival),
        1 => Ok(Self::Creative),
        2 => Ok(Self::Adventure),
        3 => Ok(Self::Spectator),
        _ => Err(DecodeError::InvalidEnumValue),
    }
});
