/// maximum characters in a profile's display name, same as the limit of a game profile name (16)
pub const MAX_DISPLAY_NAME_LEN: usize = 16;
/// maximum length of a game profile property name (64)
pub const MAX_PROPERTY_NAME_LEN: usize = 64;
/// maximum length of a signature in a game profile property (1024)
pub const MAX_PROPERTY_SIGNATURE_LEN: usize = 1024;
/// name of the game profile property that carries skin and cape data
pub const TEXTURES_PROPERTY: &str = "textures";
