pub mod identity;
pub mod player_info;
pub mod profile;
pub mod revision;
pub mod text;
pub mod texture;

pub use esp::types::*;
pub use identity::*;
pub use player_info::*;
pub use profile::*;
pub use revision::*;
pub use text::*;
pub use texture::*;
