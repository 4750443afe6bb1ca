mod character;
mod context;
mod error;
mod player;

pub use character::{CharacterManager, CharacterResult, CompletedSwitch, ResolutionCompletion, SwitchOutcome};
pub use context::{CONTEXT_KEY, DEFAULT_CONTEXT_VALUE, PermissionContext};
pub use error::CharacterError;
pub use player::{DEFAULT_WORLD, OnlinePlayer, PlayerManager};
