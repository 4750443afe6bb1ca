use std::fmt::Display;

use crate::data::ProfileId;

pub const CONTEXT_KEY: &str = "profile";
pub const DEFAULT_CONTEXT_VALUE: &str = "default";

/// Key/value pair a permission system can use to scope permissions to the active profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionContext {
    pub key: &'static str,
    pub value: String,
}

impl PermissionContext {
    pub fn for_active(active: Option<ProfileId>) -> Self {
        Self {
            key: CONTEXT_KEY,
            value: active.map_or_else(|| DEFAULT_CONTEXT_VALUE.to_owned(), |id| id.to_string()),
        }
    }

    pub fn is_default(&self) -> bool {
        self.value == DEFAULT_CONTEXT_VALUE
    }
}

impl Display for PermissionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
