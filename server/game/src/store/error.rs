use std::{error::Error, fmt::Display};

use crate::data::ProfileId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateName(String),      // the owner already has a profile with this name
    InvalidName(String),        // name is empty, too long or has disallowed characters
    ProfileNotFound(ProfileId), // no such profile, or it belongs to someone else
    ProfileLimitReached(usize), // the owner already has the maximum amount of profiles
    Storage(String),            // backend failed to load or save
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "a profile named \"{name}\" already exists"),
            Self::InvalidName(name) => write!(
                f,
                "invalid profile name \"{name}\": must be 1-16 letters, digits, underscores or spaces"
            ),
            Self::ProfileNotFound(id) => write!(f, "profile {id} not found"),
            Self::ProfileLimitReached(limit) => write!(f, "profile limit reached (at most {limit} profiles)"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl Error for StoreError {}
