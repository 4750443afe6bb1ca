use std::{error::Error, fmt::Display};

use crate::{data::OwnerId, identity::IdentityError, store::StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterError {
    FeatureDisabled,         // no identity adapter for this server version
    PlayerOffline(OwnerId),  // the owner is not connected
    AlreadyOnline(OwnerId),  // a second connection for an owner that is connected
    Store(StoreError),       // profile lookup or update failed
    Identity(IdentityError), // identity packet could not be built
}

impl Display for CharacterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FeatureDisabled => f.write_str("character profiles are disabled on this server version"),
            Self::PlayerOffline(owner) => write!(f, "player {owner} is not online"),
            Self::AlreadyOnline(owner) => write!(f, "player {owner} is already online"),
            Self::Store(err) => Display::fmt(err, f),
            Self::Identity(err) => Display::fmt(err, f),
        }
    }
}

impl From<StoreError> for CharacterError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<IdentityError> for CharacterError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl Error for CharacterError {}
