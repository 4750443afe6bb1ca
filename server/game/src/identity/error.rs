use std::fmt::Display;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    UnsignedTexture,             // the texture has no signature but the revision requires one
    UnsupportedRevision(String), // the running server version has no adapter
    DeliveryFailed(Uuid),        // packets could not be delivered to this observer
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsignedTexture => f.write_str("texture is not signed, but this server version requires signed textures"),
            Self::UnsupportedRevision(version) => write!(f, "unsupported server version: {version}"),
            Self::DeliveryFailed(observer) => write!(f, "failed to deliver identity packets to {observer}"),
        }
    }
}

impl std::error::Error for IdentityError {}

/// Why a frame could not be handed to a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    Closed,
    QueueFull,
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => f.write_str("connection closed"),
            Self::QueueFull => f.write_str("outgoing queue is full"),
        }
    }
}

impl std::error::Error for DeliveryError {}
