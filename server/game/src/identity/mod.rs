//! Identity adapters turn a character profile into the packets that make observing clients render a player
//! under a different name and skin.
//!
//! The packets differ between protocol revisions (packet ids, the chat component encoding of the display name,
//! whether unsigned textures are accepted), so every supported revision has its own implementation in `impls`.
//! Exactly one of them is used per process, picked by the `AdapterRegistry` from the reported server version:
//!
//! ```rust,ignore
//! let registry = AdapterRegistry::new(FxHashMap::default());
//! let adapter = registry.bind("git-Paper-496 (MC: 1.20.4)")?;
//!
//! let packet = adapter.build_identity_packet(&player, &profile)?;
//! let report = adapter.broadcast(&player, &packet, &observers);
//! ```

use std::{fmt, sync::Arc};

use masquerade_shared::debug;
use uuid::Uuid;

use crate::data::*;

mod error;
pub mod impls;
pub mod registry;

pub use error::{DeliveryError, IdentityError};
pub use registry::AdapterRegistry;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Outgoing side of a client connection. Implementations must not block, frames are only queued.
pub trait ClientConnection: Send + Sync {
    fn send_frames(&self, frames: &[PacketFrame]) -> Result<(), DeliveryError>;
}

/// A connected client that can currently see the player whose identity changes.
#[derive(Clone)]
pub struct Observer {
    pub id: Uuid,
    pub name: String,
    pub connection: Arc<dyn ClientConnection>,
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("id", &self.id).field("name", &self.name).finish_non_exhaustive()
    }
}

/// Everything an adapter needs to know about the player entity being re-announced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerHandle {
    pub entity_id: i32,
    /// identity captured at login
    pub original: IdentityData,
    pub game_mode: GameMode,
    pub latency: i32,
    pub listed: bool,
}

impl PlayerHandle {
    pub fn new(entity_id: i32, original: IdentityData) -> Self {
        Self {
            entity_id,
            original,
            game_mode: GameMode::Survival,
            latency: 0,
            listed: true,
        }
    }

    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.original.uuid
    }

    #[inline]
    pub fn owner_id(&self) -> OwnerId {
        self.original.uuid
    }
}

/// Outcome of a best-effort broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// one `DeliveryFailed` per observer that did not get the packet
    pub failures: Vec<IdentityError>,
}

impl BroadcastReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_observers(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.failures.iter().filter_map(|err| match err {
            IdentityError::DeliveryFailed(id) => Some(*id),
            _ => None,
        })
    }
}

pub trait IdentityAdapter: Send + Sync {
    fn revision(&self) -> ProtocolRevision;

    /// Whether a texture without a signature is refused by clients of this revision.
    fn requires_signed_textures(&self) -> bool;

    /// Encode the packets announcing `profile`'s name and skin for `player`.
    /// Falls back to the player's original skin when the profile has no texture.
    fn build_identity_packet(&self, player: &PlayerHandle, profile: &CharacterProfile) -> IdentityResult<EncodedPacket>;

    /// Encode the packets announcing the player's original name and skin.
    fn build_default_packet(&self, player: &PlayerHandle) -> EncodedPacket;

    /// Hand the packet to every observer. A failing observer does not stop delivery to the rest.
    fn broadcast(&self, player: &PlayerHandle, packet: &EncodedPacket, observers: &[Observer]) -> BroadcastReport {
        debug_assert_eq!(packet.revision, self.revision(), "packet encoded for a different revision");

        let mut report = BroadcastReport::default();

        for observer in observers {
            match observer.connection.send_frames(&packet.frames) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    debug!(
                        "failed to send identity of {} to {} ({}): {err}",
                        player.original.name, observer.name, observer.id
                    );
                    report.failures.push(IdentityError::DeliveryFailed(observer.id));
                }
            }
        }

        report
    }

    /// Revert the player to the identity they logged in with.
    fn restore_default_identity(&self, player: &PlayerHandle, observers: &[Observer]) -> BroadcastReport {
        let packet = self.build_default_packet(player);
        self.broadcast(player, &packet, observers)
    }
}
