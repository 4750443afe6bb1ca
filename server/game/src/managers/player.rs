use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    data::{IdentityData, OwnerId},
    identity::{ClientConnection, Observer, PlayerHandle},
};

pub const DEFAULT_WORLD: &str = "world";

pub struct OnlinePlayer {
    pub handle: PlayerHandle,
    pub connection: Arc<dyn ClientConnection>,
    pub world: String,
    pub x: f64,
    pub z: f64,
}

impl OnlinePlayer {
    fn as_observer(&self) -> Observer {
        Observer {
            id: self.handle.uuid(),
            name: self.handle.original.name.clone(),
            connection: self.connection.clone(),
        }
    }

    fn distance_sq(&self, other: &OnlinePlayer) -> f64 {
        let (dx, dz) = (self.x - other.x, self.z - other.z);
        dx * dx + dz * dz
    }
}

/// Online players, where they are, and who can see whom.
pub struct PlayerManager {
    players: FxHashMap<OwnerId, OnlinePlayer>,     // owner id : player
    worlds: FxHashMap<String, FxHashSet<OwnerId>>, // world name : [owner id]
    view_distance: f64,
}

impl PlayerManager {
    pub fn new(view_distance: f64) -> Self {
        Self {
            players: FxHashMap::default(),
            worlds: FxHashMap::default(),
            view_distance,
        }
    }

    /// Add a player at the spawn of the default world. Returns `false` if they were already online.
    pub fn join(&mut self, entity_id: i32, original: IdentityData, connection: Arc<dyn ClientConnection>) -> bool {
        let owner = original.uuid;
        if self.players.contains_key(&owner) {
            return false;
        }

        self.worlds.entry(DEFAULT_WORLD.to_owned()).or_default().insert(owner);
        self.players.insert(
            owner,
            OnlinePlayer {
                handle: PlayerHandle::new(entity_id, original),
                connection,
                world: DEFAULT_WORLD.to_owned(),
                x: 0.0,
                z: 0.0,
            },
        );

        true
    }

    pub fn leave(&mut self, owner: OwnerId) -> Option<OnlinePlayer> {
        let player = self.players.remove(&owner)?;
        self.remove_from_world(&player.world, owner);
        Some(player)
    }

    /// Move a player, returns `false` if they are not online.
    pub fn set_position(&mut self, owner: OwnerId, world: &str, x: f64, z: f64) -> bool {
        let Some(player) = self.players.get_mut(&owner) else {
            return false;
        };

        let old_world = std::mem::replace(&mut player.world, world.to_owned());
        player.x = x;
        player.z = z;

        if old_world != world {
            self.remove_from_world(&old_world, owner);
            self.worlds.entry(world.to_owned()).or_default().insert(owner);
        }

        true
    }

    pub fn handle(&self, owner: OwnerId) -> Option<&PlayerHandle> {
        self.players.get(&owner).map(|p| &p.handle)
    }

    pub fn is_online(&self, owner: OwnerId) -> bool {
        self.players.contains_key(&owner)
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// The player itself, followed by every player in the same world within view distance.
    pub fn observers(&self, owner: OwnerId) -> Vec<Observer> {
        let Some(player) = self.players.get(&owner) else {
            return Vec::new();
        };

        let max_dist_sq = self.view_distance * self.view_distance;

        let mut observers = vec![player.as_observer()];
        if let Some(ids) = self.worlds.get(&player.world) {
            observers.extend(
                ids.iter()
                    .filter(|id| **id != owner)
                    .filter_map(|id| self.players.get(id))
                    .filter(|other| other.distance_sq(player) <= max_dist_sq)
                    .map(OnlinePlayer::as_observer),
            );
        }

        observers
    }

    fn remove_from_world(&mut self, world: &str, owner: OwnerId) {
        if let Some(ids) = self.worlds.get_mut(world) {
            ids.remove(&owner);
            if ids.is_empty() {
                self.worlds.remove(world);
            }
        }
    }
}
