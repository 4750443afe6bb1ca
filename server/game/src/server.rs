use std::{future::Future, sync::Arc};

use futures_util::FutureExt;
use masquerade_shared::{debug, error, info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    config::ServerConfig,
    data::{CharacterProfile, IdentityData, OwnerId, ProfileId, ProtocolRevision, TextureBlob},
    identity::{BroadcastReport, ClientConnection, IdentityAdapter},
    managers::{CharacterError, CharacterManager, CharacterResult, PermissionContext, PlayerManager, SwitchOutcome},
    store::{ProfileBackend, ProfileStore},
    texture::{TextureCache, TextureResolver},
};

const COMMAND_QUEUE_SIZE: usize = 256;

/// Profiles of one owner along with their permission context.
#[derive(Debug)]
pub struct ProfileListing {
    pub profiles: Vec<CharacterProfile>,
    pub active: Option<ProfileId>,
    pub context: PermissionContext,
}

#[derive(Debug)]
pub struct ServerStatus {
    pub revision: Option<ProtocolRevision>,
    pub online: usize,
    pub cached_textures: usize,
    pub pending_lookups: usize,
    pub unsaved_changes: bool,
}

pub type Reply<T> = oneshot::Sender<CharacterResult<T>>;

/// Everything the outside world can ask of the server. Handled in order, on the tick.
pub enum ServerCommand {
    Join {
        name: String,
        uuid: Option<Uuid>,
        skin: Option<TextureBlob>,
        connection: Arc<dyn ClientConnection>,
        reply: Reply<OwnerId>,
    },
    Leave {
        owner: OwnerId,
        reply: Reply<()>,
    },
    Move {
        owner: OwnerId,
        world: String,
        x: f64,
        z: f64,
        reply: Reply<()>,
    },
    Create {
        owner: OwnerId,
        name: Option<String>,
        reply: Reply<CharacterProfile>,
    },
    Rename {
        owner: OwnerId,
        profile_id: ProfileId,
        name: String,
        reply: Reply<()>,
    },
    SetSkin {
        owner: OwnerId,
        profile_id: ProfileId,
        reference: Option<String>,
        reply: Reply<()>,
    },
    Delete {
        owner: OwnerId,
        profile_id: ProfileId,
        reply: Reply<Option<BroadcastReport>>,
    },
    List {
        owner: OwnerId,
        reply: Reply<ProfileListing>,
    },
    Switch {
        owner: OwnerId,
        profile_id: ProfileId,
        reply: Reply<SwitchOutcome>,
    },
    Reset {
        owner: OwnerId,
        reply: Reply<BroadcastReport>,
    },
    Status {
        reply: oneshot::Sender<ServerStatus>,
    },
}

/// Cloneable sender side of the server's command queue.
#[derive(Clone)]
pub struct ServerHandle {
    tx: mpsc::Sender<ServerCommand>,
}

#[derive(Debug)]
pub struct ServerGone;

impl std::fmt::Display for ServerGone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("the server has shut down")
    }
}

impl std::error::Error for ServerGone {}

macro_rules! request {
    ($self:ident, $variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {{
        let (reply, rx) = oneshot::channel();
        $self
            .tx
            .send(ServerCommand::$variant { $($field $(: $value)?,)* reply })
            .await
            .map_err(|_| ServerGone)?;

        rx.await.map_err(|_| ServerGone)
    }};
}

impl ServerHandle {
    pub async fn join(
        &self,
        name: &str,
        uuid: Option<Uuid>,
        skin: Option<TextureBlob>,
        connection: Arc<dyn ClientConnection>,
    ) -> Result<CharacterResult<OwnerId>, ServerGone> {
        request!(self, Join { name: name.to_owned(), uuid, skin, connection })
    }

    pub async fn leave(&self, owner: OwnerId) -> Result<CharacterResult<()>, ServerGone> {
        request!(self, Leave { owner })
    }

    pub async fn move_player(&self, owner: OwnerId, world: &str, x: f64, z: f64) -> Result<CharacterResult<()>, ServerGone> {
        request!(self, Move { owner, world: world.to_owned(), x, z })
    }

    pub async fn create(&self, owner: OwnerId, name: Option<String>) -> Result<CharacterResult<CharacterProfile>, ServerGone> {
        request!(self, Create { owner, name })
    }

    pub async fn rename(&self, owner: OwnerId, profile_id: ProfileId, name: &str) -> Result<CharacterResult<()>, ServerGone> {
        request!(self, Rename { owner, profile_id, name: name.to_owned() })
    }

    pub async fn set_skin(&self, owner: OwnerId, profile_id: ProfileId, reference: Option<String>) -> Result<CharacterResult<()>, ServerGone> {
        request!(self, SetSkin { owner, profile_id, reference })
    }

    pub async fn delete(&self, owner: OwnerId, profile_id: ProfileId) -> Result<CharacterResult<Option<BroadcastReport>>, ServerGone> {
        request!(self, Delete { owner, profile_id })
    }

    pub async fn list(&self, owner: OwnerId) -> Result<CharacterResult<ProfileListing>, ServerGone> {
        request!(self, List { owner })
    }

    pub async fn switch(&self, owner: OwnerId, profile_id: ProfileId) -> Result<CharacterResult<SwitchOutcome>, ServerGone> {
        request!(self, Switch { owner, profile_id })
    }

    pub async fn reset(&self, owner: OwnerId) -> Result<CharacterResult<BroadcastReport>, ServerGone> {
        request!(self, Reset { owner })
    }

    pub async fn status(&self) -> Result<ServerStatus, ServerGone> {
        request!(self, Status {})
    }
}

/// Owns the store and all managers. Everything that touches them runs inside `tick`, on a single task.
pub struct GameServer {
    config: ServerConfig,
    store: ProfileStore,
    players: PlayerManager,
    characters: CharacterManager,
    backend: Arc<dyn ProfileBackend>,
    commands: mpsc::Receiver<ServerCommand>,
    next_entity_id: i32,
    last_save: Instant,
    saving: Option<JoinHandle<bool>>,
}

impl GameServer {
    /// `adapter` is `None` if the server version is not supported, profile commands then fail with `FeatureDisabled`.
    pub fn new(
        config: ServerConfig,
        store: ProfileStore,
        backend: Arc<dyn ProfileBackend>,
        adapter: Option<Arc<dyn IdentityAdapter>>,
        resolver: Arc<dyn TextureResolver>,
    ) -> (Self, ServerHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);

        let cache = TextureCache::new(resolver, config.texture_ttl(), config.resolve_timeout());

        let server = Self {
            players: PlayerManager::new(config.view_distance),
            characters: CharacterManager::new(adapter, cache),
            store,
            backend,
            commands: rx,
            next_entity_id: 1,
            last_save: Instant::now(),
            saving: None,
            config,
        };

        (server, ServerHandle { tx })
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn players(&self) -> &PlayerManager {
        &self.players
    }

    pub fn characters(&self) -> &CharacterManager {
        &self.characters
    }

    /// Run the tick loop until `shutdown` resolves, then save.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server running at {} ticks per second", self.config.tps);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                () = &mut shutdown => break,
            }
        }

        info!("Shutting down, saving profiles");
        self.save_now().await;
    }

    /// One tick: handle queued commands, apply finished skin lookups, autosave when due.
    pub fn tick(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }

        for completed in self.characters.process_completions(&mut self.store, &self.players) {
            if let Ok(report) = &completed.result {
                debug!(
                    "delayed switch of {} to {} delivered to {} observers",
                    completed.owner, completed.profile_id, report.delivered
                );
            }
        }

        if self.last_save.elapsed() >= self.config.autosave_interval() {
            self.autosave();
        }
    }

    pub fn handle_command(&mut self, command: ServerCommand) {
        // a dropped reply receiver just means the caller stopped waiting
        match command {
            ServerCommand::Join {
                name,
                uuid,
                skin,
                connection,
                reply,
            } => {
                let _ = reply.send(self.join(name, uuid, skin, connection));
            }

            ServerCommand::Leave { owner, reply } => {
                self.characters.handle_leave(owner);
                let result = match self.players.leave(owner) {
                    Some(player) => {
                        info!("{} left", player.handle.original.name);
                        Ok(())
                    }
                    None => Err(CharacterError::PlayerOffline(owner)),
                };

                let _ = reply.send(result);
            }

            ServerCommand::Move { owner, world, x, z, reply } => {
                let result = if self.players.set_position(owner, &world, x, z) {
                    Ok(())
                } else {
                    Err(CharacterError::PlayerOffline(owner))
                };

                let _ = reply.send(result);
            }

            ServerCommand::Create { owner, name, reply } => {
                let _ = reply.send(self.create(owner, name.as_deref()));
            }

            ServerCommand::Rename {
                owner,
                profile_id,
                name,
                reply,
            } => {
                let _ = reply.send(self.rename(owner, profile_id, &name));
            }

            ServerCommand::SetSkin {
                owner,
                profile_id,
                reference,
                reply,
            } => {
                let _ = reply.send(self.set_skin(owner, profile_id, reference));
            }

            ServerCommand::Delete { owner, profile_id, reply } => {
                let result = self
                    .ensure_enabled()
                    .and_then(|()| self.characters.delete_profile(owner, profile_id, &mut self.store, &self.players));

                let _ = reply.send(result);
            }

            ServerCommand::List { owner, reply } => {
                let _ = reply.send(self.list(owner));
            }

            ServerCommand::Switch { owner, profile_id, reply } => {
                let result = self.characters.switch_to(owner, profile_id, &mut self.store, &self.players);
                let _ = reply.send(result);
            }

            ServerCommand::Reset { owner, reply } => {
                let result = self.characters.switch_to_default(owner, &mut self.store, &self.players);
                let _ = reply.send(result);
            }

            ServerCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn ensure_enabled(&self) -> CharacterResult<()> {
        if self.characters.is_enabled() {
            Ok(())
        } else {
            Err(CharacterError::FeatureDisabled)
        }
    }

    fn join(
        &mut self,
        name: String,
        uuid: Option<Uuid>,
        skin: Option<TextureBlob>,
        connection: Arc<dyn ClientConnection>,
    ) -> CharacterResult<OwnerId> {
        let identity = IdentityData::new(uuid.unwrap_or_else(Uuid::new_v4), name, skin);
        let owner = identity.uuid;

        let entity_id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);

        if !self.players.join(entity_id, identity, connection) {
            warn!("refusing second connection of {owner}, they are already online");
            return Err(CharacterError::AlreadyOnline(owner));
        }

        info!("{} joined as entity {entity_id} ({owner})", self.players.handle(owner).map_or("?", |h| h.original.name.as_str()));

        match self.characters.handle_join(owner, &mut self.store, &self.players) {
            Some(Err(err)) => warn!("failed to restore the active profile of {owner}: {err}"),
            Some(Ok(SwitchOutcome::Pending)) => debug!("restoring the active profile of {owner} after a skin lookup"),
            _ => {}
        }

        Ok(owner)
    }

    fn create(&mut self, owner: OwnerId, name: Option<&str>) -> CharacterResult<CharacterProfile> {
        self.ensure_enabled()?;

        let profile = match name {
            Some(name) => self.store.create_profile(owner, name)?,
            None => self.store.create_profile_with_generated_name(owner)?,
        };

        info!("{owner} created profile {} ({})", profile.display_name, profile.profile_id);
        Ok(profile.clone())
    }

    fn rename(&mut self, owner: OwnerId, profile_id: ProfileId, name: &str) -> CharacterResult<()> {
        self.ensure_enabled()?;
        self.store.get_owned_profile(owner, profile_id)?;
        self.store.rename_profile(profile_id, name)?;

        self.refresh_profile(owner, profile_id);
        Ok(())
    }

    fn set_skin(&mut self, owner: OwnerId, profile_id: ProfileId, reference: Option<String>) -> CharacterResult<()> {
        self.ensure_enabled()?;
        self.store.get_owned_profile(owner, profile_id)?;
        self.store.set_skin_reference(profile_id, reference.clone())?;

        // setting the same reference again asks for a fresh lookup
        if let Some(reference) = &reference {
            self.characters.cache().invalidate(reference);
        }

        self.refresh_profile(owner, profile_id);
        Ok(())
    }

    fn refresh_profile(&mut self, owner: OwnerId, profile_id: ProfileId) {
        if let Some(Err(err)) = self.characters.refresh_profile(owner, profile_id, &mut self.store, &self.players) {
            warn!("failed to re-announce profile {profile_id} of {owner}: {err}");
        }
    }

    fn list(&self, owner: OwnerId) -> CharacterResult<ProfileListing> {
        self.ensure_enabled()?;

        Ok(ProfileListing {
            profiles: self.store.list_profiles(owner).into_iter().cloned().collect(),
            active: self.store.get_active(owner),
            context: self.characters.active_context(owner, &self.store),
        })
    }

    fn status(&self) -> ServerStatus {
        ServerStatus {
            revision: self.characters.revision(),
            online: self.players.count(),
            cached_textures: self.characters.cache().len(),
            pending_lookups: self.characters.cache().pending_lookups(),
            unsaved_changes: self.store.is_dirty(),
        }
    }

    /// Save a snapshot on a blocking thread, unless a previous save is still running.
    fn autosave(&mut self) {
        if let Some(handle) = self.saving.take() {
            if !handle.is_finished() {
                self.saving = Some(handle);
                return;
            }

            // put the changes back if the previous save failed
            if let Some(Ok(false)) = handle.now_or_never() {
                self.store.mark_dirty();
            }
        }

        self.last_save = Instant::now();
        if !self.store.take_dirty() {
            return;
        }

        let snapshot = self.store.snapshot();
        let backend = self.backend.clone();

        self.saving = Some(tokio::task::spawn_blocking(move || match backend.save(&snapshot) {
            Ok(()) => {
                debug!("saved {} profiles", snapshot.profiles.len());
                true
            }
            Err(err) => {
                error!("failed to save profiles: {err}");
                false
            }
        }));
    }

    /// Wait for a running save, then save whatever changed since.
    pub async fn save_now(&mut self) {
        if let Some(handle) = self.saving.take() {
            if let Ok(false) = handle.await {
                self.store.mark_dirty();
            }
        }

        if !self.store.take_dirty() {
            return;
        }

        let snapshot = self.store.snapshot();
        let backend = self.backend.clone();

        match tokio::task::spawn_blocking(move || backend.save(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("failed to save profiles: {err}");
                self.store.mark_dirty();
            }
            Err(err) => {
                error!("profile save task failed: {err}");
                self.store.mark_dirty();
            }
        }
    }
}
