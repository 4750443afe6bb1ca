use std::sync::Arc;

use masquerade_shared::{debug, info, warn};
use rustc_hash::FxHashMap;

use super::{CharacterError, PermissionContext, PlayerManager};
use crate::{
    data::{CharacterProfile, OwnerId, ProfileId, ProtocolRevision},
    identity::{BroadcastReport, IdentityAdapter, IdentityError},
    store::ProfileStore,
    texture::{ResolveResult, TextureCache},
    util::TokioChannel,
};

pub type CharacterResult<T> = Result<T, CharacterError>;

#[derive(Debug)]
pub enum SwitchOutcome {
    /// The identity was announced within the call.
    Applied(BroadcastReport),
    /// The skin is being resolved, the switch finishes in a later `process_completions`.
    Pending,
}

/// Result of a background skin lookup, handed back to the tick.
pub struct ResolutionCompletion {
    pub owner: OwnerId,
    pub profile_id: ProfileId,
    pub sequence: u64,
    pub key: String,
    pub result: ResolveResult,
}

/// A switch that finished during `process_completions`.
#[derive(Debug)]
pub struct CompletedSwitch {
    pub owner: OwnerId,
    pub profile_id: ProfileId,
    pub result: CharacterResult<BroadcastReport>,
}

#[derive(Clone, Copy)]
struct PendingSwitch {
    sequence: u64,
    profile_id: ProfileId,
}

/// Drives profile switches: validates them against the store, resolves skins through the texture cache
/// and has the bound identity adapter announce the result.
///
/// Everything here runs on the tick. Skin lookups run on background tasks and come back through a channel,
/// a finished lookup is only applied if no newer request was made for the same owner in the meantime.
pub struct CharacterManager {
    adapter: Option<Arc<dyn IdentityAdapter>>,
    cache: TextureCache,
    completions: TokioChannel<ResolutionCompletion>,
    sequences: FxHashMap<OwnerId, u64>,
    pending: FxHashMap<OwnerId, PendingSwitch>,
}

impl CharacterManager {
    /// `adapter` is `None` when the server version is not supported, every switch then fails with `FeatureDisabled`.
    pub fn new(adapter: Option<Arc<dyn IdentityAdapter>>, cache: TextureCache) -> Self {
        Self {
            adapter,
            cache,
            completions: TokioChannel::new(),
            sequences: FxHashMap::default(),
            pending: FxHashMap::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn revision(&self) -> Option<ProtocolRevision> {
        self.adapter.as_ref().map(|a| a.revision())
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    pub fn has_pending(&self, owner: OwnerId) -> bool {
        self.pending.contains_key(&owner)
    }

    fn adapter(&self) -> CharacterResult<Arc<dyn IdentityAdapter>> {
        self.adapter.clone().ok_or(CharacterError::FeatureDisabled)
    }

    /// Start a new request for `owner`, making every older request stale.
    fn next_sequence(&mut self, owner: OwnerId) -> u64 {
        self.pending.remove(&owner);

        let seq = self.sequences.entry(owner).or_default();
        *seq += 1;
        *seq
    }

    /// Switch `owner` to `profile_id`. If the skin has to be resolved first, returns `Pending`
    /// and the switch is finished by `process_completions`.
    pub fn switch_to(
        &mut self,
        owner: OwnerId,
        profile_id: ProfileId,
        store: &mut ProfileStore,
        players: &PlayerManager,
    ) -> CharacterResult<SwitchOutcome> {
        self.adapter()?;

        let profile = store.get_owned_profile(owner, profile_id)?;
        if !players.is_online(owner) {
            return Err(CharacterError::PlayerOffline(owner));
        }

        let sequence = self.next_sequence(owner);

        let key = match (profile.has_texture(), profile.skin_reference.clone()) {
            (false, Some(key)) => key,
            _ => return self.apply(owner, profile_id, store, players).map(SwitchOutcome::Applied),
        };

        if let Some(blob) = self.cache.get_cached(&key) {
            store.set_texture(profile_id, blob)?;
            return self.apply(owner, profile_id, store, players).map(SwitchOutcome::Applied);
        }

        debug!("switch of {owner} to {profile_id} waits for the skin of {key}");
        self.pending.insert(owner, PendingSwitch { sequence, profile_id });

        let cache = self.cache.clone();
        let tx = self.completions.sender();
        tokio::spawn(async move {
            let result = cache.resolve(&key).await;
            // the receiver only goes away when the server shuts down
            let _ = tx.send(ResolutionCompletion {
                owner,
                profile_id,
                sequence,
                key,
                result,
            });
        });

        Ok(SwitchOutcome::Pending)
    }

    /// Remove the custom identity of `owner` and announce their original one.
    pub fn switch_to_default(&mut self, owner: OwnerId, store: &mut ProfileStore, players: &PlayerManager) -> CharacterResult<BroadcastReport> {
        let adapter = self.adapter()?;

        self.next_sequence(owner);
        store.set_active(owner, None)?;

        let Some(handle) = players.handle(owner) else {
            return Ok(BroadcastReport::default());
        };

        let report = adapter.restore_default_identity(handle, &players.observers(owner));
        log_failures(&report, owner);
        Ok(report)
    }

    /// Delete one of `owner`'s profiles. If it was active, the original identity is announced again
    /// and its report returned.
    pub fn delete_profile(
        &mut self,
        owner: OwnerId,
        profile_id: ProfileId,
        store: &mut ProfileStore,
        players: &PlayerManager,
    ) -> CharacterResult<Option<BroadcastReport>> {
        store.get_owned_profile(owner, profile_id)?;

        if self.pending.get(&owner).is_some_and(|p| p.profile_id == profile_id) {
            self.next_sequence(owner);
        }

        let was_active = store.get_active(owner) == Some(profile_id);
        store.delete_profile(profile_id)?;

        if !was_active {
            return Ok(None);
        }

        match (&self.adapter, players.handle(owner)) {
            (Some(adapter), Some(handle)) => {
                let report = adapter.restore_default_identity(handle, &players.observers(owner));
                log_failures(&report, owner);
                Ok(Some(report))
            }
            _ => Ok(None),
        }
    }

    /// Re-announce the persisted active profile of a player that just joined.
    pub fn handle_join(&mut self, owner: OwnerId, store: &mut ProfileStore, players: &PlayerManager) -> Option<CharacterResult<SwitchOutcome>> {
        let active = store.get_active(owner)?;
        if !self.is_enabled() {
            return None;
        }

        Some(self.switch_to(owner, active, store, players))
    }

    /// Forget about everything in flight for a player that left.
    pub fn handle_leave(&mut self, owner: OwnerId) {
        if self.pending.contains_key(&owner) {
            debug!("dropping pending switch of {owner}");
        }

        self.next_sequence(owner);
    }

    /// Announce `profile_id` again after it was renamed or re-skinned, if `owner` is playing as it
    /// or waiting to. A pending switch to another profile is left alone, it announces over this one anyway.
    pub fn refresh_profile(
        &mut self,
        owner: OwnerId,
        profile_id: ProfileId,
        store: &mut ProfileStore,
        players: &PlayerManager,
    ) -> Option<CharacterResult<SwitchOutcome>> {
        if !self.is_enabled() || !players.is_online(owner) {
            return None;
        }

        let current = match self.pending.get(&owner) {
            Some(pending) => pending.profile_id,
            None => store.get_active(owner)?,
        };

        if current != profile_id {
            return None;
        }

        Some(self.switch_to(owner, profile_id, store, players))
    }

    pub fn active_context(&self, owner: OwnerId, store: &ProfileStore) -> PermissionContext {
        PermissionContext::for_active(store.get_active(owner))
    }

    /// Apply every skin lookup that finished since the last call. Stale lookups are dropped.
    pub fn process_completions(&mut self, store: &mut ProfileStore, players: &PlayerManager) -> Vec<CompletedSwitch> {
        let mut completed = Vec::new();

        for completion in self.completions.drain() {
            let owner = completion.owner;

            match self.pending.get(&owner) {
                Some(p) if p.sequence == completion.sequence && p.profile_id == completion.profile_id => {}
                _ => {
                    debug!("discarding stale skin lookup of {} for {owner}", completion.key);
                    continue;
                }
            }

            self.pending.remove(&owner);

            let profile_id = completion.profile_id;
            let result = self.finish_switch(completion, store, players);
            if let Err(err) = &result {
                warn!("failed to switch {owner} to profile {profile_id}: {err}");
            }

            completed.push(CompletedSwitch { owner, profile_id, result });
        }

        completed
    }

    fn finish_switch(
        &mut self,
        completion: ResolutionCompletion,
        store: &mut ProfileStore,
        players: &PlayerManager,
    ) -> CharacterResult<BroadcastReport> {
        let ResolutionCompletion {
            owner,
            profile_id,
            key,
            result,
            ..
        } = completion;

        match result {
            Ok(blob) => {
                let profile = store.get_owned_profile(owner, profile_id)?;
                // the skin reference may have changed while we were waiting
                if profile.texture.is_none() && profile.skin_reference.as_deref() == Some(key.as_str()) {
                    store.set_texture(profile_id, blob)?;
                }
            }
            Err(err) => {
                warn!("could not resolve skin {key} for {owner}, using their default skin: {err}");
            }
        }

        self.apply(owner, profile_id, store, players)
    }

    /// Activate the profile and announce it to the player and everyone who can see them.
    fn apply(&mut self, owner: OwnerId, profile_id: ProfileId, store: &mut ProfileStore, players: &PlayerManager) -> CharacterResult<BroadcastReport> {
        let adapter = self.adapter()?;

        store.set_active(owner, Some(profile_id))?;

        let profile = store.get_owned_profile(owner, profile_id)?;
        let handle = players.handle(owner).ok_or(CharacterError::PlayerOffline(owner))?;

        let packet = match adapter.build_identity_packet(handle, profile) {
            Ok(packet) => packet,
            Err(IdentityError::UnsignedTexture) => {
                warn!(
                    "texture of profile {} is unsigned, {} requires signed textures; using the default skin",
                    profile.display_name,
                    adapter.revision()
                );
                adapter.build_identity_packet(handle, &CharacterProfile::without_texture(profile))?
            }
            Err(err) => return Err(err.into()),
        };

        let report = adapter.broadcast(handle, &packet, &players.observers(owner));
        log_failures(&report, owner);

        info!(
            "{} is now playing as {} ({} observers)",
            handle.original.name, profile.display_name, report.delivered
        );

        Ok(report)
    }
}

fn log_failures(report: &BroadcastReport, owner: OwnerId) {
    for observer in report.failed_observers() {
        warn!("could not deliver the identity of {owner} to {observer}");
    }
}
