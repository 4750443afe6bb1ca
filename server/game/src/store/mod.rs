use std::{cmp::Ordering, collections::BTreeMap};

use masquerade_shared::{unix_timestamp, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::data::*;

mod backend;
mod error;

pub use backend::{JsonFileBackend, MemoryBackend, ProfileBackend};
pub use error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the store persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub profiles: Vec<CharacterProfile>,
    #[serde(default)]
    pub active: BTreeMap<OwnerId, ProfileId>,
}

/// Durable record of every character profile and which one each owner has active.
/// Lives on the tick task, which is the only writer.
pub struct ProfileStore {
    profiles: FxHashMap<ProfileId, CharacterProfile>,
    by_owner: FxHashMap<OwnerId, Vec<ProfileId>>,
    active: FxHashMap<OwnerId, ProfileId>,
    max_profiles_per_owner: usize,
    dirty: bool,
}

impl ProfileStore {
    pub fn new(max_profiles_per_owner: usize) -> Self {
        Self {
            profiles: FxHashMap::default(),
            by_owner: FxHashMap::default(),
            active: FxHashMap::default(),
            max_profiles_per_owner,
            dirty: false,
        }
    }

    /// Rebuild a store from a saved snapshot. Active bindings that point at missing profiles,
    /// or at profiles of another owner, are dropped.
    pub fn restore(snapshot: StoreSnapshot, max_profiles_per_owner: usize) -> Self {
        let mut store = Self::new(max_profiles_per_owner);

        for profile in snapshot.profiles {
            store.by_owner.entry(profile.owner_id).or_default().push(profile.profile_id);
            store.profiles.insert(profile.profile_id, profile);
        }

        for (owner, profile_id) in snapshot.active {
            if store.profiles.get(&profile_id).is_some_and(|p| p.owner_id == owner) {
                store.active.insert(owner, profile_id);
            } else {
                warn!("dropping active binding of {owner} to unknown profile {profile_id}");
                store.dirty = true;
            }
        }

        store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut profiles: Vec<_> = self.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.profile_id.cmp(&b.profile_id)));

        StoreSnapshot {
            profiles,
            active: self.active.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the store as having unsaved changes, e.g. after a failed save.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether there were unsaved changes, and forgets about them.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn max_profiles_per_owner(&self) -> usize {
        self.max_profiles_per_owner
    }

    pub fn create_profile(&mut self, owner: OwnerId, display_name: &str) -> StoreResult<&CharacterProfile> {
        self.create_profile_at(owner, display_name, unix_timestamp())
    }

    pub fn create_profile_at(&mut self, owner: OwnerId, display_name: &str, created_at: i64) -> StoreResult<&CharacterProfile> {
        self.validate_name(owner, display_name, None)?;

        if self.profile_count(owner) >= self.max_profiles_per_owner {
            return Err(StoreError::ProfileLimitReached(self.max_profiles_per_owner));
        }

        let profile = CharacterProfile::new(owner, display_name, created_at);
        let profile_id = profile.profile_id;

        self.by_owner.entry(owner).or_default().push(profile_id);
        self.dirty = true;

        Ok(self.profiles.entry(profile_id).or_insert(profile))
    }

    /// Create a profile named `Profile N`, with the lowest N that is not taken yet.
    pub fn create_profile_with_generated_name(&mut self, owner: OwnerId) -> StoreResult<&CharacterProfile> {
        let name = (1..)
            .map(|n| format!("Profile {n}"))
            .find(|name| !self.name_taken(owner, name, None))
            .unwrap_or_default();

        self.create_profile(owner, &name)
    }

    pub fn get_profile(&self, profile_id: ProfileId) -> Option<&CharacterProfile> {
        self.profiles.get(&profile_id)
    }

    /// Like `get_profile`, but fails unless the profile belongs to `owner`.
    pub fn get_owned_profile(&self, owner: OwnerId, profile_id: ProfileId) -> StoreResult<&CharacterProfile> {
        self.profiles
            .get(&profile_id)
            .filter(|p| p.owner_id == owner)
            .ok_or(StoreError::ProfileNotFound(profile_id))
    }

    /// Profiles of `owner`, most recently activated first, then never activated ones from oldest to newest.
    pub fn list_profiles(&self, owner: OwnerId) -> Vec<&CharacterProfile> {
        let mut profiles: Vec<_> = self
            .by_owner
            .get(&owner)
            .map(|ids| ids.iter().filter_map(|id| self.profiles.get(id)).collect())
            .unwrap_or_default();

        profiles.sort_by(|a, b| {
            let by_activation = match (a.last_activated_at, b.last_activated_at) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.created_at.cmp(&b.created_at),
            };

            by_activation.then(a.profile_id.cmp(&b.profile_id))
        });

        profiles
    }

    pub fn profile_count(&self, owner: OwnerId) -> usize {
        self.by_owner.get(&owner).map_or(0, Vec::len)
    }

    pub fn set_texture(&mut self, profile_id: ProfileId, texture: TextureBlob) -> StoreResult<()> {
        let profile = self.profile_mut(profile_id)?;
        profile.texture = Some(texture);
        self.dirty = true;
        Ok(())
    }

    pub fn rename_profile(&mut self, profile_id: ProfileId, new_name: &str) -> StoreResult<()> {
        let owner = self.profile_mut(profile_id)?.owner_id;
        self.validate_name(owner, new_name, Some(profile_id))?;

        self.profile_mut(profile_id)?.display_name = new_name.to_owned();
        self.dirty = true;
        Ok(())
    }

    /// Change where the skin is resolved from. The resolved texture is dropped, it gets resolved again on the next switch.
    pub fn set_skin_reference(&mut self, profile_id: ProfileId, reference: Option<String>) -> StoreResult<()> {
        let profile = self.profile_mut(profile_id)?;
        profile.skin_reference = reference;
        profile.texture = None;
        self.dirty = true;
        Ok(())
    }

    /// Delete a profile. If it was the owner's active profile, the owner is left with no active profile.
    pub fn delete_profile(&mut self, profile_id: ProfileId) -> StoreResult<CharacterProfile> {
        let profile = self.profiles.remove(&profile_id).ok_or(StoreError::ProfileNotFound(profile_id))?;

        if let Some(ids) = self.by_owner.get_mut(&profile.owner_id) {
            ids.retain(|id| *id != profile_id);
            if ids.is_empty() {
                self.by_owner.remove(&profile.owner_id);
            }
        }

        if self.active.get(&profile.owner_id) == Some(&profile_id) {
            self.active.remove(&profile.owner_id);
        }

        self.dirty = true;
        Ok(profile)
    }

    pub fn get_active(&self, owner: OwnerId) -> Option<ProfileId> {
        self.active.get(&owner).copied()
    }

    pub fn get_active_profile(&self, owner: OwnerId) -> Option<&CharacterProfile> {
        self.get_active(owner).and_then(|id| self.profiles.get(&id))
    }

    /// Bind `owner` to `profile_id`, or to no profile at all. Activating stamps `last_activated_at`.
    pub fn set_active(&mut self, owner: OwnerId, profile_id: Option<ProfileId>) -> StoreResult<()> {
        self.set_active_at(owner, profile_id, unix_timestamp())
    }

    pub fn set_active_at(&mut self, owner: OwnerId, profile_id: Option<ProfileId>, now: i64) -> StoreResult<()> {
        match profile_id {
            Some(profile_id) => {
                let profile = self
                    .profiles
                    .get_mut(&profile_id)
                    .filter(|p| p.owner_id == owner)
                    .ok_or(StoreError::ProfileNotFound(profile_id))?;

                profile.last_activated_at = Some(now);
                self.active.insert(owner, profile_id);
            }
            None => {
                self.active.remove(&owner);
            }
        }

        self.dirty = true;
        Ok(())
    }

    fn profile_mut(&mut self, profile_id: ProfileId) -> StoreResult<&mut CharacterProfile> {
        self.profiles.get_mut(&profile_id).ok_or(StoreError::ProfileNotFound(profile_id))
    }

    fn name_taken(&self, owner: OwnerId, name: &str, except: Option<ProfileId>) -> bool {
        self.by_owner.get(&owner).is_some_and(|ids| {
            ids.iter()
                .filter(|id| Some(**id) != except)
                .filter_map(|id| self.profiles.get(id))
                .any(|p| p.display_name.eq_ignore_ascii_case(name))
        })
    }

    fn validate_name(&self, owner: OwnerId, name: &str, except: Option<ProfileId>) -> StoreResult<()> {
        if !is_valid_display_name(name) {
            return Err(StoreError::InvalidName(name.to_owned()));
        }

        if self.name_taken(owner, name, except) {
            return Err(StoreError::DuplicateName(name.to_owned()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn names(store: &ProfileStore, owner: OwnerId) -> Vec<String> {
        store.list_profiles(owner).iter().map(|p| p.display_name.clone()).collect()
    }

    #[test]
    fn duplicate_names_per_owner() {
        let mut store = ProfileStore::new(3);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        store.create_profile(alice, "Knight").unwrap();
        assert_eq!(
            store.create_profile(alice, "knight").unwrap_err(),
            StoreError::DuplicateName("knight".to_owned())
        );

        // names are only unique per owner
        store.create_profile(bob, "Knight").unwrap();
        assert_eq!(store.profile_count(alice), 1);
        assert_eq!(store.profile_count(bob), 1);
    }

    #[test]
    fn invalid_names_and_limit() {
        let mut store = ProfileStore::new(2);
        let owner = Uuid::new_v4();

        assert!(matches!(store.create_profile(owner, ""), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.create_profile(owner, "no-dashes"), Err(StoreError::InvalidName(_))));

        store.create_profile(owner, "One").unwrap();
        store.create_profile(owner, "Two").unwrap();
        assert_eq!(store.create_profile(owner, "Three").unwrap_err(), StoreError::ProfileLimitReached(2));
    }

    #[test]
    fn list_order() {
        let mut store = ProfileStore::new(5);
        let owner = Uuid::new_v4();

        let old = store.create_profile_at(owner, "Old", 10).unwrap().profile_id;
        store.create_profile_at(owner, "Newer", 20).unwrap();
        let recent = store.create_profile_at(owner, "Recent", 30).unwrap().profile_id;
        store.create_profile_at(owner, "Newest", 40).unwrap();

        store.set_active_at(owner, Some(old), 100).unwrap();
        store.set_active_at(owner, Some(recent), 200).unwrap();

        assert_eq!(names(&store, owner), ["Recent", "Old", "Newer", "Newest"]);
    }

    #[test]
    fn rename_and_reskin() {
        let mut store = ProfileStore::new(3);
        let owner = Uuid::new_v4();

        let a = store.create_profile(owner, "Alpha").unwrap().profile_id;
        store.create_profile(owner, "Beta").unwrap();

        // renaming to its own name with different case is fine
        store.rename_profile(a, "ALPHA").unwrap();
        assert_eq!(store.rename_profile(a, "beta").unwrap_err(), StoreError::DuplicateName("beta".to_owned()));

        store.set_texture(a, TextureBlob::signed("v", "s")).unwrap();
        store.set_skin_reference(a, Some("jeb_".to_owned())).unwrap();

        let profile = store.get_profile(a).unwrap();
        assert_eq!(profile.display_name, "ALPHA");
        assert_eq!(profile.skin_reference.as_deref(), Some("jeb_"));
        assert!(profile.texture.is_none());
    }

    #[test]
    fn generated_names_fill_gaps() {
        let mut store = ProfileStore::new(5);
        let owner = Uuid::new_v4();

        store.create_profile(owner, "Profile 2").unwrap();
        assert_eq!(store.create_profile_with_generated_name(owner).unwrap().display_name, "Profile 1");
        assert_eq!(store.create_profile_with_generated_name(owner).unwrap().display_name, "Profile 3");
    }

    #[test]
    fn active_must_be_owned() {
        let mut store = ProfileStore::new(3);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let bobs = store.create_profile(bob, "Bob").unwrap().profile_id;

        assert_eq!(store.set_active(alice, Some(bobs)).unwrap_err(), StoreError::ProfileNotFound(bobs));
        assert_eq!(store.get_active(alice), None);
    }

    #[test]
    fn at_most_one_active() {
        let mut store = ProfileStore::new(3);
        let owner = Uuid::new_v4();
        let a = store.create_profile(owner, "A").unwrap().profile_id;
        let b = store.create_profile(owner, "B").unwrap().profile_id;

        store.set_active(owner, Some(a)).unwrap();
        store.set_active(owner, Some(b)).unwrap();
        assert_eq!(store.get_active(owner), Some(b));
        assert_eq!(store.snapshot().active.len(), 1);

        store.set_active(owner, None).unwrap();
        assert_eq!(store.get_active(owner), None);
    }

    #[test]
    fn deleting_active_clears_binding() {
        let mut store = ProfileStore::new(3);
        let owner = Uuid::new_v4();
        let a = store.create_profile(owner, "A").unwrap().profile_id;
        let b = store.create_profile(owner, "B").unwrap().profile_id;

        store.set_active(owner, Some(a)).unwrap();
        store.delete_profile(b).unwrap();
        assert_eq!(store.get_active(owner), Some(a));

        store.delete_profile(a).unwrap();
        assert_eq!(store.get_active(owner), None);
        assert_eq!(store.profile_count(owner), 0);
        assert_eq!(store.delete_profile(a).unwrap_err(), StoreError::ProfileNotFound(a));
    }

    #[test]
    fn snapshot_restore() {
        let mut store = ProfileStore::new(3);
        let owner = Uuid::new_v4();
        let a = store.create_profile(owner, "A").unwrap().profile_id;
        store.set_active(owner, Some(a)).unwrap();
        assert!(store.take_dirty());
        assert!(!store.is_dirty());

        let mut snapshot = store.snapshot();
        snapshot.active.insert(Uuid::new_v4(), a); // owned by someone else

        let restored = ProfileStore::restore(snapshot, 3);
        assert_eq!(restored.get_active(owner), Some(a));
        assert_eq!(restored.snapshot(), store.snapshot());
        assert!(restored.is_dirty());
    }
}
