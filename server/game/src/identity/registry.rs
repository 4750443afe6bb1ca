use std::sync::{Arc, OnceLock};

use masquerade_shared::{info, warn};
use rustc_hash::FxHashMap;

use super::{IdentityAdapter, IdentityError, IdentityResult, impls};
use crate::data::ProtocolRevision;

struct Binding {
    revision: ProtocolRevision,
    adapter: Arc<dyn IdentityAdapter>,
}

/// Picks the identity adapter matching the running server version, once per process.
/// Everything else obtains the adapter through here.
pub struct AdapterRegistry {
    bound: OnceLock<Binding>,
    signed_overrides: FxHashMap<ProtocolRevision, bool>,
}

impl AdapterRegistry {
    /// `signed_overrides` replaces the default signed texture requirement of the listed revisions.
    pub fn new(signed_overrides: FxHashMap<ProtocolRevision, bool>) -> Self {
        Self {
            bound: OnceLock::new(),
            signed_overrides,
        }
    }

    /// Map a reported server version to a revision. Accepted forms are `git-Paper-496 (MC: 1.20.4)`,
    /// `1.20.4-R0.1-SNAPSHOT`, a bare `1.20.4` and a package tag like `v1_20_R3`.
    pub fn detect_revision(version: &str) -> IdentityResult<ProtocolRevision> {
        let trimmed = version.trim();

        let game_version = if let Some(idx) = trimmed.find("(MC:") {
            let rest = &trimmed[idx + 4..];
            rest.split(')').next().unwrap_or(rest).trim()
        } else {
            trimmed.split('-').next().unwrap_or(trimmed)
        };

        ProtocolRevision::from_game_version(game_version)
            .or_else(|| ProtocolRevision::from_tag(trimmed))
            .ok_or_else(|| IdentityError::UnsupportedRevision(version.to_owned()))
    }

    /// Bind the adapter for `version`. Calls after a successful bind return the bound adapter without
    /// looking at `version` again.
    pub fn bind(&self, version: &str) -> IdentityResult<Arc<dyn IdentityAdapter>> {
        if let Some(binding) = self.bound.get() {
            return Ok(binding.adapter.clone());
        }

        let revision = Self::detect_revision(version)?;
        let require_signed = self.requires_signed_textures(revision);

        let binding = self.bound.get_or_init(|| {
            info!("Using identity adapter for {revision} (protocol {})", revision.protocol_version());
            if require_signed != revision.requires_signed_textures_by_default() {
                warn!("Signed textures requirement for {revision} overridden to {require_signed}");
            }

            Binding {
                revision,
                adapter: impls::create_adapter(revision, require_signed),
            }
        });

        Ok(binding.adapter.clone())
    }

    pub fn is_bound(&self) -> bool {
        self.bound.get().is_some()
    }

    pub fn adapter(&self) -> Option<Arc<dyn IdentityAdapter>> {
        self.bound.get().map(|b| b.adapter.clone())
    }

    pub fn revision(&self) -> Option<ProtocolRevision> {
        self.bound.get().map(|b| b.revision)
    }

    pub fn requires_signed_textures(&self, revision: ProtocolRevision) -> bool {
        self.signed_overrides
            .get(&revision)
            .copied()
            .unwrap_or_else(|| revision.requires_signed_textures_by_default())
    }
}
