use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    time::Duration,
};

use masquerade_shared::anyhow;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Serializer, ser::PrettyFormatter};

use crate::data::ProtocolRevision;

/* stinky serde defaults */

fn default_server_version() -> String {
    "1.20.4-R0.1-SNAPSHOT".to_owned()
}

fn default_tps() -> u32 {
    20
}

fn default_view_distance() -> f64 {
    160.0
}

fn default_max_profiles_per_owner() -> usize {
    3
}

fn default_texture_ttl_secs() -> u64 {
    6 * 60 * 60
}

fn default_resolve_timeout_secs() -> u64 {
    5
}

fn default_autosave_interval_secs() -> u64 {
    60
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("profiles.json")
}

fn default_session_url() -> String {
    "https://sessionserver.mojang.com".to_owned()
}

fn default_api_url() -> String {
    "https://api.mojang.com".to_owned()
}

/* end stinky serde defaults */

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// version string the server reports, decides which identity adapter is used
    #[serde(default = "default_server_version")]
    pub server_version: String,
    #[serde(default = "default_tps")]
    pub tps: u32,
    /// how far away (in blocks) other players can see a player
    #[serde(default = "default_view_distance")]
    pub view_distance: f64,
    #[serde(default = "default_max_profiles_per_owner")]
    pub max_profiles_per_owner: usize,

    // skins
    #[serde(default = "default_texture_ttl_secs")]
    pub texture_ttl_secs: u64,
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,
    #[serde(default = "default_session_url")]
    pub session_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// overrides whether a revision refuses unsigned textures
    #[serde(default)]
    pub signed_textures: BTreeMap<ProtocolRevision, bool>,

    // persistence
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    #[serde(default)]
    pub log_to_file: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_version: default_server_version(),
            tps: default_tps(),
            view_distance: default_view_distance(),
            max_profiles_per_owner: default_max_profiles_per_owner(),
            texture_ttl_secs: default_texture_ttl_secs(),
            resolve_timeout_secs: default_resolve_timeout_secs(),
            session_url: default_session_url(),
            api_url: default_api_url(),
            signed_textures: BTreeMap::new(),
            autosave_interval_secs: default_autosave_interval_secs(),
            storage_path: default_storage_path(),
            log_to_file: false,
        }
    }
}

impl ServerConfig {
    pub fn load(source: &Path) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(File::open(source)?)?)
    }

    pub fn save(&self, dest: &Path) -> anyhow::Result<()> {
        let writer = OpenOptions::new().write(true).create(true).truncate(true).open(dest)?;

        // 4 spaces
        let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;

        Ok(())
    }

    /// Load the config at `path`, or write the defaults there if it does not exist yet.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tps.max(1)
    }

    pub fn texture_ttl(&self) -> Duration {
        Duration::from_secs(self.texture_ttl_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn signed_texture_overrides(&self) -> FxHashMap<ProtocolRevision, bool> {
        self.signed_textures.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"tps": 10, "signed_textures": {"v1_20_R3": true}}"#).unwrap();

        assert_eq!(config.tps, 10);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.max_profiles_per_owner, 3);
        assert_eq!(config.texture_ttl(), Duration::from_secs(21600));
        assert_eq!(config.signed_texture_overrides().get(&ProtocolRevision::V1_20_R3), Some(&true));
    }

    #[test]
    fn created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("masquerade.json");

        let config = ServerConfig::load_or_create(&path).unwrap();
        assert_eq!(config.server_version, "1.20.4-R0.1-SNAPSHOT");
        assert!(path.exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"server_version\""));
        assert_eq!(ServerConfig::load(&path).unwrap().storage_path, PathBuf::from("profiles.json"));
    }
}
