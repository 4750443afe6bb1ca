use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use masquerade_shared::SyncMutex;
use serde::Serialize;
use serde_json::{Serializer, ser::PrettyFormatter};

use super::{StoreResult, StoreSnapshot};

/// Where profile snapshots are persisted. Called off the tick thread.
pub trait ProfileBackend: Send + Sync + 'static {
    /// `None` if nothing was saved yet.
    fn load(&self) -> StoreResult<Option<StoreSnapshot>>;
    fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()>;
}

/// Stores the snapshot as a pretty printed JSON file. Saves write a temporary file and rename it over
/// the old one, so a crash mid-save leaves the previous snapshot intact.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProfileBackend for JsonFileBackend {
    fn load(&self) -> StoreResult<Option<StoreSnapshot>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let temp_path = self.temp_path();

        {
            let file = OpenOptions::new().write(true).create(true).truncate(true).open(&temp_path)?;
            let mut writer = BufWriter::new(file);

            let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
            snapshot.serialize(&mut serializer)?;

            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory, for tests and for running without persistence.
#[derive(Default)]
pub struct MemoryBackend {
    saved: SyncMutex<Option<StoreSnapshot>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            saved: SyncMutex::new(Some(snapshot)),
        }
    }
}

impl ProfileBackend for MemoryBackend {
    fn load(&self) -> StoreResult<Option<StoreSnapshot>> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        *self.saved.lock() = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::data::CharacterProfile;

    fn snapshot() -> StoreSnapshot {
        let owner = Uuid::new_v4();
        let profile = CharacterProfile::new(owner, "Alice", 100);

        let mut snapshot = StoreSnapshot::default();
        snapshot.active.insert(owner, profile.profile_id);
        snapshot.profiles.push(profile);
        snapshot
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("profiles.json"));

        assert_eq!(backend.load().unwrap(), None);

        let snapshot = snapshot();
        backend.save(&snapshot).unwrap();
        assert_eq!(backend.load().unwrap(), Some(snapshot));

        let text = fs::read_to_string(backend.path()).unwrap();
        assert!(text.contains("\n    \"profiles\""), "expected 4 space indent:\n{text}");
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn json_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("profiles.json"));

        backend.save(&snapshot()).unwrap();
        backend.save(&StoreSnapshot::default()).unwrap();
        assert_eq!(backend.load().unwrap(), Some(StoreSnapshot::default()));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonFileBackend::new(path).load(), Err(crate::store::StoreError::Storage(_))));
    }

    #[test]
    fn memory_backend() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.load().unwrap(), None);
        backend.save(&snapshot()).unwrap();
        assert!(backend.load().unwrap().is_some());
    }
}
