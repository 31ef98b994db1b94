//! The durable snapshot file
//!
//! One file, written and read wholesale. Writes go through a temporary file
//! in the same directory and an atomic rename, so a reader sees either the
//! previous snapshot or the new one. There is no locking: the last snapshot
//! wins and suites are expected to run serially.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

use super::StorageState;

/// Result of loading a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { entries: usize, cookies: usize },
    /// No snapshot file exists yet
    Missing,
    /// The file exists but could not be read or parsed
    Corrupt(String),
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::Restored { .. })
    }
}

fn write_error(path: &Path, error: &dyn std::fmt::Display) -> Error {
    Error::SnapshotWrite {
        path: path.display().to_string(),
        error: error.to_string(),
    }
}

/// Handle to the snapshot file shared by all suites of a run
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the snapshot
    ///
    /// Never fails: a missing or corrupt file yields empty storage and an
    /// outcome describing why, so consumers see absent values rather than a
    /// crash.
    pub fn load(&self) -> (StorageState, RestoreOutcome) {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (StorageState::default(), RestoreOutcome::Missing)
            }
            Err(e) => return (StorageState::default(), RestoreOutcome::Corrupt(e.to_string())),
        };

        match serde_json::from_slice::<StorageState>(&content) {
            Ok(state) => {
                let outcome = RestoreOutcome::Restored {
                    entries: state.local_storage.len(),
                    cookies: state.cookies.len(),
                };
                (state, outcome)
            }
            Err(e) => (StorageState::default(), RestoreOutcome::Corrupt(e.to_string())),
        }
    }

    /// Replace the snapshot with `state`
    pub fn save(&self, state: &StorageState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| write_error(&self.path, &e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| write_error(&self.path, &e))?;
        serde_json::to_writer_pretty(&mut temp, state).map_err(|e| write_error(&self.path, &e))?;
        temp.write_all(b"\n").map_err(|e| write_error(&self.path, &e))?;
        temp.as_file().sync_all().map_err(|e| write_error(&self.path, &e))?;
        temp.persist(&self.path).map_err(|e| write_error(&self.path, &e.error))?;

        tracing::debug!(
            path = %self.path.display(),
            entries = state.local_storage.len(),
            "snapshot written"
        );
        Ok(())
    }

    /// Delete the snapshot file, returning whether one existed
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Cookie;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("state.json"));
        let (state, outcome) = file.load();
        assert_eq!(outcome, RestoreOutcome::Missing);
        assert!(state.local_storage.is_empty());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let (state, outcome) = SnapshotFile::new(&path).load();
        assert!(matches!(outcome, RestoreOutcome::Corrupt(_)));
        assert!(state.local_storage.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested").join("state.json"));

        let mut state = StorageState::default();
        state.local_storage.insert("personId".into(), "P-123".into());
        state.set_cookie(Cookie::new("SESSION", "abc"));
        file.save(&state).unwrap();

        let (loaded, outcome) = file.load();
        assert_eq!(outcome, RestoreOutcome::Restored { entries: 1, cookies: 1 });
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("state.json"));

        let mut first = StorageState::default();
        first.local_storage.insert("a".into(), "1".into());
        file.save(&first).unwrap();

        let mut second = StorageState::default();
        second.local_storage.insert("b".into(), "2".into());
        file.save(&second).unwrap();

        let (loaded, _) = file.load();
        assert_eq!(loaded.local_storage.get("a"), None);
        assert_eq!(loaded.local_storage.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("state.json"));
        assert!(!file.clear().unwrap());
        file.save(&StorageState::default()).unwrap();
        assert!(file.clear().unwrap());
        assert!(!file.exists());
    }
}
