//! Snapshotting and restoring the dispatcher's (x, y, state) to disk as
//! JSON (spec.md §4.D "persistence").

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::DispatcherError;

/// The persisted shape: studio names (not objects — names are how the
/// dispatcher resolves studios back to its configured set on restore) plus
/// the FSM state name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedState {
    pub x: String,
    pub y: String,
    pub state: String,
}

/// Saves and loads [`PersistedState`] snapshots to a fixed path.
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> PersistenceStore {
        PersistenceStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, state: &PersistedState) -> Result<(), DispatcherError> {
        let json = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Loads the snapshot. A missing file is reported via `Ok(None)` — the
    /// caller logs it as a warning and falls back to defaults, matching
    /// the original's "no prior state is unremarkable on first boot"
    /// behavior. A present-but-malformed file is a hard error: the caller
    /// should treat that as critical, since it means the on-disk state is
    /// not merely absent but lying (spec.md §4.D).
    pub async fn load(&self) -> Result<Option<PersistedState>, DispatcherError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("nested").join("state.json"));
        let state = PersistedState {
            x: "studio-a".into(),
            y: "studio-b".into(),
            state: "XYAuto".into(),
        };
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn malformed_file_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = PersistenceStore::new(path);
        assert!(store.load().await.is_err());
    }
}
