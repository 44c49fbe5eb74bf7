// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Snapshot persistence for the entity and link tables

use crate::types::{GraphStore, Snapshot};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Error type for snapshot operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while reading/writing
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The blob on disk belongs to another key
    #[error("snapshot for {found} stored under {expected}")]
    KeyMismatch {
        /// Key asked for
        expected: String,
        /// Key recorded in the snapshot
        found: String,
    },
}

/// Storage port for the tables of one session key
pub trait SnapshotStore {
    /// Load the tables for `key`. Returns `Ok(None)` when nothing is stored.
    fn load(&self, key: &str) -> Result<Option<GraphStore>, StoreError>;
    /// Persist the tables for `key`, replacing any earlier snapshot
    fn save(&self, key: &str, store: &GraphStore) -> Result<(), StoreError>;
}

/// Store snapshots as JSON files in a data directory
pub struct FsSnapshotStore {
    base: PathBuf,
}

impl FsSnapshotStore {
    /// Create a store rooted at `base`; the directory is created on first save
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory the snapshots live in
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File that holds the snapshot for `key`
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let filename = format!("{}.json", key.replace('%', "%25").replace('/', "%2F"));
        self.base.join(filename)
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<GraphStore>, StoreError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err)),
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.key != key {
            return Err(StoreError::KeyMismatch {
                expected: key.to_string(),
                found: snapshot.key,
            });
        }
        debug!("Loaded snapshot {} from {}", key, path.display());
        Ok(Some(snapshot.store))
    }

    fn save(&self, key: &str, store: &GraphStore) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base)?;
        let snapshot = Snapshot {
            key: key.to_string(),
            saved_at: Utc::now(),
            store: store.clone(),
        };
        let data = serde_json::to_vec_pretty(&snapshot)?;

        // Snapshots are replaced by rename, never rewritten in place
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, &path)?;
        debug!("Saved snapshot {} to {}", key, path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::ActGraph;
    use crate::types::Association;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// In-memory store for session tests
    #[derive(Default)]
    pub(crate) struct MemorySnapshotStore {
        pub(crate) blobs: RefCell<HashMap<String, GraphStore>>,
    }

    impl SnapshotStore for MemorySnapshotStore {
        fn load(&self, key: &str) -> Result<Option<GraphStore>, StoreError> {
            Ok(self.blobs.borrow().get(key).cloned())
        }

        fn save(&self, key: &str, store: &GraphStore) -> Result<(), StoreError> {
            self.blobs.borrow_mut().insert(key.to_string(), store.clone());
            Ok(())
        }
    }

    fn sample() -> GraphStore {
        let mut graph = ActGraph::new("https://en.wikipedia.org/wiki/Blur_(band)");
        graph
            .merge(
                0,
                "Blur",
                &[Association::new("Gorillaz", "https://en.wikipedia.org/wiki/Gorillaz")],
            )
            .unwrap();
        graph.into_store()
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(dir.path());

        assert!(store.load("Nobody").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(dir.path().join("nested"));
        let tables = sample();

        store.save("Blur_(band)", &tables).unwrap();
        let loaded = store.load("Blur_(band)").unwrap().unwrap();

        assert_eq!(loaded, tables);
        assert!(!store.path_for("Blur_(band)").with_extension("json.tmp").exists());
    }

    #[test]
    fn test_key_with_slash_stays_in_base() {
        let dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(dir.path());

        assert_eq!(store.path_for("AC/DC"), dir.path().join("AC%2FDC.json"));
        store.save("AC/DC", &sample()).unwrap();
        assert!(store.load("AC/DC").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(dir.path());
        fs::write(store.path_for("Broken"), "{ not json").unwrap();

        assert!(matches!(store.load("Broken"), Err(StoreError::Serde(_))));
    }

    #[test]
    fn test_key_mismatch_is_error() {
        let dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(dir.path());
        store.save("Blur", &sample()).unwrap();
        fs::copy(store.path_for("Blur"), store.path_for("Oasis")).unwrap();

        assert!(matches!(
            store.load("Oasis"),
            Err(StoreError::KeyMismatch { .. })
        ));
    }
}
