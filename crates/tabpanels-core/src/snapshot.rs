//! Persisted snapshot of the plugin-owned index contributions.
//!
//! The snapshot is one JSON file mapping document path to that path's
//! extracted record collections. It is written after every merge and on
//! rebuild, and read back at startup to pre-populate the host index before
//! any live events fire. Writes go through a temp file and an atomic rename
//! so a crash mid-write never corrupts the previous snapshot.

use crate::error::{Error, Result};
use crate::types::DocumentRefs;
use chrono::{DateTime, Utc};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SNAPSHOT_FILE: &str = "snapshot.json";

/// The on-disk snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Document path → extracted record collections.
    #[serde(default)]
    pub entries: BTreeMap<String, DocumentRefs>,
}

/// Local filesystem store for the snapshot file.
pub struct SnapshotStore {
    root_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the default data directory.
    ///
    /// `TABPANELS_DATA_DIR` overrides the location explicitly; otherwise
    /// the platform data directory is used, with `~/.tabpanels` as the
    /// last-resort fallback.
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var("TABPANELS_DATA_DIR") {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Self::with_root(PathBuf::from(trimmed));
            }
        }

        if let Some(dirs) = ProjectDirs::from("", "", "tabpanels") {
            return Self::with_root(dirs.data_dir().to_path_buf());
        }

        let home = BaseDirs::new()
            .ok_or_else(|| Error::Storage("Failed to determine home directory".into()))?;
        Self::with_root(home.home_dir().join(".tabpanels"))
    }

    /// Create a store rooted at an explicit directory.
    pub fn with_root(root_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root_dir)
            .map_err(|e| Error::Storage(format!("Failed to create data directory: {e}")))?;
        Ok(Self { root_dir })
    }

    /// The store's root directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.root_dir.join(SNAPSHOT_FILE)
    }

    /// Load the snapshot; a missing file yields an empty snapshot.
    pub fn load(&self) -> Result<Snapshot> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(Snapshot::default());
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read snapshot: {e}")))?;
        let snapshot = serde_json::from_str(&json)
            .map_err(|e| Error::Storage(format!("Failed to parse snapshot: {e}")))?;
        Ok(snapshot)
    }

    /// Write the full entry map, stamping the generation time.
    pub fn save(&self, entries: &BTreeMap<String, DocumentRefs>) -> Result<()> {
        let snapshot = Snapshot {
            generated_at: Some(Utc::now()),
            entries: entries.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::Storage(format!("Failed to serialize snapshot: {e}")))?;

        let path = self.snapshot_path();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| Error::Storage(format!("Failed to write snapshot: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to remove existing snapshot: {e}")))?;
        }

        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Storage(format!("Failed to commit snapshot: {e}")))?;

        debug!(entries = entries.len(), "saved snapshot");
        Ok(())
    }

    /// Insert or replace one path's entry and persist.
    pub fn update_entry(&self, path: &str, refs: &DocumentRefs) -> Result<()> {
        let mut snapshot = self.load()?;
        snapshot.entries.insert(path.to_string(), refs.clone());
        self.save(&snapshot.entries)
    }

    /// Remove one path's entry and persist. Removing an absent entry is a
    /// no-op.
    pub fn remove_entry(&self, path: &str) -> Result<()> {
        let mut snapshot = self.load()?;
        if snapshot.entries.remove(path).is_some() {
            self.save(&snapshot.entries)?;
        }
        Ok(())
    }

    /// Move one path's entry to a new key verbatim and persist.
    pub fn rename_entry(&self, old_path: &str, new_path: &str) -> Result<()> {
        let mut snapshot = self.load()?;
        if let Some(entry) = snapshot.entries.remove(old_path) {
            snapshot.entries.insert(new_path.to_string(), entry);
            self.save(&snapshot.entries)?;
        }
        Ok(())
    }

    /// Drop every entry and persist an empty snapshot.
    pub fn clear(&self) -> Result<()> {
        self.save(&BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use crate::types::Loc;
    use tempfile::TempDir;

    fn create_test_store() -> (SnapshotStore, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = SnapshotStore::with_root(temp_dir.path().to_path_buf()).expect("store");
        (store, temp_dir)
    }

    fn sample_refs() -> DocumentRefs {
        extract::extract_block("# Title\n[[Note]]\n", Loc::new(1, 0, 10))
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let (store, _dir) = create_test_store();
        let snapshot = store.load().expect("load");
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.generated_at.is_none());
    }

    #[test]
    fn save_and_load_round_trips() {
        let (store, _dir) = create_test_store();
        let mut entries = BTreeMap::new();
        entries.insert("a.md".to_string(), sample_refs());

        store.save(&entries).expect("save");
        let snapshot = store.load().expect("load");

        assert_eq!(snapshot.entries, entries);
        assert!(snapshot.generated_at.is_some());
        assert!(store.snapshot_path().exists());
    }

    #[test]
    fn update_entry_replaces_only_that_path() {
        let (store, _dir) = create_test_store();
        store.update_entry("a.md", &sample_refs()).expect("update a");
        store.update_entry("b.md", &sample_refs()).expect("update b");

        let empty = DocumentRefs::default();
        store.update_entry("a.md", &empty).expect("replace a");

        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.entries.get("a.md"), Some(&empty));
        assert_eq!(snapshot.entries.get("b.md"), Some(&sample_refs()));
    }

    #[test]
    fn remove_entry_deletes_the_key() {
        let (store, _dir) = create_test_store();
        store.update_entry("a.md", &sample_refs()).expect("update");
        store.remove_entry("a.md").expect("remove");
        store.remove_entry("a.md").expect("second remove is a no-op");

        let snapshot = store.load().expect("load");
        assert!(snapshot.entries.is_empty());
    }

    #[test]
    fn rename_entry_moves_the_value_verbatim() {
        let (store, _dir) = create_test_store();
        let refs = sample_refs();
        store.update_entry("a.md", &refs).expect("update");
        store.rename_entry("a.md", "b.md").expect("rename");

        let snapshot = store.load().expect("load");
        assert!(!snapshot.entries.contains_key("a.md"));
        assert_eq!(snapshot.entries.get("b.md"), Some(&refs));
    }

    #[test]
    fn clear_empties_the_snapshot() {
        let (store, _dir) = create_test_store();
        store.update_entry("a.md", &sample_refs()).expect("update");
        store.clear().expect("clear");
        assert!(store.load().expect("load").entries.is_empty());
    }
}
