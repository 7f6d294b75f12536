//! Event-driven synchronization between documents, the shared index, and
//! the persisted snapshot.
//!
//! The host forwards its change, rename, delete, and rebuild events here.
//! Invocations may interleave arbitrarily and even repeat with stale data;
//! there is no locking, and correctness rests entirely on the merge engine's
//! unmerge-then-merge idempotence. A record that slips through a race
//! survives at most one extra merge cycle and self-corrects on the next.

use crate::config::Settings;
use crate::error::Result;
use crate::extract;
use crate::host::DocumentHost;
use crate::index::DocumentIndex;
use crate::snapshot::SnapshotStore;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of a full rebuild, for user-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Documents visited.
    pub documents: usize,
    /// Documents that produced at least one structural record.
    pub indexed: usize,
    /// Wall time of the rebuild.
    pub elapsed: Duration,
}

/// Drives extraction and merging in response to host events.
///
/// The engine owns nothing: the index, host, and snapshot store are all
/// supplied by the caller, and every operation names the index it mutates.
pub struct SyncEngine<'a, H: DocumentHost> {
    host: &'a H,
    settings: &'a Settings,
    store: &'a SnapshotStore,
}

impl<'a, H: DocumentHost> SyncEngine<'a, H> {
    /// Create an engine over the given collaborators.
    #[must_use]
    pub const fn new(host: &'a H, settings: &'a Settings, store: &'a SnapshotStore) -> Self {
        Self {
            host,
            settings,
            store,
        }
    }

    /// Handle a document-changed event: re-extract, re-merge, re-persist.
    ///
    /// Safe to call repeatedly with the same text; the merged index and the
    /// snapshot land on the same state every time. Snapshot write failures
    /// on this per-edit path are logged, not surfaced: the in-memory index
    /// stays correct for the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) only when the
    /// configured block keyword is unusable.
    pub fn document_changed(
        &self,
        index: &mut DocumentIndex,
        path: &str,
        text: &str,
    ) -> Result<()> {
        if !self.settings.enable_indexing {
            return Ok(());
        }

        let refs = extract::extract_document(text, self.settings.keyword())?;
        let persist = if refs.is_empty() {
            self.store.remove_entry(path)
        } else {
            self.store.update_entry(path, &refs)
        };

        index.merge(path, refs);
        index.rebuild_link_counts(path, |target, source| {
            self.host.resolve_link_target(target, source)
        });

        if let Err(e) = persist {
            warn!(path, error = %e, "snapshot autosave failed, index unchanged on disk");
        }
        Ok(())
    }

    /// Handle a rename: re-key the index entry and the snapshot entry
    /// verbatim.
    pub fn document_renamed(&self, index: &mut DocumentIndex, old_path: &str, new_path: &str) {
        index.rename_entry(old_path, new_path);
        if !self.settings.enable_indexing {
            return;
        }
        if let Err(e) = self.store.rename_entry(old_path, new_path) {
            warn!(old_path, new_path, error = %e, "snapshot rename failed");
        }
    }

    /// Handle a delete: drop the path from the index and the snapshot.
    pub fn document_deleted(&self, index: &mut DocumentIndex, path: &str) {
        index.remove_entry(path);
        if !self.settings.enable_indexing {
            return;
        }
        if let Err(e) = self.store.remove_entry(path) {
            warn!(path, error = %e, "snapshot delete failed");
        }
    }

    /// Rebuild the whole document set sequentially and rewrite the snapshot
    /// from scratch.
    ///
    /// This is an explicit, user-triggered operation, so persistence
    /// failures are surfaced instead of being logged away. Individual
    /// unreadable documents are skipped without failing the rest.
    ///
    /// # Errors
    ///
    /// Returns an error when the keyword is unusable or the snapshot cannot
    /// be written.
    pub fn rebuild_all(&self, index: &mut DocumentIndex) -> Result<RebuildSummary> {
        let start = Instant::now();
        let mut entries = BTreeMap::new();
        let mut documents = 0usize;

        for path in self.host.all_document_paths() {
            documents += 1;
            let Some(text) = self.host.read_document(&path) else {
                warn!(path, "document listed but unreadable, skipping");
                continue;
            };

            let refs = extract::extract_document(&text, self.settings.keyword())?;
            if !refs.is_empty() {
                entries.insert(path.clone(), refs.clone());
            }
            index.merge(&path, refs);
            index.rebuild_link_counts(&path, |target, source| {
                self.host.resolve_link_target(target, source)
            });
        }

        self.store.save(&entries)?;

        let summary = RebuildSummary {
            documents,
            indexed: entries.len(),
            elapsed: start.elapsed(),
        };
        info!(
            documents = summary.documents,
            indexed = summary.indexed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "rebuilt index"
        );
        Ok(summary)
    }

    /// Pre-populate the index from the persisted snapshot at startup.
    ///
    /// Entries whose path no longer exists in the host's document set are
    /// pruned from the snapshot. Returns the number of paths merged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) when the snapshot
    /// cannot be read; the in-memory index is left untouched in that case.
    pub fn load_snapshot_into_index(&self, index: &mut DocumentIndex) -> Result<usize> {
        if !self.settings.enable_indexing {
            return Ok(0);
        }

        let snapshot = self.store.load()?;
        let mut merged = 0usize;
        let mut pruned = Vec::new();

        for (path, refs) in snapshot.entries {
            if self.host.read_document(&path).is_none() {
                warn!(path, "snapshot entry for missing document, pruning");
                pruned.push(path);
                continue;
            }
            index.merge(&path, refs);
            index.rebuild_link_counts(&path, |target, source| {
                self.host.resolve_link_target(target, source)
            });
            merged += 1;
        }

        for path in pruned {
            if let Err(e) = self.store.remove_entry(&path) {
                warn!(path, error = %e, "failed to prune stale snapshot entry");
            }
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use tempfile::TempDir;

    const DOC: &str = "intro\n```tabs\n--- A\n# Heading\n[[Other]]\n#tag\n```\n";

    fn indexing_settings() -> Settings {
        Settings {
            enable_indexing: true,
            ..Settings::default()
        }
    }

    fn test_store() -> (SnapshotStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let store = SnapshotStore::with_root(dir.path().to_path_buf()).expect("store");
        (store, dir)
    }

    #[test]
    fn change_event_merges_and_persists() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        host.insert("Other.md", "target");
        let settings = indexing_settings();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut index = DocumentIndex::new();
        engine.document_changed(&mut index, "a.md", DOC).expect("change");

        let entry = index.entry("a.md").expect("entry");
        assert_eq!(entry.headings.len(), 1);
        assert_eq!(entry.links.len(), 1);
        assert_eq!(entry.tags.len(), 1);

        let counts = index.link_counts("a.md").expect("counts");
        assert_eq!(counts.resolved.get("Other.md"), Some(&1));

        let snapshot = store.load().expect("load");
        assert!(snapshot.entries.contains_key("a.md"));
    }

    #[test]
    fn duplicate_notifications_are_idempotent() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        let settings = indexing_settings();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut once = DocumentIndex::new();
        engine.document_changed(&mut once, "a.md", DOC).expect("change");
        let snapshot_once = store.load().expect("load").entries;

        let mut twice = DocumentIndex::new();
        engine.document_changed(&mut twice, "a.md", DOC).expect("change");
        engine.document_changed(&mut twice, "a.md", DOC).expect("change");
        let snapshot_twice = store.load().expect("load").entries;

        assert_eq!(once, twice);
        assert_eq!(snapshot_once, snapshot_twice);
    }

    #[test]
    fn indexing_disabled_is_a_noop() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        let settings = Settings::default();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut index = DocumentIndex::new();
        engine.document_changed(&mut index, "a.md", DOC).expect("change");

        assert!(index.is_empty());
        assert!(store.load().expect("load").entries.is_empty());
    }

    #[test]
    fn zero_record_parse_drops_index_and_snapshot_entries() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        let settings = indexing_settings();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut index = DocumentIndex::new();
        engine.document_changed(&mut index, "a.md", DOC).expect("change");
        engine
            .document_changed(&mut index, "a.md", "no blocks here\n")
            .expect("change");

        assert!(index.entry("a.md").is_none());
        assert!(store.load().expect("load").entries.is_empty());
    }

    #[test]
    fn rename_rekeys_index_and_snapshot() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        let settings = indexing_settings();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut index = DocumentIndex::new();
        engine.document_changed(&mut index, "a.md", DOC).expect("change");
        let before = index.entry("a.md").expect("entry").clone();

        engine.document_renamed(&mut index, "a.md", "b.md");

        assert!(index.entry("a.md").is_none());
        assert_eq!(index.entry("b.md"), Some(&before));
        let snapshot = store.load().expect("load");
        assert!(!snapshot.entries.contains_key("a.md"));
        assert!(snapshot.entries.contains_key("b.md"));
    }

    #[test]
    fn delete_drops_index_and_snapshot() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        let settings = indexing_settings();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut index = DocumentIndex::new();
        engine.document_changed(&mut index, "a.md", DOC).expect("change");
        engine.document_deleted(&mut index, "a.md");

        assert!(index.is_empty());
        assert!(store.load().expect("load").entries.is_empty());
    }

    #[test]
    fn rebuild_all_visits_every_document() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        host.insert("b.md", "plain, no blocks\n");
        host.insert("c.md", "```tabs\n[[a]]\n```\n");
        let settings = indexing_settings();
        let (store, _dir) = test_store();
        let engine = SyncEngine::new(&host, &settings, &store);

        let mut index = DocumentIndex::new();
        let summary = engine.rebuild_all(&mut index).expect("rebuild");

        assert_eq!(summary.documents, 3);
        assert_eq!(summary.indexed, 2);
        assert!(index.entry("a.md").is_some());
        assert!(index.entry("b.md").is_none());

        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.entries.len(), 2);
    }

    #[test]
    fn startup_load_merges_and_prunes() {
        let mut host = MemoryHost::new();
        host.insert("a.md", DOC);
        let settings = indexing_settings();
        let (store, _dir) = test_store();

        // Seed a snapshot holding one live and one stale path.
        {
            let engine = SyncEngine::new(&host, &settings, &store);
            let mut index = DocumentIndex::new();
            engine.document_changed(&mut index, "a.md", DOC).expect("change");
            engine
                .document_changed(&mut index, "gone.md", DOC)
                .expect("change");
        }
        host.remove("gone.md");

        let engine = SyncEngine::new(&host, &settings, &store);
        let mut index = DocumentIndex::new();
        let merged = engine.load_snapshot_into_index(&mut index).expect("load");

        assert_eq!(merged, 1);
        assert!(index.entry("a.md").is_some());
        assert!(index.entry("gone.md").is_none());
        assert!(!store.load().expect("load").entries.contains_key("gone.md"));
    }
}
