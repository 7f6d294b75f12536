//! Rebuild the index and snapshot from a notes directory.

use crate::hostfs::FsHost;
use anyhow::Result;
use std::path::Path;
use tabpanels_core::engine::SyncEngine;
use tabpanels_core::snapshot::SnapshotStore;
use tabpanels_core::{DocumentIndex, Settings};

/// Walk `dir`, merge every document, and rewrite the snapshot.
pub fn execute(dir: &Path, settings: &Settings, store: &SnapshotStore) -> Result<()> {
    let host = FsHost::new(dir);
    let engine = SyncEngine::new(&host, settings, store);

    let mut index = DocumentIndex::new();
    let summary = engine.rebuild_all(&mut index)?;

    println!(
        "Rebuilt {} documents in {:.1?}: {} with records",
        summary.documents, summary.elapsed, summary.indexed
    );
    for path in index.paths() {
        if let Some(entry) = index.entry(path) {
            println!("  {path}: {} records", entry.len());
        }
    }
    println!("Snapshot written to {}", store.snapshot_path().display());

    Ok(())
}
