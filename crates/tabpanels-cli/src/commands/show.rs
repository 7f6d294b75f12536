//! Print the current snapshot as JSON.

use anyhow::Result;
use tabpanels_core::snapshot::SnapshotStore;

/// Load and dump the snapshot.
pub fn execute(store: &SnapshotStore) -> Result<()> {
    let snapshot = store.load()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
