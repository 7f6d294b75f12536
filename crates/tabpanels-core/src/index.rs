//! Merging freshly extracted records into the shared document index.
//!
//! The index is externally owned: the host (and other tooling) contributes
//! its own records, and every core operation takes the index as an explicit
//! parameter. Records contributed here are tagged as plugin-owned so a later
//! merge can strip exactly its own prior contributions before re-merging.
//! That unmerge-then-merge step is the only concurrency safety net the
//! system has: redundant or interleaved change notifications simply re-run
//! the merge and land on the same state.

use crate::types::{DocumentRefs, IndexRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-document resolved/unresolved link counts, derived from the merged
/// plugin-owned links on every merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCountTable {
    /// Count per resolved target path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resolved: BTreeMap<String, usize>,
    /// Count per unresolved raw target.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unresolved: BTreeMap<String, usize>,
}

/// The shared, mutable, per-document structural index, keyed by document
/// path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentIndex {
    entries: BTreeMap<String, DocumentRefs>,
    link_counts: BTreeMap<String, LinkCountTable>,
}

impl DocumentIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The record collections for a path, if any.
    #[must_use]
    pub fn entry(&self, path: &str) -> Option<&DocumentRefs> {
        self.entries.get(path)
    }

    /// The derived link counts for a path, if any.
    #[must_use]
    pub fn link_counts(&self, path: &str) -> Option<&LinkCountTable> {
        self.link_counts.get(path)
    }

    /// Paths currently present in the index.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Install host-contributed records for a path, replacing any existing
    /// entry. Records keep whatever ownership tags they carry.
    pub fn set_entry(&mut self, path: &str, refs: DocumentRefs) {
        self.entries.insert(path.to_string(), refs);
    }

    /// Strip the plugin-owned records for a path, leaving host-contributed
    /// records untouched. The implicit first half of [`merge`](Self::merge).
    pub fn unmerge(&mut self, path: &str) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.links.retain(|r| !r.is_plugin_owned());
            entry.embeds.retain(|r| !r.is_plugin_owned());
            entry.headings.retain(|r| !r.is_plugin_owned());
            entry.tags.retain(|r| !r.is_plugin_owned());
            entry.footnotes.retain(|r| !r.is_plugin_owned());
            entry.footnote_sections.retain(|r| !r.is_plugin_owned());
        }
    }

    /// Merge freshly extracted records for a path.
    ///
    /// Prior plugin-owned records are dropped first, so re-parsing a path
    /// never duplicates or accumulates stale entries no matter how many
    /// times it fires. Headings and footnotes are re-sorted by start offset
    /// after the merge (host UI ordering depends on it; other kinds keep
    /// insertion order), and inline-footnote ids are renumbered over the
    /// merged collection so they stay contiguous. A path whose merged entry
    /// ends up holding no record at all is removed entirely.
    pub fn merge(&mut self, path: &str, mut fresh: DocumentRefs) {
        self.unmerge(path);
        fresh.set_all_plugin_owned(true);

        let entry = self.entries.entry(path.to_string()).or_default();
        entry.append(fresh);

        entry.headings.sort_by_key(|r| r.span().start.offset);
        entry.footnotes.sort_by_key(|r| r.span().start.offset);
        renumber_inline_footnotes(entry);

        if entry.is_empty() {
            debug!(path, "no structural records after merge, dropping entry");
            self.entries.remove(path);
            self.link_counts.remove(path);
        }
    }

    /// Rebuild the link-count table for a path from its merged plugin-owned
    /// links.
    ///
    /// This is a full rebuild keyed by path, never an increment on top of
    /// prior counts. Counts land under the *target* key: the resolved path
    /// on success, the raw target on failure.
    pub fn rebuild_link_counts<F>(&mut self, path: &str, resolve: F)
    where
        F: Fn(&str, &str) -> Option<String>,
    {
        let Some(entry) = self.entries.get(path) else {
            self.link_counts.remove(path);
            return;
        };

        let mut counts = LinkCountTable::default();
        for link in entry.links.iter().filter(|l| l.is_plugin_owned()) {
            match resolve(&link.target, path) {
                Some(resolved) => *counts.resolved.entry(resolved).or_insert(0) += 1,
                None => *counts.unresolved.entry(link.target.clone()).or_insert(0) += 1,
            }
        }
        self.link_counts.insert(path.to_string(), counts);
    }

    /// Remove a path entirely: all records (host-contributed included) and
    /// both link-count mappings. Used when the document is deleted.
    pub fn remove_entry(&mut self, path: &str) {
        self.entries.remove(path);
        self.link_counts.remove(path);
    }

    /// Re-key a path's entry and link counts verbatim, with no content
    /// transformation. Used when the document is renamed.
    pub fn rename_entry(&mut self, old_path: &str, new_path: &str) {
        if let Some(entry) = self.entries.remove(old_path) {
            self.entries.insert(new_path.to_string(), entry);
        }
        if let Some(counts) = self.link_counts.remove(old_path) {
            self.link_counts.insert(new_path.to_string(), counts);
        }
    }

    /// Number of indexed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no path is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reassign `[inline<n>` ids sequentially over the offset-sorted footnote
/// collection, leaving named footnotes alone.
fn renumber_inline_footnotes(entry: &mut DocumentRefs) {
    let mut next = 0usize;
    for footnote in &mut entry.footnotes {
        if footnote.id.starts_with("[inline") {
            footnote.id = format!("[inline{next}");
            next += 1;
        }
    }
}
