//! Collaborator seams toward the host application.
//!
//! The core never touches the host's vault, renderer, or path resolution
//! directly; it goes through these traits. Hosts inject implementations at
//! the call sites, the same way the snapshot store and document index are
//! passed in explicitly.

use crate::panel::Element;
use std::collections::BTreeMap;

/// Renders markdown text into a DOM-like target. Side-effecting; the core
/// consumes no return value.
pub trait MarkdownRenderer {
    /// Render `markdown` into `target`. `source_path` identifies the
    /// document the text came from, for host-side link resolution.
    fn render(&mut self, markdown: &str, target: &mut Element, source_path: &str);
}

/// Read access to the host's document set and link resolution.
pub trait DocumentHost {
    /// Full current text of a document, or `None` when the path does not
    /// exist. Missing documents are an expected transient condition.
    fn read_document(&self, path: &str) -> Option<String>;

    /// Every document path in the host's set, used by rebuild-all.
    fn all_document_paths(&self) -> Vec<String>;

    /// Resolve a raw link target against the host's path resolution, or
    /// `None` when the target maps to no existing document.
    fn resolve_link_target(&self, raw_target: &str, source_path: &str) -> Option<String>;
}

/// An in-memory [`DocumentHost`] over a path → text map.
///
/// Used by tests and by embedding hosts that already hold their documents in
/// memory. Link targets resolve like vault-style shortest-path lookups: an
/// exact path, the path with `.md` appended, or any document whose file stem
/// equals the target.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    documents: BTreeMap<String, String>,
}

impl MemoryHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&mut self, path: &str, text: &str) {
        self.documents.insert(path.to_string(), text.to_string());
    }

    /// Remove a document.
    pub fn remove(&mut self, path: &str) {
        self.documents.remove(path);
    }
}

impl DocumentHost for MemoryHost {
    fn read_document(&self, path: &str) -> Option<String> {
        self.documents.get(path).cloned()
    }

    fn all_document_paths(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    fn resolve_link_target(&self, raw_target: &str, _source_path: &str) -> Option<String> {
        if self.documents.contains_key(raw_target) {
            return Some(raw_target.to_string());
        }
        let with_ext = format!("{raw_target}.md");
        if self.documents.contains_key(&with_ext) {
            return Some(with_ext);
        }
        self.documents
            .keys()
            .find(|path| {
                std::path::Path::new(path)
                    .file_stem()
                    .is_some_and(|stem| stem == raw_target)
            })
            .cloned()
    }
}
