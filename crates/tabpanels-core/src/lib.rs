//! # tabpanels-core
//!
//! Core functionality for tabpanels - rendering a custom tabs markup inside
//! fenced code blocks into tabbed panels, and mirroring the structural
//! references found inside those blocks into a shared document index.
//!
//! ## Architecture
//!
//! The crate is organized around the two halves of the system:
//!
//! - **Rendering**: fence scanning, tab splitting, per-tab directive
//!   parsing, and panel assembly against a host-supplied markdown renderer
//! - **Indexing**: reference extraction with host-compatible coordinates,
//!   idempotent merging into the externally owned document index, and a
//!   persisted per-path snapshot
//!
//! ## Quick Start
//!
//! ```rust
//! use tabpanels_core::{extract, DocumentIndex, Settings};
//!
//! let settings = Settings::default();
//! let text = "```tabs\n--- Tab\n# Heading\n[[Note]]\n```\n";
//!
//! let refs = extract::extract_document(text, settings.keyword())?;
//! assert_eq!(refs.headings.len(), 1);
//!
//! let mut index = DocumentIndex::new();
//! index.merge("note.md", refs);
//! assert!(index.entry("note.md").is_some());
//! # Ok::<(), tabpanels_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`]. Malformed block
//! content never fails: unterminated fences, ambiguous markers, and missing
//! newlines all recover to a defined fallback. Failures are limited to
//! unusable configuration and persistence problems, and none of them are
//! fatal to the host.

/// Settings for block recognition, rendering and indexing
pub mod config;
/// Event-driven sync between documents, index, and snapshot
pub mod engine;
/// Error types and result aliases
pub mod error;
/// Structural reference extraction from plugin-owned blocks
pub mod extract;
/// Fenced-block delimiter scanning
pub mod fence;
/// Collaborator seams toward the host application
pub mod host;
/// Merging extracted records into the shared document index
pub mod index;
/// Panel assembly and the DOM-like element model
pub mod panel;
/// Persisted snapshot of the plugin-owned index contributions
pub mod snapshot;
/// Splitting block text into an ordered tab sequence
pub mod splitter;
/// Per-tab directive parsing from the title line
pub mod title;
/// Core data types and structures
pub mod types;

// Re-export commonly used types
pub use config::Settings;
pub use engine::{RebuildSummary, SyncEngine};
pub use error::{Error, Result};
pub use host::{DocumentHost, MarkdownRenderer, MemoryHost};
pub use index::{DocumentIndex, LinkCountTable};
pub use panel::{Element, PanelBuilder, TabPanel, retry_with_backoff};
pub use snapshot::{Snapshot, SnapshotStore};
pub use splitter::{Tab, TabSplit, split};
pub use title::{TabAttributes, parse_title};
pub use types::*;
