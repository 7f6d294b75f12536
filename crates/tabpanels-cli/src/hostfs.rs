//! Filesystem host: a notes directory as the document set.
//!
//! Document paths are keyed relative to the notes root, with `/` separators
//! on every platform so index keys and snapshot entries stay portable.

use std::fs;
use std::path::{Path, PathBuf};
use tabpanels_core::host::{DocumentHost, MarkdownRenderer};
use tabpanels_core::panel::Element;
use tracing::warn;

/// [`DocumentHost`] over a directory of markdown files.
#[derive(Debug, Clone)]
pub struct FsHost {
    root: PathBuf,
}

impl FsHost {
    /// Create a host over `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn collect_markdown(&self, dir: &Path, out: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read directory");
                return;
            },
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.collect_markdown(&path, out);
            } else if path.extension().is_some_and(|ext| ext == "md") {
                if let Ok(rel) = path.strip_prefix(&self.root) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
    }
}

impl DocumentHost for FsHost {
    fn read_document(&self, path: &str) -> Option<String> {
        fs::read_to_string(self.root.join(path)).ok()
    }

    fn all_document_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_markdown(&self.root, &mut paths);
        paths.sort();
        paths
    }

    fn resolve_link_target(&self, raw_target: &str, _source_path: &str) -> Option<String> {
        if self.root.join(raw_target).is_file() {
            return Some(raw_target.to_string());
        }
        let with_ext = format!("{raw_target}.md");
        if self.root.join(&with_ext).is_file() {
            return Some(with_ext);
        }
        // Vault-style shortest-path lookup: any document whose stem matches.
        self.all_document_paths().into_iter().find(|path| {
            Path::new(path)
                .file_stem()
                .is_some_and(|stem| stem == raw_target)
        })
    }
}

/// Renderer that records markdown verbatim as element text. Real rendering
/// belongs to the host application; the CLI only needs the panel structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl MarkdownRenderer for PlainRenderer {
    fn render(&mut self, markdown: &str, target: &mut Element, _source_path: &str) {
        if !target.text.is_empty() {
            target.text.push('\n');
        }
        target.text.push_str(markdown);
    }
}
