//! Core data types for tab splitting and reference extraction.
//!
//! Coordinates follow the host convention: `line` is the zero-based line
//! number from document start, `col` the character index within that line,
//! and `offset` the absolute character index from document start. Records
//! extracted from inside a plugin block are translated into full-document
//! coordinates before they are handed to the merge engine.

use serde::{Deserialize, Serialize};

/// A single point in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    /// Zero-based line number from document start.
    pub line: usize,
    /// Character index within the line where the match begins.
    pub col: usize,
    /// Absolute character index from document start.
    pub offset: usize,
}

impl Loc {
    /// Create a location.
    #[must_use]
    pub const fn new(line: usize, col: usize, offset: usize) -> Self {
        Self { line, col, offset }
    }
}

/// A half-open region of a document, start inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Where the match begins.
    pub start: Loc,
    /// Where the match ends.
    pub end: Loc,
}

impl Span {
    /// Span covering `len` characters starting at `start`.
    ///
    /// The end location stays on the start line; records that continue onto
    /// a following physical line (footnote definition bodies) keep this
    /// convention to stay bit-exact with the host's coordinate system.
    #[must_use]
    pub const fn from_len(start: Loc, len: usize) -> Self {
        Self {
            start,
            end: Loc::new(start.line, start.col + len, start.offset + len),
        }
    }
}

/// A wiki-style link or embed: `[[target]]`, `[[target|display]]`,
/// optionally prefixed with `!` for embeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    /// Raw link target, before host path resolution.
    pub target: String,
    /// Display text; defaults to the target when no `|display` part exists.
    pub display_text: String,
    /// The full matched text, brackets included.
    pub original: String,
    /// Position of the match.
    pub span: Span,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) from_tab_panels: bool,
}

/// An ATX heading: 1-6 `#` characters, a space, then the heading text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRef {
    /// Heading text with trailing whitespace trimmed.
    pub heading: String,
    /// Heading level, 1-6.
    pub level: u8,
    /// Position of the match.
    pub span: Span,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) from_tab_panels: bool,
}

/// A hashtag-style tag, `#` included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// The tag text including the leading `#`.
    pub tag: String,
    /// Position of the match.
    pub span: Span,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) from_tab_panels: bool,
}

/// An inline footnote or footnote definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteRef {
    /// Footnote id. Inline footnotes use the `[inline<n>` scheme; the index
    /// is kept contiguous across the whole document by the merge engine.
    pub id: String,
    /// Position of the match.
    pub span: Span,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) from_tab_panels: bool,
}

/// A footnote definition section: `[^name]: body`, where the body may
/// continue onto exactly one additional physical line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteSectionRef {
    /// The footnote name between `[^` and `]`.
    pub footnote_id: String,
    /// Position of the match, shared with the paired [`FootnoteRef`].
    pub span: Span,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) from_tab_panels: bool,
}

/// Common access to the ownership tag and position of an index record.
///
/// The merge engine only ever touches the ownership tag through this trait,
/// so an alternate partition strategy (a shadow map of record ids, say) can
/// replace the boolean without changing the merge contract.
pub trait IndexRecord {
    /// Whether this record was contributed by the tab-panels extractor, as
    /// opposed to the host's own parser.
    fn is_plugin_owned(&self) -> bool;
    /// Set the ownership tag.
    fn set_plugin_owned(&mut self, owned: bool);
    /// Position of the record.
    fn span(&self) -> &Span;
}

macro_rules! impl_index_record {
    ($($ty:ty),+) => {
        $(impl IndexRecord for $ty {
            fn is_plugin_owned(&self) -> bool {
                self.from_tab_panels
            }

            fn set_plugin_owned(&mut self, owned: bool) {
                self.from_tab_panels = owned;
            }

            fn span(&self) -> &Span {
                &self.span
            }
        })+
    };
}

impl_index_record!(LinkRef, HeadingRef, TagRef, FootnoteRef, FootnoteSectionRef);

/// The per-document record collections produced by one extraction pass and
/// held per path inside the shared index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRefs {
    /// Wiki links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkRef>,
    /// Embeds (`![[...]]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<LinkRef>,
    /// ATX headings, kept sorted by start offset after merge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<HeadingRef>,
    /// Hashtag-style tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRef>,
    /// Inline footnotes and footnote definitions, kept sorted by start
    /// offset after merge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<FootnoteRef>,
    /// Footnote definition sections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnote_sections: Vec<FootnoteSectionRef>,
}

impl DocumentRefs {
    /// True when no record of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
            && self.embeds.is_empty()
            && self.headings.is_empty()
            && self.tags.is_empty()
            && self.footnotes.is_empty()
            && self.footnote_sections.is_empty()
    }

    /// Total record count across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
            + self.embeds.len()
            + self.headings.len()
            + self.tags.len()
            + self.footnotes.len()
            + self.footnote_sections.len()
    }

    /// Tag every record in every collection with the given ownership.
    pub fn set_all_plugin_owned(&mut self, owned: bool) {
        for r in &mut self.links {
            r.set_plugin_owned(owned);
        }
        for r in &mut self.embeds {
            r.set_plugin_owned(owned);
        }
        for r in &mut self.headings {
            r.set_plugin_owned(owned);
        }
        for r in &mut self.tags {
            r.set_plugin_owned(owned);
        }
        for r in &mut self.footnotes {
            r.set_plugin_owned(owned);
        }
        for r in &mut self.footnote_sections {
            r.set_plugin_owned(owned);
        }
    }

    /// Append all records from `other`, preserving their ownership tags.
    pub fn append(&mut self, other: Self) {
        self.links.extend(other.links);
        self.embeds.extend(other.embeds);
        self.headings.extend(other.headings);
        self.tags.extend(other.tags);
        self.footnotes.extend(other.footnotes);
        self.footnote_sections.extend(other.footnote_sections);
    }
}
