//! Structural reference extraction from plugin-owned blocks.
//!
//! [`find_blocks`] locates the plugin's own fenced blocks inside a full
//! document; [`extract_block`] scans one block's content line by line for
//! links, embeds, headings and tags, plus a multi-line pass for footnote
//! definition sections; [`extract_document`] combines the two and adds the
//! document-wide inline-footnote numbering. All record coordinates are
//! translated into full-document line/column/offset values so they slot
//! directly into the host's index.

use crate::error::{Error, Result};
use crate::fence;
use crate::types::{DocumentRefs, FootnoteRef, FootnoteSectionRef, HeadingRef, LinkRef, Loc, Span, TagRef};
use regex::Regex;
use std::sync::LazyLock;

/// Wiki links and embeds: `[[target]]`, `[[target|display]]`, `!` prefix
/// for embeds.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[\[([^|\]]+)(?:\|([^\]]+))?\]\]").unwrap());

/// ATX headings: 1-6 hashes, a required space, then the heading text.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^\S\r\n]*(#{1,6}) +(.*)").unwrap());

/// Hashtag-style tags: `#` then anything outside the punctuation exclusion
/// set.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#[^\s~!@#$%^&*()+={}|:;"'<>?`\[\]\\,.]+"#).unwrap());

/// Inline footnotes: `^[text]`.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static INLINE_FOOTNOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\^\[[^\^`\n]+\]").unwrap());

/// Footnote definition sections: `[^name]: body`, where the body may run
/// onto exactly one additional physical line.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static FOOTNOTE_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[\^([^\^`\n]+)\]:([^\^`\n]+(?:\n[^\^`\n]+)?)$").unwrap());

/// One plugin-owned block located inside a full document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Absolute offset where the block content begins (the character after
    /// the opening fence line's newline).
    pub content_start: usize,
    /// Absolute offset of the closing fence line start.
    pub content_end: usize,
    /// Full-document coordinates of the content start, used as the bias
    /// when extracting records from the block.
    pub base: Loc,
}

/// Locate every plugin-owned fenced block in `text`.
///
/// A block opens with a fence line whose info string starts with `keyword`
/// and closes at the next fence token with the *identical* token string. An
/// opening fence with no matching closer is not a block. Blocks never
/// overlap; an opening candidate inside a previous block's span is code.
///
/// The content start offset is derived from the opening line itself: indent,
/// fence token, info string and its newline, rather than any fixed constant.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the keyword cannot be compiled into the
/// opening-fence pattern.
pub fn find_blocks(text: &str, keyword: &str) -> Result<Vec<BlockSpan>> {
    let pattern = format!(
        r"(?m)^ {{0,3}}(`{{3,}}|~{{3,}}) *{}[ \w]*\n",
        regex::escape(keyword)
    );
    let re =
        Regex::new(&pattern).map_err(|e| Error::Parse(format!("invalid block keyword: {e}")))?;

    let fences = fence::scan(text);
    let mut blocks = Vec::new();
    let mut cursor = 0usize;

    for caps in re.captures_iter(text) {
        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < cursor {
            continue;
        }

        let content_start = whole.end();
        let Some(closer) = fences
            .iter()
            .find(|f| f.offset >= content_start && f.token == token.as_str())
        else {
            continue;
        };

        let line = count_newlines(&text[..whole.start()]) + 1;
        blocks.push(BlockSpan {
            content_start,
            content_end: closer.offset,
            base: Loc::new(line, 0, content_start),
        });
        cursor = closer.offset + closer.token.len();
    }

    Ok(blocks)
}

/// Extract position-tagged records from one block's raw text.
///
/// `base` supplies the line/offset bias translating in-block coordinates to
/// full-document coordinates. Inline footnotes are NOT handled here; their
/// numbering depends on the whole document (see [`extract_document`]).
#[must_use]
pub fn extract_block(block_text: &str, base: Loc) -> DocumentRefs {
    let mut refs = DocumentRefs::default();

    let mut offset = 0usize;
    for (line_idx, line) in block_text.split('\n').enumerate() {
        let line_no = base.line + line_idx;
        let line_base = base.offset + offset;
        parse_links_and_embeds(line, line_no, line_base, &mut refs);
        parse_heading(line, line_no, line_base, &mut refs);
        parse_tags(line, line_no, line_base, &mut refs);
        offset += line.len() + 1;
    }

    // Definition sections can span two physical lines, so they are parsed
    // over the whole block rather than per line.
    parse_footnote_sections(block_text, base, &mut refs);

    refs
}

/// Extract all records from every plugin-owned block in a full document,
/// inline footnotes included.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the configured keyword is unusable.
pub fn extract_document(text: &str, keyword: &str) -> Result<DocumentRefs> {
    let blocks = find_blocks(text, keyword)?;
    let mut refs = DocumentRefs::default();

    for block in &blocks {
        let block_text = &text[block.content_start..block.content_end];
        refs.append(extract_block(block_text, block.base));
    }

    collect_inline_footnotes(text, &blocks, &mut refs);
    Ok(refs)
}

fn parse_links_and_embeds(line: &str, line_no: usize, line_base: usize, out: &mut DocumentRefs) {
    for caps in LINK_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(target) = caps.get(1) else { continue };
        let display = caps.get(2).map_or(target.as_str(), |m| m.as_str());

        let col = whole.start();
        let start = Loc::new(line_no, col, line_base + col);
        let record = LinkRef {
            target: target.as_str().to_string(),
            display_text: display.to_string(),
            original: whole.as_str().to_string(),
            span: Span::from_len(start, whole.len()),
            from_tab_panels: false,
        };

        if whole.as_str().starts_with('!') {
            out.embeds.push(record);
        } else {
            out.links.push(record);
        }
    }
}

fn parse_heading(line: &str, line_no: usize, line_base: usize, out: &mut DocumentRefs) {
    let Some(caps) = HEADING_RE.captures(line) else {
        return;
    };
    let (Some(whole), Some(hashes), Some(text)) = (caps.get(0), caps.get(1), caps.get(2)) else {
        return;
    };

    let col = whole.start();
    let start = Loc::new(line_no, col, line_base + col);
    out.headings.push(HeadingRef {
        heading: text.as_str().trim_end().to_string(),
        level: hashes.len() as u8,
        span: Span::from_len(start, whole.len()),
        from_tab_panels: false,
    });
}

fn parse_tags(line: &str, line_no: usize, line_base: usize, out: &mut DocumentRefs) {
    for m in TAG_RE.find_iter(line) {
        let start = Loc::new(line_no, m.start(), line_base + m.start());
        out.tags.push(TagRef {
            tag: m.as_str().to_string(),
            span: Span::from_len(start, m.len()),
            from_tab_panels: false,
        });
    }
}

fn parse_footnote_sections(block_text: &str, base: Loc, out: &mut DocumentRefs) {
    let mut last_index = 0usize;
    let mut line_no = base.line;

    for caps in FOOTNOTE_DEF_RE.captures_iter(block_text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        line_no += count_newlines(&block_text[last_index..whole.start()]);
        last_index = whole.start();

        let start = Loc::new(line_no, 0, base.offset + whole.start());
        let span = Span::from_len(start, whole.len());

        // The definition contributes to both collections with one shared
        // position.
        out.footnotes.push(FootnoteRef {
            id: name.as_str().to_string(),
            span,
            from_tab_panels: false,
        });
        out.footnote_sections.push(FootnoteSectionRef {
            footnote_id: name.as_str().to_string(),
            span,
            from_tab_panels: false,
        });
    }
}

/// Inline footnotes are numbered across the whole document so their display
/// index stays continuous with footnotes outside any plugin block; only the
/// ones inside a block become records.
fn collect_inline_footnotes(text: &str, blocks: &[BlockSpan], out: &mut DocumentRefs) {
    if blocks.is_empty() {
        return;
    }

    for (index, m) in INLINE_FOOTNOTE_RE.find_iter(text).enumerate() {
        let inside = blocks
            .iter()
            .any(|b| m.start() >= b.content_start && m.start() < b.content_end);
        if !inside {
            continue;
        }

        let line = count_newlines(&text[..m.start()]);
        let col = text[..m.start()].rfind('\n').map_or(m.start(), |p| m.start() - p - 1);
        let start = Loc::new(line, col, m.start());
        out.footnotes.push(FootnoteRef {
            id: format!("[inline{index}"),
            span: Span::from_len(start, m.len()),
            from_tab_panels: false,
        });
    }
}

/// Count inline footnotes that occur strictly before `offset`.
///
/// Hosts use this to renumber a panel's rendered footnote references so they
/// continue the numbering of footnotes appearing earlier in the document.
#[must_use]
pub fn inline_footnotes_before(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    INLINE_FOOTNOTE_RE.find_iter(&text[..end]).count()
}

/// Heading counts (before the block, inside the block), computed with the
/// same heading pattern the extractor uses.
///
/// Outline-mapping hosts slice their own heading list with this window; a
/// count mismatch against independently rendered headings means the mapping
/// must be skipped for the document.
#[must_use]
pub fn heading_window(text: &str, block: &BlockSpan) -> (usize, usize) {
    let end = block.content_end.min(text.len());
    let start = block.content_start.min(end);
    let before = HEADING_RE.find_iter(&text[..start]).count();
    let inside = HEADING_RE.find_iter(&text[start..end]).count();
    (before, inside)
}

fn count_newlines(text: &str) -> usize {
    text.matches('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexRecord;

    #[test]
    fn finds_block_with_matching_closer() {
        let text = "intro\n```tabs\n# Inside\n```\nafter\n";
        let blocks = find_blocks(text, "tabs").expect("find");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content_start, 14);
        assert_eq!(blocks[0].content_end, 23);
        assert_eq!(blocks[0].base, Loc::new(2, 0, 14));
        assert_eq!(&text[blocks[0].content_start..blocks[0].content_end], "# Inside\n");
    }

    #[test]
    fn content_start_offset_is_derived_from_the_fence_line() {
        // Token (3) + space-less keyword "tabs" (4) + newline (1) = 8.
        let text = "```tabs\n[[A]]\n```\n";
        let blocks = find_blocks(text, "tabs").expect("find");
        assert_eq!(blocks[0].content_start, 8);
    }

    #[test]
    fn unclosed_block_is_not_a_block() {
        let blocks = find_blocks("```tabs\nno close", "tabs").expect("find");
        assert!(blocks.is_empty());
    }

    #[test]
    fn closer_must_match_token_exactly() {
        let text = "````tabs\ncontent\n```\nmore\n````\n";
        let blocks = find_blocks(text, "tabs").expect("find");

        assert_eq!(blocks.len(), 1);
        let content = &text[blocks[0].content_start..blocks[0].content_end];
        assert_eq!(content, "content\n```\nmore\n");
    }

    #[test]
    fn other_keywords_are_ignored() {
        let blocks = find_blocks("```python\nprint()\n```\n", "tabs").expect("find");
        assert!(blocks.is_empty());
    }

    #[test]
    fn tilde_fences_work_too() {
        let blocks = find_blocks("~~~tabs\nbody\n~~~\n", "tabs").expect("find");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn extraction_round_trip_with_base_bias() {
        let base = Loc::new(5, 0, 100);
        let refs = extract_block("# Title\n[[Note]]\n#tag1 #tag2\n", base);

        assert_eq!(refs.headings.len(), 1);
        assert_eq!(refs.headings[0].heading, "Title");
        assert_eq!(refs.headings[0].level, 1);
        assert_eq!(refs.headings[0].span.start, Loc::new(5, 0, 100));

        assert_eq!(refs.links.len(), 1);
        assert_eq!(refs.links[0].target, "Note");
        assert_eq!(refs.links[0].display_text, "Note");
        assert_eq!(refs.links[0].span.start, Loc::new(6, 0, 108));

        assert_eq!(refs.tags.len(), 2);
        assert_eq!(refs.tags[0].tag, "#tag1");
        assert_eq!(refs.tags[1].tag, "#tag2");
        assert_eq!(refs.tags[0].span.start, Loc::new(7, 0, 117));
        assert_eq!(refs.tags[1].span.start, Loc::new(7, 6, 123));

        // Strictly increasing by position.
        let offsets: Vec<usize> = [
            refs.headings[0].span.start.offset,
            refs.links[0].span.start.offset,
            refs.tags[0].span.start.offset,
            refs.tags[1].span.start.offset,
        ]
        .into();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn embeds_are_separated_from_links() {
        let refs = extract_block("![[Image.png]] and [[Note|Alias]]\n", Loc::new(0, 0, 0));

        assert_eq!(refs.embeds.len(), 1);
        assert_eq!(refs.embeds[0].target, "Image.png");
        assert_eq!(refs.embeds[0].original, "![[Image.png]]");

        assert_eq!(refs.links.len(), 1);
        assert_eq!(refs.links[0].display_text, "Alias");
        assert_eq!(refs.links[0].span.start.col, 19);
    }

    #[test]
    fn heading_requires_space_after_hashes() {
        let refs = extract_block("#tag-not-heading\n", Loc::new(0, 0, 0));
        assert!(refs.headings.is_empty());
        assert_eq!(refs.tags.len(), 1);
    }

    #[test]
    fn footnote_definition_yields_paired_records() {
        let block = "[^note]: first line\nsecond line\n";
        let refs = extract_block(block, Loc::new(3, 0, 50));

        assert_eq!(refs.footnotes.len(), 1);
        assert_eq!(refs.footnote_sections.len(), 1);
        assert_eq!(refs.footnotes[0].id, "note");
        assert_eq!(refs.footnote_sections[0].footnote_id, "note");
        assert_eq!(refs.footnotes[0].span, refs.footnote_sections[0].span);
        assert_eq!(refs.footnotes[0].span.start, Loc::new(3, 0, 50));
        // Body continues onto exactly one extra physical line.
        let len = "[^note]: first line\nsecond line".len();
        assert_eq!(refs.footnotes[0].span.end.offset, 50 + len);
    }

    #[test]
    fn footnote_definition_at_later_line_tracks_line_numbers() {
        let block = "text\nmore\n[^a]: def\n";
        let refs = extract_block(block, Loc::new(10, 0, 0));
        assert_eq!(refs.footnotes[0].span.start.line, 12);
    }

    #[test]
    fn inline_footnotes_number_across_the_document() {
        let text = "before ^[outside]\n```tabs\n--- A\ntext ^[inside]\n```\n";
        let refs = extract_document(text, "tabs").expect("extract");

        assert_eq!(refs.footnotes.len(), 1);
        assert_eq!(refs.footnotes[0].id, "[inline1");
        assert_eq!(refs.footnotes[0].span.start.line, 3);
        assert_eq!(refs.footnotes[0].span.start.col, 5);

        assert_eq!(inline_footnotes_before(text, 18), 1);
    }

    #[test]
    fn extract_document_merges_all_blocks() {
        let text = "```tabs\n[[One]]\n```\nmiddle\n```tabs\n[[Two]]\n```\n";
        let refs = extract_document(text, "tabs").expect("extract");

        assert_eq!(refs.links.len(), 2);
        assert_eq!(refs.links[0].target, "One");
        assert_eq!(refs.links[1].target, "Two");
        assert!(refs.links[0].span.start.offset < refs.links[1].span.start.offset);
    }

    #[test]
    fn extracted_records_start_host_owned() {
        let refs = extract_block("[[Note]]\n", Loc::new(0, 0, 0));
        assert!(!refs.links[0].is_plugin_owned());
    }

    #[test]
    fn heading_window_counts_both_sides() {
        let text = "# Before\n## Also\n```tabs\n# In\n```\n";
        let blocks = find_blocks(text, "tabs").expect("find");
        assert_eq!(heading_window(text, &blocks[0]), (2, 1));
    }
}
