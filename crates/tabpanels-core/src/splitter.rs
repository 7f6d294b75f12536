//! Splitting one recognized block's raw text into an ordered tab sequence.
//!
//! The marker pattern is line-anchored: start of line, horizontal whitespace,
//! the configured marker, horizontal whitespace, then the rest of the line as
//! the raw title. Two edge cases complicate the plain match list:
//!
//! - a marker appearing inside a fence that opened before the first match is
//!   code, not a tab, and is discarded;
//! - a tab body with an unterminated fence absorbs the following tab(s),
//!   title lines included, until the fence closes. This is what allows a
//!   whole nested tab block to ride along as one tab's body.

use crate::error::{Error, Result};
use crate::fence::{self, FenceToken};
use crate::title::{self, TabAttributes};
use regex::Regex;

/// Hard cap on the unterminated-fence absorption loop. A safety valve for
/// pathological input, not a semantic rule.
pub const MAX_FENCE_ABSORPTIONS: usize = 20;

/// One tab produced by [`split`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    /// The raw title text, directives still included.
    pub raw_title: String,
    /// Directives parsed from the title line.
    pub attributes: TabAttributes,
    /// The tab body: everything between this title line and the next
    /// retained marker (or end of block), absorbed spans included.
    pub body: String,
    /// Zero-based line index of the body start within the block.
    pub line_offset: usize,
    /// Number of physical lines in the body.
    pub line_count: usize,
}

/// Result of splitting a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSplit {
    /// Tabs in display order. Empty when no marker survives the fence
    /// filter; the caller then renders the whole block as a single
    /// untitled tab.
    pub tabs: Vec<Tab>,
    /// Index of the tab whose title carried a `(default)` directive, 0 when
    /// none did. When several tabs claim it, the last one wins.
    pub default_index: usize,
}

struct MarkerMatch {
    start: usize,
    title_end: usize,
    title: String,
}

/// Split `block_text` into tabs using the configured `marker` string.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the marker cannot be compiled into a line
/// pattern; the marker text itself is always escaped verbatim.
pub fn split(block_text: &str, marker: &str) -> Result<TabSplit> {
    let pattern = format!(r"(?m)^[^\S\r\n]*{}[^\S\r\n]*(.*)", regex::escape(marker));
    let re = Regex::new(&pattern)
        .map_err(|e| Error::Parse(format!("invalid tab marker pattern: {e}")))?;

    let mut matches: Vec<MarkerMatch> = re
        .captures_iter(block_text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?;
            Some(MarkerMatch {
                start: whole.start(),
                title_end: whole.end(),
                title: title.as_str().to_string(),
            })
        })
        .collect();

    discard_matches_inside_leading_fence(block_text, &mut matches);

    let mut result = TabSplit::default();
    if matches.is_empty() {
        return Ok(result);
    }

    let mut line_offset = 1 + count_newlines(&block_text[..matches[0].start]);
    let mut tab_index = 0usize;
    let mut i = 0usize;

    while i < matches.len() {
        let raw_title = matches[i].title.clone();

        // Body span runs from the character after the title line up to the
        // next retained marker, so tab bodies partition the block text with
        // the marker lines excised.
        let body_start = (matches[i].title_end + 1).min(block_text.len());
        let next_start = matches.get(i + 1).map_or(block_text.len(), |n| n.start);
        let mut body = block_text[body_start.min(next_start)..next_start].to_string();

        // Unterminated fence: absorb following matches wholesale, their
        // title lines staying verbatim inside this body.
        let mut absorptions = 0;
        while !fence::is_closed(&fence::scan(&body)) {
            if absorptions >= MAX_FENCE_ABSORPTIONS {
                break;
            }
            i += 1;
            if i >= matches.len() {
                break;
            }
            let absorbed_end = matches.get(i + 1).map_or(block_text.len(), |n| n.start);
            body.push_str(&block_text[matches[i].start..absorbed_end]);
            absorptions += 1;
        }

        let attributes = title::parse_title(&raw_title);
        if attributes.is_default {
            result.default_index = tab_index;
        }

        let line_count = body.lines().count();
        result.tabs.push(Tab {
            raw_title,
            attributes,
            body,
            line_offset,
            line_count,
        });

        // The next tab's body starts below its own marker line.
        line_offset += line_count + 1;
        tab_index += 1;
        i += 1;
    }

    Ok(result)
}

/// Drop marker matches that sit inside a fence opened before the first
/// match. If that fence never closes, everything after it is one giant code
/// region and no match survives.
fn discard_matches_inside_leading_fence(block_text: &str, matches: &mut Vec<MarkerMatch>) {
    let Some(first) = matches.first() else {
        return;
    };

    let fences_before = fence::scan(&block_text[..first.start]);
    if fence::is_closed(&fences_before) {
        return;
    }

    let Some(open) = residual_open(&fences_before) else {
        return;
    };

    let closer = fence::scan(block_text)
        .into_iter()
        .find(|t| t.offset > open.offset && t.token == open.token);

    match closer {
        Some(closer) => matches.retain(|m| m.start >= closer.offset),
        None => matches.clear(),
    }
}

/// The outermost fence still open after simulating the token stack.
fn residual_open(tokens: &[FenceToken]) -> Option<FenceToken> {
    let mut stack: Vec<&FenceToken> = Vec::new();
    for t in tokens {
        if let Some(pos) = stack.iter().position(|open| open.token == t.token) {
            stack.truncate(pos);
        } else {
            stack.push(t);
        }
    }
    stack.first().map(|t| (*t).clone())
}

fn count_newlines(text: &str) -> usize {
    text.matches('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_markers_partition_the_block() {
        let block = "--- One\nfirst body\n--- Two\nsecond body\n";
        let split = split(block, "---").expect("split");

        assert_eq!(split.tabs.len(), 2);
        assert_eq!(split.tabs[0].raw_title, "One");
        assert_eq!(split.tabs[0].body, "first body\n");
        assert_eq!(split.tabs[1].raw_title, "Two");
        assert_eq!(split.tabs[1].body, "second body\n");
        assert_eq!(split.default_index, 0);
    }

    #[test]
    fn body_spans_have_no_overlap_and_no_gap() {
        let block = "--- A\naaa\n--- B\nbbb\nccc\n--- C\n";
        let split = split(block, "---").expect("split");

        // Reassembling title lines + bodies reproduces the block text.
        let mut rebuilt = String::new();
        for tab in &split.tabs {
            rebuilt.push_str("--- ");
            rebuilt.push_str(&tab.raw_title);
            rebuilt.push('\n');
            rebuilt.push_str(&tab.body);
        }
        assert_eq!(rebuilt, block);
    }

    #[test]
    fn no_markers_yields_empty_split() {
        let split = split("just some text\n", "---").expect("split");
        assert!(split.tabs.is_empty());
        assert_eq!(split.default_index, 0);
    }

    #[test]
    fn tab_without_trailing_newline_has_empty_body() {
        let split = split("--- Lonely", "---").expect("split");
        assert_eq!(split.tabs.len(), 1);
        assert_eq!(split.tabs[0].body, "");
        assert_eq!(split.tabs[0].line_count, 0);
    }

    #[test]
    fn default_directive_selects_tab() {
        let block = "--- One\nbody\n--- Two (default)\nbody\n";
        let split = split(block, "---").expect("split");
        assert_eq!(split.default_index, 1);
        assert_eq!(split.tabs[1].attributes.display_title, "Two");
    }

    #[test]
    fn open_fence_absorbs_following_marker_as_code() {
        let block = "--- A\n```\n--- B\n```\n";
        let split = split(block, "---").expect("split");

        assert_eq!(split.tabs.len(), 1);
        assert_eq!(split.tabs[0].raw_title, "A");
        assert_eq!(split.tabs[0].body, "```\n--- B\n```\n");
    }

    #[test]
    fn nested_block_rides_along_as_one_body() {
        let block = "--- Outer\n```tabs\n--- Inner 1\ntext\n--- Inner 2\n```\n--- Second\nplain\n";
        let split = split(block, "---").expect("split");

        assert_eq!(split.tabs.len(), 2);
        assert!(split.tabs[0].body.contains("--- Inner 1"));
        assert!(split.tabs[0].body.contains("--- Inner 2"));
        assert_eq!(split.tabs[1].raw_title, "Second");
        assert_eq!(split.tabs[1].body, "plain\n");
    }

    #[test]
    fn markers_inside_leading_fence_are_discarded() {
        let block = "```\n--- not a tab\n```\n--- Real\nbody\n";
        let split = split(block, "---").expect("split");

        assert_eq!(split.tabs.len(), 1);
        assert_eq!(split.tabs[0].raw_title, "Real");
    }

    #[test]
    fn unclosed_leading_fence_discards_all_markers() {
        let block = "```\n--- a\n--- b\nstill code";
        let split = split(block, "---").expect("split");
        assert!(split.tabs.is_empty());
    }

    #[test]
    fn absorption_stops_at_the_cap() {
        let mut block = String::from("--- T\n```\n");
        for k in 1..=25 {
            block.push_str(&format!("--- m{k}\n"));
        }
        let split = split(&block, "---").expect("split");

        // Cap of 20 absorptions, then the remaining markers become tabs.
        assert_eq!(split.tabs.len(), 6);
        assert!(split.tabs[0].body.contains("--- m20"));
        assert!(!split.tabs[0].body.contains("--- m21"));
        assert_eq!(split.tabs[1].raw_title, "m21");
    }

    #[test]
    fn line_offsets_track_body_positions() {
        let block = "--- A\none\ntwo\n--- B\nthree\n";
        let split = split(block, "---").expect("split");

        assert_eq!(split.tabs[0].line_offset, 1);
        assert_eq!(split.tabs[0].line_count, 2);
        // B's marker sits on line 3; its body starts on line 4.
        assert_eq!(split.tabs[1].line_offset, 4);
        assert_eq!(split.tabs[1].line_count, 1);
    }

    #[test]
    fn custom_marker_string_is_escaped() {
        let block = "=== One\nbody\n=== Two\nmore\n";
        let split = split(block, "===").expect("split");
        assert_eq!(split.tabs.len(), 2);
        assert_eq!(split.tabs[1].raw_title, "Two");
    }
}
