//! Per-tab directive parsing from the tab title line.
//!
//! A title line may carry inline directives anywhere in its free text: a
//! default-tab marker, a CSS class list, and an inline style string. Each is
//! excised from the matched range only, leaving surrounding text as the
//! display title. Extraction order is fixed so later patterns are never
//! confused by earlier matched text.

use regex::Regex;
use std::sync::LazyLock;

/// Case-insensitive `(default)` with trailing whitespace absorbed.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\(default\)\s*").unwrap());

/// Case-insensitive `(css-class: a b c)`; the hyphen is optional.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CSS_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(css-?class: *([ \w-]*)\)").unwrap());

/// Case-insensitive `(css-style: "...")` or `(css-styles: ...)`; quotes
/// optional.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CSS_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\(css-?styles?:[ "]*([ :;\w-]*)[ "]*\)"#).unwrap());

/// Directives parsed out of one tab's raw title line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabAttributes {
    /// Title text with all directives removed, trimmed.
    pub display_title: String,
    /// True when the title carried a `(default)` marker.
    pub is_default: bool,
    /// User-defined CSS classes for this tab, empty tokens discarded.
    pub css_classes: Vec<String>,
    /// Verbatim inline style text, empty when absent.
    pub inline_style: String,
}

/// Parse the directives from a raw title line.
#[must_use]
pub fn parse_title(raw_title: &str) -> TabAttributes {
    let mut title = raw_title.to_string();
    let mut attrs = TabAttributes::default();

    if let Some(range) = DEFAULT_RE.find(&title).map(|m| m.range()) {
        attrs.is_default = true;
        title.replace_range(range, "");
    }

    let class_match = CSS_CLASS_RE.captures(&title).map(|caps| {
        let range = caps.get(0).map_or(0..0, |m| m.range());
        let list = caps.get(1).map_or_else(String::new, |m| m.as_str().to_string());
        (range, list)
    });
    if let Some((range, list)) = class_match {
        attrs.css_classes = list.split_whitespace().map(ToString::to_string).collect();
        title.replace_range(range, "");
    }

    let style_match = CSS_STYLE_RE.captures(&title).map(|caps| {
        let range = caps.get(0).map_or(0..0, |m| m.range());
        let style = caps.get(1).map_or_else(String::new, |m| m.as_str().to_string());
        (range, style)
    });
    if let Some((range, style)) = style_match {
        attrs.inline_style = style;
        title.replace_range(range, "");
    }

    attrs.display_title = title.trim().to_string();
    attrs
}
