//! Fenced-block delimiter scanning.
//!
//! A fence is a line-anchored run of 3+ identical backtick or tilde
//! characters, indented by at most 3 columns. [`scan`] locates every fence
//! token in a text span; [`is_closed`] decides whether the tokens pair up
//! into balanced fences. Matching requires the *identical* token string
//! (character and length), not merely a closing fence of sufficient length;
//! this is what lets a greater-length fence safely contain shorter ones.

use regex::Regex;
use std::sync::LazyLock;

/// Fence token pattern: up to 3 leading spaces, then 3+ backticks or tildes.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ {0,3}(`{3,}|~{3,})").unwrap());

/// One fence delimiter found in a text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceToken {
    /// The run of fence characters, leading indent excluded.
    pub token: String,
    /// Offset of the line start (including any indent) within the scanned
    /// text.
    pub offset: usize,
}

/// Locate all fence delimiter lines in `text`, in ascending offset order.
///
/// Pure and deterministic; scanning the same text twice yields the same
/// sequence.
#[must_use]
pub fn scan(text: &str) -> Vec<FenceToken> {
    FENCE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let token = caps.get(1)?;
            Some(FenceToken {
                token: token.as_str().to_string(),
                offset: whole.start(),
            })
        })
        .collect()
}

/// Decide whether a token sequence represents fully closed fences.
///
/// Simulates a stack: a token whose exact string already exists in the stack
/// closes that fence, popping the stack down to and including the matching
/// entry. Anything else opens a new fence. Tokens of unequal length or
/// mismatched characters never pair.
#[must_use]
pub fn is_closed(tokens: &[FenceToken]) -> bool {
    let mut stack: Vec<&str> = Vec::new();
    for fence in tokens {
        if let Some(pos) = stack.iter().position(|open| *open == fence.token) {
            stack.truncate(pos);
        } else {
            stack.push(&fence.token);
        }
    }
    stack.is_empty()
}
