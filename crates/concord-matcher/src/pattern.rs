//! `{pattern('...')}` markers.
//!
//! Text outside the markers is matched literally; text inside is a regular
//! expression used verbatim. The whole actual value must match.

use regex::Regex;

use crate::error::{MatchError, MatchResult};

pub const PATTERN_OPEN: &str = "{pattern('";
pub const PATTERN_CLOSE: &str = "')}";

pub fn contains_pattern(expected: &str) -> bool {
    expected.contains(PATTERN_OPEN)
}

/// Build the (unanchored) regex source for an expression with markers.
pub fn regex_source(expected: &str) -> String {
    let mut source = String::with_capacity(expected.len());
    let mut rest = expected;
    while let Some(open) = rest.find(PATTERN_OPEN) {
        source.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open + PATTERN_OPEN.len()..];
        match after.find(PATTERN_CLOSE) {
            Some(close) => {
                source.push_str(&after[..close]);
                rest = &after[close + PATTERN_CLOSE.len()..];
            }
            None => {
                source.push_str(after);
                rest = "";
            }
        }
    }
    source.push_str(&regex::escape(rest));
    source
}

/// Compile an expression into a case-sensitive, fully anchored regex.
pub fn compile(expected: &str) -> MatchResult<Regex> {
    let source = regex_source(expected);
    Regex::new(&format!("^(?:{source})$")).map_err(|e| MatchError::InvalidPattern {
        pattern: source,
        reason: e.to_string(),
    })
}
