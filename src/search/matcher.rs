//! Case-insensitive literal matching.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Collapses runs of whitespace so queries typed with one space still match
/// text laid out with several.
fn whitespace() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s+").expect("Valid whitespace regex"));
    &PATTERN
}

/// Finds a literal query inside run text, ignoring case.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query: String,
    pattern: Regex,
}

impl QueryMatcher {
    /// Returns `None` for an empty or whitespace-only query.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        let escaped = whitespace()
            .split(trimmed)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let pattern = RegexBuilder::new(&escaped)
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            query: trimmed.to_string(),
            pattern,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Byte ranges of the non-overlapping matches, left to right.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        self.pattern.find_iter(text).map(|m| m.range()).collect()
    }
}
