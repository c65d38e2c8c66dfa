//! Source location tracking
//!
//! Scanner and attribute extractor record byte ranges into the file text;
//! lines are tracked separately by the scanner cursor.
use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    /// Check if this span contains another span
    pub fn contains_span(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Strict containment: `other` lies inside and is not equal to `self`
    pub fn strictly_contains(&self, other: &Span) -> bool {
        self.contains_span(other) && self != other
    }

    /// Get the source text for this span. Returns an empty string for
    /// out-of-range or non-boundary offsets.
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end).unwrap_or("")
    }
}
