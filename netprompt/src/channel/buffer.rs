//! Response buffer that remembers the most recent chunk.
//!
//! The completion check runs against the newest chunk only, never the whole
//! accumulated output, so the cost per read stays flat for large outputs.
//! A sentinel split across two chunks is therefore not seen.

use std::ops::Range;

use super::patterns::PromptMatcher;

/// Accumulates decoded chunks in arrival order.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    /// The accumulated output.
    text: String,

    /// Byte range of the most recent chunk within `text`.
    last: Range<usize>,

    /// Number of chunks appended.
    chunks: usize,
}

impl ResponseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: &str) {
        let start = self.text.len();
        self.text.push_str(chunk);
        self.last = start..self.text.len();
        self.chunks += 1;
    }

    /// The most recently appended chunk.
    pub fn last_chunk(&self) -> &str {
        &self.text[self.last.clone()]
    }

    /// Check the most recent chunk against a matcher.
    pub fn last_chunk_matches(&self, matcher: &dyn PromptMatcher) -> bool {
        matcher.is_match(self.last_chunk())
    }

    /// Number of chunks appended so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Take ownership of the text and reset.
    pub fn take(&mut self) -> String {
        self.last = 0..0;
        self.chunks = 0;
        std::mem::take(&mut self.text)
    }
}
