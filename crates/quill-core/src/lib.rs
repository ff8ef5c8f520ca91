//! Core shared types for Quill.
//!
//! This crate is intentionally small and dependency-light.

mod cancel;

pub use cancel::{Cancelled, CancellationToken};

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range in a UTF-8 source buffer, in byte offsets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Range starting at `start` and covering `len` bytes.
    #[inline]
    pub fn at(start: u32, len: u32) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    #[inline]
    pub fn empty(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains(self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Inclusive-end containment, used for "touching" position queries where a
    /// caret at the very end of an identifier still refers to it.
    #[inline]
    pub fn touches(self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }

    #[inline]
    pub fn contains_range(self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[inline]
    pub fn intersects(self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn slice(self, text: &str) -> &str {
        &text[self.start as usize..self.end as usize]
    }
}

// `text_size::TextRange` is the range type used by the rowan trees in
// `quill-syntax`; rowan re-exports it, so these conversions cover both.
impl From<text_size::TextRange> for TextRange {
    fn from(range: text_size::TextRange) -> Self {
        Self {
            start: range.start().into(),
            end: range.end().into(),
        }
    }
}

impl From<TextRange> for text_size::TextRange {
    fn from(range: TextRange) -> Self {
        text_size::TextRange::new(range.start.into(), range.end.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_containment() {
        let r = TextRange::new(4, 10);
        assert!(r.contains(4));
        assert!(r.contains(9));
        assert!(!r.contains(10));
        assert!(r.touches(10));
        assert!(!r.touches(11));
        assert!(r.contains_range(TextRange::new(4, 10)));
        assert!(!r.contains_range(TextRange::new(4, 11)));
        assert!(r.intersects(TextRange::new(9, 12)));
        assert!(!r.intersects(TextRange::new(10, 12)));
    }

    #[test]
    fn cancellation_token_is_shared() {
        let token = CancellationToken::default();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.check().is_err());
    }
}
