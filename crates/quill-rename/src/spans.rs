//! Old-span to new-span bookkeeping for one rewrite pass.
//!
//! Direct edits keep the original start offset and only change length, so
//! consumers can re-map positions by start. Complexified regions carry their
//! internal sub-span pairs in one composite record instead of flat entries.

use quill_core::TextRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedSpan {
    pub old: TextRange,
    pub new: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexifiedSpan {
    pub old: TextRange,
    pub new: TextRange,
    /// Region-relative pairs for edits inside the expanded text.
    pub sub_spans: Vec<ModifiedSpan>,
}

#[derive(Debug, Clone, Default)]
pub struct RenamedSpansTracker {
    modified: Vec<ModifiedSpan>,
    complexified: Vec<ComplexifiedSpan>,
}

impl RenamedSpansTracker {
    pub fn add_modified_span(&mut self, old: TextRange, new_len: u32) {
        debug_assert!(old.len() != new_len || !self.modified.iter().any(|s| s.old == old));
        self.modified.push(ModifiedSpan {
            old,
            new: TextRange::at(old.start, new_len),
        });
    }

    pub fn add_complexified_span(&mut self, span: ComplexifiedSpan) {
        self.complexified.push(span);
    }

    pub fn modified_spans(&self) -> &[ModifiedSpan] {
        &self.modified
    }

    pub fn complexified_spans(&self) -> &[ComplexifiedSpan] {
        &self.complexified
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.complexified.is_empty()
    }

    /// All (old, new-length) edits, sorted by old start.
    fn edits(&self) -> Vec<ModifiedSpan> {
        let mut edits: Vec<ModifiedSpan> = self
            .modified
            .iter()
            .copied()
            .chain(self.complexified.iter().map(|c| ModifiedSpan {
                old: c.old,
                new: c.new,
            }))
            .collect();
        edits.sort_by_key(|e| e.old.start);
        edits
    }

    /// Map an offset in the original text to the rewritten text.
    pub fn to_new_offset(&self, offset: u32) -> u32 {
        let mut delta = 0i64;
        for edit in self.edits() {
            if edit.old.end <= offset {
                delta += i64::from(edit.new.len()) - i64::from(edit.old.len());
            }
        }
        (i64::from(offset) + delta) as u32
    }

    /// Map an offset in the rewritten text back to the original text.
    /// Offsets inside an edited region map to the region's old start.
    pub fn to_original_offset(&self, offset: u32) -> u32 {
        let mut delta = 0i64;
        for edit in self.edits() {
            let new_start = (i64::from(edit.old.start) + delta) as u32;
            let new_end = new_start + edit.new.len();
            if offset < new_start {
                break;
            }
            if offset < new_end {
                return edit.old.start;
            }
            delta += i64::from(edit.new.len()) - i64::from(edit.old.len());
        }
        (i64::from(offset) - delta) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_spans_keep_old_start() {
        let mut tracker = RenamedSpansTracker::default();
        tracker.add_modified_span(TextRange::new(10, 15), 8);
        tracker.add_modified_span(TextRange::new(30, 33), 1);
        for span in tracker.modified_spans() {
            assert_eq!(span.old.start, span.new.start);
        }
    }

    #[test]
    fn offset_mapping_round_trips_outside_edits() {
        let mut tracker = RenamedSpansTracker::default();
        // "count" (5 chars at 10) -> "x" (1 char).
        tracker.add_modified_span(TextRange::new(10, 15), 1);
        assert_eq!(tracker.to_new_offset(5), 5);
        assert_eq!(tracker.to_new_offset(20), 16);
        assert_eq!(tracker.to_original_offset(16), 20);
        assert_eq!(tracker.to_original_offset(5), 5);
    }

    #[test]
    fn offsets_inside_edits_map_to_region_start() {
        let mut tracker = RenamedSpansTracker::default();
        tracker.add_complexified_span(ComplexifiedSpan {
            old: TextRange::new(10, 20),
            new: TextRange::at(10, 25),
            sub_spans: vec![],
        });
        assert_eq!(tracker.to_original_offset(12), 10);
        assert_eq!(tracker.to_original_offset(40), 25);
    }
}
