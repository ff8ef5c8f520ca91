//! Out-of-band annotations for the rewritten tree.
//!
//! Rowan trees cannot carry per-token tags, so annotations live in a side
//! table keyed by the token's (or node's) start offset in the rewritten
//! text. Emission is append-only, so the offset a token lands at is final
//! the moment it is written.

use std::collections::BTreeMap;

use quill_core::TextRange;
use quill_resolve::SymbolFingerprint;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameAnnotation {
    pub original_span: TextRange,
    pub is_rename_location: bool,
    pub prefix: String,
    pub suffix: Option<String>,
    /// Fingerprints of the source declarations this occurrence may resolve
    /// to, used to re-locate the symbols after the rewrite.
    pub declaration_fingerprints: Vec<SymbolFingerprint>,
    pub is_original_declaration: bool,
    pub is_namespace_declaration_reference: bool,
    /// A `nameof(..)`-style reference to a member group rather than to one
    /// concrete overload.
    pub is_member_group_reference: bool,
    pub is_invocation_expression: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    map: BTreeMap<u32, Vec<RenameAnnotation>>,
}

impl AnnotationTable {
    pub fn insert(&mut self, new_offset: u32, annotation: RenameAnnotation) {
        self.map.entry(new_offset).or_default().push(annotation);
    }

    pub fn annotations_at(&self, new_offset: u32) -> &[RenameAnnotation] {
        self.map.get(&new_offset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &RenameAnnotation)> {
        self.map
            .iter()
            .flat_map(|(offset, anns)| anns.iter().map(move |a| (*offset, a)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut RenameAnnotation)> {
        self.map
            .iter_mut()
            .flat_map(|(offset, anns)| anns.iter_mut().map(move |a| (*offset, a)))
    }

    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fold another table in, shifting its keys by `base`. Used when a
    /// region rewritten through a temporary emitter is spliced into the
    /// main output.
    pub fn extend_shifted(&mut self, other: AnnotationTable, base: u32) {
        for (offset, anns) in other.map {
            self.map.entry(offset + base).or_default().extend(anns);
        }
    }
}
