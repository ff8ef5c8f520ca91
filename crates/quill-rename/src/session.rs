//! One rename attempt: who is renamed, to what, and where.

use std::collections::HashMap;

use quill_core::{CancellationToken, TextRange};
use quill_resolve::{SemanticModel, SymbolFingerprint, SymbolId, SymbolKind};
use quill_syntax::ident;

/// A span known in advance to refer to the renamed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameLocation {
    pub range: TextRange,
    /// The token is a compiler-shaped accessor name (`get_X`/`set_X`); the
    /// part up to the underscore is preserved as a prefix.
    pub is_renamable_accessor: bool,
    /// The span lies inside a string literal or comment and needs sub-span
    /// substitution instead of a token swap.
    pub in_string_or_comment: bool,
}

impl RenameLocation {
    pub fn new(range: TextRange) -> Self {
        Self {
            range,
            is_renamable_accessor: false,
            in_string_or_comment: false,
        }
    }
}

/// Immutable for the duration of one traversal; the span tracker and
/// annotation table are per-traversal outputs, nothing persists across
/// sessions.
pub struct RenameSession {
    pub symbol: SymbolId,
    pub original_text: String,
    pub replacement_text: String,
    pub replacement_text_valid: bool,
    /// Identity of the renamed declaration, stable across speculative
    /// re-binds of rewritten text.
    pub target_fingerprint: SymbolFingerprint,
    locations: HashMap<u32, RenameLocation>,
    pub possible_name_conflicts: Vec<String>,
    pub conflict_zones: Vec<TextRange>,
    /// String/comment token start offset -> optional sorted sub-spans
    /// (token-relative) that are known match positions.
    pub string_and_comment_spans: HashMap<u32, Option<Vec<TextRange>>>,
    pub rename_in_strings: bool,
    pub rename_in_comments: bool,
    pub cancellation: CancellationToken,
}

impl RenameSession {
    /// Build a session renaming `symbol` to `replacement_text`, seeding the
    /// rename locations from the model's occurrence search.
    pub fn new(model: &SemanticModel, symbol: SymbolId, replacement_text: &str) -> RenameSession {
        let data = model.symbol(symbol);
        let original_text = data.name.clone();
        let replacement_value = ident::value_text(replacement_text);
        let mut locations = HashMap::new();
        for range in model.occurrences_of(symbol) {
            locations.insert(range.start, RenameLocation::new(range));
        }
        RenameSession {
            symbol,
            possible_name_conflicts: possible_name_conflicts(
                data.kind,
                replacement_text,
                &replacement_value,
            ),
            original_text,
            replacement_text: replacement_text.to_string(),
            replacement_text_valid: ident::is_valid_replacement(replacement_text),
            target_fingerprint: model.fingerprint(symbol),
            locations,
            conflict_zones: Vec::new(),
            string_and_comment_spans: HashMap::new(),
            rename_in_strings: false,
            rename_in_comments: false,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_conflict_zone(mut self, zone: TextRange) -> Self {
        self.conflict_zones.push(zone);
        self
    }

    pub fn with_location(mut self, location: RenameLocation) -> Self {
        self.locations.insert(location.range.start, location);
        self
    }

    pub fn with_rename_in_strings(mut self, enabled: bool) -> Self {
        self.rename_in_strings = enabled;
        self
    }

    pub fn with_rename_in_comments(mut self, enabled: bool) -> Self {
        self.rename_in_comments = enabled;
        self
    }

    /// Register a string/comment token (by start offset) with optional
    /// known match sub-spans, token-relative and sorted.
    pub fn with_string_or_comment_span(
        mut self,
        token_start: u32,
        sub_spans: Option<Vec<TextRange>>,
    ) -> Self {
        self.string_and_comment_spans.insert(token_start, sub_spans);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn location_at(&self, start: u32) -> Option<&RenameLocation> {
        self.locations.get(&start)
    }

    /// Whether a seeded location inside `range` asks for string/comment
    /// substitution; such locations are honored even when the session-wide
    /// opt-in is off.
    pub fn has_string_or_comment_location(&self, range: TextRange) -> bool {
        self.locations.values().any(|loc| {
            loc.in_string_or_comment
                && loc.range.start >= range.start
                && loc.range.end <= range.end
        })
    }

    pub fn is_conflict_zone(&self, span: TextRange) -> bool {
        self.conflict_zones.contains(&span)
    }

    /// The replacement's canonical value text (escapes decoded, `@` gone).
    pub fn replacement_value_text(&self) -> String {
        ident::value_text(&self.replacement_text)
    }
}

/// Strings that, if already present in the source, could collide with the
/// replacement name even at tokens that are not rename locations.
fn possible_name_conflicts(
    kind: SymbolKind,
    replacement_text: &str,
    replacement_value: &str,
) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(short) = ident::without_attribute_suffix(replacement_text) {
        out.push(short.to_string());
    }
    if kind == SymbolKind::Property {
        out.push(format!("_{replacement_text}"));
        out.push(format!("get_{replacement_text}"));
        out.push(format!("set_{replacement_text}"));
    }
    if replacement_value != replacement_text {
        out.push(replacement_value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_rename_seeds_accessor_shaped_conflicts() {
        let conflicts = possible_name_conflicts(SymbolKind::Property, "Bar", "Bar");
        assert!(conflicts.contains(&"_Bar".to_string()));
        assert!(conflicts.contains(&"get_Bar".to_string()));
        assert!(conflicts.contains(&"set_Bar".to_string()));
    }

    #[test]
    fn attribute_suffix_is_stripped() {
        let conflicts = possible_name_conflicts(SymbolKind::Type, "CheckedAttribute", "CheckedAttribute");
        assert!(conflicts.contains(&"Checked".to_string()));
    }

    #[test]
    fn escaped_replacement_adds_value_spelling() {
        let conflicts = possible_name_conflicts(SymbolKind::Local, "@class", "class");
        assert!(conflicts.contains(&"class".to_string()));
    }
}
