//! Single-file symbol graph and binder for the C# subset.
//!
//! `SemanticModel::analyze` parses a source text, collects every declaration
//! into a symbol table, then binds each identifier reference to a symbol by
//! lexical-scope lookup. Analysis is infallible: unresolved names simply stay
//! unbound. Speculative binding of rewritten text is just `analyze` on the
//! new source; [`SymbolFingerprint`] re-identifies declarations across the
//! two models.

use std::collections::HashMap;

use quill_core::TextRange;
use quill_syntax::{ParseResult, SyntaxNode, SyntaxToken};

mod bind;
mod collect;
pub mod symbols;

pub use symbols::{SymbolData, SymbolFingerprint, SymbolId, SymbolKind, TypeFlavor};

pub struct SemanticModel {
    source: String,
    parse: ParseResult,
    symbols: Vec<SymbolData>,
    /// Name-token start offset -> declared symbol.
    decls: HashMap<u32, SymbolId>,
    /// Reference-token start offset -> resolved symbol.
    refs: HashMap<u32, SymbolId>,
    references: HashMap<SymbolId, Vec<TextRange>>,
}

impl SemanticModel {
    pub fn analyze(source: &str) -> SemanticModel {
        let parse = quill_syntax::parse(source);
        let root = parse.syntax();
        let collected = collect::collect(&root);
        let mut model = SemanticModel {
            source: source.to_string(),
            parse,
            symbols: collected.symbols,
            decls: collected.decls,
            refs: HashMap::new(),
            references: HashMap::new(),
        };
        model.bind_all();
        tracing::trace!(
            symbols = model.symbols.len(),
            references = model.refs.len(),
            "analyzed source"
        );
        model
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parse(&self) -> &ParseResult {
        &self.parse
    }

    pub fn syntax(&self) -> SyntaxNode {
        self.parse.syntax()
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len() as u32).map(SymbolId)
    }

    /// The symbol declared by the name token starting at `start`, if any.
    pub fn declaration_at(&self, start: u32) -> Option<SymbolId> {
        self.decls.get(&start).copied()
    }

    /// Declaration or reference resolution for the token starting at `start`.
    pub fn resolved_at(&self, start: u32) -> Option<SymbolId> {
        self.refs
            .get(&start)
            .or_else(|| self.decls.get(&start))
            .copied()
    }

    /// Every symbol whose declaration or a reference covers `position`.
    pub fn symbols_at(&self, position: u32) -> Vec<SymbolId> {
        let root = self.syntax();
        let mut out = Vec::new();
        for token in root
            .token_at_offset(position.into())
            .filter(|t| t.kind().is_identifier_like() || t.kind().is_accessor_keyword())
        {
            let start = u32::from(token.text_range().start());
            if let Some(id) = self.resolved_at(start) {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
            // A constructor or destructor name token is also a declaration
            // location of its type.
            for (i, sym) in self.symbols.iter().enumerate() {
                let id = SymbolId(i as u32);
                if sym.declarations.iter().any(|d| d.start == start) && !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Non-declaration references, in document order.
    pub fn references_of(&self, id: SymbolId) -> Vec<TextRange> {
        let mut out = self.references.get(&id).cloned().unwrap_or_default();
        out.sort_by_key(|r| r.start);
        out
    }

    /// Declarations and references, merged and sorted.
    pub fn occurrences_of(&self, id: SymbolId) -> Vec<TextRange> {
        let mut out = self.symbol(id).declarations.clone();
        out.extend(self.references_of(id));
        out.sort_by_key(|r| r.start);
        out.dedup();
        out
    }

    /// Symbols declared in the whole model with the given name.
    pub fn symbols_named(&self, name: &str) -> Vec<SymbolId> {
        self.symbol_ids()
            .filter(|id| self.symbol(*id).name == name)
            .collect()
    }

    pub fn fingerprint(&self, id: SymbolId) -> SymbolFingerprint {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let sym = self.symbol(c);
            path.push(sym.name.clone());
            cursor = sym.container;
        }
        path.reverse();
        SymbolFingerprint {
            kind: self.symbol(id).kind,
            path,
        }
    }

    /// Find the declaration matching `target`, tolerating `alternate` as the
    /// spelling of the final segment (the post-rename name) and optionally a
    /// case-insensitive comparison.
    pub fn find_by_fingerprint(
        &self,
        target: &SymbolFingerprint,
        alternate: Option<&str>,
        ignore_case: bool,
    ) -> Option<SymbolId> {
        self.symbol_ids()
            .find(|id| target.matches(&self.fingerprint(*id), alternate, ignore_case))
    }

    pub(crate) fn token_starting_at(&self, start: u32) -> Option<SyntaxToken> {
        self.syntax()
            .token_at_offset(start.into())
            .find(|t| u32::from(t.text_range().start()) == start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn offset(src: &str, pattern: &str) -> u32 {
        src.find(pattern).expect("pattern missing from fixture") as u32
    }

    #[test]
    fn fields_bind_across_a_method_body() {
        let src = "class Counter { int count; int Bump() { count = count + 1; return count; } }";
        let model = SemanticModel::analyze(src);

        let field = model
            .declaration_at(offset(src, "count"))
            .expect("field should be declared");
        assert_eq!(model.symbol(field).kind, SymbolKind::Field);
        assert_eq!(model.references_of(field).len(), 3);
    }

    #[test]
    fn locals_shadow_fields_inside_their_block() {
        let src = "class A { int n; void M() { int n = 0; n = n + 1; } }";
        let model = SemanticModel::analyze(src);

        let field = model.declaration_at(offset(src, "n;")).expect("field");
        let local = model.declaration_at(offset(src, "n = 0")).expect("local");
        assert_eq!(model.symbol(local).kind, SymbolKind::Local);
        assert_eq!(model.references_of(local).len(), 2);
        assert!(model.references_of(field).is_empty());
    }

    #[test]
    fn fingerprints_survive_reanalysis_of_rewritten_text() {
        let src = "class Store { int Fetch() { return Fetch(); } }";
        let model = SemanticModel::analyze(src);
        let method = model.declaration_at(offset(src, "Fetch")).expect("method");
        let print = model.fingerprint(method);

        let rewritten = src.replace("Fetch", "Load");
        let after = SemanticModel::analyze(&rewritten);
        let found = after
            .find_by_fingerprint(&print, Some("Load"), false)
            .expect("renamed method should be re-identified");
        assert_eq!(after.symbol(found).name, "Load");
    }

    #[test]
    fn attribute_references_resolve_through_the_suffix() {
        let src = "class FooAttribute { }\n\n[Foo]\nclass Target { }\n";
        let model = SemanticModel::analyze(src);

        let class = model
            .declaration_at(offset(src, "FooAttribute"))
            .expect("attribute class");
        let refs = model.references_of(class);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, offset(src, "Foo]"));
    }

    #[test]
    fn base_members_are_found_from_derived_types() {
        let src = "class Base { void MoveNext() { } }\n\nclass Derived : Base { }\n";
        let model = SemanticModel::analyze(src);

        let derived = model.declaration_at(offset(src, "Derived")).expect("type");
        let member = model.find_member_including_bases(derived, "MoveNext", false);
        assert!(member.is_some(), "inherited member should be visible");
    }
}
