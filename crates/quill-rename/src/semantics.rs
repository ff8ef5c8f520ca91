//! Semantic-services seam between the engine and the resolver.
//!
//! The engine only ever asks these questions; the production answers come
//! from [`quill_resolve::SemanticModel`] through [`ModelSemantics`].

use quill_resolve::{SemanticModel, SymbolId};
use quill_syntax::SyntaxKind;

pub trait RenameSemantics {
    /// Symbols whose declaration or reference covers `position`.
    fn symbols_at(&self, position: u32) -> Vec<SymbolId>;

    /// Resolve a symbol to its source declaration. May block on an external
    /// lookup, but is bounded and called at most once per annotated token.
    fn find_source_declaration(&self, symbol: SymbolId) -> Option<SymbolId>;

    /// Bind a rewritten source text without committing it anywhere.
    fn bind_speculative(&self, source: &str) -> SemanticModel;

    /// Whether the token at `position` sits inside a `nameof(..)` argument.
    fn is_in_nameof_context(&self, position: u32) -> bool;
}

pub struct ModelSemantics<'a> {
    model: &'a SemanticModel,
}

impl<'a> ModelSemantics<'a> {
    pub fn new(model: &'a SemanticModel) -> Self {
        Self { model }
    }
}

impl RenameSemantics for ModelSemantics<'_> {
    fn symbols_at(&self, position: u32) -> Vec<SymbolId> {
        self.model.symbols_at(position)
    }

    fn find_source_declaration(&self, symbol: SymbolId) -> Option<SymbolId> {
        // Single-file model: every symbol is its own source declaration.
        Some(symbol)
    }

    fn bind_speculative(&self, source: &str) -> SemanticModel {
        SemanticModel::analyze(source)
    }

    fn is_in_nameof_context(&self, position: u32) -> bool {
        let root = self.model.syntax();
        root.token_at_offset(position.into())
            .right_biased()
            .map(|token| {
                token
                    .parent_ancestors()
                    .any(|n| n.kind() == SyntaxKind::NameOfExpression)
            })
            .unwrap_or(false)
    }
}
