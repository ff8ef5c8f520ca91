//! Lossless C# syntax trees for the rename engine.
//!
//! The parser covers the declaration and statement surface the engine
//! reasons about. Trees are full-fidelity: every byte of the input,
//! comments and whitespace included, is a token in the tree, and
//! `node.text()` reproduces the source exactly.

use serde::{Deserialize, Serialize};

pub mod ast;
pub mod ident;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use parser::{parse, ParseResult, SyntaxElement, SyntaxNode, SyntaxToken};
pub use quill_core::TextRange;
pub use syntax_kind::{CSharpLanguage, SyntaxKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} at {}..{}", range.start, range.end)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}
