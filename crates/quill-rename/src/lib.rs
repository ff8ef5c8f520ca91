//! Symbol renaming over C# syntax trees.
//!
//! One [`rename`] call rewrites every occurrence of a symbol, substitutes
//! inside opted-in strings and comments, expands conflict zones to fully
//! qualified form, and reports declaration conflicts the new name creates.

mod annotation;
mod complexify;
mod conflicts;
mod rewriter;
mod semantics;
mod session;
mod spans;
mod text_rename;
mod validity;

pub use annotation::{AnnotationTable, RenameAnnotation};
pub use conflicts::detect_conflicts;
pub use rewriter::{rewrite, RewriteResult};
pub use semantics::{ModelSemantics, RenameSemantics};
pub use session::{RenameLocation, RenameSession};
pub use spans::{ComplexifiedSpan, ModifiedSpan, RenamedSpansTracker};
pub use text_rename::{replace_matching_substrings, SubstitutionResult};
pub use validity::{ensure_valid_replacement, is_valid_replacement};

use quill_core::TextRange;
use quill_resolve::SemanticModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error(transparent)]
    Cancelled(#[from] quill_core::Cancelled),
    #[error("invalid replacement text `{0}`")]
    InvalidReplacementText(String),
    /// An invariant of the engine was violated; the input tree is left
    /// untouched and the fault has already been logged.
    #[error("rename engine fault: {0}")]
    Internal(String),
}

/// Options for one top-level rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameParams {
    /// Offset of any occurrence of the symbol to rename.
    pub position: u32,
    pub new_name: String,
    #[serde(default)]
    pub rename_in_strings: bool,
    #[serde(default)]
    pub rename_in_comments: bool,
    /// Regions the caller already knows bind differently under the new name
    /// and wants expanded to fully qualified form.
    #[serde(default)]
    pub conflict_zones: Vec<TextRange>,
}

impl RenameParams {
    pub fn new(position: u32, new_name: impl Into<String>) -> RenameParams {
        RenameParams {
            position,
            new_name: new_name.into(),
            rename_in_strings: false,
            rename_in_comments: false,
            conflict_zones: Vec::new(),
        }
    }
}

/// Everything a caller needs to apply or review a rename.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub text: String,
    pub modified_spans: Vec<ModifiedSpan>,
    pub complexified_spans: Vec<ComplexifiedSpan>,
    pub annotations: AnnotationTable,
    /// Conflict spans in original-text coordinates, sorted.
    pub conflicts: Vec<TextRange>,
    pub replacement_text_valid: bool,
}

/// Rename the symbol at `params.position` in `source`.
pub fn rename(source: &str, params: &RenameParams) -> Result<RenameOutcome, RenameError> {
    ensure_valid_replacement(&params.new_name)?;

    let model = SemanticModel::analyze(source);
    let symbol = model
        .symbols_at(params.position)
        .into_iter()
        .next()
        .ok_or_else(|| {
            tracing::error!(position = params.position, "no symbol at rename position");
            RenameError::Internal("no symbol at rename position".to_string())
        })?;

    let mut session = RenameSession::new(&model, symbol, &params.new_name)
        .with_rename_in_strings(params.rename_in_strings)
        .with_rename_in_comments(params.rename_in_comments);
    for &zone in &params.conflict_zones {
        session = session.with_conflict_zone(zone);
    }

    let semantics = ModelSemantics::new(&model);
    let result = rewrite(&model, &session, &semantics)?;
    let conflicts = detect_conflicts(&model, &session, &result)?;

    Ok(RenameOutcome {
        text: result.text.clone(),
        modified_spans: result.spans.modified_spans().to_vec(),
        complexified_spans: result.spans.complexified_spans().to_vec(),
        annotations: result.annotations,
        conflicts,
        replacement_text_valid: result.replacement_text_valid,
    })
}
