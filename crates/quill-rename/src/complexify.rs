//! Conflict-zone expansion. A node inside a conflict zone is rewritten in
//! isolation: its naively renamed text is spliced into the full source,
//! speculatively re-bound, fully qualified, re-bound again, and only then
//! rename-rewritten by fingerprint identity.

use quill_core::TextRange;
use quill_resolve::{SemanticModel, SymbolId, SymbolKind};
use quill_syntax::{SyntaxKind, SyntaxNode};

use crate::rewriter::Rewriter;
use crate::semantics::ModelSemantics;
use crate::spans::{ComplexifiedSpan, ModifiedSpan};
use crate::RenameError;

/// A single text edit against the expanded region, in absolute offsets of
/// the spliced source.
#[derive(Debug)]
enum Edit {
    Insert { offset: u32, text: String },
    Replace { range: TextRange, text: String },
}

impl Edit {
    fn offset(&self) -> u32 {
        match self {
            Edit::Insert { offset, .. } => *offset,
            Edit::Replace { range, .. } => range.start,
        }
    }
}

impl<'a> Rewriter<'a> {
    pub(crate) fn complexify_node(&mut self, node: &SyntaxNode) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let old_range: TextRange = node.text_range().into();
        tracing::debug!(kind = ?node.kind(), ?old_range, "complexifying conflict zone");

        // Pass 1: the subtree with renames applied naively, no annotations.
        self.ctx.skip_rename_for_complexification += 1;
        let naive = self.capture_subtree(node)?;
        self.ctx.skip_rename_for_complexification -= 1;

        let source = self.model.source();

        // Pass 2: splice, re-bind, and collect qualification edits.
        let spliced = splice(source, old_range, &naive);
        let speculative = self.semantics.bind_speculative(&spliced);
        let naive_end = old_range.start + naive.len() as u32;
        let edits = qualification_edits(&speculative, old_range.start, naive_end);
        let expanded = apply_edits(&naive, old_range.start, edits);

        // Pass 3: re-bind the expanded text and rename by identity.
        let spliced = splice(source, old_range, &expanded);
        let speculative = self.semantics.bind_speculative(&spliced);
        let graft = find_graft(&speculative, old_range.start, expanded.len() as u32, node.kind())
            .ok_or_else(|| {
                tracing::error!(kind = ?node.kind(), ?old_range, "graft node lost after expansion");
                RenameError::Internal("expanded region did not reparse to a node".to_string())
            })?;

        let inner_semantics = ModelSemantics::new(&speculative);
        let mut inner = Rewriter::new(&speculative, self.session, &inner_semantics);
        inner.ctx.is_processing_complexified = true;
        inner.visit_node(&graft)?;

        let original_region = &source[old_range.start as usize..old_range.end as usize];
        if inner.out == original_region {
            // The expansion changed nothing; re-running the engine over its
            // own output must converge, so emit the region untouched.
            self.out.push_str(&inner.out);
            return Ok(());
        }

        let base = self.out.len() as u32;
        self.renamed_count += inner.renamed_count;

        // Inner annotations carry offsets into the speculative text; remap
        // their keys to the final output and their provenance to the region.
        let mut inner_annotations = inner.annotations;
        for (_, annotation) in inner_annotations.iter_mut() {
            annotation.original_span = old_range;
        }
        self.annotations.extend_shifted(inner_annotations, base);

        let sub_spans: Vec<ModifiedSpan> = inner
            .spans
            .modified_spans()
            .iter()
            .map(|span| ModifiedSpan {
                old: TextRange::new(span.old.start - old_range.start, span.old.end - old_range.start),
                new: TextRange::new(span.new.start - old_range.start, span.new.end - old_range.start),
            })
            .collect();
        self.spans.add_complexified_span(ComplexifiedSpan {
            old: old_range,
            new: TextRange::at(old_range.start, inner.out.len() as u32),
            sub_spans,
        });
        self.out.push_str(&inner.out);
        Ok(())
    }

    /// Run the normal traversal over `node` into a scratch emitter and hand
    /// back the text, discarding scratch spans and annotations.
    fn capture_subtree(&mut self, node: &SyntaxNode) -> Result<String, RenameError> {
        let saved_out = std::mem::take(&mut self.out);
        let saved_spans = std::mem::take(&mut self.spans);
        let saved_annotations = std::mem::take(&mut self.annotations);
        let saved_count = self.renamed_count;

        let outcome = self.visit_node(node);

        let captured = std::mem::replace(&mut self.out, saved_out);
        self.spans = saved_spans;
        self.annotations = saved_annotations;
        self.renamed_count = saved_count;
        outcome?;
        Ok(captured)
    }
}

fn splice(source: &str, range: TextRange, replacement: &str) -> String {
    let mut spliced = String::with_capacity(source.len() + replacement.len());
    spliced.push_str(&source[..range.start as usize]);
    spliced.push_str(replacement);
    spliced.push_str(&source[range.end as usize..]);
    spliced
}

/// Qualification for every bare name in the region whose binding could be
/// captured by the new name: members gain their receiver, nested types and
/// namespaces gain their container path, aliases are replaced by their
/// targets. Locals, parameters, labels, and type parameters stay bare.
fn qualification_edits(model: &SemanticModel, region_start: u32, region_end: u32) -> Vec<Edit> {
    let mut edits = Vec::new();
    let root = model.syntax();
    for node in root.descendants() {
        if node.kind() != SyntaxKind::IdentifierName {
            continue;
        }
        let range: TextRange = node.text_range().into();
        if range.start < region_start || range.end > region_end {
            continue;
        }
        if is_already_qualified(&node) {
            continue;
        }
        let Some(token) = node.first_token() else { continue };
        let Some(symbol) = model.resolved_at(range.start) else {
            continue;
        };
        let data = model.symbol(symbol);
        match data.kind {
            SymbolKind::Field | SymbolKind::Property | SymbolKind::Method
                if !data.is_constructor =>
            {
                let Some(container) = data.container else { continue };
                if !model.symbol(container).is_type() {
                    continue;
                }
                if data.is_static {
                    if let Some(path) = symbol_path(model, container) {
                        edits.push(Edit::Insert {
                            offset: range.start,
                            text: format!("{path}."),
                        });
                    }
                } else if !in_static_member(&node) {
                    edits.push(Edit::Insert {
                        offset: range.start,
                        text: "this.".to_string(),
                    });
                }
            }
            SymbolKind::EnumMember => {
                if let Some(enum_type) = data.container {
                    if let Some(path) = symbol_path(model, enum_type) {
                        edits.push(Edit::Insert {
                            offset: range.start,
                            text: format!("{path}."),
                        });
                    }
                }
            }
            SymbolKind::Type | SymbolKind::Namespace => {
                let Some(container) = data.container else { continue };
                if let Some(path) = symbol_path(model, container) {
                    edits.push(Edit::Insert {
                        offset: range.start,
                        text: format!("{path}."),
                    });
                }
            }
            SymbolKind::Alias => {
                if let Some(target) = data.alias_target.clone() {
                    edits.push(Edit::Replace {
                        range: TextRange::new(range.start, range.start + token.text().len() as u32),
                        text: target,
                    });
                }
            }
            _ => {}
        }
    }
    edits
}

/// Right-hand sides of `a.b` and `A.B` are already qualified by their left
/// neighbor.
fn is_already_qualified(name: &SyntaxNode) -> bool {
    let Some(parent) = name.parent() else { return false };
    match parent.kind() {
        SyntaxKind::QualifiedName | SyntaxKind::MemberAccessExpression => {
            parent.children().next().map(|first| first != *name) == Some(true)
        }
        _ => false,
    }
}

fn in_static_member(node: &SyntaxNode) -> bool {
    node.ancestors()
        .find(|ancestor| {
            matches!(
                ancestor.kind(),
                SyntaxKind::MethodDeclaration
                    | SyntaxKind::ConstructorDeclaration
                    | SyntaxKind::DestructorDeclaration
                    | SyntaxKind::PropertyDeclaration
                    | SyntaxKind::FieldDeclaration
            )
        })
        .is_some_and(|member| {
            member
                .children_with_tokens()
                .filter_map(|element| element.into_token())
                .any(|token| token.kind() == SyntaxKind::StaticKw)
        })
}

/// Dotted path of a symbol, container chain included.
fn symbol_path(model: &SemanticModel, id: SymbolId) -> Option<String> {
    let path = model.fingerprint(id).path.join(".");
    (!path.is_empty()).then_some(path)
}

fn apply_edits(region: &str, region_start: u32, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| std::cmp::Reverse(edit.offset()));
    let mut text = region.to_string();
    for edit in edits {
        match edit {
            Edit::Insert { offset, text: insert } => {
                text.insert_str((offset - region_start) as usize, &insert);
            }
            Edit::Replace { range, text: replacement } => {
                let start = (range.start - region_start) as usize;
                let end = (range.end - region_start) as usize;
                text.replace_range(start..end, &replacement);
            }
        }
    }
    text
}

/// Locate the node in the re-bound tree covering exactly the expanded region,
/// preferring the original kind.
fn find_graft(
    model: &SemanticModel,
    start: u32,
    len: u32,
    kind: SyntaxKind,
) -> Option<SyntaxNode> {
    let range = TextRange::at(start, len);
    let covering = model.parse().covering_element(range);
    let seed = match covering {
        quill_syntax::SyntaxElement::Node(node) => node,
        quill_syntax::SyntaxElement::Token(token) => token.parent()?,
    };
    let exact = |node: &SyntaxNode| {
        let node_range: TextRange = node.text_range().into();
        node_range == range
    };
    seed.ancestors()
        .find(|node| exact(node) && node.kind() == kind)
        .or_else(|| seed.ancestors().find(exact))
}
