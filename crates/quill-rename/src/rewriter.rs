//! The identifier rewriter: one depth-first pass that emits the rewritten
//! text, the modified-span list, and the annotation table.
//!
//! Emission is linear and append-only, so `out.len()` at the moment a token
//! is written is that token's final offset; annotations are keyed by it.

use quill_core::TextRange;
use quill_resolve::{SemanticModel, SymbolKind};
use quill_syntax::ident;
use quill_syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

use crate::annotation::{AnnotationTable, RenameAnnotation};
use crate::semantics::RenameSemantics;
use crate::session::RenameSession;
use crate::spans::RenamedSpansTracker;
use crate::text_rename::replace_matching_substrings;
use crate::RenameError;

#[derive(Debug, Clone)]
pub struct RewriteResult {
    /// The rewritten source text. Reparsing it yields the rewritten tree.
    pub text: String,
    pub spans: RenamedSpansTracker,
    pub annotations: AnnotationTable,
    pub replacement_text_valid: bool,
}

impl RewriteResult {
    pub fn syntax(&self) -> SyntaxNode {
        quill_syntax::parse(&self.text).syntax()
    }
}

/// Explicit traversal state threaded through the recursion; the engine has
/// no ambient fields, so parallel sessions cannot observe each other.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TraversalContext {
    pub skip_rename_for_complexification: u32,
    pub is_processing_complexified: bool,
}

pub fn rewrite(
    model: &SemanticModel,
    session: &RenameSession,
    semantics: &dyn RenameSemantics,
) -> Result<RewriteResult, RenameError> {
    session.cancellation.check()?;
    tracing::debug!(
        original = %session.original_text,
        replacement = %session.replacement_text,
        "rewrite pass"
    );
    let mut rewriter = Rewriter::new(model, session, semantics);
    let root = model.syntax();
    rewriter.visit_node(&root)?;
    Ok(rewriter.finish())
}

pub(crate) struct Rewriter<'a> {
    pub(crate) model: &'a SemanticModel,
    pub(crate) session: &'a RenameSession,
    pub(crate) semantics: &'a dyn RenameSemantics,
    pub(crate) out: String,
    pub(crate) spans: RenamedSpansTracker,
    pub(crate) annotations: AnnotationTable,
    pub(crate) renamed_count: u32,
    pub(crate) ctx: TraversalContext,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(
        model: &'a SemanticModel,
        session: &'a RenameSession,
        semantics: &'a dyn RenameSemantics,
    ) -> Self {
        Self {
            model,
            session,
            semantics,
            out: String::with_capacity(model.source().len()),
            spans: RenamedSpansTracker::default(),
            annotations: AnnotationTable::default(),
            renamed_count: 0,
            ctx: TraversalContext::default(),
        }
    }

    pub(crate) fn finish(self) -> RewriteResult {
        RewriteResult {
            text: self.out,
            spans: self.spans,
            annotations: self.annotations,
            replacement_text_valid: self.session.replacement_text_valid,
        }
    }

    pub(crate) fn visit_node(&mut self, node: &SyntaxNode) -> Result<(), RenameError> {
        self.session.cancellation.check()?;

        if self.should_complexify(node) {
            return self.complexify_node(node);
        }

        let is_invocation = node.kind() == SyntaxKind::InvocationExpression;
        let new_start = self.out.len() as u32;
        let renamed_before = self.renamed_count;

        for element in node.children_with_tokens() {
            match element {
                quill_syntax::SyntaxElement::Node(child) => self.visit_node(&child)?,
                quill_syntax::SyntaxElement::Token(token) => self.visit_token(&token)?,
            }
        }

        // Invocations that contain a renamed token get a conflict-check
        // annotation so the detector can re-examine overload resolution.
        if is_invocation && self.renamed_count > renamed_before {
            self.annotations.insert(
                new_start,
                RenameAnnotation {
                    original_span: node.text_range().into(),
                    is_invocation_expression: true,
                    ..Default::default()
                },
            );
        }
        Ok(())
    }

    fn should_complexify(&self, node: &SyntaxNode) -> bool {
        if self.ctx.is_processing_complexified
            || self.ctx.skip_rename_for_complexification > 0
        {
            return false;
        }
        let span: TextRange = node.text_range().into();
        if !self.session.is_conflict_zone(span) {
            return false;
        }
        if self.is_in_conflict_lambda_body(node) {
            return false;
        }
        let kind = node.kind();
        kind.is_expression()
            || kind.is_statement()
            || matches!(
                kind,
                SyntaxKind::Attribute
                    | SyntaxKind::AttributeArgument
                    | SyntaxKind::BaseList
                    | SyntaxKind::ConstructorInitializer
                    | SyntaxKind::FieldDeclaration
            )
    }

    /// A node nested inside a lambda whose body is itself a conflict zone is
    /// handled when the lambda is complexified, not on its own.
    fn is_in_conflict_lambda_body(&self, node: &SyntaxNode) -> bool {
        node.ancestors().skip(1).any(|ancestor| {
            ancestor.kind() == SyntaxKind::LambdaExpression
                && ancestor
                    .children()
                    .last()
                    .is_some_and(|body| self.session.is_conflict_zone(body.text_range().into()))
        })
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> Result<(), RenameError> {
        let kind = token.kind();
        if kind.is_comment() {
            return self.visit_string_or_comment(token, false);
        }
        if kind.is_trivia() {
            self.out.push_str(token.text());
            return Ok(());
        }
        if kind == SyntaxKind::StringLiteral {
            return self.visit_string_or_comment(token, true);
        }
        if self.token_needs_conflict_check(token) {
            self.rename_and_annotate(token)
        } else {
            self.out.push_str(token.text());
            Ok(())
        }
    }

    fn visit_string_or_comment(
        &mut self,
        token: &SyntaxToken,
        is_string: bool,
    ) -> Result<(), RenameError> {
        let opted_in = if is_string {
            self.session.rename_in_strings
        } else {
            self.session.rename_in_comments
        };
        let forced = self
            .session
            .has_string_or_comment_location(token.text_range().into());
        if (!opted_in && !forced) || self.ctx.is_processing_complexified {
            self.out.push_str(token.text());
            return Ok(());
        }

        let start = u32::from(token.text_range().start());
        let sub_spans = self
            .session
            .string_and_comment_spans
            .get(&start)
            .and_then(|spans| spans.as_deref());
        let result = replace_matching_substrings(
            token.text(),
            &self.session.original_text,
            &self.session.replacement_text,
            sub_spans,
        );
        if result.changed() {
            let new_offset = self.out.len() as u32;
            for replaced in &result.replaced {
                let old = TextRange::new(start + replaced.start, start + replaced.end);
                self.spans
                    .add_modified_span(old, self.session.replacement_text.len() as u32);
            }
            self.annotations.insert(
                new_offset,
                RenameAnnotation {
                    original_span: token.text_range().into(),
                    is_rename_location: true,
                    ..Default::default()
                },
            );
        }
        self.out.push_str(&result.text);
        Ok(())
    }

    fn token_needs_conflict_check(&self, token: &SyntaxToken) -> bool {
        let kind = token.kind();
        if !kind.is_identifier_like() && !kind.is_accessor_keyword() {
            return false;
        }
        let start = u32::from(token.text_range().start());
        if !self.ctx.is_processing_complexified && self.session.location_at(start).is_some() {
            return true;
        }
        let value = ident::value_text(token.text());
        if value == self.session.replacement_value_text()
            || value == self.session.original_text
            || self.session.possible_name_conflicts.contains(&value)
        {
            return true;
        }
        if kind.is_accessor_keyword() {
            if let Some(property_name) = enclosing_property_name(token) {
                // `init` shares the setter's compiler-shaped name.
                let prefix = if kind == SyntaxKind::GetKw { "get" } else { "set" };
                if format!("{prefix}_{property_name}") == self.session.replacement_text {
                    return true;
                }
            }
        }
        if self.session.replacement_text == "Finalize"
            && token
                .parent_ancestors()
                .any(|n| n.kind() == SyntaxKind::DestructorDeclaration)
        {
            return true;
        }
        false
    }

    fn rename_and_annotate(&mut self, token: &SyntaxToken) -> Result<(), RenameError> {
        let start = u32::from(token.text_range().start());
        let old_range: TextRange = token.text_range().into();
        let location = if self.ctx.is_processing_complexified {
            None
        } else {
            self.session.location_at(start).copied()
        };

        let symbols = self.semantics.symbols_at(start);

        // Namespace declaration names that are not rename locations are
        // handled by whoever renames the namespace; leave them untouched.
        if location.is_none() && !self.ctx.is_processing_complexified && symbols.len() == 1 {
            let sym = self.model.symbol(symbols[0]);
            if sym.kind == SymbolKind::Namespace
                && self.model.declaration_at(start) == Some(symbols[0])
            {
                self.out.push_str(token.text());
                return Ok(());
            }
        }

        let mut fingerprints = Vec::with_capacity(symbols.len());
        for &symbol in &symbols {
            match self.semantics.find_source_declaration(symbol) {
                Some(declaration) => fingerprints.push(self.model.fingerprint(declaration)),
                None => {
                    tracing::error!(?symbol, "source declaration unresolvable");
                    return Err(RenameError::Internal(
                        "source declaration unresolvable".to_string(),
                    ));
                }
            }
        }

        let replacement_value = self.session.replacement_value_text();
        let should_rename = if self.ctx.is_processing_complexified {
            ident::value_text(token.text()) == self.session.original_text
                && symbols.iter().any(|&s| {
                    self.session.target_fingerprint.matches(
                        &self.model.fingerprint(s),
                        Some(&replacement_value),
                        false,
                    )
                })
        } else {
            location.is_some() && self.ctx.skip_rename_for_complexification == 0
        };

        let is_original_declaration = !self.ctx.is_processing_complexified
            && self.model.declaration_at(start) == Some(self.session.symbol);
        let is_namespace_declaration_reference = symbols.len() == 1
            && self.model.symbol(symbols[0]).kind == SymbolKind::Namespace;
        let is_member_group_reference = self.semantics.is_in_nameof_context(start);

        let new_offset = self.out.len() as u32;
        if should_rename {
            let prefix = match location {
                Some(l) if l.is_renamable_accessor => accessor_prefix_of(token.text()),
                _ => String::new(),
            };
            let suffix = symbols
                .iter()
                .any(|&s| self.model.symbol(s).is_implicit_delegate)
                .then(|| "EventHandler".to_string());
            let new_text = self.rename_token_text(token, &prefix, suffix.as_deref());
            self.annotations.insert(
                new_offset,
                RenameAnnotation {
                    original_span: old_range,
                    is_rename_location: true,
                    prefix,
                    suffix,
                    declaration_fingerprints: fingerprints,
                    is_original_declaration,
                    is_namespace_declaration_reference,
                    is_member_group_reference,
                    is_invocation_expression: false,
                },
            );
            self.emit_changed(old_range, &new_text);
            self.renamed_count += 1;
        } else {
            self.annotations.insert(
                new_offset,
                RenameAnnotation {
                    original_span: old_range,
                    is_rename_location: false,
                    prefix: String::new(),
                    suffix: None,
                    declaration_fingerprints: fingerprints,
                    is_original_declaration,
                    is_namespace_declaration_reference,
                    is_member_group_reference,
                    is_invocation_expression: false,
                },
            );
            self.out.push_str(token.text());
        }
        Ok(())
    }

    /// The display text for a renamed token.
    fn rename_token_text(&self, token: &SyntaxToken, prefix: &str, suffix: Option<&str>) -> String {
        let mut replacement = self.session.replacement_text.clone();
        if ident::is_verbatim(&replacement) {
            replacement = replacement[1..].to_string();
        }

        // An attribute referenced by its short form keeps the short form.
        if is_attribute_name_position(token) {
            if let Some(short_original) =
                ident::without_attribute_suffix(&self.session.original_text)
            {
                if ident::value_text(token.text()) == short_original {
                    if let Some(short) = ident::without_attribute_suffix(&replacement) {
                        replacement = short.to_string();
                    }
                }
            }
        }

        let mut new_text = format!("{prefix}{replacement}{}", suffix.unwrap_or(""));
        let value = ident::value_text(&new_text);
        let old_was_verbatim = ident::is_verbatim(token.text());
        if old_was_verbatim || ident::is_reserved_keyword(&value) {
            // Re-escape only when the replacement is valid; an invalid
            // replacement is left for the caller to surface.
            if self.session.replacement_text_valid {
                new_text = ident::escape_if_needed(&new_text);
            }
        } else {
            new_text = ident::unescape_if_possible(&new_text);
        }
        new_text
    }

    pub(crate) fn emit_changed(&mut self, old_range: TextRange, text: &str) {
        let old_text = &self.model.source()[old_range.start as usize..old_range.end as usize];
        if text != old_text {
            self.spans.add_modified_span(old_range, text.len() as u32);
        }
        self.out.push_str(text);
    }
}

/// `get_Foo` -> `get_`; everything up to and including the first underscore.
fn accessor_prefix_of(text: &str) -> String {
    match text.find('_') {
        Some(idx) => text[..=idx].to_string(),
        None => String::new(),
    }
}

fn enclosing_property_name(token: &SyntaxToken) -> Option<String> {
    use quill_syntax::ast::{AccessorDeclaration, AstNode};
    let accessor = token
        .parent_ancestors()
        .find_map(AccessorDeclaration::cast)?;
    let property = accessor.property()?;
    Some(ident::value_text(property.name_token()?.text()))
}

fn is_attribute_name_position(token: &SyntaxToken) -> bool {
    let mut current = token.parent();
    while let Some(node) = current {
        match node.kind() {
            SyntaxKind::IdentifierName | SyntaxKind::QualifiedName => {
                current = node.parent();
            }
            SyntaxKind::Attribute => return true,
            _ => return false,
        }
    }
    false
}
