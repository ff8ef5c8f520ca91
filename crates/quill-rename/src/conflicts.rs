//! Declaration-level conflict detection. Runs after the rewrite pass and
//! reports every span, in original-text coordinates, where the new name
//! collides with an existing declaration or breaks an implicit protocol.

use std::collections::BTreeSet;

use quill_core::TextRange;
use quill_resolve::{SemanticModel, SymbolData, SymbolId, SymbolKind};
use quill_syntax::ast::{self, AstNode};
use quill_syntax::{SyntaxKind, SyntaxNode};

use crate::rewriter::RewriteResult;
use crate::session::RenameSession;
use crate::RenameError;

/// Members looked up structurally rather than by reference: renaming one of
/// these away, or onto one of these, can silently change meaning.
const IMPLICIT_PROTOCOL_MEMBERS: &[&str] =
    &["Current", "MoveNext", "GetEnumerator", "GetAwaiter", "Deconstruct"];

pub fn detect_conflicts(
    model: &SemanticModel,
    session: &RenameSession,
    result: &RewriteResult,
) -> Result<Vec<TextRange>, RenameError> {
    let mut detector = ConflictDetector {
        model,
        session,
        replacement: session.replacement_value_text(),
        conflicts: BTreeSet::new(),
    };
    detector.member_clashes()?;
    detector.local_shadowing()?;
    detector.label_clashes()?;
    detector.signature_duplication()?;
    detector.alias_redefinition()?;
    detector.type_parameter_clashes()?;
    detector.implicit_protocol(result)?;
    detector.local_variable_capture()?;
    tracing::debug!(count = detector.conflicts.len(), "conflict detection done");
    Ok(detector.conflicts.into_iter().collect())
}

struct ConflictDetector<'a> {
    model: &'a SemanticModel,
    session: &'a RenameSession,
    replacement: String,
    conflicts: BTreeSet<TextRange>,
}

impl<'a> ConflictDetector<'a> {
    fn target(&self) -> &'a SymbolData {
        self.model.symbol(self.session.symbol)
    }

    fn flag_declarations(&mut self, id: SymbolId) {
        for &range in &self.model.symbol(id).declarations {
            self.conflicts.insert(range);
        }
    }

    /// Sibling members that already carry the new name, plus the
    /// containing-type clash. Enum containers are exempt: an enum member may
    /// share its enum's name.
    fn member_clashes(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let target = self.target();
        if !matches!(
            target.kind,
            SymbolKind::Type
                | SymbolKind::Method
                | SymbolKind::Property
                | SymbolKind::Field
                | SymbolKind::EnumMember
        ) {
            return Ok(());
        }

        // Names the rename effectively claims. A property claims its
        // accessor and backing-field spellings too, so a property renamed to
        // X clashes with an existing get_X method.
        let mut claimed = vec![self.replacement.clone()];
        if target.kind == SymbolKind::Property {
            claimed.push(format!("get_{}", self.replacement));
            claimed.push(format!("set_{}", self.replacement));
            claimed.push(format!("_{}", self.replacement));
        }

        if let Some(container) = target.container {
            let container_data = self.model.symbol(container);
            if !container_data.is_enum_type() {
                let siblings: Vec<SymbolId> = container_data.members.clone();
                for sibling in siblings {
                    if sibling == self.session.symbol {
                        continue;
                    }
                    let data = self.model.symbol(sibling);
                    if data.is_constructor {
                        continue;
                    }
                    // Method pairs overload; same-signature pairs are caught
                    // by the signature check instead.
                    if target.kind == SymbolKind::Method && data.kind == SymbolKind::Method {
                        continue;
                    }
                    if claimed.iter().any(|name| *name == data.name) {
                        self.flag_declarations(sibling);
                        self.flag_declarations(self.session.symbol);
                    }
                }
            }
            // A member may not take the name of one of the containing
            // type's type parameters.
            if container_data.is_type() {
                let type_params: Vec<SymbolId> = container_data.params.clone();
                for param in type_params {
                    let data = self.model.symbol(param);
                    if data.kind == SymbolKind::TypeParameter && data.name == self.replacement {
                        self.flag_declarations(param);
                        self.flag_declarations(self.session.symbol);
                    }
                }
            }
            // A member may not take its containing type's name.
            if container_data.is_type()
                && !container_data.is_enum_type()
                && container_data.name == self.replacement
                && target.kind != SymbolKind::Type
            {
                self.flag_declarations(self.session.symbol);
            }
        }

        // Renaming a type onto one of its own members.
        if target.kind == SymbolKind::Type && !target.is_enum_type() {
            let members: Vec<SymbolId> = target.members.clone();
            for member in members {
                let data = self.model.symbol(member);
                if data.is_constructor || data.kind == SymbolKind::TypeParameter {
                    continue;
                }
                if data.name == self.replacement {
                    self.flag_declarations(member);
                }
            }
        }
        Ok(())
    }

    /// Locals, parameters, and range variables of the same member may not
    /// collide; the conflict covers the shadowing declaration and every
    /// reference of the renamed symbol.
    fn local_shadowing(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let target = self.target();
        if !target.is_local_like() {
            return Ok(());
        }
        let Some(member) = target.container else {
            return Ok(());
        };
        let mut clashed = false;
        for other in self.model.symbol_ids() {
            let data = self.model.symbol(other);
            if other != self.session.symbol
                && data.is_local_like()
                && data.container == Some(member)
                && data.name == self.replacement
            {
                self.flag_declarations(other);
                clashed = true;
            }
        }
        if clashed {
            self.flag_declarations(self.session.symbol);
            for reference in self.model.references_of(self.session.symbol) {
                self.conflicts.insert(reference);
            }
        }
        Ok(())
    }

    fn label_clashes(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let target = self.target();
        if target.kind != SymbolKind::Label {
            return Ok(());
        }
        let container = target.container;
        for other in self.model.symbol_ids() {
            let data = self.model.symbol(other);
            if other != self.session.symbol
                && data.kind == SymbolKind::Label
                && data.container == container
                && data.name == self.replacement
            {
                self.flag_declarations(other);
                self.flag_declarations(self.session.symbol);
            }
        }
        Ok(())
    }

    /// Two methods with indistinguishable signatures in one container.
    /// Optional parameters may be elided at call sites, so a shorter
    /// signature also collides with a longer one it is a prefix of.
    fn signature_duplication(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let target = self.target();
        if target.kind != SymbolKind::Method {
            return Ok(());
        }
        let Some(container) = target.container else {
            return Ok(());
        };
        let siblings: Vec<SymbolId> = self.model.symbol(container).members.clone();
        for sibling in siblings {
            if sibling == self.session.symbol {
                continue;
            }
            let data = self.model.symbol(sibling);
            if data.kind == SymbolKind::Method
                && data.name == self.replacement
                && signatures_collide(target, data)
            {
                self.flag_declarations(sibling);
                self.flag_declarations(self.session.symbol);
            }
        }
        Ok(())
    }

    /// Two aliases with the same name in one directive scope. Aliases in
    /// different namespace blocks never collide.
    fn alias_redefinition(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        if self.target().kind != SymbolKind::Alias {
            return Ok(());
        }
        let Some(scope) = self.directive_scope(self.session.symbol) else {
            return Ok(());
        };
        for other in self.model.symbol_ids() {
            let data = self.model.symbol(other);
            if other != self.session.symbol
                && data.kind == SymbolKind::Alias
                && data.name == self.replacement
                && self.directive_scope(other) == Some(scope)
            {
                self.flag_declarations(other);
                self.flag_declarations(self.session.symbol);
            }
        }
        Ok(())
    }

    /// The node range of the namespace block (or compilation unit) holding an
    /// alias directive; used as the scope identity.
    fn directive_scope(&self, alias: SymbolId) -> Option<TextRange> {
        let declaration = *self.model.symbol(alias).declarations.first()?;
        let token = self
            .model
            .parse()
            .token_at_offset(declaration.start)
            .right_biased()?;
        token
            .parent_ancestors()
            .find(|node| {
                matches!(
                    node.kind(),
                    SyntaxKind::NamespaceDeclaration | SyntaxKind::CompilationUnit
                )
            })
            .map(|node| node.text_range().into())
    }

    /// A type parameter may not collide with another in the same list, nor
    /// with one on the containing type (and vice versa).
    fn type_parameter_clashes(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let target = self.target();
        if target.kind != SymbolKind::TypeParameter {
            return Ok(());
        }
        let Some(owner) = target.container else {
            return Ok(());
        };
        let mut scopes = vec![owner];
        let owner_data = self.model.symbol(owner);
        match owner_data.kind {
            // Method type parameters also clash with the containing type's.
            SymbolKind::Method => scopes.extend(owner_data.container),
            // Type parameters on a type clash with those on its methods.
            SymbolKind::Type => scopes.extend(owner_data.members.iter().copied()),
            _ => {}
        }
        for scope in scopes {
            let params: Vec<SymbolId> = self.model.symbol(scope).params.clone();
            for param in params {
                if param == self.session.symbol {
                    continue;
                }
                let data = self.model.symbol(param);
                if data.kind == SymbolKind::TypeParameter && data.name == self.replacement {
                    self.flag_declarations(param);
                    self.flag_declarations(self.session.symbol);
                }
            }
        }
        Ok(())
    }

    /// Renaming a structurally looked-up member away breaks the construct
    /// that consumes it; renaming onto one hides an inherited protocol
    /// member. Both directions are checked.
    fn implicit_protocol(&mut self, result: &RewriteResult) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        let target = self.target();
        let target_name = target.name.clone();
        let target_container = target.container;

        // Away: the renamed member was part of a protocol; find the
        // constructs bound through it and confirm against the rewritten
        // source that the member is really gone.
        if IMPLICIT_PROTOCOL_MEMBERS.contains(&target_name.as_str())
            && self.replacement != target_name
        {
            let sites = self.protocol_sites(&target_name);
            if !sites.is_empty() && self.member_gone_after(result, &target_name) {
                for site in sites {
                    self.conflicts.insert(site);
                }
            }
        }

        // Onto: the new name is a protocol member already provided by a base
        // type; the rename would hide it.
        if IMPLICIT_PROTOCOL_MEMBERS.contains(&self.replacement.as_str())
            && target_name != self.replacement
        {
            if let Some(container) = target_container {
                let hides_base = self
                    .model
                    .base_types_of(container)
                    .into_iter()
                    .any(|base| {
                        self.model
                            .find_member_including_bases(base, &self.replacement, false)
                            .is_some()
                    });
                if hides_base {
                    self.flag_declarations(self.session.symbol);
                }
            }
        }
        Ok(())
    }

    /// Constructs whose subject type owns the renamed protocol member.
    fn protocol_sites(&self, name: &str) -> Vec<TextRange> {
        let Some(owner) = self.target().container else {
            return Vec::new();
        };
        let mut sites = Vec::new();
        let root = self.model.syntax();
        for node in root.descendants() {
            let subject: Option<SyntaxNode> = match node.kind() {
                SyntaxKind::ForEachStatement
                    if matches!(name, "Current" | "MoveNext" | "GetEnumerator") =>
                {
                    ast::ForEachStatement::cast(node.clone()).and_then(|f| f.collection())
                }
                SyntaxKind::AwaitExpression if name == "GetAwaiter" => {
                    node.children().next()
                }
                // `(a, b) = p;` deconstructs through `p.Deconstruct`.
                SyntaxKind::AssignmentExpression if name == "Deconstruct" => {
                    let mut children = node.children();
                    match (children.next(), children.next()) {
                        (Some(lhs), rhs) if lhs.kind() == SyntaxKind::TupleExpression => rhs,
                        _ => None,
                    }
                }
                _ => None,
            };
            let Some(subject) = subject else { continue };
            if self.model.type_of_expression(&subject) == Some(owner) {
                sites.push(node.text_range().into());
            }
        }
        sites
    }

    /// Re-analyze the rewritten text and check whether the protocol member
    /// disappeared from the owning type.
    fn member_gone_after(&self, result: &RewriteResult, name: &str) -> bool {
        let Some(owner) = self.target().container else {
            return false;
        };
        let owner_print = self.model.fingerprint(owner);
        let after = SemanticModel::analyze(&result.text);
        let Some(owner_after) =
            after.find_by_fingerprint(&owner_print, Some(&self.replacement), false)
        else {
            return true;
        };
        after
            .find_member_including_bases(owner_after, name, false)
            .is_none()
    }

    /// An unqualified invocation of the renamed method turns into a call
    /// through a local once a local or parameter with the new name is in
    /// scope at the call site.
    fn local_variable_capture(&mut self) -> Result<(), RenameError> {
        self.session.cancellation.check()?;
        if self.target().kind != SymbolKind::Method {
            return Ok(());
        }
        let references = self.model.references_of(self.session.symbol);
        for reference in references {
            self.session.cancellation.check()?;
            let Some(token) = self
                .model
                .parse()
                .token_at_offset(reference.start)
                .right_biased()
            else {
                continue;
            };
            let Some(name) = token.parent() else { continue };
            if name.kind() != SyntaxKind::IdentifierName {
                continue;
            }
            let is_bare_callee = name
                .parent()
                .is_some_and(|p| p.kind() == SyntaxKind::InvocationExpression)
                && name.prev_sibling().is_none();
            if !is_bare_callee {
                continue;
            }
            if self.local_named_in_scope(&name, &self.replacement) {
                if let Some(invocation) = name.parent() {
                    self.conflicts.insert(invocation.text_range().into());
                }
            }
        }
        Ok(())
    }

    fn local_named_in_scope(&self, site: &SyntaxNode, name: &str) -> bool {
        let Some(member) = self.enclosing_member_symbol(site) else {
            return false;
        };
        let site_start = u32::from(site.text_range().start());
        self.model.symbol_ids().any(|id| {
            let data = self.model.symbol(id);
            data.is_local_like()
                && data.container == Some(member)
                && data.name == name
                && data
                    .declarations
                    .first()
                    .is_some_and(|decl| decl.start < site_start)
        })
    }

    fn enclosing_member_symbol(&self, site: &SyntaxNode) -> Option<SymbolId> {
        let member = site.ancestors().find(|node| {
            matches!(
                node.kind(),
                SyntaxKind::MethodDeclaration
                    | SyntaxKind::ConstructorDeclaration
                    | SyntaxKind::DestructorDeclaration
                    | SyntaxKind::PropertyDeclaration
            )
        })?;
        // Resolve through the member's name token.
        let name_token = member
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind().is_identifier_like())?;
        self.model
            .declaration_at(u32::from(name_token.text_range().start()))
    }
}

/// Some call-site arity satisfies both signatures: the shared type prefix
/// reaches at least as far as the larger required-parameter count.
fn signatures_collide(a: &SymbolData, b: &SymbolData) -> bool {
    let shared = a
        .param_types
        .iter()
        .zip(&b.param_types)
        .take_while(|(x, y)| x == y)
        .count();
    shared >= a.required_params.max(b.required_params)
}
