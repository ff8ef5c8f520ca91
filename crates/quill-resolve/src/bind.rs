//! Reference pass: binds identifier tokens to symbols by lexical lookup.
//!
//! Tokens are bound in document order, so a qualifier is always resolved
//! before the member name it qualifies.

use quill_syntax::ast::{self, AstNode};
use quill_syntax::ident::value_text;
use quill_syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

use crate::symbols::{SymbolId, SymbolKind};
use crate::SemanticModel;

fn start_of(token: &SyntaxToken) -> u32 {
    u32::from(token.text_range().start())
}

impl SemanticModel {
    pub(crate) fn bind_all(&mut self) {
        let root = self.syntax();
        let tokens: Vec<SyntaxToken> = root
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind().is_identifier_like())
            .collect();
        for token in tokens {
            let start = start_of(&token);
            if self.decls.contains_key(&start) {
                continue;
            }
            let Some(parent) = token.parent() else {
                continue;
            };
            if parent.kind() != SyntaxKind::IdentifierName {
                continue;
            }
            if let Some(id) = self.resolve_identifier(&token, &parent) {
                self.refs.insert(start, id);
                self.references
                    .entry(id)
                    .or_default()
                    .push(token.text_range().into());
            }
        }
    }

    fn resolve_identifier(&self, token: &SyntaxToken, ident: &SyntaxNode) -> Option<SymbolId> {
        let name = value_text(token.text());
        let parent = ident.parent()?;
        let is_first = parent.first_child().as_ref() == Some(ident);
        match parent.kind() {
            SyntaxKind::QualifiedName | SyntaxKind::MemberAccessExpression if !is_first => {
                let qualifier = parent.first_child()?;
                let target = self.resolve_qualifier(&qualifier)?;
                self.find_member_including_bases(target, &name, false)
            }
            SyntaxKind::GotoStatement => self.lookup_label(token, &name),
            SyntaxKind::Attribute => self
                .lookup_simple(token, &name)
                .or_else(|| self.lookup_simple(token, &format!("{name}Attribute"))),
            _ => self.lookup_simple(token, &name),
        }
    }

    /// Resolve the left side of a dot: a namespace, a type (static access),
    /// an alias, or an expression whose type carries the member.
    pub fn resolve_qualifier(&self, node: &SyntaxNode) -> Option<SymbolId> {
        match node.kind() {
            SyntaxKind::IdentifierName | SyntaxKind::QualifiedName => {
                let token = rightmost_ident(node)?;
                let id = self.resolved_at(start_of(&token))?;
                match self.symbol(id).kind {
                    SymbolKind::Alias => {
                        let target = self.symbol(id).alias_target.clone()?;
                        self.resolve_path(&target)
                    }
                    SymbolKind::Namespace | SymbolKind::Type => Some(id),
                    _ => self.type_symbol_of(id),
                }
            }
            SyntaxKind::LiteralExpression => match node.first_token()?.kind() {
                SyntaxKind::ThisKw => self.enclosing_type_symbol(node),
                SyntaxKind::BaseKw => {
                    let here = self.enclosing_type_symbol(node)?;
                    self.base_types_of(here).into_iter().next()
                }
                _ => None,
            },
            _ => self.type_of_expression(node),
        }
    }

    /// Member lookup through a namespace or through a type and its base
    /// chain. Type parameters are not members.
    pub fn find_member_including_bases(
        &self,
        container: SymbolId,
        name: &str,
        ignore_case: bool,
    ) -> Option<SymbolId> {
        let eq = |a: &str, b: &str| {
            if ignore_case {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        };
        let mut queue = vec![container];
        let mut seen = vec![];
        while let Some(current) = queue.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            for &member in &self.symbol(current).members {
                let sym = self.symbol(member);
                if sym.kind != SymbolKind::TypeParameter && eq(&sym.name, name) {
                    return Some(member);
                }
            }
            if self.symbol(current).kind == SymbolKind::Type {
                queue.extend(self.base_types_of(current));
            }
        }
        None
    }

    pub fn base_types_of(&self, type_id: SymbolId) -> Vec<SymbolId> {
        self.symbol(type_id)
            .base_types
            .iter()
            .filter_map(|t| self.resolve_type_name(t))
            .filter(|b| *b != type_id)
            .collect()
    }

    /// Resolve a textual type path. The last segment must name a type; the
    /// leading segments, when present, disambiguate by container names.
    pub fn resolve_type_name(&self, path: &str) -> Option<SymbolId> {
        let segments: Vec<&str> = path.split('.').collect();
        let last = *segments.last()?;
        let mut candidates = self
            .symbol_ids()
            .filter(|id| self.symbol(*id).is_type() && self.symbol(*id).name == last);
        let first = candidates.next()?;
        if segments.len() == 1 {
            return Some(first);
        }
        std::iter::once(first)
            .chain(candidates)
            .find(|id| {
                let fp = self.fingerprint(*id);
                fp.path.len() >= segments.len()
                    && fp.path[fp.path.len() - segments.len()..] == segments[..]
            })
            .or(Some(first))
    }

    /// Resolve a dotted path from the file's top level: namespaces first,
    /// falling back to bare type-name lookup.
    pub fn resolve_path(&self, path: &str) -> Option<SymbolId> {
        let mut current: Option<SymbolId> = None;
        'segments: for segment in path.split('.') {
            let candidates: Vec<SymbolId> = match current {
                Some(c) => self.symbol(c).members.clone(),
                None => self
                    .symbol_ids()
                    .filter(|id| self.symbol(*id).container.is_none())
                    .collect(),
            };
            for id in candidates {
                let sym = self.symbol(id);
                if matches!(sym.kind, SymbolKind::Namespace | SymbolKind::Type)
                    && sym.name == segment
                {
                    current = Some(id);
                    continue 'segments;
                }
            }
            return self.resolve_type_name(path);
        }
        current
    }

    // --- Lexical lookup ---

    fn lookup_simple(&self, token: &SyntaxToken, name: &str) -> Option<SymbolId> {
        let position = start_of(token);
        for ancestor in token.parent_ancestors() {
            match ancestor.kind() {
                SyntaxKind::LambdaExpression => {
                    let lambda = ast::LambdaExpression::cast(ancestor.clone())?;
                    for param in lambda.parameters() {
                        if let Some(t) = param.name_token() {
                            if value_text(t.text()) == name {
                                return self.declaration_at(start_of(&t));
                            }
                        }
                    }
                }
                SyntaxKind::ForEachStatement => {
                    let stmt = ast::ForEachStatement::cast(ancestor.clone())?;
                    if let Some(t) = stmt.variable_token() {
                        let in_body = ancestor
                            .children()
                            .filter(|n| n.kind().is_statement())
                            .last()
                            .is_some_and(|body| {
                                quill_core::TextRange::from(body.text_range()).contains(position)
                            });
                        if in_body && value_text(t.text()) == name {
                            return self.declaration_at(start_of(&t));
                        }
                    }
                }
                SyntaxKind::Block => {
                    for stmt in ancestor
                        .children()
                        .filter_map(ast::LocalDeclarationStatement::cast)
                    {
                        for declarator in stmt.declarators() {
                            if let Some(t) = declarator.name_token() {
                                if start_of(&t) < position && value_text(t.text()) == name {
                                    return self.declaration_at(start_of(&t));
                                }
                            }
                        }
                    }
                }
                SyntaxKind::MethodDeclaration
                | SyntaxKind::ConstructorDeclaration
                | SyntaxKind::DestructorDeclaration => {
                    if let Some(list) = ancestor
                        .children()
                        .find(|n| n.kind() == SyntaxKind::ParameterList)
                    {
                        for param in ast::support::children::<ast::Parameter>(&list) {
                            if let Some(t) = param.name_token() {
                                if value_text(t.text()) == name {
                                    return self.declaration_at(start_of(&t));
                                }
                            }
                        }
                    }
                }
                kind if kind.is_type_declaration() => {
                    if let Some(type_id) = self.type_declaration_symbol(&ancestor) {
                        for &tp in &self.symbol(type_id).params {
                            if self.symbol(tp).kind == SymbolKind::TypeParameter
                                && self.symbol(tp).name == name
                            {
                                return Some(tp);
                            }
                        }
                        if let Some(m) = self.find_member_including_bases(type_id, name, false) {
                            return Some(m);
                        }
                        if self.symbol(type_id).name == name {
                            return Some(type_id);
                        }
                    }
                }
                SyntaxKind::NamespaceDeclaration => {
                    if let Some(ns) = self.namespace_symbol(&ancestor) {
                        // The namespace chain itself is in scope.
                        let mut cursor = Some(ns);
                        while let Some(c) = cursor {
                            if self.symbol(c).name == name {
                                return Some(c);
                            }
                            cursor = self.symbol(c).container;
                        }
                        for &member in &self.symbol(ns).members {
                            if self.symbol(member).name == name {
                                return Some(member);
                            }
                        }
                    }
                    if let Some(alias) = self.alias_in(&ancestor, name) {
                        return Some(alias);
                    }
                }
                SyntaxKind::CompilationUnit => {
                    for id in self.symbol_ids() {
                        let sym = self.symbol(id);
                        if sym.container.is_none()
                            && matches!(sym.kind, SymbolKind::Namespace | SymbolKind::Type)
                            && sym.name == name
                        {
                            return Some(id);
                        }
                    }
                    if let Some(alias) = self.alias_in(&ancestor, name) {
                        return Some(alias);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Alias declared by a `using` directive directly inside `scope`.
    fn alias_in(&self, scope: &SyntaxNode, name: &str) -> Option<SymbolId> {
        for directive in scope.children().filter_map(ast::UsingDirective::cast) {
            if let Some(t) = directive.alias().and_then(|a| a.name_token()) {
                if value_text(t.text()) == name {
                    return self.declaration_at(start_of(&t));
                }
            }
        }
        None
    }

    fn lookup_label(&self, token: &SyntaxToken, name: &str) -> Option<SymbolId> {
        let body = token.parent_ancestors().find(|n| {
            matches!(
                n.kind(),
                SyntaxKind::MethodDeclaration
                    | SyntaxKind::ConstructorDeclaration
                    | SyntaxKind::DestructorDeclaration
                    | SyntaxKind::PropertyDeclaration
            )
        })?;
        for labeled in body
            .descendants()
            .filter_map(ast::LabeledStatement::cast)
        {
            if let Some(t) = labeled.label_token() {
                if value_text(t.text()) == name {
                    return self.declaration_at(start_of(&t));
                }
            }
        }
        None
    }

    // --- Expression typing ---

    /// Minimal type inference: enough to answer protocol questions about
    /// foreach collections, await operands, and deconstruction sources.
    pub fn type_of_expression(&self, expr: &SyntaxNode) -> Option<SymbolId> {
        match expr.kind() {
            SyntaxKind::IdentifierName | SyntaxKind::QualifiedName => {
                let token = rightmost_ident(expr)?;
                let id = self.resolved_at(start_of(&token))?;
                self.type_symbol_of(id)
            }
            SyntaxKind::MemberAccessExpression => {
                let member = ast::MemberAccessExpression::cast(expr.clone())?
                    .member_name()?
                    .token()?;
                let id = self.resolved_at(start_of(&member))?;
                self.type_symbol_of(id)
            }
            SyntaxKind::InvocationExpression => {
                let name = ast::InvocationExpression::cast(expr.clone())?.invoked_name()?;
                let id = self.resolved_at(start_of(&name))?;
                self.type_symbol_of(id)
            }
            SyntaxKind::ObjectCreationExpression => {
                let type_node = ast::ObjectCreationExpression::cast(expr.clone())?.type_node()?;
                self.resolve_qualifier(&type_node)
            }
            SyntaxKind::ParenthesizedExpression => {
                self.type_of_expression(&expr.first_child()?)
            }
            SyntaxKind::LiteralExpression => match expr.first_token()?.kind() {
                SyntaxKind::ThisKw => self.enclosing_type_symbol(expr),
                SyntaxKind::BaseKw => {
                    let here = self.enclosing_type_symbol(expr)?;
                    self.base_types_of(here).into_iter().next()
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// The type a symbol's value has: a type symbol resolves to itself, a
    /// typed declaration through its declared type text, `var` through its
    /// initializer.
    pub fn type_symbol_of(&self, id: SymbolId) -> Option<SymbolId> {
        let sym = self.symbol(id);
        match sym.kind {
            SymbolKind::Type => Some(id),
            SymbolKind::EnumMember => sym.container,
            SymbolKind::Alias => {
                let target = sym.alias_target.clone()?;
                self.resolve_path(&target)
            }
            SymbolKind::Field
            | SymbolKind::Property
            | SymbolKind::Parameter
            | SymbolKind::Local
            | SymbolKind::Method => {
                let declared = sym.declared_type.as_deref()?;
                if declared == "var" {
                    self.infer_var_type(id)
                } else {
                    self.resolve_type_name(declared)
                }
            }
            _ => None,
        }
    }

    fn infer_var_type(&self, id: SymbolId) -> Option<SymbolId> {
        let decl = *self.symbol(id).declarations.first()?;
        let token = self.token_starting_at(decl.start)?;
        let declarator = token
            .parent_ancestors()
            .find_map(ast::VariableDeclarator::cast)?;
        let initializer = declarator.initializer()?;
        self.type_of_expression(&initializer)
    }

    pub fn enclosing_type_symbol(&self, node: &SyntaxNode) -> Option<SymbolId> {
        let decl = node
            .ancestors()
            .find(|n| n.kind().is_type_declaration())?;
        self.type_declaration_symbol(&decl)
    }

    /// The symbol a type-declaration node declares.
    pub fn type_declaration_symbol(&self, node: &SyntaxNode) -> Option<SymbolId> {
        let token = ast::TypeDeclaration::cast(node.clone())?.name_token()?;
        self.declaration_at(start_of(&token))
    }

    fn namespace_symbol(&self, node: &SyntaxNode) -> Option<SymbolId> {
        let name = ast::NamespaceDeclaration::cast(node.clone())?.name()?;
        let token = rightmost_ident(&name)?;
        self.declaration_at(start_of(&token))
    }
}

fn rightmost_ident(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind().is_identifier_like())
        .last()
}
