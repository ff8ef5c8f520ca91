//! Declaration pass: walks a parsed tree and builds the symbol table plus a
//! map from name-token start offsets to symbol ids.

use std::collections::HashMap;

use quill_core::TextRange;
use quill_syntax::ast::{self, AstNode};
use quill_syntax::ident::value_text;
use quill_syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

use crate::symbols::{SymbolData, SymbolId, SymbolKind, TypeFlavor};

pub(crate) struct Collected {
    pub symbols: Vec<SymbolData>,
    pub decls: HashMap<u32, SymbolId>,
}

pub(crate) fn collect(root: &SyntaxNode) -> Collected {
    let mut collector = Collector {
        symbols: Vec::new(),
        decls: HashMap::new(),
    };
    collector.compilation_unit(root);
    Collected {
        symbols: collector.symbols,
        decls: collector.decls,
    }
}

struct Collector {
    symbols: Vec<SymbolData>,
    decls: HashMap<u32, SymbolId>,
}

fn token_range(token: &SyntaxToken) -> TextRange {
    token.text_range().into()
}

/// Textual form of a type or name node, trivia stripped.
pub(crate) fn node_text(node: &SyntaxNode) -> String {
    let mut out = String::new();
    for e in node.descendants_with_tokens() {
        if let Some(t) = e.into_token() {
            if !t.kind().is_trivia() {
                out.push_str(t.text());
            }
        }
    }
    out
}

impl Collector {
    fn alloc(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(data);
        id
    }

    fn declare(&mut self, id: SymbolId, token: &SyntaxToken) {
        let range = token_range(token);
        self.decls.insert(range.start, id);
        self.symbols[id.0 as usize].declarations.push(range);
    }

    fn add_member(&mut self, container: Option<SymbolId>, member: SymbolId) {
        if let Some(c) = container {
            self.symbols[c.0 as usize].members.push(member);
        }
    }

    fn find_member(
        &self,
        container: Option<SymbolId>,
        kind: SymbolKind,
        name: &str,
    ) -> Option<SymbolId> {
        let candidates: Box<dyn Iterator<Item = SymbolId>> = match container {
            Some(c) => Box::new(self.symbols[c.0 as usize].members.iter().copied()),
            None => Box::new(
                (0..self.symbols.len() as u32)
                    .map(SymbolId)
                    .filter(|id| self.symbols[id.0 as usize].container.is_none()),
            ),
        };
        let mut candidates = candidates;
        candidates.find(|id| {
            let s = &self.symbols[id.0 as usize];
            s.kind == kind && s.name == name
        })
    }

    // --- Top level ---

    fn compilation_unit(&mut self, root: &SyntaxNode) {
        for child in root.children() {
            self.top_level_item(&child, None);
        }
    }

    fn top_level_item(&mut self, node: &SyntaxNode, container: Option<SymbolId>) {
        match node.kind() {
            SyntaxKind::UsingDirective => self.using_directive(node, container),
            SyntaxKind::NamespaceDeclaration => self.namespace(node, container),
            kind if kind.is_type_declaration() => {
                self.type_declaration(node, container);
            }
            _ => {}
        }
    }

    fn using_directive(&mut self, node: &SyntaxNode, container: Option<SymbolId>) {
        let directive = match ast::UsingDirective::cast(node.clone()) {
            Some(d) => d,
            None => return,
        };
        let Some(alias) = directive.alias() else {
            return;
        };
        let Some(token) = alias.name_token() else {
            return;
        };
        let mut data = SymbolData::new(SymbolKind::Alias, value_text(token.text()));
        data.container = container;
        data.alias_target = directive.name().map(|n| node_text(&n));
        let id = self.alloc(data);
        self.declare(id, &token);
    }

    fn namespace(&mut self, node: &SyntaxNode, container: Option<SymbolId>) {
        // `namespace A.B { .. }` introduces (or reopens) A, then B under A.
        let Some(name) = ast::NamespaceDeclaration::cast(node.clone()).and_then(|n| n.name())
        else {
            return;
        };
        let mut current = container;
        for token in name
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind().is_identifier_like())
        {
            let text = value_text(token.text());
            let id = match self.find_member(current, SymbolKind::Namespace, &text) {
                Some(existing) => existing,
                None => {
                    let mut data = SymbolData::new(SymbolKind::Namespace, text);
                    data.container = current;
                    let id = self.alloc(data);
                    self.add_member(current, id);
                    id
                }
            };
            self.declare(id, &token);
            current = Some(id);
        }
        for child in node.children() {
            self.top_level_item(&child, current);
        }
    }

    // --- Types ---

    fn type_declaration(&mut self, node: &SyntaxNode, container: Option<SymbolId>) -> Option<SymbolId> {
        let decl = ast::TypeDeclaration::cast(node.clone())?;
        let token = decl.name_token()?;
        let text = value_text(token.text());
        let flavor = match node.kind() {
            SyntaxKind::ClassDeclaration => TypeFlavor::Class,
            SyntaxKind::StructDeclaration => TypeFlavor::Struct,
            SyntaxKind::InterfaceDeclaration => TypeFlavor::Interface,
            _ => TypeFlavor::Enum,
        };
        let is_partial = decl.is_partial();

        // Partial declarations reopen the same symbol.
        let id = match self.find_member(container, SymbolKind::Type, &text) {
            Some(existing) if is_partial || self.symbols[existing.0 as usize].is_partial => {
                existing
            }
            _ => {
                let mut data = SymbolData::new(SymbolKind::Type, text);
                data.container = container;
                data.flavor = Some(flavor);
                let id = self.alloc(data);
                self.add_member(container, id);
                id
            }
        };
        self.symbols[id.0 as usize].is_partial |= is_partial;
        self.declare(id, &token);

        if let Some(list) = decl.type_parameter_list() {
            for tp in ast::support::children::<ast::TypeParameter>(list.syntax()) {
                if let Some(tp_token) = tp.name_token() {
                    let mut data =
                        SymbolData::new(SymbolKind::TypeParameter, value_text(tp_token.text()));
                    data.container = Some(id);
                    let tp_id = self.alloc(data);
                    self.declare(tp_id, &tp_token);
                    // Type symbols keep their type parameters in `params`.
                    self.symbols[id.0 as usize].params.push(tp_id);
                }
            }
        }

        for base in node
            .children()
            .filter(|n| n.kind() == SyntaxKind::BaseList)
            .flat_map(|l| l.children().collect::<Vec<_>>())
        {
            self.symbols[id.0 as usize].base_types.push(node_text(&base));
        }

        for member in node.children() {
            self.member(&member, id);
        }
        Some(id)
    }

    fn member(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        match node.kind() {
            SyntaxKind::FieldDeclaration => self.field(node, type_id),
            SyntaxKind::MethodDeclaration => self.method(node, type_id),
            SyntaxKind::ConstructorDeclaration => self.constructor(node, type_id),
            SyntaxKind::DestructorDeclaration => self.destructor(node, type_id),
            SyntaxKind::PropertyDeclaration => self.property(node, type_id),
            SyntaxKind::EnumMember => self.enum_member(node, type_id),
            kind if kind.is_type_declaration() => {
                self.type_declaration(node, Some(type_id));
            }
            _ => {}
        }
    }

    fn field(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        let Some(field) = ast::FieldDeclaration::cast(node.clone()) else {
            return;
        };
        let is_static = has_modifier(node, SyntaxKind::StaticKw);
        let declared_type = field_type_text(node);
        for declarator in field.declarators() {
            let Some(token) = declarator.name_token() else {
                continue;
            };
            let mut data = SymbolData::new(SymbolKind::Field, value_text(token.text()));
            data.container = Some(type_id);
            data.is_static = is_static;
            data.declared_type = declared_type.clone();
            let id = self.alloc(data);
            self.add_member(Some(type_id), id);
            self.declare(id, &token);
        }
    }

    fn method(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        let Some(method) = ast::MethodDeclaration::cast(node.clone()) else {
            return;
        };
        let Some(token) = method.name_token() else {
            return;
        };
        let text = value_text(token.text());
        let is_partial = has_modifier(node, SyntaxKind::PartialKw);
        let param_types = parameter_type_texts(node);

        let existing = self.symbols_in(type_id).find(|&id| {
            let s = &self.symbols[id.0 as usize];
            s.kind == SymbolKind::Method
                && s.name == text
                && s.param_types == param_types
                && (s.is_partial || is_partial)
        });
        let id = match existing {
            Some(existing) => existing,
            None => {
                let mut data = SymbolData::new(SymbolKind::Method, text);
                data.container = Some(type_id);
                data.is_static = has_modifier(node, SyntaxKind::StaticKw);
                data.param_types = param_types;
                data.required_params = required_parameter_count(node);
                data.declared_type = return_type_text(node);
                let id = self.alloc(data);
                self.add_member(Some(type_id), id);
                id
            }
        };
        self.symbols[id.0 as usize].is_partial |= is_partial;
        self.declare(id, &token);

        if let Some(list) = method.parameter_list() {
            self.parameters(list.syntax(), id);
        }
        self.function_body(node, id);
    }

    fn constructor(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        let Some(ctor) = ast::ConstructorDeclaration::cast(node.clone()) else {
            return;
        };
        let Some(token) = ctor.name_token() else {
            return;
        };
        let mut data = SymbolData::new(SymbolKind::Method, value_text(token.text()));
        data.container = Some(type_id);
        data.is_constructor = true;
        data.param_types = parameter_type_texts(node);
        data.required_params = required_parameter_count(node);
        let id = self.alloc(data);
        self.add_member(Some(type_id), id);
        self.declare(id, &token);
        // Renaming the type also renames its constructors.
        let range = token_range(&token);
        self.symbols[type_id.0 as usize].declarations.push(range);

        if let Some(list) = ctor.parameter_list() {
            self.parameters(list.syntax(), id);
        }
        self.function_body(node, id);
    }

    fn destructor(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        let Some(dtor) = ast::DestructorDeclaration::cast(node.clone()) else {
            return;
        };
        let Some(token) = dtor.name_token() else {
            return;
        };
        let mut data = SymbolData::new(SymbolKind::Method, value_text(token.text()));
        data.container = Some(type_id);
        let id = self.alloc(data);
        self.add_member(Some(type_id), id);
        self.declare(id, &token);
        let range = token_range(&token);
        self.symbols[type_id.0 as usize].declarations.push(range);
        self.function_body(node, id);
    }

    fn property(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        let Some(prop) = ast::PropertyDeclaration::cast(node.clone()) else {
            return;
        };
        let Some(token) = prop.name_token() else {
            return;
        };
        let mut data = SymbolData::new(SymbolKind::Property, value_text(token.text()));
        data.container = Some(type_id);
        data.is_static = has_modifier(node, SyntaxKind::StaticKw);
        data.declared_type = field_type_text(node);
        let id = self.alloc(data);
        self.add_member(Some(type_id), id);
        self.declare(id, &token);
        self.function_body(node, id);
    }

    fn enum_member(&mut self, node: &SyntaxNode, type_id: SymbolId) {
        let Some(member) = ast::EnumMember::cast(node.clone()) else {
            return;
        };
        let Some(token) = member.name_token() else {
            return;
        };
        let mut data = SymbolData::new(SymbolKind::EnumMember, value_text(token.text()));
        data.container = Some(type_id);
        let id = self.alloc(data);
        self.add_member(Some(type_id), id);
        self.declare(id, &token);
    }

    // --- Function-local declarations ---

    fn parameters(&mut self, list: &SyntaxNode, owner: SymbolId) {
        for param in ast::support::children::<ast::Parameter>(list) {
            let Some(token) = param.name_token() else {
                continue;
            };
            let mut data = SymbolData::new(SymbolKind::Parameter, value_text(token.text()));
            data.container = Some(owner);
            data.declared_type = param
                .syntax()
                .children()
                .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
                .map(|n| node_text(&n));
            let id = self.alloc(data);
            self.declare(id, &token);
            self.symbols[owner.0 as usize].params.push(id);
        }
    }

    fn function_body(&mut self, decl: &SyntaxNode, owner: SymbolId) {
        for node in decl.descendants().skip(1) {
            match node.kind() {
                SyntaxKind::LocalDeclarationStatement => {
                    let Some(stmt) = ast::LocalDeclarationStatement::cast(node.clone()) else {
                        continue;
                    };
                    let declared_type = stmt.type_node().map(|n| node_text(&n));
                    for declarator in stmt.declarators() {
                        let Some(token) = declarator.name_token() else {
                            continue;
                        };
                        let mut data =
                            SymbolData::new(SymbolKind::Local, value_text(token.text()));
                        data.container = Some(owner);
                        data.declared_type = declared_type.clone();
                        let id = self.alloc(data);
                        self.declare(id, &token);
                    }
                }
                SyntaxKind::ForEachStatement => {
                    let Some(stmt) = ast::ForEachStatement::cast(node.clone()) else {
                        continue;
                    };
                    let Some(token) = stmt.variable_token() else {
                        continue;
                    };
                    let mut data = SymbolData::new(SymbolKind::Local, value_text(token.text()));
                    data.container = Some(owner);
                    data.declared_type = node
                        .children()
                        .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
                        .map(|n| node_text(&n));
                    let id = self.alloc(data);
                    self.declare(id, &token);
                }
                SyntaxKind::LambdaExpression => {
                    let Some(lambda) = ast::LambdaExpression::cast(node.clone()) else {
                        continue;
                    };
                    for param in lambda.parameters() {
                        let Some(token) = param.name_token() else {
                            continue;
                        };
                        if self.decls.contains_key(&u32::from(token.text_range().start())) {
                            continue;
                        }
                        let mut data =
                            SymbolData::new(SymbolKind::Parameter, value_text(token.text()));
                        data.container = Some(owner);
                        let id = self.alloc(data);
                        self.declare(id, &token);
                    }
                }
                SyntaxKind::LabeledStatement => {
                    let Some(stmt) = ast::LabeledStatement::cast(node.clone()) else {
                        continue;
                    };
                    let Some(token) = stmt.label_token() else {
                        continue;
                    };
                    let mut data = SymbolData::new(SymbolKind::Label, value_text(token.text()));
                    data.container = Some(owner);
                    let id = self.alloc(data);
                    self.declare(id, &token);
                }
                _ => {}
            }
        }
    }

    fn symbols_in(&self, container: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols[container.0 as usize].members.iter().copied()
    }
}

fn has_modifier(node: &SyntaxNode, kind: SyntaxKind) -> bool {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .any(|t| t.kind() == kind)
}

/// Declared type of a field or property: the first type-shaped child node.
fn field_type_text(node: &SyntaxNode) -> Option<String> {
    node.children()
        .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
        .map(|n| node_text(&n))
}

fn return_type_text(node: &SyntaxNode) -> Option<String> {
    node.children()
        .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
        .map(|n| node_text(&n))
        .or_else(|| {
            node.children_with_tokens()
                .filter_map(|e| e.into_token())
                .find(|t| t.kind() == SyntaxKind::VoidKw || t.kind().is_predefined_type_keyword())
                .map(|t| t.text().to_string())
        })
}

fn parameter_type_texts(node: &SyntaxNode) -> Vec<String> {
    let Some(list) = node
        .children()
        .find(|n| n.kind() == SyntaxKind::ParameterList)
    else {
        return Vec::new();
    };
    ast::support::children::<ast::Parameter>(&list)
        .map(|p| {
            p.syntax()
                .children()
                .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
                .map(|n| node_text(&n))
                .unwrap_or_else(|| {
                    p.syntax()
                        .children_with_tokens()
                        .filter_map(|e| e.into_token())
                        .find(|t| t.kind().is_predefined_type_keyword())
                        .map(|t| t.text().to_string())
                        .unwrap_or_default()
                })
        })
        .collect()
}

/// Parameters before the first one with a default value. Defaults are
/// trailing, so this is the minimum call-site arity.
fn required_parameter_count(node: &SyntaxNode) -> usize {
    let Some(list) = node
        .children()
        .find(|n| n.kind() == SyntaxKind::ParameterList)
    else {
        return 0;
    };
    ast::support::children::<ast::Parameter>(&list)
        .take_while(|p| {
            !p.syntax()
                .children_with_tokens()
                .filter_map(|e| e.into_token())
                .any(|t| t.kind() == SyntaxKind::Eq)
        })
        .count()
}
