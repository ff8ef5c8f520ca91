use std::collections::VecDeque;

use rowan::{GreenNode, GreenNodeBuilder};
use text_size::TextSize;

use crate::lexer::{lex, Token};
use crate::syntax_kind::{CSharpLanguage, SyntaxKind};
use crate::{ParseError, TextRange};

pub type SyntaxNode = rowan::SyntaxNode<CSharpLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<CSharpLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<CSharpLanguage>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub green: GreenNode,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn token_at_offset(&self, offset: u32) -> rowan::TokenAtOffset<SyntaxToken> {
        self.syntax().token_at_offset(TextSize::from(offset))
    }

    pub fn covering_element(&self, range: TextRange) -> SyntaxElement {
        self.syntax().covering_element(range.into())
    }
}

/// Parse a full compilation unit.
pub fn parse(input: &str) -> ParseResult {
    Parser::new(input).parse()
}

struct Parser<'a> {
    input: &'a str,
    tokens: VecDeque<Token>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: VecDeque::from(lex(input)),
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        self.builder.start_node(SyntaxKind::CompilationUnit.into());

        while self.at(SyntaxKind::UsingKw) {
            self.parse_using_directive();
        }

        while !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::NamespaceKw) {
                self.parse_namespace_declaration();
            } else if self.at_type_declaration_start() {
                self.parse_type_declaration();
            } else {
                self.recover_here("expected namespace or type declaration");
            }
        }

        self.eat_trivia();
        self.builder.finish_node();

        if !self.errors.is_empty() {
            tracing::debug!(count = self.errors.len(), "parse finished with errors");
        }

        ParseResult {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // --- Top level ---

    fn parse_using_directive(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::UsingDirective.into());
        self.expect(SyntaxKind::UsingKw, "expected `using`");

        // `using Alias = Some.Name;`
        if self.at_ident_like() && self.nth(1) == Some(SyntaxKind::Eq) {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::UsingAlias.into());
            self.bump(); // alias identifier
            self.expect(SyntaxKind::Eq, "expected `=` in using alias");
            self.builder.finish_node();
        }

        self.parse_name();
        self.expect(SyntaxKind::Semicolon, "expected `;` after using directive");
        self.builder.finish_node();
    }

    fn parse_namespace_declaration(&mut self) {
        self.eat_trivia();
        self.builder
            .start_node(SyntaxKind::NamespaceDeclaration.into());
        self.expect(SyntaxKind::NamespaceKw, "expected `namespace`");
        self.parse_name();
        self.expect(SyntaxKind::LBrace, "expected `{` after namespace name");

        while self.at(SyntaxKind::UsingKw) {
            self.parse_using_directive();
        }
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::NamespaceKw) {
                self.parse_namespace_declaration();
            } else if self.at_type_declaration_start() {
                self.parse_type_declaration();
            } else {
                self.recover_here("expected type declaration in namespace");
            }
        }

        self.expect(SyntaxKind::RBrace, "expected `}` to close namespace");
        self.builder.finish_node();
    }

    fn at_type_declaration_start(&mut self) -> bool {
        let mut idx = 0;
        loop {
            match self.nth(idx) {
                Some(SyntaxKind::LBracket) => {
                    // Attribute list; skip to the matching `]`.
                    let mut depth = 0usize;
                    loop {
                        match self.nth(idx) {
                            Some(SyntaxKind::LBracket) => depth += 1,
                            Some(SyntaxKind::RBracket) => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            Some(SyntaxKind::Eof) | None => return false,
                            _ => {}
                        }
                        idx += 1;
                    }
                    idx += 1;
                }
                Some(kind) if is_modifier(kind) => idx += 1,
                Some(
                    SyntaxKind::ClassKw
                    | SyntaxKind::StructKw
                    | SyntaxKind::InterfaceKw
                    | SyntaxKind::EnumKw,
                ) => return true,
                _ => return false,
            }
        }
    }

    fn parse_type_declaration(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        while self.at(SyntaxKind::LBracket) {
            self.parse_attribute_list();
        }
        self.parse_modifiers();

        let kind = match self.current() {
            SyntaxKind::ClassKw => SyntaxKind::ClassDeclaration,
            SyntaxKind::StructKw => SyntaxKind::StructDeclaration,
            SyntaxKind::InterfaceKw => SyntaxKind::InterfaceDeclaration,
            SyntaxKind::EnumKw => SyntaxKind::EnumDeclaration,
            _ => {
                self.recover_here("expected type declaration keyword");
                return;
            }
        };
        self.builder.start_node_at(checkpoint, kind.into());
        self.bump(); // the keyword
        self.expect_ident_like("expected type name");

        if kind == SyntaxKind::EnumDeclaration {
            self.parse_enum_body();
        } else {
            if self.at(SyntaxKind::Less) {
                self.parse_type_parameter_list();
            }
            if self.at(SyntaxKind::Colon) {
                self.parse_base_list();
            }
            self.expect(SyntaxKind::LBrace, "expected `{` to open type body");
            while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
                self.parse_member();
            }
            self.expect(SyntaxKind::RBrace, "expected `}` to close type body");
        }
        self.builder.finish_node();
    }

    fn parse_enum_body(&mut self) {
        self.expect(SyntaxKind::LBrace, "expected `{` to open enum body");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::EnumMember.into());
            while self.at(SyntaxKind::LBracket) {
                self.parse_attribute_list();
            }
            self.expect_ident_like("expected enum member name");
            if self.at(SyntaxKind::Eq) {
                self.bump();
                self.parse_expression();
            }
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RBrace, "expected `}` to close enum body");
    }

    fn parse_type_parameter_list(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::TypeParameterList.into());
        self.expect(SyntaxKind::Less, "expected `<`");
        loop {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::TypeParameter.into());
            self.expect_ident_like("expected type parameter name");
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::Greater, "expected `>`");
        self.builder.finish_node();
    }

    fn parse_base_list(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::BaseList.into());
        self.expect(SyntaxKind::Colon, "expected `:`");
        loop {
            self.parse_type();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn parse_attribute_list(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::AttributeList.into());
        self.expect(SyntaxKind::LBracket, "expected `[`");
        loop {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::Attribute.into());
            self.parse_name();
            if self.at(SyntaxKind::LParen) {
                self.eat_trivia();
                self.builder
                    .start_node(SyntaxKind::AttributeArgumentList.into());
                self.bump(); // (
                while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
                    self.eat_trivia();
                    self.builder.start_node(SyntaxKind::AttributeArgument.into());
                    self.parse_expression();
                    self.builder.finish_node();
                    if self.at(SyntaxKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(SyntaxKind::RParen, "expected `)` to close attribute arguments");
                self.builder.finish_node();
            }
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RBracket, "expected `]` to close attribute list");
        self.builder.finish_node();
    }

    fn parse_modifiers(&mut self) {
        while is_modifier(self.current()) {
            self.bump();
        }
    }

    // --- Members ---

    fn parse_member(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        while self.at(SyntaxKind::LBracket) {
            self.parse_attribute_list();
        }
        self.parse_modifiers();

        if self.at(SyntaxKind::Tilde) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::DestructorDeclaration.into());
            self.bump(); // ~
            self.expect_ident_like("expected destructor name");
            self.parse_parameter_list();
            self.parse_block();
            self.builder.finish_node();
            return;
        }

        if self.at_type_declaration_start() {
            // Nested type; reparse from the checkpoint so attributes/modifiers
            // stay inside the declaration node.
            self.parse_type_declaration_at(checkpoint);
            return;
        }

        // Constructor: `Name (` with no preceding return type.
        if self.at_ident_like() && self.nth(1) == Some(SyntaxKind::LParen) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ConstructorDeclaration.into());
            self.bump(); // name
            self.parse_parameter_list();
            if self.at(SyntaxKind::Colon) {
                self.eat_trivia();
                self.builder
                    .start_node(SyntaxKind::ConstructorInitializer.into());
                self.bump(); // :
                if self.at(SyntaxKind::BaseKw) || self.at(SyntaxKind::ThisKw) {
                    self.bump();
                } else {
                    self.error_here("expected `base` or `this` in constructor initializer");
                }
                self.parse_argument_list();
                self.builder.finish_node();
            }
            self.parse_block();
            self.builder.finish_node();
            return;
        }

        // Everything else starts with a type. The type gets its own
        // checkpoint; `checkpoint` still marks the start of the whole member
        // so attributes and modifiers land inside the declaration node, not
        // inside the type.
        self.parse_type();

        if !self.at_ident_like() {
            self.error_here("expected member name");
            self.recover_to_member_boundary();
            return;
        }

        match self.nth(1) {
            Some(SyntaxKind::LParen) => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::MethodDeclaration.into());
                self.bump(); // name
                self.parse_parameter_list();
                if self.at(SyntaxKind::FatArrow) {
                    self.bump();
                    self.parse_expression();
                    self.expect(SyntaxKind::Semicolon, "expected `;` after expression body");
                } else if self.at(SyntaxKind::Semicolon) {
                    self.bump();
                } else {
                    self.parse_block();
                }
                self.builder.finish_node();
            }
            Some(SyntaxKind::LBrace) => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::PropertyDeclaration.into());
                self.bump(); // name
                self.parse_accessor_list();
                self.builder.finish_node();
            }
            _ => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::FieldDeclaration.into());
                loop {
                    self.eat_trivia();
                    self.builder.start_node(SyntaxKind::VariableDeclarator.into());
                    self.expect_ident_like("expected field name");
                    if self.at(SyntaxKind::Eq) {
                        self.bump();
                        self.parse_expression();
                    }
                    self.builder.finish_node();
                    if self.at(SyntaxKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after field declaration");
                self.builder.finish_node();
            }
        }
    }

    fn parse_type_declaration_at(&mut self, checkpoint: rowan::Checkpoint) {
        // Attributes/modifiers were already consumed above the checkpoint.
        let kind = match self.current() {
            SyntaxKind::ClassKw => SyntaxKind::ClassDeclaration,
            SyntaxKind::StructKw => SyntaxKind::StructDeclaration,
            SyntaxKind::InterfaceKw => SyntaxKind::InterfaceDeclaration,
            SyntaxKind::EnumKw => SyntaxKind::EnumDeclaration,
            _ => {
                self.recover_here("expected type declaration keyword");
                return;
            }
        };
        self.builder.start_node_at(checkpoint, kind.into());
        self.bump();
        self.expect_ident_like("expected type name");
        if kind == SyntaxKind::EnumDeclaration {
            self.parse_enum_body();
        } else {
            if self.at(SyntaxKind::Less) {
                self.parse_type_parameter_list();
            }
            if self.at(SyntaxKind::Colon) {
                self.parse_base_list();
            }
            self.expect(SyntaxKind::LBrace, "expected `{` to open type body");
            while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
                self.parse_member();
            }
            self.expect(SyntaxKind::RBrace, "expected `}` to close type body");
        }
        self.builder.finish_node();
    }

    fn parse_accessor_list(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::AccessorList.into());
        self.expect(SyntaxKind::LBrace, "expected `{` to open accessor list");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::AccessorDeclaration.into());
            self.parse_modifiers();
            if self.current().is_accessor_keyword() {
                self.bump();
            } else {
                self.error_here("expected `get`, `set`, or `init`");
                self.bump_any_non_trivia();
            }
            if self.at(SyntaxKind::Semicolon) {
                self.bump();
            } else if self.at(SyntaxKind::FatArrow) {
                self.bump();
                self.parse_expression();
                self.expect(SyntaxKind::Semicolon, "expected `;` after accessor body");
            } else if self.at(SyntaxKind::LBrace) {
                self.parse_block();
            }
            self.builder.finish_node();
        }
        self.expect(SyntaxKind::RBrace, "expected `}` to close accessor list");
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::ParameterList.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::Parameter.into());
            while self.at(SyntaxKind::LBracket) {
                self.parse_attribute_list();
            }
            self.parse_type();
            self.expect_ident_like("expected parameter name");
            if self.at(SyntaxKind::Eq) {
                self.bump();
                self.parse_expression();
            }
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "expected `)` to close parameter list");
        self.builder.finish_node();
    }

    // --- Types & names ---

    fn parse_type(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        self.parse_type_at(checkpoint);
    }

    fn parse_type_at(&mut self, checkpoint: rowan::Checkpoint) {
        if self.current().is_predefined_type_keyword() {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::PredefinedType.into());
            self.bump();
            self.builder.finish_node();
        } else {
            self.parse_name_at(checkpoint);
        }
    }

    /// `a` or `a.b.c` (left-associated `QualifiedName` nodes).
    fn parse_name(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        self.parse_name_at(checkpoint);
    }

    fn parse_name_at(&mut self, checkpoint: rowan::Checkpoint) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::IdentifierName.into());
        self.expect_ident_like("expected name");
        self.builder.finish_node();

        while self.at(SyntaxKind::Dot) && self.nth(1).is_some_and(|k| k.is_identifier_like()) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::QualifiedName.into());
            self.bump(); // .
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::IdentifierName.into());
            self.bump(); // identifier
            self.builder.finish_node();
            self.builder.finish_node();
        }
    }

    // --- Statements ---

    fn parse_block(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::Block.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.parse_statement();
        }
        self.expect(SyntaxKind::RBrace, "expected `}`");
        self.builder.finish_node();
    }

    fn parse_statement(&mut self) {
        self.eat_trivia();
        match self.current() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::Semicolon => {
                self.builder.start_node(SyntaxKind::EmptyStatement.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::ReturnKw => {
                self.builder.start_node(SyntaxKind::ReturnStatement.into());
                self.bump();
                if !self.at(SyntaxKind::Semicolon) {
                    self.parse_expression();
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after return");
                self.builder.finish_node();
            }
            SyntaxKind::IfKw => {
                self.builder.start_node(SyntaxKind::IfStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `if`");
                self.parse_expression();
                self.expect(SyntaxKind::RParen, "expected `)` after condition");
                self.parse_statement();
                if self.at(SyntaxKind::ElseKw) {
                    self.bump();
                    self.parse_statement();
                }
                self.builder.finish_node();
            }
            SyntaxKind::ForEachKw => {
                self.builder.start_node(SyntaxKind::ForEachStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `foreach`");
                self.parse_type();
                self.expect_ident_like("expected iteration variable name");
                self.expect(SyntaxKind::InKw, "expected `in`");
                self.parse_expression();
                self.expect(SyntaxKind::RParen, "expected `)` to close foreach header");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::WhileKw => {
                self.builder.start_node(SyntaxKind::WhileStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `while`");
                self.parse_expression();
                self.expect(SyntaxKind::RParen, "expected `)` after condition");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::GotoKw => {
                self.builder.start_node(SyntaxKind::GotoStatement.into());
                self.bump();
                self.eat_trivia();
                self.builder.start_node(SyntaxKind::IdentifierName.into());
                self.expect_ident_like("expected label name after `goto`");
                self.builder.finish_node();
                self.expect(SyntaxKind::Semicolon, "expected `;` after goto");
                self.builder.finish_node();
            }
            kind if kind.is_identifier_like() && self.nth(1) == Some(SyntaxKind::Colon) => {
                self.builder.start_node(SyntaxKind::LabeledStatement.into());
                self.bump(); // label name
                self.bump(); // :
                self.parse_statement();
                self.builder.finish_node();
            }
            _ if self.at_local_declaration() => self.parse_local_declaration(),
            SyntaxKind::Eof => {}
            _ => {
                self.builder.start_node(SyntaxKind::ExpressionStatement.into());
                self.parse_expression();
                self.expect(SyntaxKind::Semicolon, "expected `;` after expression");
                self.builder.finish_node();
            }
        }
    }

    /// Lookahead: `var x ...`, `int x ...`, or `A.B x` followed by `=`, `;`,
    /// or `,` reads as a local declaration.
    fn at_local_declaration(&mut self) -> bool {
        let first = self.current();
        if first == SyntaxKind::VarKw {
            return self.nth(1).is_some_and(|k| k.is_identifier_like());
        }
        if first.is_predefined_type_keyword() {
            return self.nth(1).is_some_and(|k| k.is_identifier_like());
        }
        if !first.is_identifier_like() {
            return false;
        }
        let mut idx = 1;
        while self.nth(idx) == Some(SyntaxKind::Dot)
            && self.nth(idx + 1).is_some_and(|k| k.is_identifier_like())
        {
            idx += 2;
        }
        if !self.nth(idx).is_some_and(|k| k.is_identifier_like()) {
            return false;
        }
        matches!(
            self.nth(idx + 1),
            Some(SyntaxKind::Eq | SyntaxKind::Semicolon | SyntaxKind::Comma)
        )
    }

    fn parse_local_declaration(&mut self) {
        self.eat_trivia();
        self.builder
            .start_node(SyntaxKind::LocalDeclarationStatement.into());
        if self.at(SyntaxKind::VarKw) {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::IdentifierName.into());
            self.bump();
            self.builder.finish_node();
        } else {
            self.parse_type();
        }
        loop {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::VariableDeclarator.into());
            self.expect_ident_like("expected local name");
            if self.at(SyntaxKind::Eq) {
                self.bump();
                self.parse_expression();
            }
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::Semicolon, "expected `;` after local declaration");
        self.builder.finish_node();
    }

    // --- Expressions ---

    fn parse_expression(&mut self) {
        self.parse_assignment();
    }

    fn parse_assignment(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        self.parse_binary(0);
        if self.at(SyntaxKind::Eq) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::AssignmentExpression.into());
            self.bump();
            self.parse_assignment();
            self.builder.finish_node();
        }
    }

    fn parse_binary(&mut self, min_level: u8) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        self.parse_unary();
        loop {
            let Some(level) = binary_level(self.current()) else {
                break;
            };
            if level < min_level {
                break;
            }
            self.builder
                .start_node_at(checkpoint, SyntaxKind::BinaryExpression.into());
            self.bump(); // operator
            self.parse_binary(level + 1);
            self.builder.finish_node();
        }
    }

    fn parse_unary(&mut self) {
        self.eat_trivia();
        match self.current() {
            SyntaxKind::Bang | SyntaxKind::Minus => {
                self.builder
                    .start_node(SyntaxKind::PrefixUnaryExpression.into());
                self.bump();
                self.parse_unary();
                self.builder.finish_node();
            }
            SyntaxKind::AwaitKw if self.nth(1).is_some_and(starts_expression) => {
                self.builder.start_node(SyntaxKind::AwaitExpression.into());
                self.bump();
                self.parse_unary();
                self.builder.finish_node();
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        self.parse_primary();
        loop {
            if self.at(SyntaxKind::Dot) && self.nth(1).is_some_and(|k| k.is_identifier_like()) {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::MemberAccessExpression.into());
                self.bump(); // .
                self.eat_trivia();
                self.builder.start_node(SyntaxKind::IdentifierName.into());
                self.bump(); // member name
                self.builder.finish_node();
                self.builder.finish_node();
            } else if self.at(SyntaxKind::LParen) {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::InvocationExpression.into());
                self.parse_argument_list();
                self.builder.finish_node();
            } else {
                break;
            }
        }
    }

    fn parse_argument_list(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::ArgumentList.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::Argument.into());
            self.parse_expression();
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "expected `)` to close argument list");
        self.builder.finish_node();
    }

    fn parse_primary(&mut self) {
        self.eat_trivia();
        match self.current() {
            SyntaxKind::NumberLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::CharLiteral
            | SyntaxKind::TrueKw
            | SyntaxKind::FalseKw
            | SyntaxKind::NullKw
            | SyntaxKind::ThisKw
            | SyntaxKind::BaseKw => {
                self.builder.start_node(SyntaxKind::LiteralExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::NewKw => {
                self.builder
                    .start_node(SyntaxKind::ObjectCreationExpression.into());
                self.bump();
                self.parse_type();
                if self.at(SyntaxKind::LParen) {
                    self.parse_argument_list();
                }
                self.builder.finish_node();
            }
            SyntaxKind::NameofKw if self.nth(1) == Some(SyntaxKind::LParen) => {
                self.builder.start_node(SyntaxKind::NameOfExpression.into());
                self.bump(); // nameof
                self.bump(); // (
                self.parse_expression();
                self.expect(SyntaxKind::RParen, "expected `)` to close nameof");
                self.builder.finish_node();
            }
            SyntaxKind::LParen => self.parse_parenthesized_or_lambda(),
            kind if kind.is_identifier_like() => {
                if self.nth(1) == Some(SyntaxKind::FatArrow) {
                    // `x => ...`
                    self.builder.start_node(SyntaxKind::LambdaExpression.into());
                    self.eat_trivia();
                    self.builder.start_node(SyntaxKind::Parameter.into());
                    self.bump(); // parameter name
                    self.builder.finish_node();
                    self.expect(SyntaxKind::FatArrow, "expected `=>`");
                    self.parse_lambda_body();
                    self.builder.finish_node();
                } else {
                    self.eat_trivia();
                    self.builder.start_node(SyntaxKind::IdentifierName.into());
                    self.bump();
                    self.builder.finish_node();
                }
            }
            kind if kind.is_predefined_type_keyword() => {
                self.builder.start_node(SyntaxKind::PredefinedType.into());
                self.bump();
                self.builder.finish_node();
            }
            _ => {
                self.error_here("expected expression");
                self.builder.start_node(SyntaxKind::Error.into());
                self.bump_any_non_trivia();
                self.builder.finish_node();
            }
        }
    }

    fn parse_parenthesized_or_lambda(&mut self) {
        if self.at_parenthesized_lambda() {
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::LambdaExpression.into());
            self.eat_trivia();
            self.builder.start_node(SyntaxKind::ParameterList.into());
            self.bump(); // (
            while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
                self.eat_trivia();
                self.builder.start_node(SyntaxKind::Parameter.into());
                self.expect_ident_like("expected lambda parameter name");
                self.builder.finish_node();
                if self.at(SyntaxKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect(SyntaxKind::RParen, "expected `)` to close lambda parameters");
            self.builder.finish_node();
            self.expect(SyntaxKind::FatArrow, "expected `=>`");
            self.parse_lambda_body();
            self.builder.finish_node();
            return;
        }

        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        self.bump(); // (
        self.parse_expression();
        if self.at(SyntaxKind::Comma) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::TupleExpression.into());
            while self.at(SyntaxKind::Comma) {
                self.bump();
                self.parse_expression();
            }
            self.expect(SyntaxKind::RParen, "expected `)` to close tuple");
            self.builder.finish_node();
        } else {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ParenthesizedExpression.into());
            self.expect(SyntaxKind::RParen, "expected `)`");
            self.builder.finish_node();
        }
    }

    /// `( ident, ident ) =>` — identifiers only up to the closing paren, then
    /// a fat arrow.
    fn at_parenthesized_lambda(&mut self) -> bool {
        debug_assert!(self.at(SyntaxKind::LParen));
        let mut idx = 1;
        loop {
            match self.nth(idx) {
                Some(SyntaxKind::RParen) => {
                    return self.nth(idx + 1) == Some(SyntaxKind::FatArrow);
                }
                Some(kind) if kind.is_identifier_like() => idx += 1,
                Some(SyntaxKind::Comma) => idx += 1,
                _ => return false,
            }
        }
    }

    fn parse_lambda_body(&mut self) {
        self.eat_trivia();
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.parse_expression();
        }
    }

    // --- Infrastructure ---

    fn current(&mut self) -> SyntaxKind {
        self.nth(0).unwrap_or(SyntaxKind::Eof)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
            .map(|t| t.kind)
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_ident_like(&mut self) -> bool {
        self.current().is_identifier_like()
    }

    fn eat_trivia(&mut self) {
        while self.tokens.front().is_some_and(|t| t.kind.is_trivia()) {
            self.bump_raw();
        }
    }

    fn bump(&mut self) {
        self.eat_trivia();
        self.bump_raw();
    }

    fn bump_any_non_trivia(&mut self) {
        self.eat_trivia();
        if !self.at(SyntaxKind::Eof) {
            self.bump_raw();
        }
    }

    fn bump_raw(&mut self) {
        if let Some(tok) = self.tokens.pop_front() {
            if tok.kind == SyntaxKind::Eof {
                return;
            }
            let text = tok.text(self.input);
            self.builder.token(tok.kind.into(), text);
        }
    }

    fn expect(&mut self, kind: SyntaxKind, message: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error_here(message);
            false
        }
    }

    fn expect_ident_like(&mut self, message: &str) {
        if self.at_ident_like() {
            self.bump();
        } else {
            self.error_here(message);
        }
    }

    fn error_here(&mut self, message: &str) {
        let range = self.current_range();
        self.errors.push(ParseError {
            message: message.to_string(),
            range,
        });
    }

    fn recover_here(&mut self, message: &str) {
        self.error_here(message);
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::Error.into());
        self.bump_any_non_trivia();
        self.builder.finish_node();
    }

    fn recover_to_member_boundary(&mut self) {
        self.eat_trivia();
        self.builder.start_node(SyntaxKind::Error.into());
        while !matches!(
            self.current(),
            SyntaxKind::Semicolon | SyntaxKind::RBrace | SyntaxKind::Eof
        ) {
            self.bump_raw();
        }
        if self.at(SyntaxKind::Semicolon) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn current_range(&mut self) -> TextRange {
        self.eat_trivia();
        self.tokens.front().map(|t| t.range).unwrap_or_else(|| {
            let end = self.input.len() as u32;
            TextRange::new(end, end)
        })
    }
}

fn is_modifier(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::PublicKw
            | SyntaxKind::PrivateKw
            | SyntaxKind::ProtectedKw
            | SyntaxKind::InternalKw
            | SyntaxKind::StaticKw
            | SyntaxKind::ReadonlyKw
            | SyntaxKind::PartialKw
            | SyntaxKind::AsyncKw
    )
}

fn binary_level(kind: SyntaxKind) -> Option<u8> {
    Some(match kind {
        SyntaxKind::PipePipe => 0,
        SyntaxKind::AmpAmp => 1,
        SyntaxKind::EqEq | SyntaxKind::NotEq => 2,
        SyntaxKind::Less | SyntaxKind::Greater | SyntaxKind::LessEq | SyntaxKind::GreaterEq => 3,
        SyntaxKind::Plus | SyntaxKind::Minus => 4,
        SyntaxKind::Star | SyntaxKind::Slash => 5,
        _ => return None,
    })
}

fn starts_expression(kind: SyntaxKind) -> bool {
    kind.is_identifier_like()
        || kind.is_predefined_type_keyword()
        || matches!(
            kind,
            SyntaxKind::NumberLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
                | SyntaxKind::NullKw
                | SyntaxKind::ThisKw
                | SyntaxKind::BaseKw
                | SyntaxKind::NewKw
                | SyntaxKind::LParen
                | SyntaxKind::Bang
                | SyntaxKind::Minus
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> SyntaxNode {
        let result = parse(input);
        assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
        result.syntax()
    }

    fn first_descendant(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
        root.descendants()
            .find(|n| n.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind:?} in tree"))
    }

    #[test]
    fn tree_round_trips_text() {
        let input = "using System;\n\nnamespace N {\n  class C {\n    int x = 1; // note\n    void M(int a) { var y = a + x; }\n  }\n}\n";
        let root = parse_ok(input);
        assert_eq!(root.text().to_string(), input);
    }

    #[test]
    fn parses_using_alias() {
        let root = parse_ok("using A = Some.Place;\n");
        let alias = first_descendant(&root, SyntaxKind::UsingAlias);
        assert!(alias
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| t.text() == "A"));
    }

    #[test]
    fn parses_property_with_accessors() {
        let root = parse_ok("class C { int Count { get; set; } }");
        let accessors: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::AccessorDeclaration)
            .collect();
        assert_eq!(accessors.len(), 2);
    }

    #[test]
    fn modifiers_stay_outside_the_member_type() {
        let root = parse_ok("class C { static int Value() { return 0; } }");
        let method = first_descendant(&root, SyntaxKind::MethodDeclaration);
        assert!(
            method
                .children_with_tokens()
                .filter_map(|e| e.into_token())
                .any(|t| t.kind() == SyntaxKind::StaticKw),
            "static keyword must be a direct child of the declaration"
        );
        let ty = first_descendant(&root, SyntaxKind::PredefinedType);
        assert_eq!(ty.text().to_string(), "int");
    }

    #[test]
    fn parses_destructor() {
        let root = parse_ok("class C { ~C() { } }");
        first_descendant(&root, SyntaxKind::DestructorDeclaration);
    }

    #[test]
    fn parses_constructor_with_initializer() {
        let root = parse_ok("class C { C(int x) : base(x) { } }");
        first_descendant(&root, SyntaxKind::ConstructorInitializer);
    }

    #[test]
    fn parses_lambda_forms() {
        let root = parse_ok("class C { void M() { var f = x => x; var g = (a, b) => a; } }");
        let lambdas: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::LambdaExpression)
            .collect();
        assert_eq!(lambdas.len(), 2);
    }

    #[test]
    fn parses_foreach_and_labels() {
        let root = parse_ok(
            "class C { void M(C items) { again: foreach (var item in items) { goto again; } } }",
        );
        first_descendant(&root, SyntaxKind::ForEachStatement);
        first_descendant(&root, SyntaxKind::LabeledStatement);
        first_descendant(&root, SyntaxKind::GotoStatement);
    }

    #[test]
    fn parses_deconstruction_assignment() {
        let root = parse_ok("class C { void M(C p) { (a, b) = p; } }");
        let assign = first_descendant(&root, SyntaxKind::AssignmentExpression);
        assert_eq!(
            assign.first_child().map(|n| n.kind()),
            Some(SyntaxKind::TupleExpression)
        );
    }

    #[test]
    fn parses_attributes() {
        let root = parse_ok("class C { [Obsolete(\"x\")] void M() { } }");
        first_descendant(&root, SyntaxKind::Attribute);
        first_descendant(&root, SyntaxKind::AttributeArgument);
    }

    #[test]
    fn parses_nameof() {
        let root = parse_ok("class C { string M() { return nameof(M); } }");
        first_descendant(&root, SyntaxKind::NameOfExpression);
    }

    #[test]
    fn parses_await() {
        let root = parse_ok("class C { async void M(C t) { await t; } }");
        first_descendant(&root, SyntaxKind::AwaitExpression);
    }

    #[test]
    fn member_access_keeps_qualifier_structure() {
        let root = parse_ok("class C { void M(C a) { a.b.c(); } }");
        let invocation = first_descendant(&root, SyntaxKind::InvocationExpression);
        let callee = invocation.first_child().unwrap();
        assert_eq!(callee.kind(), SyntaxKind::MemberAccessExpression);
    }
}
