//! Typed views over the untyped syntax tree.
//!
//! Only the nodes the rename engine actually navigates get a wrapper; the
//! rest of the tree is reachable through the raw `SyntaxNode` API.

use crate::parser::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

pub trait AstNode: Sized {
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

pub mod support {
    use super::*;

    pub fn child<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
        parent.children().find_map(N::cast)
    }

    pub fn children<N: AstNode>(parent: &SyntaxNode) -> impl Iterator<Item = N> {
        parent.children().filter_map(N::cast)
    }

    pub fn token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
        parent
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == kind)
    }

    /// First identifier-like token that is a direct child of `parent`.
    pub fn ident_token(parent: &SyntaxNode) -> Option<SyntaxToken> {
        parent
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_identifier_like())
    }
}

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then_some(Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(SourceFile, CompilationUnit);
ast_node!(UsingDirective, UsingDirective);
ast_node!(UsingAlias, UsingAlias);
ast_node!(NamespaceDeclaration, NamespaceDeclaration);
ast_node!(ClassDeclaration, ClassDeclaration);
ast_node!(StructDeclaration, StructDeclaration);
ast_node!(InterfaceDeclaration, InterfaceDeclaration);
ast_node!(EnumDeclaration, EnumDeclaration);
ast_node!(EnumMember, EnumMember);
ast_node!(TypeParameterList, TypeParameterList);
ast_node!(TypeParameter, TypeParameter);
ast_node!(Attribute, Attribute);
ast_node!(FieldDeclaration, FieldDeclaration);
ast_node!(VariableDeclarator, VariableDeclarator);
ast_node!(MethodDeclaration, MethodDeclaration);
ast_node!(ParameterList, ParameterList);
ast_node!(Parameter, Parameter);
ast_node!(ConstructorDeclaration, ConstructorDeclaration);
ast_node!(DestructorDeclaration, DestructorDeclaration);
ast_node!(PropertyDeclaration, PropertyDeclaration);
ast_node!(AccessorList, AccessorList);
ast_node!(AccessorDeclaration, AccessorDeclaration);
ast_node!(Block, Block);
ast_node!(LocalDeclarationStatement, LocalDeclarationStatement);
ast_node!(ForEachStatement, ForEachStatement);
ast_node!(LabeledStatement, LabeledStatement);
ast_node!(GotoStatement, GotoStatement);
ast_node!(IdentifierName, IdentifierName);
ast_node!(QualifiedName, QualifiedName);
ast_node!(MemberAccessExpression, MemberAccessExpression);
ast_node!(InvocationExpression, InvocationExpression);
ast_node!(ObjectCreationExpression, ObjectCreationExpression);
ast_node!(AssignmentExpression, AssignmentExpression);
ast_node!(TupleExpression, TupleExpression);
ast_node!(LambdaExpression, LambdaExpression);
ast_node!(AwaitExpression, AwaitExpression);
ast_node!(NameOfExpression, NameOfExpression);

impl UsingDirective {
    pub fn alias(&self) -> Option<UsingAlias> {
        support::child(self.syntax())
    }

    pub fn name(&self) -> Option<SyntaxNode> {
        self.syntax()
            .children()
            .find(|n| n.kind().is_name())
    }
}

impl UsingAlias {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }
}

impl NamespaceDeclaration {
    pub fn name(&self) -> Option<SyntaxNode> {
        self.syntax().children().find(|n| n.kind().is_name())
    }
}

/// Any of the four type-declaration forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration(SyntaxNode);

impl AstNode for TypeDeclaration {
    fn cast(node: SyntaxNode) -> Option<Self> {
        node.kind().is_type_declaration().then_some(Self(node))
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.0
    }
}

impl TypeDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }

    pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
        support::child(self.syntax())
    }

    pub fn is_partial(&self) -> bool {
        support::token(self.syntax(), SyntaxKind::PartialKw).is_some()
    }
}

impl TypeParameter {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }
}

impl FieldDeclaration {
    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> {
        support::children(self.syntax())
    }
}

impl VariableDeclarator {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }

    pub fn initializer(&self) -> Option<SyntaxNode> {
        self.syntax().children().find(|n| n.kind().is_expression())
    }
}

impl MethodDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        // The return type may itself contain identifiers; the method name is
        // the identifier immediately before the parameter list.
        let params = self.parameter_list()?;
        params
            .syntax()
            .siblings_with_tokens(rowan::Direction::Prev)
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_identifier_like())
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        support::child(self.syntax())
    }

    pub fn body(&self) -> Option<Block> {
        support::child(self.syntax())
    }

    pub fn is_static(&self) -> bool {
        support::token(self.syntax(), SyntaxKind::StaticKw).is_some()
    }
}

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        support::children(self.syntax())
    }
}

impl Parameter {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        // Attribute and type identifiers precede the name; take the last one.
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind().is_identifier_like())
            .last()
    }
}

impl ConstructorDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        support::child(self.syntax())
    }
}

impl DestructorDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }
}

impl PropertyDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        let accessors = self.accessor_list()?;
        accessors
            .syntax()
            .siblings_with_tokens(rowan::Direction::Prev)
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_identifier_like())
    }

    pub fn accessor_list(&self) -> Option<AccessorList> {
        support::child(self.syntax())
    }
}

impl AccessorList {
    pub fn accessors(&self) -> impl Iterator<Item = AccessorDeclaration> {
        support::children(self.syntax())
    }
}

impl AccessorDeclaration {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_accessor_keyword())
    }

    pub fn property(&self) -> Option<PropertyDeclaration> {
        self.syntax()
            .ancestors()
            .find_map(PropertyDeclaration::cast)
    }
}

impl EnumMember {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }
}

impl LocalDeclarationStatement {
    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> {
        support::children(self.syntax())
    }

    pub fn type_node(&self) -> Option<SyntaxNode> {
        self.syntax()
            .children()
            .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
    }
}

impl ForEachStatement {
    /// The iteration variable token: the identifier between the type and `in`.
    pub fn variable_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_identifier_like())
    }

    /// The enumerated expression: the last expression child before the body.
    pub fn collection(&self) -> Option<SyntaxNode> {
        self.syntax()
            .children()
            .filter(|n| n.kind().is_expression())
            .last()
    }
}

impl LabeledStatement {
    pub fn label_token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }
}

impl GotoStatement {
    pub fn target(&self) -> Option<IdentifierName> {
        support::child(self.syntax())
    }
}

impl IdentifierName {
    pub fn token(&self) -> Option<SyntaxToken> {
        support::ident_token(self.syntax())
    }
}

impl MemberAccessExpression {
    pub fn qualifier(&self) -> Option<SyntaxNode> {
        self.syntax().first_child()
    }

    pub fn member_name(&self) -> Option<IdentifierName> {
        self.syntax().children().filter_map(IdentifierName::cast).last()
    }
}

impl InvocationExpression {
    pub fn callee(&self) -> Option<SyntaxNode> {
        self.syntax().first_child()
    }

    /// The identifier naming the invoked member, whether the callee is bare
    /// or qualified.
    pub fn invoked_name(&self) -> Option<SyntaxToken> {
        let callee = self.callee()?;
        match callee.kind() {
            SyntaxKind::IdentifierName => IdentifierName::cast(callee)?.token(),
            SyntaxKind::MemberAccessExpression => {
                MemberAccessExpression::cast(callee)?.member_name()?.token()
            }
            _ => None,
        }
    }
}

impl ObjectCreationExpression {
    pub fn type_node(&self) -> Option<SyntaxNode> {
        self.syntax()
            .children()
            .find(|n| n.kind().is_name() || n.kind() == SyntaxKind::PredefinedType)
    }
}

impl AssignmentExpression {
    pub fn left(&self) -> Option<SyntaxNode> {
        self.syntax().first_child()
    }

    pub fn right(&self) -> Option<SyntaxNode> {
        self.syntax().children().nth(1)
    }
}

impl LambdaExpression {
    pub fn parameters(&self) -> Vec<Parameter> {
        if let Some(list) = support::child::<ParameterList>(self.syntax()) {
            list.parameters().collect()
        } else {
            support::children(self.syntax()).collect()
        }
    }
}

impl NameOfExpression {
    pub fn argument(&self) -> Option<SyntaxNode> {
        self.syntax().children().find(|n| n.kind().is_expression())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn find<N: AstNode>(input: &str) -> N {
        let root = parse(input).syntax();
        root.descendants()
            .find_map(N::cast)
            .expect("node kind not found")
    }

    #[test]
    fn method_name_skips_return_type() {
        let method: MethodDeclaration = find("class C { Other M(int x) { } }");
        assert_eq!(method.name_token().unwrap().text(), "M");
    }

    #[test]
    fn property_name_and_accessors() {
        let prop: PropertyDeclaration = find("class C { int Count { get; set; } }");
        assert_eq!(prop.name_token().unwrap().text(), "Count");
        let kw: Vec<_> = prop
            .accessor_list()
            .unwrap()
            .accessors()
            .filter_map(|a| a.keyword())
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(kw, ["get", "set"]);
    }

    #[test]
    fn accessor_finds_owning_property() {
        let accessor: AccessorDeclaration = find("class C { int Count { get; } }");
        let prop = accessor.property().unwrap();
        assert_eq!(prop.name_token().unwrap().text(), "Count");
    }

    #[test]
    fn parameter_name_is_last_identifier() {
        let param: Parameter = find("class C { void M(Some.Type value) { } }");
        assert_eq!(param.name_token().unwrap().text(), "value");
    }

    #[test]
    fn invocation_name_through_member_access() {
        let inv: InvocationExpression = find("class C { void M(C a) { a.Run(1); } }");
        assert_eq!(inv.invoked_name().unwrap().text(), "Run");
    }

    #[test]
    fn foreach_variable() {
        let stmt: ForEachStatement =
            find("class C { void M(C xs) { foreach (var item in xs) { } } }");
        assert_eq!(stmt.variable_token().unwrap().text(), "item");
    }

    #[test]
    fn using_alias_name() {
        let alias: UsingAlias = find("using Abbrev = A.B.C;\n");
        assert_eq!(alias.name_token().unwrap().text(), "Abbrev");
    }
}
