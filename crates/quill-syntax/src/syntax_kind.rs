use rowan::Language;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Unified syntax kind for both tokens and AST nodes.
///
/// Quill parses a C# subset: the kinds below cover the constructs the rename
/// engine inspects (declarations, name references, accessors, attributes,
/// using aliases, and the statement/expression forms eligible for
/// complexification).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- Trivia ---
    Whitespace,
    LineComment,
    BlockComment,

    // --- Identifiers & literals ---
    /// An identifier token. Verbatim identifiers keep their `@` prefix in the
    /// token text; [`crate::ident::value_text`] computes the unescaped value.
    Identifier,
    NumberLiteral,
    StringLiteral,
    CharLiteral,

    // --- Keywords (reserved, lexed) ---
    UsingKw,
    NamespaceKw,
    ClassKw,
    StructKw,
    InterfaceKw,
    EnumKw,
    PublicKw,
    PrivateKw,
    ProtectedKw,
    InternalKw,
    StaticKw,
    ReadonlyKw,
    VoidKw,
    NewKw,
    ReturnKw,
    IfKw,
    ElseKw,
    ForEachKw,
    InKw,
    WhileKw,
    GotoKw,
    ThisKw,
    BaseKw,
    IntKw,
    StringKw,
    BoolKw,
    ObjectKw,
    DoubleKw,
    LongKw,
    CharKw,
    TrueKw,
    FalseKw,
    NullKw,

    // --- Contextual keywords ---
    VarKw,
    PartialKw,
    AsyncKw,
    AwaitKw,
    GetKw,
    SetKw,
    InitKw,
    NameofKw,

    // --- Operators / punctuation ---
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Eq,
    EqEq,
    Bang,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    AmpAmp,
    PipePipe,
    Plus,
    Minus,
    Star,
    Slash,
    FatArrow,
    Tilde,

    Eof,
    ErrorToken,

    // --- Nodes: names & types ---
    IdentifierName,
    QualifiedName,
    PredefinedType,

    // --- Nodes: top level ---
    CompilationUnit,
    UsingDirective,
    UsingAlias,
    NamespaceDeclaration,

    // --- Nodes: type declarations ---
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    EnumMember,
    TypeParameterList,
    TypeParameter,
    BaseList,

    // --- Nodes: attributes ---
    AttributeList,
    Attribute,
    AttributeArgumentList,
    AttributeArgument,

    // --- Nodes: members ---
    FieldDeclaration,
    VariableDeclarator,
    MethodDeclaration,
    ParameterList,
    Parameter,
    ConstructorDeclaration,
    ConstructorInitializer,
    DestructorDeclaration,
    PropertyDeclaration,
    AccessorList,
    AccessorDeclaration,

    // --- Nodes: statements ---
    Block,
    LocalDeclarationStatement,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    ForEachStatement,
    WhileStatement,
    LabeledStatement,
    GotoStatement,
    EmptyStatement,

    // --- Nodes: expressions ---
    MemberAccessExpression,
    InvocationExpression,
    ArgumentList,
    Argument,
    ObjectCreationExpression,
    ParenthesizedExpression,
    AssignmentExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    LambdaExpression,
    AwaitExpression,
    TupleExpression,
    NameOfExpression,
    LiteralExpression,

    Error,

    __Last,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, SyntaxKind::LineComment | SyntaxKind::BlockComment)
    }

    pub fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::VarKw
                | SyntaxKind::PartialKw
                | SyntaxKind::AsyncKw
                | SyntaxKind::AwaitKw
                | SyntaxKind::GetKw
                | SyntaxKind::SetKw
                | SyntaxKind::InitKw
                | SyntaxKind::NameofKw
        )
    }

    pub fn is_identifier_like(self) -> bool {
        self == SyntaxKind::Identifier || self.is_contextual_keyword()
    }

    pub fn is_predefined_type_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntKw
                | SyntaxKind::StringKw
                | SyntaxKind::BoolKw
                | SyntaxKind::ObjectKw
                | SyntaxKind::DoubleKw
                | SyntaxKind::LongKw
                | SyntaxKind::CharKw
                | SyntaxKind::VoidKw
        )
    }

    pub fn is_accessor_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::GetKw | SyntaxKind::SetKw | SyntaxKind::InitKw
        )
    }

    pub fn is_name(self) -> bool {
        matches!(
            self,
            SyntaxKind::IdentifierName | SyntaxKind::QualifiedName | SyntaxKind::PredefinedType
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::IdentifierName
                | SyntaxKind::QualifiedName
                | SyntaxKind::PredefinedType
                | SyntaxKind::MemberAccessExpression
                | SyntaxKind::InvocationExpression
                | SyntaxKind::ObjectCreationExpression
                | SyntaxKind::ParenthesizedExpression
                | SyntaxKind::AssignmentExpression
                | SyntaxKind::BinaryExpression
                | SyntaxKind::PrefixUnaryExpression
                | SyntaxKind::LambdaExpression
                | SyntaxKind::AwaitExpression
                | SyntaxKind::TupleExpression
                | SyntaxKind::NameOfExpression
                | SyntaxKind::LiteralExpression
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::LocalDeclarationStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::IfStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::LabeledStatement
                | SyntaxKind::GotoStatement
                | SyntaxKind::EmptyStatement
        )
    }

    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::EnumDeclaration
        )
    }

    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "using" => SyntaxKind::UsingKw,
            "namespace" => SyntaxKind::NamespaceKw,
            "class" => SyntaxKind::ClassKw,
            "struct" => SyntaxKind::StructKw,
            "interface" => SyntaxKind::InterfaceKw,
            "enum" => SyntaxKind::EnumKw,
            "public" => SyntaxKind::PublicKw,
            "private" => SyntaxKind::PrivateKw,
            "protected" => SyntaxKind::ProtectedKw,
            "internal" => SyntaxKind::InternalKw,
            "static" => SyntaxKind::StaticKw,
            "readonly" => SyntaxKind::ReadonlyKw,
            "void" => SyntaxKind::VoidKw,
            "new" => SyntaxKind::NewKw,
            "return" => SyntaxKind::ReturnKw,
            "if" => SyntaxKind::IfKw,
            "else" => SyntaxKind::ElseKw,
            "foreach" => SyntaxKind::ForEachKw,
            "in" => SyntaxKind::InKw,
            "while" => SyntaxKind::WhileKw,
            "goto" => SyntaxKind::GotoKw,
            "this" => SyntaxKind::ThisKw,
            "base" => SyntaxKind::BaseKw,
            "int" => SyntaxKind::IntKw,
            "string" => SyntaxKind::StringKw,
            "bool" => SyntaxKind::BoolKw,
            "object" => SyntaxKind::ObjectKw,
            "double" => SyntaxKind::DoubleKw,
            "long" => SyntaxKind::LongKw,
            "char" => SyntaxKind::CharKw,
            "true" => SyntaxKind::TrueKw,
            "false" => SyntaxKind::FalseKw,
            "null" => SyntaxKind::NullKw,

            // Contextual keywords.
            "var" => SyntaxKind::VarKw,
            "partial" => SyntaxKind::PartialKw,
            "async" => SyntaxKind::AsyncKw,
            "await" => SyntaxKind::AwaitKw,
            "get" => SyntaxKind::GetKw,
            "set" => SyntaxKind::SetKw,
            "init" => SyntaxKind::InitKw,
            "nameof" => SyntaxKind::NameofKw,

            _ => return None,
        })
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(value: SyntaxKind) -> Self {
        rowan::SyntaxKind(value as u16)
    }
}

/// Rowan language marker for Quill's C# subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CSharpLanguage {}

impl Language for CSharpLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        if raw.0 < SyntaxKind::__Last as u16 {
            // SAFETY: We've verified the numeric value is within the enum range.
            unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
        } else {
            SyntaxKind::Error
        }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}
