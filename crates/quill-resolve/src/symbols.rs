use quill_core::TextRange;

/// Index into the model's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Type,
    TypeParameter,
    Method,
    Property,
    Field,
    EnumMember,
    Parameter,
    Local,
    RangeVariable,
    Label,
    Alias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFlavor {
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub kind: SymbolKind,
    /// Value text: `@` stripped, unicode escapes decoded.
    pub name: String,
    pub container: Option<SymbolId>,
    /// Name-token ranges; more than one for partial types and partial methods.
    pub declarations: Vec<TextRange>,
    /// Direct members, for namespaces and types.
    pub members: Vec<SymbolId>,
    /// Parameters of the first declaration, for methods.
    pub params: Vec<SymbolId>,
    /// Textual parameter types, for signature comparison.
    pub param_types: Vec<String>,
    /// How many leading parameters carry no default value; the rest may be
    /// elided at call sites.
    pub required_params: usize,
    /// Textual return type for methods, declared type for
    /// fields/properties/parameters/locals (`var` stays textual).
    pub declared_type: Option<String>,
    /// Textual base-list entries, for types.
    pub base_types: Vec<String>,
    /// Textual alias target path, for aliases.
    pub alias_target: Option<String>,
    pub is_static: bool,
    pub is_constructor: bool,
    pub is_partial: bool,
    /// Compiler-generated delegate type backing an event; carries the
    /// conventional `EventHandler` name suffix when renamed.
    pub is_implicit_delegate: bool,
    pub flavor: Option<TypeFlavor>,
}

impl SymbolData {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            container: None,
            declarations: Vec::new(),
            members: Vec::new(),
            params: Vec::new(),
            param_types: Vec::new(),
            required_params: 0,
            declared_type: None,
            base_types: Vec::new(),
            alias_target: None,
            is_static: false,
            is_constructor: false,
            is_partial: false,
            is_implicit_delegate: false,
            flavor: None,
        }
    }

    pub fn is_type(&self) -> bool {
        self.kind == SymbolKind::Type
    }

    pub fn is_enum_type(&self) -> bool {
        self.flavor == Some(TypeFlavor::Enum)
    }

    /// Locals, parameters, and range variables share the shadowing rules.
    pub fn is_local_like(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Local | SymbolKind::Parameter | SymbolKind::RangeVariable
        )
    }
}

/// Location-independent identity for a declaration: the symbol's kind plus
/// the names of its container chain, outermost first. Survives re-analysis of
/// a rewritten source where spans have moved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolFingerprint {
    pub kind: SymbolKind,
    pub path: Vec<String>,
}

impl SymbolFingerprint {
    /// True when `other` names the same declaration, allowing the final path
    /// segment to instead equal `alternate` (the post-rename spelling).
    pub fn matches(&self, other: &Self, alternate: Option<&str>, ignore_case: bool) -> bool {
        if self.kind != other.kind || self.path.len() != other.path.len() {
            return false;
        }
        let eq = |a: &str, b: &str| {
            if ignore_case {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        };
        let last = self.path.len() - 1;
        for i in 0..last {
            if !eq(&self.path[i], &other.path[i]) {
                return false;
            }
        }
        eq(&self.path[last], &other.path[last])
            || alternate.is_some_and(|alt| eq(alt, &other.path[last]))
    }
}
