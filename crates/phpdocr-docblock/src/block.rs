//! Documentable blocks extracted from a PHP source file

/// The kind of declaration a docblock is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Method,
    Class,
    Interface,
    Trait,
    Property,
}

impl BlockKind {
    /// Label used in the synthesized `"<kind> <name>"` line.
    /// Functions and methods both render as `function`.
    pub fn label(self) -> &'static str {
        match self {
            BlockKind::Function | BlockKind::Method => "function",
            BlockKind::Class => "class",
            BlockKind::Interface => "interface",
            BlockKind::Trait => "trait",
            BlockKind::Property => "property",
        }
    }

    pub fn is_function_like(self) -> bool {
        matches!(self, BlockKind::Function | BlockKind::Method)
    }

    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            BlockKind::Class | BlockKind::Interface | BlockKind::Trait
        )
    }
}

/// A declared parameter of a function or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name without the `$` prefix
    pub name: String,
    /// Declared type hint as written in source
    pub declared_type: Option<String>,
}

/// One documentable unit with its zero-based, inclusive line range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentableBlock {
    pub kind: BlockKind,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub parameters: Vec<Parameter>,
    /// Return type hint as written in source (may be a union)
    pub declared_return_type: Option<String>,
    /// Set only when there is no usable declared return type
    pub inferred_return_type: Option<String>,
    /// Exception types thrown directly in the body, first-seen order
    pub thrown_exceptions: Vec<String>,
    /// False for abstract and interface methods
    pub has_body: bool,
    /// For properties: the declared type hint
    pub type_hint: Option<String>,
    pub children: Vec<DocumentableBlock>,
}

impl DocumentableBlock {
    pub fn new(kind: BlockKind, name: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            start_line,
            end_line,
            parameters: Vec::new(),
            declared_return_type: None,
            inferred_return_type: None,
            thrown_exceptions: Vec::new(),
            has_body: true,
            type_hint: None,
            children: Vec::new(),
        }
    }

    /// This block followed by all of its descendants, depth-first
    pub fn descendants(&self) -> Vec<&DocumentableBlock> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}
