//! Declaration-level source structure: types, fields and methods.

use core::fmt;

use facet::Facet;

use crate::entity::StatementTree;

/// Kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum StructureKind {
    /// The file itself
    CompilationUnit,
    /// Class declaration
    Class,
    /// Interface declaration
    Interface,
    /// Enum declaration
    Enum,
    /// Annotation type declaration
    Annotation,
    /// Field declaration
    Field,
    /// Constructor declaration
    Constructor,
    /// Method declaration
    Method,
}

impl StructureKind {
    /// Classes and interfaces (enums and annotation types count as classes).
    pub fn is_class_or_interface(self) -> bool {
        matches!(
            self,
            StructureKind::Class
                | StructureKind::Interface
                | StructureKind::Enum
                | StructureKind::Annotation
        )
    }

    /// Methods and constructors.
    pub fn is_method_or_constructor(self) -> bool {
        matches!(self, StructureKind::Method | StructureKind::Constructor)
    }

    /// Fields.
    pub fn is_field(self) -> bool {
        self == StructureKind::Field
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StructureKind::CompilationUnit => "compilation unit",
            StructureKind::Class => "class",
            StructureKind::Interface => "interface",
            StructureKind::Enum => "enum",
            StructureKind::Annotation => "annotation",
            StructureKind::Field => "field",
            StructureKind::Constructor => "constructor",
            StructureKind::Method => "method",
        })
    }
}

/// A declaration and the declarations nested in it.
///
/// `content` is the raw source text a change is judged by. For types it should
/// hold the header only (modifiers, name, supertypes) so that editing a member
/// does not mark the enclosing type as changed; members carry their own content.
#[derive(Debug, Clone)]
pub struct StructureNode {
    kind: StructureKind,
    name: String,
    qualifier: Option<String>,
    content: String,
    children: Vec<StructureNode>,
    body: Option<StatementTree>,
}

impl StructureNode {
    /// A declaration with no content, children or body yet.
    pub fn new(kind: StructureKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            qualifier: None,
            content: String::new(),
            children: Vec::new(),
            body: None,
        }
    }

    /// Set the enclosing qualifier (package or outer type).
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Set the raw source text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Append a nested declaration.
    pub fn with_child(mut self, child: StructureNode) -> Self {
        self.children.push(child);
        self
    }

    /// Attach the statement-level tree of this declaration's body.
    pub fn with_body(mut self, body: StatementTree) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a nested declaration.
    pub fn add_child(&mut self, child: StructureNode) {
        self.children.push(child);
    }

    /// Declaration kind.
    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Simple name (for methods, the signature).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enclosing qualifier, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// `qualifier.name`, or just the name without a qualifier.
    pub fn fully_qualified_name(&self) -> String {
        match &self.qualifier {
            Some(qualifier) if !qualifier.is_empty() => format!("{qualifier}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Raw source text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Nested declarations in source order.
    pub fn children(&self) -> &[StructureNode] {
        &self.children
    }

    /// Statement-level body, if the front end provided one.
    pub fn body(&self) -> Option<&StatementTree> {
        self.body.as_ref()
    }

    /// Whether this declaration is a class, interface, enum or annotation type.
    pub fn is_class_or_interface(&self) -> bool {
        self.kind.is_class_or_interface()
    }

    /// Whether this declaration is a method or constructor.
    pub fn is_method_or_constructor(&self) -> bool {
        self.kind.is_method_or_constructor()
    }

    /// Whether this declaration is a field.
    pub fn is_field(&self) -> bool {
        self.kind.is_field()
    }
}

impl fmt::Display for StructureNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.fully_qualified_name())
    }
}
