//! Entity types: what a statement-tree node syntactically represents.

use core::fmt;

use distiller_tree::{SimpleTypes, Tree};
use facet::Facet;

/// Syntactic category of a node in a statement-level tree.
///
/// The set is closed; every predicate below is an exhaustive match, so adding
/// a variant forces a decision for each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum EntityType {
    // Declarations
    CompilationUnit,
    Class,
    Field,
    Method,

    // Bodies
    Block,
    Body,
    ThenStatement,
    ElseStatement,
    CatchClauses,
    Finally,

    // Statements
    AssertStatement,
    Assignment,
    BreakStatement,
    CatchClause,
    ConstructorInvocation,
    ContinueStatement,
    DoStatement,
    ForeachStatement,
    ForStatement,
    IfStatement,
    LabeledStatement,
    MethodInvocation,
    PostfixExpression,
    PrefixExpression,
    ReturnStatement,
    SuperConstructorInvocation,
    SuperMethodInvocation,
    SwitchCase,
    SwitchStatement,
    SynchronizedStatement,
    ThrowStatement,
    TryStatement,
    VariableDeclarationStatement,
    WhileStatement,

    // Comments
    BlockComment,
    Javadoc,
    LineComment,

    // Types
    ArrayType,
    ParameterizedType,
    PrimitiveType,
    QualifiedType,
    SimpleType,
    WildcardType,

    // Modifiers
    Modifier,
    Modifiers,

    // Everything else a front end may emit
    Parameter,
    Parameters,
    SimpleName,
    TypeParameter,
    TypeParameters,
}

impl EntityType {
    /// Line, block and doc comments.
    pub fn is_comment(self) -> bool {
        use EntityType::*;
        match self {
            BlockComment | Javadoc | LineComment => true,
            CompilationUnit | Class | Field | Method | Block | Body | ThenStatement
            | ElseStatement | CatchClauses | Finally | AssertStatement | Assignment
            | BreakStatement | CatchClause | ConstructorInvocation | ContinueStatement
            | DoStatement | ForeachStatement | ForStatement | IfStatement | LabeledStatement
            | MethodInvocation | PostfixExpression | PrefixExpression | ReturnStatement
            | SuperConstructorInvocation | SuperMethodInvocation | SwitchCase
            | SwitchStatement | SynchronizedStatement | ThrowStatement | TryStatement
            | VariableDeclarationStatement | WhileStatement | ArrayType | ParameterizedType
            | PrimitiveType | QualifiedType | SimpleType | WildcardType | Modifier | Modifiers
            | Parameter | Parameters | SimpleName | TypeParameter | TypeParameters => false,
        }
    }

    /// Nodes that appear as statements in a body.
    pub fn is_statement(self) -> bool {
        use EntityType::*;
        match self {
            AssertStatement | Assignment | BreakStatement | CatchClause
            | ConstructorInvocation | ContinueStatement | DoStatement | ForeachStatement
            | ForStatement | IfStatement | LabeledStatement | MethodInvocation
            | PostfixExpression | PrefixExpression | ReturnStatement
            | SuperConstructorInvocation | SuperMethodInvocation | SwitchCase
            | SwitchStatement | SynchronizedStatement | ThrowStatement | TryStatement
            | VariableDeclarationStatement | WhileStatement => true,
            CompilationUnit | Class | Field | Method | Block | Body | ThenStatement
            | ElseStatement | CatchClauses | Finally | BlockComment | Javadoc | LineComment
            | ArrayType | ParameterizedType | PrimitiveType | QualifiedType | SimpleType
            | WildcardType | Modifier | Modifiers | Parameter | Parameters | SimpleName
            | TypeParameter | TypeParameters => false,
        }
    }

    /// Type references.
    pub fn is_type(self) -> bool {
        use EntityType::*;
        match self {
            ArrayType | ParameterizedType | PrimitiveType | QualifiedType | SimpleType
            | WildcardType => true,
            CompilationUnit | Class | Field | Method | Block | Body | ThenStatement
            | ElseStatement | CatchClauses | Finally | AssertStatement | Assignment
            | BreakStatement | CatchClause | ConstructorInvocation | ContinueStatement
            | DoStatement | ForeachStatement | ForStatement | IfStatement | LabeledStatement
            | MethodInvocation | PostfixExpression | PrefixExpression | ReturnStatement
            | SuperConstructorInvocation | SuperMethodInvocation | SwitchCase
            | SwitchStatement | SynchronizedStatement | ThrowStatement | TryStatement
            | VariableDeclarationStatement | WhileStatement | BlockComment | Javadoc
            | LineComment | Modifier | Modifiers | Parameter | Parameters | SimpleName
            | TypeParameter | TypeParameters => false,
        }
    }

    /// Declarations that root a statement tree.
    pub fn is_declaration(self) -> bool {
        use EntityType::*;
        match self {
            CompilationUnit | Class | Field | Method => true,
            Block | Body | ThenStatement | ElseStatement | CatchClauses | Finally
            | AssertStatement | Assignment | BreakStatement | CatchClause
            | ConstructorInvocation | ContinueStatement | DoStatement | ForeachStatement
            | ForStatement | IfStatement | LabeledStatement | MethodInvocation
            | PostfixExpression | PrefixExpression | ReturnStatement
            | SuperConstructorInvocation | SuperMethodInvocation | SwitchCase
            | SwitchStatement | SynchronizedStatement | ThrowStatement | TryStatement
            | VariableDeclarationStatement | WhileStatement | BlockComment | Javadoc
            | LineComment | ArrayType | ParameterizedType | PrimitiveType | QualifiedType
            | SimpleType | WildcardType | Modifier | Modifiers | Parameter | Parameters
            | SimpleName | TypeParameter | TypeParameters => false,
        }
    }

    /// Containers that group statements without being statements themselves.
    pub fn is_body(self) -> bool {
        use EntityType::*;
        match self {
            Block | Body | ThenStatement | ElseStatement | CatchClauses | Finally => true,
            CompilationUnit | Class | Field | Method | AssertStatement | Assignment
            | BreakStatement | CatchClause | ConstructorInvocation | ContinueStatement
            | DoStatement | ForeachStatement | ForStatement | IfStatement | LabeledStatement
            | MethodInvocation | PostfixExpression | PrefixExpression | ReturnStatement
            | SuperConstructorInvocation | SuperMethodInvocation | SwitchCase
            | SwitchStatement | SynchronizedStatement | ThrowStatement | TryStatement
            | VariableDeclarationStatement | WhileStatement | BlockComment | Javadoc
            | LineComment | ArrayType | ParameterizedType | PrimitiveType | QualifiedType
            | SimpleType | WildcardType | Modifier | Modifiers | Parameter | Parameters
            | SimpleName | TypeParameter | TypeParameters => false,
        }
    }

    /// Modifier keywords and modifier lists.
    pub fn is_modifier(self) -> bool {
        use EntityType::*;
        match self {
            Modifier | Modifiers => true,
            CompilationUnit | Class | Field | Method | Block | Body | ThenStatement
            | ElseStatement | CatchClauses | Finally | AssertStatement | Assignment
            | BreakStatement | CatchClause | ConstructorInvocation | ContinueStatement
            | DoStatement | ForeachStatement | ForStatement | IfStatement | LabeledStatement
            | MethodInvocation | PostfixExpression | PrefixExpression | ReturnStatement
            | SuperConstructorInvocation | SuperMethodInvocation | SwitchCase
            | SwitchStatement | SynchronizedStatement | ThrowStatement | TryStatement
            | VariableDeclarationStatement | WhileStatement | BlockComment | Javadoc
            | LineComment | ArrayType | ParameterizedType | PrimitiveType | QualifiedType
            | SimpleType | WildcardType | Parameter | Parameters | SimpleName
            | TypeParameter | TypeParameters => false,
        }
    }

    /// Upper snake case name, e.g. `IF_STATEMENT`.
    pub fn name(self) -> &'static str {
        use EntityType::*;
        match self {
            CompilationUnit => "COMPILATION_UNIT",
            Class => "CLASS",
            Field => "FIELD",
            Method => "METHOD",
            Block => "BLOCK",
            Body => "BODY",
            ThenStatement => "THEN_STATEMENT",
            ElseStatement => "ELSE_STATEMENT",
            CatchClauses => "CATCH_CLAUSES",
            Finally => "FINALLY",
            AssertStatement => "ASSERT_STATEMENT",
            Assignment => "ASSIGNMENT",
            BreakStatement => "BREAK_STATEMENT",
            CatchClause => "CATCH_CLAUSE",
            ConstructorInvocation => "CONSTRUCTOR_INVOCATION",
            ContinueStatement => "CONTINUE_STATEMENT",
            DoStatement => "DO_STATEMENT",
            ForeachStatement => "FOREACH_STATEMENT",
            ForStatement => "FOR_STATEMENT",
            IfStatement => "IF_STATEMENT",
            LabeledStatement => "LABELED_STATEMENT",
            MethodInvocation => "METHOD_INVOCATION",
            PostfixExpression => "POSTFIX_EXPRESSION",
            PrefixExpression => "PREFIX_EXPRESSION",
            ReturnStatement => "RETURN_STATEMENT",
            SuperConstructorInvocation => "SUPER_CONSTRUCTOR_INVOCATION",
            SuperMethodInvocation => "SUPER_METHOD_INVOCATION",
            SwitchCase => "SWITCH_CASE",
            SwitchStatement => "SWITCH_STATEMENT",
            SynchronizedStatement => "SYNCHRONIZED_STATEMENT",
            ThrowStatement => "THROW_STATEMENT",
            TryStatement => "TRY_STATEMENT",
            VariableDeclarationStatement => "VARIABLE_DECLARATION_STATEMENT",
            WhileStatement => "WHILE_STATEMENT",
            BlockComment => "BLOCK_COMMENT",
            Javadoc => "JAVADOC",
            LineComment => "LINE_COMMENT",
            ArrayType => "ARRAY_TYPE",
            ParameterizedType => "PARAMETERIZED_TYPE",
            PrimitiveType => "PRIMITIVE_TYPE",
            QualifiedType => "QUALIFIED_TYPE",
            SimpleType => "SIMPLE_TYPE",
            WildcardType => "WILDCARD_TYPE",
            Modifier => "MODIFIER",
            Modifiers => "MODIFIERS",
            Parameter => "PARAMETER",
            Parameters => "PARAMETERS",
            SimpleName => "SIMPLE_NAME",
            TypeParameter => "TYPE_PARAMETER",
            TypeParameters => "TYPE_PARAMETERS",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte range of a node in the source file it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Facet)]
pub struct SourceRange {
    /// Offset of the first byte
    pub start: usize,
    /// Offset one past the last byte
    pub end: usize,
}

impl SourceRange {
    /// Range covering `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tree types for statement-level source trees.
pub type SourceTypes = SimpleTypes<EntityType, SourceRange>;

/// A statement-level tree as produced by a front end.
pub type StatementTree = Tree<SourceTypes>;
