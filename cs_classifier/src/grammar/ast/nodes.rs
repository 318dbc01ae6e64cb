//! Syntax node definitions for C# compilation units
//!
//! Nodes live in an arena owned by [`super::tree::SyntaxTree`] and refer to
//! each other and to lexemes by index. A node's children are kept in source
//! order and mix child nodes with the lexeme indices of the significant
//! tokens the node consumed directly.
//!
//! Design principles:
//! - One kind per grammar production the classifier and binder care about
//! - Error tolerant: missing pieces are simply absent, skipped tokens are
//!   collected under `SkippedTokens`
//! - Declarations record their declared name token

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A child slot: either a nested node or a lexeme index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Node(NodeId),
    Token(usize),
}

impl Element {
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            Element::Node(id) => Some(id),
            Element::Token(_) => None,
        }
    }

    pub fn as_token(self) -> Option<usize> {
        match self {
            Element::Token(index) => Some(index),
            Element::Node(_) => None,
        }
    }
}

/// How the parser reinterpreted a token in its position
///
/// Most tokens keep the meaning their lexeme kind implies. The parser
/// overrides it for contextual keywords, angle brackets of type argument
/// lists and the `:` of a conditional expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TokenRole {
    #[default]
    None,
    /// Identifier spelling acting as a contextual keyword
    Keyword,
    /// `<`/`>` delimiting type parameters or type arguments
    Punctuation,
    /// `:` of `?:`
    Operator,
}

/// One node of the syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Element>,
    pub parent: Option<NodeId>,
    /// Declared (or referenced, for simple names) identifier token
    pub name_token: Option<usize>,
    /// First and last lexeme indices covered, if the node has any tokens
    pub first_token: Option<usize>,
    pub last_token: Option<usize>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            parent: None,
            name_token: None,
            first_token: None,
            last_token: None,
        }
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().filter_map(|element| element.as_node())
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().filter_map(|element| element.as_token())
    }
}

/// Node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // === COMPILATION UNIT ===
    CompilationUnit,
    ExternAlias,
    UsingDirective,
    NameEquals,
    Namespace,
    FileScopedNamespace,
    GlobalStatement,
    SkippedTokens,

    // === TYPE DECLARATIONS ===
    Class,
    Struct,
    Interface,
    Record,
    RecordStruct,
    Enum,
    EnumMember,
    Delegate,
    BaseList,
    TypeParameterList,
    TypeParameter,
    ConstraintClause,
    Constraint,

    // === MEMBER DECLARATIONS ===
    Method,
    Constructor,
    ConstructorInitializer,
    Destructor,
    Operator,
    ConversionOperator,
    Property,
    Indexer,
    Event,
    EventField,
    Field,
    IncompleteMember,
    ExplicitInterfaceSpecifier,
    AccessorList,
    Accessor,
    ParameterList,
    BracketedParameterList,
    Parameter,
    ArrowExpressionClause,
    EqualsValueClause,
    VariableDeclaration,
    VariableDeclarator,

    // === ATTRIBUTES ===
    AttributeList,
    AttributeTargetSpecifier,
    Attribute,
    AttributeArgumentList,
    AttributeArgument,

    // === TYPES AND NAMES ===
    IdentifierName,
    GenericName,
    TypeArgumentList,
    OmittedTypeArgument,
    QualifiedName,
    AliasQualifiedName,
    PredefinedType,
    ArrayType,
    ArrayRankSpecifier,
    NullableType,
    PointerType,
    FunctionPointerType,
    TupleType,
    TupleElement,
    RefType,

    // === EXPRESSIONS ===
    Literal,
    InterpolatedString,
    Interpolation,
    InterpolationAlignment,
    InterpolationFormat,
    ThisExpression,
    BaseExpression,
    ParenthesizedExpression,
    TupleExpression,
    MemberAccess,
    ConditionalAccess,
    Invocation,
    ElementAccess,
    ArgumentList,
    BracketedArgumentList,
    Argument,
    NameColon,
    PrefixUnary,
    PostfixUnary,
    Binary,
    Assignment,
    Conditional,
    Cast,
    IsExpression,
    AsExpression,
    ObjectCreation,
    ImplicitObjectCreation,
    AnonymousObjectCreation,
    AnonymousObjectMember,
    ArrayCreation,
    ImplicitArrayCreation,
    StackAllocCreation,
    Initializer,
    CollectionExpression,
    SpreadElement,
    SimpleLambda,
    ParenthesizedLambda,
    AnonymousMethod,
    TypeOf,
    SizeOf,
    DefaultExpression,
    CheckedExpression,
    SwitchExpression,
    SwitchExpressionArm,
    WithExpression,
    ThrowExpression,
    AwaitExpression,
    RefExpression,
    RangeExpression,
    DeclarationExpression,
    SingleVariableDesignation,
    ParenthesizedVariableDesignation,
    DiscardDesignation,

    // === QUERIES ===
    QueryExpression,
    FromClause,
    LetClause,
    WhereClause,
    JoinClause,
    JoinIntoClause,
    OrderByClause,
    Ordering,
    SelectClause,
    GroupClause,
    QueryContinuation,

    // === PATTERNS ===
    ConstantPattern,
    DeclarationPattern,
    VarPattern,
    TypePattern,
    DiscardPattern,
    RelationalPattern,
    NotPattern,
    BinaryPattern,
    ParenthesizedPattern,
    RecursivePattern,
    PositionalPatternClause,
    PropertyPatternClause,
    Subpattern,
    ListPattern,
    SlicePattern,
    WhenClause,

    // === STATEMENTS ===
    Block,
    LocalDeclaration,
    LocalFunction,
    ExpressionStatement,
    EmptyStatement,
    LabeledStatement,
    If,
    ElseClause,
    While,
    Do,
    For,
    Foreach,
    Using,
    Lock,
    Fixed,
    Return,
    Throw,
    Break,
    Continue,
    Goto,
    YieldStatement,
    Switch,
    SwitchSection,
    CaseLabel,
    DefaultLabel,
    Try,
    CatchClause,
    CatchDeclaration,
    CatchFilter,
    FinallyClause,
    CheckedStatement,
    UnsafeStatement,
}

impl NodeKind {
    /// Declarations that introduce a named type
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Struct
                | NodeKind::Interface
                | NodeKind::Record
                | NodeKind::RecordStruct
                | NodeKind::Enum
                | NodeKind::Delegate
        )
    }

    /// Declarations that may own members
    pub fn is_member_container(self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Struct
                | NodeKind::Interface
                | NodeKind::Record
                | NodeKind::RecordStruct
        )
    }

    pub fn is_namespace(self) -> bool {
        matches!(self, NodeKind::Namespace | NodeKind::FileScopedNamespace)
    }

    /// Nodes that can stand where a type is expected
    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeKind::IdentifierName
                | NodeKind::GenericName
                | NodeKind::QualifiedName
                | NodeKind::AliasQualifiedName
                | NodeKind::PredefinedType
                | NodeKind::ArrayType
                | NodeKind::NullableType
                | NodeKind::PointerType
                | NodeKind::FunctionPointerType
                | NodeKind::TupleType
                | NodeKind::RefType
                | NodeKind::OmittedTypeArgument
        )
    }

    /// Function-like bodies that open a parameter scope
    pub fn is_function(self) -> bool {
        matches!(
            self,
            NodeKind::Method
                | NodeKind::Constructor
                | NodeKind::Destructor
                | NodeKind::Operator
                | NodeKind::ConversionOperator
                | NodeKind::LocalFunction
                | NodeKind::SimpleLambda
                | NodeKind::ParenthesizedLambda
                | NodeKind::AnonymousMethod
                | NodeKind::Accessor
                | NodeKind::Indexer
                | NodeKind::Delegate
        )
    }

    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            NodeKind::ConstantPattern
                | NodeKind::DeclarationPattern
                | NodeKind::VarPattern
                | NodeKind::TypePattern
                | NodeKind::DiscardPattern
                | NodeKind::RelationalPattern
                | NodeKind::NotPattern
                | NodeKind::BinaryPattern
                | NodeKind::ParenthesizedPattern
                | NodeKind::RecursivePattern
                | NodeKind::ListPattern
                | NodeKind::SlicePattern
        )
    }

    pub fn is_query_clause(self) -> bool {
        matches!(
            self,
            NodeKind::FromClause
                | NodeKind::LetClause
                | NodeKind::WhereClause
                | NodeKind::JoinClause
                | NodeKind::JoinIntoClause
                | NodeKind::OrderByClause
                | NodeKind::SelectClause
                | NodeKind::GroupClause
                | NodeKind::QueryContinuation
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups() {
        assert!(NodeKind::Record.is_type_declaration());
        assert!(NodeKind::Delegate.is_type_declaration());
        assert!(!NodeKind::Delegate.is_member_container());
        assert!(NodeKind::GenericName.is_type());
        assert!(NodeKind::VarPattern.is_pattern());
        assert!(NodeKind::JoinIntoClause.is_query_clause());
    }

    #[test]
    fn test_element_accessors() {
        assert_eq!(Element::Token(4).as_token(), Some(4));
        assert_eq!(Element::Token(4).as_node(), None);
        assert_eq!(Element::Node(NodeId(2)).as_node(), Some(NodeId(2)));
    }
}
