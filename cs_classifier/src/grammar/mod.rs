//! C# grammar: keyword tables, syntax tree shapes and the builder
//! functions that recognise each production

pub mod ast;
pub mod builders;
pub mod keywords;

pub use ast::{Element, Node, NodeId, NodeKind, SyntaxTree, TokenRole};
pub use builders::{atomic::Parser, parse_compilation_unit};
pub use keywords::{is_reserved_keyword, Keyword};
