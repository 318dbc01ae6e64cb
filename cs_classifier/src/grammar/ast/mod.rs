//! Syntax tree for C# compilation units

pub mod nodes;
pub mod tree;

pub use nodes::{Element, Node, NodeId, NodeKind, TokenRole};
pub use tree::{Checkpoint, SyntaxTree, TreeBuilder};
