//! Builder functions for C# grammar productions
//!
//! Every builder drives a [`Parser`] and never fails: missing pieces are
//! reported as diagnostics and the tree is built around them.

pub mod atomic;
pub mod declarations;
pub mod expressions;
pub mod helpers;
pub mod patterns;
pub mod statements;
pub mod types;

pub use atomic::Parser;
pub use declarations::parse_compilation_unit;
pub use expressions::parse_expression;
pub use statements::parse_statement;
pub use types::parse_type;
