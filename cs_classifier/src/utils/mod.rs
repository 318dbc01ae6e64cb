//! Shared primitive types used by every stage of the classifier.

pub mod span;

pub use span::{line_starts, Position, SourceMap, Span, Spanned};
