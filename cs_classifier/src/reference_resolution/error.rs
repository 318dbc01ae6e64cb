//! Binding errors
//!
//! Unresolved names, arity mismatches and cyclic bases are not errors:
//! the affected tokens simply keep their syntactic category. The only way
//! binding fails is cancellation.

use crate::logging::{codes, Code};
use thiserror::Error;

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("Binding cancelled during {stage} after {visited} nodes")]
    Cancelled { stage: &'static str, visited: usize },
}

impl BindingError {
    pub fn cancelled(stage: &'static str, visited: usize) -> Self {
        Self::Cancelled { stage, visited }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Cancelled { .. } => codes::binding::BINDING_CANCELLED,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error() {
        let error = BindingError::cancelled("binding", 128);
        assert!(error.is_cancelled());
        assert_eq!(error.error_code(), codes::binding::BINDING_CANCELLED);
        assert_eq!(error.to_string(), "Binding cancelled during binding after 128 nodes");
    }
}
