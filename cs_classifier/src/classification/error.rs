//! Classification errors
//!
//! Malformed source never produces an error: it classifies as far as it was
//! understood. The two outcomes here are cancellation, which callers must
//! distinguish from completion, and an internal invariant violation, which
//! is a defect in the engine.

use crate::logging::{codes, Code};
use crate::reference_resolution::BindingError;
use thiserror::Error;

pub type ClassificationResult<T> = Result<T, ClassificationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("Classification cancelled during {stage}")]
    Cancelled { stage: &'static str },

    #[error("Classification invariant violated at {span}: {message}")]
    InvariantViolation {
        code: Code,
        span: crate::utils::Span,
        message: String,
    },
}

impl ClassificationError {
    pub fn cancelled(stage: &'static str) -> Self {
        Self::Cancelled { stage }
    }

    pub fn invariant(code: Code, span: crate::utils::Span, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            code,
            span,
            message: message.into(),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Cancelled { .. } => codes::classification::CANCELLED,
            Self::InvariantViolation { code, .. } => *code,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<BindingError> for ClassificationError {
    fn from(error: BindingError) -> Self {
        match error {
            BindingError::Cancelled { stage, .. } => Self::Cancelled { stage },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Span;

    #[test]
    fn test_binding_cancellation_converts() {
        let error: ClassificationError = BindingError::cancelled("names", 3).into();
        assert!(error.is_cancelled());
        assert_eq!(error.error_code(), codes::classification::CANCELLED);
    }

    #[test]
    fn test_invariant_violation_keeps_its_code() {
        let error = ClassificationError::invariant(
            codes::classification::OVERLAPPING_SPANS,
            Span::new(3, 5),
            "spans overlap",
        );
        assert!(!error.is_cancelled());
        assert_eq!(error.error_code(), codes::classification::OVERLAPPING_SPANS);
        assert_eq!(error.to_string(), "Classification invariant violated at 3..5: spans overlap");
    }
}
