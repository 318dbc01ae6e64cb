//! Error types for output validation

use crate::classification::{Category, ClassificationError};
use crate::logging::{codes, Code};
use crate::utils::Span;
use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A broken output invariant. Each one is an engine defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Span out of start order
    #[error("Span {span} ({category}) follows {previous} out of order")]
    Unsorted {
        span: Span,
        category: Category,
        previous: Span,
    },

    /// Two spans share text and are not a static pairing
    #[error("Span {span} ({category}) overlaps {other} ({other_category})")]
    Overlapping {
        span: Span,
        category: Category,
        other: Span,
        other_category: Category,
    },

    /// Span reaching past the end of the text
    #[error("Span {span} ({category}) lies outside text of length {len}")]
    OutOfRange {
        span: Span,
        category: Category,
        len: usize,
    },

    /// Embedded span escaping its host literal
    #[error("Embedded span {span} ({category}) is outside its host literal {host}")]
    OutsideHost {
        span: Span,
        category: Category,
        host: Span,
    },
}

impl ValidationError {
    pub fn span(&self) -> Span {
        match self {
            Self::Unsorted { span, .. }
            | Self::Overlapping { span, .. }
            | Self::OutOfRange { span, .. }
            | Self::OutsideHost { span, .. } => *span,
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Unsorted { .. } => codes::classification::UNSORTED_OUTPUT,
            Self::Overlapping { .. } => codes::classification::OVERLAPPING_SPANS,
            Self::OutOfRange { .. } => codes::classification::SPAN_OUT_OF_RANGE,
            Self::OutsideHost { .. } => codes::classification::EMBEDDED_SPAN_OUTSIDE_HOST,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unsorted { .. } => "unsorted",
            Self::Overlapping { .. } => "overlapping",
            Self::OutOfRange { .. } => "out_of_range",
            Self::OutsideHost { .. } => "outside_host",
        }
    }
}

impl From<ValidationError> for ClassificationError {
    fn from(error: ValidationError) -> Self {
        ClassificationError::invariant(error.error_code(), error.span(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_invariant_violation() {
        let error = ValidationError::OutOfRange {
            span: Span::new(3, 9),
            category: Category::Keyword,
            len: 5,
        };
        assert_eq!(error.error_code(), codes::classification::SPAN_OUT_OF_RANGE);
        let converted: ClassificationError = error.into();
        assert!(!converted.is_cancelled());
        assert_eq!(converted.error_code(), codes::classification::SPAN_OUT_OF_RANGE);
        assert!(converted.to_string().contains("3..9"));
    }
}
