//! Parse diagnostics
//!
//! Parsing never fails. Every problem the builders recover from is recorded
//! as a [`SyntaxError`] on the finished tree, mapped to a logging code so
//! batch output can summarise it.

use crate::logging::{codes, Code};
use crate::utils::Span;

/// Recovered syntax problem with a span-accurate location
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unexpected token: expected {expected}, found '{found}' at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Missing {expected} at {span}")]
    MissingToken { expected: String, span: Span },

    #[error("Maximum nesting depth exceeded at {span}")]
    MaxDepthExceeded { span: Span },

    #[error("Skipped {count} tokens at {span}")]
    SkippedTokens { count: usize, span: Span },
}

impl SyntaxError {
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    /// A required token that is absent; `span` is empty at the insertion point
    pub fn missing_token(expected: &str, span: Span) -> Self {
        Self::MissingToken {
            expected: expected.to_string(),
            span,
        }
    }

    pub fn max_depth(span: Span) -> Self {
        Self::MaxDepthExceeded { span }
    }

    pub fn skipped_tokens(count: usize, span: Span) -> Self {
        Self::SkippedTokens { count, span }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::MissingToken { .. } => codes::syntax::MISSING_TOKEN,
            Self::MaxDepthExceeded { .. } => codes::syntax::MAX_DEPTH_EXCEEDED,
            Self::SkippedTokens { .. } => codes::syntax::SKIPPED_TOKENS,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::MissingToken { span, .. }
            | Self::MaxDepthExceeded { span }
            | Self::SkippedTokens { span, .. } => *span,
        }
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// Move the diagnostic along with an edited text
    pub fn shifted(self, delta: isize) -> Self {
        match self {
            Self::UnexpectedToken {
                expected,
                found,
                span,
            } => Self::UnexpectedToken {
                expected,
                found,
                span: span.shifted(delta),
            },
            Self::MissingToken { expected, span } => Self::MissingToken {
                expected,
                span: span.shifted(delta),
            },
            Self::MaxDepthExceeded { span } => Self::MaxDepthExceeded {
                span: span.shifted(delta),
            },
            Self::SkippedTokens { count, span } => Self::SkippedTokens {
                count,
                span: span.shifted(delta),
            },
        }
    }

    /// Message with the recommended action appended
    pub fn enhanced_message(&self) -> String {
        match self {
            Self::UnexpectedToken {
                expected, found, ..
            } => format!(
                "Expected {} but found '{}'. {}",
                expected,
                found,
                self.recommended_action()
            ),
            Self::MissingToken { expected, .. } => {
                format!("Expected {}. {}", expected, self.recommended_action())
            }
            _ => format!("{} ({})", self, self.recommended_action()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let span = Span::new(3, 5);
        assert_eq!(
            SyntaxError::unexpected_token("identifier", ";", span).error_code(),
            codes::syntax::UNEXPECTED_TOKEN
        );
        assert_eq!(
            SyntaxError::missing_token(")", Span::empty(3)).error_code(),
            codes::syntax::MISSING_TOKEN
        );
        assert_eq!(
            SyntaxError::max_depth(span).error_code(),
            codes::syntax::MAX_DEPTH_EXCEEDED
        );
        assert_eq!(SyntaxError::skipped_tokens(2, span).span(), span);
    }

    #[test]
    fn test_enhanced_messages() {
        let error = SyntaxError::unexpected_token("identifier", "if", Span::new(0, 2));
        let enhanced = error.enhanced_message();
        assert!(enhanced.contains("Expected identifier"));
        assert!(enhanced.contains("found 'if'"));
    }

    #[test]
    fn test_shifted_moves_span() {
        let error = SyntaxError::missing_token(";", Span::empty(10)).shifted(-4);
        assert_eq!(error.span(), Span::empty(6));
    }
}
