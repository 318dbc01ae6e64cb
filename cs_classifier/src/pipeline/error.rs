use crate::classification::ClassificationError;
use crate::file_processor::FileProcessorError;
use crate::lexical::LexerError;
use crate::logging::{codes, Code};
use crate::reference_resolution::BindingError;
use crate::utils::Span;
use crate::validation::ValidationError;

/// Pipeline processing errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File processing failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    #[error("Lexical analysis failed: {0}")]
    LexicalAnalysis(#[from] LexerError),

    #[error("Binding failed: {0}")]
    Binding(#[from] BindingError),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Output validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Change {span} does not fit text of length {len}")]
    InvalidChange { span: Span, len: usize },

    #[error("Requested range {range} does not fit text of length {len}")]
    InvalidRange { range: Span, len: usize },
}

impl PipelineError {
    /// Whether the request was cancelled rather than failed
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Binding(error) => error.is_cancelled(),
            Self::Classification(error) => error.is_cancelled(),
            _ => false,
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::FileProcessing(error) => error.error_code(),
            Self::LexicalAnalysis(error) => error.error_code(),
            Self::Binding(error) => error.error_code(),
            Self::Classification(error) => error.error_code(),
            Self::Validation(error) => error.error_code(),
            Self::InvalidChange { .. } | Self::InvalidRange { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinguishable() {
        let cancelled: PipelineError = ClassificationError::cancelled("merge").into();
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.error_code(), codes::classification::CANCELLED);

        let too_large: PipelineError = LexerError::InputTooLarge { size: 10, max: 5 }.into();
        assert!(!too_large.is_cancelled());
        assert_eq!(too_large.error_code(), codes::lexical::INPUT_TOO_LARGE);
    }
}
