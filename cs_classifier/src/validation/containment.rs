//! Range checks: spans inside the text, embedded spans inside their host

use super::error::ValidationError;
use crate::classification::ClassifiedSpan;
use crate::embedded::EmbeddedLiteral;

pub fn check_in_text(spans: &[ClassifiedSpan], text_len: usize) -> Vec<ValidationError> {
    spans
        .iter()
        .filter(|classified| classified.span.start > classified.span.end || classified.span.end > text_len)
        .map(|classified| ValidationError::OutOfRange {
            span: classified.span,
            category: classified.category,
            len: text_len,
        })
        .collect()
}

pub fn check_embedded_hosts(literals: &[EmbeddedLiteral]) -> Vec<ValidationError> {
    literals
        .iter()
        .flat_map(|literal| {
            literal
                .spans
                .iter()
                .filter(|classified| !literal.content.contains_span(&classified.span))
                .map(|classified| ValidationError::OutsideHost {
                    span: classified.span,
                    category: classified.category,
                    host: literal.literal,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Category;
    use crate::embedded::{DetectionSource, EmbeddedLanguage};
    use crate::utils::Span;

    #[test]
    fn test_span_past_end() {
        let spans = [ClassifiedSpan::new(Span::new(0, 3), Category::Keyword), ClassifiedSpan::new(Span::new(3, 9), Category::Identifier)];
        let errors = check_in_text(&spans, 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span(), Span::new(3, 9));
    }

    #[test]
    fn test_embedded_span_on_delimiter() {
        let literal = EmbeddedLiteral {
            token: 0,
            literal: Span::new(0, 6),
            content: Span::new(2, 5),
            language: EmbeddedLanguage::Json,
            source: DetectionSource::Probable,
            spans: vec![
                ClassifiedSpan::new(Span::new(2, 3), Category::JsonPunctuation),
                ClassifiedSpan::new(Span::new(5, 6), Category::JsonPunctuation),
            ],
            errors: 0,
        };
        let errors = check_embedded_hosts(&[literal]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span(), Span::new(5, 6));
    }
}
