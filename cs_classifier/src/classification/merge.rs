//! Merging the syntactic, semantic and embedded streams
//!
//! A semantic span replaces the syntactic span of the same lexeme. An
//! embedded literal replaces the string and escape spans of its host; the
//! parts of the host it leaves uncovered (delimiters, skipped text) keep
//! the host's string category.

use super::category::{sort_spans, Category, ClassifiedSpan};
use crate::embedded::EmbeddedLiteral;
use crate::utils::Span;
use std::collections::HashSet;

/// Combine the three streams into one sorted output limited to `range`
pub fn merge_classifications(
    syntactic: Vec<ClassifiedSpan>,
    semantic: Vec<ClassifiedSpan>,
    embedded: &[EmbeddedLiteral],
    range: Option<Span>,
) -> Vec<ClassifiedSpan> {
    let replaced: HashSet<Span> = semantic.iter().map(|classified| classified.span).collect();
    let mut merged: Vec<ClassifiedSpan> = syntactic
        .into_iter()
        .filter(|classified| !replaced.contains(&classified.span))
        .collect();
    merged.extend(semantic);

    for literal in embedded {
        replace_host(&mut merged, literal);
    }

    if let Some(range) = range {
        merged.retain(|classified| range.intersects(&classified.span));
    }
    sort_spans(&mut merged);
    merged
}

fn replace_host(merged: &mut Vec<ClassifiedSpan>, literal: &EmbeddedLiteral) {
    let mut host = Category::String;
    merged.retain(|classified| {
        let inside = literal.literal.contains_span(&classified.span) && classified.category.is_string();
        if inside && classified.category == Category::VerbatimString {
            host = Category::VerbatimString;
        }
        !inside
    });

    let mut inner: Vec<Span> = literal.spans.iter().map(|classified| classified.span).collect();
    inner.sort();
    let mut cursor = literal.literal.start;
    for span in inner {
        if span.start > cursor {
            merged.push(ClassifiedSpan::new(Span::new(cursor, span.start), host));
        }
        cursor = cursor.max(span.end);
    }
    if cursor < literal.literal.end {
        merged.push(ClassifiedSpan::new(Span::new(cursor, literal.literal.end), host));
    }
    merged.extend(literal.spans.iter().copied());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::{DetectionSource, EmbeddedLanguage};

    fn span(start: usize, end: usize, category: Category) -> ClassifiedSpan {
        ClassifiedSpan::new(Span::new(start, end), category)
    }

    #[test]
    fn test_semantic_replaces_syntactic() {
        let syntactic = vec![span(0, 5, Category::Keyword), span(6, 7, Category::ClassName), span(8, 9, Category::Identifier)];
        let semantic = vec![span(8, 9, Category::FieldName), span(8, 9, Category::StaticSymbol)];
        let merged = merge_classifications(syntactic, semantic, &[], None);
        assert_eq!(
            merged,
            vec![
                span(0, 5, Category::Keyword),
                span(6, 7, Category::ClassName),
                span(8, 9, Category::FieldName),
                span(8, 9, Category::StaticSymbol),
            ]
        );
    }

    #[test]
    fn test_embedded_replaces_host_and_fills_gaps() {
        // @"^a$" at 0..6
        let syntactic = vec![span(0, 6, Category::VerbatimString), span(6, 7, Category::Punctuation)];
        let literal = EmbeddedLiteral {
            token: 0,
            literal: Span::new(0, 6),
            content: Span::new(2, 5),
            language: EmbeddedLanguage::Regex,
            source: DetectionSource::Comment,
            spans: vec![span(2, 3, Category::RegexAnchor), span(3, 4, Category::RegexText), span(4, 5, Category::RegexAnchor)],
            errors: 0,
        };
        let merged = merge_classifications(syntactic, Vec::new(), &[literal], None);
        assert_eq!(
            merged,
            vec![
                span(0, 2, Category::VerbatimString),
                span(2, 3, Category::RegexAnchor),
                span(3, 4, Category::RegexText),
                span(4, 5, Category::RegexAnchor),
                span(5, 6, Category::VerbatimString),
                span(6, 7, Category::Punctuation),
            ]
        );
    }

    #[test]
    fn test_embedded_drops_escape_spans() {
        // "\d" at 0..4 with an escape at 1..3
        let syntactic = vec![span(0, 1, Category::String), span(1, 3, Category::StringEscape), span(3, 4, Category::String)];
        let literal = EmbeddedLiteral {
            token: 0,
            literal: Span::new(0, 4),
            content: Span::new(1, 3),
            language: EmbeddedLanguage::Regex,
            source: DetectionSource::StringSyntax,
            spans: vec![span(1, 2, Category::RegexCharacterClass), span(2, 3, Category::RegexCharacterClass)],
            errors: 0,
        };
        let merged = merge_classifications(syntactic, Vec::new(), &[literal], None);
        assert_eq!(
            merged,
            vec![
                span(0, 1, Category::String),
                span(1, 2, Category::RegexCharacterClass),
                span(2, 3, Category::RegexCharacterClass),
                span(3, 4, Category::String),
            ]
        );
    }

    #[test]
    fn test_range_filter() {
        let syntactic = vec![span(0, 5, Category::Keyword), span(6, 7, Category::ClassName), span(8, 9, Category::Punctuation)];
        let merged = merge_classifications(syntactic, Vec::new(), &[], Some(Span::new(6, 7)));
        assert_eq!(merged, vec![span(6, 7, Category::ClassName)]);
    }
}
