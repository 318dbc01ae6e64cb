//! Order and disjointness of merged output

use super::error::ValidationError;
use crate::classification::{Category, ClassifiedSpan};

/// Check start order and that spans only overlap as a primary tag
/// followed by its static decoration on the same range
pub fn check_ordering(spans: &[ClassifiedSpan]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut furthest: Option<ClassifiedSpan> = None;
    let mut last_primary: Option<ClassifiedSpan> = None;

    for (index, current) in spans.iter().enumerate() {
        if let Some(previous) = index.checked_sub(1).map(|previous| spans[previous]) {
            if current.span.start < previous.span.start {
                errors.push(ValidationError::Unsorted {
                    span: current.span,
                    category: current.category,
                    previous: previous.span,
                });
            }
        }

        let is_decoration = current.category == Category::StaticSymbol
            && last_primary.is_some_and(|primary| primary.span == current.span);
        if !is_decoration {
            if let Some(other) = furthest.filter(|other| other.span.overlaps(&current.span)) {
                errors.push(ValidationError::Overlapping {
                    span: current.span,
                    category: current.category,
                    other: other.span,
                    other_category: other.category,
                });
            }
        }

        if current.category != Category::StaticSymbol {
            last_primary = Some(*current);
        }
        if furthest.map_or(true, |other| current.span.end > other.span.end) {
            furthest = Some(*current);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Span;
    use assert_matches::assert_matches;

    fn span(start: usize, end: usize, category: Category) -> ClassifiedSpan {
        ClassifiedSpan::new(Span::new(start, end), category)
    }

    #[test]
    fn test_static_pairing_allowed() {
        let spans = [
            span(0, 4, Category::ClassName),
            span(0, 4, Category::StaticSymbol),
            span(4, 5, Category::Operator),
        ];
        assert!(check_ordering(&spans).is_empty());
    }

    #[test]
    fn test_overlap_detected() {
        let spans = [span(0, 4, Category::String), span(2, 3, Category::RegexText)];
        assert_matches!(check_ordering(&spans).as_slice(), [ValidationError::Overlapping { .. }]);
    }

    #[test]
    fn test_static_on_different_range_is_overlap() {
        let spans = [span(0, 4, Category::ClassName), span(1, 4, Category::StaticSymbol)];
        assert_matches!(check_ordering(&spans).as_slice(), [ValidationError::Overlapping { .. }]);
    }

    #[test]
    fn test_unsorted_detected() {
        let spans = [span(5, 6, Category::Keyword), span(0, 1, Category::Keyword)];
        assert_matches!(check_ordering(&spans).as_slice(), [ValidationError::Unsorted { .. }]);
    }
}
