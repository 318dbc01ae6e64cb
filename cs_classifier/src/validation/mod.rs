//! Output validation
//!
//! Checks the merged classification of one text against the output
//! invariants: start order, disjointness apart from static decorations,
//! spans inside the text and embedded spans inside their host literal.
//! A failure here is an engine defect, reported as an invariant violation.

pub mod containment;
pub mod error;
pub mod ordering;

pub use error::{ValidationError, ValidationResult};

use crate::classification::Classification;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::time::Instant;

/// Validation metrics
#[derive(Debug, Clone, Default)]
pub struct ValidationMetrics {
    pub total_duration_ms: f64,
    pub spans_checked: usize,
    pub embedded_spans_checked: usize,
    pub errors_detected: usize,
}

/// Validate `classification` of `text`; the first violation is returned
/// after all of them have been logged
pub fn validate_classifications(text: &str, classification: &Classification) -> ValidationResult<ValidationMetrics> {
    let start_time = Instant::now();
    let mut metrics = ValidationMetrics {
        spans_checked: classification.spans.len(),
        embedded_spans_checked: classification.embedded.iter().map(|literal| literal.spans.len()).sum(),
        ..ValidationMetrics::default()
    };

    log_debug!("Validating classification output",
        "spans" => metrics.spans_checked,
        "embedded_spans" => metrics.embedded_spans_checked
    );

    let mut errors = ordering::check_ordering(&classification.spans);
    errors.extend(containment::check_in_text(&classification.spans, text.len()));
    errors.extend(containment::check_embedded_hosts(&classification.embedded));

    metrics.total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    metrics.errors_detected = errors.len();

    if errors.is_empty() {
        log_success!(codes::success::VALIDATION_PASSED,
            "Classification output validated",
            "spans" => metrics.spans_checked,
            "duration_ms" => format!("{:.3}", metrics.total_duration_ms)
        );
        return Ok(metrics);
    }

    for error in &errors {
        log_error!(error.error_code(), &error.to_string(),
            span = error.span(),
            "error_type" => error.error_type()
        );
    }
    log_error!(codes::system::INVARIANT_VIOLATION,
        "Classification output violates its invariants",
        "errors" => errors.len()
    );
    Err(errors.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{classify_tree, Category, ClassifiedSpan};
    use crate::config::ClassifierOptions;
    use crate::lexical::tokenize;
    use crate::syntax::parse;
    use crate::utils::Span;
    use assert_matches::assert_matches;

    fn classification_of(text: &str) -> Classification {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize(text, &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        classify_tree(&tree, None, &options).unwrap()
    }

    #[test]
    fn test_engine_output_is_valid() {
        let text = "using System;\n/// <summary>S &amp; T</summary>\nstatic class C {\n    const int K = 1;\n    // lang=json\n    static string J = @\"{ \"\"a\"\": [1, 2] }\";\n    static void M() { Console.WriteLine(K); }\n}\n#if DEBUG\nint x;\n#endif\n";
        let classification = classification_of(text);
        let metrics = validate_classifications(text, &classification).unwrap();
        assert_eq!(metrics.errors_detected, 0);
        assert!(metrics.embedded_spans_checked > 0);
    }

    #[test]
    fn test_first_violation_returned() {
        let mut classification = classification_of("class C { }");
        classification.spans.push(ClassifiedSpan::new(Span::new(0, 40), Category::Comment));
        assert_matches!(
            validate_classifications("class C { }", &classification),
            Err(ValidationError::Overlapping { .. } | ValidationError::Unsorted { .. })
        );
    }
}
