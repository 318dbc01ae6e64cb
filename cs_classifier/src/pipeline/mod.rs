//! Classification pipeline
//!
//! text -> lexical -> syntax -> classification (syntactic, semantic,
//! embedded, merge) -> optional output validation

mod error;
mod info;
pub mod output;
mod result;
mod stats;
mod validation;

pub use error::PipelineError;
pub use info::{get_pipeline_info, PipelineInfo};
pub use output::PipelineOutput;
pub use result::PipelineResult;
pub use stats::PipelineStats;
pub use validation::validate_pipeline;

use crate::classification::{classify_tree, ClassifiedSpan};
use crate::config::ClassifierOptions;
use crate::file_processor::FileProcessor;
use crate::logging;
use crate::utils::Span;
use std::path::PathBuf;
use std::time::Instant;

/// Classify `text`, restricted to `range` when given
pub fn classify(
    text: &str,
    range: Option<Span>,
    options: &ClassifierOptions,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();
    if let Some(range) = range {
        if range.start > range.end
            || range.end > text.len()
            || !text.is_char_boundary(range.start)
            || !text.is_char_boundary(range.end)
        {
            return Err(PipelineError::InvalidRange {
                range,
                len: text.len(),
            });
        }
    }

    crate::log_debug!("Starting classification pipeline",
        "bytes" => text.len(),
        "mode" => options.parse_mode.as_str(),
        "semantic" => options.semantic
    );

    let mut stats = PipelineStats {
        bytes: text.len(),
        ..PipelineStats::default()
    };

    let stage = Instant::now();
    let tokenized = crate::lexical::tokenize(text, options)?;
    stats.lex_ms = elapsed_ms(stage);
    stats.lexemes = tokenized.stream.len();

    let stage = Instant::now();
    let tree = crate::syntax::parse(tokenized.stream, options);
    stats.parse_ms = elapsed_ms(stage);
    stats.nodes = tree.node_count();

    let stage = Instant::now();
    let classification = classify_tree(&tree, range, options)?;
    stats.classify_ms = elapsed_ms(stage);

    if options.validate {
        let stage = Instant::now();
        crate::validation::validate_classifications(text, &classification)?;
        stats.validate_ms = elapsed_ms(stage);
    }

    stats.spans = classification.spans.len();
    stats.embedded_literals = classification.embedded.len();
    stats.binding = classification.binding;

    Ok(PipelineResult {
        spans: classification.spans,
        embedded: classification.embedded,
        lexical_diagnostics: tokenized.diagnostics,
        syntax_diagnostics: tree.diagnostics().to_vec(),
        file_metadata: None,
        parse_mode: options.parse_mode,
        stats,
        processing_duration: start_time.elapsed(),
    })
}

/// Classify `text` and return only the merged spans
pub fn classify_spans(
    text: &str,
    range: Option<Span>,
    options: &ClassifierOptions,
) -> Result<Vec<ClassifiedSpan>, PipelineError> {
    classify(text, range, options).map(|result| result.spans)
}

/// Read and classify one file. A `.csx` extension selects script mode
/// and `.cs` regular mode; other extensions keep `options.parse_mode`.
pub fn process_file(file_path: &str, options: &ClassifierOptions) -> Result<PipelineResult, PipelineError> {
    process_file_in_range(file_path, None, options)
}

/// [`process_file`] restricted to `range`
pub fn process_file_in_range(
    file_path: &str,
    range: Option<Span>,
    options: &ClassifierOptions,
) -> Result<PipelineResult, PipelineError> {
    logging::with_file_context(PathBuf::from(file_path), 0, || {
        crate::log_info!("Starting file classification", "file" => file_path);

        let file_result = FileProcessor::new().process_file(file_path)?;
        logging::record_file_source(&file_result.metadata.path, &file_result.source);

        let options = match file_result.metadata.parse_mode {
            Some(mode) => options.clone().with_parse_mode(mode),
            None => options.clone(),
        };

        let mut result = classify(&file_result.source, range, &options)?;
        result.processing_duration += file_result.processing_duration;
        result.file_metadata = Some(file_result.metadata);
        result.log_success(file_path);
        Ok(result)
    })
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Category;
    use crate::config::ParseMode;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_pipeline() {
        let _ = crate::logging::init_global_logging();
        assert!(validate_pipeline().is_ok());
    }

    #[test]
    fn test_classify_collects_stats() {
        let options = ClassifierOptions::regular().with_validation(true);
        let result = classify("class C { int f; }", None, &options).unwrap();
        assert_eq!(result.stats.spans, result.spans.len());
        assert!(result.stats.lexemes > result.spans.len());
        assert!(result.stats.binding.is_some());
        assert_eq!(result.diagnostic_count(), 0);
    }

    #[test]
    fn test_range_outside_text() {
        let error = classify("class C { }", Some(Span::new(4, 40)), &ClassifierOptions::regular()).unwrap_err();
        assert_matches!(error, PipelineError::InvalidRange { len: 11, .. });
    }

    #[test]
    fn test_range_inside_multibyte_char() {
        let text = "class C { string s = \"é\"; }";
        let inside = text.find('é').unwrap() + 1;
        let error = classify(text, Some(Span::new(inside, inside + 1)), &ClassifierOptions::regular()).unwrap_err();
        assert_matches!(error, PipelineError::InvalidRange { .. });
        assert!(classify(text, Some(Span::new(inside - 1, inside + 1)), &ClassifierOptions::regular()).is_ok());
    }

    #[test]
    fn test_range_restricts_output() {
        let spans = classify_spans("class C { }\nclass D { }", Some(Span::new(12, 23)), &ClassifierOptions::regular()).unwrap();
        assert!(spans.iter().all(|classified| classified.span.start >= 12));
        assert_eq!(spans[1].category, Category::ClassName);
    }

    #[test]
    fn test_script_file_uses_script_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.csx");
        fs::write(&path, "\u{feff}int x = 1;\nx++;\n").unwrap();

        let result = process_file(path.to_str().unwrap(), &ClassifierOptions::regular()).unwrap();
        assert_eq!(result.parse_mode, ParseMode::Script);
        let metadata = result.file_metadata.unwrap();
        assert!(metadata.had_bom);
        assert!(result
            .spans
            .iter()
            .any(|classified| classified.category == Category::FieldName));
    }

    #[test]
    fn test_missing_file() {
        let error = process_file("/nonexistent/Missing.cs", &ClassifierOptions::regular()).unwrap_err();
        assert_matches!(error, PipelineError::FileProcessing(_));
        assert!(!error.is_cancelled());
    }
}
