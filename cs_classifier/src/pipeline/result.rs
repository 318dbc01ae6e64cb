use super::stats::PipelineStats;
use crate::classification::ClassifiedSpan;
use crate::config::ParseMode;
use crate::embedded::EmbeddedLiteral;
use crate::file_processor::FileMetadata;
use crate::lexical::LexicalDiagnostic;
use crate::syntax::SyntaxError;
use std::time::Duration;

/// Complete result of classifying one text
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Merged output, sorted by start
    pub spans: Vec<ClassifiedSpan>,
    pub embedded: Vec<EmbeddedLiteral>,
    pub lexical_diagnostics: Vec<LexicalDiagnostic>,
    pub syntax_diagnostics: Vec<SyntaxError>,
    /// Present when the text came from a file
    pub file_metadata: Option<FileMetadata>,
    pub parse_mode: ParseMode,
    pub stats: PipelineStats,
    pub processing_duration: Duration,
}

impl PipelineResult {
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.lexical_diagnostics.len() + self.syntax_diagnostics.len()
    }

    pub fn log_success(&self, file_path: &str) {
        let seconds = self.processing_duration.as_secs_f64();
        crate::log_success!(
            crate::logging::codes::success::CLASSIFICATION_COMPLETE,
            "File classification succeeded",
            "file" => file_path,
            "spans" => self.spans.len(),
            "diagnostics" => self.diagnostic_count(),
            "duration_ms" => format!("{:.2}", seconds * 1000.0),
            "processing_rate_bytes_per_sec" => format!("{:.0}",
                if seconds > 0.0 { self.stats.bytes as f64 / seconds } else { 0.0 })
        );
    }
}
