use crate::config::constants::compile_time::file_processing::{
    MAX_FILE_SIZE, REGULAR_EXTENSIONS, SCRIPT_EXTENSIONS,
};
use crate::embedded::EmbeddedLanguage;

/// Information about pipeline capabilities
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    pub stages: Vec<&'static str>,
    pub max_file_size: u64,
    pub regular_extensions: Vec<&'static str>,
    pub script_extensions: Vec<&'static str>,
    pub embedded_languages: Vec<&'static str>,
    pub supports_incremental: bool,
    pub supports_cancellation: bool,
}

impl PipelineInfo {
    pub fn report(&self) -> String {
        format!(
            "C# Classification Pipeline:\n\
             - Stages: {}\n\
             - Max File Size: {} MB\n\
             - Regular Extensions: {}\n\
             - Script Extensions: {}\n\
             - Embedded Languages: {}\n\
             - Incremental Sessions: {}\n\
             - Cancellation: {}",
            self.stages.join(" -> "),
            self.max_file_size / (1024 * 1024),
            self.regular_extensions.join(", "),
            self.script_extensions.join(", "),
            self.embedded_languages.join(", "),
            self.supports_incremental,
            self.supports_cancellation
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "{}-stage C# classifier for {} and {} files",
            self.stages.len(),
            self.regular_extensions.join(", "),
            self.script_extensions.join(", ")
        )
    }
}

/// Get pipeline capabilities information
pub fn get_pipeline_info() -> PipelineInfo {
    PipelineInfo {
        stages: vec![
            "lexical",
            "syntax",
            "syntactic classification",
            "binding",
            "semantic classification",
            "embedded languages",
            "merge",
            "validation",
        ],
        max_file_size: MAX_FILE_SIZE,
        regular_extensions: REGULAR_EXTENSIONS.to_vec(),
        script_extensions: SCRIPT_EXTENSIONS.to_vec(),
        embedded_languages: vec![EmbeddedLanguage::Regex.as_str(), EmbeddedLanguage::Json.as_str()],
        supports_incremental: true,
        supports_cancellation: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_names_extensions() {
        let info = get_pipeline_info();
        assert!(info.summary().contains("cs"));
        assert!(info.report().contains("Max File Size: 16 MB"));
    }
}
