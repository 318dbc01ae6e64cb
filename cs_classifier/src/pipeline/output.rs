use super::PipelineResult;
use crate::classification::ClassifiedSpan;
use crate::config::ParseMode;
use serde::Serialize;

/// Serialisable view of one classified text
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub mode: ParseMode,
    pub spans: Vec<ClassifiedSpan>,
    pub diagnostics: usize,
}

impl PipelineOutput {
    pub fn new(file: Option<String>, result: &PipelineResult) -> Self {
        Self {
            file,
            mode: result.parse_mode,
            spans: result.spans.clone(),
            diagnostics: result.diagnostic_count(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierOptions;
    use crate::pipeline::classify;

    #[test]
    fn test_json_triples() {
        let result = classify("class C { }", None, &ClassifierOptions::regular()).unwrap();
        let output = PipelineOutput::new(None, &result);
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["mode"], "regular");
        assert!(value.get("file").is_none());
        assert_eq!(value["spans"][0], serde_json::json!({"start": 0, "length": 5, "tag": "keyword"}));
        assert_eq!(value["spans"][1], serde_json::json!({"start": 6, "length": 1, "tag": "class name"}));
    }
}
