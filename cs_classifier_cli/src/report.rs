//! Rendering of classification results

use cs_classifier::pipeline::PipelineOutput;
use std::fmt::Write;

/// One `start length tag` line per span, preceded by a `==> file <==`
/// header when several inputs are printed
pub fn render_text(outputs: &[PipelineOutput]) -> String {
    let mut text = String::new();
    let headers = outputs.len() > 1;
    for output in outputs {
        if headers {
            let _ = writeln!(text, "==> {} <==", output.file.as_deref().unwrap_or("-"));
        }
        for classified in &output.spans {
            let _ = writeln!(
                text,
                "{} {} {}",
                classified.span.start,
                classified.span.len(),
                classified.category
            );
        }
    }
    text
}

/// A single object for one input, an array otherwise
pub fn render_json(outputs: &[PipelineOutput]) -> Result<String, serde_json::Error> {
    match outputs {
        [single] => single.to_json_pretty(),
        _ => serde_json::to_string_pretty(outputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_classifier::config::ClassifierOptions;
    use cs_classifier::pipeline::classify;

    fn output(file: &str, text: &str) -> PipelineOutput {
        let result = classify(text, None, &ClassifierOptions::regular()).unwrap();
        PipelineOutput::new(Some(file.to_string()), &result)
    }

    #[test]
    fn test_text_lines() {
        let rendered = render_text(&[output("A.cs", "class A { }")]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "0 5 keyword");
        assert_eq!(lines[1], "6 1 class name");
    }

    #[test]
    fn test_headers_for_several_files() {
        let rendered = render_text(&[output("A.cs", "class A { }"), output("B.cs", "class B { }")]);
        assert!(rendered.starts_with("==> A.cs <==\n"));
        assert!(rendered.contains("==> B.cs <==\n"));
    }

    #[test]
    fn test_json_shape() {
        let single: serde_json::Value = serde_json::from_str(&render_json(&[output("A.cs", "class A { }")]).unwrap()).unwrap();
        assert_eq!(single["file"], "A.cs");
        let several: serde_json::Value =
            serde_json::from_str(&render_json(&[output("A.cs", "class A { }"), output("B.cs", "int x;")]).unwrap()).unwrap();
        assert_eq!(several.as_array().map(Vec::len), Some(2));
    }
}
