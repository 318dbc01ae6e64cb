//! Executes one `csclassify` invocation

use crate::args::{Cli, OutputFormat};
use crate::report;
use cs_classifier::batch::{self, BatchConfig};
use cs_classifier::config::{ClassifierOptions, ParseMode, RuntimeConfig};
use cs_classifier::pipeline::{self, PipelineOutput};
use cs_classifier::{log_error, log_info, logging};
use std::error::Error;
use std::io::Read;
use std::path::Path;

/// What the process should report once output is written
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub failures: usize,
}

/// Load the runtime configuration named on the command line, if any
pub fn load_config(cli: &Cli) -> Result<RuntimeConfig, Box<dyn Error>> {
    match &cli.config {
        Some(path) => Ok(RuntimeConfig::load_from_file(path)?),
        None => Ok(RuntimeConfig::default()),
    }
}

/// Command line flags layered over the runtime configuration
pub fn classifier_options(cli: &Cli, config: &RuntimeConfig) -> ClassifierOptions {
    let mut options = ClassifierOptions::from_runtime(config);
    if cli.script {
        options = options.with_parse_mode(ParseMode::Script);
    }
    for symbol in &cli.defines {
        options = options.with_symbol(symbol.clone());
    }
    if cli.no_semantic {
        options = options.with_semantic(false);
    }
    if cli.validate {
        options = options.with_validation(true);
    }
    options
}

pub fn batch_config(cli: &Cli, config: &RuntimeConfig, options: ClassifierOptions) -> BatchConfig {
    let threads = match (cli.threads, config.batch.max_threads) {
        (Some(threads), _) => threads,
        (None, 0) => num_cpus::get(),
        (None, configured) => configured,
    };
    BatchConfig::from_preferences(&config.batch, options)
        .with_threads(threads)
        .with_recursive(cli.recursive || config.batch.recursive)
        .with_fail_fast(cli.fail_fast || config.batch.fail_fast)
}

/// Classify every input and write the rendered result to `out`
pub fn run(cli: &Cli, out: &mut dyn std::io::Write) -> Result<RunSummary, Box<dyn Error>> {
    let config = load_config(cli)?;
    let options = classifier_options(cli, &config);

    let single_input = cli.paths.len() == 1 && !cli.paths[0].is_dir();
    if cli.range.is_some() && !single_input {
        return Err("--range needs exactly one input file".into());
    }

    let (outputs, summary) = if cli.paths.len() == 1 && cli.paths[0] == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        let result = pipeline::classify(&text, cli.range, &options)?;
        (vec![PipelineOutput::new(None, &result)], RunSummary { files: 1, failures: 0 })
    } else if single_input {
        let path = cli.paths[0].to_string_lossy();
        let result = pipeline::process_file_in_range(&path, cli.range, &options)?;
        (
            vec![PipelineOutput::new(Some(path.into_owned()), &result)],
            RunSummary { files: 1, failures: 0 },
        )
    } else {
        classify_many(cli, &config, options)?
    };

    let rendered = match cli.format {
        OutputFormat::Text => report::render_text(&outputs),
        OutputFormat::Json => report::render_json(&outputs)? + "\n",
    };
    out.write_all(rendered.as_bytes())?;

    if summary.failures > 0 && config.logging.enable_cargo_style_output {
        logging::print_cargo_style_summary();
    }
    Ok(summary)
}

fn classify_many(
    cli: &Cli,
    config: &RuntimeConfig,
    options: ClassifierOptions,
) -> Result<(Vec<PipelineOutput>, RunSummary), Box<dyn Error>> {
    let batch_config = batch_config(cli, config, options);
    let files = batch::collect_inputs(&cli.paths, &batch_config)?;
    log_info!("Classifying inputs", "files" => files.len(), "threads" => batch_config.max_threads);

    let results = batch::process_files(files, &batch_config)?;
    for (path, error) in &results.failed_files {
        log_error!(error.error_code(), "Input could not be classified",
            "file" => path.display(),
            "error" => error
        );
        eprintln!("error: {}: {}", path.display(), error);
    }
    eprintln!("{}", results.summary());

    let outputs = results
        .successful_files
        .iter()
        .map(|(path, result)| PipelineOutput::new(Some(path.display().to_string()), result))
        .collect();
    Ok((
        outputs,
        RunSummary {
            files: results.files_processed,
            failures: results.failure_count(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("csclassify").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("csclassify.toml");
        fs::write(&config_path, "[classifier]\nenable_semantic_pass = true\npreprocessor_symbols = [\"A\"]\n").unwrap();

        let parsed = cli(&["x.cs", "--config", config_path.to_str().unwrap(), "--no-semantic", "-D", "B", "--script"]);
        let config = load_config(&parsed).unwrap();
        let options = classifier_options(&parsed, &config);
        assert!(!options.semantic);
        assert!(options.is_script());
        assert!(options.preprocessor_symbols.contains("A"));
        assert!(options.preprocessor_symbols.contains("B"));
    }

    #[test]
    fn test_single_file_text_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("A.cs");
        fs::write(&path, "class A { }\nclass B { }\n").unwrap();

        let mut out = Vec::new();
        let summary = run(&cli(&[path.to_str().unwrap(), "--range", "12..23"]), &mut out).unwrap();
        assert_eq!(summary, RunSummary { files: 1, failures: 0 });
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next(), Some("12 5 keyword"));
        assert!(text.contains("18 1 class name"));
    }

    #[test]
    fn test_directory_json_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("A.cs"), "class A { }").unwrap();
        fs::write(dir.path().join("B.csx"), "var b = 1;").unwrap();

        let mut out = Vec::new();
        let summary = run(&cli(&[dir.path().to_str().unwrap(), "--format", "json", "--threads", "2"]), &mut out).unwrap();
        assert_eq!(summary.files, 2);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let files = value.as_array().unwrap();
        assert_eq!(files[1]["mode"], "script");
    }

    #[test]
    fn test_range_needs_single_file() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        assert!(run(&cli(&[dir.path().to_str().unwrap(), "--range", "0..1"]), &mut out).is_err());
    }

    #[test]
    fn test_thread_default() {
        let parsed = cli(&["src"]);
        let mut config = RuntimeConfig::default();
        config.batch.max_threads = 0;
        let batch = batch_config(&parsed, &config, ClassifierOptions::regular());
        assert_eq!(batch.max_threads, num_cpus::get());
    }
}
