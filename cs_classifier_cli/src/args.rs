//! Command line arguments

use clap::{Parser, ValueEnum};
use cs_classifier::utils::Span;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "csclassify",
    version,
    about = "Classify C# source text into semantic token spans"
)]
pub struct Cli {
    /// Files or directories to classify; `-` reads standard input
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Parse as a script when the extension does not decide it
    #[arg(long)]
    pub script: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only report spans intersecting START..END (single input only)
    #[arg(long, value_parser = parse_range)]
    pub range: Option<Span>,

    /// Define a conditional compilation symbol
    #[arg(long = "define", short = 'D', value_name = "SYMBOL")]
    pub defines: Vec<String>,

    /// Skip binding; report syntactic categories only
    #[arg(long)]
    pub no_semantic: bool,

    /// Check output invariants before printing
    #[arg(long)]
    pub validate: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads for directories (defaults to the CPU count)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Descend into subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Log level forwarded to the `log` facade (error, warn, info, debug)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `start length tag` line per span
    Text,
    /// One JSON document per run
    Json,
}

/// Parse `START..END` into a span
pub fn parse_range(value: &str) -> Result<Span, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{}'", value))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid range start '{}': {}", start, e))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid range end '{}': {}", end, e))?;
    if start > end {
        return Err(format!("range start {} is after end {}", start, end));
    }
    Ok(Span::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("4..10"), Ok(Span::new(4, 10)));
        assert_eq!(parse_range("3..3"), Ok(Span::new(3, 3)));
        assert!(parse_range("10..4").is_err());
        assert!(parse_range("4-10").is_err());
        assert!(parse_range("a..3").is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "csclassify", "a.cs", "src", "--define", "DEBUG", "-D", "TRACE", "--format", "json",
            "--range", "0..5", "--no-semantic", "--threads", "2", "--fail-fast",
        ])
        .unwrap();
        assert_eq!(cli.paths.len(), 2);
        assert_eq!(cli.defines, vec!["DEBUG", "TRACE"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.range, Some(Span::new(0, 5)));
        assert!(cli.no_semantic && cli.fail_fast && !cli.recursive);
        assert_eq!(cli.threads, Some(2));
    }

    #[test]
    fn test_paths_required() {
        assert!(Cli::try_parse_from(["csclassify"]).is_err());
    }
}
