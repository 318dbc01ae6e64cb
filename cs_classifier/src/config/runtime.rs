// RUNTIME PREFERENCES (User Experience)

use crate::logging::events::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// How top-level code is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Ordinary compilation unit; top-level statements declare true locals
    #[default]
    Regular,
    /// Interactive/script submission; top-level members belong to the
    /// implicit `Script` class and a leading shebang is a comment
    Script,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Regular => "regular",
            ParseMode::Script => "script",
        }
    }
}

fn parse_parse_mode(value: &str) -> Option<ParseMode> {
    match value.to_lowercase().as_str() {
        "regular" | "library" => Some(ParseMode::Regular),
        "script" | "interactive" => Some(ParseMode::Script),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPreferences {
    /// Default parse mode when the file extension does not decide it
    pub parse_mode: ParseMode,

    /// Conditional compilation symbols defined before the first line
    pub preprocessor_symbols: Vec<String>,

    /// Whether to run the binder-driven semantic pass
    pub enable_semantic_pass: bool,

    /// Whether to verify output invariants after every request
    pub validate_output: bool,
}

impl Default for ClassifierPreferences {
    fn default() -> Self {
        Self {
            parse_mode: env::var(env_vars::PARSE_MODE)
                .ok()
                .and_then(|v| parse_parse_mode(&v))
                .unwrap_or_default(),
            preprocessor_symbols: env::var(env_vars::PREPROCESSOR_SYMBOLS)
                .ok()
                .map(|v| split_symbol_list(&v))
                .unwrap_or_default(),
            enable_semantic_pass: env::var(env_vars::ENABLE_SEMANTIC_PASS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            validate_output: env::var(env_vars::VALIDATE_OUTPUT)
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(cfg!(debug_assertions)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedPreferences {
    /// Whether regex literals are sub-classified
    pub enable_regex: bool,

    /// Whether JSON literals are sub-classified
    pub enable_json: bool,

    /// Whether untagged verbatim/raw literals that look like JSON are
    /// sub-classified
    pub detect_probable_json: bool,

    /// Whether untagged verbatim/raw literals with strong regex structure
    /// are sub-classified
    pub detect_probable_regex: bool,

    /// Whether JSON detected without an explicit `strict` option is
    /// treated as strict RFC 8259
    pub strict_json_by_default: bool,
}

impl Default for EmbeddedPreferences {
    fn default() -> Self {
        Self {
            enable_regex: env::var(env_vars::EMBEDDED_ENABLE_REGEX)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            enable_json: env::var(env_vars::EMBEDDED_ENABLE_JSON)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            detect_probable_json: env::var(env_vars::EMBEDDED_PROBABLE_JSON)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            detect_probable_regex: env::var(env_vars::EMBEDDED_PROBABLE_REGEX)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            strict_json_by_default: env::var(env_vars::EMBEDDED_STRICT_JSON)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPreferences {
    /// Worker threads used for directory classification (0 = auto)
    pub max_threads: usize,

    /// Whether to descend into subdirectories
    pub recursive: bool,

    /// Stop at the first file that fails
    pub fail_fast: bool,

    /// Print per-file progress lines
    pub progress_reporting: bool,
}

impl Default for BatchPreferences {
    fn default() -> Self {
        Self {
            max_threads: env::var(env_vars::BATCH_MAX_THREADS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            recursive: env::var(env_vars::BATCH_RECURSIVE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            fail_fast: env::var(env_vars::BATCH_FAIL_FAST)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            progress_reporting: env::var(env_vars::BATCH_PROGRESS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Emit one JSON object per event instead of human-readable lines
    pub use_structured_logging: bool,

    /// Whether the console sink is installed at all
    pub enable_console_logging: bool,

    /// Minimum level that reaches the sinks
    pub min_log_level: LogLevel,

    /// Whether console lines carry a timestamp
    pub include_timestamps: bool,

    /// Whether to print the cargo-style summary after batch runs
    pub enable_cargo_style_output: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOG_FORMAT)
                .ok()
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOG_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOG_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_timestamps: env::var(env_vars::LOG_TIMESTAMPS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_cargo_style_output: env::var(env_vars::LOG_CARGO_STYLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_symbol_list(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Failure to load a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub classifier: ClassifierPreferences,
    pub embedded: EmbeddedPreferences,
    pub batch: BatchPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML document. Missing tables and keys keep their
    /// environment-derived defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a TOML configuration file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

}

/// Environment variable names for configuration
pub mod env_vars {
    // Classifier
    pub const PARSE_MODE: &str = "CSC_PARSE_MODE";
    pub const PREPROCESSOR_SYMBOLS: &str = "CSC_PREPROCESSOR_SYMBOLS";
    pub const ENABLE_SEMANTIC_PASS: &str = "CSC_ENABLE_SEMANTIC_PASS";
    pub const VALIDATE_OUTPUT: &str = "CSC_VALIDATE";

    // Embedded languages
    pub const EMBEDDED_ENABLE_REGEX: &str = "CSC_EMBEDDED_REGEX";
    pub const EMBEDDED_ENABLE_JSON: &str = "CSC_EMBEDDED_JSON";
    pub const EMBEDDED_PROBABLE_JSON: &str = "CSC_EMBEDDED_PROBABLE_JSON";
    pub const EMBEDDED_PROBABLE_REGEX: &str = "CSC_EMBEDDED_PROBABLE_REGEX";
    pub const EMBEDDED_STRICT_JSON: &str = "CSC_EMBEDDED_STRICT_JSON";

    // Batch
    pub const BATCH_MAX_THREADS: &str = "CSC_BATCH_MAX_THREADS";
    pub const BATCH_RECURSIVE: &str = "CSC_BATCH_RECURSIVE";
    pub const BATCH_FAIL_FAST: &str = "CSC_BATCH_FAIL_FAST";
    pub const BATCH_PROGRESS: &str = "CSC_BATCH_PROGRESS";

    // Logging
    pub const LOG_LEVEL: &str = "CSC_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "CSC_LOG_FORMAT";
    pub const LOG_CONSOLE: &str = "CSC_LOG_CONSOLE";
    pub const LOG_TIMESTAMPS: &str = "CSC_LOG_TIMESTAMPS";
    pub const LOG_CARGO_STYLE: &str = "CSC_LOG_CARGO_STYLE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("2"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("invalid"), None);
    }

    #[test]
    fn test_parse_mode_parsing() {
        assert_eq!(parse_parse_mode("Script"), Some(ParseMode::Script));
        assert_eq!(parse_parse_mode("regular"), Some(ParseMode::Regular));
        assert_eq!(parse_parse_mode("other"), None);
    }

    #[test]
    fn test_symbol_list_split() {
        assert_eq!(
            split_symbol_list("DEBUG; TRACE,,NET8"),
            vec!["DEBUG".to_string(), "TRACE".to_string(), "NET8".to_string()]
        );
    }

    #[test]
    fn test_toml_overrides_keep_other_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [classifier]
            parse_mode = "script"
            preprocessor_symbols = ["DEBUG"]

            [embedded]
            detect_probable_regex = false
            "#,
        )
        .unwrap();

        assert_eq!(config.classifier.parse_mode, ParseMode::Script);
        assert_eq!(config.classifier.preprocessor_symbols, vec!["DEBUG"]);
        assert!(!config.embedded.detect_probable_regex);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        assert!(RuntimeConfig::from_toml_str("[classifier\nparse_mode = 1").is_err());
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = RuntimeConfig::load_from_file(Path::new("/definitely/not/here.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
