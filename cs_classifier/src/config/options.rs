//! Per-request classifier options
//!
//! `ClassifierOptions` is passed explicitly into tokenize, parse, bind and
//! classify. Nothing in the engine reads process-wide configuration.

use super::runtime::{ClassifierPreferences, EmbeddedPreferences, ParseMode, RuntimeConfig};
use crate::classification::CancellationToken;
use std::collections::BTreeSet;

/// Switches for regex and JSON sub-classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedOptions {
    pub enable_regex: bool,
    pub enable_json: bool,
    pub detect_probable_json: bool,
    pub detect_probable_regex: bool,
    pub strict_json_by_default: bool,
}

impl Default for EmbeddedOptions {
    fn default() -> Self {
        Self {
            enable_regex: true,
            enable_json: true,
            detect_probable_json: true,
            detect_probable_regex: true,
            strict_json_by_default: false,
        }
    }
}

impl From<&EmbeddedPreferences> for EmbeddedOptions {
    fn from(preferences: &EmbeddedPreferences) -> Self {
        Self {
            enable_regex: preferences.enable_regex,
            enable_json: preferences.enable_json,
            detect_probable_json: preferences.detect_probable_json,
            detect_probable_regex: preferences.detect_probable_regex,
            strict_json_by_default: preferences.strict_json_by_default,
        }
    }
}

impl EmbeddedOptions {
    /// No embedded classification at all
    pub fn disabled() -> Self {
        Self {
            enable_regex: false,
            enable_json: false,
            detect_probable_json: false,
            detect_probable_regex: false,
            strict_json_by_default: false,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.enable_regex || self.enable_json
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    pub parse_mode: ParseMode,
    /// Symbols defined before the first line, as if by `#define`
    pub preprocessor_symbols: BTreeSet<String>,
    pub semantic: bool,
    pub embedded: EmbeddedOptions,
    /// Check output invariants before returning
    pub validate: bool,
    pub cancellation: CancellationToken,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::Regular,
            preprocessor_symbols: BTreeSet::new(),
            semantic: true,
            embedded: EmbeddedOptions::default(),
            validate: cfg!(debug_assertions),
            cancellation: CancellationToken::new(),
        }
    }
}

impl ClassifierOptions {
    pub fn regular() -> Self {
        Self::default()
    }

    pub fn script() -> Self {
        Self::default().with_parse_mode(ParseMode::Script)
    }

    /// Build options from loaded runtime preferences
    pub fn from_runtime(config: &RuntimeConfig) -> Self {
        Self::from_preferences(&config.classifier, &config.embedded)
    }

    pub fn from_preferences(
        classifier: &ClassifierPreferences,
        embedded: &EmbeddedPreferences,
    ) -> Self {
        Self {
            parse_mode: classifier.parse_mode,
            preprocessor_symbols: classifier.preprocessor_symbols.iter().cloned().collect(),
            semantic: classifier.enable_semantic_pass,
            embedded: EmbeddedOptions::from(embedded),
            validate: classifier.validate_output,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.preprocessor_symbols.insert(symbol.into());
        self
    }

    pub fn with_semantic(mut self, enabled: bool) -> Self {
        self.semantic = enabled;
        self
    }

    pub fn with_embedded(mut self, embedded: EmbeddedOptions) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn is_script(&self) -> bool {
        self.parse_mode == ParseMode::Script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let options = ClassifierOptions::script()
            .with_symbol("DEBUG")
            .with_semantic(false)
            .with_embedded(EmbeddedOptions::disabled());

        assert!(options.is_script());
        assert!(options.preprocessor_symbols.contains("DEBUG"));
        assert!(!options.semantic);
        assert!(!options.embedded.any_enabled());
    }

    #[test]
    fn test_from_runtime_copies_preferences() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [classifier]
            parse_mode = "script"
            preprocessor_symbols = ["TRACE"]
            enable_semantic_pass = false
            validate_output = true

            [embedded]
            enable_json = false
            "#,
        )
        .unwrap();

        let options = ClassifierOptions::from_runtime(&config);
        assert_eq!(options.parse_mode, ParseMode::Script);
        assert!(options.preprocessor_symbols.contains("TRACE"));
        assert!(!options.semantic);
        assert!(options.validate);
        assert!(!options.embedded.enable_json);
    }
}
