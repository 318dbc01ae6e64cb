//! Embedded language names, regex options and detection hints

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages that string literals can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddedLanguage {
    Regex,
    Json,
}

impl EmbeddedLanguage {
    /// Language named in a hint comment or a `StringSyntax` argument
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "regex" | "regexp" => Some(EmbeddedLanguage::Regex),
            "json" => Some(EmbeddedLanguage::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddedLanguage::Regex => "regex",
            EmbeddedLanguage::Json => "json",
        }
    }
}

impl fmt::Display for EmbeddedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// .NET `RegexOptions` flags as a bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RegexOptions(u16);

impl RegexOptions {
    pub const NONE: Self = Self(0);
    pub const IGNORE_CASE: Self = Self(1);
    pub const MULTILINE: Self = Self(1 << 1);
    pub const EXPLICIT_CAPTURE: Self = Self(1 << 2);
    pub const COMPILED: Self = Self(1 << 3);
    pub const SINGLELINE: Self = Self(1 << 4);
    pub const IGNORE_PATTERN_WHITESPACE: Self = Self(1 << 5);
    pub const RIGHT_TO_LEFT: Self = Self(1 << 6);
    pub const ECMA_SCRIPT: Self = Self(1 << 8);
    pub const CULTURE_INVARIANT: Self = Self(1 << 9);
    pub const NON_BACKTRACKING: Self = Self(1 << 10);

    /// Flag for an option name, case-insensitive (`IgnoreCase`, `ignorecase`)
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "none" => Self::NONE,
            "ignorecase" => Self::IGNORE_CASE,
            "multiline" => Self::MULTILINE,
            "explicitcapture" => Self::EXPLICIT_CAPTURE,
            "compiled" => Self::COMPILED,
            "singleline" => Self::SINGLELINE,
            "ignorepatternwhitespace" => Self::IGNORE_PATTERN_WHITESPACE,
            "righttoleft" => Self::RIGHT_TO_LEFT,
            "ecmascript" => Self::ECMA_SCRIPT,
            "cultureinvariant" => Self::CULTURE_INVARIANT,
            "nonbacktracking" => Self::NON_BACKTRACKING,
            _ => return None,
        })
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

}

/// A decision that one literal holds an embedded language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedHint {
    pub language: EmbeddedLanguage,
    pub regex_options: RegexOptions,
    /// JSON only: reject the lenient extensions
    pub strict: bool,
}

impl EmbeddedHint {
    pub fn new(language: EmbeddedLanguage) -> Self {
        Self {
            language,
            regex_options: RegexOptions::NONE,
            strict: false,
        }
    }

    pub fn with_regex_options(mut self, options: RegexOptions) -> Self {
        self.regex_options = options;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names() {
        assert_eq!(EmbeddedLanguage::from_name("Regex"), Some(EmbeddedLanguage::Regex));
        assert_eq!(EmbeddedLanguage::from_name("regexp"), Some(EmbeddedLanguage::Regex));
        assert_eq!(EmbeddedLanguage::from_name(" JSON "), Some(EmbeddedLanguage::Json));
        assert_eq!(EmbeddedLanguage::from_name("xml"), None);
    }

    #[test]
    fn test_regex_option_flags() {
        let mut options = RegexOptions::NONE;
        options.insert(RegexOptions::from_name("IgnorePatternWhitespace").unwrap());
        options.insert(RegexOptions::IGNORE_CASE);
        assert!(options.contains(RegexOptions::IGNORE_PATTERN_WHITESPACE));
        assert!(options.contains(RegexOptions::IGNORE_CASE));
        assert!(!options.contains(RegexOptions::MULTILINE));
        assert_eq!(RegexOptions::from_name("bogus"), None);
    }
}
