//! Consolidated diagnostic and success codes
//!
//! Single source of truth for every code the classifier logs, together with
//! the metadata used by structured output and the batch summary.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
    pub const INVARIANT_VIOLATION: Code = Code::new("ERR004");
}

pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
}

/// Lexical codes. Only the resource limits are fatal; everything else is a
/// recovered diagnostic.
pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_STRING: Code = Code::new("E021");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E022");
    pub const TOO_MANY_TOKENS: Code = Code::new("E023");
    pub const INPUT_TOO_LARGE: Code = Code::new("E024");
    pub const MISSING_ENDIF: Code = Code::new("E025");
    pub const UNEXPECTED_DIRECTIVE: Code = Code::new("E026");
    pub const INVALID_DIRECTIVE: Code = Code::new("E027");
    pub const CONFLICT_MARKER: Code = Code::new("E028");
    pub const INTERPOLATION_TOO_DEEP: Code = Code::new("E029");
}

pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const MISSING_TOKEN: Code = Code::new("E041");
    pub const MAX_DEPTH_EXCEEDED: Code = Code::new("E042");
    pub const SKIPPED_TOKENS: Code = Code::new("E043");
}

pub mod binding {
    use super::Code;

    pub const UNRESOLVED_NAME: Code = Code::new("E060");
    pub const ARITY_FALLBACK: Code = Code::new("E061");
    pub const BINDING_CANCELLED: Code = Code::new("E062");
    pub const CYCLIC_BASE_TYPE: Code = Code::new("E063");
}

pub mod classification {
    use super::Code;

    pub const CANCELLED: Code = Code::new("E080");
    pub const OVERLAPPING_SPANS: Code = Code::new("E081");
    pub const UNSORTED_OUTPUT: Code = Code::new("E082");
    pub const SPAN_OUT_OF_RANGE: Code = Code::new("E083");
    pub const EMBEDDED_SPAN_OUTSIDE_HOST: Code = Code::new("E084");
}

pub mod embedded {
    use super::Code;

    pub const UNKNOWN_HINT_OPTION: Code = Code::new("E090");
    pub const REGEX_SYNTAX: Code = Code::new("E091");
    pub const JSON_SYNTAX: Code = Code::new("E092");
    pub const LITERAL_TOO_LONG: Code = Code::new("E093");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const PARSE_COMPLETE: Code = Code::new("I040");
    pub const SYMBOL_DISCOVERY_COMPLETE: Code = Code::new("I050");
    pub const BINDING_COMPLETE: Code = Code::new("I060");
    pub const CLASSIFICATION_COMPLETE: Code = Code::new("I070");
    pub const EMBEDDED_CLASSIFICATION_COMPLETE: Code = Code::new("I071");
    pub const INCREMENTAL_UPDATE_COMPLETE: Code = Code::new("I072");
    pub const VALIDATION_PASSED: Code = Code::new("I080");
    pub const BATCH_COMPLETE: Code = Code::new("I090");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

use Severity::{Critical, High, Low, Medium};

const METADATA: &[ErrorMetadata] = &[
    // System
    ErrorMetadata::new("ERR001", "System", Critical, false,
        "Critical internal error", "File a bug report with the input that triggered it"),
    ErrorMetadata::new("ERR002", "System", Critical, false,
        "Logging or runtime initialization failure", "Check environment configuration"),
    ErrorMetadata::new("ERR003", "System", High, false,
        "Configuration file could not be loaded", "Fix the TOML configuration file"),
    ErrorMetadata::new("ERR004", "System", Critical, false,
        "Classification output violated an internal invariant", "File a bug report with the input"),
    // File processing
    ErrorMetadata::new("E005", "FileProcessing", Medium, false,
        "Source file not found", "Check the path"),
    ErrorMetadata::new("E006", "FileProcessing", Low, true,
        "File extension is not .cs or .csx", "Rename the file or pass it explicitly"),
    ErrorMetadata::new("E007", "FileProcessing", High, false,
        "File exceeds the maximum classified size", "Split the file"),
    ErrorMetadata::new("E009", "FileProcessing", Medium, false,
        "Permission denied reading source file", "Check file permissions"),
    ErrorMetadata::new("E010", "FileProcessing", Medium, false,
        "File is not valid UTF-8", "Re-encode the file as UTF-8"),
    ErrorMetadata::new("E011", "FileProcessing", Medium, false,
        "I/O error while reading source file", "Retry the operation"),
    ErrorMetadata::new("E012", "FileProcessing", Medium, false,
        "Path is neither a file nor a directory", "Check the path"),
    // Lexical
    ErrorMetadata::new("E020", "Lexical", Low, true,
        "Character not valid in C# source", "Token is skipped and lexing continues"),
    ErrorMetadata::new("E021", "Lexical", Low, true,
        "Unterminated string or character literal", "Literal is extended to its recovery point"),
    ErrorMetadata::new("E022", "Lexical", Low, true,
        "Unterminated block comment", "Comment is extended to end of file"),
    ErrorMetadata::new("E023", "Lexical", High, false,
        "Token count limit exceeded", "Split the file"),
    ErrorMetadata::new("E024", "Lexical", High, false,
        "Input exceeds the maximum size", "Split the file"),
    ErrorMetadata::new("E025", "Lexical", Low, true,
        "#if block without matching #endif", "Add the missing #endif"),
    ErrorMetadata::new("E026", "Lexical", Low, true,
        "#elif, #else or #endif without matching #if", "Remove the stray directive"),
    ErrorMetadata::new("E027", "Lexical", Low, true,
        "Unknown or malformed preprocessor directive", "Directive is classified as text"),
    ErrorMetadata::new("E028", "Lexical", Low, true,
        "Merge conflict marker in source", "Resolve the merge conflict"),
    ErrorMetadata::new("E029", "Lexical", Medium, true,
        "Interpolated strings nested too deeply", "Remaining text is lexed as string content"),
    // Syntax
    ErrorMetadata::new("E040", "Syntax", Low, true,
        "Unexpected token", "Token is skipped by recovery"),
    ErrorMetadata::new("E041", "Syntax", Low, true,
        "Expected token is missing", "A missing placeholder is inserted"),
    ErrorMetadata::new("E042", "Syntax", Medium, true,
        "Maximum nesting depth exceeded", "Nested construct is skipped"),
    ErrorMetadata::new("E043", "Syntax", Low, true,
        "Tokens skipped during error recovery", "Skipped tokens keep their lexical category"),
    // Binding
    ErrorMetadata::new("E060", "Binding", Low, true,
        "Name could not be resolved", "Syntactic category is used"),
    ErrorMetadata::new("E061", "Binding", Low, true,
        "Generic arity mismatch resolved by fallback", "Same-named symbol of another arity is used"),
    ErrorMetadata::new("E062", "Binding", Low, true,
        "Binding cancelled", "Request is abandoned"),
    ErrorMetadata::new("E063", "Binding", Low, true,
        "Cyclic base type chain", "Member lookup stops at the cycle"),
    // Classification
    ErrorMetadata::new("E080", "Classification", Low, true,
        "Classification cancelled", "Request is abandoned without partial output"),
    ErrorMetadata::new("E081", "Classification", Critical, false,
        "Overlapping classification spans", "File a bug report"),
    ErrorMetadata::new("E082", "Classification", Critical, false,
        "Classification output not sorted", "File a bug report"),
    ErrorMetadata::new("E083", "Classification", Critical, false,
        "Classification span outside the text", "File a bug report"),
    ErrorMetadata::new("E084", "Classification", Critical, false,
        "Embedded span escapes its host literal", "File a bug report"),
    // Embedded languages
    ErrorMetadata::new("E090", "Embedded", Low, true,
        "Unknown option in language hint comment", "Hint is ignored"),
    ErrorMetadata::new("E091", "Embedded", Low, true,
        "Regex syntax error", "Remaining pattern text is still classified"),
    ErrorMetadata::new("E092", "Embedded", Low, true,
        "JSON syntax error", "Remaining text is classified as JSON text"),
    ErrorMetadata::new("E093", "Embedded", Low, true,
        "Literal too long for embedded classification", "Literal keeps its string category"),
    // Success
    ErrorMetadata::new("I004", "System", Low, true,
        "Logging system initialized", ""),
    ErrorMetadata::new("I006", "FileProcessing", Low, true,
        "File classified", ""),
    ErrorMetadata::new("I020", "Lexical", Low, true,
        "Tokenization complete", ""),
    ErrorMetadata::new("I040", "Syntax", Low, true,
        "Syntax tree built", ""),
    ErrorMetadata::new("I050", "Symbols", Low, true,
        "Declarations collected", ""),
    ErrorMetadata::new("I060", "Binding", Low, true,
        "Names bound", ""),
    ErrorMetadata::new("I070", "Classification", Low, true,
        "Classification complete", ""),
    ErrorMetadata::new("I071", "Embedded", Low, true,
        "Embedded language classification complete", ""),
    ErrorMetadata::new("I072", "Classification", Low, true,
        "Incremental update applied", ""),
    ErrorMetadata::new("I080", "Validation", Low, true,
        "Output invariants verified", ""),
    ErrorMetadata::new("I090", "Batch", Low, true,
        "Batch classification complete", ""),
];

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, &'static ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, &'static ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| METADATA.iter().map(|m| (m.code, m)).collect())
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code).copied()
}

pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .filter(|action| !action.is_empty())
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

/// All registered codes, in declaration order
pub fn all_codes() -> impl Iterator<Item = &'static str> {
    METADATA.iter().map(|m| m.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_code_constant_has_metadata() {
        let constants = [
            system::INTERNAL_ERROR,
            system::INVARIANT_VIOLATION,
            file_processing::FILE_TOO_LARGE,
            lexical::UNTERMINATED_STRING,
            lexical::MISSING_ENDIF,
            syntax::MISSING_TOKEN,
            binding::UNRESOLVED_NAME,
            classification::CANCELLED,
            embedded::UNKNOWN_HINT_OPTION,
            success::CLASSIFICATION_COMPLETE,
        ];
        for code in constants {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in all_codes() {
            assert!(seen.insert(code), "duplicate code {}", code);
        }
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("X999"), "Unknown error");
        assert_eq!(get_category("X999"), "Unknown");
        assert!(is_recoverable("X999"));
    }

    #[test]
    fn test_invariant_violation_is_critical() {
        assert_eq!(
            get_severity(system::INVARIANT_VIOLATION.as_str()),
            Severity::Critical
        );
        assert!(!is_recoverable(classification::OVERLAPPING_SPANS.as_str()));
    }
}
