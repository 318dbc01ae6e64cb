//! Deciding which string literals carry an embedded language
//!
//! Sources are tried nearest first: a hint comment, then a `StringSyntax`
//! annotation found by the binder, then the probable-language heuristics.
//! The heuristics only look at verbatim and raw literals.

use super::hints::{find_hint, is_host_literal, HintComment};
use super::json::classify_json;
use super::language::{EmbeddedHint, EmbeddedLanguage};
use super::regex::classify_regex;
use super::virtual_chars::{virtual_chars, VirtualCharSequence};
use crate::classification::{ClassificationError, ClassificationResult, ClassifiedSpan};
use crate::config::constants::compile_time::binding::CANCELLATION_CHECK_INTERVAL;
use crate::config::constants::compile_time::embedded::{
    MAX_EMBEDDED_LITERALS, MAX_EMBEDDED_LITERAL_LENGTH, PROBABLE_REGEX_MIN_SIGNALS,
};
use crate::config::ClassifierOptions;
use crate::grammar::ast::SyntaxTree;
use crate::logging::codes;
use crate::reference_resolution::Bindings;
use crate::tokens::{StringForm, Token};
use crate::utils::Span;
use crate::{log_debug, log_warning};

/// Where a literal's language came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Comment,
    StringSyntax,
    Probable,
}

/// One string literal with its embedded classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedLiteral {
    /// Lexeme index of the host literal
    pub token: usize,
    /// Whole literal, delimiters included
    pub literal: Span,
    /// Source range between the delimiters
    pub content: Span,
    pub language: EmbeddedLanguage,
    pub source: DetectionSource,
    pub spans: Vec<ClassifiedSpan>,
    /// Syntax errors in the embedded text
    pub errors: usize,
}

/// Find and sub-classify every embedded literal of `tree`
pub fn detect_embedded(
    tree: &SyntaxTree,
    bindings: Option<&Bindings>,
    options: &ClassifierOptions,
) -> ClassificationResult<Vec<EmbeddedLiteral>> {
    let mut found = Vec::new();
    if !options.embedded.any_enabled() {
        return Ok(found);
    }
    let stream = tree.tokens();
    for (index, lexeme) in stream.all_tokens().iter().enumerate() {
        if index % CANCELLATION_CHECK_INTERVAL == 0 && options.cancellation.is_cancelled() {
            return Err(ClassificationError::cancelled("embedded detection"));
        }
        if !is_host_literal(lexeme.value) {
            continue;
        }
        if found.len() >= MAX_EMBEDDED_LITERALS {
            log_warning!(code = codes::embedded::LITERAL_TOO_LONG,
                "Embedded literal limit reached; remaining literals keep their string category",
                "limit" => MAX_EMBEDDED_LITERALS
            );
            break;
        }
        if let Some(literal) = classify_literal(tree, bindings, options, index) {
            found.push(literal);
        }
    }
    Ok(found)
}

fn classify_literal(
    tree: &SyntaxTree,
    bindings: Option<&Bindings>,
    options: &ClassifierOptions,
    index: usize,
) -> Option<EmbeddedLiteral> {
    let stream = tree.tokens();
    let token = stream.kind(index);
    let span = stream.span(index);
    if span.len() > MAX_EMBEDDED_LITERAL_LENGTH {
        log_debug!("Literal skipped for embedded classification",
            "code" => codes::embedded::LITERAL_TOO_LONG,
            "start" => span.start,
            "length" => span.len()
        );
        return None;
    }

    let (hint, source) = match find_hint(tree, index) {
        Some(HintComment::Enabled(hint)) => (Some(hint), DetectionSource::Comment),
        Some(HintComment::Disabled) => return None,
        None => (
            bindings.and_then(|bindings| bindings.string_syntax.get(&index).copied()),
            DetectionSource::StringSyntax,
        ),
    };
    let chars = virtual_chars(stream.source(), token, span)?;

    match hint {
        Some(hint) if is_enabled(hint.language, options) => Some(classify_with(index, span, &chars, hint, source, options)),
        Some(_) => None,
        None if matches!(token, Token::String(StringForm::Verbatim | StringForm::Raw)) => {
            probable(index, span, &chars, options)
        }
        None => None,
    }
}

fn is_enabled(language: EmbeddedLanguage, options: &ClassifierOptions) -> bool {
    match language {
        EmbeddedLanguage::Regex => options.embedded.enable_regex,
        EmbeddedLanguage::Json => options.embedded.enable_json,
    }
}

fn classify_with(
    token: usize,
    literal: Span,
    chars: &VirtualCharSequence,
    hint: EmbeddedHint,
    source: DetectionSource,
    options: &ClassifierOptions,
) -> EmbeddedLiteral {
    let (spans, errors) = match hint.language {
        EmbeddedLanguage::Regex => {
            let result = classify_regex(chars, hint.regex_options);
            (result.spans, result.errors)
        }
        EmbeddedLanguage::Json => {
            let result = classify_json(chars, hint.strict || options.embedded.strict_json_by_default);
            (result.spans, result.errors)
        }
    };
    if errors > 0 {
        let code = match hint.language {
            EmbeddedLanguage::Regex => codes::embedded::REGEX_SYNTAX,
            EmbeddedLanguage::Json => codes::embedded::JSON_SYNTAX,
        };
        log_debug!("Embedded text has syntax errors",
            "code" => code,
            "start" => literal.start,
            "errors" => errors
        );
    }
    EmbeddedLiteral {
        token,
        literal,
        content: chars.content,
        language: hint.language,
        source,
        spans,
        errors,
    }
}

/// Untagged literal that looks enough like JSON or a regex
fn probable(token: usize, literal: Span, chars: &VirtualCharSequence, options: &ClassifierOptions) -> Option<EmbeddedLiteral> {
    let embedded = &options.embedded;
    if embedded.enable_json && embedded.detect_probable_json {
        let result = classify_json(chars, false);
        if result.is_valid() && result.top_level_container && result.has_quoted_property {
            return Some(EmbeddedLiteral {
                token,
                literal,
                content: chars.content,
                language: EmbeddedLanguage::Json,
                source: DetectionSource::Probable,
                spans: result.spans,
                errors: 0,
            });
        }
    }
    if embedded.enable_regex && embedded.detect_probable_regex {
        let result = classify_regex(chars, Default::default());
        if result.is_valid() && result.signal_count() >= PROBABLE_REGEX_MIN_SIGNALS {
            return Some(EmbeddedLiteral {
                token,
                literal,
                content: chars.content,
                language: EmbeddedLanguage::Regex,
                source: DetectionSource::Probable,
                spans: result.spans,
                errors: 0,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{CancellationToken, Category};
    use crate::config::EmbeddedOptions;
    use crate::lexical::tokenize;
    use crate::reference_resolution::bind;
    use crate::symbols::collect_symbols;
    use crate::syntax::parse;
    use assert_matches::assert_matches;

    fn detect_with(source: &str, options: &ClassifierOptions) -> (String, Vec<EmbeddedLiteral>) {
        let tokenized = tokenize(source, options).unwrap();
        let tree = parse(tokenized.stream, options);
        let table = collect_symbols(&tree, options).unwrap();
        let bindings = bind(&tree, &table, options).unwrap();
        let found = detect_embedded(&tree, Some(&bindings), options).unwrap();
        (source.to_string(), found)
    }

    fn detect(source: &str) -> (String, Vec<EmbeddedLiteral>) {
        detect_with(source, &ClassifierOptions::regular())
    }

    fn tags(source: &str, literal: &EmbeddedLiteral) -> Vec<(Category, String)> {
        literal
            .spans
            .iter()
            .map(|span| (span.category, span.text(source).to_string()))
            .collect()
    }

    #[test]
    fn test_hint_comment_enables_regex() {
        let (source, found) = detect(
            "class C { void M() {
                // language=regex
                var r = @\"$(\\a)\";
            } }",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, DetectionSource::Comment);
        assert_eq!(
            tags(&source, &found[0]),
            vec![
                (Category::RegexAnchor, "$".to_string()),
                (Category::RegexGrouping, "(".to_string()),
                (Category::RegexOtherEscape, "\\".to_string()),
                (Category::RegexOtherEscape, "a".to_string()),
                (Category::RegexGrouping, ")".to_string()),
            ]
        );
    }

    #[test]
    fn test_without_hint_plain_pattern_is_not_detected() {
        let (_, found) = detect("class C { void M() { var r = @\"$(\\a)\"; } }");
        assert!(found.is_empty());
    }

    #[test]
    fn test_string_syntax_from_binder() {
        let (_, found) = detect(
            "using System.Text.RegularExpressions;
             class C { void M() { Regex.IsMatch(\"x\", \"a+\"); } }",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, EmbeddedLanguage::Regex);
        assert_eq!(found[0].source, DetectionSource::StringSyntax);
    }

    #[test]
    fn test_probable_json_in_verbatim_literal() {
        let (source, found) = detect("class C { string s = @\"{ \"\"name\"\": 1 }\"; }");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, EmbeddedLanguage::Json);
        assert_eq!(found[0].source, DetectionSource::Probable);
        assert!(tags(&source, &found[0]).contains(&(Category::JsonPropertyName, "\"\"name\"\"".to_string())));
    }

    #[test]
    fn test_probable_detection_skips_regular_literals() {
        let (_, found) = detect("class C { string s = \"^\\\\d+$\"; }");
        assert!(found.is_empty());
        let (_, found) = detect("class C { string s = @\"^\\d+$\"; }");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, EmbeddedLanguage::Regex);
    }

    #[test]
    fn test_unknown_hint_option_disables() {
        let (_, found) = detect("class C { // lang=regex,bogus\n string s = @\"^\\d+$\"; }");
        assert!(found.is_empty());
    }

    #[test]
    fn test_disabled_language_is_skipped() {
        let options = ClassifierOptions::regular().with_embedded(EmbeddedOptions {
            enable_regex: false,
            ..EmbeddedOptions::default()
        });
        let (_, found) = detect_with("class C { // lang=regex\n string s = \"a+\"; }", &options);
        assert!(found.is_empty());
    }

    #[test]
    fn test_cancellation() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class C { string s = \"x\"; }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let token = CancellationToken::new();
        token.cancel();
        let cancelled = ClassifierOptions::regular().with_cancellation(token);
        assert_matches!(
            detect_embedded(&tree, None, &cancelled),
            Err(ClassificationError::Cancelled { .. })
        );
    }
}
