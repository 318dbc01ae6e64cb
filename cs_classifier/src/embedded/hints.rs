//! `lang=` hint comments
//!
//! `// lang=regex,ignorecase` or `/* language = json */` marks the next
//! string literal. Keys and names are case-insensitive. An unknown option
//! turns the hint into an explicit "do not classify".

use super::language::{EmbeddedHint, EmbeddedLanguage, RegexOptions};
use crate::grammar::ast::{NodeId, NodeKind, SyntaxTree};
use crate::log_debug;
use crate::logging::codes;
use crate::tokens::Token;
use regex::Regex;
use std::iter;
use std::sync::OnceLock;

/// Outcome of reading one comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintComment {
    /// Classify the literal as this language
    Enabled(EmbeddedHint),
    /// A hint that names an unknown language or option
    Disabled,
}

static HINT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn hint_pattern() -> Option<&'static Regex> {
    HINT_PATTERN
        .get_or_init(|| Regex::new(r"(?i)^\s*(?:lang|language)\s*=\s*([a-z]+)((?:\s*,\s*[a-z]*)*)\s*$").ok())
        .as_ref()
}

/// Read a comment lexeme; `None` when it is not a hint at all
pub fn parse_hint_comment(comment: &str) -> Option<HintComment> {
    let body = if let Some(line) = comment.strip_prefix("//") {
        line.trim_start_matches('/')
    } else {
        comment.strip_prefix("/*")?.strip_suffix("*/").unwrap_or(comment)
    };
    let captures = hint_pattern()?.captures(body.trim_end())?;
    let language_name = captures.get(1)?.as_str();
    let Some(language) = EmbeddedLanguage::from_name(language_name) else {
        log_debug!("Hint names an unknown language",
            "code" => codes::embedded::UNKNOWN_HINT_OPTION,
            "language" => language_name
        );
        return Some(HintComment::Disabled);
    };

    let mut hint = EmbeddedHint::new(language);
    let mut options = RegexOptions::NONE;
    let option_list = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    for option in option_list.split(',').map(str::trim).filter(|option| !option.is_empty()) {
        let accepted = match language {
            EmbeddedLanguage::Regex => match RegexOptions::from_name(option) {
                Some(flag) => {
                    options.insert(flag);
                    true
                }
                None => false,
            },
            EmbeddedLanguage::Json => {
                if option.eq_ignore_ascii_case("strict") {
                    hint = hint.strict(true);
                    true
                } else {
                    false
                }
            }
        };
        if !accepted {
            log_debug!("Hint carries an unknown option",
                "code" => codes::embedded::UNKNOWN_HINT_OPTION,
                "option" => option
            );
            return Some(HintComment::Disabled);
        }
    }
    Some(HintComment::Enabled(hint.with_regex_options(options)))
}

/// Places whose leading comments may carry the hint for a literal inside them
fn is_hint_owner(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Argument
            | NodeKind::AttributeArgument
            | NodeKind::LocalDeclaration
            | NodeKind::ExpressionStatement
            | NodeKind::Return
            | NodeKind::YieldStatement
            | NodeKind::Throw
            | NodeKind::GlobalStatement
            | NodeKind::Field
            | NodeKind::Property
            | NodeKind::EventField
            | NodeKind::EnumMember
            | NodeKind::Parameter
            | NodeKind::VariableDeclarator
    )
}

fn is_hint_boundary(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::LocalDeclaration
            | NodeKind::ExpressionStatement
            | NodeKind::Return
            | NodeKind::YieldStatement
            | NodeKind::Throw
            | NodeKind::GlobalStatement
            | NodeKind::Field
            | NodeKind::Property
            | NodeKind::EventField
            | NodeKind::EnumMember
            | NodeKind::Parameter
    ) || kind.is_type_declaration()
        || kind.is_function()
}

/// Nearest hint for the string literal lexeme `token`
pub fn find_hint(tree: &SyntaxTree, token: usize) -> Option<HintComment> {
    if let Some(found) = hint_before(tree, token) {
        return Some(found);
    }
    let parent = tree.token_parent(token)?;
    for node in iter::once(parent).chain(tree.ancestors(parent)) {
        let kind = tree.kind(node);
        if is_hint_owner(kind) {
            if let Some(first) = tree.first_token(node).filter(|&first| first != token) {
                if let Some(found) = hint_before(tree, first) {
                    return Some(found);
                }
            }
        }
        if is_hint_boundary(kind) {
            break;
        }
    }
    None
}

/// Last hint comment in the leading trivia of `token`
fn hint_before(tree: &SyntaxTree, token: usize) -> Option<HintComment> {
    let stream = tree.tokens();
    stream
        .leading_trivia(token)
        .rev()
        .filter(|&index| tree.token_kind(index).is_comment())
        .find_map(|index| parse_hint_comment(stream.text(index)))
}

/// Whether a lexeme can host embedded classification
pub fn is_host_literal(token: Token) -> bool {
    matches!(token, Token::String(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_block_hints() {
        assert_eq!(
            parse_hint_comment("// lang=regex"),
            Some(HintComment::Enabled(EmbeddedHint::new(EmbeddedLanguage::Regex)))
        );
        assert_eq!(
            parse_hint_comment("/* Language = JSON */"),
            Some(HintComment::Enabled(EmbeddedHint::new(EmbeddedLanguage::Json)))
        );
        assert_eq!(parse_hint_comment("// just a comment"), None);
    }

    #[test]
    fn test_hint_options() {
        let Some(HintComment::Enabled(hint)) = parse_hint_comment("//language=regex, IgnoreCase ,multiline") else {
            panic!("expected an enabled hint");
        };
        assert!(hint.regex_options.contains(RegexOptions::IGNORE_CASE));
        assert!(hint.regex_options.contains(RegexOptions::MULTILINE));

        let Some(HintComment::Enabled(json)) = parse_hint_comment("// lang=json,strict") else {
            panic!("expected an enabled hint");
        };
        assert!(json.strict);
    }

    #[test]
    fn test_unknown_option_or_language_disables() {
        assert_eq!(parse_hint_comment("// lang=regex,bogus"), Some(HintComment::Disabled));
        assert_eq!(parse_hint_comment("// lang=json,ignorecase"), Some(HintComment::Disabled));
        assert_eq!(parse_hint_comment("// lang=xml"), Some(HintComment::Disabled));
    }
}
