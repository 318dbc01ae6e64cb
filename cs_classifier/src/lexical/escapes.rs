//! Escape sequences inside string and character literals
//!
//! Escapes are not lexemes of their own; the classifier asks for them when
//! it splits a literal into text and escape spans.

use crate::tokens::{StringForm, Token};
use crate::utils::Span;

/// Byte length of the backslash escape starting at `text[0] == '\\'`
pub fn escape_len(text: &str) -> usize {
    let mut chars = text.char_indices().skip(1);
    let Some((_, kind)) = chars.next() else {
        return 1;
    };
    let hex_run = |max: usize| {
        text[2..]
            .char_indices()
            .take(max)
            .take_while(|(_, c)| c.is_ascii_hexdigit())
            .count()
    };
    match kind {
        'x' => 2 + hex_run(4),
        'u' => 2 + hex_run(4),
        'U' => 2 + hex_run(8),
        other => 1 + other.len_utf8(),
    }
}

/// Escape spans inside one lexeme, in source order
pub fn escape_spans(source: &str, token: Token, span: Span) -> Vec<Span> {
    let text = span.slice(source);
    let (backslash, braces, skip) = match token {
        Token::String(StringForm::Regular) | Token::Char => (true, false, 1),
        Token::InterpolatedText(StringForm::Regular) => (true, true, 0),
        Token::InterpolatedText(StringForm::Verbatim) => (false, true, 0),
        _ => return Vec::new(),
    };

    let mut spans = Vec::new();
    let bytes = text.as_bytes();
    let mut i = skip.min(text.len());
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if backslash => {
                let len = escape_len(&text[i..]).min(text.len() - i);
                spans.push(Span::with_len(span.start + i, len));
                i += len;
            }
            b'{' | b'}' if braces && bytes.get(i + 1) == Some(&bytes[i]) => {
                spans.push(Span::with_len(span.start + i, 2));
                i += 2;
            }
            _ => i += 1,
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escapes(source: &str, token: Token) -> Vec<&str> {
        let span = Span::new(0, source.len());
        escape_spans(source, token, span)
            .into_iter()
            .map(|s| s.slice(source))
            .collect()
    }

    #[test]
    fn test_regular_string_escapes() {
        let source = r#""a\tb\x41B\U00000043\\""#;
        assert_eq!(
            escapes(source, Token::String(StringForm::Regular)),
            vec![r"\t", r"\x41B", r"\U00000043", r"\\"]
        );
    }

    #[test]
    fn test_verbatim_and_raw_have_no_escapes() {
        assert!(escapes(r#"@"a\tb""c""#, Token::String(StringForm::Verbatim)).is_empty());
        assert!(escapes(r#""""a\t""""#, Token::String(StringForm::Raw)).is_empty());
    }

    #[test]
    fn test_interpolated_text_braces() {
        assert_eq!(
            escapes(r"a{{\n}}", Token::InterpolatedText(StringForm::Regular)),
            vec!["{{", r"\n", "}}"]
        );
        assert_eq!(
            escapes(r"a{{\n", Token::InterpolatedText(StringForm::Verbatim)),
            vec!["{{"]
        );
    }

    #[test]
    fn test_char_escape() {
        assert_eq!(escapes(r"'\''", Token::Char), vec![r"\'"]);
        assert_eq!(escape_len(r"\xZ"), 2);
    }
}
