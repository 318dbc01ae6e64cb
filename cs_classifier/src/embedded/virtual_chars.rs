//! Virtual characters of a string literal
//!
//! Embedded grammars run over the literal's value, not its source text.
//! Each value character remembers the source range it came from, so `\t`
//! in a regular literal is one character spanning two bytes, `""` in a
//! verbatim literal is one quote, and raw-literal indentation is skipped.

use crate::lexical::escapes::escape_len;
use crate::tokens::{StringForm, Token};
use crate::utils::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualChar {
    pub ch: char,
    pub span: Span,
}

/// Value characters of one literal plus the content range they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualCharSequence {
    chars: Vec<VirtualChar>,
    /// Source range between the delimiters
    pub content: Span,
}

impl VirtualCharSequence {
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<VirtualChar> {
        self.chars.get(index).copied()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).map(|vc| vc.ch)
    }

    pub fn chars(&self) -> &[VirtualChar] {
        &self.chars
    }

    /// Source range covering value characters `start..end`
    pub fn span_of(&self, start: usize, end: usize) -> Option<Span> {
        if start >= end {
            return None;
        }
        let first = self.chars.get(start)?;
        let last = self.chars.get(end - 1)?;
        Some(first.span.merge(last.span))
    }

    /// The decoded value as a string
    pub fn value(&self) -> String {
        self.chars.iter().map(|vc| vc.ch).collect()
    }
}

/// Decode a string literal lexeme. `None` when the lexeme is not a
/// terminated string literal or holds an invalid escape.
pub fn virtual_chars(source: &str, token: Token, span: Span) -> Option<VirtualCharSequence> {
    let text = span.slice(source);
    match token {
        Token::String(StringForm::Regular) => regular(text, span.start),
        Token::String(StringForm::Verbatim) => verbatim(text, span.start),
        Token::String(StringForm::Raw) => raw(text, span.start),
        _ => None,
    }
}

/// Strip a `u8`/`U8` suffix
fn without_suffix(text: &str) -> &str {
    text.strip_suffix("u8")
        .or_else(|| text.strip_suffix("U8"))
        .unwrap_or(text)
}

fn regular(text: &str, base: usize) -> Option<VirtualCharSequence> {
    let text = without_suffix(text);
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return None;
    }
    let body_end = text.len() - 1;
    let mut chars = Vec::new();
    let mut i = 1;
    while i < body_end {
        let rest = &text[i..body_end];
        let ch = rest.chars().next()?;
        if ch == '\\' {
            let len = escape_len(rest);
            if len < 2 || len > rest.len() {
                return None;
            }
            let decoded = decode_escape(&rest[..len])?;
            chars.push(VirtualChar {
                ch: decoded,
                span: Span::with_len(base + i, len),
            });
            i += len;
        } else {
            chars.push(VirtualChar {
                ch,
                span: Span::with_len(base + i, ch.len_utf8()),
            });
            i += ch.len_utf8();
        }
    }
    Some(VirtualCharSequence {
        chars,
        content: Span::new(base + 1, base + body_end),
    })
}

fn decode_escape(escape: &str) -> Option<char> {
    let mut chars = escape.chars();
    chars.next();
    let kind = chars.next()?;
    let hex = chars.as_str();
    Some(match kind {
        '\'' => '\'',
        '"' => '"',
        '\\' => '\\',
        '0' => '\0',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        'e' => '\u{1b}',
        'x' | 'u' | 'U' if !hex.is_empty() => char::from_u32(u32::from_str_radix(hex, 16).ok()?)?,
        _ => return None,
    })
}

fn verbatim(text: &str, base: usize) -> Option<VirtualCharSequence> {
    let text = without_suffix(text);
    if text.len() < 3 || !text.starts_with("@\"") || !text.ends_with('"') {
        return None;
    }
    let body_end = text.len() - 1;
    let mut chars = Vec::new();
    let mut i = 2;
    while i < body_end {
        let ch = text[i..body_end].chars().next()?;
        if ch == '"' {
            // A lone quote before the end means the literal is unterminated
            if text.as_bytes().get(i + 1) != Some(&b'"') || i + 1 >= body_end {
                return None;
            }
            chars.push(VirtualChar {
                ch: '"',
                span: Span::with_len(base + i, 2),
            });
            i += 2;
        } else {
            chars.push(VirtualChar {
                ch,
                span: Span::with_len(base + i, ch.len_utf8()),
            });
            i += ch.len_utf8();
        }
    }
    Some(VirtualCharSequence {
        chars,
        content: Span::new(base + 2, base + body_end),
    })
}

fn raw(text: &str, base: usize) -> Option<VirtualCharSequence> {
    let text = without_suffix(text);
    let quotes = text.bytes().take_while(|&b| b == b'"').count();
    if quotes < 3 || text.len() < quotes * 2 {
        return None;
    }
    let closing = text.bytes().rev().take_while(|&b| b == b'"').count();
    if closing < quotes {
        return None;
    }
    let body = &text[quotes..text.len() - quotes];
    let body_base = base + quotes;

    let Some(first_break) = body.find('\n') else {
        // Single-line raw literal: the value is the text between quotes
        let chars = body
            .char_indices()
            .map(|(offset, ch)| VirtualChar {
                ch,
                span: Span::with_len(body_base + offset, ch.len_utf8()),
            })
            .collect();
        return Some(VirtualCharSequence {
            chars,
            content: Span::with_len(body_base, body.len()),
        });
    };

    // Multi-line: the opening line must be blank and the closing line's
    // whitespace is the indentation removed from every content line
    if !body[..first_break].trim().is_empty() {
        return None;
    }
    let last_break = body.rfind('\n')?;
    let indentation = &body[last_break + 1..];
    if !indentation.chars().all(|ch| ch == ' ' || ch == '\t') {
        return None;
    }

    let content_start = first_break + 1;
    // The line break before the closing line is not part of the value
    let content_end = if last_break > 0 && body.as_bytes()[last_break - 1] == b'\r' {
        last_break - 1
    } else {
        last_break
    };
    let mut chars = Vec::new();
    if content_start < content_end {
        let mut offset = content_start;
        for line in body[content_start..content_end].split_inclusive('\n') {
            let skip = if line.trim().is_empty() {
                line.len() - line.trim_start_matches([' ', '\t']).len()
            } else if line.starts_with(indentation) {
                indentation.len()
            } else {
                return None;
            };
            for (index, ch) in line[skip..].char_indices() {
                chars.push(VirtualChar {
                    ch,
                    span: Span::with_len(body_base + offset + skip + index, ch.len_utf8()),
                });
            }
            offset += line.len();
        }
    }
    Some(VirtualCharSequence {
        chars,
        content: Span::new(body_base + content_start.min(content_end), body_base + content_end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(source: &str, form: StringForm) -> Option<VirtualCharSequence> {
        virtual_chars(source, Token::String(form), Span::new(0, source.len()))
    }

    #[test]
    fn test_regular_escapes_map_to_source() {
        let source = r#""a\tb""#;
        let chars = decode(source, StringForm::Regular).unwrap();
        assert_eq!(chars.value(), "a\tb");
        assert_eq!(chars.get(1).unwrap().span, Span::new(2, 4));
        assert_eq!(chars.content, Span::new(1, 5));
    }

    #[test]
    fn test_invalid_escape_rejects_literal() {
        assert!(decode(r#""\q""#, StringForm::Regular).is_none());
        assert!(decode(r#""abc"#, StringForm::Regular).is_none());
    }

    #[test]
    fn test_escaped_multibyte_char_rejects_literal() {
        assert!(decode("\"\\é\"", StringForm::Regular).is_none());
        assert!(decode("\"a\\€b\"", StringForm::Regular).is_none());
    }

    #[test]
    fn test_verbatim_doubled_quotes() {
        let source = r#"@"a""b\d""#;
        let chars = decode(source, StringForm::Verbatim).unwrap();
        assert_eq!(chars.value(), "a\"b\\d");
        assert_eq!(chars.get(1).unwrap().span, Span::new(3, 5));
    }

    #[test]
    fn test_raw_single_line() {
        let source = r#""""{"a":1}""""#;
        let chars = decode(source, StringForm::Raw).unwrap();
        assert_eq!(chars.value(), r#"{"a":1}"#);
        assert_eq!(chars.get(0).unwrap().span, Span::new(3, 4));
    }

    #[test]
    fn test_raw_multi_line_strips_indentation() {
        let source = "\"\"\"\n    [1,\n     2]\n    \"\"\"";
        let chars = decode(source, StringForm::Raw).unwrap();
        assert_eq!(chars.value(), "[1,\n 2]");
        let bracket = chars.get(0).unwrap();
        assert_eq!(bracket.span.slice(source), "[");
        assert_eq!(bracket.span.start, 8);
    }

    #[test]
    fn test_u8_suffix_is_ignored() {
        let chars = decode(r#""ab"u8"#, StringForm::Regular).unwrap();
        assert_eq!(chars.value(), "ab");
    }
}
