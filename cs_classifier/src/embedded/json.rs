//! JSON sub-classifier
//!
//! Accepts the lenient superset understood by common .NET serializers:
//! comments, single-quoted strings, unquoted property names, trailing
//! commas, `new Ctor(...)`, `NaN`, `Infinity`, `-Infinity` and
//! `undefined`. In strict mode each extension is tagged `json - text`
//! and counted as an error.

use super::virtual_chars::VirtualCharSequence;
use crate::classification::{Category, ClassifiedSpan};
use crate::config::constants::compile_time::embedded::MAX_JSON_NESTING;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonTokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    String { single_quoted: bool },
    Number { strict: bool },
    Word,
    Minus,
    Comment,
    Bad,
}

#[derive(Debug, Clone, Copy)]
struct JsonToken {
    kind: JsonTokenKind,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonClassification {
    pub spans: Vec<ClassifiedSpan>,
    pub errors: usize,
    /// The top-level value is an object or array
    pub top_level_container: bool,
    /// At least one double-quoted `"key":` pair was seen
    pub has_quoted_property: bool,
}

impl JsonClassification {
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }
}

/// Classify `chars` as JSON; `strict` rejects the lenient extensions
pub fn classify_json(chars: &VirtualCharSequence, strict: bool) -> JsonClassification {
    let (tokens, lex_errors) = lex(chars);
    let mut parser = JsonParser {
        chars,
        tokens,
        position: 0,
        strict,
        result: JsonClassification {
            errors: lex_errors,
            ..JsonClassification::default()
        },
    };
    parser.document();
    parser.result
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn lex(chars: &VirtualCharSequence) -> (Vec<JsonToken>, usize) {
    let mut tokens = Vec::new();
    let mut errors = 0;
    let mut i = 0;
    let at = |index: usize| chars.char_at(index);
    while let Some(ch) = at(i) {
        let start = i;
        let kind = match ch {
            ch if ch.is_whitespace() => {
                i += 1;
                continue;
            }
            '{' => JsonTokenKind::OpenBrace,
            '}' => JsonTokenKind::CloseBrace,
            '[' => JsonTokenKind::OpenBracket,
            ']' => JsonTokenKind::CloseBracket,
            '(' => JsonTokenKind::OpenParen,
            ')' => JsonTokenKind::CloseParen,
            ',' => JsonTokenKind::Comma,
            ':' => JsonTokenKind::Colon,
            '"' | '\'' => {
                i += 1;
                loop {
                    match at(i) {
                        Some('\\') => i += 2,
                        Some(c) if c == ch => {
                            i += 1;
                            break;
                        }
                        Some('\n') | None => {
                            errors += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                tokens.push(JsonToken {
                    kind: JsonTokenKind::String {
                        single_quoted: ch == '\'',
                    },
                    start,
                    end: i.min(chars.len()),
                });
                continue;
            }
            '/' if at(i + 1) == Some('/') => {
                while at(i).is_some_and(|c| c != '\n') {
                    i += 1;
                }
                tokens.push(JsonToken {
                    kind: JsonTokenKind::Comment,
                    start,
                    end: i,
                });
                continue;
            }
            '/' if at(i + 1) == Some('*') => {
                i += 2;
                loop {
                    match at(i) {
                        Some('*') if at(i + 1) == Some('/') => {
                            i += 2;
                            break;
                        }
                        Some(_) => i += 1,
                        None => {
                            errors += 1;
                            break;
                        }
                    }
                }
                tokens.push(JsonToken {
                    kind: JsonTokenKind::Comment,
                    start,
                    end: i,
                });
                continue;
            }
            '-' if !at(i + 1).is_some_and(|c| c.is_ascii_digit() || c == '.') => JsonTokenKind::Minus,
            ch if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => {
                let end = number_end(chars, i);
                let text: String = (i..end).filter_map(at).collect();
                tokens.push(JsonToken {
                    kind: JsonTokenKind::Number {
                        strict: is_strict_number(&text),
                    },
                    start,
                    end,
                });
                i = end;
                continue;
            }
            ch if is_word_char(ch) => {
                while at(i).is_some_and(is_word_char) {
                    i += 1;
                }
                tokens.push(JsonToken {
                    kind: JsonTokenKind::Word,
                    start,
                    end: i,
                });
                continue;
            }
            _ => {
                errors += 1;
                JsonTokenKind::Bad
            }
        };
        i += 1;
        tokens.push(JsonToken { kind, start, end: i });
    }
    (tokens, errors)
}

fn number_end(chars: &VirtualCharSequence, start: usize) -> usize {
    let mut i = start;
    if chars.char_at(i).is_some_and(|ch| ch == '-' || ch == '+') {
        i += 1;
    }
    while chars
        .char_at(i)
        .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '_')
    {
        // Exponent signs belong to the number
        if matches!(chars.char_at(i), Some('e' | 'E')) && matches!(chars.char_at(i + 1), Some('+' | '-')) {
            i += 1;
        }
        i += 1;
    }
    i
}

/// RFC 8259 number grammar
fn is_strict_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
        }
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let digits = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == digits {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let digits = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == digits {
            return false;
        }
    }
    i == bytes.len()
}

/// Lenient number forms: hex, leading `+` or `.`, trailing `.`
fn is_lenient_number(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['-', '+']);
    if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|ch| ch.is_ascii_hexdigit());
    }
    let mut saw_digit = false;
    let mut saw_exponent = false;
    let mut previous = ' ';
    for ch in unsigned.chars() {
        match ch {
            '0'..='9' => saw_digit = true,
            '.' if !saw_exponent => {}
            'e' | 'E' if saw_digit && !saw_exponent => saw_exponent = true,
            '+' | '-' if matches!(previous, 'e' | 'E') => {}
            _ => return false,
        }
        previous = ch;
    }
    saw_digit
}

struct JsonParser<'c> {
    chars: &'c VirtualCharSequence,
    tokens: Vec<JsonToken>,
    position: usize,
    strict: bool,
    result: JsonClassification,
}

impl<'c> JsonParser<'c> {
    fn text_of(&self, token: JsonToken) -> String {
        (token.start..token.end).filter_map(|index| self.chars.char_at(index)).collect()
    }

    fn emit(&mut self, token: JsonToken, category: Category) {
        if let Some(span) = self.chars.span_of(token.start, token.end) {
            self.result.spans.push(ClassifiedSpan::new(span, category));
        }
    }

    /// Category for a lenient extension under the current strictness
    fn extension(&mut self, category: Category) -> Category {
        if self.strict {
            self.result.errors += 1;
            Category::JsonText
        } else {
            category
        }
    }

    /// Next significant token; comments are tagged on the way
    fn peek(&mut self) -> Option<JsonToken> {
        while let Some(&token) = self.tokens.get(self.position) {
            if token.kind != JsonTokenKind::Comment {
                return Some(token);
            }
            let category = self.extension(Category::JsonComment);
            self.emit(token, category);
            self.position += 1;
        }
        None
    }

    fn bump(&mut self) -> Option<JsonToken> {
        let token = self.peek();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn document(&mut self) {
        match self.peek() {
            Some(token) => {
                self.result.top_level_container =
                    matches!(token.kind, JsonTokenKind::OpenBrace | JsonTokenKind::OpenBracket);
                self.value(0);
            }
            None => self.result.errors += 1,
        }
        // Anything after the top-level value
        while let Some(token) = self.bump() {
            self.result.errors += 1;
            self.emit(token, Category::JsonText);
        }
    }

    fn value(&mut self, depth: usize) {
        let Some(token) = self.bump() else {
            self.result.errors += 1;
            return;
        };
        match token.kind {
            JsonTokenKind::OpenBrace => {
                self.emit(token, Category::JsonObject);
                self.object(depth + 1);
            }
            JsonTokenKind::OpenBracket => {
                self.emit(token, Category::JsonArray);
                self.array(depth + 1);
            }
            JsonTokenKind::String { single_quoted } => {
                let category = if single_quoted {
                    self.extension(Category::JsonString)
                } else {
                    Category::JsonString
                };
                self.emit(token, category);
            }
            JsonTokenKind::Number { strict } => {
                let category = if strict {
                    Category::JsonNumber
                } else if is_lenient_number(&self.text_of(token)) {
                    self.extension(Category::JsonNumber)
                } else {
                    self.result.errors += 1;
                    Category::JsonText
                };
                self.emit(token, category);
            }
            JsonTokenKind::Minus => {
                let category = self.extension(Category::JsonOperator);
                self.emit(token, category);
                match self.peek() {
                    Some(next) if next.kind == JsonTokenKind::Word && self.text_of(next) == "Infinity" => {
                        self.position += 1;
                        let category = self.extension(Category::JsonKeyword);
                        self.emit(next, category);
                    }
                    _ => self.result.errors += 1,
                }
            }
            JsonTokenKind::Word => self.word(token, depth),
            _ => {
                self.result.errors += 1;
                self.emit(token, Category::JsonText);
            }
        }
    }

    fn word(&mut self, token: JsonToken, depth: usize) {
        let text = self.text_of(token);
        match text.as_str() {
            "true" | "false" | "null" => self.emit(token, Category::JsonKeyword),
            "NaN" | "Infinity" | "undefined" => {
                let category = self.extension(Category::JsonKeyword);
                self.emit(token, category);
            }
            "new" => {
                let category = self.extension(Category::JsonKeyword);
                self.emit(token, category);
                self.constructor(depth);
            }
            _ => {
                self.result.errors += 1;
                self.emit(token, Category::JsonText);
            }
        }
    }

    /// `Ctor(arg, ...)` after `new`
    fn constructor(&mut self, depth: usize) {
        match self.peek() {
            Some(name) if name.kind == JsonTokenKind::Word => {
                self.position += 1;
                let category = self.extension(Category::JsonConstructorName);
                self.emit(name, category);
            }
            _ => {
                self.result.errors += 1;
                return;
            }
        }
        match self.peek() {
            Some(open) if open.kind == JsonTokenKind::OpenParen => {
                self.position += 1;
                let category = self.extension(Category::JsonPunctuation);
                self.emit(open, category);
            }
            _ => {
                self.result.errors += 1;
                return;
            }
        }
        if depth >= MAX_JSON_NESTING {
            self.result.errors += 1;
            return;
        }
        loop {
            match self.peek() {
                None => {
                    self.result.errors += 1;
                    return;
                }
                Some(close) if close.kind == JsonTokenKind::CloseParen => {
                    self.position += 1;
                    let category = self.extension(Category::JsonPunctuation);
                    self.emit(close, category);
                    return;
                }
                Some(comma) if comma.kind == JsonTokenKind::Comma => {
                    self.position += 1;
                    let category = self.extension(Category::JsonPunctuation);
                    self.emit(comma, category);
                }
                Some(_) => self.value(depth + 1),
            }
        }
    }

    fn object(&mut self, depth: usize) {
        if depth > MAX_JSON_NESTING {
            self.result.errors += 1;
            self.skip_to_end();
            return;
        }
        let mut trailing_comma = false;
        loop {
            let Some(token) = self.peek() else {
                self.result.errors += 1;
                return;
            };
            match token.kind {
                JsonTokenKind::CloseBrace => {
                    self.position += 1;
                    if trailing_comma {
                        self.extension(Category::JsonPunctuation);
                    }
                    self.emit(token, Category::JsonObject);
                    return;
                }
                JsonTokenKind::String { single_quoted } => {
                    self.position += 1;
                    let category = if single_quoted {
                        self.extension(Category::JsonPropertyName)
                    } else {
                        Category::JsonPropertyName
                    };
                    self.emit(token, category);
                    if !single_quoted && self.peek().is_some_and(|next| next.kind == JsonTokenKind::Colon) {
                        self.result.has_quoted_property = true;
                    }
                }
                JsonTokenKind::Word | JsonTokenKind::Number { .. } => {
                    self.position += 1;
                    let category = self.extension(Category::JsonPropertyName);
                    self.emit(token, category);
                }
                _ => {
                    // Not a property: recover by treating it as a value
                    self.result.errors += 1;
                    self.value(depth);
                }
            }
            match self.peek() {
                Some(colon) if colon.kind == JsonTokenKind::Colon => {
                    self.position += 1;
                    self.emit(colon, Category::JsonPunctuation);
                    self.value(depth);
                }
                _ => self.result.errors += 1,
            }
            match self.peek() {
                Some(comma) if comma.kind == JsonTokenKind::Comma => {
                    self.position += 1;
                    self.emit(comma, Category::JsonPunctuation);
                    trailing_comma = true;
                }
                Some(close) if close.kind == JsonTokenKind::CloseBrace => trailing_comma = false,
                Some(_) => {
                    self.result.errors += 1;
                    trailing_comma = false;
                }
                None => {
                    self.result.errors += 1;
                    return;
                }
            }
        }
    }

    fn array(&mut self, depth: usize) {
        if depth > MAX_JSON_NESTING {
            self.result.errors += 1;
            self.skip_to_end();
            return;
        }
        let mut trailing_comma = false;
        loop {
            let Some(token) = self.peek() else {
                self.result.errors += 1;
                return;
            };
            match token.kind {
                JsonTokenKind::CloseBracket => {
                    self.position += 1;
                    if trailing_comma {
                        self.extension(Category::JsonPunctuation);
                    }
                    self.emit(token, Category::JsonArray);
                    return;
                }
                JsonTokenKind::Comma => {
                    // Elided element
                    self.position += 1;
                    let category = self.extension(Category::JsonPunctuation);
                    self.emit(token, category);
                    continue;
                }
                _ => self.value(depth),
            }
            match self.peek() {
                Some(comma) if comma.kind == JsonTokenKind::Comma => {
                    self.position += 1;
                    self.emit(comma, Category::JsonPunctuation);
                    trailing_comma = true;
                }
                Some(close) if close.kind == JsonTokenKind::CloseBracket => trailing_comma = false,
                Some(_) => {
                    self.result.errors += 1;
                    trailing_comma = false;
                }
                None => {
                    self.result.errors += 1;
                    return;
                }
            }
        }
    }

    /// Too deep: the rest is plain text
    fn skip_to_end(&mut self) {
        while let Some(token) = self.bump() {
            self.emit(token, Category::JsonText);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::virtual_chars::virtual_chars;
    use crate::tokens::{StringForm, Token};
    use crate::utils::Span;

    fn classify(json: &str, strict: bool) -> (String, JsonClassification) {
        let source = format!("@\"{}\"", json.replace('"', "\"\""));
        let chars = virtual_chars(&source, Token::String(StringForm::Verbatim), Span::new(0, source.len())).unwrap();
        (source.clone(), classify_json(&chars, strict))
    }

    fn tagged(json: &str, strict: bool) -> Vec<(Category, String)> {
        let (source, result) = classify(json, strict);
        result
            .spans
            .iter()
            .map(|span| (span.category, span.text(&source).to_string()))
            .collect()
    }

    #[test]
    fn test_object_with_properties() {
        assert_eq!(
            tagged(r#"{"a": 1, "b": [true, null]}"#, false),
            vec![
                (Category::JsonObject, "{".to_string()),
                (Category::JsonPropertyName, "\"\"a\"\"".to_string()),
                (Category::JsonPunctuation, ":".to_string()),
                (Category::JsonNumber, "1".to_string()),
                (Category::JsonPunctuation, ",".to_string()),
                (Category::JsonPropertyName, "\"\"b\"\"".to_string()),
                (Category::JsonPunctuation, ":".to_string()),
                (Category::JsonArray, "[".to_string()),
                (Category::JsonKeyword, "true".to_string()),
                (Category::JsonPunctuation, ",".to_string()),
                (Category::JsonKeyword, "null".to_string()),
                (Category::JsonArray, "]".to_string()),
                (Category::JsonObject, "}".to_string()),
            ]
        );
        let (_, result) = classify(r#"{"a": 1}"#, false);
        assert!(result.is_valid());
        assert!(result.top_level_container);
        assert!(result.has_quoted_property);
    }

    #[test]
    fn test_lenient_extensions() {
        let spans = tagged("{ a: 'x', /* note */ b: new Date(1), c: -Infinity, d: undefined }", false);
        assert!(spans.contains(&(Category::JsonPropertyName, "a".to_string())));
        assert!(spans.contains(&(Category::JsonString, "'x'".to_string())));
        assert!(spans.contains(&(Category::JsonComment, "/* note */".to_string())));
        assert!(spans.contains(&(Category::JsonKeyword, "new".to_string())));
        assert!(spans.contains(&(Category::JsonConstructorName, "Date".to_string())));
        assert!(spans.contains(&(Category::JsonOperator, "-".to_string())));
        assert!(spans.contains(&(Category::JsonKeyword, "Infinity".to_string())));
        assert!(spans.contains(&(Category::JsonKeyword, "undefined".to_string())));
        assert!(classify("{ a: 'x' }", false).1.is_valid());
    }

    #[test]
    fn test_strict_mode_turns_extensions_into_text() {
        let (_, result) = classify("{ a: 1 }", true);
        assert_eq!(result.errors, 1);
        let spans = tagged("[NaN, // c\n 2]", true);
        assert!(spans.contains(&(Category::JsonText, "NaN".to_string())));
        assert!(spans.contains(&(Category::JsonText, "// c".to_string())));
        assert!(spans.contains(&(Category::JsonNumber, "2".to_string())));
    }

    #[test]
    fn test_negative_numbers_and_errors() {
        let spans = tagged("[-1.5e3]", true);
        assert!(spans.contains(&(Category::JsonNumber, "-1.5e3".to_string())));
        assert!(!classify("[1,", false).1.is_valid());
        assert!(!classify("{\"a\" 1}", false).1.is_valid());
        assert!(!classify("hello", false).1.is_valid());
    }

    #[test]
    fn test_plain_text_is_not_a_container() {
        let (_, result) = classify("\"just a string\"", false);
        assert!(!result.top_level_container);
        assert!(!result.has_quoted_property);
    }
}
