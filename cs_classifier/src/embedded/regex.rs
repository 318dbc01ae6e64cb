//! .NET regular expression sub-classifier
//!
//! Walks the virtual characters of a literal once, emitting tags for
//! anchors, groups, alternation, character classes, quantifiers, comments
//! and escapes. Everything else is `regex - text`, merged into runs.
//! Syntax errors are counted, never fatal: the pattern is still tagged as
//! far as it was understood.

use super::language::RegexOptions;
use super::virtual_chars::VirtualCharSequence;
use crate::classification::{Category, ClassifiedSpan};
use crate::config::constants::compile_time::embedded::MAX_REGEX_NESTING;

/// Constructs that make an untagged literal look like a regex
mod signal {
    pub const ANCHORS: u8 = 1;
    pub const CHARACTER_CLASS: u8 = 1 << 1;
    pub const CLASS_ESCAPE: u8 = 1 << 2;
    pub const BRACE_QUANTIFIER: u8 = 1 << 3;
    pub const LAZY_QUANTIFIER: u8 = 1 << 4;
    pub const NAMED_GROUP: u8 = 1 << 5;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexClassification {
    pub spans: Vec<ClassifiedSpan>,
    pub errors: usize,
    signals: u8,
    saw_start_anchor: bool,
    saw_end_anchor: bool,
}

impl RegexClassification {
    /// Number of distinct strong regex constructs seen
    pub fn signal_count(&self) -> usize {
        let anchors = if self.saw_start_anchor && self.saw_end_anchor {
            signal::ANCHORS
        } else {
            0
        };
        (self.signals | anchors).count_ones() as usize
    }

    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }
}

/// Classify `chars` as a .NET pattern under `options`
pub fn classify_regex(chars: &VirtualCharSequence, options: RegexOptions) -> RegexClassification {
    let mut lexer = RegexLexer {
        chars,
        position: 0,
        text_start: None,
        groups: Vec::new(),
        extended: options.contains(RegexOptions::IGNORE_PATTERN_WHITESPACE),
        can_quantify: false,
        result: RegexClassification::default(),
    };
    lexer.run();
    lexer.result
}

struct RegexLexer<'c> {
    chars: &'c VirtualCharSequence,
    position: usize,
    text_start: Option<usize>,
    /// `x` option state to restore when each open group closes
    groups: Vec<bool>,
    extended: bool,
    /// Whether the last item can take a quantifier
    can_quantify: bool,
    result: RegexClassification,
}

impl<'c> RegexLexer<'c> {
    fn peek(&self) -> Option<char> {
        self.chars.char_at(self.position)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.char_at(self.position + offset)
    }

    fn emit(&mut self, start: usize, end: usize, category: Category) {
        self.flush_text();
        if let Some(span) = self.chars.span_of(start, end) {
            self.result.spans.push(ClassifiedSpan::new(span, category));
        }
    }

    fn text(&mut self) {
        if self.text_start.is_none() {
            self.text_start = Some(self.position);
        }
        self.position += 1;
        self.can_quantify = true;
    }

    fn flush_text(&mut self) {
        if let Some(start) = self.text_start.take() {
            if let Some(span) = self.chars.span_of(start, self.position) {
                self.result.spans.push(ClassifiedSpan::new(span, Category::RegexText));
            }
        }
    }

    fn run(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                '\\' => self.escape(false),
                '(' => self.open_group(),
                ')' => self.close_group(),
                '|' => {
                    self.emit(self.position, self.position + 1, Category::RegexAlternation);
                    self.position += 1;
                    self.can_quantify = false;
                }
                '[' => self.character_class(),
                '.' => {
                    self.emit(self.position, self.position + 1, Category::RegexCharacterClass);
                    self.position += 1;
                    self.can_quantify = true;
                }
                '^' | '$' => {
                    if ch == '^' {
                        self.result.saw_start_anchor = true;
                    } else {
                        self.result.saw_end_anchor = true;
                    }
                    self.emit(self.position, self.position + 1, Category::RegexAnchor);
                    self.position += 1;
                    self.can_quantify = false;
                }
                '*' | '+' | '?' => self.quantifier(1),
                '{' => match self.brace_quantifier_len() {
                    Some(len) => {
                        self.result.signals |= signal::BRACE_QUANTIFIER;
                        self.quantifier(len);
                    }
                    None => self.text(),
                },
                '#' if self.extended => self.line_comment(),
                ch if self.extended && ch.is_whitespace() => {
                    self.flush_text();
                    self.position += 1;
                }
                _ => self.text(),
            }
        }
        self.flush_text();
        if !self.groups.is_empty() {
            // Unclosed groups
            self.result.errors += self.groups.len();
        }
    }

    fn quantifier(&mut self, len: usize) {
        let start = self.position;
        if !self.can_quantify {
            self.result.errors += 1;
        }
        let mut end = start + len;
        if self.chars.char_at(end) == Some('?') {
            self.result.signals |= signal::LAZY_QUANTIFIER;
            end += 1;
        }
        self.emit(start, end, Category::RegexQuantifier);
        self.position = end;
        self.can_quantify = false;
    }

    /// Length of `{n}`, `{n,}` or `{n,m}` at the cursor
    fn brace_quantifier_len(&self) -> Option<usize> {
        let mut offset = 1;
        let digits = |offset: &mut usize| {
            let start = *offset;
            while self.peek_at(*offset).is_some_and(|ch| ch.is_ascii_digit()) {
                *offset += 1;
            }
            *offset > start
        };
        if !digits(&mut offset) {
            return None;
        }
        if self.peek_at(offset) == Some(',') {
            offset += 1;
            digits(&mut offset);
        }
        (self.peek_at(offset) == Some('}')).then_some(offset + 1)
    }

    fn line_comment(&mut self) {
        let start = self.position;
        while self.peek().is_some_and(|ch| ch != '\n') {
            self.position += 1;
        }
        self.emit(start, self.position, Category::RegexComment);
    }

    /// `\` plus its body, emitted as two spans of the same category
    fn escape(&mut self, in_class: bool) {
        let start = self.position;
        let Some(kind) = self.peek_at(1) else {
            // Trailing backslash
            self.result.errors += 1;
            self.text();
            return;
        };
        let body_len = self.escape_body_len(kind);
        let category = match kind {
            'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'p' | 'P' => {
                self.result.signals |= signal::CLASS_ESCAPE;
                Category::RegexCharacterClass
            }
            'b' if in_class => Category::RegexOtherEscape,
            'A' | 'z' | 'Z' | 'G' | 'b' | 'B' => {
                if in_class {
                    self.result.errors += 1;
                }
                Category::RegexAnchor
            }
            'a' | 't' | 'r' | 'v' | 'f' | 'n' | 'e' | 'x' | 'u' | 'c' | 'k' => Category::RegexOtherEscape,
            '0'..='9' => Category::RegexOtherEscape,
            ch if ch.is_alphanumeric() || ch == '_' => {
                self.result.errors += 1;
                Category::RegexOtherEscape
            }
            _ => Category::RegexSelfEscapedCharacter,
        };
        self.emit(start, start + 1, category);
        self.emit(start + 1, start + 1 + body_len, category);
        self.position = start + 1 + body_len;
        self.can_quantify = category != Category::RegexAnchor;
    }

    /// Characters after the backslash that belong to the escape
    fn escape_body_len(&mut self, kind: char) -> usize {
        let body = self.position + 1;
        let run = |predicate: fn(char) -> bool, max: usize| {
            let mut len = 0;
            while len < max && self.chars.char_at(body + 1 + len).is_some_and(predicate) {
                len += 1;
            }
            len
        };
        match kind {
            'x' => {
                let digits = run(|ch| ch.is_ascii_hexdigit(), 2);
                if digits < 2 {
                    self.result.errors += 1;
                }
                1 + digits
            }
            'u' => {
                let digits = run(|ch| ch.is_ascii_hexdigit(), 4);
                if digits < 4 {
                    self.result.errors += 1;
                }
                1 + digits
            }
            'c' => {
                if self.chars.char_at(body + 1).is_some_and(|ch| ch.is_ascii_alphabetic()) {
                    2
                } else {
                    self.result.errors += 1;
                    1
                }
            }
            '0' => 1 + run(|ch| ('0'..='7').contains(&ch), 2),
            '1'..='9' => 1 + run(|ch| ch.is_ascii_digit(), usize::MAX),
            'k' | 'p' | 'P' => {
                let close = match (kind, self.chars.char_at(body + 1)) {
                    ('k', Some('<')) => '>',
                    ('k', Some('\'')) => '\'',
                    ('p' | 'P', Some('{')) => '}',
                    _ => {
                        self.result.errors += 1;
                        return 1;
                    }
                };
                let mut len = 2;
                loop {
                    match self.chars.char_at(body + len) {
                        Some(ch) if ch == close => return len + 1,
                        Some(_) => len += 1,
                        None => {
                            self.result.errors += 1;
                            return len;
                        }
                    }
                }
            }
            _ => 1,
        }
    }

    fn open_group(&mut self) {
        let start = self.position;
        if self.groups.len() >= MAX_REGEX_NESTING {
            self.result.errors += 1;
        }
        if self.peek_at(1) != Some('?') {
            self.emit(start, start + 1, Category::RegexGrouping);
            self.position += 1;
            self.push_group(self.extended);
            return;
        }

        match self.peek_at(2) {
            Some(':' | '=' | '!' | '>') => {
                self.emit(start, start + 3, Category::RegexGrouping);
                self.position = start + 3;
                self.push_group(self.extended);
            }
            Some('<') if matches!(self.peek_at(3), Some('=' | '!')) => {
                self.emit(start, start + 4, Category::RegexGrouping);
                self.position = start + 4;
                self.push_group(self.extended);
            }
            Some(delimiter @ ('<' | '\'')) => {
                let close = if delimiter == '<' { '>' } else { '\'' };
                let mut end = start + 3;
                while self.chars.char_at(end).is_some_and(|ch| ch != close && ch != ')') {
                    end += 1;
                }
                if self.chars.char_at(end) == Some(close) && end > start + 3 {
                    end += 1;
                    self.result.signals |= signal::NAMED_GROUP;
                } else {
                    self.result.errors += 1;
                }
                self.emit(start, end, Category::RegexGrouping);
                self.position = end;
                self.push_group(self.extended);
            }
            Some('#') => {
                let mut end = start + 3;
                while self.chars.char_at(end).is_some_and(|ch| ch != ')') {
                    end += 1;
                }
                if self.chars.char_at(end) == Some(')') {
                    end += 1;
                } else {
                    self.result.errors += 1;
                }
                self.emit(start, end, Category::RegexComment);
                self.position = end;
            }
            Some('(') => {
                // Conditional: the condition is parsed as an ordinary group
                self.emit(start, start + 2, Category::RegexGrouping);
                self.position = start + 2;
                self.push_group(self.extended);
            }
            _ => self.inline_options(start),
        }
    }

    /// `(?imnsx-imnsx)` or `(?imnsx-imnsx:...)`
    fn inline_options(&mut self, start: usize) {
        let mut end = start + 2;
        let mut enabling = true;
        let mut extended = self.extended;
        while let Some(ch) = self.chars.char_at(end) {
            match ch {
                '-' => enabling = false,
                'x' => extended = enabling,
                'i' | 'm' | 'n' | 's' => {}
                _ => break,
            }
            end += 1;
        }
        match self.chars.char_at(end) {
            Some(')') => {
                self.emit(start, end + 1, Category::RegexGrouping);
                self.position = end + 1;
                self.extended = extended;
                self.can_quantify = false;
            }
            Some(':') => {
                self.emit(start, end + 1, Category::RegexGrouping);
                self.position = end + 1;
                self.push_group(self.extended);
                self.extended = extended;
            }
            _ => {
                self.result.errors += 1;
                self.emit(start, start + 2, Category::RegexGrouping);
                self.position = start + 2;
                self.push_group(self.extended);
            }
        }
    }

    fn push_group(&mut self, restore: bool) {
        self.groups.push(restore);
        self.can_quantify = false;
    }

    fn close_group(&mut self) {
        match self.groups.pop() {
            Some(restore) => self.extended = restore,
            None => self.result.errors += 1,
        }
        self.emit(self.position, self.position + 1, Category::RegexGrouping);
        self.position += 1;
        self.can_quantify = true;
    }

    /// `[...]`, `[^...]`, ranges and `-[...]` subtraction
    fn character_class(&mut self) {
        self.result.signals |= signal::CHARACTER_CLASS;
        let start = self.position;
        let mut opener = 1;
        if self.peek_at(1) == Some('^') {
            opener = 2;
        }
        self.emit(start, start + opener, Category::RegexCharacterClass);
        self.position = start + opener;

        let mut first = true;
        let mut has_item = false;
        loop {
            let Some(ch) = self.peek() else {
                self.result.errors += 1;
                self.flush_text();
                break;
            };
            match ch {
                ']' if !first => {
                    self.emit(self.position, self.position + 1, Category::RegexCharacterClass);
                    self.position += 1;
                    break;
                }
                '\\' => {
                    self.escape(true);
                    has_item = true;
                }
                '-' if has_item && self.peek_at(1) == Some('[') => {
                    self.emit(self.position, self.position + 1, Category::RegexCharacterClass);
                    self.position += 1;
                    self.character_class();
                }
                '-' if has_item && self.peek_at(1).is_some_and(|next| next != ']') => {
                    self.emit(self.position, self.position + 1, Category::RegexCharacterClass);
                    self.position += 1;
                    has_item = false;
                }
                _ => {
                    self.text();
                    has_item = true;
                }
            }
            first = false;
        }
        self.can_quantify = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::virtual_chars::virtual_chars;
    use crate::tokens::{StringForm, Token};
    use crate::utils::Span;

    fn classify(pattern: &str, options: RegexOptions) -> (String, RegexClassification) {
        let source = format!("@\"{}\"", pattern.replace('"', "\"\""));
        let chars = virtual_chars(&source, Token::String(StringForm::Verbatim), Span::new(0, source.len())).unwrap();
        let result = classify_regex(&chars, options);
        (source, result)
    }

    fn tagged(pattern: &str) -> Vec<(Category, String)> {
        let (source, result) = classify(pattern, RegexOptions::NONE);
        result
            .spans
            .iter()
            .map(|span| (span.category, span.text(&source).to_string()))
            .collect()
    }

    #[test]
    fn test_anchor_group_and_escape() {
        assert_eq!(
            tagged(r"$(\a)"),
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
    fn test_quantifiers_and_text_runs() {
        assert_eq!(
            tagged("ab+c{2,3}?"),
            vec![
                (Category::RegexText, "ab".to_string()),
                (Category::RegexQuantifier, "+".to_string()),
                (Category::RegexText, "c".to_string()),
                (Category::RegexQuantifier, "{2,3}?".to_string()),
            ]
        );
    }

    #[test]
    fn test_character_class_and_escapes() {
        assert_eq!(
            tagged(r"[^a-z\d]\."),
            vec![
                (Category::RegexCharacterClass, "[^".to_string()),
                (Category::RegexText, "a".to_string()),
                (Category::RegexCharacterClass, "-".to_string()),
                (Category::RegexText, "z".to_string()),
                (Category::RegexCharacterClass, "\\".to_string()),
                (Category::RegexCharacterClass, "d".to_string()),
                (Category::RegexCharacterClass, "]".to_string()),
                (Category::RegexSelfEscapedCharacter, "\\".to_string()),
                (Category::RegexSelfEscapedCharacter, ".".to_string()),
            ]
        );
    }

    #[test]
    fn test_named_group_and_alternation() {
        let spans = tagged(r"(?<year>\d{4})|x");
        assert_eq!(spans[0], (Category::RegexGrouping, "(?<year>".to_string()));
        assert!(spans.contains(&(Category::RegexAlternation, "|".to_string())));
        assert!(spans.contains(&(Category::RegexQuantifier, "{4}".to_string())));
    }

    #[test]
    fn test_comments() {
        let spans = tagged("a(?#note)b");
        assert!(spans.contains(&(Category::RegexComment, "(?#note)".to_string())));

        let (source, result) = classify("a # trailing", RegexOptions::IGNORE_PATTERN_WHITESPACE);
        let comment = result.spans.iter().find(|span| span.category == Category::RegexComment).unwrap();
        assert_eq!(comment.text(&source), "# trailing");
    }

    #[test]
    fn test_inline_extended_option() {
        let spans = tagged("(?x) a # c");
        assert_eq!(spans[0], (Category::RegexGrouping, "(?x)".to_string()));
        assert!(spans.contains(&(Category::RegexComment, "# c".to_string())));
    }

    #[test]
    fn test_errors_are_counted() {
        assert_eq!(classify("(a", RegexOptions::NONE).1.errors, 1);
        assert_eq!(classify("a)", RegexOptions::NONE).1.errors, 1);
        assert_eq!(classify("*a", RegexOptions::NONE).1.errors, 1);
        assert_eq!(classify("[abc", RegexOptions::NONE).1.errors, 1);
        assert!(classify(r"\d+", RegexOptions::NONE).1.is_valid());
    }

    #[test]
    fn test_signal_count() {
        assert_eq!(classify(r"$(\a)", RegexOptions::NONE).1.signal_count(), 0);
        assert_eq!(classify(r"^\d+$", RegexOptions::NONE).1.signal_count(), 2);
        assert_eq!(classify("[a-z]{2}", RegexOptions::NONE).1.signal_count(), 2);
        assert_eq!(classify("hello world", RegexOptions::NONE).1.signal_count(), 0);
    }
}
