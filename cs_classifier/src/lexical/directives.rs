//! Preprocessor directive lines and conditional compilation state
//!
//! A directive occupies one line. The line is split into small units
//! (words, numbers, strings, operators, a trailing `//` comment) and each
//! unit gets a [`DirectiveRole`] depending on the directive name. `#if`
//! and friends also update [`PreprocessorState`], which decides whether
//! the following lines are active code or disabled text.

use crate::config::constants::compile_time::lexical::MAX_DIRECTIVE_NESTING;
use crate::tokens::{DirectiveRole, SpannedToken, Token};
use crate::utils::{Span, Spanned};
use std::collections::BTreeSet;

/// One open `#if` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Branch {
    /// Whether the text around the `#if` was active
    parent_active: bool,
    /// Whether some arm of this block has been taken already
    taken: bool,
    /// Whether the current arm is active
    active: bool,
}

/// Defined symbols plus the stack of open conditional blocks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreprocessorState {
    defined: BTreeSet<String>,
    branches: Vec<Branch>,
}

impl PreprocessorState {
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            defined: symbols.into_iter().map(Into::into).collect(),
            branches: Vec::new(),
        }
    }

    /// Whether text at this point is compiled
    pub fn is_active(&self) -> bool {
        self.branches.last().map(|b| b.active).unwrap_or(true)
    }

    pub fn is_defined(&self, symbol: &str) -> bool {
        self.defined.contains(symbol)
    }

    pub fn open_blocks(&self) -> usize {
        self.branches.len()
    }

    fn push_if(&mut self, condition: bool) {
        let parent_active = self.is_active();
        if self.branches.len() >= MAX_DIRECTIVE_NESTING {
            // Deeper blocks inherit their parent's state
            self.branches.push(Branch {
                parent_active,
                taken: true,
                active: parent_active,
            });
            return;
        }
        let active = parent_active && condition;
        self.branches.push(Branch {
            parent_active,
            taken: active,
            active,
        });
    }

    fn elif(&mut self, condition: bool) -> bool {
        match self.branches.last_mut() {
            Some(branch) => {
                branch.active = branch.parent_active && !branch.taken && condition;
                branch.taken |= branch.active;
                true
            }
            None => false,
        }
    }

    fn else_branch(&mut self) -> bool {
        match self.branches.last_mut() {
            Some(branch) => {
                branch.active = branch.parent_active && !branch.taken;
                branch.taken = true;
                true
            }
            None => false,
        }
    }

    fn endif(&mut self) -> bool {
        self.branches.pop().is_some()
    }
}

/// Kind of a directive line, by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Elif,
    Else,
    Endif,
    Region,
    EndRegion,
    Define,
    Undef,
    Error,
    Warning,
    Line,
    Nullable,
    Pragma,
    Reference,
    Load,
    Bad,
}

impl DirectiveKind {
    fn from_name(name: &str) -> Self {
        match name {
            "if" => Self::If,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "endif" => Self::Endif,
            "region" => Self::Region,
            "endregion" => Self::EndRegion,
            "define" => Self::Define,
            "undef" => Self::Undef,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "line" => Self::Line,
            "nullable" => Self::Nullable,
            "pragma" => Self::Pragma,
            "r" => Self::Reference,
            "load" => Self::Load,
            _ => Self::Bad,
        }
    }

    /// Directives whose remainder is free text
    fn takes_message(self) -> bool {
        matches!(
            self,
            Self::Region | Self::EndRegion | Self::Error | Self::Warning
        )
    }

}

/// Outcome of applying a directive to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveEffect {
    None,
    /// `#elif`/`#else`/`#endif` with no open `#if`
    Unmatched,
    /// Name not recognised
    Bad,
}

// ============================================================================
// LINE UNITS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Space,
    Word,
    Number,
    Str,
    /// `!`, `&&`, `||`, `==`, `!=`, `-`
    Op,
    /// `(`, `)`, `,`
    Punct,
    Comment,
    Other,
}

fn split_units(text: &str, base: usize) -> Vec<(Unit, Span)> {
    let bytes = text.as_bytes();
    let mut units = Vec::new();
    let mut i = 0;
    while i < text.len() {
        let start = i;
        let ch = text[i..].chars().next().unwrap_or(' ');
        let unit = if ch == ' ' || ch == '\t' || ch == '\u{0B}' || ch == '\u{0C}' {
            while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | 0x0B | 0x0C) {
                i += 1;
            }
            Unit::Space
        } else if text[i..].starts_with("//") {
            i = text.len();
            Unit::Comment
        } else if ch == '"' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            i = (i + 1).min(text.len());
            Unit::Str
        } else if ch.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                i += 1;
            }
            Unit::Number
        } else if ch == '_' || ch.is_alphabetic() {
            i += text[i..]
                .char_indices()
                .find(|(_, c)| !(*c == '_' || c.is_alphanumeric()))
                .map(|(offset, _)| offset)
                .unwrap_or(text.len() - i);
            Unit::Word
        } else {
            let two = text.get(i..i + 2).unwrap_or("");
            if matches!(two, "&&" | "||" | "==" | "!=") {
                i += 2;
                Unit::Op
            } else if matches!(ch, '!' | '-') {
                i += 1;
                Unit::Op
            } else if matches!(ch, '(' | ')' | ',') {
                i += 1;
                Unit::Punct
            } else {
                i += ch.len_utf8();
                Unit::Other
            }
        };
        units.push((unit, Span::new(base + start, base + i)));
    }
    units
}

// ============================================================================
// DIRECTIVE LEXING
// ============================================================================

/// Lexes one directive line, `hash` pointing at `#` and `line_end` at the
/// line break (or end of input). Returns the lexemes and the directive kind.
pub fn lex_directive_line(
    source: &str,
    hash: usize,
    line_end: usize,
) -> (Vec<SpannedToken>, DirectiveKind) {
    let mut out = vec![Spanned::new(
        Token::Directive(DirectiveRole::Keyword),
        Span::new(hash, hash + 1),
    )];
    let rest = &source[hash + 1..line_end];
    let units = split_units(rest, hash + 1);

    let mut iter = units.iter().peekable();
    // Whitespace between `#` and the name
    while let Some((Unit::Space, span)) = iter.peek() {
        out.push(Spanned::new(Token::Whitespace, *span));
        iter.next();
    }

    let kind = match iter.peek() {
        Some((Unit::Word, span)) => DirectiveKind::from_name(span.slice(source)),
        _ => DirectiveKind::Bad,
    };

    if kind == DirectiveKind::Bad {
        // Everything after `#` and its whitespace is text
        if let Some((_, first)) = iter.peek() {
            out.push(Spanned::new(
                Token::Directive(DirectiveRole::Text),
                Span::new(first.start, line_end),
            ));
        }
        return (out, kind);
    }

    if let Some((_, name)) = iter.next() {
        out.push(Spanned::new(Token::Directive(DirectiveRole::Keyword), *name));
    }

    if kind.takes_message() {
        let mut first_text = None;
        for (unit, span) in iter.by_ref() {
            if *unit == Unit::Space && first_text.is_none() {
                out.push(Spanned::new(Token::Whitespace, *span));
            } else {
                first_text.get_or_insert(span.start);
            }
        }
        if let Some(start) = first_text {
            out.push(Spanned::new(
                Token::Directive(DirectiveRole::Text),
                Span::new(start, line_end),
            ));
        }
        return (out, kind);
    }

    let mut previous_word: Option<&str> = None;
    for (unit, span) in iter {
        let text = span.slice(source);
        let token = match unit {
            Unit::Space => Token::Whitespace,
            Unit::Comment => Token::LineComment,
            Unit::Word => Token::Directive(word_role(kind, text, previous_word)),
            Unit::Number => Token::Directive(DirectiveRole::Number),
            Unit::Str => Token::Directive(DirectiveRole::String),
            Unit::Op => Token::Directive(DirectiveRole::Operator),
            Unit::Punct => Token::Directive(DirectiveRole::Punctuation),
            Unit::Other => Token::Directive(DirectiveRole::Text),
        };
        if *unit == Unit::Word {
            previous_word = Some(text);
        }
        out.push(Spanned::new(token, *span));
    }

    (out, kind)
}

fn word_role(kind: DirectiveKind, word: &str, previous: Option<&str>) -> DirectiveRole {
    match kind {
        DirectiveKind::If | DirectiveKind::Elif => match word {
            "true" | "false" => DirectiveRole::CSharpKeyword,
            _ => DirectiveRole::Identifier,
        },
        DirectiveKind::Define | DirectiveKind::Undef => DirectiveRole::Identifier,
        DirectiveKind::Line => match word {
            "hidden" | "default" => DirectiveRole::Keyword,
            _ => DirectiveRole::Text,
        },
        DirectiveKind::Nullable => match word {
            "enable" | "disable" | "restore" | "warnings" | "annotations" => {
                DirectiveRole::Keyword
            }
            _ => DirectiveRole::Text,
        },
        DirectiveKind::Pragma => match (previous, word) {
            (None, "warning" | "checksum") => DirectiveRole::Keyword,
            (Some("warning"), "disable" | "restore") => DirectiveRole::Keyword,
            (Some(_), _) => DirectiveRole::Identifier,
            (None, _) => DirectiveRole::Text,
        },
        _ => DirectiveRole::Text,
    }
}

/// Apply a directive to the conditional state. `line` holds the lexemes
/// returned by [`lex_directive_line`].
pub fn apply_directive(
    state: &mut PreprocessorState,
    kind: DirectiveKind,
    line: &[SpannedToken],
    source: &str,
) -> DirectiveEffect {
    let operands: Vec<&str> = line
        .iter()
        .skip_while(|t| !matches!(t.value, Token::Directive(DirectiveRole::Keyword)))
        .filter(|t| matches!(t.value, Token::Directive(_)))
        .skip(2)
        .map(|t| t.span.slice(source))
        .collect();

    match kind {
        DirectiveKind::If => {
            let condition = evaluate(&operands, state);
            state.push_if(condition);
            DirectiveEffect::None
        }
        DirectiveKind::Elif => {
            let condition = evaluate(&operands, state);
            if state.elif(condition) {
                DirectiveEffect::None
            } else {
                DirectiveEffect::Unmatched
            }
        }
        DirectiveKind::Else => {
            if state.else_branch() {
                DirectiveEffect::None
            } else {
                DirectiveEffect::Unmatched
            }
        }
        DirectiveKind::Endif => {
            if state.endif() {
                DirectiveEffect::None
            } else {
                DirectiveEffect::Unmatched
            }
        }
        DirectiveKind::Define if state.is_active() => {
            if let Some(symbol) = operands.first() {
                state.defined.insert((*symbol).to_string());
            }
            DirectiveEffect::None
        }
        DirectiveKind::Undef if state.is_active() => {
            if let Some(symbol) = operands.first() {
                state.defined.remove(*symbol);
            }
            DirectiveEffect::None
        }
        DirectiveKind::Bad => DirectiveEffect::Bad,
        _ => DirectiveEffect::None,
    }
}

// ============================================================================
// CONDITION EVALUATION
// ============================================================================

/// Evaluate `#if` operands. Malformed conditions evaluate to false.
pub fn evaluate(operands: &[&str], state: &PreprocessorState) -> bool {
    let mut parser = ConditionParser {
        operands,
        position: 0,
        state,
    };
    parser.or().unwrap_or(false)
}

struct ConditionParser<'a> {
    operands: &'a [&'a str],
    position: usize,
    state: &'a PreprocessorState,
}

impl<'a> ConditionParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.operands.get(self.position).copied()
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<bool> {
        let mut value = self.and()?;
        while self.eat("||") {
            value |= self.and()?;
        }
        Some(value)
    }

    fn and(&mut self) -> Option<bool> {
        let mut value = self.equality()?;
        while self.eat("&&") {
            value &= self.equality()?;
        }
        Some(value)
    }

    fn equality(&mut self) -> Option<bool> {
        let mut value = self.unary()?;
        loop {
            if self.eat("==") {
                value = value == self.unary()?;
            } else if self.eat("!=") {
                value = value != self.unary()?;
            } else {
                return Some(value);
            }
        }
    }

    fn unary(&mut self) -> Option<bool> {
        if self.eat("!") {
            return self.unary().map(|v| !v);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<bool> {
        if self.eat("(") {
            let value = self.or()?;
            self.eat(")");
            return Some(value);
        }
        let word = self.peek()?;
        self.position += 1;
        match word {
            "true" => Some(true),
            "false" => Some(false),
            symbol => Some(self.state.is_defined(symbol)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(source: &str) -> Vec<(Token, &str)> {
        let end = source.find('\n').unwrap_or(source.len());
        let (tokens, _) = lex_directive_line(source, 0, end);
        tokens
            .into_iter()
            .filter(|t| t.value != Token::Whitespace)
            .map(|t| (t.value, t.span.slice(source)))
            .collect()
    }

    #[test]
    fn test_region_label_is_text() {
        assert_eq!(
            roles("#region TaoRegion"),
            vec![
                (Token::Directive(DirectiveRole::Keyword), "#"),
                (Token::Directive(DirectiveRole::Keyword), "region"),
                (Token::Directive(DirectiveRole::Text), "TaoRegion"),
            ]
        );
    }

    #[test]
    fn test_bad_directive_is_text() {
        assert_eq!(
            roles("#!/usr/bin/env scriptcs"),
            vec![
                (Token::Directive(DirectiveRole::Keyword), "#"),
                (Token::Directive(DirectiveRole::Text), "!/usr/bin/env scriptcs"),
            ]
        );
    }

    #[test]
    fn test_if_expression_roles() {
        assert_eq!(
            roles("#if !(DEBUG && true) // note"),
            vec![
                (Token::Directive(DirectiveRole::Keyword), "#"),
                (Token::Directive(DirectiveRole::Keyword), "if"),
                (Token::Directive(DirectiveRole::Operator), "!"),
                (Token::Directive(DirectiveRole::Punctuation), "("),
                (Token::Directive(DirectiveRole::Identifier), "DEBUG"),
                (Token::Directive(DirectiveRole::Operator), "&&"),
                (Token::Directive(DirectiveRole::CSharpKeyword), "true"),
                (Token::Directive(DirectiveRole::Punctuation), ")"),
                (Token::LineComment, "// note"),
            ]
        );
    }

    #[test]
    fn test_pragma_and_line_roles() {
        let pragma = roles("#pragma warning disable 1591, CS0618");
        assert_eq!(pragma[2], (Token::Directive(DirectiveRole::Keyword), "warning"));
        assert_eq!(pragma[3], (Token::Directive(DirectiveRole::Keyword), "disable"));
        assert_eq!(pragma[4], (Token::Directive(DirectiveRole::Number), "1591"));
        assert_eq!(pragma[6], (Token::Directive(DirectiveRole::Identifier), "CS0618"));

        let line = roles("#line (1,2)-(3,4) 5 \"a.cs\"");
        assert_eq!(line[2], (Token::Directive(DirectiveRole::Punctuation), "("));
        assert_eq!(line[7], (Token::Directive(DirectiveRole::Operator), "-"));
        assert_eq!(line.last(), Some(&(Token::Directive(DirectiveRole::String), "\"a.cs\"")));

        let hidden = roles("#line hidden");
        assert_eq!(hidden[2], (Token::Directive(DirectiveRole::Keyword), "hidden"));
    }

    #[test]
    fn test_conditional_state() {
        let mut state = PreprocessorState::with_symbols(["DEBUG"]);
        let source = "#if DEBUG";
        let (line, kind) = lex_directive_line(source, 0, source.len());
        apply_directive(&mut state, kind, &line, source);
        assert!(state.is_active());

        let source = "#else";
        let (line, kind) = lex_directive_line(source, 0, source.len());
        apply_directive(&mut state, kind, &line, source);
        assert!(!state.is_active());

        let source = "#endif";
        let (line, kind) = lex_directive_line(source, 0, source.len());
        assert_eq!(apply_directive(&mut state, kind, &line, source), DirectiveEffect::None);
        assert!(state.is_active());
        assert_eq!(
            apply_directive(&mut state, kind, &line, source),
            DirectiveEffect::Unmatched
        );
    }

    #[test]
    fn test_evaluate_operators() {
        let state = PreprocessorState::with_symbols(["A"]);
        assert!(evaluate(&["A", "||", "B"], &state));
        assert!(!evaluate(&["A", "&&", "B"], &state));
        assert!(evaluate(&["!", "B"], &state));
        assert!(evaluate(&["A", "==", "true"], &state));
        assert!(!evaluate(&["false"], &state));
    }
}
