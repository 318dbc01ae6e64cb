//! Core C# lexer
//!
//! Produces the flat lexeme list for a text, trivia included. The lexer is
//! restartable: at every clean line start it records a [`LexCheckpoint`]
//! (offset, lexeme count and preprocessor state). Lexing resumed from a
//! checkpoint produces exactly the lexemes a whole-file pass would produce
//! from that point on, which is what the incremental session relies on.

use super::directives::{apply_directive, lex_directive_line, DirectiveEffect, PreprocessorState};
use super::doc_comment::{
    is_doc_block_start, is_doc_line_start, lex_doc_block, lex_doc_lines, line_break_len, line_end,
};
use super::{LexerError, LexicalDiagnostic};
use crate::config::constants::compile_time::file_processing::MAX_FILE_SIZE;
use crate::config::constants::compile_time::lexical::*;
use crate::config::ClassifierOptions;
use crate::grammar::keywords::reserved_keyword;
use crate::logging::codes;
use crate::tokens::{Punct, SpannedToken, StringForm, Token};
use crate::utils::{Span, Spanned};

/// Clean line start from which lexing can be resumed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexCheckpoint {
    pub offset: usize,
    /// Number of lexemes before `offset`
    pub lexeme_index: usize,
    pub state: PreprocessorState,
}

/// Lexemes, diagnostics and checkpoints of one lexing run
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<SpannedToken>,
    pub diagnostics: Vec<LexicalDiagnostic>,
    pub checkpoints: Vec<LexCheckpoint>,
}

/// One open interpolated string
#[derive(Debug, Clone, Copy)]
struct InterpolationFrame {
    form: StringForm,
    /// Brace count that opens or closes a hole (raw strings only)
    dollar_count: usize,
    /// Quote count that ends a raw string
    quote_count: usize,
    /// Bracket nesting inside the current hole
    depth: usize,
    in_hole: bool,
}

/// Lexer over one text
pub struct LexicalAnalyzer<'a> {
    source: &'a str,
    script: bool,
    pos: usize,
    base_index: usize,
    output: LexOutput,
    state: PreprocessorState,
    frames: Vec<InterpolationFrame>,
    at_line_start: bool,
    /// The next line start may depend on the previous line
    line_start_blocked: bool,
    finished: bool,
}

fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}' | '\u{85}')
}

fn is_inline_whitespace(ch: char) -> bool {
    (ch.is_whitespace() && !is_line_break(ch)) || ch == '\u{FEFF}'
}

pub(crate) fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

pub(crate) fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

impl<'a> LexicalAnalyzer<'a> {
    pub fn new(source: &'a str, options: &ClassifierOptions) -> Result<Self, LexerError> {
        let checkpoint = LexCheckpoint {
            offset: 0,
            lexeme_index: 0,
            state: PreprocessorState::with_symbols(options.preprocessor_symbols.iter().cloned()),
        };
        Self::resume(source, options, &checkpoint)
    }

    /// Start lexing at a checkpoint recorded by an earlier run over text
    /// that is identical up to `checkpoint.offset`
    pub fn resume(
        source: &'a str,
        options: &ClassifierOptions,
        checkpoint: &LexCheckpoint,
    ) -> Result<Self, LexerError> {
        if source.len() as u64 > MAX_FILE_SIZE {
            return Err(LexerError::InputTooLarge {
                size: source.len(),
                max: MAX_FILE_SIZE as usize,
            });
        }
        let offset = checkpoint.offset.min(source.len());
        let mut output = LexOutput::default();
        output
            .checkpoints
            .reserve(source.len() / 1024 * CHECKPOINTS_PER_KB + 1);
        Ok(Self {
            source,
            script: options.is_script(),
            pos: offset,
            base_index: checkpoint.lexeme_index,
            output,
            state: checkpoint.state.clone(),
            frames: Vec::new(),
            at_line_start: true,
            line_start_blocked: false,
            finished: false,
        })
    }

    /// Lex to end of input, or until `stop` accepts a freshly recorded
    /// checkpoint. Returns true when stopped at a checkpoint; the
    /// checkpoint is the last one in the output and no lexeme past it has
    /// been produced.
    pub fn run(
        &mut self,
        stop: &mut dyn FnMut(&LexCheckpoint) -> bool,
    ) -> Result<bool, LexerError> {
        while !self.finished {
            if self.at_line_start && self.frames.is_empty() {
                self.at_line_start = false;
                if self.record_checkpoint() {
                    let stopped = self
                        .output
                        .checkpoints
                        .last()
                        .map(|checkpoint| stop(checkpoint))
                        .unwrap_or(false);
                    if stopped {
                        return Ok(true);
                    }
                }
                self.lex_line_start();
            } else {
                self.at_line_start = false;
                self.lex_next();
            }

            if self.output.tokens.len() + self.base_index > MAX_TOKEN_COUNT {
                return Err(LexerError::TooManyTokens {
                    count: self.output.tokens.len() + self.base_index,
                });
            }
        }
        Ok(false)
    }

    pub fn finish(self) -> LexOutput {
        self.output
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    fn push(&mut self, token: Token, start: usize, end: usize) {
        if end > start || token == Token::Eof {
            self.output.tokens.push(Spanned::new(token, Span::new(start, end)));
        }
    }

    fn diagnostic(&mut self, code: crate::logging::Code, span: Span, message: impl Into<String>) {
        self.output
            .diagnostics
            .push(LexicalDiagnostic::new(code, span, message));
    }

    fn record_checkpoint(&mut self) -> bool {
        let blocked = std::mem::take(&mut self.line_start_blocked);
        if blocked || !self.state.is_active() {
            return false;
        }
        self.output.checkpoints.push(LexCheckpoint {
            offset: self.pos,
            lexeme_index: self.base_index + self.output.tokens.len(),
            state: self.state.clone(),
        });
        true
    }

    fn finish_input(&mut self) {
        if let Some(frame) = self.frames.last() {
            let form = frame.form;
            self.diagnostic(
                codes::lexical::UNTERMINATED_STRING,
                Span::empty(self.pos),
                format!("Unterminated {:?} interpolated string", form),
            );
            self.frames.clear();
        }
        if self.state.open_blocks() > 0 {
            self.diagnostic(
                codes::lexical::MISSING_ENDIF,
                Span::empty(self.pos),
                "#endif directive expected",
            );
        }
        self.push(Token::Eof, self.pos, self.pos);
        self.finished = true;
    }

    // ========================================================================
    // CHARACTER ACCESS
    // ========================================================================

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, text: &str) -> bool {
        self.rest().starts_with(text)
    }

    /// Advance while `predicate` holds, returning the start offset
    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !predicate(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());
        self.pos += len;
        start
    }

    fn count_run(&self, ch: char) -> usize {
        self.rest().chars().take_while(|c| *c == ch).count()
    }

    // ========================================================================
    // LINE START CONSTRUCTS
    // ========================================================================

    fn lex_line_start(&mut self) {
        if self.pos >= self.source.len() {
            self.finish_input();
            return;
        }

        if !self.state.is_active() {
            self.lex_inactive_line();
            return;
        }

        if self.pos == 0 && self.script && self.starts_with("#!") {
            let start = self.pos;
            self.pos = line_end(self.source, start);
            self.push(Token::Shebang, start, self.pos);
            return;
        }

        if let Some(marker) = self.conflict_marker() {
            self.lex_conflict_marker(marker);
            return;
        }

        let indent_start = self.pos;
        self.eat_while(is_inline_whitespace);
        self.push(Token::Whitespace, indent_start, self.pos);
        if self.peek() == Some('#') {
            self.lex_directive();
        }
    }

    fn lex_inactive_line(&mut self) {
        let indent = self
            .rest()
            .char_indices()
            .find(|(_, c)| !is_inline_whitespace(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());
        if self.rest()[indent..].starts_with('#') {
            self.push(Token::Whitespace, self.pos, self.pos + indent);
            self.pos += indent;
            self.lex_directive();
            return;
        }

        // One excluded run up to the next directive line
        let start = self.pos;
        let mut line = self.pos;
        loop {
            let end = line_end(self.source, line);
            match line_break_len(self.source, end) {
                Some(len) => {
                    line = end + len;
                    let next = self.source[line..].trim_start_matches(is_inline_whitespace);
                    if next.starts_with('#') {
                        break;
                    }
                }
                None => {
                    line = end;
                    break;
                }
            }
        }
        self.pos = line;
        self.push(Token::DisabledText, start, self.pos);
        self.at_line_start = true;
        self.line_start_blocked = true;
    }

    fn lex_directive(&mut self) {
        let hash = self.pos;
        let end = line_end(self.source, hash);
        let (line, kind) = lex_directive_line(self.source, hash, end);
        let effect = apply_directive(&mut self.state, kind, &line, self.source);
        self.output.tokens.extend(line);
        self.pos = end;

        match effect {
            DirectiveEffect::None => {}
            DirectiveEffect::Unmatched => self.diagnostic(
                codes::lexical::UNEXPECTED_DIRECTIVE,
                Span::new(hash, end),
                "Unexpected preprocessor directive",
            ),
            DirectiveEffect::Bad => self.diagnostic(
                codes::lexical::INVALID_DIRECTIVE,
                Span::new(hash, end),
                "Preprocessor directive expected",
            ),
        }
    }

    /// Marker character if a merge conflict marker starts this line
    fn conflict_marker(&self) -> Option<char> {
        let first = self.peek()?;
        if !matches!(first, '<' | '|' | '=' | '>') {
            return None;
        }
        if self.count_run(first) != CONFLICT_MARKER_LENGTH {
            return None;
        }
        match self.peek_at(CONFLICT_MARKER_LENGTH) {
            None | Some(' ') => Some(first),
            Some(c) if is_line_break(c) => Some(first),
            _ => None,
        }
    }

    fn is_marker_line(&self, offset: usize, marker: char) -> bool {
        let text = &self.source[offset..];
        text.chars().take_while(|c| *c == marker).count() == CONFLICT_MARKER_LENGTH
            && text[CONFLICT_MARKER_LENGTH..]
                .chars()
                .next()
                .map(|c| c == ' ' || is_line_break(c))
                .unwrap_or(true)
    }

    fn lex_conflict_marker(&mut self, marker: char) {
        let start = self.pos;
        self.pos = line_end(self.source, start);
        self.push(Token::ConflictMarker, start, self.pos);
        self.diagnostic(
            codes::lexical::CONFLICT_MARKER,
            Span::new(start, self.pos),
            "Merge conflict marker encountered",
        );

        let until = match marker {
            '=' => '>',
            '|' => '=',
            _ => return,
        };

        let Some(break_len) = line_break_len(self.source, self.pos) else {
            return;
        };
        self.push(Token::EndOfLine, self.pos, self.pos + break_len);
        self.pos += break_len;

        let excluded = self.pos;
        while self.pos < self.source.len() && !self.is_marker_line(self.pos, until) {
            let end = line_end(self.source, self.pos);
            self.pos = end + line_break_len(self.source, end).unwrap_or(0);
        }
        self.push(Token::DisabledText, excluded, self.pos);
        self.at_line_start = true;
        self.line_start_blocked = true;
    }

    // ========================================================================
    // TOKENS
    // ========================================================================

    fn lex_next(&mut self) {
        let Some(ch) = self.peek() else {
            self.finish_input();
            return;
        };

        if let Some(frame) = self.frames.last() {
            if !frame.in_hole {
                self.lex_interpolated_text();
                return;
            }
        }

        let start = self.pos;
        match ch {
            c if is_line_break(c) => {
                let len = line_break_len(self.source, start).unwrap_or(1);
                self.pos += len;
                self.push(Token::EndOfLine, start, self.pos);
                self.at_line_start = true;
            }
            c if is_inline_whitespace(c) => {
                self.eat_while(is_inline_whitespace);
                self.push(Token::Whitespace, start, self.pos);
            }
            '/' if self.starts_with("//") => self.lex_line_comment(),
            '/' if self.starts_with("/*") => self.lex_block_comment(),
            '"' => {
                let quotes = self.count_run('"');
                if quotes >= 3 {
                    self.pos += quotes;
                    self.lex_raw_string(start, quotes);
                } else {
                    self.pos += 1;
                    self.lex_regular_string(start);
                }
            }
            '\'' => self.lex_char(),
            '@' => self.lex_at(),
            '$' => self.lex_dollar(),
            c if c.is_ascii_digit() => self.lex_number(),
            '.' if self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                self.lex_number()
            }
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_part);
                let text = &self.source[start..self.pos];
                let token = match reserved_keyword(text) {
                    Some(keyword) => Token::Keyword(keyword),
                    None => Token::Identifier,
                };
                self.push(token, start, self.pos);
            }
            _ => self.lex_punctuation(ch),
        }
    }

    fn lex_line_comment(&mut self) {
        let start = self.pos;
        if self.frames.is_empty() && is_doc_line_start(self.source, start) {
            let doc = lex_doc_lines(self.source, start);
            self.output.tokens.extend(doc.tokens);
            self.pos = doc.end;
            self.line_start_blocked = true;
            return;
        }
        self.pos = line_end(self.source, start);
        self.push(Token::LineComment, start, self.pos);
    }

    fn lex_block_comment(&mut self) {
        let start = self.pos;
        if self.frames.is_empty() && is_doc_block_start(self.source, start) {
            let doc = lex_doc_block(self.source, start);
            if doc.unterminated {
                self.diagnostic(
                    codes::lexical::UNTERMINATED_COMMENT,
                    Span::new(start, doc.end),
                    "End-of-file found, '*/' expected",
                );
            }
            self.output.tokens.extend(doc.tokens);
            self.pos = doc.end;
            self.line_start_blocked = true;
            return;
        }
        match self.source[start + 2..].find("*/") {
            Some(i) => self.pos = start + 2 + i + 2,
            None => {
                self.pos = self.source.len();
                self.diagnostic(
                    codes::lexical::UNTERMINATED_COMMENT,
                    Span::new(start, self.pos),
                    "End-of-file found, '*/' expected",
                );
            }
        }
        self.push(Token::BlockComment, start, self.pos);
    }

    fn eat_u8_suffix(&mut self) {
        if self.starts_with("u8") || self.starts_with("U8") {
            self.pos += 2;
        }
    }

    /// The opening quote has been consumed
    fn lex_regular_string(&mut self, start: usize) {
        loop {
            match self.peek() {
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    let len = super::escapes::escape_len(self.rest());
                    // An escape never swallows the line break
                    let len = self.rest()[..len]
                        .char_indices()
                        .skip(1)
                        .find(|(_, c)| is_line_break(*c))
                        .map(|(i, _)| i)
                        .unwrap_or(len);
                    self.pos += len;
                }
                Some(c) if !is_line_break(c) => self.pos += c.len_utf8(),
                _ => {
                    self.diagnostic(
                        codes::lexical::UNTERMINATED_STRING,
                        Span::new(start, self.pos),
                        "Newline in constant",
                    );
                    break;
                }
            }
        }
        self.eat_u8_suffix();
        self.push(Token::String(StringForm::Regular), start, self.pos);
    }

    /// The `@"` opener has been consumed
    fn lex_verbatim_string(&mut self, start: usize) {
        loop {
            match self.peek() {
                Some('"') if self.peek_at(1) == Some('"') => self.pos += 2,
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => self.pos += c.len_utf8(),
                None => {
                    self.diagnostic(
                        codes::lexical::UNTERMINATED_STRING,
                        Span::new(start, self.pos),
                        "Unterminated verbatim string literal",
                    );
                    break;
                }
            }
        }
        self.eat_u8_suffix();
        self.push(Token::String(StringForm::Verbatim), start, self.pos);
    }

    /// The opening quote run of length `quotes` has been consumed
    fn lex_raw_string(&mut self, start: usize, quotes: usize) {
        loop {
            match self.peek() {
                Some('"') => {
                    let run = self.count_run('"');
                    self.pos += run;
                    if run >= quotes {
                        break;
                    }
                }
                Some(c) => self.pos += c.len_utf8(),
                None => {
                    self.diagnostic(
                        codes::lexical::UNTERMINATED_STRING,
                        Span::new(start, self.pos),
                        "Unterminated raw string literal",
                    );
                    break;
                }
            }
        }
        self.eat_u8_suffix();
        self.push(Token::String(StringForm::Raw), start, self.pos);
    }

    fn lex_char(&mut self) {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                Some('\'') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    let len = super::escapes::escape_len(self.rest());
                    let len = self.rest()[..len]
                        .char_indices()
                        .skip(1)
                        .find(|(_, c)| is_line_break(*c))
                        .map(|(i, _)| i)
                        .unwrap_or(len);
                    self.pos += len;
                }
                Some(c) if !is_line_break(c) => self.pos += c.len_utf8(),
                _ => {
                    self.diagnostic(
                        codes::lexical::UNTERMINATED_STRING,
                        Span::new(start, self.pos),
                        "Newline in constant",
                    );
                    break;
                }
            }
        }
        self.push(Token::Char, start, self.pos);
    }

    fn lex_at(&mut self) {
        let start = self.pos;
        match self.peek_at(1) {
            Some('"') => {
                self.pos += 2;
                self.lex_verbatim_string(start);
            }
            Some('$') if self.peek_at(2) == Some('"') => {
                self.pos += 3;
                self.open_interpolation(start, StringForm::Verbatim, 1, 1);
            }
            Some(c) if is_identifier_start(c) => {
                self.pos += 1;
                self.eat_while(is_identifier_part);
                self.push(Token::Identifier, start, self.pos);
            }
            _ => {
                self.pos += 1;
                self.push(Token::Bad, start, self.pos);
                self.diagnostic(
                    codes::lexical::INVALID_CHARACTER,
                    Span::new(start, self.pos),
                    "Keyword, identifier, or string expected after verbatim specifier: @",
                );
            }
        }
    }

    fn lex_dollar(&mut self) {
        let start = self.pos;
        let dollars = self.count_run('$');
        let after = self.pos + dollars;
        let rest = &self.source[after..];

        if rest.starts_with("\"\"\"") {
            let quotes = rest.chars().take_while(|c| *c == '"').count();
            self.pos = after + quotes;
            self.open_interpolation(start, StringForm::Raw, dollars, quotes);
        } else if rest.starts_with("@\"") {
            self.pos = after + 2;
            self.open_interpolation(start, StringForm::Verbatim, 1, 1);
        } else if rest.starts_with('"') {
            self.pos = after + 1;
            self.open_interpolation(start, StringForm::Regular, 1, 1);
        } else {
            self.pos = after;
            self.push(Token::Bad, start, self.pos);
            self.diagnostic(
                codes::lexical::INVALID_CHARACTER,
                Span::new(start, self.pos),
                "Unexpected character '$'",
            );
        }
    }

    fn open_interpolation(
        &mut self,
        start: usize,
        form: StringForm,
        dollar_count: usize,
        quote_count: usize,
    ) {
        if self.frames.len() >= MAX_INTERPOLATION_DEPTH {
            self.diagnostic(
                codes::lexical::INTERPOLATION_TOO_DEEP,
                Span::new(start, self.pos),
                "Interpolated strings nested too deeply",
            );
            // Lex the remainder as an ordinary literal of the same form
            match form {
                StringForm::Raw => self.lex_raw_string(start, quote_count),
                StringForm::Verbatim => self.lex_verbatim_string(start),
                StringForm::Regular => self.lex_regular_string(start),
            }
            return;
        }
        self.push(Token::InterpolatedStart(form), start, self.pos);
        self.frames.push(InterpolationFrame {
            form,
            dollar_count,
            quote_count,
            depth: 0,
            in_hole: false,
        });
    }

    fn lex_interpolated_text(&mut self) {
        let Some(frame) = self.frames.last().copied() else {
            return;
        };
        let start = self.pos;

        loop {
            let Some(ch) = self.peek() else {
                self.push(Token::InterpolatedText(frame.form), start, self.pos);
                self.finish_input();
                return;
            };
            match frame.form {
                StringForm::Regular | StringForm::Verbatim => {
                    if ch == '\\' && frame.form == StringForm::Regular {
                        let len = super::escapes::escape_len(self.rest());
                        if self.rest()[1..].starts_with(|c: char| is_line_break(c)) {
                            self.pos += 1;
                        } else {
                            self.pos += len;
                        }
                        continue;
                    }
                    if (ch == '{' || ch == '}') && self.peek_at(1) == Some(ch) {
                        self.pos += 2;
                        continue;
                    }
                    if ch == '"' && frame.form == StringForm::Verbatim && self.peek_at(1) == Some('"') {
                        self.pos += 2;
                        continue;
                    }
                    if ch == '{' {
                        self.push(Token::InterpolatedText(frame.form), start, self.pos);
                        self.open_hole(1);
                        return;
                    }
                    if ch == '"' {
                        self.push(Token::InterpolatedText(frame.form), start, self.pos);
                        let close = self.pos;
                        self.pos += 1;
                        self.push(Token::InterpolatedEnd(frame.form), close, self.pos);
                        self.frames.pop();
                        return;
                    }
                    if frame.form == StringForm::Regular && is_line_break(ch) {
                        self.push(Token::InterpolatedText(frame.form), start, self.pos);
                        self.diagnostic(
                            codes::lexical::UNTERMINATED_STRING,
                            Span::empty(self.pos),
                            "Newline in constant",
                        );
                        self.frames.pop();
                        return;
                    }
                    self.pos += ch.len_utf8();
                }
                StringForm::Raw => {
                    if ch == '{' {
                        let run = self.count_run('{');
                        if run >= frame.dollar_count {
                            // Extra braces before the hole are content
                            self.pos += run - frame.dollar_count;
                            self.push(Token::InterpolatedText(frame.form), start, self.pos);
                            self.open_hole(frame.dollar_count);
                            return;
                        }
                        self.pos += run;
                        continue;
                    }
                    if ch == '"' {
                        let run = self.count_run('"');
                        if run >= frame.quote_count {
                            self.push(Token::InterpolatedText(frame.form), start, self.pos);
                            let close = self.pos;
                            self.pos += run;
                            self.push(Token::InterpolatedEnd(frame.form), close, self.pos);
                            self.frames.pop();
                            return;
                        }
                        self.pos += run;
                        continue;
                    }
                    self.pos += ch.len_utf8();
                }
            }
        }
    }

    fn open_hole(&mut self, braces: usize) {
        let start = self.pos;
        self.pos += braces;
        self.push(Token::InterpolationOpen, start, self.pos);
        if let Some(frame) = self.frames.last_mut() {
            frame.in_hole = true;
            frame.depth = 0;
        }
    }

    fn close_hole(&mut self) {
        let Some(frame) = self.frames.last().copied() else {
            return;
        };
        let start = self.pos;
        let braces = self.count_run('}').min(frame.dollar_count).max(1);
        self.pos += braces;
        self.push(Token::InterpolationClose, start, self.pos);
        if let Some(frame) = self.frames.last_mut() {
            frame.in_hole = false;
        }
    }

    /// Format clause after a top-level `:` in a hole
    fn lex_format_clause(&mut self) {
        let Some(frame) = self.frames.last().copied() else {
            return;
        };
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '}' || ch == '"' || (frame.form == StringForm::Regular && is_line_break(ch)) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.push(Token::InterpolationFormat, start, self.pos);
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        let radix_prefix = self.starts_with("0x")
            || self.starts_with("0X")
            || self.starts_with("0b")
            || self.starts_with("0B");
        if radix_prefix {
            self.pos += 2;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
            if self.peek() == Some('.') && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
            {
                self.pos += 1;
                self.eat_while(|c| c.is_ascii_digit() || c == '_');
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let sign = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if self.peek_at(digit_at).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.pos += digit_at;
                    self.eat_while(|c| c.is_ascii_digit() || c == '_');
                }
            }
        }
        // Type suffixes: u, l, ul, f, d, m
        self.eat_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L' | 'f' | 'F' | 'd' | 'D' | 'm' | 'M'));
        self.push(Token::Number, start, self.pos);
    }

    fn lex_punctuation(&mut self, ch: char) {
        let start = self.pos;

        if let Some(frame) = self.frames.last().copied() {
            if frame.in_hole {
                match ch {
                    '}' if frame.depth == 0 => {
                        self.close_hole();
                        return;
                    }
                    ':' if frame.depth == 0 && !self.starts_with("::") => {
                        self.pos += 1;
                        self.push(Token::Punct(Punct::Colon), start, self.pos);
                        self.lex_format_clause();
                        return;
                    }
                    '{' | '(' | '[' => {
                        if let Some(frame) = self.frames.last_mut() {
                            frame.depth += 1;
                        }
                    }
                    '}' | ')' | ']' => {
                        if let Some(frame) = self.frames.last_mut() {
                            frame.depth = frame.depth.saturating_sub(1);
                        }
                    }
                    _ => {}
                }
            }
        }

        let Some(punct) = match_punct(self.rest()) else {
            self.pos += ch.len_utf8();
            self.push(Token::Bad, start, self.pos);
            self.diagnostic(
                codes::lexical::INVALID_CHARACTER,
                Span::new(start, self.pos),
                format!("Unexpected character '{}'", ch.escape_default()),
            );
            return;
        };
        self.pos += punct.as_str().len();
        self.push(Token::Punct(punct), start, self.pos);
    }
}

/// Longest punctuator at the start of `text`. `>` is never combined with
/// a following `>`.
fn match_punct(text: &str) -> Option<Punct> {
    const TABLE: &[(&str, Punct)] = &[
        ("<<=", Punct::LtLtEq),
        ("??=", Punct::QuestionQuestionEq),
        ("::", Punct::ColonColon),
        ("..", Punct::DotDot),
        ("!=", Punct::BangEq),
        ("==", Punct::EqEq),
        ("=>", Punct::Arrow),
        ("->", Punct::MinusGt),
        ("<=", Punct::LtEq),
        ("<<", Punct::LtLt),
        (">=", Punct::GtEq),
        ("??", Punct::QuestionQuestion),
        ("&&", Punct::AmpAmp),
        ("&=", Punct::AmpEq),
        ("||", Punct::PipePipe),
        ("|=", Punct::PipeEq),
        ("^=", Punct::CaretEq),
        ("++", Punct::PlusPlus),
        ("+=", Punct::PlusEq),
        ("--", Punct::MinusMinus),
        ("-=", Punct::MinusEq),
        ("*=", Punct::StarEq),
        ("/=", Punct::SlashEq),
        ("%=", Punct::PercentEq),
        ("{", Punct::OpenBrace),
        ("}", Punct::CloseBrace),
        ("(", Punct::OpenParen),
        (")", Punct::CloseParen),
        ("[", Punct::OpenBracket),
        ("]", Punct::CloseBracket),
        (".", Punct::Dot),
        (",", Punct::Comma),
        (":", Punct::Colon),
        (";", Punct::Semicolon),
        ("~", Punct::Tilde),
        ("!", Punct::Bang),
        ("=", Punct::Eq),
        ("<", Punct::Lt),
        (">", Punct::Gt),
        ("?", Punct::Question),
        ("&", Punct::Amp),
        ("|", Punct::Pipe),
        ("^", Punct::Caret),
        ("+", Punct::Plus),
        ("-", Punct::Minus),
        ("*", Punct::Star),
        ("/", Punct::Slash),
        ("%", Punct::Percent),
    ];
    TABLE
        .iter()
        .find(|(text_form, _)| text.starts_with(text_form))
        .map(|(_, punct)| *punct)
}
