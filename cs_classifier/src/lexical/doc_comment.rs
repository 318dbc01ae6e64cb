//! XML documentation comment lexing
//!
//! A doc comment is a run of `///` lines or a `/** */` block. The exterior
//! markers (`///`, the leading `*` of block lines) split the XML content
//! into per-line segments. The XML scanner works on the concatenated
//! content and every piece it produces is cut at segment boundaries, with
//! the line break and exterior delimiter re-emitted in between.

use crate::grammar::keywords::is_reserved_keyword;
use crate::tokens::{CrefPiece, DocPiece, SpannedToken, Token};
use crate::utils::{Span, Spanned};

/// Element names whose `name` attribute refers to a parameter or type parameter
const NAME_REFERENCE_ELEMENTS: &[&str] = &["param", "paramref", "typeparam", "typeparamref"];

/// Result of lexing one doc comment
#[derive(Debug)]
pub struct DocComment {
    pub tokens: Vec<SpannedToken>,
    /// Offset just past the comment (before the final line break for `///`)
    pub end: usize,
    /// A `/** */` block that ran to end of input
    pub unterminated: bool,
}

/// Width of the line break starting at `offset`, if any
pub(crate) fn line_break_len(source: &str, offset: usize) -> Option<usize> {
    let rest = source.get(offset..)?;
    if rest.starts_with("\r\n") {
        return Some(2);
    }
    match rest.chars().next()? {
        '\n' | '\r' => Some(1),
        c @ ('\u{2028}' | '\u{2029}' | '\u{85}') => Some(c.len_utf8()),
        _ => None,
    }
}

/// Offset of the next line break at or after `offset`, or the end of input
pub(crate) fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .char_indices()
        .find(|(_, c)| matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}' | '\u{85}'))
        .map(|(i, _)| offset + i)
        .unwrap_or(source.len())
}

fn skip_inline_whitespace(source: &str, offset: usize) -> usize {
    source[offset..]
        .char_indices()
        .find(|(_, c)| !matches!(c, ' ' | '\t' | '\u{0B}' | '\u{0C}'))
        .map(|(i, _)| offset + i)
        .unwrap_or(source.len())
}

/// Whether a `///` doc line starts at `offset`
pub fn is_doc_line_start(source: &str, offset: usize) -> bool {
    let rest = &source[offset..];
    rest.starts_with("///") && !rest.starts_with("////")
}

/// Whether a `/** */` doc block starts at `offset`
pub fn is_doc_block_start(source: &str, offset: usize) -> bool {
    let rest = &source[offset..];
    rest.starts_with("/**") && !rest.starts_with("/**/") && !rest.starts_with("/***")
}

/// Lex a run of `///` lines starting at `start`
pub fn lex_doc_lines(source: &str, start: usize) -> DocComment {
    let mut prefix = vec![Spanned::new(
        Token::Doc(DocPiece::Delimiter),
        Span::new(start, start + 3),
    )];
    let mut segments = Vec::new();
    let mut gaps = Vec::new();

    let mut content_start = start + 3;
    loop {
        let end = line_end(source, content_start);
        segments.push(content_start..end);

        let Some(break_len) = line_break_len(source, end) else {
            break;
        };
        let next_line = end + break_len;
        let marker = skip_inline_whitespace(source, next_line);
        if !is_doc_line_start(source, marker) {
            break;
        }

        let mut gap = vec![Spanned::new(Token::EndOfLine, Span::new(end, next_line))];
        if marker > next_line {
            gap.push(Spanned::new(Token::Whitespace, Span::new(next_line, marker)));
        }
        gap.push(Spanned::new(
            Token::Doc(DocPiece::Delimiter),
            Span::new(marker, marker + 3),
        ));
        gaps.push(gap);
        content_start = marker + 3;
    }

    let end = segments.last().map(|s| s.end).unwrap_or(start + 3);
    let mut builder = DocBuilder::new(source, &segments, gaps);
    builder.scan();
    prefix.extend(builder.finish());

    DocComment {
        tokens: prefix,
        end,
        unterminated: false,
    }
}

/// Lex a `/** ... */` block starting at `start`
pub fn lex_doc_block(source: &str, start: usize) -> DocComment {
    let body_start = start + 3;
    let (close, unterminated) = match source[body_start..].find("*/") {
        Some(i) => (body_start + i, false),
        None => (source.len(), true),
    };

    let mut segments = Vec::new();
    let mut gaps = Vec::new();
    let mut content_start = body_start;
    loop {
        let end = line_end(source, content_start).min(close);
        segments.push(content_start..end);
        if end >= close {
            break;
        }
        let Some(break_len) = line_break_len(source, end) else {
            break;
        };
        let next_line = end + break_len;
        let marker = skip_inline_whitespace(source, next_line).min(close);

        let mut gap = vec![Spanned::new(Token::EndOfLine, Span::new(end, next_line))];
        if marker > next_line {
            gap.push(Spanned::new(Token::Whitespace, Span::new(next_line, marker)));
        }
        content_start = marker;
        if marker < close && source[marker..].starts_with('*') {
            gap.push(Spanned::new(
                Token::Doc(DocPiece::Delimiter),
                Span::new(marker, marker + 1),
            ));
            content_start = marker + 1;
        }
        gaps.push(gap);
    }

    let mut tokens = vec![Spanned::new(
        Token::Doc(DocPiece::Delimiter),
        Span::new(start, body_start),
    )];
    let mut builder = DocBuilder::new(source, &segments, gaps);
    builder.scan();
    tokens.extend(builder.finish());

    let end = if unterminated {
        source.len()
    } else {
        tokens.push(Spanned::new(
            Token::Doc(DocPiece::Delimiter),
            Span::new(close, close + 2),
        ));
        close + 2
    };

    DocComment {
        tokens,
        end,
        unterminated,
    }
}

// ============================================================================
// XML SCANNER
// ============================================================================

struct DocChar {
    ch: char,
    offset: usize,
    segment: usize,
}

struct DocBuilder {
    chars: Vec<DocChar>,
    gaps: Vec<Vec<SpannedToken>>,
    next_gap: usize,
    segment_count: usize,
    out: Vec<SpannedToken>,
    position: usize,
}

impl DocBuilder {
    fn new(
        source: &str,
        segments: &[std::ops::Range<usize>],
        gaps: Vec<Vec<SpannedToken>>,
    ) -> Self {
        let mut chars = Vec::new();
        for (segment, range) in segments.iter().enumerate() {
            for (i, ch) in source[range.clone()].char_indices() {
                chars.push(DocChar {
                    ch,
                    offset: range.start + i,
                    segment,
                });
            }
        }
        Self {
            chars,
            gaps,
            next_gap: 0,
            segment_count: segments.len(),
            out: Vec::new(),
            position: 0,
        }
    }

    fn finish(mut self) -> Vec<SpannedToken> {
        self.flush_gaps_until(self.segment_count.saturating_sub(1));
        self.out
    }

    fn flush_gaps_until(&mut self, segment: usize) {
        while self.next_gap < segment && self.next_gap < self.gaps.len() {
            let gap = std::mem::take(&mut self.gaps[self.next_gap]);
            self.out.extend(gap);
            self.next_gap += 1;
        }
    }

    /// Emit chars `[from, to)` as `token`, split at segment boundaries
    fn emit(&mut self, token: Token, from: usize, to: usize) {
        let mut k = from;
        while k < to {
            let segment = self.chars[k].segment;
            self.flush_gaps_until(segment);
            let start = self.chars[k].offset;
            let mut j = k;
            while j < to && self.chars[j].segment == segment {
                j += 1;
            }
            let last = &self.chars[j - 1];
            let end = last.offset + last.ch.len_utf8();
            self.out.push(Spanned::new(token, Span::new(start, end)));
            k = j;
        }
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.position + n).map(|c| c.ch)
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, expected)| self.peek(i) == Some(expected))
    }

    fn find(&self, text: &str) -> Option<usize> {
        (self.position..self.chars.len()).find(|&start| {
            text.chars()
                .enumerate()
                .all(|(i, expected)| self.chars.get(start + i).map(|c| c.ch) == Some(expected))
        })
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> usize {
        let start = self.position;
        while let Some(ch) = self.peek(0) {
            if !predicate(ch) {
                break;
            }
            self.position += 1;
        }
        start
    }

    fn emit_fixed(&mut self, piece: DocPiece, len: usize) {
        let start = self.position;
        self.position = (self.position + len).min(self.chars.len());
        self.emit(Token::Doc(piece), start, self.position);
    }

    fn scan(&mut self) {
        while self.position < self.chars.len() {
            match self.peek(0) {
                Some('<') => self.scan_markup(),
                Some('&') => self.scan_entity(DocPiece::Text),
                _ => {
                    let start = self.take_while(|c| c != '<' && c != '&');
                    self.emit(Token::Doc(DocPiece::Text), start, self.position);
                }
            }
        }
    }

    fn scan_entity(&mut self, fallback: DocPiece) {
        let start = self.position;
        self.position += 1;
        self.take_while(|c| c == '#' || c.is_ascii_alphanumeric());
        if self.peek(0) == Some(';') && self.position > start + 1 {
            self.position += 1;
            self.emit(Token::Doc(DocPiece::EntityReference), start, self.position);
        } else {
            self.emit(Token::Doc(fallback), start, self.position);
        }
    }

    fn scan_delimited(&mut self, piece: DocPiece, open: &str, close: &str) {
        self.emit_fixed(piece, open.chars().count());
        match self.find(close) {
            Some(end) => {
                if end > self.position {
                    let start = self.position;
                    self.position = end;
                    self.emit(Token::Doc(piece), start, end);
                }
                self.emit_fixed(piece, close.chars().count());
            }
            None => {
                let start = self.position;
                self.position = self.chars.len();
                self.emit(Token::Doc(piece), start, self.position);
            }
        }
    }

    fn scan_markup(&mut self) {
        if self.starts_with("<!--") {
            self.scan_delimited(DocPiece::Comment, "<!--", "-->");
        } else if self.starts_with("<![CDATA[") {
            self.scan_delimited(DocPiece::CData, "<![CDATA[", "]]>");
        } else if self.starts_with("<?") {
            self.scan_processing_instruction();
        } else if self.starts_with("</") {
            self.emit_fixed(DocPiece::Delimiter, 2);
            self.whitespace_then(DocPiece::Name);
            let start = self.take_while(is_name_char);
            self.emit(Token::Doc(DocPiece::Name), start, self.position);
            self.whitespace_then(DocPiece::Delimiter);
            if self.peek(0) == Some('>') {
                self.emit_fixed(DocPiece::Delimiter, 1);
            }
        } else {
            self.scan_start_tag();
        }
    }

    fn scan_processing_instruction(&mut self) {
        self.emit_fixed(DocPiece::ProcessingInstruction, 2);
        while self.position < self.chars.len() {
            if self.starts_with("?>") {
                self.emit_fixed(DocPiece::ProcessingInstruction, 2);
                return;
            }
            let is_space = self.peek(0).map(char::is_whitespace).unwrap_or(false);
            let start = if is_space {
                self.take_while(char::is_whitespace)
            } else {
                let start = self.position;
                while let Some(ch) = self.peek(0) {
                    if ch.is_whitespace() || self.starts_with("?>") {
                        break;
                    }
                    self.position += 1;
                }
                start
            };
            self.emit(Token::Doc(DocPiece::ProcessingInstruction), start, self.position);
        }
    }

    /// Consume whitespace and emit it with the role of the token that follows
    fn whitespace_then(&mut self, piece: DocPiece) {
        let start = self.take_while(char::is_whitespace);
        if self.position > start {
            self.emit(Token::Doc(piece), start, self.position);
        }
    }

    fn pending_whitespace(&mut self) -> (usize, usize) {
        let start = self.take_while(char::is_whitespace);
        (start, self.position)
    }

    fn scan_start_tag(&mut self) {
        self.emit_fixed(DocPiece::Delimiter, 1);
        self.whitespace_then(DocPiece::Name);
        let name_start = self.take_while(is_name_char);
        let element: String = self.chars[name_start..self.position]
            .iter()
            .map(|c| c.ch)
            .collect();
        self.emit(Token::Doc(DocPiece::Name), name_start, self.position);

        loop {
            let (ws_start, ws_end) = self.pending_whitespace();
            match self.peek(0) {
                Some('>') => {
                    self.emit(Token::Doc(DocPiece::Delimiter), ws_start, ws_end);
                    self.emit_fixed(DocPiece::Delimiter, 1);
                    return;
                }
                Some('/') if self.peek(1) == Some('>') => {
                    self.emit(Token::Doc(DocPiece::Delimiter), ws_start, ws_end);
                    self.emit_fixed(DocPiece::Delimiter, 2);
                    return;
                }
                Some(ch) if is_name_char(ch) => {
                    self.emit(Token::Doc(DocPiece::AttributeName), ws_start, ws_end);
                    self.scan_attribute(&element);
                }
                _ => {
                    // Malformed tag; leftover whitespace is plain text
                    self.emit(Token::Doc(DocPiece::Text), ws_start, ws_end);
                    return;
                }
            }
        }
    }

    fn scan_attribute(&mut self, element: &str) {
        let name_start = self.take_while(is_name_char);
        let name: String = self.chars[name_start..self.position]
            .iter()
            .map(|c| c.ch)
            .collect();
        self.emit(Token::Doc(DocPiece::AttributeName), name_start, self.position);

        let (ws_start, ws_end) = self.pending_whitespace();
        if self.peek(0) != Some('=') {
            self.position = ws_start;
            return;
        }
        self.emit(Token::Doc(DocPiece::Delimiter), ws_start, ws_end);
        self.emit_fixed(DocPiece::Delimiter, 1);

        self.whitespace_then(DocPiece::AttributeQuotes);
        let quote = match self.peek(0) {
            Some(q @ ('"' | '\'')) => q,
            _ => return,
        };
        self.emit_fixed(DocPiece::AttributeQuotes, 1);

        let value_start = self.position;
        self.take_while(|c| c != quote && c != '<');
        let value_end = self.position;

        if name == "cref" {
            self.lex_cref(value_start, value_end);
        } else if name == "name" && NAME_REFERENCE_ELEMENTS.contains(&element) {
            self.lex_name_reference(value_start, value_end);
        } else {
            self.lex_attribute_value(value_start, value_end);
        }

        self.position = value_end;
        if self.peek(0) == Some(quote) {
            self.emit_fixed(DocPiece::AttributeQuotes, 1);
        }
    }

    fn lex_attribute_value(&mut self, from: usize, to: usize) {
        self.position = from;
        while self.position < to {
            if self.peek(0) == Some('&') {
                self.scan_entity(DocPiece::AttributeValue);
                continue;
            }
            let start = self.position;
            while self.position < to && self.peek(0) != Some('&') {
                self.position += 1;
            }
            self.emit(Token::Doc(DocPiece::AttributeValue), start, self.position);
        }
    }

    fn lex_name_reference(&mut self, from: usize, to: usize) {
        let mut k = from;
        while k < to {
            let is_space = self.chars[k].ch.is_whitespace();
            let start = k;
            while k < to && self.chars[k].ch.is_whitespace() == is_space {
                k += 1;
            }
            let token = if is_space {
                Token::Doc(DocPiece::AttributeValue)
            } else {
                Token::DocName
            };
            self.emit(token, start, k);
        }
    }

    /// `cref` values are lexed as code
    fn lex_cref(&mut self, from: usize, to: usize) {
        let mut k = from;
        while k < to {
            let ch = self.chars[k].ch;
            let start = k;
            let token = if ch.is_whitespace() {
                while k < to && self.chars[k].ch.is_whitespace() {
                    k += 1;
                }
                Token::Whitespace
            } else if ch == '_' || ch == '@' || ch.is_alphabetic() {
                k += 1;
                while k < to && (self.chars[k].ch == '_' || self.chars[k].ch.is_alphanumeric()) {
                    k += 1;
                }
                let word: String = self.chars[start..k].iter().map(|c| c.ch).collect();
                if is_reserved_keyword(&word) {
                    Token::DocCode(CrefPiece::Keyword)
                } else {
                    Token::DocCode(CrefPiece::Identifier)
                }
            } else if ch.is_ascii_digit() {
                while k < to && self.chars[k].ch.is_ascii_alphanumeric() {
                    k += 1;
                }
                Token::DocCode(CrefPiece::Number)
            } else if ch == '&' {
                k += 1;
                while k < to && self.chars[k].ch != ';' {
                    k += 1;
                }
                k = (k + 1).min(to);
                Token::DocCode(CrefPiece::Punctuation)
            } else if matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | ',') {
                k += 1;
                Token::DocCode(CrefPiece::Punctuation)
            } else {
                k += 1;
                Token::DocCode(CrefPiece::Operator)
            };
            self.emit(token, start, k);
        }
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | ':' | '-' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(source: &str, comment: &DocComment) -> Vec<(Token, String)> {
        comment
            .tokens
            .iter()
            .map(|t| (t.value, t.span.slice(source).to_string()))
            .collect()
    }

    fn doc(piece: DocPiece, text: &str) -> (Token, String) {
        (Token::Doc(piece), text.to_string())
    }

    #[test]
    fn test_summary_element() {
        let source = "/// <summary>Hi &amp; bye</summary>";
        let comment = lex_doc_lines(source, 0);
        assert_eq!(comment.end, source.len());
        assert_eq!(
            pieces(source, &comment),
            vec![
                doc(DocPiece::Delimiter, "///"),
                doc(DocPiece::Text, " "),
                doc(DocPiece::Delimiter, "<"),
                doc(DocPiece::Name, "summary"),
                doc(DocPiece::Delimiter, ">"),
                doc(DocPiece::Text, "Hi "),
                doc(DocPiece::EntityReference, "&amp;"),
                doc(DocPiece::Text, " bye"),
                doc(DocPiece::Delimiter, "</"),
                doc(DocPiece::Name, "summary"),
                doc(DocPiece::Delimiter, ">"),
            ]
        );
    }

    #[test]
    fn test_exterior_reinserted_across_lines() {
        let source = "/// <summary>\n///   text\n/// </summary>\nclass C {}";
        let comment = lex_doc_lines(source, 0);
        let all = pieces(source, &comment);
        assert_eq!(comment.end, source.find("\nclass").unwrap());
        assert!(all.contains(&(Token::EndOfLine, "\n".to_string())));
        assert_eq!(
            all.iter()
                .filter(|(t, _)| *t == Token::Doc(DocPiece::Delimiter))
                .filter(|(_, s)| s == "///")
                .count(),
            3
        );
        assert!(all.contains(&doc(DocPiece::Text, "   text")));
    }

    #[test]
    fn test_attribute_whitespace_takes_following_role() {
        let source = "/// <see  cref = \"A.B\" />";
        let comment = lex_doc_lines(source, 0);
        assert_eq!(
            pieces(source, &comment),
            vec![
                doc(DocPiece::Delimiter, "///"),
                doc(DocPiece::Text, " "),
                doc(DocPiece::Delimiter, "<"),
                doc(DocPiece::Name, "see"),
                doc(DocPiece::AttributeName, "  "),
                doc(DocPiece::AttributeName, "cref"),
                doc(DocPiece::Delimiter, " "),
                doc(DocPiece::Delimiter, "="),
                doc(DocPiece::AttributeQuotes, " "),
                doc(DocPiece::AttributeQuotes, "\""),
                (Token::DocCode(CrefPiece::Identifier), "A".to_string()),
                (Token::DocCode(CrefPiece::Operator), ".".to_string()),
                (Token::DocCode(CrefPiece::Identifier), "B".to_string()),
                doc(DocPiece::AttributeQuotes, "\""),
                doc(DocPiece::Delimiter, " "),
                doc(DocPiece::Delimiter, "/>"),
            ]
        );
    }

    #[test]
    fn test_param_name_is_reference() {
        let source = "/// <param name=\"x\">value</param>";
        let comment = lex_doc_lines(source, 0);
        let all = pieces(source, &comment);
        assert!(all.contains(&(Token::DocName, "x".to_string())));
    }

    #[test]
    fn test_processing_instruction_and_cdata() {
        let source = "/// <?foo bar?><![CDATA[x<y]]>";
        let comment = lex_doc_lines(source, 0);
        assert_eq!(
            pieces(source, &comment)[2..],
            [
                doc(DocPiece::ProcessingInstruction, "<?"),
                doc(DocPiece::ProcessingInstruction, "foo"),
                doc(DocPiece::ProcessingInstruction, " "),
                doc(DocPiece::ProcessingInstruction, "bar"),
                doc(DocPiece::ProcessingInstruction, "?>"),
                doc(DocPiece::CData, "<![CDATA["),
                doc(DocPiece::CData, "x<y"),
                doc(DocPiece::CData, "]]>"),
            ]
        );
    }

    #[test]
    fn test_block_doc_comment_exterior_star() {
        let source = "/** <summary>\n * text\n */";
        let comment = lex_doc_block(source, 0);
        assert!(!comment.unterminated);
        assert_eq!(comment.end, source.len());
        let all = pieces(source, &comment);
        assert_eq!(all.first(), Some(&doc(DocPiece::Delimiter, "/**")));
        assert!(all.contains(&doc(DocPiece::Delimiter, "*")));
        assert!(all.contains(&doc(DocPiece::Text, " text")));
        assert_eq!(all.last(), Some(&doc(DocPiece::Delimiter, "*/")));
    }

    #[test]
    fn test_doc_tokens_cover_text_exactly() {
        let source = "/// a\n  /// <b c='d'>e</b>";
        let comment = lex_doc_lines(source, 0);
        let mut offset = 0;
        for token in &comment.tokens {
            assert_eq!(token.span.start, offset, "gap before {:?}", token);
            offset = token.span.end;
        }
        assert_eq!(offset, source.len());
    }
}
