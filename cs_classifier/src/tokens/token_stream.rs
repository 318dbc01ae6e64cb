//! Span-accurate lexeme stream
//!
//! Keeps every lexeme (trivia included) in source order together with an
//! index of the significant ones. The parser walks the significant index;
//! classification and embedded-language detection walk the full list.

use crate::tokens::token::*;
use crate::utils::{Span, Spanned};

/// All lexemes of one text plus the significant-token index
#[derive(Debug, Clone)]
pub struct TokenStream {
    source: String,
    /// Every lexeme with its original span; covers the text exactly
    all_tokens: Vec<SpannedToken>,
    /// Indices into `all_tokens` of the tokens the parser sees
    significant_indices: Vec<usize>,
    /// Current position in `significant_indices`
    position: usize,
}

impl TokenStream {
    pub fn new(source: String, tokens: Vec<SpannedToken>) -> Self {
        let mut stream = Self {
            source,
            all_tokens: tokens,
            significant_indices: Vec::new(),
            position: 0,
        };
        stream.rebuild_significant_indices();
        stream
    }

    fn rebuild_significant_indices(&mut self) {
        self.significant_indices = self
            .all_tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.value.is_significant())
            .map(|(index, _)| index)
            .collect();

        crate::log_debug!("Token processing summary",
            "total_tokens" => self.all_tokens.len(),
            "significant_tokens" => self.significant_indices.len()
        );

        self.position = 0;
    }

    // === SOURCE ACCESS ===

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Text of a lexeme by its index in the full list
    pub fn text(&self, index: usize) -> &str {
        self.all_tokens
            .get(index)
            .map(|token| token.span.slice(&self.source))
            .unwrap_or("")
    }

    pub fn token(&self, index: usize) -> Option<&SpannedToken> {
        self.all_tokens.get(index)
    }

    pub fn kind(&self, index: usize) -> Token {
        self.all_tokens
            .get(index)
            .map(|token| token.value)
            .unwrap_or(Token::Eof)
    }

    pub fn span(&self, index: usize) -> Span {
        self.all_tokens
            .get(index)
            .map(|token| token.span)
            .unwrap_or_else(|| Span::empty(self.source.len()))
    }

    pub fn all_tokens(&self) -> &[SpannedToken] {
        &self.all_tokens
    }

    pub fn into_parts(self) -> (String, Vec<SpannedToken>) {
        (self.source, self.all_tokens)
    }

    // === SIGNIFICANT NAVIGATION ===

    /// Lexeme index of the significant token `n` positions after the cursor
    pub fn index_ahead(&self, n: usize) -> usize {
        match self.significant_indices.get(self.position + n) {
            Some(&index) => index,
            None => self.all_tokens.len().saturating_sub(1),
        }
    }

    /// The current significant token
    pub fn current(&self) -> Token {
        self.kind(self.index_ahead(0))
    }

    pub fn peek_ahead(&self, n: usize) -> Token {
        self.kind(self.index_ahead(n))
    }

    pub fn current_index(&self) -> usize {
        self.index_ahead(0)
    }

    pub fn current_span(&self) -> Span {
        self.span(self.index_ahead(0))
    }

    pub fn current_text(&self) -> &str {
        self.text(self.index_ahead(0))
    }

    pub fn text_ahead(&self, n: usize) -> &str {
        self.text(self.index_ahead(n))
    }

    /// Move past the current significant token; never moves past end of file
    pub fn advance(&mut self) {
        if self.position + 1 < self.significant_indices.len() {
            self.position += 1;
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Number of significant tokens
    pub fn len(&self) -> usize {
        self.significant_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.significant_indices.is_empty()
    }

    pub fn restore_position(&mut self, saved_position: usize) {
        self.position = saved_position.min(self.significant_indices.len().saturating_sub(1));
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// True when no trivia separates the current token from the next one
    pub fn next_is_adjacent(&self) -> bool {
        let here = self.index_ahead(0);
        let next = self.index_ahead(1);
        next == here + 1
    }

    // === TRIVIA QUERIES ===

    /// Previous significant lexeme index before `index`, if any
    pub fn previous_significant(&self, index: usize) -> Option<usize> {
        let slot = self.significant_indices.partition_point(|&i| i < index);
        slot.checked_sub(1)
            .and_then(|s| self.significant_indices.get(s).copied())
    }

    /// Trivia lexemes between the previous significant token and `index`
    pub fn leading_trivia(&self, index: usize) -> std::ops::Range<usize> {
        let start = self
            .previous_significant(index)
            .map(|prev| prev + 1)
            .unwrap_or(0);
        start..index.max(start)
    }
}

/// Render lexemes as `(kind, text)` pairs
pub fn describe_tokens(stream: &TokenStream) -> Vec<(Token, String)> {
    stream
        .all_tokens()
        .iter()
        .map(|Spanned { value, span }| (*value, span.slice(stream.source()).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::keywords::Keyword;

    fn stream() -> TokenStream {
        // "int x" with a trailing end of file
        let source = "int  x".to_string();
        let tokens = vec![
            Spanned::new(Token::Keyword(Keyword::Int), Span::new(0, 3)),
            Spanned::new(Token::Whitespace, Span::new(3, 5)),
            Spanned::new(Token::Identifier, Span::new(5, 6)),
            Spanned::new(Token::Eof, Span::new(6, 6)),
        ];
        TokenStream::new(source, tokens)
    }

    #[test]
    fn test_significant_navigation() {
        let mut tokens = stream();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.current(), Token::Keyword(Keyword::Int));
        assert!(!tokens.next_is_adjacent());
        tokens.advance();
        assert_eq!(tokens.current_text(), "x");
        tokens.advance();
        assert!(tokens.is_at_end());
        tokens.advance();
        assert!(tokens.is_at_end());
    }

    #[test]
    fn test_leading_trivia() {
        let tokens = stream();
        assert_eq!(tokens.leading_trivia(2), 1..2);
        assert_eq!(tokens.leading_trivia(0), 0..0);
        assert_eq!(tokens.previous_significant(2), Some(0));
    }

    #[test]
    fn test_restore_position_is_clamped() {
        let mut tokens = stream();
        tokens.restore_position(99);
        assert!(tokens.is_at_end());
    }
}
