//! Parser trait and the smallest productions: identifiers and names
//!
//! Builders never fail. When a required token is absent they report a
//! diagnostic and carry on without consuming anything; list loops guard
//! their own progress with [`Parser::position`].

use crate::grammar::ast::{Checkpoint, NodeId, NodeKind, TokenRole};
use crate::grammar::builders::helpers::{generic_follows, scan_type_argument_list};
use crate::grammar::builders::types::parse_type_argument_list;
use crate::grammar::keywords::Keyword;
use crate::syntax::SyntaxError;
use crate::tokens::{Punct, Token};
use crate::utils::Span;

/// What builders need from the concrete parser
pub trait Parser {
    // === NAVIGATION ===
    /// Significant token `n` positions ahead of the cursor
    fn peek(&self, n: usize) -> Token;
    fn peek_text(&self, n: usize) -> &str;
    /// Lexeme index of the significant token `n` positions ahead
    fn peek_index(&self, n: usize) -> usize;
    fn peek_span(&self, n: usize) -> Span;
    /// No trivia between the tokens at `n` and `n + 1`
    fn adjacent(&self, n: usize) -> bool;
    /// Cursor position among significant tokens
    fn position(&self) -> usize;
    fn is_script(&self) -> bool;

    // === TREE BUILDING ===
    fn start_node(&mut self, kind: NodeKind);
    fn checkpoint(&self) -> Checkpoint;
    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind);
    fn finish_node(&mut self) -> NodeId;
    /// Attach the current token to the open node and advance
    fn bump(&mut self);
    fn set_role(&mut self, index: usize, role: TokenRole);
    fn set_name(&mut self, index: usize);
    fn node_kind(&self, id: NodeId) -> NodeKind;
    fn node_name_token(&self, id: NodeId) -> Option<usize>;

    // === DIAGNOSTICS AND LIMITS ===
    fn report(&mut self, error: SyntaxError);
    /// Enter a recursive production; false once the depth limit is hit
    fn enter(&mut self) -> bool;
    fn exit(&mut self);

    // === PROVIDED HELPERS ===

    fn current(&self) -> Token {
        self.peek(0)
    }

    fn current_text(&self) -> &str {
        self.peek_text(0)
    }

    fn current_span(&self) -> Span {
        self.peek_span(0)
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(0), Token::Eof)
    }

    fn at_punct(&self, punct: Punct) -> bool {
        self.peek(0).is_punct(punct)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.peek(0).is_keyword(keyword)
    }

    fn at_identifier(&self) -> bool {
        matches!(self.peek(0), Token::Identifier)
    }

    /// Identifier spelled exactly like the contextual keyword
    fn peek_contextual(&self, n: usize, keyword: Keyword) -> bool {
        matches!(self.peek(n), Token::Identifier) && self.peek_text(n) == keyword.as_str()
    }

    fn at_contextual(&self, keyword: Keyword) -> bool {
        self.peek_contextual(0, keyword)
    }

    fn bump_as(&mut self, role: TokenRole) {
        let index = self.peek_index(0);
        self.set_role(index, role);
        self.bump();
    }

    /// Consume the current token as the open node's declared name
    fn bump_name(&mut self) {
        let index = self.peek_index(0);
        self.set_name(index);
        self.bump();
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.at_punct(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_contextual(&mut self, keyword: Keyword) -> bool {
        if self.at_contextual(keyword) {
            self.bump_as(TokenRole::Keyword);
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> bool {
        if self.eat_punct(punct) {
            return true;
        }
        let span = self.current_span();
        self.report(SyntaxError::missing_token(punct.as_str(), Span::empty(span.start)));
        false
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> bool {
        if self.eat_keyword(keyword) {
            return true;
        }
        let span = self.current_span();
        self.report(SyntaxError::missing_token(keyword.as_str(), Span::empty(span.start)));
        false
    }

    fn report_missing(&mut self, expected: &str) {
        let span = self.current_span();
        self.report(SyntaxError::missing_token(expected, Span::empty(span.start)));
    }
}

// === RECOVERY ===

/// Consume one token into a `SkippedTokens` node
pub fn skip_token(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::SkippedTokens);
    if !parser.at_end() {
        let span = parser.current_span();
        let found = parser.current_text().to_string();
        parser.report(SyntaxError::unexpected_token("declaration or statement", &found, span));
        parser.bump();
    }
    parser.finish_node()
}

/// Node standing in for an absent expression or type
pub fn missing_node(parser: &mut dyn Parser, kind: NodeKind, expected: &str) -> NodeId {
    parser.report_missing(expected);
    parser.start_node(kind);
    parser.finish_node()
}

// === NAMES ===

/// Where a name is being parsed; expression positions need a stronger
/// signal before `<` is read as a type argument list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    Type,
    Expression,
}

/// identifier_name ::= identifier
pub fn parse_identifier_name(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::IdentifierName);
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    parser.finish_node()
}

/// simple_name ::= identifier type_argument_list?
pub fn parse_simple_name(parser: &mut dyn Parser, context: NameContext) -> NodeId {
    if !parser.at_identifier() {
        return parse_identifier_name(parser);
    }

    let generic = parser.peek(1).is_punct(Punct::Lt)
        && match scan_type_argument_list(parser, 1) {
            Some(end) => context == NameContext::Type || generic_follows(parser, end),
            None => false,
        };

    if generic {
        parser.start_node(NodeKind::GenericName);
        parser.bump_name();
        parse_type_argument_list(parser);
        parser.finish_node()
    } else {
        parse_identifier_name(parser)
    }
}

/// Identifier before `::`; `global` becomes a keyword there
pub fn parse_alias_name(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::IdentifierName);
    let index = parser.peek_index(0);
    parser.set_name(index);
    if parser.at_contextual(Keyword::Global) {
        parser.bump_as(TokenRole::Keyword);
    } else {
        parser.bump();
    }
    parser.finish_node()
}

/// name ::= (identifier '::')? simple_name ('.' simple_name)*
pub fn parse_name(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    let mut name = if parser.at_identifier() && parser.peek(1).is_punct(Punct::ColonColon) {
        parse_alias_name(parser);
        parser.start_node_at(checkpoint, NodeKind::AliasQualifiedName);
        parser.bump();
        parse_simple_name(parser, NameContext::Type);
        parser.finish_node()
    } else {
        parse_simple_name(parser, NameContext::Type)
    };

    while parser.at_punct(Punct::Dot) && matches!(parser.peek(1), Token::Identifier) {
        parser.start_node_at(checkpoint, NodeKind::QualifiedName);
        parser.bump();
        parse_simple_name(parser, NameContext::Type);
        name = parser.finish_node();
    }
    name
}
