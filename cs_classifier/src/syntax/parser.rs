//! Concrete parser driving the grammar builders
//!
//! `CSharpParser` owns the lexeme stream and a [`TreeBuilder`]. The builders
//! see only significant tokens through the [`Parser`] trait; trivia never
//! reaches them but stays in the stream for the classifier.

use crate::config::constants::compile_time::syntax::*;
use crate::config::ParseMode;
use crate::grammar::ast::{Checkpoint, NodeId, NodeKind, SyntaxTree, TokenRole, TreeBuilder};
use crate::grammar::builders::{atomic::Parser, parse_compilation_unit};
use crate::logging::codes;
use crate::syntax::error::SyntaxError;
use crate::tokens::{Token, TokenStream};
use crate::utils::Span;
use crate::{log_debug, log_warning};
use std::collections::VecDeque;

/// Parser over one token stream
pub struct CSharpParser {
    tokens: TokenStream,
    builder: TreeBuilder,
    mode: ParseMode,
    /// Kinds of the open nodes, innermost last, for diagnostic context
    context_stack: Vec<NodeKind>,
    /// Recent diagnostics, used to drop repeats reported at one position
    error_history: VecDeque<SyntaxError>,
    diagnostics: Vec<SyntaxError>,
    parse_depth: usize,
    depth_reported: bool,
    eof_attached: bool,
}

impl CSharpParser {
    pub fn new(tokens: TokenStream, mode: ParseMode) -> Self {
        log_debug!("Creating C# parser",
            "significant_tokens" => tokens.len(),
            "mode" => mode.as_str()
        );

        let builder = TreeBuilder::new(tokens.all_tokens().len());
        Self {
            tokens,
            builder,
            mode,
            context_stack: Vec::new(),
            error_history: VecDeque::new(),
            diagnostics: Vec::new(),
            parse_depth: 0,
            depth_reported: false,
            eof_attached: false,
        }
    }

    /// Parse the whole stream as a compilation unit
    pub fn parse_compilation_unit(mut self) -> SyntaxTree {
        parse_compilation_unit(&mut self);
        self.finish()
    }

    /// Close any open nodes and hand the tree over
    pub fn finish(self) -> SyntaxTree {
        if self.diagnostics.len() > self.error_history.len() {
            log_debug!("Parser diagnostics exceeded history window",
                "diagnostics" => self.diagnostics.len(),
                "window" => MAX_ERROR_HISTORY
            );
        }
        SyntaxTree::new(self.tokens, self.builder, self.diagnostics)
    }

    pub fn diagnostics(&self) -> &[SyntaxError] {
        &self.diagnostics
    }

    /// Open node kinds joined outermost first
    pub fn current_context(&self) -> String {
        self.context_stack
            .iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn push_context(&mut self, kind: NodeKind) {
        if self.context_stack.len() >= MAX_CONTEXT_STACK_DEPTH {
            self.context_stack.remove(0);
        }
        self.context_stack.push(kind);
    }

    fn already_reported(&self, error: &SyntaxError) -> bool {
        self.error_history
            .iter()
            .any(|seen| seen.span() == error.span() && seen.error_code() == error.error_code())
    }
}

impl Parser for CSharpParser {
    fn peek(&self, n: usize) -> Token {
        self.tokens.peek_ahead(n)
    }

    fn peek_text(&self, n: usize) -> &str {
        self.tokens.text_ahead(n)
    }

    fn peek_index(&self, n: usize) -> usize {
        self.tokens.index_ahead(n)
    }

    fn peek_span(&self, n: usize) -> Span {
        self.tokens.span(self.tokens.index_ahead(n))
    }

    fn adjacent(&self, n: usize) -> bool {
        let here = self.tokens.index_ahead(n);
        let next = self.tokens.index_ahead(n + 1);
        next == here + 1
    }

    fn position(&self) -> usize {
        self.tokens.position()
    }

    fn is_script(&self) -> bool {
        self.mode == ParseMode::Script
    }

    fn start_node(&mut self, kind: NodeKind) {
        self.push_context(kind);
        self.builder.start_node(kind);
    }

    fn checkpoint(&self) -> Checkpoint {
        self.builder.checkpoint()
    }

    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        self.push_context(kind);
        self.builder.start_node_at(checkpoint, kind);
    }

    fn finish_node(&mut self) -> NodeId {
        self.context_stack.pop();
        self.builder.finish_node()
    }

    fn bump(&mut self) {
        let index = self.tokens.current_index();
        if matches!(self.tokens.current(), Token::Eof) {
            // End of file belongs to the compilation unit exactly once
            if !self.eof_attached {
                self.eof_attached = true;
                self.builder.token(index);
            }
            return;
        }
        self.builder.token(index);
        self.tokens.advance();
    }

    fn set_role(&mut self, index: usize, role: TokenRole) {
        self.builder.set_role(index, role);
    }

    fn set_name(&mut self, index: usize) {
        self.builder.set_name(index);
    }

    fn node_kind(&self, id: NodeId) -> NodeKind {
        self.builder
            .node(id)
            .map(|node| node.kind)
            .unwrap_or(NodeKind::SkippedTokens)
    }

    fn node_name_token(&self, id: NodeId) -> Option<usize> {
        self.builder.node(id).and_then(|node| node.name_token)
    }

    fn report(&mut self, error: SyntaxError) {
        if self.already_reported(&error) {
            return;
        }

        log_debug!("Syntax diagnostic",
            "code" => error.error_code(),
            "span" => error.span(),
            "message" => error.to_string(),
            "context" => self.current_context()
        );

        if self.error_history.len() >= MAX_ERROR_HISTORY {
            self.error_history.pop_front();
        }
        self.error_history.push_back(error.clone());
        self.diagnostics.push(error);
    }

    fn enter(&mut self) -> bool {
        if self.parse_depth >= MAX_PARSE_DEPTH {
            if !self.depth_reported {
                self.depth_reported = true;
                let span = self.current_span();
                log_warning!(code = codes::syntax::MAX_DEPTH_EXCEEDED,
                    "Maximum parser nesting depth reached, skipping nested input",
                    "depth" => self.parse_depth,
                    "max_depth" => MAX_PARSE_DEPTH
                );
                self.report(SyntaxError::max_depth(span));
            }
            return false;
        }
        self.parse_depth += 1;
        true
    }

    fn exit(&mut self) {
        self.parse_depth = self.parse_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierOptions;
    use crate::lexical::tokenize;

    fn parser_for(text: &str) -> CSharpParser {
        let tokenized = tokenize(text, &ClassifierOptions::regular()).expect("lexing should succeed");
        CSharpParser::new(tokenized.stream, ParseMode::Regular)
    }

    #[test]
    fn test_peek_skips_trivia() {
        let parser = parser_for("a /* c */ . b");
        assert_eq!(parser.peek(0), Token::Identifier);
        assert_eq!(parser.peek_text(1), ".");
        assert_eq!(parser.peek_text(2), "b");
        assert!(!parser.adjacent(0));
    }

    #[test]
    fn test_adjacent_greater_than() {
        let parser = parser_for("x >> 1");
        assert!(parser.adjacent(1));
        let parser = parser_for("x > > 1");
        assert!(!parser.adjacent(1));
    }

    #[test]
    fn test_eof_attached_once() {
        let tree = parser_for("").parse_compilation_unit();
        assert_eq!(tree.render(tree.root()), "(CompilationUnit)");
        let eof = tree.tokens().all_tokens().len() - 1;
        assert_eq!(tree.token_parent(eof), Some(tree.root()));
    }

    #[test]
    fn test_repeated_diagnostics_are_dropped() {
        let mut parser = parser_for("x");
        parser.report_missing(";");
        parser.report_missing(";");
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn test_depth_limit_reports_once() {
        let mut parser = parser_for("x");
        for _ in 0..MAX_PARSE_DEPTH {
            assert!(parser.enter());
        }
        assert!(!parser.enter());
        assert!(!parser.enter());
        let depth_errors = parser
            .diagnostics()
            .iter()
            .filter(|error| matches!(error, SyntaxError::MaxDepthExceeded { .. }))
            .count();
        assert_eq!(depth_errors, 1);
    }

    #[test]
    fn test_deep_nesting_terminates() {
        let text = format!("class C {{ int x = {}1{}; }}", "(".repeat(2000), ")".repeat(2000));
        let tree = parser_for(&text).parse_compilation_unit();
        assert!(tree
            .diagnostics()
            .iter()
            .any(|error| matches!(error, SyntaxError::MaxDepthExceeded { .. })));
    }
}
