//! Syntax analysis - token stream to syntax tree
//!
//! Parsing is tolerant: it always yields a [`SyntaxTree`], with recovered
//! problems attached as diagnostics.

mod error;
mod parser;

pub use crate::grammar::ast::SyntaxTree;
pub use error::SyntaxError;
pub use parser::CSharpParser;

use crate::config::ClassifierOptions;
use crate::logging::codes;
use crate::tokens::TokenStream;
use crate::{log_debug, log_success};

/// Parse a lexed text into a syntax tree
pub fn parse(tokens: TokenStream, options: &ClassifierOptions) -> SyntaxTree {
    log_debug!("Starting syntax analysis",
        "tokens" => tokens.len(),
        "mode" => options.parse_mode.as_str()
    );

    let tree = CSharpParser::new(tokens, options.parse_mode).parse_compilation_unit();

    log_success!(
        codes::success::PARSE_COMPLETE,
        "Syntax analysis completed",
        "nodes" => tree.node_count(),
        "diagnostics" => tree.diagnostics().len()
    );
    tree
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Render single productions for builder tests

    use super::CSharpParser;
    use crate::config::{ClassifierOptions, ParseMode};
    use crate::grammar::ast::{NodeId, NodeKind};
    use crate::grammar::builders::{
        atomic::Parser, parse_compilation_unit, parse_expression, parse_statement, parse_type,
    };
    use crate::lexical::tokenize;

    fn render_with(text: &str, production: fn(&mut dyn Parser) -> NodeId) -> String {
        let tokenized =
            tokenize(text, &ClassifierOptions::regular()).expect("lexing should succeed");
        let mut parser = CSharpParser::new(tokenized.stream, ParseMode::Regular);
        parser.start_node(NodeKind::CompilationUnit);
        let node = production(&mut parser);
        let tree = parser.finish();
        tree.render(node)
    }

    pub fn render_type(text: &str) -> String {
        render_with(text, parse_type)
    }

    pub fn render_expression(text: &str) -> String {
        render_with(text, parse_expression)
    }

    pub fn render_statement(text: &str) -> String {
        render_with(text, parse_statement)
    }

    pub fn render_unit(text: &str) -> String {
        let tokenized =
            tokenize(text, &ClassifierOptions::regular()).expect("lexing should succeed");
        let tree = CSharpParser::new(tokenized.stream, ParseMode::Regular).parse_compilation_unit();
        tree.render(tree.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::NodeKind;
    use crate::lexical::tokenize;

    fn parse_text(text: &str) -> SyntaxTree {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize(text, &options).expect("lexing should succeed");
        parse(tokenized.stream, &options)
    }

    #[test]
    fn test_every_significant_token_has_a_parent() {
        let tree = parse_text("class C { void M() { var x = a < b ? 1 : 2; } } }");
        for (index, token) in tree.tokens().all_tokens().iter().enumerate() {
            if token.value.is_significant() {
                assert!(tree.token_parent(index).is_some(), "lexeme {} has no parent", index);
            }
        }
    }

    #[test]
    fn test_partial_input_yields_tree() {
        let tree = parse_text("class C<T where");
        assert_eq!(tree.kind(tree.root()), NodeKind::CompilationUnit);
        assert!(!tree.diagnostics().is_empty());
    }

    #[test]
    fn test_stray_close_brace_is_skipped() {
        let tree = parse_text("} class C { }");
        let root = tree.root();
        assert!(tree.child_of_kind(root, NodeKind::SkippedTokens).is_some());
        assert!(tree.child_of_kind(root, NodeKind::Class).is_some());
    }
}
