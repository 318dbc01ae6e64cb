//! Token system for C# lexical analysis
//!
//! [`Token`] enumerates every lexeme kind the lexer emits, trivia included.
//! Lexemes never carry text; their spans index into the source held by the
//! [`TokenStream`]. The stream is the hand-off point between the lexer and
//! the parser, and later stages keep using it to look up lexeme text and
//! leading trivia.

pub mod token;
pub mod token_stream;

pub use token::{
    CrefPiece, DirectiveRole, DocPiece, Punct, SpannedToken, StringForm, Token,
};
pub use token_stream::{describe_tokens, TokenStream};

pub use crate::utils::{Position, SourceMap, Span, Spanned};
