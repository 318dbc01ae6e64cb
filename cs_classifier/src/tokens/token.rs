//! Lexeme kinds for C# source
//!
//! The lexer produces a flat list of lexemes that covers every byte of the
//! input exactly once. Trivia (whitespace, comments, directives, disabled
//! text, doc-comment markup) sits in the same list as significant tokens;
//! the parser only ever sees the significant ones.
use crate::grammar::keywords::Keyword;
use crate::utils::Spanned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quoting form of a string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringForm {
    /// `"..."`, processes backslash escapes
    Regular,
    /// `@"..."`, backslash is literal and `""` is a quote
    Verbatim,
    /// `"""..."""` with any quote count of three or more
    Raw,
}

impl StringForm {
}

/// Role of a lexeme inside a preprocessor directive line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectiveRole {
    /// `#`, the directive name and settings such as `hidden` or `disable`
    Keyword,
    /// Free text: region labels, error messages, bad directive remainder
    Text,
    /// Conditional symbols and identifier warning codes
    Identifier,
    /// `true` / `false` in conditions
    CSharpKeyword,
    Number,
    String,
    Operator,
    Punctuation,
}

/// Piece of XML documentation comment markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocPiece {
    Delimiter,
    Name,
    AttributeName,
    AttributeQuotes,
    AttributeValue,
    Text,
    EntityReference,
    CData,
    Comment,
    ProcessingInstruction,
}

/// Code lexed inside a `cref` attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrefPiece {
    Identifier,
    Keyword,
    Operator,
    Punctuation,
    Number,
}

/// C# punctuators and operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punct {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Dot,
    DotDot,
    Comma,
    Colon,
    ColonColon,
    Semicolon,
    Tilde,
    Bang,
    BangEq,
    Eq,
    EqEq,
    Arrow,    // =>
    MinusGt,  // ->
    Lt,
    LtEq,
    LtLt,
    LtLtEq,
    /// `>` is never combined by the lexer; `>>` and `>=` inside generic
    /// argument lists would otherwise be ambiguous. `>=` is the exception
    /// since no type argument list can end with `=`.
    Gt,
    GtEq,
    Question,
    QuestionQuestion,
    QuestionQuestionEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::OpenBrace => "{",
            Punct::CloseBrace => "}",
            Punct::OpenParen => "(",
            Punct::CloseParen => ")",
            Punct::OpenBracket => "[",
            Punct::CloseBracket => "]",
            Punct::Dot => ".",
            Punct::DotDot => "..",
            Punct::Comma => ",",
            Punct::Colon => ":",
            Punct::ColonColon => "::",
            Punct::Semicolon => ";",
            Punct::Tilde => "~",
            Punct::Bang => "!",
            Punct::BangEq => "!=",
            Punct::Eq => "=",
            Punct::EqEq => "==",
            Punct::Arrow => "=>",
            Punct::MinusGt => "->",
            Punct::Lt => "<",
            Punct::LtEq => "<=",
            Punct::LtLt => "<<",
            Punct::LtLtEq => "<<=",
            Punct::Gt => ">",
            Punct::GtEq => ">=",
            Punct::Question => "?",
            Punct::QuestionQuestion => "??",
            Punct::QuestionQuestionEq => "??=",
            Punct::Amp => "&",
            Punct::AmpAmp => "&&",
            Punct::AmpEq => "&=",
            Punct::Pipe => "|",
            Punct::PipePipe => "||",
            Punct::PipeEq => "|=",
            Punct::Caret => "^",
            Punct::CaretEq => "^=",
            Punct::Plus => "+",
            Punct::PlusPlus => "++",
            Punct::PlusEq => "+=",
            Punct::Minus => "-",
            Punct::MinusMinus => "--",
            Punct::MinusEq => "-=",
            Punct::Star => "*",
            Punct::StarEq => "*=",
            Punct::Slash => "/",
            Punct::SlashEq => "/=",
            Punct::Percent => "%",
            Punct::PercentEq => "%=",
        }
    }

    /// Structural punctuation; everything else is an operator by default
    pub fn is_punctuation(self) -> bool {
        matches!(
            self,
            Punct::OpenBrace
                | Punct::CloseBrace
                | Punct::OpenParen
                | Punct::CloseParen
                | Punct::OpenBracket
                | Punct::CloseBracket
                | Punct::Comma
                | Punct::Colon
                | Punct::Semicolon
        )
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Punct::Eq
                | Punct::PlusEq
                | Punct::MinusEq
                | Punct::StarEq
                | Punct::SlashEq
                | Punct::PercentEq
                | Punct::AmpEq
                | Punct::PipeEq
                | Punct::CaretEq
                | Punct::LtLtEq
                | Punct::QuestionQuestionEq
        )
    }

    /// Operators that may be overloaded by an `operator` declaration
    pub fn is_overloadable(self) -> bool {
        matches!(
            self,
            Punct::Plus
                | Punct::Minus
                | Punct::Star
                | Punct::Slash
                | Punct::Percent
                | Punct::Amp
                | Punct::Pipe
                | Punct::Caret
                | Punct::LtLt
                | Punct::EqEq
                | Punct::BangEq
                | Punct::Lt
                | Punct::Gt
                | Punct::LtEq
                | Punct::GtEq
                | Punct::Bang
                | Punct::Tilde
                | Punct::PlusPlus
                | Punct::MinusMinus
        )
    }
}

/// One lexeme of C# source. Text is never stored; slice the source with
/// the lexeme's span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    // === TRIVIA ===
    Whitespace,
    EndOfLine,
    LineComment,
    BlockComment,
    /// `#!` line at the start of a script
    Shebang,
    /// `<<<<<<<`, `|||||||`, `=======` or `>>>>>>>` at a line start
    ConflictMarker,
    /// Inactive conditional branch or the losing side of a merge conflict
    DisabledText,
    Directive(DirectiveRole),
    Doc(DocPiece),
    DocCode(CrefPiece),
    /// Value of a doc `name` attribute on param/typeparam elements
    DocName,
    /// Character that cannot start any token; skipped like trivia
    Bad,

    // === SIGNIFICANT ===
    Identifier,
    Keyword(Keyword),
    Number,
    Char,
    String(StringForm),
    InterpolatedStart(StringForm),
    InterpolatedText(StringForm),
    InterpolatedEnd(StringForm),
    /// `{` opening an interpolation hole
    InterpolationOpen,
    /// `}` closing an interpolation hole
    InterpolationClose,
    /// Format clause text after `:` in a hole
    InterpolationFormat,
    Punct(Punct),
    Eof,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace
                | Token::EndOfLine
                | Token::LineComment
                | Token::BlockComment
                | Token::Shebang
                | Token::ConflictMarker
                | Token::DisabledText
                | Token::Directive(_)
                | Token::Doc(_)
                | Token::DocCode(_)
                | Token::DocName
                | Token::Bad
        )
    }

    /// Tokens the parser consumes
    pub fn is_significant(&self) -> bool {
        !self.is_trivia()
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Token::LineComment | Token::BlockComment)
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        matches!(self, Token::Punct(p) if *p == punct)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            Token::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    pub fn punct(&self) -> Option<Punct> {
        match self {
            Token::Punct(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::Number | Token::Char | Token::String(_) | Token::InterpolatedStart(_)
        ) || matches!(
            self,
            Token::Keyword(Keyword::True | Keyword::False | Keyword::Null)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k.as_str()),
            Token::Punct(p) => write!(f, "{}", p.as_str()),
            Token::Identifier => write!(f, "identifier"),
            Token::Number => write!(f, "number"),
            Token::Char => write!(f, "character literal"),
            Token::String(_) => write!(f, "string literal"),
            Token::InterpolatedStart(_) => write!(f, "interpolated string"),
            Token::Eof => write!(f, "end of file"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A lexeme with its source range
pub type SpannedToken = Spanned<Token>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_split() {
        assert!(Token::Whitespace.is_trivia());
        assert!(Token::Doc(DocPiece::Text).is_trivia());
        assert!(Token::Directive(DirectiveRole::Keyword).is_trivia());
        assert!(Token::Identifier.is_significant());
        assert!(Token::InterpolationOpen.is_significant());
        assert!(Token::Eof.is_significant());
    }

    #[test]
    fn test_punct_categories() {
        assert!(Punct::Semicolon.is_punctuation());
        assert!(!Punct::Dot.is_punctuation());
        assert!(Punct::QuestionQuestionEq.is_assignment());
        assert!(Punct::EqEq.is_overloadable());
        assert_eq!(Punct::Arrow.as_str(), "=>");
    }

    #[test]
    fn test_literal_detection() {
        assert!(Token::Keyword(Keyword::Null).is_literal());
        assert!(Token::String(StringForm::Raw).is_literal());
        assert!(!Token::Identifier.is_literal());
    }
}
