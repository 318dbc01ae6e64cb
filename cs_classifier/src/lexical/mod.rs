//! Lexical analysis for C# source text
//!
//! [`tokenize`] turns a text into a [`TokenStream`] covering every byte,
//! plus recoverable diagnostics and line checkpoints. Only resource limits
//! are fatal; everything else (unterminated literals, bad directives,
//! stray characters) is reported and lexing continues.

pub mod analyzer;
pub mod directives;
pub mod doc_comment;
pub mod escapes;

use crate::config::ClassifierOptions;
use crate::logging::{codes, Code};
use crate::tokens::TokenStream;
use crate::utils::Span;
use crate::{log_debug, log_success};

pub use analyzer::{LexCheckpoint, LexOutput, LexicalAnalyzer};
pub use directives::PreprocessorState;
pub use escapes::escape_spans;

/// Fatal lexing failures. Both are resource limits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Input too large: {size} bytes (max {max})")]
    InputTooLarge { size: usize, max: usize },

    #[error("Too many tokens: {count} (max {})", crate::config::constants::compile_time::lexical::MAX_TOKEN_COUNT)]
    TooManyTokens { count: usize },
}

impl LexerError {
    pub fn error_code(&self) -> Code {
        match self {
            LexerError::InputTooLarge { .. } => codes::lexical::INPUT_TOO_LARGE,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }
}

/// Recoverable problem found while lexing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalDiagnostic {
    pub code: Code,
    pub span: Span,
    pub message: String,
}

impl LexicalDiagnostic {
    pub fn new(code: Code, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            span,
            message: message.into(),
        }
    }

    pub fn shifted(mut self, delta: isize) -> Self {
        self.span = self.span.shifted(delta);
        self
    }
}

/// Result of lexing a whole text
#[derive(Debug, Clone)]
pub struct Tokenized {
    pub stream: TokenStream,
    pub diagnostics: Vec<LexicalDiagnostic>,
    pub checkpoints: Vec<LexCheckpoint>,
}

// ============================================================================
// MODULE API
// ============================================================================

/// Lex a whole text
pub fn tokenize(text: &str, options: &ClassifierOptions) -> Result<Tokenized, LexerError> {
    let mut analyzer = LexicalAnalyzer::new(text, options)?;
    analyzer.run(&mut |_| false)?;
    let output = analyzer.finish();

    for diagnostic in &output.diagnostics {
        log_debug!("Lexical diagnostic",
            "code" => diagnostic.code,
            "start" => diagnostic.span.start,
            "message" => diagnostic.message.as_str()
        );
    }

    log_success!(codes::success::TOKENIZATION_COMPLETE,
        "Tokenization completed",
        "lexemes" => output.tokens.len(),
        "diagnostics" => output.diagnostics.len(),
        "checkpoints" => output.checkpoints.len()
    );

    Ok(Tokenized {
        stream: TokenStream::new(text.to_string(), output.tokens),
        diagnostics: output.diagnostics,
        checkpoints: output.checkpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::keywords::Keyword;
    use crate::tokens::{describe_tokens, DirectiveRole, DocPiece, Punct, StringForm, Token};

    fn lex(text: &str) -> Vec<(Token, String)> {
        lex_with(text, &ClassifierOptions::regular())
    }

    fn lex_with(text: &str, options: &ClassifierOptions) -> Vec<(Token, String)> {
        let tokenized = tokenize(text, options).expect("lexing should succeed");
        describe_tokens(&tokenized.stream)
            .into_iter()
            .filter(|(t, _)| !matches!(t, Token::Whitespace | Token::EndOfLine | Token::Eof))
            .collect()
    }

    fn t(token: Token, text: &str) -> (Token, String) {
        (token, text.to_string())
    }

    #[test]
    fn test_lexemes_cover_text() {
        let text = "class C {\r\n  int x = 0x1F; // c\n  /* b */ string s = @\"a\"\"b\";\n}\n";
        let tokenized = tokenize(text, &ClassifierOptions::regular()).unwrap();
        let mut offset = 0;
        for token in tokenized.stream.all_tokens() {
            assert_eq!(token.span.start, offset);
            offset = token.span.end;
        }
        assert_eq!(offset, text.len());
        assert!(tokenized.diagnostics.is_empty());
    }

    #[test]
    fn test_keywords_and_contextual_words() {
        assert_eq!(
            lex("var @class = partial;"),
            vec![
                t(Token::Identifier, "var"),
                t(Token::Identifier, "@class"),
                t(Token::Punct(Punct::Eq), "="),
                t(Token::Identifier, "partial"),
                t(Token::Punct(Punct::Semicolon), ";"),
            ]
        );
        assert_eq!(lex("class")[0], t(Token::Keyword(Keyword::Class), "class"));
    }

    #[test]
    fn test_numbers_and_ranges() {
        assert_eq!(
            lex("1..2 .5 1e-3f 0b1010_1010 10UL"),
            vec![
                t(Token::Number, "1"),
                t(Token::Punct(Punct::DotDot), ".."),
                t(Token::Number, "2"),
                t(Token::Number, ".5"),
                t(Token::Number, "1e-3f"),
                t(Token::Number, "0b1010_1010"),
                t(Token::Number, "10UL"),
            ]
        );
    }

    #[test]
    fn test_greater_than_is_never_combined() {
        assert_eq!(
            lex("a >> b >= c"),
            vec![
                t(Token::Identifier, "a"),
                t(Token::Punct(Punct::Gt), ">"),
                t(Token::Punct(Punct::Gt), ">"),
                t(Token::Identifier, "b"),
                t(Token::Punct(Punct::GtEq), ">="),
                t(Token::Identifier, "c"),
            ]
        );
    }

    #[test]
    fn test_string_forms_and_u8_suffix() {
        assert_eq!(
            lex(r#""a"u8 @"b" """c""" 'd'"#),
            vec![
                t(Token::String(StringForm::Regular), "\"a\"u8"),
                t(Token::String(StringForm::Verbatim), "@\"b\""),
                t(Token::String(StringForm::Raw), "\"\"\"c\"\"\""),
                t(Token::Char, "'d'"),
            ]
        );
    }

    #[test]
    fn test_unterminated_literals() {
        let regular = lex("\"abc\nint");
        assert_eq!(regular[0], t(Token::String(StringForm::Regular), "\"abc"));
        assert_eq!(regular[1], t(Token::Keyword(Keyword::Int), "int"));

        let verbatim = lex("@\"abc\nint");
        assert_eq!(verbatim, vec![t(Token::String(StringForm::Verbatim), "@\"abc\nint")]);
    }

    #[test]
    fn test_interpolated_string_pieces() {
        assert_eq!(
            lex(r#"$"a{{b}} {x,5:N2} c""#),
            vec![
                t(Token::InterpolatedStart(StringForm::Regular), "$\""),
                t(Token::InterpolatedText(StringForm::Regular), "a{{b}} "),
                t(Token::InterpolationOpen, "{"),
                t(Token::Identifier, "x"),
                t(Token::Punct(Punct::Comma), ","),
                t(Token::Number, "5"),
                t(Token::Punct(Punct::Colon), ":"),
                t(Token::InterpolationFormat, "N2"),
                t(Token::InterpolationClose, "}"),
                t(Token::InterpolatedText(StringForm::Regular), " c"),
                t(Token::InterpolatedEnd(StringForm::Regular), "\""),
            ]
        );
    }

    #[test]
    fn test_raw_interpolation_brace_counts() {
        assert_eq!(
            lex(r#"$$"""{{{x}}}""""#),
            vec![
                t(Token::InterpolatedStart(StringForm::Raw), "$$\"\"\""),
                t(Token::InterpolatedText(StringForm::Raw), "{"),
                t(Token::InterpolationOpen, "{{"),
                t(Token::Identifier, "x"),
                t(Token::InterpolationClose, "}}"),
                t(Token::InterpolatedText(StringForm::Raw), "}"),
                t(Token::InterpolatedEnd(StringForm::Raw), "\"\"\""),
            ]
        );
    }

    #[test]
    fn test_nested_interpolation_and_conditional_in_parens() {
        let pieces = lex(r#"$"{(a ? $"{b}" : c)}""#);
        assert!(pieces.contains(&t(Token::Punct(Punct::Colon), ":")));
        assert!(!pieces.iter().any(|(t, _)| *t == Token::InterpolationFormat));
        assert_eq!(
            pieces.iter().filter(|(t, _)| *t == Token::InterpolationClose).count(),
            2
        );
    }

    #[test]
    fn test_disabled_region_is_one_lexeme() {
        let text = "#if false\nclass A {}\nint x;\n#else\nclass B {}\n#endif\n";
        let pieces = lex(text);
        let disabled: Vec<_> = pieces
            .iter()
            .filter(|(t, _)| *t == Token::DisabledText)
            .collect();
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].1, "class A {}\nint x;\n");
        assert!(pieces.contains(&t(Token::Keyword(Keyword::Class), "class")));
    }

    #[test]
    fn test_defined_symbols_enable_branch() {
        let options = ClassifierOptions::regular().with_symbol("DEBUG");
        let pieces = lex_with("#if DEBUG\nint x;\n#endif", &options);
        assert!(!pieces.iter().any(|(t, _)| *t == Token::DisabledText));
        assert!(pieces.contains(&t(Token::Directive(DirectiveRole::Identifier), "DEBUG")));
    }

    #[test]
    fn test_shebang_only_in_script_at_start() {
        let text = "#!/usr/bin/env scriptcs\nint x;";
        let script = lex_with(text, &ClassifierOptions::script());
        assert_eq!(script[0], t(Token::Shebang, "#!/usr/bin/env scriptcs"));

        let regular = lex(text);
        assert_eq!(regular[0], t(Token::Directive(DirectiveRole::Keyword), "#"));
        assert_eq!(regular[1], t(Token::Directive(DirectiveRole::Text), "!/usr/bin/env scriptcs"));
    }

    #[test]
    fn test_conflict_markers() {
        let text = "<<<<<<< HEAD\nint a;\n=======\nint b;\n>>>>>>> other\n";
        let pieces = lex(text);
        assert_eq!(pieces[0], t(Token::ConflictMarker, "<<<<<<< HEAD"));
        assert!(pieces.contains(&t(Token::ConflictMarker, "=======")));
        assert!(pieces.contains(&t(Token::DisabledText, "int b;\n")));
        assert_eq!(pieces.last(), Some(&t(Token::ConflictMarker, ">>>>>>> other")));
    }

    #[test]
    fn test_doc_comment_is_structured() {
        let pieces = lex("/// <summary>x</summary>\nclass C {}");
        assert_eq!(pieces[0], t(Token::Doc(DocPiece::Delimiter), "///"));
        assert!(pieces.contains(&t(Token::Doc(DocPiece::Name), "summary")));
        assert!(pieces.contains(&t(Token::Keyword(Keyword::Class), "class")));

        // Four slashes is an ordinary comment
        assert_eq!(lex("//// x")[0], t(Token::LineComment, "//// x"));
    }

    #[test]
    fn test_checkpoints_at_clean_line_starts() {
        let text = "int a;\n/// doc\nint b;\nstring s = @\"x\ny\";\nint c;\n";
        let tokenized = tokenize(text, &ClassifierOptions::regular()).unwrap();
        let offsets: Vec<usize> = tokenized.checkpoints.iter().map(|c| c.offset).collect();
        assert!(offsets.contains(&0));
        assert!(offsets.contains(&text.find("/// doc").unwrap()));
        // The line after a doc comment and the inside of a verbatim string
        // are not clean
        assert!(!offsets.contains(&text.find("int b").unwrap()));
        assert!(!offsets.contains(&text.find("y\"").unwrap()));
        assert!(offsets.contains(&text.find("int c").unwrap()));
    }

    #[test]
    fn test_resume_matches_full_lex() {
        let text = "#define X\nclass A {\n#if X\n  int a = $\"{1}\";\n#endif\n  int b;\n}\n";
        let options = ClassifierOptions::regular();
        let full = tokenize(text, &options).unwrap();
        for checkpoint in &full.checkpoints {
            let mut analyzer = LexicalAnalyzer::resume(text, &options, checkpoint).unwrap();
            analyzer.run(&mut |_| false).unwrap();
            let tail = analyzer.finish();
            assert_eq!(
                tail.tokens.as_slice(),
                &full.stream.all_tokens()[checkpoint.lexeme_index..]
            );
        }
    }

    #[test]
    fn test_unterminated_comment_reports_diagnostic() {
        let tokenized = tokenize("/* open", &ClassifierOptions::regular()).unwrap();
        assert_eq!(tokenized.diagnostics.len(), 1);
        assert_eq!(tokenized.diagnostics[0].code, codes::lexical::UNTERMINATED_COMMENT);
    }
}
