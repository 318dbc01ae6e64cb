//! Syntactic classification pass
//!
//! Tags every lexeme from its kind and the role the parser gave it. No
//! symbol information is used: identifiers are `identifier` unless they
//! declare a type or type parameter, which the declaration itself tells.

use super::category::{Category, ClassifiedSpan};
use super::error::{ClassificationError, ClassificationResult};
use crate::config::constants::compile_time::binding::CANCELLATION_CHECK_INTERVAL;
use crate::config::ClassifierOptions;
use crate::grammar::ast::{NodeKind, SyntaxTree, TokenRole};
use crate::lexical::escape_spans;
use crate::tokens::{CrefPiece, DirectiveRole, DocPiece, Punct, StringForm, Token};
use crate::utils::Span;

/// Classify the lexemes of `tree` that intersect `range` (all when `None`)
pub fn classify_syntactic(
    tree: &SyntaxTree,
    range: Option<Span>,
    options: &ClassifierOptions,
) -> ClassificationResult<Vec<ClassifiedSpan>> {
    let mut classifier = SyntacticClassifier {
        tree,
        spans: Vec::new(),
    };
    for (index, lexeme) in tree.tokens().all_tokens().iter().enumerate() {
        if index % CANCELLATION_CHECK_INTERVAL == 0 && options.cancellation.is_cancelled() {
            return Err(ClassificationError::cancelled("syntactic classification"));
        }
        if range.is_some_and(|range| !range.intersects(&lexeme.span)) {
            continue;
        }
        classifier.classify_lexeme(index, lexeme.value, lexeme.span);
    }
    Ok(classifier.spans)
}

struct SyntacticClassifier<'a> {
    tree: &'a SyntaxTree,
    spans: Vec<ClassifiedSpan>,
}

impl<'a> SyntacticClassifier<'a> {
    fn push(&mut self, span: Span, category: Category) {
        if !span.is_empty() {
            self.spans.push(ClassifiedSpan::new(span, category));
        }
    }

    fn classify_lexeme(&mut self, index: usize, token: Token, span: Span) {
        let category = match token {
            Token::Whitespace | Token::EndOfLine | Token::Bad | Token::Eof => return,
            Token::LineComment | Token::BlockComment | Token::Shebang | Token::ConflictMarker => Category::Comment,
            Token::DisabledText => Category::ExcludedCode,
            Token::Directive(role) => directive_category(role),
            Token::Doc(piece) => doc_category(piece),
            Token::DocCode(piece) => cref_category(piece),
            Token::DocName => Category::Identifier,
            Token::Identifier => self.identifier_category(index),
            Token::Keyword(_) => Category::Keyword,
            Token::Number => Category::Number,
            Token::Char | Token::String(StringForm::Regular) => {
                self.push_with_escapes(token, span, Category::String);
                return;
            }
            Token::String(StringForm::Verbatim) => Category::VerbatimString,
            Token::String(StringForm::Raw) => Category::String,
            Token::InterpolatedStart(form) | Token::InterpolatedEnd(form) => interpolated_category(form),
            Token::InterpolatedText(form) => {
                self.push_with_escapes(token, span, interpolated_category(form));
                return;
            }
            Token::InterpolationFormat => Category::String,
            Token::InterpolationOpen | Token::InterpolationClose => Category::Punctuation,
            Token::Punct(punct) => self.punct_category(index, punct),
        };
        self.push(span, category);
    }

    /// Split a literal around its escape sequences
    fn push_with_escapes(&mut self, token: Token, span: Span, category: Category) {
        let mut cursor = span.start;
        for escape in escape_spans(self.tree.source(), token, span) {
            self.push(Span::new(cursor, escape.start), category);
            self.push(escape, Category::StringEscape);
            cursor = escape.end;
        }
        self.push(Span::new(cursor, span.end), category);
    }

    fn identifier_category(&self, index: usize) -> Category {
        if self.tree.role(index) == TokenRole::Keyword {
            return Category::Keyword;
        }
        let declared = self
            .tree
            .token_parent(index)
            .filter(|&parent| self.tree.name_token(parent) == Some(index))
            .map(|parent| self.tree.kind(parent));
        match declared {
            Some(NodeKind::Class) => Category::ClassName,
            Some(NodeKind::Record) => Category::RecordClassName,
            Some(NodeKind::Struct) => Category::StructName,
            Some(NodeKind::RecordStruct) => Category::RecordStructName,
            Some(NodeKind::Interface) => Category::InterfaceName,
            Some(NodeKind::Enum) => Category::EnumName,
            Some(NodeKind::Delegate) => Category::DelegateName,
            Some(NodeKind::TypeParameter) => Category::TypeParameterName,
            _ => Category::Identifier,
        }
    }

    fn punct_category(&self, index: usize, punct: Punct) -> Category {
        match self.tree.role(index) {
            TokenRole::Punctuation => return Category::Punctuation,
            TokenRole::Operator => return Category::Operator,
            _ => {}
        }
        if punct.is_punctuation() {
            Category::Punctuation
        } else {
            Category::Operator
        }
    }
}

fn interpolated_category(form: StringForm) -> Category {
    match form {
        StringForm::Verbatim => Category::VerbatimString,
        StringForm::Regular | StringForm::Raw => Category::String,
    }
}

fn directive_category(role: DirectiveRole) -> Category {
    match role {
        DirectiveRole::Keyword => Category::PreprocessorKeyword,
        DirectiveRole::Text => Category::PreprocessorText,
        DirectiveRole::Identifier => Category::Identifier,
        DirectiveRole::CSharpKeyword => Category::Keyword,
        DirectiveRole::Number => Category::Number,
        DirectiveRole::String => Category::String,
        DirectiveRole::Operator => Category::Operator,
        DirectiveRole::Punctuation => Category::Punctuation,
    }
}

fn doc_category(piece: DocPiece) -> Category {
    match piece {
        DocPiece::Delimiter => Category::XmlDocDelimiter,
        DocPiece::Name => Category::XmlDocName,
        DocPiece::AttributeName => Category::XmlDocAttributeName,
        DocPiece::AttributeQuotes => Category::XmlDocAttributeQuotes,
        DocPiece::AttributeValue => Category::XmlDocAttributeValue,
        DocPiece::Text => Category::XmlDocText,
        DocPiece::EntityReference => Category::XmlDocEntityReference,
        DocPiece::CData => Category::XmlDocCData,
        DocPiece::Comment => Category::XmlDocComment,
        DocPiece::ProcessingInstruction => Category::XmlDocProcessingInstruction,
    }
}

fn cref_category(piece: CrefPiece) -> Category {
    match piece {
        CrefPiece::Identifier => Category::Identifier,
        CrefPiece::Keyword => Category::Keyword,
        CrefPiece::Operator => Category::Operator,
        CrefPiece::Punctuation => Category::Punctuation,
        CrefPiece::Number => Category::Number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::CancellationToken;
    use crate::lexical::tokenize;
    use crate::syntax::parse;
    use assert_matches::assert_matches;

    fn classify_with(source: &str, options: &ClassifierOptions) -> Vec<(Category, String)> {
        let tokenized = tokenize(source, options).unwrap();
        let tree = parse(tokenized.stream, options);
        classify_syntactic(&tree, None, options)
            .unwrap()
            .iter()
            .map(|span| (span.category, span.text(source).to_string()))
            .collect()
    }

    fn classify(source: &str) -> Vec<(Category, String)> {
        classify_with(source, &ClassifierOptions::regular())
    }

    fn pair(category: Category, text: &str) -> (Category, String) {
        (category, text.to_string())
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            classify("class C { int x = 1 + 2; }"),
            vec![
                pair(Category::Keyword, "class"),
                pair(Category::ClassName, "C"),
                pair(Category::Punctuation, "{"),
                pair(Category::Keyword, "int"),
                pair(Category::Identifier, "x"),
                pair(Category::Operator, "="),
                pair(Category::Number, "1"),
                pair(Category::Operator, "+"),
                pair(Category::Number, "2"),
                pair(Category::Punctuation, ";"),
                pair(Category::Punctuation, "}"),
            ]
        );
    }

    #[test]
    fn test_declared_type_names_by_kind() {
        let spans = classify("record R; record struct S; interface I<T> { } enum E { A } delegate void D();");
        assert!(spans.contains(&pair(Category::RecordClassName, "R")));
        assert!(spans.contains(&pair(Category::RecordStructName, "S")));
        assert!(spans.contains(&pair(Category::InterfaceName, "I")));
        assert!(spans.contains(&pair(Category::TypeParameterName, "T")));
        assert!(spans.contains(&pair(Category::EnumName, "E")));
        assert!(spans.contains(&pair(Category::DelegateName, "D")));
        assert!(spans.contains(&pair(Category::Identifier, "A")));
    }

    #[test]
    fn test_generic_angles_are_punctuation() {
        let spans = classify("class C { List<int> x; bool b = 1 < 2; }");
        let angles: Vec<_> = spans.iter().filter(|(_, text)| text == "<").collect();
        assert_eq!(angles[0].0, Category::Punctuation);
        assert_eq!(angles[1].0, Category::Operator);
        assert!(spans.contains(&pair(Category::Punctuation, ">")));
    }

    #[test]
    fn test_conditional_colon_is_operator() {
        let spans = classify("class C : B { int M(bool a) => a ? 1 : 2; }");
        let colons: Vec<_> = spans.iter().filter(|(_, text)| text == ":").collect();
        assert_eq!(colons[0].0, Category::Punctuation);
        assert_eq!(colons[1].0, Category::Operator);
        assert!(spans.contains(&pair(Category::Operator, "?")));
    }

    #[test]
    fn test_var_is_keyword_in_local_declaration() {
        let spans = classify("class C { void M() { var x = 1; } }");
        assert!(spans.contains(&pair(Category::Keyword, "var")));
    }

    #[test]
    fn test_string_escapes_are_split() {
        let spans = classify(r#"class C { string s = "a\tb"; string v = @"a\t"; }"#);
        assert!(spans.contains(&pair(Category::String, "\"a")));
        assert!(spans.contains(&pair(Category::StringEscape, "\\t")));
        assert!(spans.contains(&pair(Category::String, "b\"")));
        assert!(spans.contains(&pair(Category::VerbatimString, "@\"a\\t\"")));
    }

    #[test]
    fn test_interpolated_string_pieces() {
        let spans = classify(r#"class C { string s = $"x{{{y}z"; }"#);
        assert!(spans.contains(&pair(Category::String, "$\"")));
        assert!(spans.contains(&pair(Category::StringEscape, "{{")));
        assert!(spans.contains(&pair(Category::Punctuation, "{")));
        assert!(spans.contains(&pair(Category::Identifier, "y")));
        assert!(spans.contains(&pair(Category::Punctuation, "}")));
    }

    #[test]
    fn test_disabled_region_is_excluded_code() {
        let spans = classify("#if false\nclass A {}\n#endif\n");
        assert_eq!(
            spans,
            vec![
                pair(Category::PreprocessorKeyword, "#"),
                pair(Category::PreprocessorKeyword, "if"),
                pair(Category::Keyword, "false"),
                pair(Category::ExcludedCode, "class A {}\n"),
                pair(Category::PreprocessorKeyword, "#"),
                pair(Category::PreprocessorKeyword, "endif"),
            ]
        );
    }

    #[test]
    fn test_shebang_in_script() {
        let spans = classify_with("#!/usr/bin/env dotnet\nint x;", &ClassifierOptions::script());
        assert_eq!(spans[0], pair(Category::Comment, "#!/usr/bin/env dotnet"));
    }

    #[test]
    fn test_doc_comment_markup() {
        let spans = classify("/// <see cref=\"C\"/>\nclass C { }");
        assert_eq!(spans[0], pair(Category::XmlDocDelimiter, "///"));
        assert!(spans.contains(&pair(Category::XmlDocName, "see")));
        assert!(spans.contains(&pair(Category::XmlDocAttributeName, "cref")));
        assert!(spans.contains(&pair(Category::Identifier, "C")));
    }

    #[test]
    fn test_requested_range_limits_output() {
        let source = "class C { int x; }";
        let options = ClassifierOptions::regular();
        let tokenized = tokenize(source, &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let spans = classify_syntactic(&tree, Some(Span::new(10, 13)), &options).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text(source), "int");
    }

    #[test]
    fn test_cancelled() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class C { }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let token = CancellationToken::new();
        token.cancel();
        let cancelled = ClassifierOptions::regular().with_cancellation(token);
        assert_matches!(
            classify_syntactic(&tree, None, &cancelled),
            Err(ClassificationError::Cancelled { .. })
        );
    }
}
