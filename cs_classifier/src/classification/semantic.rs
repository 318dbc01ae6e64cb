//! Semantic classification pass
//!
//! Turns binder output into tags. Only lexemes the binder has something
//! to say about produce spans; everything else keeps its syntactic
//! category when the passes are merged.

use super::category::{sort_spans, Category, ClassifiedSpan};
use super::error::{ClassificationError, ClassificationResult};
use crate::config::constants::compile_time::binding::CANCELLATION_CHECK_INTERVAL;
use crate::config::ClassifierOptions;
use crate::grammar::ast::SyntaxTree;
use crate::reference_resolution::{Bindings, Resolution};
use crate::symbols::SymbolTable;
use crate::utils::Span;
use std::collections::BTreeMap;

/// What the semantic pass decided for one lexeme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Symbol(Resolution),
    Keyword,
    OverloadedOperator,
}

/// Classify bound lexemes of `tree` that intersect `range`
pub fn classify_semantic(
    tree: &SyntaxTree,
    table: &SymbolTable,
    bindings: &Bindings,
    range: Option<Span>,
    options: &ClassifierOptions,
) -> ClassificationResult<Vec<ClassifiedSpan>> {
    // Declarations first so that a recorded use of the same lexeme wins
    let mut decisions: BTreeMap<usize, Decision> = BTreeMap::new();
    for (token, id) in table.declared_tokens() {
        decisions.insert(token, Decision::Symbol(Resolution::of_symbol(table, id)));
    }
    for (&token, &resolution) in &bindings.token_symbols {
        decisions.insert(token, Decision::Symbol(resolution));
    }
    for &token in &bindings.keyword_tokens {
        decisions.insert(token, Decision::Keyword);
    }
    for &token in &bindings.overloaded_operators {
        decisions.insert(token, Decision::OverloadedOperator);
    }

    let stream = tree.tokens();
    let mut spans = Vec::with_capacity(decisions.len());
    for (visited, (&token, &decision)) in decisions.iter().enumerate() {
        if visited % CANCELLATION_CHECK_INTERVAL == 0 && options.cancellation.is_cancelled() {
            return Err(ClassificationError::cancelled("semantic classification"));
        }
        let span = stream.span(token);
        if span.is_empty() || range.is_some_and(|range| !range.intersects(&span)) {
            continue;
        }
        match decision {
            Decision::Symbol(resolution) => {
                spans.push(ClassifiedSpan::new(span, Category::for_symbol(resolution.kind)));
                if resolution.is_static {
                    spans.push(ClassifiedSpan::new(span, Category::StaticSymbol));
                }
            }
            Decision::Keyword => spans.push(ClassifiedSpan::new(span, Category::Keyword)),
            Decision::OverloadedOperator => spans.push(ClassifiedSpan::new(span, Category::OperatorOverloaded)),
        }
    }
    sort_spans(&mut spans);
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::CancellationToken;
    use crate::lexical::tokenize;
    use crate::reference_resolution::bind;
    use crate::symbols::collect_symbols;
    use crate::syntax::parse;
    use assert_matches::assert_matches;

    fn classify_with(source: &str, options: &ClassifierOptions) -> Vec<(Category, String)> {
        let tokenized = tokenize(source, options).unwrap();
        let tree = parse(tokenized.stream, options);
        let table = collect_symbols(&tree, options).unwrap();
        let bindings = bind(&tree, &table, options).unwrap();
        classify_semantic(&tree, &table, &bindings, None, options)
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
    fn test_declarations_get_symbol_categories() {
        let spans = classify("class C { int f; void M(int p) { int l = p; } }");
        assert_eq!(
            spans,
            vec![
                pair(Category::ClassName, "C"),
                pair(Category::FieldName, "f"),
                pair(Category::MethodName, "M"),
                pair(Category::ParameterName, "p"),
                pair(Category::LocalName, "l"),
                pair(Category::ParameterName, "p"),
            ]
        );
    }

    #[test]
    fn test_color_color_instance_field() {
        let spans = classify("class T { T T; void M() { T.T = null; } }");
        assert_eq!(
            spans,
            vec![
                pair(Category::ClassName, "T"),
                pair(Category::ClassName, "T"),
                pair(Category::FieldName, "T"),
                pair(Category::MethodName, "M"),
                pair(Category::ClassName, "T"),
                pair(Category::FieldName, "T"),
            ]
        );
    }

    #[test]
    fn test_static_member_gets_decoration() {
        let spans = classify("class C { static int s; void M() { C.s = 1; } }");
        let decorated: Vec<_> = spans.iter().filter(|(category, _)| *category == Category::StaticSymbol).collect();
        assert_eq!(decorated.len(), 2);
        let position = spans.iter().position(|(category, _)| *category == Category::StaticSymbol).unwrap();
        assert_eq!(spans[position - 1], pair(Category::FieldName, "s"));
    }

    #[test]
    fn test_const_is_static() {
        let spans = classify("class C { const int K = 1; }");
        assert!(spans.contains(&pair(Category::ConstantName, "K")));
        assert!(spans.contains(&pair(Category::StaticSymbol, "K")));
    }

    #[test]
    fn test_implicit_var_is_keyword() {
        let spans = classify("class C { void M() { var x = 1; foreach (var y in new int[0]) { } } }");
        let vars: Vec<_> = spans.iter().filter(|(_, text)| text == "var").collect();
        assert_eq!(vars.len(), 2);
        assert!(vars.iter().all(|(category, _)| *category == Category::Keyword));
    }

    #[test]
    fn test_dynamic_type_wins_over_keyword() {
        let spans = classify("class dynamic { dynamic() { dynamic d; } }");
        let dynamics: Vec<_> = spans.iter().filter(|(_, text)| text == "dynamic").collect();
        assert_eq!(dynamics.len(), 3);
        assert!(dynamics.iter().all(|(category, _)| *category == Category::ClassName));
    }

    #[test]
    fn test_script_top_level_variable_is_field() {
        let spans = classify_with("int x = 1; x++;", &ClassifierOptions::script());
        assert_eq!(spans, vec![pair(Category::FieldName, "x"), pair(Category::FieldName, "x")]);
    }

    #[test]
    fn test_overloaded_operator() {
        let spans = classify(
            "class V { public static V operator +(V a, V b) => a; void M(V x, V y) { var z = x + y; } }",
        );
        assert!(spans.contains(&pair(Category::OperatorOverloaded, "+")));
    }

    #[test]
    fn test_operator_use_with_either_body_form() {
        for source in [
            "class V { public static V operator -(V a, V b) => a; void M(V a) { var c = a - a; } }",
            "class V { public static V operator -(V a, V b) { return a; } void M(V a) { var c = a - a; } }",
        ] {
            assert!(classify(source).contains(&pair(Category::OperatorOverloaded, "-")), "{}", source);
        }
    }

    #[test]
    fn test_global_extension_method_call() {
        let spans = classify("static class E { public static void X(this C c) { } } class C { void M(C c) { c.X(); } }");
        let calls: Vec<_> = spans.iter().filter(|(_, text)| text == "X").collect();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(category, _)| *category == Category::ExtensionMethodName));
    }

    #[test]
    fn test_unresolved_names_emit_nothing() {
        let spans = classify("class C { void M() { Unknown.Call(); } }");
        assert!(!spans.iter().any(|(_, text)| text == "Unknown" || text == "Call"));
    }

    #[test]
    fn test_cancelled() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class C { }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let table = collect_symbols(&tree, &options).unwrap();
        let bindings = bind(&tree, &table, &options).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let cancelled = ClassifierOptions::regular().with_cancellation(token);
        assert_matches!(
            classify_semantic(&tree, &table, &bindings, None, &cancelled),
            Err(ClassificationError::Cancelled { .. })
        );
    }
}
