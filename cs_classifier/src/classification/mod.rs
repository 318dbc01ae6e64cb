//! Classification of a parsed tree
//!
//! Three streams are produced and merged:
//! - the syntactic pass tags every lexeme from its kind and parser role
//! - the semantic pass tags bound names from their symbol kinds
//! - the embedded pass sub-classifies regex and JSON literals
//!
//! [`classify_tree`] runs all of them for one tree. Cancellation is
//! checked between and inside the passes.

pub mod cancellation;
pub mod category;
pub mod error;
pub mod incremental;
pub mod merge;
pub mod semantic;
pub mod syntactic;

pub use cancellation::CancellationToken;
pub use category::{sort_spans, Category, ClassifiedSpan};
pub use error::{ClassificationError, ClassificationResult};
pub use incremental::{ClassificationUpdate, IncrementalSession, TextChange};
pub use merge::merge_classifications;
pub use semantic::classify_semantic;
pub use syntactic::classify_syntactic;

use crate::config::ClassifierOptions;
use crate::embedded::{classify_embedded, EmbeddedLiteral};
use crate::grammar::ast::SyntaxTree;
use crate::logging::codes;
use crate::reference_resolution::{bind, BindingStats};
use crate::symbols::collect_symbols;
use crate::utils::Span;
use crate::{log_debug, log_success};

/// Merged output of all passes over one tree
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub spans: Vec<ClassifiedSpan>,
    /// Literals that received embedded spans; used to check containment
    pub embedded: Vec<EmbeddedLiteral>,
    /// `None` when the semantic pass is disabled
    pub binding: Option<BindingStats>,
}

/// Run every enabled pass over `tree` and merge the results
pub fn classify_tree(
    tree: &SyntaxTree,
    range: Option<Span>,
    options: &ClassifierOptions,
) -> ClassificationResult<Classification> {
    check_cancelled(options, "classification")?;
    let syntactic = classify_syntactic(tree, range, options)?;
    log_debug!("Syntactic pass complete", "spans" => syntactic.len());

    let (semantic, bindings, binding) = if options.semantic {
        let table = collect_symbols(tree, options)?;
        let bindings = bind(tree, &table, options)?;
        let semantic = classify_semantic(tree, &table, &bindings, range, options)?;
        let stats = bindings.stats.clone();
        (semantic, Some(bindings), Some(stats))
    } else {
        (Vec::new(), None, None)
    };
    log_debug!("Semantic pass complete", "spans" => semantic.len());

    let mut embedded = classify_embedded(tree, bindings.as_ref(), options)?;
    if let Some(range) = range {
        embedded.retain(|literal| range.intersects(&literal.literal));
    }

    check_cancelled(options, "merge")?;
    let spans = merge_classifications(syntactic, semantic, &embedded, range);

    log_success!(codes::success::CLASSIFICATION_COMPLETE,
        "Classification complete",
        "spans" => spans.len(),
        "embedded_literals" => embedded.len()
    );
    Ok(Classification {
        spans,
        embedded,
        binding,
    })
}

fn check_cancelled(options: &ClassifierOptions, stage: &'static str) -> ClassificationResult<()> {
    if options.cancellation.is_cancelled() {
        return Err(ClassificationError::cancelled(stage));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use crate::syntax::parse;
    use assert_matches::assert_matches;

    fn classify(source: &str, options: &ClassifierOptions) -> Vec<(Category, String)> {
        let tokenized = tokenize(source, options).unwrap();
        let tree = parse(tokenized.stream, options);
        classify_tree(&tree, None, options)
            .unwrap()
            .spans
            .iter()
            .map(|span| (span.category, span.text(source).to_string()))
            .collect()
    }

    fn pair(category: Category, text: &str) -> (Category, String) {
        (category, text.to_string())
    }

    #[test]
    fn test_static_class_use_is_decorated() {
        let spans = classify(
            "using System; class C { void M() { Math.Abs(1); } }",
            &ClassifierOptions::regular(),
        );
        let math = spans.iter().position(|(_, text)| text == "Math").unwrap();
        assert_eq!(spans[math], pair(Category::ClassName, "Math"));
        assert_eq!(spans[math + 1], pair(Category::StaticSymbol, "Math"));
    }

    #[test]
    fn test_generic_arity_falls_back() {
        let spans = classify("class A<T> { } class C { A d; }", &ClassifierOptions::regular());
        let uses: Vec<_> = spans.iter().filter(|(_, text)| text == "A").collect();
        assert_eq!(uses.len(), 2);
        assert!(uses.iter().all(|(category, _)| *category == Category::ClassName));
    }

    #[test]
    fn test_semantic_disabled_keeps_syntactic_categories() {
        let options = ClassifierOptions::regular().with_semantic(false);
        let spans = classify("class C { int f; }", &options);
        assert!(spans.contains(&pair(Category::Identifier, "f")));
        assert!(spans.contains(&pair(Category::ClassName, "C")));
    }

    #[test]
    fn test_hinted_regex_replaces_string() {
        let source = "class C { void M() {\n// language=regex\nvar r = @\"$(\\a)\";\n} }";
        let spans = classify(source, &ClassifierOptions::regular());
        let start = spans.iter().position(|(_, text)| text == "@\"").unwrap();
        assert_eq!(
            spans[start..start + 7].to_vec(),
            vec![
                pair(Category::VerbatimString, "@\""),
                pair(Category::RegexAnchor, "$"),
                pair(Category::RegexGrouping, "("),
                pair(Category::RegexOtherEscape, "\\"),
                pair(Category::RegexOtherEscape, "a"),
                pair(Category::RegexGrouping, ")"),
                pair(Category::VerbatimString, "\""),
            ]
        );
    }

    #[test]
    fn test_hinted_literal_with_escaped_non_ascii_char() {
        let source = "class C { void M() {\n// lang=regex\nvar r = \"\\é\";\n} }";
        let spans = classify(source, &ClassifierOptions::regular());
        assert!(spans.contains(&pair(Category::String, "\"")));
        assert!(spans.contains(&pair(Category::StringEscape, "\\é")));
        assert!(!spans.iter().any(|(category, _)| category.as_str().starts_with("regex")));
    }

    #[test]
    fn test_excluded_region_is_single_span() {
        let spans = classify("#if false\nclass C { int x; }\n#endif\n", &ClassifierOptions::regular());
        let excluded: Vec<_> = spans.iter().filter(|(category, _)| *category == Category::ExcludedCode).collect();
        assert_eq!(excluded, vec![&pair(Category::ExcludedCode, "class C { int x; }\n")]);
    }

    #[test]
    fn test_idempotent() {
        let source = "namespace N { static class S { public static int F(this string s) => s.Length; } }";
        let options = ClassifierOptions::regular();
        assert_eq!(classify(source, &options), classify(source, &options));
    }

    #[test]
    fn test_cancelled_before_start() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class C { }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let token = CancellationToken::new();
        token.cancel();
        let cancelled = ClassifierOptions::regular().with_cancellation(token);
        assert_matches!(
            classify_tree(&tree, None, &cancelled),
            Err(ClassificationError::Cancelled { .. })
        );
    }
}
