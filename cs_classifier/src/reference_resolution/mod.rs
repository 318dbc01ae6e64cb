//! Reference Resolution
//!
//! Binds every simple name, cref and operator of a tree against the
//! [`SymbolTable`] collected for it. The result says, per lexeme, which
//! kind of symbol it refers to and whether that use is static; the
//! semantic classifier turns it into tags.

use crate::config::ClassifierOptions;
use crate::grammar::ast::SyntaxTree;
use crate::logging::codes;
use crate::symbols::SymbolTable;
use crate::{log_debug, log_success};

pub mod binder;
mod cref;
pub mod error;
pub mod types;

pub use binder::Binder;
pub use error::{BindingError, BindingResult};
pub use types::{has_static_decoration, BindingStats, Bindings, Resolution};

/// Bind all references in `tree`
pub fn bind(tree: &SyntaxTree, table: &SymbolTable, options: &ClassifierOptions) -> BindingResult<Bindings> {
    log_debug!("Starting binding",
        "nodes" => tree.node_count(),
        "symbols" => table.len(),
        "mode" => options.parse_mode.as_str()
    );

    let bindings = Binder::new(tree, table, options).bind()?;

    log_success!(
        codes::success::BINDING_COMPLETE,
        &bindings.stats.summary(),
        "resolved" => bindings.stats.resolved,
        "unresolved" => bindings.stats.unresolved,
        "color_color" => bindings.stats.color_color
    );
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::CancellationToken;
    use crate::lexical::tokenize;
    use crate::symbols::{collect_symbols, SymbolKind};
    use crate::syntax::parse;

    struct Bound {
        tree: SyntaxTree,
        bindings: Bindings,
    }

    impl Bound {
        /// Lexeme index of the `nth` lexeme spelled `text`
        fn token(&self, text: &str, nth: usize) -> usize {
            let stream = self.tree.tokens();
            (0..stream.all_tokens().len())
                .filter(|&index| stream.text(index) == text)
                .nth(nth)
                .unwrap_or_else(|| panic!("no occurrence {} of {:?}", nth, text))
        }

        fn resolution(&self, text: &str, nth: usize) -> Option<Resolution> {
            self.bindings.resolution(self.token(text, nth))
        }

        fn kind(&self, text: &str, nth: usize) -> Option<SymbolKind> {
            self.resolution(text, nth).map(|resolution| resolution.kind)
        }
    }

    fn bind_with(source: &str, options: &ClassifierOptions) -> Bound {
        let tokenized = tokenize(source, options).unwrap();
        let tree = parse(tokenized.stream, options);
        let table = collect_symbols(&tree, options).unwrap();
        let bindings = bind(&tree, &table, options).unwrap();
        Bound { tree, bindings }
    }

    fn bind_source(source: &str) -> Bound {
        bind_with(source, &ClassifierOptions::regular())
    }

    #[test]
    fn test_color_color_receiver_binds_as_type() {
        let bound = bind_source(
            "class Color { public static Color Red; public int R; }
             class C { Color Color; void M() { var x = Color.Red; } }",
        );
        assert_eq!(bound.kind("Color", 4), Some(SymbolKind::Class));
        let red = bound.resolution("Red", 1).unwrap();
        assert_eq!(red.kind, SymbolKind::Field);
        assert!(red.is_static);
        assert_eq!(bound.bindings.stats.color_color, 1);
    }

    #[test]
    fn test_value_receiver_without_type_match_stays_value() {
        let bound = bind_source(
            "class Paint { public int R; }
             class C { Paint Color; void M() { var x = Color.R; } }",
        );
        assert_eq!(bound.kind("Color", 1), Some(SymbolKind::Field));
        assert_eq!(bound.kind("R", 1), Some(SymbolKind::Field));
        assert_eq!(bound.bindings.stats.color_color, 0);
    }

    #[test]
    fn test_arity_mismatch_falls_back_to_same_name() {
        let bound = bind_source("class Box<T> { } class C { Box b; }");
        assert_eq!(bound.kind("Box", 1), Some(SymbolKind::Class));
        assert!(bound.bindings.stats.arity_fallbacks >= 1);
    }

    #[test]
    fn test_attribute_name_uses_suffix() {
        let bound = bind_source("using System; [Obsolete] class C { }");
        let obsolete = bound.resolution("Obsolete", 0).unwrap();
        assert_eq!(obsolete.kind, SymbolKind::Class);
        assert_eq!(bound.kind("System", 0), Some(SymbolKind::Namespace));
    }

    #[test]
    fn test_var_binds_as_keyword() {
        let bound = bind_source("class C { void M() { var x = 1; } }");
        assert!(bound.bindings.is_keyword(bound.token("var", 0)));
        assert_eq!(bound.kind("var", 0), None);
    }

    #[test]
    fn test_var_binds_to_declared_type() {
        let bound = bind_source("class var { } class C { void M() { var x = null; } }");
        assert_eq!(bound.kind("var", 1), Some(SymbolKind::Class));
    }

    #[test]
    fn test_named_argument_binds_parameter() {
        let bound = bind_source("class C { void M(int count) { } void N() { M(count: 1); } }");
        assert_eq!(bound.kind("count", 1), Some(SymbolKind::Parameter));
        assert_eq!(bound.kind("M", 1), Some(SymbolKind::Method));
    }

    #[test]
    fn test_extension_method_is_not_static() {
        let bound = bind_source(
            "using System.Linq; using System.Collections.Generic;
             class C { void M(List<int> xs) { xs.Where(x => true); } }",
        );
        let where_call = bound.resolution("Where", 0).unwrap();
        assert_eq!(where_call.kind, SymbolKind::ExtensionMethod);
        assert!(!where_call.is_static);
        assert_eq!(bound.kind("xs", 1), Some(SymbolKind::Parameter));
    }

    #[test]
    fn test_static_member_use() {
        let bound = bind_source("class C { static int Count; void M() { Count = 1; } }");
        let count = bound.resolution("Count", 1).unwrap();
        assert_eq!(count.kind, SymbolKind::Field);
        assert!(count.is_static);
    }

    #[test]
    fn test_locals_shadow_fields() {
        let bound = bind_source("class C { int value; void M() { int value = 0; value++; } }");
        assert_eq!(bound.kind("value", 2), Some(SymbolKind::Local));
    }

    #[test]
    fn test_cref_names_bind() {
        let bound = bind_source("/// <see cref=\"C.M\"/>\nclass C { void M() { } }");
        assert_eq!(bound.kind("C", 0), Some(SymbolKind::Class));
        assert_eq!(bound.kind("M", 0), Some(SymbolKind::Method));
        assert!(bound.bindings.stats.cref_names >= 2);
    }

    #[test]
    fn test_cref_constructor_form() {
        let bound = bind_source("class C { /// <see cref=\"C()\"/>\n void M() { } }");
        assert_eq!(bound.kind("C", 1), Some(SymbolKind::Method));
    }

    #[test]
    fn test_cref_qualified_constructor_form() {
        let bound = bind_source("/// <see cref=\"MyClass.MyClass(int)\"/>\nclass MyClass { MyClass(int a) { } }");
        assert_eq!(bound.kind("MyClass", 0), Some(SymbolKind::Class));
        assert_eq!(bound.kind("MyClass", 1), Some(SymbolKind::Method));
    }

    #[test]
    fn test_extension_method_in_global_namespace() {
        let bound = bind_source(
            "static class E { public static void X(this C c) { } } class C { void M(C c) { c.X(); } }",
        );
        let call = bound.resolution("X", 1).unwrap();
        assert_eq!(call.kind, SymbolKind::ExtensionMethod);
        assert!(!call.is_static);
    }

    #[test]
    fn test_param_name_binds_parameter() {
        let bound = bind_source("class C { /// <param name=\"x\">X</param>\n void M(int x) { } }");
        assert_eq!(bound.kind("x", 0), Some(SymbolKind::Parameter));
    }

    #[test]
    fn test_script_top_level_locals_are_fields() {
        let bound = bind_with("int x = 1; x++;", &ClassifierOptions::script());
        assert_eq!(bound.kind("x", 1), Some(SymbolKind::Field));
    }

    #[test]
    fn test_cancelled_binding() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class C { void M() { } }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let table = collect_symbols(&tree, &options).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let cancelled = ClassifierOptions::regular().with_cancellation(token);
        let error = bind(&tree, &table, &cancelled).unwrap_err();
        assert!(error.is_cancelled());
    }

    #[test]
    fn test_overloaded_operator_tokens() {
        let bound = bind_source(
            "class V { public static V operator +(V a, V b) => a; }
             class C { void M(V a, V b) { var c = a + b; var d = 1 + 2; } }",
        );
        assert!(bound.bindings.is_overloaded_operator(bound.token("+", 1)));
        assert!(!bound.bindings.is_overloaded_operator(bound.token("+", 2)));
    }

    #[test]
    fn test_regex_argument_gets_string_syntax() {
        let bound = bind_source(
            "using System.Text.RegularExpressions;
             class C { void M() { var r = new Regex(\"a+\", RegexOptions.IgnoreCase); } }",
        );
        let hint = bound.bindings.string_syntax.get(&bound.token("\"a+\"", 0)).copied().unwrap();
        assert_eq!(hint.language, crate::embedded::EmbeddedLanguage::Regex);
        assert!(hint.regex_options.contains(crate::embedded::RegexOptions::IGNORE_CASE));
    }
}
