//! Symbol discovery
//!
//! Builds the [`SymbolTable`] for one tree: the built-in framework names
//! first, then every declaration the tree contains. Name lookup and the
//! Color Color rules live in [`crate::reference_resolution`].

pub mod collector;
pub mod library;
pub mod table;

pub use collector::{
    is_implicit_var, is_label_scope, is_local_scope, last_identifier, local_scope,
    string_syntax_attribute, SymbolCollector, SCRIPT_CLASS_NAME,
};
pub use library::install_library;
pub use table::{BaseRef, Imports, Symbol, SymbolId, SymbolKind, SymbolTable, TypeRef};

use crate::config::ClassifierOptions;
use crate::grammar::ast::SyntaxTree;
use crate::logging::codes;
use crate::reference_resolution::BindingError;
use crate::{log_debug, log_success};

/// Collect every declaration of `tree` on top of the built-in library
pub fn collect_symbols(tree: &SyntaxTree, options: &ClassifierOptions) -> Result<SymbolTable, BindingError> {
    log_debug!("Starting symbol discovery",
        "nodes" => tree.node_count(),
        "mode" => options.parse_mode.as_str()
    );

    let table = SymbolCollector::new(tree, options.parse_mode, options.cancellation.clone()).collect()?;

    log_success!(
        codes::success::SYMBOL_DISCOVERY_COMPLETE,
        "Symbol discovery completed",
        "symbols" => table.len(),
        "script" => table.script_class().is_some()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use crate::syntax::parse;

    #[test]
    fn test_collect_symbols_includes_library() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class Program { }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let table = collect_symbols(&tree, &options).unwrap();
        assert!(table.find_type("System.Console").is_some());
        assert!(table.find_type("Program").is_some());
    }
}
