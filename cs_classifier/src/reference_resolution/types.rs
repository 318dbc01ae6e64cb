//! Binder output
//!
//! [`Bindings`] maps lexeme indices to what they refer to. Declared names
//! are not repeated here; the symbol table already records them.

use crate::embedded::EmbeddedHint;
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};
use std::collections::{HashMap, HashSet};

/// What one identifier lexeme binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub kind: SymbolKind,
    /// Whether the use also gets the static decoration
    pub is_static: bool,
    /// `None` for names with a kind but no symbol, such as anonymous type members
    pub symbol: Option<SymbolId>,
}

impl Resolution {
    pub fn of_symbol(table: &SymbolTable, id: SymbolId) -> Self {
        let symbol = table.get(id);
        Self {
            kind: symbol.kind,
            is_static: has_static_decoration(symbol.kind, symbol.is_static),
            symbol: Some(id),
        }
    }

    pub fn synthetic(kind: SymbolKind) -> Self {
        Self {
            kind,
            is_static: false,
            symbol: None,
        }
    }

    pub fn without_static(mut self) -> Self {
        self.is_static = false;
        self
    }
}

/// Static members, static classes and constants carry the decoration;
/// enum members, namespaces, locals and local functions never do
pub fn has_static_decoration(kind: SymbolKind, is_static: bool) -> bool {
    is_static
        && !matches!(
            kind,
            SymbolKind::EnumMember
                | SymbolKind::Namespace
                | SymbolKind::LocalFunction
                | SymbolKind::Local
                | SymbolKind::Parameter
                | SymbolKind::Label
                | SymbolKind::TypeParameter
        )
}

/// Counters reported when binding completes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingStats {
    pub names_visited: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub arity_fallbacks: usize,
    pub color_color: usize,
    pub cref_names: usize,
    pub overloaded_operators: usize,
    pub string_syntax_literals: usize,
}

impl BindingStats {
    pub fn summary(&self) -> String {
        format!(
            "Binding: {}/{} names resolved, {} arity fallbacks, {} color-color, {} cref names, {} overloaded operators",
            self.resolved,
            self.names_visited,
            self.arity_fallbacks,
            self.color_color,
            self.cref_names,
            self.overloaded_operators
        )
    }
}

/// Everything the semantic pass needs beyond the symbol table
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    /// Identifier lexeme (significant or inside a doc comment) to its binding
    pub token_symbols: HashMap<usize, Resolution>,
    /// `var`, `dynamic` and similar identifiers that bound to nothing and read as keywords
    pub keyword_tokens: HashSet<usize>,
    /// Operator lexemes that call a user-defined operator
    pub overloaded_operators: HashSet<usize>,
    /// String literal lexemes whose target declares an embedded language
    pub string_syntax: HashMap<usize, EmbeddedHint>,
    pub stats: BindingStats,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution(&self, token: usize) -> Option<Resolution> {
        self.token_symbols.get(&token).copied()
    }

    pub fn is_keyword(&self, token: usize) -> bool {
        self.keyword_tokens.contains(&token)
    }

    pub fn is_overloaded_operator(&self, token: usize) -> bool {
        self.overloaded_operators.contains(&token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol;

    #[test]
    fn test_static_decoration_rules() {
        assert!(has_static_decoration(SymbolKind::Method, true));
        assert!(has_static_decoration(SymbolKind::Constant, true));
        assert!(!has_static_decoration(SymbolKind::EnumMember, true));
        assert!(!has_static_decoration(SymbolKind::LocalFunction, true));
        assert!(!has_static_decoration(SymbolKind::Field, false));
    }

    #[test]
    fn test_resolution_of_symbol() {
        let mut table = SymbolTable::new();
        let global = table.global_namespace();
        let id = table.add_member(global, Symbol::new("Util", SymbolKind::Class).with_static(true));
        let resolution = Resolution::of_symbol(&table, id);
        assert_eq!(resolution.kind, SymbolKind::Class);
        assert!(resolution.is_static);
        assert!(!resolution.without_static().is_static);
    }
}
