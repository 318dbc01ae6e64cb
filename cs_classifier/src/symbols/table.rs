//! Symbol table for one compilation unit plus the built-in library
//!
//! Symbols live in an arena indexed by [`SymbolId`]. Types and namespaces
//! keep a member index by name; locals, parameters, type parameters, range
//! variables and labels are filed under the syntax node whose subtree they
//! are visible in.

use crate::embedded::EmbeddedLanguage;
use crate::grammar::ast::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Index of a symbol in the table arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of symbol kinds the classifier distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Namespace,
    Class,
    RecordClass,
    Struct,
    RecordStruct,
    Interface,
    Enum,
    EnumMember,
    Delegate,
    TypeParameter,
    Field,
    Constant,
    Property,
    Event,
    Method,
    ExtensionMethod,
    Local,
    Parameter,
    Label,
    LocalFunction,
}

impl SymbolKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::RecordClass
                | SymbolKind::Struct
                | SymbolKind::RecordStruct
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Delegate
                | SymbolKind::TypeParameter
        )
    }

    pub fn is_namespace_or_type(self) -> bool {
        self == SymbolKind::Namespace || self.is_type()
    }

    /// Symbols that denote a value with a declared type
    pub fn is_value(self) -> bool {
        matches!(
            self,
            SymbolKind::Field
                | SymbolKind::Constant
                | SymbolKind::Property
                | SymbolKind::Event
                | SymbolKind::Local
                | SymbolKind::Parameter
                | SymbolKind::EnumMember
        )
    }

    pub fn is_method(self) -> bool {
        matches!(
            self,
            SymbolKind::Method | SymbolKind::ExtensionMethod | SymbolKind::LocalFunction
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Namespace => "namespace",
            SymbolKind::Class => "class",
            SymbolKind::RecordClass => "record class",
            SymbolKind::Struct => "struct",
            SymbolKind::RecordStruct => "record struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum member",
            SymbolKind::Delegate => "delegate",
            SymbolKind::TypeParameter => "type parameter",
            SymbolKind::Field => "field",
            SymbolKind::Constant => "constant",
            SymbolKind::Property => "property",
            SymbolKind::Event => "event",
            SymbolKind::Method => "method",
            SymbolKind::ExtensionMethod => "extension method",
            SymbolKind::Local => "local",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Label => "label",
            SymbolKind::LocalFunction => "local function",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared type of a value or return type of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    None,
    /// Type syntax in the tree, resolved lazily by the binder
    Syntax(NodeId),
    /// Implicitly typed; the type is that of the initializer expression
    Inferred(NodeId),
    /// A library symbol
    Symbol(SymbolId),
}

/// Base type of a type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseRef {
    Syntax(NodeId),
    Symbol(SymbolId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub is_static: bool,
    /// Number of type parameters for generic types and methods
    pub arity: usize,
    /// Declaring namespace or type
    pub container: Option<SymbolId>,
    /// Declaring syntax node; `None` for library symbols
    pub declaration: Option<NodeId>,
    pub type_ref: TypeRef,
    pub parameters: Vec<SymbolId>,
    /// Language declared through `[StringSyntax]`
    pub string_syntax: Option<EmbeddedLanguage>,
    /// Member index by name, for namespaces and types
    #[serde(skip)]
    pub members: HashMap<String, Vec<SymbolId>>,
    pub bases: Vec<BaseRef>,
    /// Instance constructors, kept apart from the member index
    pub constructors: Vec<SymbolId>,
    /// Operator tokens declared by `operator` members, e.g. `+` or `==`
    pub operators: Vec<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            arity: 0,
            container: None,
            declaration: None,
            type_ref: TypeRef::None,
            parameters: Vec::new(),
            string_syntax: None,
            members: HashMap::new(),
            bases: Vec::new(),
            constructors: Vec::new(),
            operators: Vec::new(),
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_type(mut self, type_ref: TypeRef) -> Self {
        self.type_ref = type_ref;
        self
    }

    pub fn with_declaration(mut self, node: NodeId) -> Self {
        self.declaration = Some(node);
        self
    }
}

/// Arena of symbols with indexes by declaration and by scope
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    global_namespace: SymbolId,
    /// Implicit class holding top-level members in script mode
    script_class: Option<SymbolId>,
    /// Declared-name token to symbol
    declared_tokens: HashMap<usize, SymbolId>,
    /// Declaring node to symbol
    declarations: HashMap<NodeId, SymbolId>,
    /// Scope node to the symbols visible throughout its subtree
    scoped: HashMap<NodeId, Vec<SymbolId>>,
    /// `using` directives per namespace body (or compilation unit)
    imports: HashMap<NodeId, Imports>,
}

/// Aliases, imported namespaces and `using static` types of one scope
#[derive(Debug, Clone, Default)]
pub struct Imports {
    /// Alias name to the target syntax node
    pub aliases: HashMap<String, NodeId>,
    /// Syntax nodes naming imported namespaces
    pub namespaces: Vec<NodeId>,
    /// Syntax nodes naming `using static` types
    pub static_types: Vec<NodeId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut global = Symbol::new("", SymbolKind::Namespace);
        global.container = None;
        Self {
            symbols: vec![global],
            global_namespace: SymbolId(0),
            script_class: None,
            declared_tokens: HashMap::new(),
            declarations: HashMap::new(),
            scoped: HashMap::new(),
            imports: HashMap::new(),
        }
    }

    // === ACCESS ===

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn global_namespace(&self) -> SymbolId {
        self.global_namespace
    }

    pub fn script_class(&self) -> Option<SymbolId> {
        self.script_class
    }

    pub fn set_script_class(&mut self, id: SymbolId) {
        self.script_class = Some(id);
    }

    pub fn declared_at_token(&self, token: usize) -> Option<SymbolId> {
        self.declared_tokens.get(&token).copied()
    }

    pub fn declared_tokens(&self) -> impl Iterator<Item = (usize, SymbolId)> + '_ {
        self.declared_tokens.iter().map(|(&token, &id)| (token, id))
    }

    pub fn declared_by(&self, node: NodeId) -> Option<SymbolId> {
        self.declarations.get(&node).copied()
    }

    pub fn scoped_at(&self, node: NodeId) -> &[SymbolId] {
        self.scoped.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn imports_at(&self, node: NodeId) -> Option<&Imports> {
        self.imports.get(&node)
    }

    /// Members named `name` declared directly in `container`
    pub fn members_named(&self, container: SymbolId, name: &str) -> &[SymbolId] {
        self.get(container)
            .members
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_members(&self, container: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.get(container).members.values().flatten().copied()
    }

    /// Dotted name from the global namespace, e.g. `System.Console`
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(symbol_id) = current {
            let symbol = self.get(symbol_id);
            if !symbol.name.is_empty() {
                parts.push(symbol.name.as_str());
            }
            current = symbol.container;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Follow a dotted namespace path from the global namespace
    pub fn find_namespace(&self, path: &str) -> Option<SymbolId> {
        let mut current = self.global_namespace;
        for part in path.split('.').filter(|part| !part.is_empty()) {
            current = self
                .members_named(current, part)
                .iter()
                .copied()
                .find(|&id| self.get(id).kind == SymbolKind::Namespace)?;
        }
        Some(current)
    }

    /// Find a type by dotted path, ignoring arity
    pub fn find_type(&self, path: &str) -> Option<SymbolId> {
        let (namespace, name) = match path.rfind('.') {
            Some(dot) => (&path[..dot], &path[dot + 1..]),
            None => ("", path),
        };
        let container = self.find_namespace(namespace)?;
        self.members_named(container, name)
            .iter()
            .copied()
            .find(|&id| self.get(id).kind.is_type())
    }

    // === CONSTRUCTION ===

    /// Add a symbol without indexing it anywhere
    pub fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    /// Add a symbol as a member of `container`
    pub fn add_member(&mut self, container: SymbolId, mut symbol: Symbol) -> SymbolId {
        symbol.container = Some(container);
        let name = symbol.name.clone();
        let id = self.push(symbol);
        self.get_mut(container).members.entry(name).or_default().push(id);
        id
    }

    /// Namespace `name` inside `container`, created on first use
    pub fn namespace_in(&mut self, container: SymbolId, name: &str) -> SymbolId {
        let existing = self
            .members_named(container, name)
            .iter()
            .copied()
            .find(|&id| self.get(id).kind == SymbolKind::Namespace);
        match existing {
            Some(id) => id,
            None => self.add_member(container, Symbol::new(name, SymbolKind::Namespace)),
        }
    }

    /// Namespace for a dotted path, created on first use
    pub fn ensure_namespace(&mut self, path: &str) -> SymbolId {
        let mut current = self.global_namespace;
        for part in path.split('.').filter(|part| !part.is_empty()) {
            current = self.namespace_in(current, part);
        }
        current
    }

    pub fn add_scoped(&mut self, scope: NodeId, mut symbol: Symbol) -> SymbolId {
        symbol.container = None;
        let id = self.push(symbol);
        self.scoped.entry(scope).or_default().push(id);
        id
    }

    pub fn record_token(&mut self, token: usize, id: SymbolId) {
        self.declared_tokens.insert(token, id);
    }

    pub fn record_declaration(&mut self, node: NodeId, id: SymbolId) {
        self.declarations.insert(node, id);
    }

    pub fn imports_mut(&mut self, scope: NodeId) -> &mut Imports {
        self.imports.entry(scope).or_default()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_merged() {
        let mut table = SymbolTable::new();
        let a = table.ensure_namespace("System.Text");
        let b = table.ensure_namespace("System.Text");
        assert_eq!(a, b);
        assert_eq!(table.qualified_name(a), "System.Text");
        assert_eq!(table.find_namespace("System.Text"), Some(a));
        assert_eq!(table.find_namespace("System.Missing"), None);
    }

    #[test]
    fn test_members_and_lookup_by_path() {
        let mut table = SymbolTable::new();
        let system = table.ensure_namespace("System");
        let console = table.add_member(system, Symbol::new("Console", SymbolKind::Class).with_static(true));
        table.add_member(console, Symbol::new("WriteLine", SymbolKind::Method).with_static(true));

        assert_eq!(table.find_type("System.Console"), Some(console));
        assert_eq!(table.members_named(console, "WriteLine").len(), 1);
        assert!(table.members_named(console, "Write").is_empty());
        assert_eq!(table.get(console).container, Some(system));
    }

    #[test]
    fn test_kind_groups() {
        assert!(SymbolKind::RecordStruct.is_type());
        assert!(SymbolKind::TypeParameter.is_type());
        assert!(!SymbolKind::Namespace.is_type());
        assert!(SymbolKind::Namespace.is_namespace_or_type());
        assert!(SymbolKind::EnumMember.is_value());
        assert!(SymbolKind::LocalFunction.is_method());
        assert_eq!(SymbolKind::ExtensionMethod.to_string(), "extension method");
    }
}
