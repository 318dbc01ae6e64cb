//! Declaration collection
//!
//! One pre-order walk over the tree files every declaration into the
//! [`SymbolTable`]: namespaces and types with their members, and the
//! scoped symbols (parameters, type parameters, locals, labels, range
//! variables) under the node whose subtree they are visible in. Ancestors
//! are always visited before descendants, so a declaration's container is
//! already in the table when its members are reached.

use super::library::install_library;
use super::table::{BaseRef, Symbol, SymbolId, SymbolKind, SymbolTable, TypeRef};
use crate::classification::CancellationToken;
use crate::config::constants::compile_time::binding::CANCELLATION_CHECK_INTERVAL;
use crate::config::ParseMode;
use crate::embedded::EmbeddedLanguage;
use crate::grammar::ast::{NodeId, NodeKind, SyntaxTree, TokenRole};
use crate::grammar::keywords::Keyword;
use crate::log_debug;
use crate::reference_resolution::BindingError;
use crate::tokens::{Punct, Token};

/// Name of the implicit class that holds top-level script members
pub const SCRIPT_CLASS_NAME: &str = "Script";

/// Nodes whose subtree is the scope of the locals declared inside them
pub fn is_local_scope(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Block
            | NodeKind::SwitchSection
            | NodeKind::SwitchExpressionArm
            | NodeKind::For
            | NodeKind::Foreach
            | NodeKind::Using
            | NodeKind::Fixed
            | NodeKind::CatchClause
            | NodeKind::QueryExpression
            | NodeKind::QueryContinuation
            | NodeKind::Field
            | NodeKind::EventField
            | NodeKind::EnumMember
            | NodeKind::CompilationUnit
    ) || is_label_scope(kind)
}

/// Function-like nodes; labels are visible throughout their body
pub fn is_label_scope(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Method
            | NodeKind::Constructor
            | NodeKind::Destructor
            | NodeKind::Operator
            | NodeKind::ConversionOperator
            | NodeKind::Accessor
            | NodeKind::Indexer
            | NodeKind::Property
            | NodeKind::LocalFunction
            | NodeKind::SimpleLambda
            | NodeKind::ParenthesizedLambda
            | NodeKind::AnonymousMethod
            | NodeKind::CompilationUnit
    )
}

/// Nearest strict ancestor that scopes locals declared at `node`
pub fn local_scope(tree: &SyntaxTree, node: NodeId) -> NodeId {
    tree.find_ancestor(node, is_local_scope)
        .unwrap_or_else(|| tree.root())
}

/// `var` standing for an implicit type
pub fn is_implicit_var(tree: &SyntaxTree, type_node: NodeId) -> bool {
    tree.kind(type_node) == NodeKind::IdentifierName
        && tree
            .name_token(type_node)
            .map(|token| tree.token_text(token) == "var")
            .unwrap_or(false)
}

/// Language named by `[StringSyntax(...)]` among the node's attributes
pub fn string_syntax_attribute(tree: &SyntaxTree, node: NodeId) -> Option<EmbeddedLanguage> {
    for list in tree.children_of_kind(node, NodeKind::AttributeList) {
        for attribute in tree.children_of_kind(list, NodeKind::Attribute) {
            let name = match tree.type_child(attribute) {
                Some(name) => last_identifier(tree, name),
                None => continue,
            };
            if name != "StringSyntax" && name != "StringSyntaxAttribute" {
                continue;
            }
            let argument = tree
                .child_of_kind(attribute, NodeKind::AttributeArgumentList)
                .and_then(|list| tree.child_of_kind(list, NodeKind::AttributeArgument));
            if let Some(argument) = argument {
                let text = tree.node_text(argument);
                let value = text
                    .rsplit('.')
                    .next()
                    .unwrap_or(text)
                    .trim()
                    .trim_matches('"');
                return EmbeddedLanguage::from_name(value);
            }
        }
    }
    None
}

/// Rightmost simple identifier of a (possibly qualified) name
pub fn last_identifier<'t>(tree: &'t SyntaxTree, name: NodeId) -> &'t str {
    match tree.kind(name) {
        NodeKind::IdentifierName | NodeKind::GenericName => tree.name_token(name)
            .map(|token| tree.identifier_value(token))
            .unwrap_or(""),
        _ => tree
            .child_nodes(name)
            .filter(|&child| tree.kind(child).is_type())
            .last()
            .map(|child| last_identifier(tree, child))
            .unwrap_or(""),
    }
}

/// Collects declarations of one tree into a fresh table
pub struct SymbolCollector<'a> {
    tree: &'a SyntaxTree,
    table: SymbolTable,
    mode: ParseMode,
    cancellation: CancellationToken,
    top_container: SymbolId,
    declared: usize,
}

impl<'a> SymbolCollector<'a> {
    pub fn new(tree: &'a SyntaxTree, mode: ParseMode, cancellation: CancellationToken) -> Self {
        let mut table = SymbolTable::new();
        install_library(&mut table);

        let global = table.global_namespace();
        let top_container = match mode {
            ParseMode::Script => {
                let script = table.add_member(global, Symbol::new(SCRIPT_CLASS_NAME, SymbolKind::Class));
                table.set_script_class(script);
                script
            }
            ParseMode::Regular => global,
        };

        Self {
            tree,
            table,
            mode,
            cancellation,
            top_container,
            declared: 0,
        }
    }

    pub fn collect(mut self) -> Result<SymbolTable, BindingError> {
        let library_symbols = self.table.len();
        let tree = self.tree;
        for (visited, node) in tree.descendants(tree.root()).enumerate() {
            if visited % CANCELLATION_CHECK_INTERVAL == 0 && self.cancellation.is_cancelled() {
                return Err(BindingError::cancelled("symbol collection", visited));
            }
            self.declare(node);
        }

        log_debug!("Declarations collected",
            "declared" => self.declared,
            "library_symbols" => library_symbols,
            "mode" => self.mode.as_str()
        );
        Ok(self.table)
    }

    fn declare(&mut self, node: NodeId) {
        let kind = self.tree.kind(node);
        match kind {
            NodeKind::UsingDirective => self.declare_using(node),
            NodeKind::Namespace | NodeKind::FileScopedNamespace => self.declare_namespace(node),
            NodeKind::Class
            | NodeKind::Struct
            | NodeKind::Interface
            | NodeKind::Record
            | NodeKind::RecordStruct
            | NodeKind::Enum
            | NodeKind::Delegate => self.declare_type(node, kind),
            NodeKind::EnumMember => self.declare_enum_member(node),
            NodeKind::Method => self.declare_method(node),
            NodeKind::Constructor => self.declare_constructor(node),
            NodeKind::Destructor => {
                if let Some(name) = self.tree.name_token(node) {
                    let container = self.container_of(node);
                    self.table.record_token(name, container);
                }
            }
            NodeKind::Operator | NodeKind::ConversionOperator => self.declare_operator(node, kind),
            NodeKind::Property | NodeKind::Indexer => self.declare_property(node, kind),
            NodeKind::Event => self.declare_event(node),
            NodeKind::Field | NodeKind::EventField => self.declare_fields(node, kind),
            NodeKind::Accessor => self.declare_accessor_value(node),
            NodeKind::ParameterList | NodeKind::BracketedParameterList => self.declare_parameters(node),
            NodeKind::Parameter => {
                let parent = self.tree.parent(node);
                if let Some(lambda) = parent.filter(|&p| self.tree.kind(p) == NodeKind::SimpleLambda) {
                    self.declare_parameter(node, lambda, None);
                }
            }
            NodeKind::TypeParameterList => self.declare_type_parameters(node),
            NodeKind::LocalDeclaration => self.declare_local_declaration(node),
            NodeKind::VariableDeclaration => {
                let parent = self.tree.parent(node);
                if let Some(statement) = parent.filter(|&p| {
                    matches!(self.tree.kind(p), NodeKind::For | NodeKind::Using | NodeKind::Fixed)
                }) {
                    self.declare_variables(node, statement, false);
                }
            }
            NodeKind::LocalFunction => self.declare_local_function(node),
            NodeKind::Foreach => self.declare_foreach(node),
            NodeKind::CatchDeclaration => self.declare_catch(node),
            NodeKind::LabeledStatement => self.declare_label(node),
            NodeKind::SingleVariableDesignation => self.declare_designation(node),
            NodeKind::FromClause | NodeKind::LetClause | NodeKind::JoinClause | NodeKind::JoinIntoClause => {
                self.declare_range_variable(node)
            }
            NodeKind::QueryContinuation => {
                if let Some(name) = self.tree.name_token(node) {
                    let text = self.tree.identifier_value(name).to_string();
                    let symbol = Symbol::new(text, SymbolKind::Local).with_declaration(node);
                    let id = self.table.add_scoped(node, symbol);
                    self.table.record_token(name, id);
                    self.declared += 1;
                }
            }
            _ => {}
        }
    }

    // === CONTAINERS ===

    /// Namespace or type the node's declarations belong to
    fn container_of(&self, node: NodeId) -> SymbolId {
        for ancestor in self.tree.ancestors(node) {
            let kind = self.tree.kind(ancestor);
            if kind.is_type_declaration() || kind.is_namespace() {
                if let Some(id) = self.table.declared_by(ancestor) {
                    return id;
                }
            }
        }
        self.top_container
    }

    /// Script mode turns locals of the top level into `Script` members
    fn is_script_top_level(&self, scope: NodeId) -> bool {
        self.mode == ParseMode::Script && scope == self.tree.root()
    }

    fn name_of(&self, node: NodeId) -> Option<(usize, String)> {
        self.tree
            .name_token(node)
            .filter(|&token| self.tree.token_kind(token) == Token::Identifier)
            .map(|token| (token, self.tree.identifier_value(token).to_string()))
    }

    fn arity_of(&self, node: NodeId) -> usize {
        self.tree
            .child_of_kind(node, NodeKind::TypeParameterList)
            .map(|list| self.tree.children_of_kind(list, NodeKind::TypeParameter).count())
            .unwrap_or(0)
    }

    fn type_ref_of(&self, node: NodeId) -> TypeRef {
        self.tree
            .type_child(node)
            .map(TypeRef::Syntax)
            .unwrap_or(TypeRef::None)
    }

    fn add_member_at(&mut self, node: NodeId, name_token: usize, container: SymbolId, symbol: Symbol) -> SymbolId {
        let id = self.table.add_member(container, symbol.with_declaration(node));
        self.table.record_token(name_token, id);
        self.table.record_declaration(node, id);
        self.declared += 1;
        id
    }

    fn add_scoped_at(&mut self, node: NodeId, name_token: usize, scope: NodeId, symbol: Symbol) -> SymbolId {
        let id = self.table.add_scoped(scope, symbol.with_declaration(node));
        self.table.record_token(name_token, id);
        self.table.record_declaration(node, id);
        self.declared += 1;
        id
    }

    // === NAMESPACES AND IMPORTS ===

    fn declare_using(&mut self, node: NodeId) {
        let scope = self.tree.parent(node).unwrap_or_else(|| self.tree.root());
        let Some(target) = self.tree.type_child(node) else {
            return;
        };
        if let Some(alias) = self.tree.child_of_kind(node, NodeKind::NameEquals) {
            if let Some((_, name)) = self.name_of(alias) {
                self.table.imports_mut(scope).aliases.insert(name, target);
            }
        } else if self.tree.has_modifier(node, Keyword::Static) {
            self.table.imports_mut(scope).static_types.push(target);
        } else {
            self.table.imports_mut(scope).namespaces.push(target);
        }
    }

    fn declare_namespace(&mut self, node: NodeId) {
        let Some(name) = self.tree.type_child(node) else {
            return;
        };
        let mut current = self.container_of(node);
        if self.table.get(current).kind != SymbolKind::Namespace {
            current = self.table.global_namespace();
        }

        let parts: Vec<usize> = self
            .tree
            .descendants(name)
            .filter(|&part| self.tree.kind(part) == NodeKind::IdentifierName)
            .filter_map(|part| self.tree.name_token(part))
            .collect();
        for token in parts {
            let text = self.tree.identifier_value(token).to_string();
            current = self.table.namespace_in(current, &text);
            self.table.record_token(token, current);
        }
        self.table.record_declaration(node, current);
        self.declared += 1;
    }

    // === TYPES ===

    fn declare_type(&mut self, node: NodeId, kind: NodeKind) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let symbol_kind = match kind {
            NodeKind::Class => SymbolKind::Class,
            NodeKind::Struct => SymbolKind::Struct,
            NodeKind::Interface => SymbolKind::Interface,
            NodeKind::Record => SymbolKind::RecordClass,
            NodeKind::RecordStruct => SymbolKind::RecordStruct,
            NodeKind::Enum => SymbolKind::Enum,
            _ => SymbolKind::Delegate,
        };

        let mut symbol = Symbol::new(name, symbol_kind)
            .with_arity(self.arity_of(node))
            .with_static(self.tree.has_modifier(node, Keyword::Static));
        if symbol_kind == SymbolKind::Delegate {
            symbol.type_ref = self.type_ref_of(node);
        }
        if let Some(bases) = self.tree.child_of_kind(node, NodeKind::BaseList) {
            symbol.bases = self
                .tree
                .child_nodes(bases)
                .filter(|&base| self.tree.kind(base).is_type())
                .map(BaseRef::Syntax)
                .collect();
        }

        let container = self.container_of(node);
        self.add_member_at(node, token, container, symbol);
    }

    fn declare_enum_member(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let container = self.container_of(node);
        let symbol = Symbol::new(name, SymbolKind::EnumMember).with_type(TypeRef::Symbol(container));
        self.add_member_at(node, token, container, symbol);
    }

    // === MEMBERS ===

    fn declare_method(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let is_extension = self
            .tree
            .child_of_kind(node, NodeKind::ParameterList)
            .and_then(|list| self.tree.children_of_kind(list, NodeKind::Parameter).next())
            .map(|first| self.tree.has_modifier(first, Keyword::This))
            .unwrap_or(false);
        let kind = if is_extension {
            SymbolKind::ExtensionMethod
        } else {
            SymbolKind::Method
        };

        let symbol = Symbol::new(name, kind)
            .with_arity(self.arity_of(node))
            .with_static(self.tree.has_modifier(node, Keyword::Static))
            .with_type(self.type_ref_of(node));
        let container = self.container_of(node);
        self.add_member_at(node, token, container, symbol);
    }

    fn declare_constructor(&mut self, node: NodeId) {
        let container = self.container_of(node);
        let name = self.table.get(container).name.clone();
        let mut symbol = Symbol::new(name, SymbolKind::Method)
            .with_static(self.tree.has_modifier(node, Keyword::Static))
            .with_declaration(node);
        symbol.container = Some(container);
        let id = self.table.push(symbol);
        self.table.get_mut(container).constructors.push(id);
        self.table.record_declaration(node, id);
        // The constructor name is a use of its type
        if let Some(token) = self.tree.name_token(node) {
            self.table.record_token(token, container);
        }
        self.declared += 1;
    }

    fn declare_operator(&mut self, node: NodeId, kind: NodeKind) {
        let container = self.container_of(node);
        let mut spelling = String::new();
        if kind == NodeKind::Operator {
            // The spelling is the run of tokens directly after `operator`
            let mut previous: Option<usize> = None;
            for token in self.tree.child_tokens(node) {
                let adjacent = previous.is_some()
                    && self.tree.tokens().previous_significant(token) == previous;
                match self.tree.token_kind(token) {
                    Token::Keyword(Keyword::Operator) => previous = Some(token),
                    Token::Keyword(Keyword::Checked) if adjacent => previous = Some(token),
                    Token::Punct(Punct::OpenParen) => break,
                    Token::Punct(_) | Token::Keyword(Keyword::True | Keyword::False) if adjacent => {
                        spelling.push_str(self.tree.token_text(token));
                        previous = Some(token);
                    }
                    _ if previous.is_some() => break,
                    _ => {}
                }
            }
            if !spelling.is_empty() && !self.table.get(container).operators.contains(&spelling) {
                self.table.get_mut(container).operators.push(spelling.clone());
            }
        }

        let mut symbol = Symbol::new(format!("operator {}", spelling.trim()), SymbolKind::Method)
            .with_static(true)
            .with_type(self.type_ref_of(node))
            .with_declaration(node);
        symbol.container = Some(container);
        let id = self.table.push(symbol);
        self.table.record_declaration(node, id);
        self.declared += 1;
    }

    fn declare_property(&mut self, node: NodeId, kind: NodeKind) {
        let container = self.container_of(node);
        let mut symbol = Symbol::new("this", SymbolKind::Property)
            .with_static(self.tree.has_modifier(node, Keyword::Static))
            .with_type(self.type_ref_of(node));
        symbol.string_syntax = string_syntax_attribute(self.tree, node);

        match (kind, self.name_of(node)) {
            (NodeKind::Property, Some((token, name))) => {
                symbol.name = name;
                self.add_member_at(node, token, container, symbol);
            }
            (NodeKind::Indexer, _) => {
                let id = self.table.add_member(container, symbol.with_declaration(node));
                self.table.record_declaration(node, id);
                self.declared += 1;
            }
            _ => {}
        }
    }

    fn declare_event(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let container = self.container_of(node);
        let symbol = Symbol::new(name, SymbolKind::Event)
            .with_static(self.tree.has_modifier(node, Keyword::Static))
            .with_type(self.type_ref_of(node));
        self.add_member_at(node, token, container, symbol);
    }

    fn declare_fields(&mut self, node: NodeId, kind: NodeKind) {
        let Some(declaration) = self.tree.child_of_kind(node, NodeKind::VariableDeclaration) else {
            return;
        };
        let is_const = self.tree.has_modifier(node, Keyword::Const);
        let is_static = is_const || self.tree.has_modifier(node, Keyword::Static);
        let symbol_kind = match kind {
            NodeKind::EventField => SymbolKind::Event,
            _ if is_const => SymbolKind::Constant,
            _ => SymbolKind::Field,
        };
        let type_ref = self.type_ref_of(declaration);
        let string_syntax = string_syntax_attribute(self.tree, node);
        let container = self.container_of(node);

        let declarators: Vec<NodeId> = self
            .tree
            .children_of_kind(declaration, NodeKind::VariableDeclarator)
            .collect();
        for declarator in declarators {
            if let Some((token, name)) = self.name_of(declarator) {
                let mut symbol = Symbol::new(name, symbol_kind)
                    .with_static(is_static)
                    .with_type(type_ref.clone());
                symbol.string_syntax = string_syntax;
                self.add_member_at(declarator, token, container, symbol);
            }
        }
    }

    /// Implicit `value` parameter of setters and event accessors
    fn declare_accessor_value(&mut self, node: NodeId) {
        let accessor = self
            .tree
            .child_tokens(node)
            .find(|&token| self.tree.role(token) == TokenRole::Keyword)
            .map(|token| self.tree.token_text(token));
        if !matches!(accessor, Some("set" | "init" | "add" | "remove")) {
            return;
        }
        let owner = self
            .tree
            .parent(node)
            .and_then(|list| self.tree.parent(list));
        let type_ref = owner.map(|owner| self.type_ref_of(owner)).unwrap_or(TypeRef::None);
        let symbol = Symbol::new("value", SymbolKind::Parameter).with_type(type_ref);
        self.table.add_scoped(node, symbol);
    }

    // === PARAMETERS ===

    fn declare_parameters(&mut self, list: NodeId) {
        let Some(owner) = self.tree.parent(list) else {
            return;
        };
        let owner_symbol = self.table.declared_by(owner);
        let parameters: Vec<NodeId> = self.tree.children_of_kind(list, NodeKind::Parameter).collect();
        for parameter in parameters {
            self.declare_parameter(parameter, owner, owner_symbol);
        }
    }

    fn declare_parameter(&mut self, parameter: NodeId, owner: NodeId, owner_symbol: Option<SymbolId>) {
        let Some((token, name)) = self.name_of(parameter) else {
            return;
        };
        let type_ref = self.type_ref_of(parameter);
        let string_syntax = string_syntax_attribute(self.tree, parameter);

        let mut symbol = Symbol::new(name.clone(), SymbolKind::Parameter).with_type(type_ref.clone());
        symbol.string_syntax = string_syntax;
        let id = self.add_scoped_at(parameter, token, owner, symbol);
        if let Some(owner_symbol) = owner_symbol {
            self.table.get_mut(owner_symbol).parameters.push(id);
        }

        // Positional record parameters also declare a property
        if matches!(self.tree.kind(owner), NodeKind::Record | NodeKind::RecordStruct) {
            if let Some(record) = owner_symbol {
                let mut property = Symbol::new(name, SymbolKind::Property).with_type(type_ref);
                property.string_syntax = string_syntax;
                self.table.add_member(record, property.with_declaration(parameter));
            }
        }
    }

    fn declare_type_parameters(&mut self, list: NodeId) {
        let Some(owner) = self.tree.parent(list) else {
            return;
        };
        let parameters: Vec<NodeId> = self.tree.children_of_kind(list, NodeKind::TypeParameter).collect();
        for parameter in parameters {
            if let Some((token, name)) = self.name_of(parameter) {
                self.add_scoped_at(parameter, token, owner, Symbol::new(name, SymbolKind::TypeParameter));
            }
        }
    }

    // === LOCALS ===

    fn declare_local_declaration(&mut self, node: NodeId) {
        if let Some(declaration) = self.tree.child_of_kind(node, NodeKind::VariableDeclaration) {
            let scope = local_scope(self.tree, node);
            let is_const = self.tree.has_modifier(node, Keyword::Const);
            self.declare_variables(declaration, scope, is_const);
        }
    }

    fn declare_variables(&mut self, declaration: NodeId, scope: NodeId, is_const: bool) {
        let type_node = self.tree.type_child(declaration);
        let declarators: Vec<NodeId> = self
            .tree
            .children_of_kind(declaration, NodeKind::VariableDeclarator)
            .collect();
        for declarator in declarators {
            let Some((token, name)) = self.name_of(declarator) else {
                continue;
            };
            let initializer = self
                .tree
                .child_of_kind(declarator, NodeKind::EqualsValueClause)
                .and_then(|clause| self.tree.child_nodes(clause).next());
            let type_ref = match type_node {
                Some(type_node) if is_implicit_var(self.tree, type_node) => {
                    initializer.map(TypeRef::Inferred).unwrap_or(TypeRef::None)
                }
                Some(type_node) => TypeRef::Syntax(type_node),
                None => TypeRef::None,
            };
            let kind = if is_const {
                SymbolKind::Constant
            } else {
                SymbolKind::Local
            };
            self.declare_local(declarator, token, scope, Symbol::new(name, kind).with_type(type_ref), is_const);
        }
    }

    fn declare_local(&mut self, node: NodeId, token: usize, scope: NodeId, mut symbol: Symbol, is_const: bool) {
        if self.is_script_top_level(scope) {
            if symbol.kind == SymbolKind::Local {
                symbol.kind = SymbolKind::Field;
            }
            symbol.is_static = is_const;
            self.add_member_at(node, token, self.top_container, symbol);
        } else {
            self.add_scoped_at(node, token, scope, symbol);
        }
    }

    fn declare_local_function(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let scope = local_scope(self.tree, node);
        let symbol = Symbol::new(name, SymbolKind::LocalFunction)
            .with_arity(self.arity_of(node))
            .with_type(self.type_ref_of(node));
        if self.is_script_top_level(scope) {
            let is_static = self.tree.has_modifier(node, Keyword::Static);
            let mut method = symbol.with_static(is_static);
            method.kind = SymbolKind::Method;
            self.add_member_at(node, token, self.top_container, method);
        } else {
            self.add_scoped_at(node, token, scope, symbol);
        }
    }

    fn declare_foreach(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let type_ref = match self.tree.type_child(node) {
            Some(type_node) if is_implicit_var(self.tree, type_node) => TypeRef::None,
            Some(type_node) => TypeRef::Syntax(type_node),
            None => TypeRef::None,
        };
        self.add_scoped_at(node, token, node, Symbol::new(name, SymbolKind::Local).with_type(type_ref));
    }

    fn declare_catch(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let scope = self.tree.parent(node).unwrap_or(node);
        let symbol = Symbol::new(name, SymbolKind::Local).with_type(self.type_ref_of(node));
        self.add_scoped_at(node, token, scope, symbol);
    }

    fn declare_label(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let scope = self
            .tree
            .find_ancestor(node, is_label_scope)
            .unwrap_or_else(|| self.tree.root());
        self.add_scoped_at(node, token, scope, Symbol::new(name, SymbolKind::Label));
    }

    /// `out T x`, `is T x`, `var (a, b)` and positional pattern designations
    fn declare_designation(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let type_ref = match self.tree.parent(node) {
            Some(parent)
                if matches!(
                    self.tree.kind(parent),
                    NodeKind::DeclarationExpression | NodeKind::DeclarationPattern | NodeKind::RecursivePattern
                ) =>
            {
                match self.tree.type_child(parent) {
                    Some(type_node) if !is_implicit_var(self.tree, type_node) => TypeRef::Syntax(type_node),
                    _ => TypeRef::None,
                }
            }
            _ => TypeRef::None,
        };
        let scope = local_scope(self.tree, node);
        self.declare_local(node, token, scope, Symbol::new(name, SymbolKind::Local).with_type(type_ref), false);
    }

    fn declare_range_variable(&mut self, node: NodeId) {
        let Some((token, name)) = self.name_of(node) else {
            return;
        };
        let scope = self
            .tree
            .find_ancestor(node, |kind| {
                matches!(kind, NodeKind::QueryExpression | NodeKind::QueryContinuation)
            })
            .unwrap_or(node);
        let type_ref = match self.tree.kind(node) {
            NodeKind::LetClause => self
                .tree
                .child_nodes(node)
                .last()
                .map(TypeRef::Inferred)
                .unwrap_or(TypeRef::None),
            NodeKind::JoinIntoClause => TypeRef::None,
            // `from T x in xs`: an explicit type precedes the name
            _ => self
                .tree
                .type_child(node)
                .filter(|&type_node| self.tree.last_token(type_node) < Some(token))
                .map(TypeRef::Syntax)
                .unwrap_or(TypeRef::None),
        };
        self.add_scoped_at(node, token, scope, Symbol::new(name, SymbolKind::Local).with_type(type_ref));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierOptions;
    use crate::lexical::tokenize;
    use crate::syntax::parse;

    fn collect(text: &str, options: &ClassifierOptions) -> (SyntaxTree, SymbolTable) {
        let tokenized = tokenize(text, options).expect("lexing should succeed");
        let tree = parse(tokenized.stream, options);
        let table = SymbolCollector::new(&tree, options.parse_mode, CancellationToken::new())
            .collect()
            .expect("collection should not be cancelled");
        (tree, table)
    }

    fn declared_kind(tree: &SyntaxTree, table: &SymbolTable, name: &str) -> Option<SymbolKind> {
        table
            .declared_tokens()
            .find(|&(token, _)| tree.token_text(token) == name)
            .map(|(_, id)| table.get(id).kind)
    }

    #[test]
    fn test_types_and_members() {
        let (tree, table) = collect(
            "namespace N.M { static class C<T> { const int K = 1; static int f; int P { get; set; } void M(int p) { } } enum E { A } }",
            &ClassifierOptions::regular(),
        );
        let c = table.find_type("N.M.C").expect("class is declared");
        assert!(table.get(c).is_static);
        assert_eq!(table.get(c).arity, 1);
        assert_eq!(declared_kind(&tree, &table, "K"), Some(SymbolKind::Constant));
        assert_eq!(declared_kind(&tree, &table, "f"), Some(SymbolKind::Field));
        assert_eq!(declared_kind(&tree, &table, "P"), Some(SymbolKind::Property));
        assert_eq!(declared_kind(&tree, &table, "p"), Some(SymbolKind::Parameter));
        assert_eq!(declared_kind(&tree, &table, "T"), Some(SymbolKind::TypeParameter));
        assert_eq!(declared_kind(&tree, &table, "A"), Some(SymbolKind::EnumMember));
        assert_eq!(declared_kind(&tree, &table, "N"), Some(SymbolKind::Namespace));
        let k = table.members_named(c, "K")[0];
        assert!(table.get(k).is_static);
    }

    #[test]
    fn test_locals_are_scoped_to_blocks() {
        let (tree, table) = collect(
            "class C { void M() { int x = 1; for (int i = 0; ; ) { } L: ; } }",
            &ClassifierOptions::regular(),
        );
        assert_eq!(declared_kind(&tree, &table, "x"), Some(SymbolKind::Local));
        assert_eq!(declared_kind(&tree, &table, "L"), Some(SymbolKind::Label));
        let for_node = tree
            .descendants(tree.root())
            .find(|&node| tree.kind(node) == NodeKind::For)
            .unwrap();
        assert_eq!(table.scoped_at(for_node).len(), 1);
    }

    #[test]
    fn test_script_top_level_becomes_script_members() {
        let (tree, table) = collect("int x = 1; void F() { } class D { }", &ClassifierOptions::script());
        let script = table.script_class().expect("script class exists");
        assert_eq!(table.get(script).name, SCRIPT_CLASS_NAME);
        assert_eq!(declared_kind(&tree, &table, "x"), Some(SymbolKind::Field));
        assert_eq!(declared_kind(&tree, &table, "F"), Some(SymbolKind::Method));
        assert_eq!(table.members_named(script, "D").len(), 1);
    }

    #[test]
    fn test_regular_top_level_statements_stay_local() {
        let (tree, table) = collect("int x = 1; void F() { } F();", &ClassifierOptions::regular());
        assert!(table.script_class().is_none());
        assert_eq!(declared_kind(&tree, &table, "x"), Some(SymbolKind::Local));
    }

    #[test]
    fn test_extension_methods_and_constructors() {
        let (tree, table) = collect(
            "static class X { public static int Twice(this int v) => v * 2; } class C { C(int a) { } }",
            &ClassifierOptions::regular(),
        );
        assert_eq!(declared_kind(&tree, &table, "Twice"), Some(SymbolKind::ExtensionMethod));
        let c = table.find_type("C").unwrap();
        assert_eq!(table.get(c).constructors.len(), 1);
        let ctor = table.get(c).constructors[0];
        assert_eq!(table.get(ctor).parameters.len(), 1);
    }

    #[test]
    fn test_string_syntax_attribute_is_recorded() {
        let (tree, table) = collect(
            "class C { void M([StringSyntax(StringSyntaxAttribute.Regex)] string p) { } [StringSyntax(\"Json\")] string f; }",
            &ClassifierOptions::regular(),
        );
        let find = |name: &str| {
            table
                .declared_tokens()
                .find(|&(token, _)| tree.token_text(token) == name)
                .map(|(_, id)| table.get(id).string_syntax)
                .flatten()
        };
        assert_eq!(find("p"), Some(EmbeddedLanguage::Regex));
        assert_eq!(find("f"), Some(EmbeddedLanguage::Json));
    }

    #[test]
    fn test_record_parameters_declare_properties() {
        let (_, table) = collect("record R(int X);", &ClassifierOptions::regular());
        let record = table.find_type("R").unwrap();
        assert_eq!(table.get(record).kind, SymbolKind::RecordClass);
        let property = table.members_named(record, "X")[0];
        assert_eq!(table.get(property).kind, SymbolKind::Property);
    }

    #[test]
    fn test_operators_are_listed_on_type() {
        let (_, table) = collect(
            "class V { public static V operator +(V a, V b) => a; public static bool operator >>(V a, int b) => true; }",
            &ClassifierOptions::regular(),
        );
        let v = table.find_type("V").unwrap();
        assert_eq!(table.get(v).operators, vec!["+".to_string(), ">>".to_string()]);
    }

    #[test]
    fn test_operator_spelling_ends_before_parameters() {
        let (_, table) = collect(
            "class V { public static V operator -(V a) => a; public static bool operator ==(V a, V b) { return true; } public static bool operator true(V a) => true; }",
            &ClassifierOptions::regular(),
        );
        let v = table.find_type("V").unwrap();
        assert_eq!(
            table.get(v).operators,
            vec!["-".to_string(), "==".to_string(), "true".to_string()]
        );
    }

    #[test]
    fn test_cancelled_collection_fails() {
        let options = ClassifierOptions::regular();
        let tokenized = tokenize("class C { }", &options).unwrap();
        let tree = parse(tokenized.stream, &options);
        let token = CancellationToken::new();
        token.cancel();
        let result = SymbolCollector::new(&tree, ParseMode::Regular, token).collect();
        assert!(matches!(result, Err(BindingError::Cancelled { .. })));
    }
}
