//! Name binding over a collected symbol table
//!
//! Every simple name is bound where it stands. What it may bind to depends
//! on its position: the right side of a member access or qualified name is
//! looked up in whatever the left side denotes, named arguments in the
//! callee's parameters, initializer targets in the created type, and
//! everything else through the scope chain:
//!
//! 1. symbols scoped at the node or one of its ancestors (locals,
//!    parameters, type parameters, labels, range variables)
//! 2. members of each enclosing type, bases included
//! 3. per namespace level: aliases, then members of the namespace, then
//!    types of imported namespaces, then members of `using static` types
//! 4. at the compilation unit: the script class (script mode), then the
//!    global namespace
//!
//! The nearest level with a same-named symbol wins. Within a level an exact
//! arity match is preferred; failing that anywhere, the nearest same-named
//! symbol is taken.

use super::error::{BindingError, BindingResult};
use super::types::{Bindings, Resolution};
use crate::classification::CancellationToken;
use crate::config::constants::compile_time::binding::{
    CANCELLATION_CHECK_INTERVAL, MAX_ALIAS_DEPTH, MAX_BASE_TYPE_DEPTH, MAX_EXPRESSION_TYPING_DEPTH,
};
use crate::config::ClassifierOptions;
use crate::embedded::{EmbeddedHint, EmbeddedLanguage, RegexOptions};
use crate::grammar::ast::{NodeId, NodeKind, SyntaxTree, TokenRole};
use crate::grammar::keywords::Keyword;
use crate::logging::codes;
use crate::symbols::{last_identifier, BaseRef, SymbolId, SymbolKind, SymbolTable, TypeRef};
use crate::tokens::Token;
use crate::{log_debug, log_warning};
use std::collections::{HashMap, HashSet};
use std::iter;

/// What an expression or name stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Denotation {
    Unknown,
    Namespace(SymbolId),
    Type(SymbolId),
    /// A value, with its symbol when it is a named one
    Value {
        symbol: Option<SymbolId>,
        type_id: Option<SymbolId>,
    },
    /// Value of an anonymous type created at the node
    Anonymous(NodeId),
    Method(SymbolId),
}

impl Denotation {
    fn value_of(type_denotation: Denotation) -> Self {
        match type_denotation {
            Denotation::Type(id) => Denotation::Value {
                symbol: None,
                type_id: Some(id),
            },
            Denotation::Anonymous(node) => Denotation::Anonymous(node),
            _ => Denotation::Value {
                symbol: None,
                type_id: None,
            },
        }
    }
}

/// Which symbol kinds a lookup accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Filter {
    Any,
    TypeOrNamespace,
    Label,
    Parameter,
    TypeParameter,
}

impl Filter {
    fn accepts(self, kind: SymbolKind) -> bool {
        match self {
            Filter::Any => kind != SymbolKind::Label,
            Filter::TypeOrNamespace => kind.is_namespace_or_type(),
            Filter::Label => kind == SymbolKind::Label,
            Filter::Parameter => kind == SymbolKind::Parameter,
            Filter::TypeParameter => kind == SymbolKind::TypeParameter,
        }
    }
}

pub struct Binder<'a> {
    pub(super) tree: &'a SyntaxTree,
    pub(super) table: &'a SymbolTable,
    cancellation: CancellationToken,
    pub(super) bindings: Bindings,
    memo: HashMap<NodeId, Denotation>,
    base_cache: HashMap<SymbolId, Vec<SymbolId>>,
    resolving_bases: HashSet<SymbolId>,
    depth: usize,
    alias_depth: usize,
}

impl<'a> Binder<'a> {
    pub fn new(tree: &'a SyntaxTree, table: &'a SymbolTable, options: &ClassifierOptions) -> Self {
        Self {
            tree,
            table,
            cancellation: options.cancellation.clone(),
            bindings: Bindings::new(),
            memo: HashMap::new(),
            base_cache: HashMap::new(),
            resolving_bases: HashSet::new(),
            depth: 0,
            alias_depth: 0,
        }
    }

    pub fn bind(mut self) -> BindingResult<Bindings> {
        let tree = self.tree;
        for (visited, node) in tree.descendants(tree.root()).enumerate() {
            if visited % CANCELLATION_CHECK_INTERVAL == 0 {
                self.check_cancelled("binding", visited)?;
            }
            self.visit(node);
        }
        self.bind_doc_comments()?;
        Ok(self.bindings)
    }

    pub(super) fn check_cancelled(&self, stage: &'static str, visited: usize) -> BindingResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(BindingError::cancelled(stage, visited));
        }
        Ok(())
    }

    fn visit(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::IdentifierName | NodeKind::GenericName => {
                self.denote(node);
                if let Some(token) = self.tree.name_token(node) {
                    self.bindings.stats.names_visited += 1;
                    let bound = self.bindings.token_symbols.contains_key(&token)
                        || self.bindings.keyword_tokens.contains(&token)
                        || self.table.declared_at_token(token).is_some()
                        || self.tree.role(token) == TokenRole::Keyword;
                    if bound {
                        self.bindings.stats.resolved += 1;
                    } else {
                        self.bindings.stats.unresolved += 1;
                    }
                }
            }
            NodeKind::NameEquals => self.bind_alias_declaration(node),
            NodeKind::Binary | NodeKind::PrefixUnary | NodeKind::PostfixUnary | NodeKind::Assignment => {
                self.bind_operator(node)
            }
            NodeKind::Literal => self.bind_string_syntax(node),
            _ => {}
        }
    }

    // === RECORDING ===

    pub(super) fn record(&mut self, token: usize, id: SymbolId) -> Denotation {
        self.bindings
            .token_symbols
            .insert(token, Resolution::of_symbol(self.table, id));
        self.denotation_of(id)
    }

    pub(super) fn record_resolution(&mut self, token: usize, resolution: Resolution) {
        self.bindings.token_symbols.insert(token, resolution);
    }

    pub(super) fn denotation_of(&mut self, id: SymbolId) -> Denotation {
        let kind = self.table.get(id).kind;
        match kind {
            SymbolKind::Namespace => Denotation::Namespace(id),
            _ if kind.is_type() => Denotation::Type(id),
            _ if kind.is_method() => Denotation::Method(id),
            _ if kind.is_value() => match self.symbol_type(id) {
                Denotation::Anonymous(node) => Denotation::Anonymous(node),
                Denotation::Type(type_id) => Denotation::Value {
                    symbol: Some(id),
                    type_id: Some(type_id),
                },
                _ => Denotation::Value {
                    symbol: Some(id),
                    type_id: None,
                },
            },
            _ => Denotation::Unknown,
        }
    }

    // === DENOTATION ===

    /// What the node stands for; memoized, and records name bindings on the way
    pub(super) fn denote(&mut self, node: NodeId) -> Denotation {
        if let Some(&denotation) = self.memo.get(&node) {
            return denotation;
        }
        if self.depth >= MAX_EXPRESSION_TYPING_DEPTH {
            return Denotation::Unknown;
        }
        // Re-entry through a cyclic initializer sees Unknown
        self.memo.insert(node, Denotation::Unknown);
        self.depth += 1;
        let denotation = self.compute(node);
        self.depth -= 1;
        self.memo.insert(node, denotation);
        denotation
    }

    fn compute(&mut self, node: NodeId) -> Denotation {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::IdentifierName | NodeKind::GenericName => self.denote_name(node),
            NodeKind::QualifiedName | NodeKind::AliasQualifiedName | NodeKind::MemberAccess => {
                match self.right_operand(node) {
                    Some(right) => self.denote(right),
                    None => Denotation::Unknown,
                }
            }
            NodeKind::ParenthesizedExpression
            | NodeKind::NullableType
            | NodeKind::RefType
            | NodeKind::CheckedExpression => match tree.child_nodes(node).next() {
                Some(inner) => self.denote(inner),
                None => Denotation::Unknown,
            },
            NodeKind::PredefinedType => tree
                .first_token(node)
                .and_then(|token| tree.token_kind(token).keyword())
                .and_then(|keyword| keyword.predefined_type_name())
                .and_then(|path| self.table.find_type(path))
                .map(Denotation::Type)
                .unwrap_or(Denotation::Unknown),
            NodeKind::Invocation => match tree.child_nodes(node).next().map(|target| self.denote(target)) {
                Some(Denotation::Method(method)) => {
                    let returned = self.symbol_type(method);
                    Denotation::value_of(returned)
                }
                _ => Denotation::value_of(Denotation::Unknown),
            },
            NodeKind::ObjectCreation | NodeKind::Cast => match tree.type_child(node) {
                Some(created) => {
                    let created = self.denote(created);
                    Denotation::value_of(created)
                }
                None => Denotation::Unknown,
            },
            NodeKind::AsExpression => match tree.child_nodes(node).last() {
                Some(target) => {
                    let target = self.denote(target);
                    Denotation::value_of(target)
                }
                None => Denotation::Unknown,
            },
            NodeKind::ImplicitObjectCreation => {
                let target = self.target_type(node);
                Denotation::value_of(target)
            }
            NodeKind::AnonymousObjectCreation => Denotation::Anonymous(node),
            NodeKind::ThisExpression => match self.enclosing_type(node) {
                Some(id) => Denotation::value_of(Denotation::Type(id)),
                None => Denotation::Unknown,
            },
            NodeKind::BaseExpression => {
                let base = self
                    .enclosing_type(node)
                    .and_then(|id| self.base_types(id).into_iter().next());
                match base {
                    Some(id) => Denotation::value_of(Denotation::Type(id)),
                    None => Denotation::Unknown,
                }
            }
            NodeKind::Literal | NodeKind::InterpolatedString => self.literal_type(node),
            NodeKind::Assignment => match tree.child_nodes(node).next() {
                Some(target) => self.denote(target),
                None => Denotation::Unknown,
            },
            _ => Denotation::Unknown,
        }
    }

    fn literal_type(&self, node: NodeId) -> Denotation {
        let tree = self.tree;
        let path = if tree.kind(node) == NodeKind::InterpolatedString {
            Some("System.String")
        } else {
            match tree.first_token(node).map(|token| (token, tree.token_kind(token))) {
                Some((_, Token::String(_))) => Some("System.String"),
                Some((token, Token::Number)) if is_integer_literal(tree.token_text(token)) => Some("System.Int32"),
                _ => None,
            }
        };
        match path.and_then(|path| self.table.find_type(path)) {
            Some(id) => Denotation::value_of(Denotation::Type(id)),
            None => Denotation::value_of(Denotation::Unknown),
        }
    }

    /// Declared type of a value symbol, or return type of a method
    fn symbol_type(&mut self, id: SymbolId) -> Denotation {
        match self.table.get(id).type_ref.clone() {
            TypeRef::None => Denotation::Unknown,
            TypeRef::Symbol(type_id) => Denotation::Type(type_id),
            TypeRef::Syntax(node) => match self.denote(node) {
                denotation @ Denotation::Type(_) => denotation,
                _ => Denotation::Unknown,
            },
            TypeRef::Inferred(expression) => self.expression_type(expression),
        }
    }

    fn expression_type(&mut self, expression: NodeId) -> Denotation {
        match self.denote(expression) {
            Denotation::Value {
                type_id: Some(type_id),
                ..
            } => Denotation::Type(type_id),
            Denotation::Anonymous(node) => Denotation::Anonymous(node),
            _ => Denotation::Unknown,
        }
    }

    /// Type of a target-typed `new(...)`
    fn target_type(&mut self, node: NodeId) -> Denotation {
        let tree = self.tree;
        let Some(parent) = tree.parent(node) else {
            return Denotation::Unknown;
        };
        match tree.kind(parent) {
            NodeKind::EqualsValueClause => {
                let declared = tree.parent(parent).and_then(|owner| self.table.declared_by(owner));
                match declared {
                    Some(id) => self.symbol_type(id),
                    None => Denotation::Unknown,
                }
            }
            NodeKind::Assignment if tree.child_nodes(parent).next() != Some(node) => {
                match tree.child_nodes(parent).next() {
                    Some(target) => self.expression_type(target),
                    None => Denotation::Unknown,
                }
            }
            _ => Denotation::Unknown,
        }
    }

    pub(super) fn enclosing_type(&self, node: NodeId) -> Option<SymbolId> {
        self.tree
            .find_ancestor(node, |kind| kind.is_type_declaration())
            .and_then(|declaration| self.table.declared_by(declaration))
            .or_else(|| self.table.script_class())
    }

    fn right_operand(&self, node: NodeId) -> Option<NodeId> {
        let mut children = self.tree.child_nodes(node);
        let first = children.next()?;
        children.last().filter(|&last| last != first)
    }

    fn is_right_operand(&self, parent: NodeId, node: NodeId) -> bool {
        self.tree.child_nodes(parent).next() != Some(node)
    }

    pub(super) fn arity_of(&self, node: NodeId) -> usize {
        if self.tree.kind(node) != NodeKind::GenericName {
            return 0;
        }
        self.tree
            .child_of_kind(node, NodeKind::TypeArgumentList)
            .map(|list| self.tree.child_nodes(list).count())
            .unwrap_or(0)
    }

    // === SIMPLE NAMES ===

    fn denote_name(&mut self, node: NodeId) -> Denotation {
        let tree = self.tree;
        let Some(token) = tree.name_token(node) else {
            return Denotation::Unknown;
        };
        if tree.token_kind(token) != Token::Identifier {
            return Denotation::Unknown;
        }
        if let Some(id) = self.table.declared_at_token(token) {
            return self.denotation_of(id);
        }

        let name = tree.identifier_value(token).to_string();
        let arity = self.arity_of(node);
        if tree.role(token) == TokenRole::Keyword {
            return self.denote_keyword_name(node, token, &name);
        }
        let escaped = tree.token_text(token).starts_with('@');
        if !escaped && self.is_implicit_type_keyword(node, &name) {
            return self.denote_contextual_type(node, token, &name);
        }

        let Some(parent) = tree.parent(node) else {
            return Denotation::Unknown;
        };
        let is_right = self.is_right_operand(parent, node);
        match tree.kind(parent) {
            NodeKind::MemberAccess if is_right => self.bind_member_access(parent, token, &name, arity),
            NodeKind::QualifiedName | NodeKind::AliasQualifiedName if is_right => {
                self.bind_qualified(parent, token, &name, arity)
            }
            NodeKind::AliasQualifiedName => self.bind_alias_qualifier(node, token, &name),
            NodeKind::NameColon => self.bind_name_colon(parent, token, &name),
            NodeKind::NameEquals => self.bind_name_equals(parent, token, &name),
            NodeKind::Goto => self.bind_simple(node, token, &name, 0, Filter::Label),
            NodeKind::Attribute => self.bind_attribute_name(node, token, &name, arity),
            NodeKind::Assignment if !is_right && self.initializer_of(parent).is_some() => {
                self.bind_initializer_member(parent, token, &name)
            }
            _ => {
                let filter = if self.is_type_position(node) {
                    Filter::TypeOrNamespace
                } else {
                    Filter::Any
                };
                self.bind_simple(node, token, &name, arity, filter)
            }
        }
    }

    fn bind_simple(&mut self, node: NodeId, token: usize, name: &str, arity: usize, filter: Filter) -> Denotation {
        match self.lookup(name, arity, node, filter) {
            Some(id) => self.record(token, id),
            None => Denotation::Unknown,
        }
    }

    /// Identifiers the parser already marked as keywords
    fn denote_keyword_name(&mut self, node: NodeId, token: usize, name: &str) -> Denotation {
        match name {
            "var" => self.denote_contextual_type(node, token, name),
            "global" => Denotation::Namespace(self.table.global_namespace()),
            "nameof" => match self.lookup(name, 0, node, Filter::Any) {
                Some(id) if self.table.get(id).kind.is_method() => self.record(token, id),
                _ => Denotation::Unknown,
            },
            _ => Denotation::Unknown,
        }
    }

    /// `var` of a `foreach` header and `dynamic` in a type position
    fn is_implicit_type_keyword(&self, node: NodeId, name: &str) -> bool {
        let tree = self.tree;
        match name {
            "var" => tree
                .parent(node)
                .filter(|&parent| tree.kind(parent) == NodeKind::Foreach)
                .map(|parent| self.is_type_position(node) && tree.name_token(parent).is_some())
                .unwrap_or(false),
            "dynamic" => self.is_type_position(node),
            _ => false,
        }
    }

    /// `var`/`dynamic` is a keyword unless a type of that name is visible
    fn denote_contextual_type(&mut self, node: NodeId, token: usize, name: &str) -> Denotation {
        match self.lookup(name, 0, node, Filter::TypeOrNamespace) {
            Some(id) if self.table.get(id).kind.is_type() => self.record(token, id),
            _ => {
                self.bindings.keyword_tokens.insert(token);
                Denotation::Unknown
            }
        }
    }

    /// Whether the name stands where only a type or namespace can
    pub(super) fn is_type_position(&self, node: NodeId) -> bool {
        let tree = self.tree;
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        let parent_kind = tree.kind(parent);
        match parent_kind {
            NodeKind::ArrayType
            | NodeKind::NullableType
            | NodeKind::PointerType
            | NodeKind::RefType
            | NodeKind::TypeArgumentList
            | NodeKind::BaseList
            | NodeKind::Constraint
            | NodeKind::QualifiedName
            | NodeKind::UsingDirective
            | NodeKind::ExplicitInterfaceSpecifier
            | NodeKind::FunctionPointerType
            | NodeKind::TypeOf
            | NodeKind::SizeOf
            | NodeKind::DefaultExpression
            | NodeKind::TypePattern
            | NodeKind::Namespace
            | NodeKind::FileScopedNamespace => true,
            NodeKind::AsExpression => tree.child_nodes(parent).last() == Some(node),
            NodeKind::VariableDeclaration
            | NodeKind::ObjectCreation
            | NodeKind::ArrayCreation
            | NodeKind::StackAllocCreation
            | NodeKind::Cast
            | NodeKind::DeclarationExpression
            | NodeKind::DeclarationPattern
            | NodeKind::RecursivePattern
            | NodeKind::Delegate
            | NodeKind::Operator
            | NodeKind::ConversionOperator
            | NodeKind::Indexer => tree.type_child(parent) == Some(node),
            NodeKind::Parameter
            | NodeKind::Method
            | NodeKind::Property
            | NodeKind::Event
            | NodeKind::LocalFunction
            | NodeKind::CatchDeclaration
            | NodeKind::TupleElement
            | NodeKind::Foreach
            | NodeKind::FromClause
            | NodeKind::JoinClause => {
                if tree.type_child(parent) != Some(node) {
                    return false;
                }
                match tree.name_token(parent) {
                    Some(name) => tree.last_token(node) < Some(name),
                    None => matches!(
                        parent_kind,
                        NodeKind::Parameter | NodeKind::CatchDeclaration | NodeKind::TupleElement
                    ),
                }
            }
            _ => false,
        }
    }

    // === QUALIFIED NAMES ===

    fn bind_member_access(&mut self, access: NodeId, token: usize, name: &str, arity: usize) -> Denotation {
        let Some(receiver) = self.tree.child_nodes(access).next() else {
            return Denotation::Unknown;
        };
        let left = self.denote(receiver);
        let left = self.apply_color_color(receiver, left);
        self.bind_in(left, access, token, name, arity, Filter::Any)
    }

    fn bind_qualified(&mut self, qualified: NodeId, token: usize, name: &str, arity: usize) -> Denotation {
        let Some(left_node) = self.tree.child_nodes(qualified).next() else {
            return Denotation::Unknown;
        };
        let left = self.denote(left_node);
        let in_attribute = self
            .tree
            .parent(qualified)
            .map(|parent| self.tree.kind(parent) == NodeKind::Attribute)
            .unwrap_or(false);
        if in_attribute {
            let suffixed = format!("{}Attribute", name);
            let found = self.bind_in(left, qualified, token, &suffixed, arity, Filter::TypeOrNamespace);
            if found != Denotation::Unknown {
                return found;
            }
        }
        self.bind_in(left, qualified, token, name, arity, Filter::TypeOrNamespace)
    }

    /// Bind `name` inside whatever the left side denotes
    fn bind_in(
        &mut self,
        left: Denotation,
        at: NodeId,
        token: usize,
        name: &str,
        arity: usize,
        filter: Filter,
    ) -> Denotation {
        match left {
            Denotation::Namespace(namespace) => {
                let candidates: Vec<SymbolId> = self
                    .table
                    .members_named(namespace, name)
                    .iter()
                    .copied()
                    .filter(|&id| filter.accepts(self.table.get(id).kind))
                    .collect();
                match self.pick(&candidates, arity, name) {
                    Some(id) => self.record(token, id),
                    None => Denotation::Unknown,
                }
            }
            Denotation::Type(type_id) => match self.find_member(type_id, name, arity, filter) {
                Some(id) => self.record(token, id),
                None => Denotation::Unknown,
            },
            Denotation::Value {
                type_id: Some(type_id),
                ..
            } => {
                if let Some(id) = self.find_member(type_id, name, arity, filter) {
                    return self.record(token, id);
                }
                match self.find_extension(name, at) {
                    Some(id) => {
                        let resolution = Resolution::of_symbol(self.table, id).without_static();
                        self.record_resolution(token, resolution);
                        Denotation::Method(id)
                    }
                    None => Denotation::Unknown,
                }
            }
            Denotation::Anonymous(creation) => self.bind_anonymous_member(creation, token, name),
            _ => Denotation::Unknown,
        }
    }

    /// In `E.M`, a value `E` whose type is named `E` stands for the type
    fn apply_color_color(&mut self, receiver: NodeId, left: Denotation) -> Denotation {
        if self.tree.kind(receiver) != NodeKind::IdentifierName {
            return left;
        }
        let Denotation::Value {
            symbol: Some(_),
            type_id: Some(type_id),
        } = left
        else {
            return left;
        };
        let Some(token) = self.tree.name_token(receiver) else {
            return left;
        };
        let name = self.tree.identifier_value(token).to_string();
        if self.table.get(type_id).name != name {
            return left;
        }
        if self.lookup(&name, 0, receiver, Filter::TypeOrNamespace) != Some(type_id) {
            return left;
        }
        self.bindings.stats.color_color += 1;
        log_debug!("Color Color receiver bound as type", "name" => name.as_str());
        self.record(token, type_id)
    }

    fn bind_alias_qualifier(&mut self, node: NodeId, token: usize, name: &str) -> Denotation {
        let scopes: Vec<NodeId> = iter::once(node).chain(self.tree.ancestors(node)).collect();
        for scope in scopes {
            let target = self
                .table
                .imports_at(scope)
                .and_then(|imports| imports.aliases.get(name).copied());
            if let Some(target) = target {
                return match self.denote_alias_target(target) {
                    Some(id) => self.record(token, id),
                    None => Denotation::Unknown,
                };
            }
        }
        Denotation::Unknown
    }

    /// `using X = N;` declares `X`; it takes the kind of its target
    fn bind_alias_declaration(&mut self, name_equals: NodeId) {
        let tree = self.tree;
        let Some(directive) = tree
            .parent(name_equals)
            .filter(|&parent| tree.kind(parent) == NodeKind::UsingDirective)
        else {
            return;
        };
        let (Some(token), Some(target)) = (tree.name_token(name_equals), tree.type_child(directive)) else {
            return;
        };
        if let Some(id) = self.denote_alias_target(target) {
            self.record(token, id);
        }
    }

    fn denote_alias_target(&mut self, target: NodeId) -> Option<SymbolId> {
        if self.alias_depth >= MAX_ALIAS_DEPTH {
            return None;
        }
        self.alias_depth += 1;
        let denotation = self.denote(target);
        self.alias_depth -= 1;
        match denotation {
            Denotation::Namespace(id) | Denotation::Type(id) => Some(id),
            _ => None,
        }
    }

    // === ARGUMENTS AND INITIALIZERS ===

    fn bind_name_colon(&mut self, name_colon: NodeId, token: usize, name: &str) -> Denotation {
        let tree = self.tree;
        let Some(holder) = tree.parent(name_colon) else {
            return Denotation::Unknown;
        };
        match tree.kind(holder) {
            NodeKind::Argument | NodeKind::AttributeArgument => {
                let call = tree.parent(holder).and_then(|list| tree.parent(list));
                let candidates = match call {
                    Some(call) => self.callee_candidates(call),
                    None => Vec::new(),
                };
                for candidate in candidates {
                    let parameter = self
                        .table
                        .get(candidate)
                        .parameters
                        .iter()
                        .copied()
                        .find(|&parameter| self.table.get(parameter).name == name);
                    if let Some(parameter) = parameter {
                        return self.record(token, parameter);
                    }
                }
                Denotation::Unknown
            }
            NodeKind::Subpattern => {
                let pattern = tree.parent(holder).and_then(|clause| tree.parent(clause));
                let matched = match pattern {
                    Some(pattern) => self.pattern_type(pattern),
                    None => Denotation::Unknown,
                };
                match matched {
                    Denotation::Type(type_id) => match self.find_member(type_id, name, 0, Filter::Any) {
                        Some(id) => self.record(token, id),
                        None => Denotation::Unknown,
                    },
                    _ => Denotation::Unknown,
                }
            }
            _ => Denotation::Unknown,
        }
    }

    /// Type a recursive pattern tests against
    fn pattern_type(&mut self, pattern: NodeId) -> Denotation {
        let tree = self.tree;
        if let Some(type_node) = tree.type_child(pattern) {
            return self.denote(type_node);
        }
        match tree.parent(pattern) {
            Some(parent) if tree.kind(parent) == NodeKind::IsExpression => match tree.child_nodes(parent).next() {
                Some(subject) => self.expression_type(subject),
                None => Denotation::Unknown,
            },
            _ => Denotation::Unknown,
        }
    }

    fn bind_name_equals(&mut self, name_equals: NodeId, token: usize, name: &str) -> Denotation {
        let tree = self.tree;
        let Some(holder) = tree.parent(name_equals) else {
            return Denotation::Unknown;
        };
        match tree.kind(holder) {
            NodeKind::AnonymousObjectMember => {
                self.record_resolution(token, Resolution::synthetic(SymbolKind::Property));
                Denotation::Unknown
            }
            NodeKind::AttributeArgument => {
                let attribute = tree.parent(holder).and_then(|list| tree.parent(list));
                let attribute_type = attribute.and_then(|attribute| self.attribute_type(attribute));
                match attribute_type.and_then(|type_id| self.find_member(type_id, name, 0, Filter::Any)) {
                    Some(id) => self.record(token, id),
                    None => Denotation::Unknown,
                }
            }
            _ => Denotation::Unknown,
        }
    }

    /// Methods or constructors a call-like node may invoke
    pub(super) fn callee_candidates(&mut self, call: NodeId) -> Vec<SymbolId> {
        let tree = self.tree;
        match tree.kind(call) {
            NodeKind::Invocation => match tree.child_nodes(call).next().map(|target| self.denote(target)) {
                Some(Denotation::Method(method)) => self.overloads_of(method),
                _ => Vec::new(),
            },
            NodeKind::ObjectCreation => match tree.type_child(call).map(|created| self.denote(created)) {
                Some(Denotation::Type(type_id)) => self.table.get(type_id).constructors.clone(),
                _ => Vec::new(),
            },
            NodeKind::ImplicitObjectCreation => match self.target_type(call) {
                Denotation::Type(type_id) => self.table.get(type_id).constructors.clone(),
                _ => Vec::new(),
            },
            NodeKind::ConstructorInitializer => {
                let Some(own) = self.enclosing_type(call) else {
                    return Vec::new();
                };
                let calls_base = tree
                    .child_tokens(call)
                    .any(|token| tree.token_kind(token).is_keyword(Keyword::Base));
                let target = if calls_base {
                    self.base_types(own).into_iter().next()
                } else {
                    Some(own)
                };
                target
                    .map(|type_id| self.table.get(type_id).constructors.clone())
                    .unwrap_or_default()
            }
            NodeKind::Attribute => match self.attribute_type(call) {
                Some(type_id) => self.table.get(type_id).constructors.clone(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn overloads_of(&self, method: SymbolId) -> Vec<SymbolId> {
        let symbol = self.table.get(method);
        match symbol.container {
            Some(container) => self
                .table
                .members_named(container, &symbol.name)
                .iter()
                .copied()
                .filter(|&id| self.table.get(id).kind.is_method())
                .collect(),
            None => vec![method],
        }
    }

    fn attribute_type(&mut self, attribute: NodeId) -> Option<SymbolId> {
        let name = self.tree.type_child(attribute)?;
        match self.denote(name) {
            Denotation::Type(type_id) => Some(type_id),
            _ => None,
        }
    }

    fn bind_attribute_name(&mut self, node: NodeId, token: usize, name: &str, arity: usize) -> Denotation {
        let suffixed = format!("{}Attribute", name);
        match self.lookup(&suffixed, arity, node, Filter::TypeOrNamespace) {
            Some(id) => self.record(token, id),
            None => self.bind_simple(node, token, name, arity, Filter::TypeOrNamespace),
        }
    }

    /// Object initializer holding the assignment, if it is one
    fn initializer_of(&self, assignment: NodeId) -> Option<NodeId> {
        let tree = self.tree;
        let initializer = tree
            .parent(assignment)
            .filter(|&parent| tree.kind(parent) == NodeKind::Initializer)?;
        let owner = tree.parent(initializer)?;
        matches!(
            tree.kind(owner),
            NodeKind::ObjectCreation | NodeKind::ImplicitObjectCreation | NodeKind::WithExpression | NodeKind::Assignment
        )
        .then_some(initializer)
    }

    fn initializer_target(&mut self, initializer: NodeId) -> Denotation {
        let tree = self.tree;
        let Some(owner) = tree.parent(initializer) else {
            return Denotation::Unknown;
        };
        match tree.kind(owner) {
            NodeKind::ObjectCreation => match tree.type_child(owner) {
                Some(created) => self.denote(created),
                None => Denotation::Unknown,
            },
            NodeKind::ImplicitObjectCreation => self.target_type(owner),
            NodeKind::WithExpression | NodeKind::Assignment => match tree.child_nodes(owner).next() {
                Some(subject) => self.expression_type(subject),
                None => Denotation::Unknown,
            },
            _ => Denotation::Unknown,
        }
    }

    fn bind_initializer_member(&mut self, assignment: NodeId, token: usize, name: &str) -> Denotation {
        let target = match self.initializer_of(assignment) {
            Some(initializer) => self.initializer_target(initializer),
            None => Denotation::Unknown,
        };
        match target {
            Denotation::Type(type_id) => match self.find_member(type_id, name, 0, Filter::Any) {
                Some(id) => self.record(token, id),
                None => Denotation::Unknown,
            },
            Denotation::Anonymous(creation) => self.bind_anonymous_member(creation, token, name),
            _ => Denotation::Unknown,
        }
    }

    /// Members of an anonymous type are its explicitly named or projected members
    fn bind_anonymous_member(&mut self, creation: NodeId, token: usize, name: &str) -> Denotation {
        let tree = self.tree;
        let members: Vec<NodeId> = tree
            .children_of_kind(creation, NodeKind::AnonymousObjectMember)
            .collect();
        for member in members {
            let member_name = match tree.child_of_kind(member, NodeKind::NameEquals) {
                Some(name_equals) => tree
                    .name_token(name_equals)
                    .or_else(|| tree.child_nodes(name_equals).next().and_then(|id| tree.name_token(id)))
                    .map(|token| tree.identifier_value(token)),
                None => tree.child_nodes(member).last().map(|value| last_identifier(tree, value)),
            };
            if member_name == Some(name) {
                self.record_resolution(token, Resolution::synthetic(SymbolKind::Property));
                let value = tree.child_nodes(member).last();
                return match value {
                    Some(value) => {
                        let value_type = self.expression_type(value);
                        Denotation::value_of(value_type)
                    }
                    None => Denotation::Unknown,
                };
            }
        }
        Denotation::Unknown
    }

    // === LOOKUP ===

    /// Bind `name` from the scope chain starting at `at`
    pub(super) fn lookup(&mut self, name: &str, arity: usize, at: NodeId, filter: Filter) -> Option<SymbolId> {
        let scopes: Vec<NodeId> = iter::once(at).chain(self.tree.ancestors(at)).collect();
        let mut fallback = None;
        for scope in scopes {
            let found = self.lookup_in_scope(name, scope, at, filter);
            if found.is_empty() {
                continue;
            }
            if let Some(&id) = found.iter().find(|&&id| self.arity_matches(id, arity)) {
                return Some(id);
            }
            if fallback.is_none() {
                fallback = found.first().copied();
            }
        }
        if fallback.is_some() {
            self.note_arity_fallback(name, arity);
        }
        fallback
    }

    fn arity_matches(&self, id: SymbolId, arity: usize) -> bool {
        let symbol = self.table.get(id);
        symbol.arity == arity || (arity == 0 && symbol.kind.is_method())
    }

    fn pick(&mut self, candidates: &[SymbolId], arity: usize, name: &str) -> Option<SymbolId> {
        if let Some(&id) = candidates.iter().find(|&&id| self.arity_matches(id, arity)) {
            return Some(id);
        }
        let fallback = candidates.first().copied();
        if fallback.is_some() {
            self.note_arity_fallback(name, arity);
        }
        fallback
    }

    fn note_arity_fallback(&mut self, name: &str, arity: usize) {
        self.bindings.stats.arity_fallbacks += 1;
        log_debug!("No declaration with matching arity, using same-named symbol",
            "code" => codes::binding::ARITY_FALLBACK.as_str(),
            "name" => name,
            "arity" => arity
        );
    }

    fn lookup_in_scope(&mut self, name: &str, scope: NodeId, at: NodeId, filter: Filter) -> Vec<SymbolId> {
        let scoped: Vec<SymbolId> = self
            .table
            .scoped_at(scope)
            .iter()
            .copied()
            .filter(|&id| {
                let symbol = self.table.get(id);
                symbol.name == name && filter.accepts(symbol.kind)
            })
            .collect();
        if !scoped.is_empty() {
            return scoped;
        }

        let kind = self.tree.kind(scope);
        if kind.is_type_declaration() {
            // Base lists are bound outside the type's own members
            if self.in_base_list(at, scope) {
                return Vec::new();
            }
            return match self.table.declared_by(scope) {
                Some(type_id) => self.members_in_type(type_id, name, filter),
                None => Vec::new(),
            };
        }
        if kind.is_namespace() || kind == NodeKind::CompilationUnit {
            return self.lookup_in_namespace_scope(name, scope, at, filter);
        }
        Vec::new()
    }

    fn lookup_in_namespace_scope(&mut self, name: &str, scope: NodeId, at: NodeId, filter: Filter) -> Vec<SymbolId> {
        let mut containers = Vec::new();
        if self.tree.kind(scope) == NodeKind::CompilationUnit {
            if let Some(script) = self.table.script_class() {
                let found = self.members_in_type(script, name, filter);
                if !found.is_empty() {
                    return found;
                }
            }
            containers.push(self.table.global_namespace());
        } else if let Some(namespace) = self.table.declared_by(scope) {
            // `namespace A.B` opens both `A.B` and `A`
            let outer = self
                .tree
                .find_ancestor(scope, |kind| kind.is_namespace())
                .and_then(|outer| self.table.declared_by(outer))
                .unwrap_or_else(|| self.table.global_namespace());
            let mut current = Some(namespace);
            while let Some(id) = current.filter(|&id| id != outer) {
                containers.push(id);
                current = self.table.get(id).container;
            }
        }

        // A directive's own target is bound without the directives beside it
        let imports = if self.in_using_directive_of(at, scope) {
            None
        } else {
            self.table.imports_at(scope).cloned()
        };

        if let Some(target) = imports.as_ref().and_then(|imports| imports.aliases.get(name).copied()) {
            if let Some(id) = self.denote_alias_target(target) {
                if filter.accepts(self.table.get(id).kind) {
                    return vec![id];
                }
            }
        }

        for container in containers {
            let found: Vec<SymbolId> = self
                .table
                .members_named(container, name)
                .iter()
                .copied()
                .filter(|&id| filter.accepts(self.table.get(id).kind))
                .collect();
            if !found.is_empty() {
                return found;
            }
        }

        let Some(imports) = imports else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for namespace_node in &imports.namespaces {
            if let Denotation::Namespace(namespace) = self.denote(*namespace_node) {
                found.extend(
                    self.table
                        .members_named(namespace, name)
                        .iter()
                        .copied()
                        .filter(|&id| {
                            let kind = self.table.get(id).kind;
                            kind.is_type() && filter.accepts(kind)
                        }),
                );
            }
        }
        if !found.is_empty() {
            return found;
        }
        for type_node in &imports.static_types {
            if let Denotation::Type(type_id) = self.denote(*type_node) {
                let members = self.members_in_type(type_id, name, filter);
                found.extend(members.into_iter().filter(|&id| {
                    let symbol = self.table.get(id);
                    symbol.is_static || symbol.kind.is_type() || symbol.kind == SymbolKind::EnumMember
                }));
            }
        }
        found
    }

    fn in_base_list(&self, at: NodeId, declaration: NodeId) -> bool {
        let mut current = at;
        while let Some(parent) = self.tree.parent(current) {
            if parent == declaration {
                return self.tree.kind(current) == NodeKind::BaseList;
            }
            current = parent;
        }
        false
    }

    fn in_using_directive_of(&self, at: NodeId, scope: NodeId) -> bool {
        let directive = if self.tree.kind(at) == NodeKind::UsingDirective {
            Some(at)
        } else {
            self.tree.find_ancestor(at, |kind| kind == NodeKind::UsingDirective)
        };
        directive.and_then(|directive| self.tree.parent(directive)) == Some(scope)
    }

    /// Members of a type named `name`, searching bases nearest first
    fn members_in_type(&mut self, type_id: SymbolId, name: &str, filter: Filter) -> Vec<SymbolId> {
        let mut frontier = vec![type_id];
        let mut seen = HashSet::new();
        for _ in 0..=MAX_BASE_TYPE_DEPTH {
            let mut found = Vec::new();
            let mut next = Vec::new();
            for current in frontier {
                if !seen.insert(current) {
                    continue;
                }
                found.extend(
                    self.table
                        .members_named(current, name)
                        .iter()
                        .copied()
                        .filter(|&id| filter.accepts(self.table.get(id).kind)),
                );
                next.extend(self.base_types(current));
            }
            if !found.is_empty() || next.is_empty() {
                return found;
            }
            frontier = next;
        }
        Vec::new()
    }

    pub(super) fn find_member(&mut self, type_id: SymbolId, name: &str, arity: usize, filter: Filter) -> Option<SymbolId> {
        let candidates = self.members_in_type(type_id, name, filter);
        self.pick(&candidates, arity, name)
    }

    pub(super) fn base_types(&mut self, type_id: SymbolId) -> Vec<SymbolId> {
        if let Some(bases) = self.base_cache.get(&type_id) {
            return bases.clone();
        }
        if !self.resolving_bases.insert(type_id) {
            log_warning!(code = codes::binding::CYCLIC_BASE_TYPE, "Cyclic base type list",
                "type" => self.table.get(type_id).name.as_str()
            );
            return Vec::new();
        }
        let declared = self.table.get(type_id).bases.clone();
        let mut bases = Vec::new();
        for base in declared {
            let resolved = match base {
                BaseRef::Symbol(id) => Some(id),
                BaseRef::Syntax(node) => match self.denote(node) {
                    Denotation::Type(id) => Some(id),
                    _ => None,
                },
            };
            if let Some(id) = resolved.filter(|&id| id != type_id) {
                bases.push(id);
            }
        }
        self.resolving_bases.remove(&type_id);
        self.base_cache.insert(type_id, bases.clone());
        bases
    }

    /// Extension method `name` in a static class visible from `at`
    fn find_extension(&mut self, name: &str, at: NodeId) -> Option<SymbolId> {
        let mut namespaces = Vec::new();
        let scopes: Vec<NodeId> = iter::once(at).chain(self.tree.ancestors(at)).collect();
        for scope in scopes {
            let kind = self.tree.kind(scope);
            if kind.is_namespace() {
                let mut current = self.table.declared_by(scope);
                while let Some(id) = current {
                    namespaces.push(id);
                    current = self.table.get(id).container;
                }
            } else if kind == NodeKind::CompilationUnit {
                namespaces.extend(self.table.script_class());
                namespaces.push(self.table.global_namespace());
            } else {
                continue;
            }
            let imported = self
                .table
                .imports_at(scope)
                .map(|imports| imports.namespaces.clone())
                .unwrap_or_default();
            for node in imported {
                if let Denotation::Namespace(id) = self.denote(node) {
                    namespaces.push(id);
                }
            }
        }

        for namespace in namespaces {
            for holder in self.table.all_members(namespace) {
                let holder_symbol = self.table.get(holder);
                if holder_symbol.kind != SymbolKind::Class || !holder_symbol.is_static {
                    continue;
                }
                let found = self
                    .table
                    .members_named(holder, name)
                    .iter()
                    .copied()
                    .find(|&id| self.table.get(id).kind == SymbolKind::ExtensionMethod);
                if found.is_some() {
                    return found;
                }
            }
        }
        None
    }

    // === OPERATORS ===

    fn bind_operator(&mut self, node: NodeId) {
        let tree = self.tree;
        let kind = tree.kind(node);
        let operator_tokens: Vec<usize> = tree
            .child_tokens(node)
            .filter(|&token| matches!(tree.token_kind(token), Token::Punct(_)))
            .collect();
        let mut spelling: String = operator_tokens.iter().map(|&token| tree.token_text(token)).collect();
        match kind {
            NodeKind::Assignment => {
                if spelling == "=" || spelling == "??=" || !spelling.ends_with('=') {
                    return;
                }
                spelling.pop();
            }
            NodeKind::PostfixUnary if spelling == "!" => return,
            _ => {}
        }
        if spelling.is_empty() {
            return;
        }

        let operands: Vec<NodeId> = tree.child_nodes(node).collect();
        for operand in operands {
            let Denotation::Value {
                type_id: Some(type_id),
                ..
            } = self.denote(operand)
            else {
                continue;
            };
            if self.table.get(type_id).operators.iter().any(|declared| *declared == spelling) {
                self.bindings.overloaded_operators.extend(operator_tokens.iter().copied());
                self.bindings.stats.overloaded_operators += 1;
                return;
            }
        }
    }

    // === STRING SYNTAX ===

    /// Literal passed to, or stored in, something declared `[StringSyntax]`
    fn bind_string_syntax(&mut self, literal: NodeId) {
        let tree = self.tree;
        let Some(token) = tree.first_token(literal) else {
            return;
        };
        if !matches!(tree.token_kind(token), Token::String(_)) {
            return;
        }
        let Some(parent) = tree.parent(literal) else {
            return;
        };
        let hint = match tree.kind(parent) {
            NodeKind::Argument => self.argument_string_syntax(parent),
            NodeKind::EqualsValueClause => tree
                .parent(parent)
                .and_then(|owner| self.table.declared_by(owner))
                .and_then(|id| self.table.get(id).string_syntax)
                .map(EmbeddedHint::new),
            NodeKind::Assignment if self.is_right_operand(parent, literal) => {
                match tree.child_nodes(parent).next().map(|target| self.denote(target)) {
                    Some(Denotation::Value {
                        symbol: Some(id), ..
                    }) => self.table.get(id).string_syntax.map(EmbeddedHint::new),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(hint) = hint {
            self.bindings.string_syntax.insert(token, hint);
            self.bindings.stats.string_syntax_literals += 1;
        }
    }

    fn argument_string_syntax(&mut self, argument: NodeId) -> Option<EmbeddedHint> {
        let tree = self.tree;
        let list = tree.parent(argument)?;
        let call = tree.parent(list)?;
        let arguments: Vec<NodeId> = tree.children_of_kind(list, NodeKind::Argument).collect();
        let position = arguments.iter().position(|&candidate| candidate == argument)?;
        let named = tree
            .child_of_kind(argument, NodeKind::NameColon)
            .and_then(|name_colon| tree.child_nodes(name_colon).next())
            .and_then(|name| tree.name_token(name))
            .map(|token| tree.identifier_value(token).to_string());

        let mut language = None;
        for candidate in self.callee_candidates(call) {
            let parameters = &self.table.get(candidate).parameters;
            let parameter = match &named {
                Some(name) => parameters
                    .iter()
                    .copied()
                    .find(|&parameter| self.table.get(parameter).name == *name),
                None => parameters.get(position).copied(),
            };
            language = parameter.and_then(|parameter| self.table.get(parameter).string_syntax);
            if language.is_some() {
                break;
            }
        }

        let language = language?;
        let mut hint = EmbeddedHint::new(language);
        if language == EmbeddedLanguage::Regex {
            let options = self.regex_options_in(&arguments, argument);
            hint = hint.with_regex_options(options);
        }
        Some(hint)
    }

    /// `RegexOptions.X` flags passed next to the pattern
    fn regex_options_in(&self, arguments: &[NodeId], pattern: NodeId) -> RegexOptions {
        let tree = self.tree;
        let mut options = RegexOptions::NONE;
        for &argument in arguments.iter().filter(|&&argument| argument != pattern) {
            for node in tree.descendants(argument) {
                if tree.kind(node) != NodeKind::MemberAccess {
                    continue;
                }
                let mut parts = tree.child_nodes(node);
                let (Some(receiver), Some(flag)) = (parts.next(), parts.last()) else {
                    continue;
                };
                if last_identifier(tree, receiver) != "RegexOptions" {
                    continue;
                }
                if let Some(flag) = RegexOptions::from_name(last_identifier(tree, flag)) {
                    options.insert(flag);
                }
            }
        }
        options
    }
}

fn is_integer_literal(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0b") {
        return true;
    }
    !lower.contains('.') && !lower.contains('e') && !lower.ends_with(['f', 'd', 'm'])
}
