//! Syntax tree arena and its builder
//!
//! The parser drives a [`TreeBuilder`] with `start_node` / `token` /
//! `finish_node` calls; left-recursive shapes (member access, binary
//! operators, declarations whose kind is only known late) are wrapped after
//! the fact with a [`Checkpoint`]. The finished [`SyntaxTree`] owns the
//! lexeme stream so later stages can go from a node to its text and from a
//! lexeme back to its parent node.

use super::nodes::{Element, Node, NodeId, NodeKind, TokenRole};
use crate::grammar::keywords::Keyword;
use crate::syntax::SyntaxError;
use crate::tokens::{Token, TokenStream};
use crate::utils::Span;

/// Position in the currently open node's child list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    depth: usize,
    child_count: usize,
}

#[derive(Debug)]
struct OpenNode {
    kind: NodeKind,
    children: Vec<Element>,
    name_token: Option<usize>,
}

/// Incremental tree construction used by the parser
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    open: Vec<OpenNode>,
    roles: Vec<TokenRole>,
    token_parents: Vec<Option<NodeId>>,
    root: Option<NodeId>,
}

impl TreeBuilder {
    pub fn new(lexeme_count: usize) -> Self {
        Self {
            nodes: Vec::new(),
            open: Vec::new(),
            roles: vec![TokenRole::None; lexeme_count],
            token_parents: vec![None; lexeme_count],
            root: None,
        }
    }

    pub fn start_node(&mut self, kind: NodeKind) {
        self.open.push(OpenNode {
            kind,
            children: Vec::new(),
            name_token: None,
        });
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.open.len(),
            child_count: self.open.last().map(|node| node.children.len()).unwrap_or(0),
        }
    }

    /// Open a node that adopts every child added since `checkpoint`
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        let depth = self.open.len();
        let adopted = match self.open.last_mut() {
            Some(parent) if checkpoint.depth == depth => {
                let split = checkpoint.child_count.min(parent.children.len());
                parent.children.split_off(split)
            }
            _ => Vec::new(),
        };
        self.open.push(OpenNode {
            kind,
            children: adopted,
            name_token: None,
        });
    }

    /// Close the innermost open node and attach it to its parent
    pub fn finish_node(&mut self) -> NodeId {
        let open = self.open.pop().unwrap_or(OpenNode {
            kind: NodeKind::SkippedTokens,
            children: Vec::new(),
            name_token: None,
        });
        let id = NodeId(self.nodes.len() as u32);

        let mut node = Node::new(open.kind);
        node.name_token = open.name_token;
        for element in &open.children {
            let (first, last) = match *element {
                Element::Token(index) => {
                    if let Some(parent) = self.token_parents.get_mut(index) {
                        *parent = Some(id);
                    }
                    (Some(index), Some(index))
                }
                Element::Node(child) => match self.nodes.get_mut(child.index()) {
                    Some(child_node) => {
                        child_node.parent = Some(id);
                        (child_node.first_token, child_node.last_token)
                    }
                    None => (None, None),
                },
            };
            if node.first_token.is_none() {
                node.first_token = first;
            }
            if last.is_some() {
                node.last_token = last;
            }
        }
        node.children = open.children;
        self.nodes.push(node);

        match self.open.last_mut() {
            Some(parent) => parent.children.push(Element::Node(id)),
            None => self.root = Some(id),
        }
        id
    }

    /// Attach a lexeme to the innermost open node
    pub fn token(&mut self, index: usize) {
        if let Some(node) = self.open.last_mut() {
            node.children.push(Element::Token(index));
        }
    }

    pub fn set_role(&mut self, index: usize, role: TokenRole) {
        if let Some(slot) = self.roles.get_mut(index) {
            *slot = role;
        }
    }

    /// Record the declared name of the innermost open node
    pub fn set_name(&mut self, index: usize) {
        if let Some(node) = self.open.last_mut() {
            node.name_token = Some(index);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Close everything still open; the outermost node becomes the root
    pub fn finish(mut self) -> (Vec<Node>, NodeId, Vec<TokenRole>, Vec<Option<NodeId>>) {
        while !self.open.is_empty() {
            self.finish_node();
        }
        let root = match self.root {
            Some(root) => root,
            None => {
                self.start_node(NodeKind::CompilationUnit);
                self.finish_node()
            }
        };
        (self.nodes, root, self.roles, self.token_parents)
    }
}

/// A parsed compilation unit
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    tokens: TokenStream,
    nodes: Vec<Node>,
    root: NodeId,
    roles: Vec<TokenRole>,
    token_parents: Vec<Option<NodeId>>,
    diagnostics: Vec<SyntaxError>,
}

impl SyntaxTree {
    pub fn new(tokens: TokenStream, builder: TreeBuilder, diagnostics: Vec<SyntaxError>) -> Self {
        let (nodes, root, roles, token_parents) = builder.finish();
        Self {
            tokens,
            nodes,
            root,
            roles,
            token_parents,
            diagnostics,
        }
    }

    // === ACCESS ===

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    /// Give the lexeme stream back once the tree is no longer needed
    pub fn into_tokens(self) -> TokenStream {
        self.tokens
    }

    pub fn source(&self) -> &str {
        self.tokens.source()
    }

    pub fn diagnostics(&self) -> &[SyntaxError] {
        &self.diagnostics
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        // Ids are only ever handed out by the builder that filled `nodes`
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[Element] {
        &self.node(id).children
    }

    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).child_nodes()
    }

    pub fn child_tokens(&self, id: NodeId) -> impl Iterator<Item = usize> + '_ {
        self.node(id).child_tokens()
    }

    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.child_nodes(id).find(|&child| self.kind(child) == kind)
    }

    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.child_nodes(id).filter(move |&child| self.kind(child) == kind)
    }

    /// First child node that can stand as a type
    pub fn type_child(&self, id: NodeId) -> Option<NodeId> {
        self.child_nodes(id).find(|&child| self.kind(child).is_type())
    }

    pub fn name_token(&self, id: NodeId) -> Option<usize> {
        self.node(id).name_token
    }

    pub fn name_text(&self, id: NodeId) -> &str {
        self.name_token(id)
            .map(|index| self.token_text(index))
            .unwrap_or("")
    }

    pub fn first_token(&self, id: NodeId) -> Option<usize> {
        self.node(id).first_token
    }

    pub fn last_token(&self, id: NodeId) -> Option<usize> {
        self.node(id).last_token
    }

    pub fn span(&self, id: NodeId) -> Span {
        let node = self.node(id);
        match (node.first_token, node.last_token) {
            (Some(first), Some(last)) => self.tokens.span(first).merge(self.tokens.span(last)),
            _ => Span::empty(self.source().len()),
        }
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        let node = self.node(id);
        match (node.first_token, node.last_token) {
            (Some(_), Some(_)) => self.span(id).slice(self.source()),
            _ => "",
        }
    }

    // === LEXEMES ===

    pub fn token_kind(&self, index: usize) -> Token {
        self.tokens.kind(index)
    }

    pub fn token_text(&self, index: usize) -> &str {
        self.tokens.text(index)
    }

    pub fn role(&self, index: usize) -> TokenRole {
        self.roles.get(index).copied().unwrap_or_default()
    }

    pub fn token_parent(&self, index: usize) -> Option<NodeId> {
        self.token_parents.get(index).copied().flatten()
    }

    /// Identifier text without a leading `@`
    pub fn identifier_value(&self, index: usize) -> &str {
        let text = self.token_text(index);
        text.strip_prefix('@').unwrap_or(text)
    }

    /// Whether the node directly holds a modifier spelled `keyword`
    pub fn has_modifier(&self, id: NodeId, keyword: Keyword) -> bool {
        self.child_tokens(id).any(|index| match self.token_kind(index) {
            Token::Keyword(k) => k == keyword,
            Token::Identifier => {
                self.role(index) == TokenRole::Keyword && self.token_text(index) == keyword.as_str()
            }
            _ => false,
        })
    }

    // === NAVIGATION ===

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Nearest ancestor (excluding `id`) satisfying `predicate`
    pub fn find_ancestor(&self, id: NodeId, predicate: impl Fn(NodeKind) -> bool) -> Option<NodeId> {
        self.ancestors(id).find(|&ancestor| predicate(self.kind(ancestor)))
    }

    /// Pre-order traversal of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Compact s-expression rendering, used in tests and debug output
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        out.push('(');
        out.push_str(&format!("{:?}", self.kind(id)));
        for element in self.children(id) {
            match *element {
                Element::Node(child) => {
                    out.push(' ');
                    self.render_into(child, out);
                }
                Element::Token(index) => {
                    if matches!(self.token_kind(index), Token::Eof) {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(self.token_text(index));
                }
            }
        }
        out.push(')');
    }
}

pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        let children: Vec<NodeId> = self.tree.child_nodes(current).collect();
        self.stack.extend(children.into_iter().rev());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{Punct, Spanned};

    fn stream() -> TokenStream {
        // a.b
        let tokens = vec![
            Spanned::new(Token::Identifier, Span::new(0, 1)),
            Spanned::new(Token::Punct(Punct::Dot), Span::new(1, 2)),
            Spanned::new(Token::Identifier, Span::new(2, 3)),
            Spanned::new(Token::Eof, Span::new(3, 3)),
        ];
        TokenStream::new("a.b".to_string(), tokens)
    }

    #[test]
    fn test_checkpoint_wraps_children() {
        let mut builder = TreeBuilder::new(4);
        builder.start_node(NodeKind::CompilationUnit);
        let checkpoint = builder.checkpoint();
        builder.start_node(NodeKind::IdentifierName);
        builder.set_name(0);
        builder.token(0);
        builder.finish_node();
        builder.start_node_at(checkpoint, NodeKind::QualifiedName);
        builder.token(1);
        builder.start_node(NodeKind::IdentifierName);
        builder.token(2);
        builder.finish_node();
        builder.finish_node();
        builder.token(3);

        let tree = SyntaxTree::new(stream(), builder, Vec::new());
        assert_eq!(
            tree.render(tree.root()),
            "(CompilationUnit (QualifiedName (IdentifierName a) . (IdentifierName b)))"
        );

        let qualified = tree.token_parent(1).unwrap();
        assert_eq!(tree.kind(qualified), NodeKind::QualifiedName);
        assert_eq!(tree.span(qualified), Span::new(0, 3));
        assert_eq!(tree.node_text(qualified), "a.b");
        let left = tree.token_parent(0).unwrap();
        assert_eq!(tree.name_text(left), "a");
        assert_eq!(tree.parent(left), Some(qualified));
    }

    #[test]
    fn test_traversal_orders() {
        let mut builder = TreeBuilder::new(4);
        builder.start_node(NodeKind::CompilationUnit);
        builder.start_node(NodeKind::ExpressionStatement);
        builder.start_node(NodeKind::IdentifierName);
        builder.token(0);
        builder.finish_node();
        builder.finish_node();
        let tree = SyntaxTree::new(stream(), builder, Vec::new());

        let kinds: Vec<NodeKind> = tree.descendants(tree.root()).map(|id| tree.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::CompilationUnit,
                NodeKind::ExpressionStatement,
                NodeKind::IdentifierName
            ]
        );
        let name = tree.token_parent(0).unwrap();
        assert_eq!(tree.ancestors(name).count(), 2);
        assert!(tree.token_parent(2).is_none());
    }
}
