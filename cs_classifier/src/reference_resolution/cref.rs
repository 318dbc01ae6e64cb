//! Names inside documentation comments
//!
//! `cref` values are bound like code written at the documented
//! declaration; `name` values of `param`/`typeparam` tags bind to that
//! declaration's parameters.

use super::binder::{Binder, Denotation, Filter};
use super::error::BindingResult;
use super::types::Resolution;
use crate::config::constants::compile_time::binding::CANCELLATION_CHECK_INTERVAL;
use crate::grammar::ast::{NodeId, NodeKind};
use crate::symbols::SymbolKind;
use crate::tokens::{CrefPiece, Token};
use std::iter;

/// Significant lexeme of one cref value
#[derive(Debug, Clone, Copy)]
struct CrefToken<'t> {
    index: usize,
    piece: CrefPiece,
    text: &'t str,
}

/// One bound part of a dotted cref name
#[derive(Debug, Clone, Copy)]
struct CrefPart<'t> {
    token: usize,
    denotation: Denotation,
    /// Name of the preceding part when it is a type
    qualifier_type: Option<&'t str>,
}

struct CrefCursor<'t> {
    tokens: Vec<CrefToken<'t>>,
    position: usize,
}

impl<'t> CrefCursor<'t> {
    fn peek(&self) -> Option<CrefToken<'t>> {
        self.tokens.get(self.position).copied()
    }

    fn peek_text(&self) -> &'t str {
        self.peek().map(|token| token.text).unwrap_or("")
    }

    fn bump(&mut self) -> Option<CrefToken<'t>> {
        let token = self.peek();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.peek_text() == text {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

fn is_open_angle(text: &str) -> bool {
    matches!(text, "<" | "{" | "&lt;")
}

fn is_close_angle(text: &str) -> bool {
    matches!(text, ">" | "}" | "&gt;")
}

/// Declarations a doc comment can document
fn is_documented(kind: NodeKind) -> bool {
    kind.is_type_declaration()
        || kind.is_namespace()
        || matches!(
            kind,
            NodeKind::Method
                | NodeKind::Constructor
                | NodeKind::Destructor
                | NodeKind::Operator
                | NodeKind::ConversionOperator
                | NodeKind::Property
                | NodeKind::Indexer
                | NodeKind::Event
                | NodeKind::EventField
                | NodeKind::Field
                | NodeKind::EnumMember
                | NodeKind::LocalFunction
        )
}

impl<'a> Binder<'a> {
    pub(super) fn bind_doc_comments(&mut self) -> BindingResult<()> {
        let tree = self.tree;
        let count = tree.tokens().all_tokens().len();
        let mut index = 0;
        while index < count {
            if index % CANCELLATION_CHECK_INTERVAL == 0 {
                self.check_cancelled("doc comments", index)?;
            }
            match tree.token_kind(index) {
                Token::DocCode(_) => {
                    let end = self.cref_run_end(index, count);
                    let context = self.documented_declaration(end, count);
                    self.bind_cref(index, end, context);
                    index = end;
                }
                Token::DocName => {
                    let context = self.documented_declaration(index + 1, count);
                    self.bind_doc_name(index, context);
                    index += 1;
                }
                _ => index += 1,
            }
        }
        Ok(())
    }

    /// End (exclusive) of the cref value starting at `start`
    fn cref_run_end(&self, start: usize, count: usize) -> usize {
        let mut end = start;
        let mut index = start;
        while index < count {
            match self.tree.token_kind(index) {
                Token::DocCode(_) => end = index + 1,
                Token::Whitespace => {}
                _ => break,
            }
            index += 1;
        }
        end
    }

    /// Declaration owning the first significant lexeme after `from`
    fn documented_declaration(&self, from: usize, count: usize) -> NodeId {
        let tree = self.tree;
        let owner = (from..count)
            .find(|&index| tree.token_kind(index).is_significant())
            .and_then(|index| tree.token_parent(index))
            .and_then(|parent| {
                iter::once(parent)
                    .chain(tree.ancestors(parent))
                    .find(|&node| is_documented(tree.kind(node)))
            });
        owner.unwrap_or_else(|| tree.root())
    }

    fn bind_cref(&mut self, start: usize, end: usize, context: NodeId) {
        let tree = self.tree;
        let tokens: Vec<CrefToken<'a>> = (start..end)
            .filter_map(|index| match tree.token_kind(index) {
                Token::DocCode(piece) => Some(CrefToken {
                    index,
                    piece,
                    text: tree.token_text(index),
                }),
                _ => None,
            })
            .collect();
        let mut cursor = CrefCursor { tokens, position: 0 };

        // Documentation ID prefix such as `T:` or `M:`
        if cursor.tokens.len() > 2 && cursor.tokens[1].text == ":" && cursor.tokens[0].text.len() == 1 {
            cursor.position = 2;
        }

        let target = self.bind_cref_name(&mut cursor, context, Filter::Any);
        if cursor.eat("(") {
            // `Type(...)` and `Type.Type(...)` name a constructor
            if let Some(part) = target {
                let name = tree.identifier_value(part.token);
                let is_constructor = match part.qualifier_type {
                    Some(qualifier) => qualifier == name,
                    None => matches!(part.denotation, Denotation::Type(_)),
                };
                if is_constructor {
                    self.record_resolution(part.token, Resolution::synthetic(SymbolKind::Method));
                }
            }
            self.bind_cref_parameters(&mut cursor, context);
        }
    }

    /// Dotted name; returns its last part
    fn bind_cref_name(&mut self, cursor: &mut CrefCursor<'a>, context: NodeId, filter: Filter) -> Option<CrefPart<'a>> {
        let mut last: Option<CrefPart<'a>> = None;
        loop {
            let Some(token) = cursor.peek() else {
                break;
            };
            if token.piece != CrefPiece::Identifier {
                // `int`, `operator +`, `this[...]`: keywords are left to the lexer
                if token.piece == CrefPiece::Keyword {
                    cursor.bump();
                }
                break;
            }
            cursor.bump();
            self.bindings.stats.cref_names += 1;
            let arity = self.bind_cref_type_arguments(cursor, context);
            let name = token.text.strip_prefix('@').unwrap_or(token.text);
            let denotation = match last.map(|part| part.denotation) {
                None => match self.lookup(name, arity, context, filter) {
                    Some(id) => self.record(token.index, id),
                    None => Denotation::Unknown,
                },
                Some(Denotation::Namespace(namespace)) => {
                    let table = self.table;
                    let candidates = table.members_named(namespace, name);
                    let found = candidates
                        .iter()
                        .copied()
                        .find(|&id| table.get(id).arity == arity)
                        .or_else(|| candidates.first().copied());
                    match found {
                        Some(id) => self.record(token.index, id),
                        None => Denotation::Unknown,
                    }
                }
                Some(Denotation::Type(type_id)) => match self.find_member(type_id, name, arity, Filter::Any) {
                    Some(id) => self.record(token.index, id),
                    None => Denotation::Unknown,
                },
                Some(_) => Denotation::Unknown,
            };
            let qualifier_type = last
                .filter(|part| matches!(part.denotation, Denotation::Type(_)))
                .map(|part| self.tree.identifier_value(part.token));
            last = Some(CrefPart {
                token: token.index,
                denotation,
                qualifier_type,
            });
            if !cursor.eat(".") {
                break;
            }
        }
        last
    }

    /// `<T, U>` or `{T, U}` after a name; returns the argument count
    fn bind_cref_type_arguments(&mut self, cursor: &mut CrefCursor<'a>, context: NodeId) -> usize {
        if !is_open_angle(cursor.peek_text()) {
            return 0;
        }
        cursor.bump();
        let mut arity = 1;
        while !cursor.at_end() {
            let text = cursor.peek_text();
            if is_close_angle(text) {
                cursor.bump();
                break;
            }
            if text == "," {
                arity += 1;
                cursor.bump();
                continue;
            }
            self.bind_cref_type(cursor, context);
        }
        arity
    }

    /// A type in a parameter list or type argument list
    fn bind_cref_type(&mut self, cursor: &mut CrefCursor<'a>, context: NodeId) {
        let Some(token) = cursor.peek() else {
            return;
        };
        match token.piece {
            CrefPiece::Identifier => {
                let start = cursor.position;
                self.bind_cref_name(cursor, context, Filter::TypeOrNamespace);
                // Placeholders such as the `T` of `List{T}` bind to nothing
                let first = cursor.tokens[start];
                if !self.bindings.token_symbols.contains_key(&first.index) && cursor.position == start + 1 {
                    self.record_resolution(first.index, Resolution::synthetic(SymbolKind::TypeParameter));
                }
            }
            _ => {
                cursor.bump();
            }
        }
    }

    fn bind_cref_parameters(&mut self, cursor: &mut CrefCursor<'a>, context: NodeId) {
        while let Some(token) = cursor.peek() {
            if token.text == ")" {
                cursor.bump();
                break;
            }
            self.bind_cref_type(cursor, context);
        }
    }

    /// `<param name="x"/>` and `<typeparam name="T"/>`
    fn bind_doc_name(&mut self, token: usize, context: NodeId) {
        let name = self.tree.token_text(token).trim();
        let found = self
            .lookup(name, 0, context, Filter::Parameter)
            .or_else(|| self.lookup(name, 0, context, Filter::TypeParameter));
        if let Some(id) = found {
            self.bindings.stats.cref_names += 1;
            self.record(token, id);
        }
    }
}
