//! Compilation unit, namespace, type and member productions
//!
//! Attributes and modifiers are consumed into the enclosing node before the
//! member kind is known; the member node is then opened retroactively at a
//! checkpoint and the declared name is attached once it is open.

use crate::grammar::ast::{Checkpoint, NodeId, NodeKind, TokenRole};
use crate::grammar::builders::atomic::{
    parse_identifier_name, parse_name, parse_simple_name, skip_token, NameContext, Parser,
};
use crate::grammar::builders::expressions::{parse_argument_list, parse_expression};
use crate::grammar::builders::helpers::{
    contextual_modifier_applies, is_identifier, is_record_start, scan_declaration, scan_name,
    scan_type,
};
use crate::grammar::builders::statements::{
    parse_block, parse_equals_value, parse_statement, parse_variable_declarators,
};
use crate::grammar::builders::types::{at_type_start, parse_type};
use crate::grammar::keywords::{contextual_keyword, Keyword};
use crate::tokens::{Punct, Token};

// === COMPILATION UNIT ===

/// compilation_unit ::= extern_alias* using_directive* attribute_list* member* EOF
pub fn parse_compilation_unit(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::CompilationUnit);
    parse_namespace_members(parser, true);
    while !parser.at_end() {
        skip_token(parser);
    }
    parser.bump();
    parser.finish_node()
}

/// Members of a namespace body or the compilation unit
fn parse_namespace_members(parser: &mut dyn Parser, top_level: bool) {
    while !parser.at_end() {
        if parser.at_punct(Punct::CloseBrace) {
            if top_level {
                skip_token(parser);
                continue;
            }
            return;
        }

        let before = parser.position();
        if parser.at_keyword(Keyword::Extern) && parser.peek_contextual(1, Keyword::Alias) {
            parse_extern_alias(parser);
        } else if at_using_directive(parser) {
            parse_using_directive(parser);
        } else if parser.at_keyword(Keyword::Namespace) {
            parse_namespace(parser);
        } else if at_global_attribute(parser) {
            parse_attribute_list(parser);
        } else if top_level && !at_member_start(parser) {
            parser.start_node(NodeKind::GlobalStatement);
            parse_statement(parser);
            parser.finish_node();
        } else {
            parse_member(parser);
        }

        if parser.position() == before {
            skip_token(parser);
        }
    }
}

fn parse_extern_alias(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::ExternAlias);
    parser.bump();
    parser.bump_as(TokenRole::Keyword);
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

/// `using` that starts a directive rather than a statement
fn at_using_directive(parser: &dyn Parser) -> bool {
    let offset = if parser.at_contextual(Keyword::Global) && parser.peek(1).is_keyword(Keyword::Using) {
        1
    } else {
        0
    };
    parser.peek(offset).is_keyword(Keyword::Using)
        && !parser.peek(offset + 1).is_punct(Punct::OpenParen)
        && scan_declaration(parser, offset + 1).is_none()
}

/// using_directive ::= 'global'? 'using' 'static'? (identifier '=')? type ';'
fn parse_using_directive(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::UsingDirective);
    parser.eat_contextual(Keyword::Global);
    parser.bump();
    let is_static = parser.eat_keyword(Keyword::Static);
    parser.eat_keyword(Keyword::Unsafe);

    if is_identifier(parser, 0) && parser.peek(1).is_punct(Punct::Eq) {
        parser.start_node(NodeKind::NameEquals);
        parser.bump_name();
        parser.bump();
        parser.finish_node();
        parse_type(parser);
    } else if is_static {
        parse_type(parser);
    } else {
        parse_name(parser);
    }
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

/// namespace ::= 'namespace' name (';' | '{' body '}' ';'?)
fn parse_namespace(parser: &mut dyn Parser) -> NodeId {
    let file_scoped = scan_name(parser, 1)
        .map(|end| parser.peek(end).is_punct(Punct::Semicolon))
        .unwrap_or(false);

    if file_scoped {
        parser.start_node(NodeKind::FileScopedNamespace);
        parser.bump();
        parse_name(parser);
        parser.bump();
        parse_namespace_members(parser, false);
        return parser.finish_node();
    }

    parser.start_node(NodeKind::Namespace);
    parser.bump();
    if parser.at_identifier() {
        parse_name(parser);
    } else {
        parser.report_missing("namespace name");
    }
    if parser.expect_punct(Punct::OpenBrace) {
        parse_namespace_members(parser, false);
        parser.expect_punct(Punct::CloseBrace);
        parser.eat_punct(Punct::Semicolon);
    }
    parser.finish_node()
}

fn at_global_attribute(parser: &dyn Parser) -> bool {
    parser.at_punct(Punct::OpenBracket)
        && (parser.peek_contextual(1, Keyword::Assembly) || parser.peek_contextual(1, Keyword::Module))
        && parser.peek(2).is_punct(Punct::Colon)
}

/// Whether a top-level construct is a member rather than a statement
fn at_member_start(parser: &dyn Parser) -> bool {
    match parser.current() {
        Token::Punct(Punct::OpenBracket) => true,
        Token::Keyword(keyword) => match keyword {
            Keyword::Class
            | Keyword::Struct
            | Keyword::Interface
            | Keyword::Enum
            | Keyword::Namespace
            | Keyword::Public
            | Keyword::Private
            | Keyword::Protected
            | Keyword::Internal
            | Keyword::Abstract
            | Keyword::Sealed
            | Keyword::Virtual
            | Keyword::Override
            | Keyword::Event
            | Keyword::Implicit
            | Keyword::Explicit => true,
            Keyword::Delegate => !matches!(
                parser.peek(1),
                Token::Punct(Punct::OpenParen | Punct::OpenBrace | Punct::Star)
            ),
            // `static` and friends also start local functions and locals
            Keyword::Static | Keyword::Unsafe | Keyword::Readonly | Keyword::Extern | Keyword::New | Keyword::Ref => {
                type_declaration_follows(parser)
            }
            _ => keyword.is_predefined_type() && property_shape_follows(parser),
        },
        Token::Identifier => {
            is_record_start(parser, 0)
                || (matches!(
                    contextual_keyword(parser.current_text()),
                    Some(Keyword::Partial | Keyword::Required | Keyword::File)
                ) && contextual_modifier_applies(parser, 0))
                || property_shape_follows(parser)
        }
        _ => false,
    }
}

/// A run of modifiers ending in a type declaration keyword
fn type_declaration_follows(parser: &dyn Parser) -> bool {
    let mut n = 0;
    loop {
        match parser.peek(n) {
            Token::Keyword(keyword) if keyword.is_modifier() => n += 1,
            Token::Identifier
                if matches!(
                    contextual_keyword(parser.peek_text(n)),
                    Some(Keyword::Partial | Keyword::File)
                ) && contextual_modifier_applies(parser, n) =>
            {
                n += 1
            }
            Token::Keyword(Keyword::Class | Keyword::Struct | Keyword::Interface | Keyword::Enum | Keyword::Delegate) => {
                return true
            }
            _ => return is_record_start(parser, n),
        }
    }
}

/// `T Name {` or `T Name =>`: a property at the top of a script
fn property_shape_follows(parser: &dyn Parser) -> bool {
    match scan_type(parser, 0) {
        Some(end) => {
            is_identifier(parser, end)
                && matches!(
                    parser.peek(end + 1),
                    Token::Punct(Punct::OpenBrace | Punct::Arrow)
                )
        }
        None => false,
    }
}

// === ATTRIBUTES ===

/// attribute_list ::= '[' (target ':')? attribute (',' attribute)* ','? ']'
pub fn parse_attribute_list(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::AttributeList);
    parser.bump();

    let is_target = match parser.current() {
        Token::Identifier => contextual_keyword(parser.current_text())
            .map(|keyword| keyword.is_attribute_target())
            .unwrap_or(false),
        Token::Keyword(keyword) => keyword.is_attribute_target(),
        _ => false,
    };
    if is_target && parser.peek(1).is_punct(Punct::Colon) {
        parser.start_node(NodeKind::AttributeTargetSpecifier);
        parser.bump_as(TokenRole::Keyword);
        parser.bump();
        parser.finish_node();
    }

    while !parser.at_punct(Punct::CloseBracket) && !parser.at_end() {
        let before = parser.position();
        parse_attribute(parser);
        if !parser.eat_punct(Punct::Comma) {
            if parser.position() == before {
                skip_token(parser);
            } else {
                break;
            }
        }
    }
    parser.expect_punct(Punct::CloseBracket);
    parser.finish_node()
}

fn parse_attribute(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Attribute);
    parse_name(parser);
    if parser.at_punct(Punct::OpenParen) {
        parser.start_node(NodeKind::AttributeArgumentList);
        parser.bump();
        if !parser.at_punct(Punct::CloseParen) {
            loop {
                parse_attribute_argument(parser);
                if !parser.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        parser.expect_punct(Punct::CloseParen);
        parser.finish_node();
    }
    parser.finish_node()
}

/// attribute_argument ::= (identifier '=' | identifier ':')? expression
fn parse_attribute_argument(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::AttributeArgument);
    if is_identifier(parser, 0) {
        match parser.peek(1) {
            Token::Punct(Punct::Eq) => {
                parser.start_node(NodeKind::NameEquals);
                parse_identifier_name(parser);
                parser.bump();
                parser.finish_node();
            }
            Token::Punct(Punct::Colon) => {
                parser.start_node(NodeKind::NameColon);
                parse_identifier_name(parser);
                parser.bump();
                parser.finish_node();
            }
            _ => {}
        }
    }
    parse_expression(parser);
    parser.finish_node()
}

// === MEMBERS ===

fn bump_member_modifiers(parser: &mut dyn Parser) {
    loop {
        match parser.current() {
            Token::Keyword(keyword) if keyword.is_modifier() => {
                if keyword == Keyword::Fixed && !at_type_start_after(parser, 1) {
                    return;
                }
                parser.bump();
            }
            Token::Identifier => {
                let contextual = contextual_keyword(parser.current_text());
                let modifier = matches!(
                    contextual,
                    Some(Keyword::Partial | Keyword::Async | Keyword::Required | Keyword::File)
                ) && contextual_modifier_applies(parser, 0);
                if !modifier {
                    return;
                }
                parser.bump_as(TokenRole::Keyword);
            }
            _ => return,
        }
    }
}

fn at_type_start_after(parser: &dyn Parser, n: usize) -> bool {
    scan_type(parser, n).is_some()
}

/// member ::= attribute_list* modifier* (type_declaration | member_body)
pub fn parse_member(parser: &mut dyn Parser) -> NodeId {
    if !parser.enter() {
        return skip_token(parser);
    }
    let checkpoint = parser.checkpoint();
    let before = parser.position();
    while parser.at_punct(Punct::OpenBracket) {
        parse_attribute_list(parser);
    }
    bump_member_modifiers(parser);
    let has_prefix = parser.position() != before;
    let node = parse_member_body(parser, checkpoint, has_prefix);
    parser.exit();
    node
}

fn parse_member_body(parser: &mut dyn Parser, checkpoint: Checkpoint, has_prefix: bool) -> NodeId {
    match parser.current() {
        Token::Keyword(Keyword::Class) => parse_type_declaration(parser, checkpoint, NodeKind::Class),
        Token::Keyword(Keyword::Struct) => parse_type_declaration(parser, checkpoint, NodeKind::Struct),
        Token::Keyword(Keyword::Interface) => {
            parse_type_declaration(parser, checkpoint, NodeKind::Interface)
        }
        Token::Keyword(Keyword::Enum) => parse_enum(parser, checkpoint),
        Token::Keyword(Keyword::Delegate) if !parser.peek(1).is_punct(Punct::Star) => {
            parse_delegate(parser, checkpoint)
        }
        Token::Keyword(Keyword::Namespace) if !has_prefix => parse_namespace(parser),
        Token::Keyword(Keyword::Event) => parse_event(parser, checkpoint),
        Token::Keyword(Keyword::Implicit | Keyword::Explicit) => {
            parse_conversion_operator(parser, checkpoint)
        }
        Token::Punct(Punct::Tilde) => parse_destructor(parser, checkpoint),
        Token::Identifier if is_record_start(parser, 0) => parse_record(parser, checkpoint),
        Token::Identifier if parser.peek(1).is_punct(Punct::OpenParen) => {
            parse_constructor(parser, checkpoint)
        }
        _ if at_type_start(parser) => parse_typed_member(parser, checkpoint),
        _ => {
            parser.start_node_at(checkpoint, NodeKind::IncompleteMember);
            if !has_prefix {
                skip_token(parser);
            }
            parser.finish_node()
        }
    }
}

/// Members that start with a type: methods, properties, fields,
/// indexers and operators
fn parse_typed_member(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    let type_checkpoint = parser.checkpoint();
    parse_type(parser);

    if parser.at_keyword(Keyword::Operator) {
        parser.start_node_at(checkpoint, NodeKind::Operator);
        return parse_operator_rest(parser);
    }

    let has_interface = parse_explicit_interface(parser);

    if parser.at_keyword(Keyword::This) {
        parser.start_node_at(checkpoint, NodeKind::Indexer);
        parser.bump();
        parse_bracketed_parameter_list(parser);
        parse_property_body(parser);
        return parser.finish_node();
    }
    if parser.at_keyword(Keyword::Operator) {
        parser.start_node_at(checkpoint, NodeKind::Operator);
        return parse_operator_rest(parser);
    }

    if !parser.at_identifier() {
        parser.start_node_at(checkpoint, NodeKind::IncompleteMember);
        parser.report_missing("identifier");
        return parser.finish_node();
    }

    match parser.peek(1) {
        Token::Punct(Punct::OpenParen | Punct::Lt) => {
            let name = parser.peek_index(0);
            parser.bump();
            parser.start_node_at(checkpoint, NodeKind::Method);
            parser.set_name(name);
            if parser.at_punct(Punct::Lt) {
                parse_type_parameter_list(parser);
            }
            parse_function_tail(parser);
            parser.finish_node()
        }
        Token::Punct(Punct::OpenBrace | Punct::Arrow) => {
            let name = parser.peek_index(0);
            parser.bump();
            parser.start_node_at(checkpoint, NodeKind::Property);
            parser.set_name(name);
            parse_property_body(parser);
            parser.finish_node()
        }
        _ if !has_interface => {
            parser.start_node_at(type_checkpoint, NodeKind::VariableDeclaration);
            parse_variable_declarators(parser);
            parser.finish_node();
            parser.start_node_at(checkpoint, NodeKind::Field);
            parser.expect_punct(Punct::Semicolon);
            parser.finish_node()
        }
        _ => {
            let name = parser.peek_index(0);
            parser.bump();
            parser.start_node_at(checkpoint, NodeKind::IncompleteMember);
            parser.set_name(name);
            parser.finish_node()
        }
    }
}

/// `IFoo.` or `IFoo<T>.` ahead of a member name, `this` or `operator`
fn parse_explicit_interface(parser: &mut dyn Parser) -> bool {
    let Some(end) = scan_name(parser, 0) else {
        return false;
    };
    let (interface_len, dot) = if parser.peek(end).is_punct(Punct::Dot)
        && matches!(parser.peek(end + 1), Token::Keyword(Keyword::This | Keyword::Operator))
    {
        (end, end)
    } else if end >= 3 && parser.peek(end - 2).is_punct(Punct::Dot) && is_identifier(parser, end - 1) {
        (end - 2, end - 2)
    } else {
        return false;
    };
    if dot == 0 {
        return false;
    }

    parser.start_node(NodeKind::ExplicitInterfaceSpecifier);
    let start = parser.position();
    let checkpoint = parser.checkpoint();
    parse_simple_name(parser, NameContext::Type);
    while parser.position() - start < interface_len && parser.at_punct(Punct::Dot) {
        parser.start_node_at(checkpoint, NodeKind::QualifiedName);
        parser.bump();
        parse_simple_name(parser, NameContext::Type);
        parser.finish_node();
    }
    parser.expect_punct(Punct::Dot);
    parser.finish_node();
    true
}

/// Parameters, constraints and body shared by methods and local functions
pub fn parse_function_tail(parser: &mut dyn Parser) {
    if parser.at_punct(Punct::OpenParen) {
        parse_parameter_list(parser);
    } else {
        parser.report_missing("(");
    }
    parse_constraint_clauses(parser);
    parse_function_body(parser);
}

/// body ::= block | '=>' expression ';' | ';'
fn parse_function_body(parser: &mut dyn Parser) {
    match parser.current() {
        Token::Punct(Punct::OpenBrace) => {
            parse_block(parser);
        }
        Token::Punct(Punct::Arrow) => {
            parse_arrow_clause(parser);
            parser.expect_punct(Punct::Semicolon);
        }
        _ => {
            parser.expect_punct(Punct::Semicolon);
        }
    }
}

fn parse_arrow_clause(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::ArrowExpressionClause);
    parser.bump();
    if parser.at_keyword(Keyword::Ref) {
        parser.start_node(NodeKind::RefExpression);
        parser.bump();
        parse_expression(parser);
        parser.finish_node();
    } else {
        parse_expression(parser);
    }
    parser.finish_node()
}

fn parse_constructor(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    let name = parser.peek_index(0);
    parser.bump();
    parser.start_node_at(checkpoint, NodeKind::Constructor);
    parser.set_name(name);
    parse_parameter_list(parser);
    if parser.at_punct(Punct::Colon) {
        parser.start_node(NodeKind::ConstructorInitializer);
        parser.bump();
        if matches!(parser.current(), Token::Keyword(Keyword::Base | Keyword::This)) {
            parser.bump();
        } else {
            parser.report_missing("base or this");
        }
        if parser.at_punct(Punct::OpenParen) {
            parse_argument_list(parser);
        }
        parser.finish_node();
    }
    parse_function_body(parser);
    parser.finish_node()
}

fn parse_destructor(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    parser.start_node_at(checkpoint, NodeKind::Destructor);
    parser.bump();
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    parse_parameter_list(parser);
    parse_function_body(parser);
    parser.finish_node()
}

/// After the return type: 'operator' 'checked'? op parameter_list body
fn parse_operator_rest(parser: &mut dyn Parser) -> NodeId {
    parser.bump();
    parser.eat_keyword(Keyword::Checked);
    match parser.current() {
        Token::Punct(Punct::Gt) => {
            let mut count = 1;
            while count < 3 && parser.adjacent(count - 1) && parser.peek(count).is_punct(Punct::Gt) {
                count += 1;
            }
            for _ in 0..count {
                parser.bump();
            }
        }
        Token::Punct(_) | Token::Keyword(Keyword::True | Keyword::False) => parser.bump(),
        _ => parser.report_missing("operator"),
    }
    parse_parameter_list(parser);
    parse_function_body(parser);
    parser.finish_node()
}

fn parse_conversion_operator(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    parser.start_node_at(checkpoint, NodeKind::ConversionOperator);
    parser.bump();
    parse_explicit_interface(parser);
    parser.expect_keyword(Keyword::Operator);
    parser.eat_keyword(Keyword::Checked);
    parse_type(parser);
    parse_parameter_list(parser);
    parse_function_body(parser);
    parser.finish_node()
}

/// Accessor list or expression body, then an optional initializer
fn parse_property_body(parser: &mut dyn Parser) {
    if parser.at_punct(Punct::Arrow) {
        parse_arrow_clause(parser);
        parser.expect_punct(Punct::Semicolon);
        return;
    }
    if parser.at_punct(Punct::OpenBrace) {
        parse_accessor_list(parser);
    } else {
        parser.report_missing("{");
    }
    if parser.at_punct(Punct::Eq) {
        parse_equals_value(parser);
        parser.expect_punct(Punct::Semicolon);
    }
}

fn is_accessor_keyword(parser: &dyn Parser) -> bool {
    [Keyword::Get, Keyword::Set, Keyword::Init, Keyword::Add, Keyword::Remove]
        .into_iter()
        .any(|keyword| parser.at_contextual(keyword))
}

/// accessor_list ::= '{' accessor* '}'
fn parse_accessor_list(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::AccessorList);
    parser.bump();
    while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        parser.start_node(NodeKind::Accessor);
        while parser.at_punct(Punct::OpenBracket) {
            parse_attribute_list(parser);
        }
        while matches!(parser.current(), Token::Keyword(keyword) if keyword.is_modifier()) {
            parser.bump();
        }
        if is_accessor_keyword(parser) {
            parser.bump_as(TokenRole::Keyword);
            parse_function_body(parser);
        } else if parser.position() == before {
            skip_token(parser);
        } else {
            parser.report_missing("accessor");
        }
        parser.finish_node();
    }
    parser.expect_punct(Punct::CloseBrace);
    parser.finish_node()
}

fn parse_event(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    parser.bump();
    let type_checkpoint = parser.checkpoint();
    parse_type(parser);
    let has_interface = parse_explicit_interface(parser);

    if parser.at_identifier() && (has_interface || parser.peek(1).is_punct(Punct::OpenBrace)) {
        let name = parser.peek_index(0);
        parser.bump();
        parser.start_node_at(checkpoint, NodeKind::Event);
        parser.set_name(name);
        if parser.at_punct(Punct::OpenBrace) {
            parse_accessor_list(parser);
        } else {
            parser.expect_punct(Punct::Semicolon);
        }
        return parser.finish_node();
    }

    parser.start_node_at(type_checkpoint, NodeKind::VariableDeclaration);
    parse_variable_declarators(parser);
    parser.finish_node();
    parser.start_node_at(checkpoint, NodeKind::EventField);
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

// === TYPE DECLARATIONS ===

fn bump_type_name(parser: &mut dyn Parser) {
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
}

fn parse_type_declaration(parser: &mut dyn Parser, checkpoint: Checkpoint, kind: NodeKind) -> NodeId {
    parser.start_node_at(checkpoint, kind);
    parser.bump();
    parse_type_declaration_rest(parser);
    parser.finish_node()
}

/// `record`, `record class` or `record struct`
fn parse_record(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    let kind = if parser.peek(1).is_keyword(Keyword::Struct) {
        NodeKind::RecordStruct
    } else {
        NodeKind::Record
    };
    parser.start_node_at(checkpoint, kind);
    parser.bump_as(TokenRole::Keyword);
    if matches!(parser.current(), Token::Keyword(Keyword::Class | Keyword::Struct)) {
        parser.bump();
    }
    parse_type_declaration_rest(parser);
    parser.finish_node()
}

/// name type_parameters? parameters? base_list? constraints* body
fn parse_type_declaration_rest(parser: &mut dyn Parser) {
    bump_type_name(parser);
    if parser.at_punct(Punct::Lt) {
        parse_type_parameter_list(parser);
    }
    if parser.at_punct(Punct::OpenParen) {
        parse_parameter_list(parser);
    }
    if parser.at_punct(Punct::Colon) {
        parse_base_list(parser);
    }
    parse_constraint_clauses(parser);

    if parser.eat_punct(Punct::Semicolon) {
        return;
    }
    if parser.expect_punct(Punct::OpenBrace) {
        parse_type_members(parser);
        parser.expect_punct(Punct::CloseBrace);
        parser.eat_punct(Punct::Semicolon);
    }
}

fn parse_type_members(parser: &mut dyn Parser) {
    while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        parse_member(parser);
        if parser.position() == before {
            skip_token(parser);
        }
    }
}

/// base_list ::= ':' type argument_list? (',' type)*
fn parse_base_list(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::BaseList);
    parser.bump();
    loop {
        parse_type(parser);
        if parser.at_punct(Punct::OpenParen) {
            parse_argument_list(parser);
        }
        if !parser.eat_punct(Punct::Comma) {
            break;
        }
    }
    parser.finish_node()
}

fn parse_enum(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    parser.start_node_at(checkpoint, NodeKind::Enum);
    parser.bump();
    bump_type_name(parser);
    if parser.at_punct(Punct::Colon) {
        parse_base_list(parser);
    }
    if parser.expect_punct(Punct::OpenBrace) {
        while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
            let before = parser.position();
            parser.start_node(NodeKind::EnumMember);
            while parser.at_punct(Punct::OpenBracket) {
                parse_attribute_list(parser);
            }
            bump_type_name(parser);
            if parser.at_punct(Punct::Eq) {
                parse_equals_value(parser);
            }
            parser.finish_node();
            if !parser.eat_punct(Punct::Comma) {
                if parser.position() == before {
                    skip_token(parser);
                } else {
                    break;
                }
            }
        }
        parser.expect_punct(Punct::CloseBrace);
        parser.eat_punct(Punct::Semicolon);
    }
    parser.finish_node()
}

fn parse_delegate(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    parser.start_node_at(checkpoint, NodeKind::Delegate);
    parser.bump();
    parse_type(parser);
    bump_type_name(parser);
    if parser.at_punct(Punct::Lt) {
        parse_type_parameter_list(parser);
    }
    if parser.at_punct(Punct::OpenParen) {
        parse_parameter_list(parser);
    } else {
        parser.report_missing("(");
    }
    parse_constraint_clauses(parser);
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

// === TYPE PARAMETERS ===

/// type_parameter_list ::= '<' attribute_list* ('in' | 'out')? identifier (',' ...)* '>'
pub fn parse_type_parameter_list(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::TypeParameterList);
    parser.bump_as(TokenRole::Punctuation);
    loop {
        parser.start_node(NodeKind::TypeParameter);
        while parser.at_punct(Punct::OpenBracket) {
            parse_attribute_list(parser);
        }
        if matches!(parser.current(), Token::Keyword(Keyword::In | Keyword::Out)) {
            parser.bump();
        }
        bump_type_name(parser);
        parser.finish_node();
        if !parser.eat_punct(Punct::Comma) {
            break;
        }
    }
    if parser.at_punct(Punct::Gt) {
        parser.bump_as(TokenRole::Punctuation);
    } else {
        parser.report_missing(">");
    }
    parser.finish_node()
}

/// constraint_clause ::= 'where' identifier ':' constraint (',' constraint)*
fn parse_constraint_clauses(parser: &mut dyn Parser) {
    while parser.at_contextual(Keyword::Where) && is_identifier(parser, 1) && parser.peek(2).is_punct(Punct::Colon) {
        parser.start_node(NodeKind::ConstraintClause);
        parser.bump_as(TokenRole::Keyword);
        parse_identifier_name(parser);
        parser.bump();
        loop {
            parse_constraint(parser);
            if !parser.eat_punct(Punct::Comma) {
                break;
            }
        }
        parser.finish_node();
    }
}

fn parse_constraint(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Constraint);
    let standalone = matches!(
        parser.peek(1),
        Token::Punct(Punct::Comma | Punct::OpenBrace | Punct::Semicolon | Punct::Arrow) | Token::Eof
    ) || parser.peek_contextual(1, Keyword::Where);

    match parser.current() {
        Token::Keyword(Keyword::Class | Keyword::Struct | Keyword::Default) => {
            parser.bump();
            parser.eat_punct(Punct::Question);
        }
        Token::Keyword(Keyword::New) => {
            parser.bump();
            parser.expect_punct(Punct::OpenParen);
            parser.expect_punct(Punct::CloseParen);
        }
        Token::Identifier
            if standalone
                && (parser.at_contextual(Keyword::Unmanaged) || parser.at_contextual(Keyword::Notnull)) =>
        {
            parser.bump_as(TokenRole::Keyword);
        }
        _ => {
            parse_type(parser);
        }
    }
    parser.finish_node()
}

// === PARAMETERS ===

fn at_parameter_modifier(parser: &dyn Parser) -> bool {
    match parser.current() {
        Token::Keyword(
            Keyword::Ref | Keyword::Out | Keyword::In | Keyword::Params | Keyword::This | Keyword::Readonly,
        ) => true,
        Token::Identifier => {
            parser.at_contextual(Keyword::Scoped)
                && (parser.peek(1).is_keyword(Keyword::Ref)
                    || scan_type(parser, 1)
                        .map(|end| is_identifier(parser, end))
                        .unwrap_or(false))
        }
        _ => false,
    }
}

fn parse_parameter(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Parameter);
    while parser.at_punct(Punct::OpenBracket) {
        parse_attribute_list(parser);
    }
    while at_parameter_modifier(parser) {
        if parser.at_identifier() {
            parser.bump_as(TokenRole::Keyword);
        } else {
            parser.bump();
        }
    }

    let untyped = parser.at_identifier()
        && matches!(
            parser.peek(1),
            Token::Punct(Punct::Comma | Punct::CloseParen | Punct::CloseBracket | Punct::Eq)
        );
    if !untyped {
        parse_type(parser);
    }
    if parser.at_identifier() {
        parser.bump_name();
    } else if !untyped {
        parser.report_missing("identifier");
    }
    if parser.at_punct(Punct::Eq) {
        parse_equals_value(parser);
    }
    parser.finish_node()
}

fn parse_parameters(parser: &mut dyn Parser, kind: NodeKind, close: Punct) -> NodeId {
    parser.start_node(kind);
    parser.bump();
    if !parser.at_punct(close) {
        loop {
            let before = parser.position();
            parse_parameter(parser);
            if !parser.eat_punct(Punct::Comma) {
                if parser.position() == before && !parser.at_end() && !parser.at_punct(close) {
                    skip_token(parser);
                    continue;
                }
                break;
            }
        }
    }
    parser.expect_punct(close);
    parser.finish_node()
}

/// parameter_list ::= '(' (parameter (',' parameter)*)? ')'
pub fn parse_parameter_list(parser: &mut dyn Parser) -> NodeId {
    if !parser.at_punct(Punct::OpenParen) {
        parser.start_node(NodeKind::ParameterList);
        parser.report_missing("(");
        return parser.finish_node();
    }
    parse_parameters(parser, NodeKind::ParameterList, Punct::CloseParen)
}

fn parse_bracketed_parameter_list(parser: &mut dyn Parser) -> NodeId {
    if !parser.at_punct(Punct::OpenBracket) {
        parser.start_node(NodeKind::BracketedParameterList);
        parser.report_missing("[");
        return parser.finish_node();
    }
    parse_parameters(parser, NodeKind::BracketedParameterList, Punct::CloseBracket)
}

#[cfg(test)]
mod tests {
    use crate::syntax::test_support::render_unit;

    #[test]
    fn test_class_with_members() {
        assert_eq!(
            render_unit("class C<T> : Base where T : class { int f; void M() { } }"),
            "(CompilationUnit (Class class C (TypeParameterList < (TypeParameter T) >) \
             (BaseList : (IdentifierName Base)) (ConstraintClause where (IdentifierName T) : \
             (Constraint class)) { (Field (VariableDeclaration (PredefinedType int) \
             (VariableDeclarator f)) ;) (Method (PredefinedType void) M (ParameterList ( )) \
             (Block { })) }))"
        );
    }

    #[test]
    fn test_properties_and_accessors() {
        assert_eq!(
            render_unit("class C { public int P { get; private set; } = 1; }"),
            "(CompilationUnit (Class class C { (Property public (PredefinedType int) P (AccessorList { \
             (Accessor get ;) (Accessor private set ;) }) (EqualsValueClause = (Literal 1)) ;) }))"
        );
    }

    #[test]
    fn test_usings_and_file_scoped_namespace() {
        assert_eq!(
            render_unit("using System; using X = System.Int32; namespace N;"),
            "(CompilationUnit (UsingDirective using (IdentifierName System) ;) (UsingDirective using \
             (NameEquals X =) (QualifiedName (IdentifierName System) . (IdentifierName Int32)) ;) \
             (FileScopedNamespace namespace (IdentifierName N) ;))"
        );
    }

    #[test]
    fn test_records_enums_and_delegates() {
        assert_eq!(
            render_unit("record struct P(int X); enum E { A = 1, B } delegate void D();"),
            "(CompilationUnit (RecordStruct record struct P (ParameterList ( (Parameter \
             (PredefinedType int) X) )) ;) (Enum enum E { (EnumMember A (EqualsValueClause = \
             (Literal 1))) , (EnumMember B) }) (Delegate delegate (PredefinedType void) D \
             (ParameterList ( )) ;))"
        );
    }

    #[test]
    fn test_attributes_constructor_and_operator() {
        assert_eq!(
            render_unit("[Obsolete] class C { C() : base() { } public static C operator +(C a, C b) => a; }"),
            "(CompilationUnit (Class (AttributeList [ (Attribute (IdentifierName Obsolete)) ]) class C { \
             (Constructor C (ParameterList ( )) (ConstructorInitializer : base (ArgumentList ( ))) \
             (Block { })) (Operator public static (IdentifierName C) operator + (ParameterList ( \
             (Parameter (IdentifierName C) a) , (Parameter (IdentifierName C) b) )) \
             (ArrowExpressionClause => (IdentifierName a)) ;) }))"
        );
    }

    #[test]
    fn test_top_level_statements() {
        assert_eq!(
            render_unit("var x = 1;\nclass C { }"),
            "(CompilationUnit (GlobalStatement (LocalDeclaration (VariableDeclaration (IdentifierName var) \
             (VariableDeclarator x (EqualsValueClause = (Literal 1)))) ;)) (Class class C { }))"
        );
    }

    #[test]
    fn test_modified_type_at_top_level_is_a_member() {
        let rendered = render_unit("static class E { } static int F() => 1;");
        assert!(rendered.starts_with("(CompilationUnit (Class static class E { }) (GlobalStatement"));
    }

    #[test]
    fn test_truncated_class_body_keeps_members() {
        assert_eq!(
            render_unit("class C { void M() {"),
            "(CompilationUnit (Class class C { (Method (PredefinedType void) M (ParameterList ( )) (Block {))))"
        );
    }
}
