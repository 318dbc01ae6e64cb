//! Expression productions
//!
//! Binary operators use precedence climbing over [`binary_operator`];
//! everything left-recursive (member access, invocation, binary operators)
//! is wrapped after the fact through a checkpoint. The lexer never joins
//! `>` with a following `>`, so shifts are recognised here from adjacent
//! tokens.

use crate::grammar::ast::{Checkpoint, NodeId, NodeKind, TokenRole};
use crate::grammar::builders::atomic::{
    missing_node, parse_alias_name, parse_identifier_name, parse_simple_name, skip_token,
    NameContext, Parser,
};
use crate::grammar::builders::declarations::parse_parameter_list;
use crate::grammar::builders::helpers::{
    can_start_operand, is_cast, is_identifier, is_lambda_start, is_query_start, matching_close,
    scan_type,
};
use crate::grammar::builders::patterns::{parse_pattern, parse_when_clause};
use crate::grammar::builders::statements::parse_block;
use crate::grammar::builders::types::{parse_type, parse_type_in, TypeContext};
use crate::grammar::keywords::Keyword;
use crate::tokens::{Punct, Token};

// === PRECEDENCE ===

pub const PREC_COALESCE: u8 = 1;
pub const PREC_RELATIONAL: u8 = 8;
pub const PREC_SHIFT: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorShape {
    Plain,
    Is,
    As,
}

#[derive(Debug, Clone, Copy)]
struct BinaryOperator {
    precedence: u8,
    token_count: usize,
    right_associative: bool,
    shape: OperatorShape,
}

impl BinaryOperator {
    fn plain(precedence: u8, token_count: usize) -> Self {
        Self {
            precedence,
            token_count,
            right_associative: false,
            shape: OperatorShape::Plain,
        }
    }
}

/// Number of adjacent `>` tokens starting at the cursor, up to three
fn adjacent_greater_thans(parser: &dyn Parser) -> usize {
    let mut count = 1;
    while count < 3 && parser.adjacent(count - 1) && parser.peek(count).is_punct(Punct::Gt) {
        count += 1;
    }
    count
}

/// `>>=` and `>>>=` arrive as `>`s followed by an adjacent `>=`
fn split_shift_assignment(parser: &dyn Parser) -> Option<usize> {
    if !parser.at_punct(Punct::Gt) {
        return None;
    }
    let count = adjacent_greater_thans(parser);
    (parser.adjacent(count - 1) && parser.peek(count).is_punct(Punct::GtEq)).then_some(count + 1)
}

fn binary_operator(parser: &dyn Parser) -> Option<BinaryOperator> {
    let operator = match parser.current() {
        Token::Punct(punct) => match punct {
            Punct::QuestionQuestion => BinaryOperator {
                right_associative: true,
                ..BinaryOperator::plain(PREC_COALESCE, 1)
            },
            Punct::PipePipe => BinaryOperator::plain(2, 1),
            Punct::AmpAmp => BinaryOperator::plain(3, 1),
            Punct::Pipe => BinaryOperator::plain(4, 1),
            Punct::Caret => BinaryOperator::plain(5, 1),
            Punct::Amp => BinaryOperator::plain(6, 1),
            Punct::EqEq | Punct::BangEq => BinaryOperator::plain(7, 1),
            Punct::Lt | Punct::LtEq | Punct::GtEq => BinaryOperator::plain(PREC_RELATIONAL, 1),
            Punct::Gt => {
                if split_shift_assignment(parser).is_some() {
                    return None;
                }
                match adjacent_greater_thans(parser) {
                    1 => BinaryOperator::plain(PREC_RELATIONAL, 1),
                    count => BinaryOperator::plain(PREC_SHIFT, count),
                }
            }
            Punct::LtLt => BinaryOperator::plain(PREC_SHIFT, 1),
            Punct::Plus | Punct::Minus => BinaryOperator::plain(10, 1),
            Punct::Star | Punct::Slash | Punct::Percent => BinaryOperator::plain(11, 1),
            _ => return None,
        },
        Token::Keyword(Keyword::Is) => BinaryOperator {
            shape: OperatorShape::Is,
            ..BinaryOperator::plain(PREC_RELATIONAL, 1)
        },
        Token::Keyword(Keyword::As) => BinaryOperator {
            shape: OperatorShape::As,
            ..BinaryOperator::plain(PREC_RELATIONAL, 1)
        },
        _ => return None,
    };
    Some(operator)
}

fn assignment_operator_len(parser: &dyn Parser) -> Option<usize> {
    match parser.current() {
        Token::Punct(punct) if punct.is_assignment() => Some(1),
        Token::Punct(Punct::Gt) => split_shift_assignment(parser),
        _ => None,
    }
}

// === ENTRY POINTS ===

/// expression ::= assignment | lambda | query | throw_expression
pub fn parse_expression(parser: &mut dyn Parser) -> NodeId {
    if !parser.enter() {
        return skip_token(parser);
    }
    let node = parse_assignment(parser);
    parser.exit();
    node
}

fn parse_assignment(parser: &mut dyn Parser) -> NodeId {
    if is_lambda_start(parser, 0) {
        return parse_lambda(parser);
    }
    if is_query_start(parser, 0) {
        return parse_query_expression(parser);
    }
    if parser.at_keyword(Keyword::Throw) {
        parser.start_node(NodeKind::ThrowExpression);
        parser.bump();
        parse_expression(parser);
        return parser.finish_node();
    }

    let checkpoint = parser.checkpoint();
    let target = parse_conditional(parser);
    match assignment_operator_len(parser) {
        Some(count) => {
            parser.start_node_at(checkpoint, NodeKind::Assignment);
            for _ in 0..count {
                parser.bump();
            }
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
        None => target,
    }
}

fn parse_conditional(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    let condition = parse_binary_expression(parser, PREC_COALESCE);
    if !parser.at_punct(Punct::Question) {
        return condition;
    }

    parser.start_node_at(checkpoint, NodeKind::Conditional);
    parser.bump();
    parse_branch(parser);
    if parser.at_punct(Punct::Colon) {
        parser.bump_as(TokenRole::Operator);
    } else {
        parser.report_missing(":");
    }
    parse_branch(parser);
    parser.finish_node()
}

fn parse_branch(parser: &mut dyn Parser) {
    if parser.at_keyword(Keyword::Ref) {
        parser.start_node(NodeKind::RefExpression);
        parser.bump();
        parse_expression(parser);
        parser.finish_node();
    } else {
        parse_expression(parser);
    }
}

/// Binary operators binding at least as tightly as `min_precedence`
pub fn parse_binary_expression(parser: &mut dyn Parser, min_precedence: u8) -> NodeId {
    let checkpoint = parser.checkpoint();
    let mut left = parse_unary(parser);

    while let Some(operator) = binary_operator(parser) {
        if operator.precedence < min_precedence {
            break;
        }
        left = match operator.shape {
            OperatorShape::Is => {
                parser.start_node_at(checkpoint, NodeKind::IsExpression);
                parser.bump();
                parse_pattern(parser);
                parser.finish_node()
            }
            OperatorShape::As => {
                parser.start_node_at(checkpoint, NodeKind::AsExpression);
                parser.bump();
                parse_type_in(parser, TypeContext::Expression);
                parser.finish_node()
            }
            OperatorShape::Plain => {
                parser.start_node_at(checkpoint, NodeKind::Binary);
                for _ in 0..operator.token_count {
                    parser.bump();
                }
                let next = if operator.right_associative {
                    operator.precedence
                } else {
                    operator.precedence + 1
                };
                parse_binary_expression(parser, next);
                parser.finish_node()
            }
        };
    }
    left
}

// === UNARY ===

fn parse_unary(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    let mut operand = parse_prefix(parser);

    loop {
        if parser.at_punct(Punct::DotDot) {
            parser.start_node_at(checkpoint, NodeKind::RangeExpression);
            parser.bump();
            if can_start_operand(parser, 0) || parser.at_punct(Punct::Caret) {
                parse_prefix(parser);
            }
            operand = parser.finish_node();
        } else if parser.at_keyword(Keyword::Switch) {
            operand = parse_switch_expression(parser, checkpoint);
        } else if parser.at_contextual(Keyword::With) && parser.peek(1).is_punct(Punct::OpenBrace) {
            parser.start_node_at(checkpoint, NodeKind::WithExpression);
            parser.bump_as(TokenRole::Keyword);
            parse_initializer(parser);
            operand = parser.finish_node();
        } else {
            return operand;
        }
    }
}

/// `await` followed by something it can apply to
fn await_has_operand(parser: &dyn Parser) -> bool {
    can_start_operand(parser, 1)
}

fn parse_prefix(parser: &mut dyn Parser) -> NodeId {
    if !parser.enter() {
        return skip_token(parser);
    }
    let node = parse_prefix_inner(parser);
    parser.exit();
    node
}

fn parse_prefix_inner(parser: &mut dyn Parser) -> NodeId {
    match parser.current() {
        Token::Punct(
            Punct::Plus
            | Punct::Minus
            | Punct::Bang
            | Punct::Tilde
            | Punct::PlusPlus
            | Punct::MinusMinus
            | Punct::Amp
            | Punct::Star
            | Punct::Caret,
        ) => {
            parser.start_node(NodeKind::PrefixUnary);
            parser.bump();
            parse_prefix(parser);
            parser.finish_node()
        }
        Token::Punct(Punct::DotDot) => {
            parser.start_node(NodeKind::RangeExpression);
            parser.bump();
            if can_start_operand(parser, 0) || parser.at_punct(Punct::Caret) {
                parse_prefix(parser);
            }
            parser.finish_node()
        }
        Token::Punct(Punct::OpenParen) if is_cast(parser, 0) => {
            parser.start_node(NodeKind::Cast);
            parser.bump();
            parse_type_in(parser, TypeContext::Expression);
            parser.expect_punct(Punct::CloseParen);
            parse_prefix(parser);
            parser.finish_node()
        }
        Token::Keyword(Keyword::Ref) => {
            parser.start_node(NodeKind::RefExpression);
            parser.bump();
            parse_prefix(parser);
            parser.finish_node()
        }
        Token::Identifier if parser.at_contextual(Keyword::Await) && await_has_operand(parser) => {
            parser.start_node(NodeKind::AwaitExpression);
            parser.bump_as(TokenRole::Keyword);
            parse_prefix(parser);
            parser.finish_node()
        }
        _ => parse_postfix(parser),
    }
}

// === POSTFIX ===

fn parse_postfix(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    let mut expression = parse_primary(parser);

    loop {
        expression = match parser.current() {
            Token::Punct(Punct::Dot | Punct::MinusGt) => {
                parser.start_node_at(checkpoint, NodeKind::MemberAccess);
                parser.bump();
                parse_simple_name(parser, NameContext::Expression);
                parser.finish_node()
            }
            Token::Punct(Punct::Question) if parser.peek(1).is_punct(Punct::Dot) => {
                parser.start_node_at(checkpoint, NodeKind::MemberAccess);
                parser.bump();
                parser.bump();
                parse_simple_name(parser, NameContext::Expression);
                parser.finish_node()
            }
            Token::Punct(Punct::Question)
                if parser.adjacent(0) && parser.peek(1).is_punct(Punct::OpenBracket) =>
            {
                parser.start_node_at(checkpoint, NodeKind::ElementAccess);
                parser.bump();
                parse_bracketed_argument_list(parser);
                parser.finish_node()
            }
            Token::Punct(Punct::OpenParen) => {
                parser.start_node_at(checkpoint, NodeKind::Invocation);
                parse_argument_list(parser);
                parser.finish_node()
            }
            Token::Punct(Punct::OpenBracket) => {
                parser.start_node_at(checkpoint, NodeKind::ElementAccess);
                parse_bracketed_argument_list(parser);
                parser.finish_node()
            }
            Token::Punct(Punct::PlusPlus | Punct::MinusMinus | Punct::Bang) => {
                parser.start_node_at(checkpoint, NodeKind::PostfixUnary);
                parser.bump();
                parser.finish_node()
            }
            _ => return expression,
        };
    }
}

// === PRIMARY ===

fn parse_primary(parser: &mut dyn Parser) -> NodeId {
    match parser.current() {
        Token::Number
        | Token::Char
        | Token::String(_)
        | Token::Keyword(Keyword::True | Keyword::False | Keyword::Null) => {
            parser.start_node(NodeKind::Literal);
            parser.bump();
            parser.finish_node()
        }
        Token::Keyword(Keyword::Default) => {
            if parser.peek(1).is_punct(Punct::OpenParen) {
                parse_parenthesized_type_operator(parser, NodeKind::DefaultExpression)
            } else {
                parser.start_node(NodeKind::Literal);
                parser.bump();
                parser.finish_node()
            }
        }
        Token::InterpolatedStart(_) => parse_interpolated_string(parser),
        Token::Keyword(Keyword::This) => single_token_node(parser, NodeKind::ThisExpression),
        Token::Keyword(Keyword::Base) => single_token_node(parser, NodeKind::BaseExpression),
        Token::Keyword(Keyword::Typeof) => parse_parenthesized_type_operator(parser, NodeKind::TypeOf),
        Token::Keyword(Keyword::Sizeof) => parse_parenthesized_type_operator(parser, NodeKind::SizeOf),
        Token::Keyword(Keyword::Checked | Keyword::Unchecked) => {
            parser.start_node(NodeKind::CheckedExpression);
            parser.bump();
            if parser.expect_punct(Punct::OpenParen) {
                parse_expression(parser);
                parser.expect_punct(Punct::CloseParen);
            }
            parser.finish_node()
        }
        Token::Keyword(Keyword::New) => parse_new(parser),
        Token::Keyword(Keyword::Stackalloc) => parse_stackalloc(parser),
        Token::Keyword(Keyword::Delegate) => parse_anonymous_method(parser),
        Token::Keyword(keyword) if keyword.is_predefined_type() => {
            single_token_node(parser, NodeKind::PredefinedType)
        }
        Token::Punct(Punct::OpenParen) => parse_parenthesized_or_tuple(parser),
        Token::Punct(Punct::OpenBracket) => parse_collection_expression(parser),
        Token::Identifier => parse_identifier_primary(parser),
        _ => missing_node(parser, NodeKind::IdentifierName, "expression"),
    }
}

fn single_token_node(parser: &mut dyn Parser, kind: NodeKind) -> NodeId {
    parser.start_node(kind);
    parser.bump();
    parser.finish_node()
}

fn parse_identifier_primary(parser: &mut dyn Parser) -> NodeId {
    if parser.at_contextual(Keyword::Async) && parser.peek(1).is_keyword(Keyword::Delegate) {
        return parse_anonymous_method(parser);
    }
    if parser.at_contextual(Keyword::Nameof) && parser.peek(1).is_punct(Punct::OpenParen) {
        parser.start_node(NodeKind::IdentifierName);
        let index = parser.peek_index(0);
        parser.set_name(index);
        parser.bump_as(TokenRole::Keyword);
        return parser.finish_node();
    }
    if parser.peek(1).is_punct(Punct::ColonColon) {
        let checkpoint = parser.checkpoint();
        parse_alias_name(parser);
        parser.start_node_at(checkpoint, NodeKind::AliasQualifiedName);
        parser.bump();
        parse_simple_name(parser, NameContext::Expression);
        return parser.finish_node();
    }
    if parser.at_contextual(Keyword::Var) && parser.peek(1).is_punct(Punct::OpenParen) {
        let deconstruction = matching_close(parser, 1)
            .map(|close| parser.peek(close + 1).is_punct(Punct::Eq))
            .unwrap_or(false);
        if deconstruction {
            return parse_declaration_expression(parser);
        }
    }
    parse_simple_name(parser, NameContext::Expression)
}

/// `typeof(T)`, `sizeof(T)`, `default(T)`
fn parse_parenthesized_type_operator(parser: &mut dyn Parser, kind: NodeKind) -> NodeId {
    parser.start_node(kind);
    parser.bump();
    if parser.expect_punct(Punct::OpenParen) {
        parse_type(parser);
        parser.expect_punct(Punct::CloseParen);
    }
    parser.finish_node()
}

/// `( expression )` or a tuple literal
fn parse_parenthesized_or_tuple(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    parser.bump();

    let element = parser.checkpoint();
    let first_is_argument = if starts_tuple_element(parser) {
        parse_argument(parser);
        true
    } else {
        parse_expression(parser);
        false
    };

    if first_is_argument || parser.at_punct(Punct::Comma) {
        if !first_is_argument {
            parser.start_node_at(element, NodeKind::Argument);
            parser.finish_node();
        }
        while parser.eat_punct(Punct::Comma) {
            parse_argument(parser);
        }
        parser.expect_punct(Punct::CloseParen);
        parser.start_node_at(checkpoint, NodeKind::TupleExpression);
    } else {
        parser.expect_punct(Punct::CloseParen);
        parser.start_node_at(checkpoint, NodeKind::ParenthesizedExpression);
    }
    parser.finish_node()
}

/// `name:` or a typed declaration at the start of a tuple element
fn starts_tuple_element(parser: &dyn Parser) -> bool {
    (is_identifier(parser, 0) && parser.peek(1).is_punct(Punct::Colon)) || is_declaration_expression(parser)
}

/// `T x` followed by `,` `)` or `=`, or `var (a, b)`
pub fn is_declaration_expression(parser: &dyn Parser) -> bool {
    if parser.at_contextual(Keyword::Var) && parser.peek(1).is_punct(Punct::OpenParen) {
        return true;
    }
    match scan_type(parser, 0) {
        Some(end) => {
            is_identifier(parser, end)
                && !parser.peek_contextual(end, Keyword::When)
                && matches!(
                    parser.peek(end + 1),
                    Token::Punct(Punct::Comma | Punct::CloseParen | Punct::Eq)
                )
        }
        None => false,
    }
}

/// declaration_expression ::= type designation
pub fn parse_declaration_expression(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::DeclarationExpression);
    if parser.at_contextual(Keyword::Var) {
        parse_implicit_type(parser);
    } else {
        parse_type(parser);
    }
    parse_designation(parser);
    parser.finish_node()
}

/// `var` used as an implicit type
pub fn parse_implicit_type(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::IdentifierName);
    let index = parser.peek_index(0);
    parser.set_name(index);
    parser.bump_as(TokenRole::Keyword);
    parser.finish_node()
}

/// designation ::= identifier | '_' | '(' designation (',' designation)* ')'
pub fn parse_designation(parser: &mut dyn Parser) -> NodeId {
    if parser.at_punct(Punct::OpenParen) {
        parser.start_node(NodeKind::ParenthesizedVariableDesignation);
        parser.bump();
        if !parser.at_punct(Punct::CloseParen) {
            loop {
                parse_designation(parser);
                if !parser.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        parser.expect_punct(Punct::CloseParen);
        return parser.finish_node();
    }

    if parser.at_identifier() && parser.current_text() == "_" {
        parser.start_node(NodeKind::DiscardDesignation);
        parser.bump();
        return parser.finish_node();
    }

    parser.start_node(NodeKind::SingleVariableDesignation);
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    parser.finish_node()
}

// === ARGUMENTS ===

/// argument ::= (identifier ':')? ('ref' | 'out' | 'in')? (expression | declaration_expression)
pub fn parse_argument(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Argument);
    if is_identifier(parser, 0) && parser.peek(1).is_punct(Punct::Colon) {
        parser.start_node(NodeKind::NameColon);
        parse_identifier_name(parser);
        parser.bump();
        parser.finish_node();
    }

    let mut by_reference = false;
    if matches!(
        parser.current(),
        Token::Keyword(Keyword::Ref | Keyword::Out | Keyword::In)
    ) {
        parser.bump();
        by_reference = true;
    }

    if by_reference && parser.at_contextual(Keyword::Var) && is_identifier(parser, 1) {
        parse_declaration_expression(parser);
    } else if is_declaration_expression(parser) {
        parse_declaration_expression(parser);
    } else {
        parse_expression(parser);
    }
    parser.finish_node()
}

fn parse_delimited_arguments(parser: &mut dyn Parser, kind: NodeKind, close: Punct) -> NodeId {
    parser.start_node(kind);
    parser.bump();
    if !parser.at_punct(close) {
        loop {
            parse_argument(parser);
            if !parser.eat_punct(Punct::Comma) {
                break;
            }
        }
    }
    parser.expect_punct(close);
    parser.finish_node()
}

pub fn parse_argument_list(parser: &mut dyn Parser) -> NodeId {
    parse_delimited_arguments(parser, NodeKind::ArgumentList, Punct::CloseParen)
}

pub fn parse_bracketed_argument_list(parser: &mut dyn Parser) -> NodeId {
    parse_delimited_arguments(parser, NodeKind::BracketedArgumentList, Punct::CloseBracket)
}

// === CREATION ===

fn parse_new(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    parser.bump();

    let kind = match parser.current() {
        Token::Punct(Punct::OpenBrace) => {
            parse_anonymous_object_members(parser);
            NodeKind::AnonymousObjectCreation
        }
        Token::Punct(Punct::OpenParen) => {
            parse_argument_list(parser);
            if parser.at_punct(Punct::OpenBrace) {
                parse_initializer(parser);
            }
            NodeKind::ImplicitObjectCreation
        }
        Token::Punct(Punct::OpenBracket) => {
            parser.bump();
            while parser.eat_punct(Punct::Comma) {}
            parser.expect_punct(Punct::CloseBracket);
            if parser.at_punct(Punct::OpenBrace) {
                parse_initializer(parser);
            }
            NodeKind::ImplicitArrayCreation
        }
        _ => {
            let created = parse_type_in(parser, TypeContext::ArrayCreation);
            let is_array = parser.node_kind(created) == NodeKind::ArrayType;
            if !is_array && parser.at_punct(Punct::OpenParen) {
                parse_argument_list(parser);
            }
            if parser.at_punct(Punct::OpenBrace) {
                parse_initializer(parser);
            }
            if is_array {
                NodeKind::ArrayCreation
            } else {
                NodeKind::ObjectCreation
            }
        }
    };

    parser.start_node_at(checkpoint, kind);
    parser.finish_node()
}

fn parse_anonymous_object_members(parser: &mut dyn Parser) {
    parser.bump();
    while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        parser.start_node(NodeKind::AnonymousObjectMember);
        if is_identifier(parser, 0) && parser.peek(1).is_punct(Punct::Eq) {
            parser.start_node(NodeKind::NameEquals);
            parse_identifier_name(parser);
            parser.bump();
            parser.finish_node();
        }
        parse_expression(parser);
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
}

/// initializer ::= '{' (element (',' element)* ','?)? '}'
pub fn parse_initializer(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Initializer);
    parser.bump();
    while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        if parser.at_punct(Punct::OpenBrace) {
            parse_initializer(parser);
        } else {
            parse_expression(parser);
        }
        if !parser.eat_punct(Punct::Comma) {
            if parser.position() == before {
                skip_token(parser);
            } else {
                break;
            }
        }
    }
    parser.expect_punct(Punct::CloseBrace);
    parser.finish_node()
}

fn parse_collection_expression(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::CollectionExpression);
    parser.bump();
    while !parser.at_punct(Punct::CloseBracket) && !parser.at_end() {
        let before = parser.position();
        if parser.at_punct(Punct::DotDot) {
            parser.start_node(NodeKind::SpreadElement);
            parser.bump();
            parse_expression(parser);
            parser.finish_node();
        } else {
            parse_expression(parser);
        }
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

fn parse_stackalloc(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::StackAllocCreation);
    parser.bump();
    if parser.at_punct(Punct::OpenBracket) {
        parser.bump();
        parser.expect_punct(Punct::CloseBracket);
    } else {
        parse_type_in(parser, TypeContext::ArrayCreation);
    }
    if parser.at_punct(Punct::OpenBrace) {
        parse_initializer(parser);
    }
    parser.finish_node()
}

// === FUNCTIONS ===

fn parse_lambda(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    loop {
        if parser.at_contextual(Keyword::Async) && !parser.peek(1).is_punct(Punct::Arrow) {
            parser.bump_as(TokenRole::Keyword);
        } else if !parser.eat_keyword(Keyword::Static) {
            break;
        }
    }

    let kind = if parser.at_identifier() {
        parser.start_node(NodeKind::Parameter);
        parser.bump_name();
        parser.finish_node();
        NodeKind::SimpleLambda
    } else {
        parse_parameter_list(parser);
        NodeKind::ParenthesizedLambda
    };

    parser.expect_punct(Punct::Arrow);
    if parser.at_punct(Punct::OpenBrace) {
        parse_block(parser);
    } else {
        parse_expression(parser);
    }
    parser.start_node_at(checkpoint, kind);
    parser.finish_node()
}

fn parse_anonymous_method(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::AnonymousMethod);
    if parser.at_contextual(Keyword::Async) {
        parser.bump_as(TokenRole::Keyword);
    }
    parser.expect_keyword(Keyword::Delegate);
    if parser.at_punct(Punct::OpenParen) {
        parse_parameter_list(parser);
    }
    if parser.at_punct(Punct::OpenBrace) {
        parse_block(parser);
    } else {
        parser.report_missing("{");
    }
    parser.finish_node()
}

// === SWITCH EXPRESSIONS ===

fn parse_switch_expression(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    parser.start_node_at(checkpoint, NodeKind::SwitchExpression);
    parser.bump();
    if parser.expect_punct(Punct::OpenBrace) {
        while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
            let before = parser.position();
            parser.start_node(NodeKind::SwitchExpressionArm);
            parse_pattern(parser);
            if parser.at_contextual(Keyword::When) {
                parse_when_clause(parser);
            }
            parser.expect_punct(Punct::Arrow);
            parse_expression(parser);
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
    }
    parser.finish_node()
}

// === INTERPOLATED STRINGS ===

fn parse_interpolated_string(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::InterpolatedString);
    parser.bump();
    loop {
        match parser.current() {
            Token::InterpolatedText(_) => parser.bump(),
            Token::InterpolationOpen => {
                parse_interpolation(parser);
            }
            Token::InterpolatedEnd(_) => {
                parser.bump();
                break;
            }
            _ => break,
        }
    }
    parser.finish_node()
}

fn parse_interpolation(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Interpolation);
    parser.bump();
    parse_expression(parser);

    if parser.at_punct(Punct::Comma) {
        parser.start_node(NodeKind::InterpolationAlignment);
        parser.bump();
        parse_expression(parser);
        parser.finish_node();
    }
    if parser.at_punct(Punct::Colon) {
        parser.start_node(NodeKind::InterpolationFormat);
        parser.bump();
        if matches!(parser.current(), Token::InterpolationFormat) {
            parser.bump();
        }
        parser.finish_node();
    }

    loop {
        match parser.current() {
            Token::InterpolationClose => {
                parser.bump();
                break;
            }
            Token::InterpolatedText(_) | Token::InterpolatedEnd(_) | Token::Eof => {
                parser.report_missing("}");
                break;
            }
            Token::InterpolatedStart(_) => {
                parse_expression(parser);
            }
            _ => {
                skip_token(parser);
            }
        }
    }
    parser.finish_node()
}

// === QUERIES ===

fn parse_query_expression(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::QueryExpression);
    parse_from_clause(parser);
    parse_query_body(parser);
    parser.finish_node()
}

fn parse_from_clause(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::FromClause);
    parser.bump_as(TokenRole::Keyword);
    if !(is_identifier(parser, 0) && parser.peek(1).is_keyword(Keyword::In)) {
        parse_type(parser);
    }
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    parser.expect_keyword(Keyword::In);
    parse_expression(parser);
    parser.finish_node()
}

fn parse_query_body(parser: &mut dyn Parser) {
    loop {
        if parser.at_contextual(Keyword::From) {
            parse_from_clause(parser);
        } else if parser.at_contextual(Keyword::Let) {
            parser.start_node(NodeKind::LetClause);
            parser.bump_as(TokenRole::Keyword);
            if parser.at_identifier() {
                parser.bump_name();
            } else {
                parser.report_missing("identifier");
            }
            parser.expect_punct(Punct::Eq);
            parse_expression(parser);
            parser.finish_node();
        } else if parser.at_contextual(Keyword::Where) {
            parser.start_node(NodeKind::WhereClause);
            parser.bump_as(TokenRole::Keyword);
            parse_expression(parser);
            parser.finish_node();
        } else if parser.at_contextual(Keyword::Join) {
            parse_join_clause(parser);
        } else if parser.at_contextual(Keyword::Orderby) {
            parser.start_node(NodeKind::OrderByClause);
            parser.bump_as(TokenRole::Keyword);
            loop {
                parser.start_node(NodeKind::Ordering);
                parse_expression(parser);
                if parser.at_contextual(Keyword::Ascending) || parser.at_contextual(Keyword::Descending) {
                    parser.bump_as(TokenRole::Keyword);
                }
                parser.finish_node();
                if !parser.eat_punct(Punct::Comma) {
                    break;
                }
            }
            parser.finish_node();
        } else {
            break;
        }
    }

    if parser.at_contextual(Keyword::Select) {
        parser.start_node(NodeKind::SelectClause);
        parser.bump_as(TokenRole::Keyword);
        parse_expression(parser);
        parser.finish_node();
    } else if parser.at_contextual(Keyword::Group) {
        parser.start_node(NodeKind::GroupClause);
        parser.bump_as(TokenRole::Keyword);
        parse_expression(parser);
        if parser.at_contextual(Keyword::By) {
            parser.bump_as(TokenRole::Keyword);
        } else {
            parser.report_missing("by");
        }
        parse_expression(parser);
        parser.finish_node();
    } else {
        parser.report_missing("select or group");
    }

    if parser.at_contextual(Keyword::Into) {
        parser.start_node(NodeKind::QueryContinuation);
        parser.bump_as(TokenRole::Keyword);
        if parser.at_identifier() {
            parser.bump_name();
        } else {
            parser.report_missing("identifier");
        }
        parse_query_body(parser);
        parser.finish_node();
    }
}

fn parse_join_clause(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::JoinClause);
    parser.bump_as(TokenRole::Keyword);
    if !(is_identifier(parser, 0) && parser.peek(1).is_keyword(Keyword::In)) {
        parse_type(parser);
    }
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    parser.expect_keyword(Keyword::In);
    parse_expression(parser);
    if !parser.eat_contextual(Keyword::On) {
        parser.report_missing("on");
    }
    parse_expression(parser);
    if !parser.eat_contextual(Keyword::Equals) {
        parser.report_missing("equals");
    }
    parse_expression(parser);
    if parser.at_contextual(Keyword::Into) {
        parser.start_node(NodeKind::JoinIntoClause);
        parser.bump_as(TokenRole::Keyword);
        if parser.at_identifier() {
            parser.bump_name();
        } else {
            parser.report_missing("identifier");
        }
        parser.finish_node();
    }
    parser.finish_node()
}

#[cfg(test)]
mod tests {
    use crate::syntax::test_support::render_expression;

    #[test]
    fn test_precedence_and_assignment() {
        assert_eq!(
            render_expression("a = b + c * d"),
            "(Assignment (IdentifierName a) = (Binary (IdentifierName b) + \
             (Binary (IdentifierName c) * (IdentifierName d))))"
        );
        assert_eq!(
            render_expression("a ?? b ?? c"),
            "(Binary (IdentifierName a) ?? (Binary (IdentifierName b) ?? (IdentifierName c)))"
        );
    }

    #[test]
    fn test_generic_invocation_versus_comparison() {
        assert_eq!(
            render_expression("F(G<A, B>(7))"),
            "(Invocation (IdentifierName F) (ArgumentList ( (Argument (Invocation (GenericName G \
             (TypeArgumentList < (IdentifierName A) , (IdentifierName B) >)) (ArgumentList ( \
             (Argument (Literal 7)) )))) )))"
        );
        assert_eq!(
            render_expression("a < b > c"),
            "(Binary (Binary (IdentifierName a) < (IdentifierName b)) > (IdentifierName c))"
        );
    }

    #[test]
    fn test_shift_from_adjacent_greater_thans() {
        assert_eq!(
            render_expression("x >> 2"),
            "(Binary (IdentifierName x) > > (Literal 2))"
        );
        assert_eq!(
            render_expression("x >>= 2"),
            "(Assignment (IdentifierName x) > >= (Literal 2))"
        );
    }

    #[test]
    fn test_conditional_and_member_access() {
        assert_eq!(
            render_expression("a?.b ? c : d"),
            "(Conditional (MemberAccess (IdentifierName a) ? . (IdentifierName b)) ? \
             (IdentifierName c) : (IdentifierName d))"
        );
    }

    #[test]
    fn test_cast_lambda_and_tuple() {
        assert_eq!(
            render_expression("(int)x"),
            "(Cast ( (PredefinedType int) ) (IdentifierName x))"
        );
        assert_eq!(
            render_expression("(a, b) => a"),
            "(ParenthesizedLambda (ParameterList ( (Parameter a) , (Parameter b) )) => (IdentifierName a))"
        );
        assert_eq!(
            render_expression("(x: 1, 2)"),
            "(TupleExpression ( (Argument (NameColon (IdentifierName x) :) (Literal 1)) , \
             (Argument (Literal 2)) ))"
        );
    }

    #[test]
    fn test_query_expression() {
        assert_eq!(
            render_expression("from it in foo where it > 1 select it"),
            "(QueryExpression (FromClause from it in (IdentifierName foo)) \
             (WhereClause where (Binary (IdentifierName it) > (Literal 1))) \
             (SelectClause select (IdentifierName it)))"
        );
    }

    #[test]
    fn test_interpolated_string_holes() {
        assert_eq!(
            render_expression(r#"$"a{b,5:x2}c""#),
            "(InterpolatedString $\" a (Interpolation { (IdentifierName b) \
             (InterpolationAlignment , (Literal 5)) (InterpolationFormat : x2) }) c \")"
        );
    }

    #[test]
    fn test_object_creation_and_out_var() {
        assert_eq!(
            render_expression("new C { P = 1 }"),
            "(ObjectCreation new (IdentifierName C) (Initializer { (Assignment (IdentifierName P) = (Literal 1)) }))"
        );
        assert_eq!(
            render_expression("F(out var x)"),
            "(Invocation (IdentifierName F) (ArgumentList ( (Argument out (DeclarationExpression \
             (IdentifierName var) (SingleVariableDesignation x))) )))"
        );
    }

    #[test]
    fn test_await_without_operand_is_a_name() {
        assert_eq!(render_expression("await"), "(IdentifierName await)");
        assert_eq!(
            render_expression("await t"),
            "(AwaitExpression await (IdentifierName t))"
        );
    }
}
