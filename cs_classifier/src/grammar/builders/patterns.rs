//! Pattern productions for `is`, `switch` arms and `case` labels
//!
//! pattern ::= conjunction ('or' conjunction)*
//! conjunction ::= negation ('and' negation)*
//! negation ::= 'not' negation | primary_pattern

use crate::grammar::ast::{Checkpoint, NodeId, NodeKind, TokenRole};
use crate::grammar::builders::atomic::{parse_identifier_name, skip_token, Parser};
use crate::grammar::builders::expressions::{
    parse_binary_expression, parse_designation, parse_expression, parse_implicit_type, PREC_SHIFT,
};
use crate::grammar::builders::helpers::{is_identifier, scan_type_in_expression};
use crate::grammar::builders::types::{parse_type_in, TypeContext};
use crate::grammar::keywords::Keyword;
use crate::tokens::{Punct, Token};

pub fn parse_pattern(parser: &mut dyn Parser) -> NodeId {
    if !parser.enter() {
        return skip_token(parser);
    }
    let checkpoint = parser.checkpoint();
    let mut pattern = parse_conjunction(parser);
    while parser.at_contextual(Keyword::Or) {
        parser.start_node_at(checkpoint, NodeKind::BinaryPattern);
        parser.bump_as(TokenRole::Keyword);
        parse_conjunction(parser);
        pattern = parser.finish_node();
    }
    parser.exit();
    pattern
}

fn parse_conjunction(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    let mut pattern = parse_negation(parser);
    while parser.at_contextual(Keyword::And) {
        parser.start_node_at(checkpoint, NodeKind::BinaryPattern);
        parser.bump_as(TokenRole::Keyword);
        parse_negation(parser);
        pattern = parser.finish_node();
    }
    pattern
}

fn parse_negation(parser: &mut dyn Parser) -> NodeId {
    if parser.at_contextual(Keyword::Not) && starts_pattern(parser, 1) {
        parser.start_node(NodeKind::NotPattern);
        parser.bump_as(TokenRole::Keyword);
        parse_negation(parser);
        return parser.finish_node();
    }
    parse_primary_pattern(parser)
}

/// Whether a pattern can begin `n` tokens ahead
fn starts_pattern(parser: &dyn Parser, n: usize) -> bool {
    match parser.peek(n) {
        Token::Identifier
        | Token::Number
        | Token::Char
        | Token::String(_)
        | Token::InterpolatedStart(_) => true,
        Token::Keyword(keyword) => {
            keyword.is_predefined_type()
                || matches!(
                    keyword,
                    Keyword::Null | Keyword::True | Keyword::False | Keyword::Default | Keyword::Typeof
                )
        }
        Token::Punct(punct) => matches!(
            punct,
            Punct::OpenParen
                | Punct::OpenBrace
                | Punct::OpenBracket
                | Punct::DotDot
                | Punct::Lt
                | Punct::LtEq
                | Punct::Gt
                | Punct::GtEq
                | Punct::EqEq
                | Punct::BangEq
                | Punct::Minus
                | Punct::Plus
                | Punct::Tilde
        ),
        _ => false,
    }
}

/// Identifiers that continue a pattern instead of naming a designation
fn is_pattern_combinator(parser: &dyn Parser, n: usize) -> bool {
    [Keyword::And, Keyword::Or, Keyword::When]
        .into_iter()
        .any(|keyword| parser.peek_contextual(n, keyword))
}

fn parse_primary_pattern(parser: &mut dyn Parser) -> NodeId {
    match parser.current() {
        Token::Punct(Punct::OpenParen) => parse_parenthesized_or_positional(parser),
        Token::Punct(Punct::OpenBrace) => {
            parser.start_node(NodeKind::RecursivePattern);
            parse_property_clause(parser);
            parse_optional_designation(parser);
            parser.finish_node()
        }
        Token::Punct(Punct::OpenBracket) => parse_list_pattern(parser),
        Token::Punct(Punct::DotDot) => {
            parser.start_node(NodeKind::SlicePattern);
            parser.bump();
            if starts_pattern(parser, 0) && !is_pattern_combinator(parser, 0) {
                parse_pattern(parser);
            }
            parser.finish_node()
        }
        Token::Punct(Punct::Lt | Punct::LtEq | Punct::Gt | Punct::GtEq | Punct::EqEq | Punct::BangEq) => {
            parser.start_node(NodeKind::RelationalPattern);
            parser.bump();
            parse_binary_expression(parser, PREC_SHIFT);
            parser.finish_node()
        }
        Token::Identifier
            if parser.at_contextual(Keyword::Var)
                && (is_identifier(parser, 1) || parser.peek(1).is_punct(Punct::OpenParen)) =>
        {
            parser.start_node(NodeKind::VarPattern);
            parse_implicit_type(parser);
            parse_designation(parser);
            parser.finish_node()
        }
        Token::Identifier if parser.current_text() == "_" && is_discard(parser) => {
            parser.start_node(NodeKind::DiscardPattern);
            parser.bump();
            parser.finish_node()
        }
        _ => parse_type_or_constant_pattern(parser),
    }
}

fn is_discard(parser: &dyn Parser) -> bool {
    !matches!(
        parser.peek(1),
        Token::Punct(Punct::Dot | Punct::Lt | Punct::OpenParen | Punct::OpenBrace | Punct::ColonColon)
    ) && (!is_identifier(parser, 1) || is_pattern_combinator(parser, 1))
}

/// `T x`, `T { ... }`, `T(...)`, a type with suffixes, or a constant
fn parse_type_or_constant_pattern(parser: &mut dyn Parser) -> NodeId {
    let Some(end) = scan_type_in_expression(parser, 0) else {
        return constant_pattern(parser);
    };

    let after = parser.peek(end);
    let recursive = matches!(after, Token::Punct(Punct::OpenParen | Punct::OpenBrace));
    let declaration = is_identifier(parser, end) && !is_pattern_combinator(parser, end);

    if recursive {
        parser.start_node(NodeKind::RecursivePattern);
        parse_type_in(parser, TypeContext::Expression);
        if parser.at_punct(Punct::OpenParen) {
            parse_positional_clause(parser);
        }
        if parser.at_punct(Punct::OpenBrace) {
            parse_property_clause(parser);
        }
        parse_optional_designation(parser);
        return parser.finish_node();
    }
    if declaration {
        parser.start_node(NodeKind::DeclarationPattern);
        parse_type_in(parser, TypeContext::Expression);
        parse_designation(parser);
        return parser.finish_node();
    }
    if has_type_only_shape(parser, end) {
        parser.start_node(NodeKind::TypePattern);
        parse_type_in(parser, TypeContext::Expression);
        return parser.finish_node();
    }
    constant_pattern(parser)
}

/// Type syntax an expression cannot express: arguments, suffixes, tuples
fn has_type_only_shape(parser: &dyn Parser, end: usize) -> bool {
    (0..end).any(|i| {
        matches!(
            parser.peek(i),
            Token::Punct(Punct::Lt | Punct::Question | Punct::Star | Punct::OpenBracket | Punct::OpenParen)
        )
    })
}

fn constant_pattern(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::ConstantPattern);
    parse_binary_expression(parser, PREC_SHIFT);
    parser.finish_node()
}

fn parse_optional_designation(parser: &mut dyn Parser) {
    if is_identifier(parser, 0) && !is_pattern_combinator(parser, 0) {
        parse_designation(parser);
    }
}

/// `(p)` is a parenthesized pattern; `(p, q)`, `()` and `(x: p)` are
/// positional
fn parse_parenthesized_or_positional(parser: &mut dyn Parser) -> NodeId {
    let checkpoint = parser.checkpoint();
    parser.bump();

    if parser.at_punct(Punct::CloseParen) {
        parser.bump();
        parser.start_node_at(checkpoint, NodeKind::PositionalPatternClause);
        parser.finish_node();
        return finish_positional(parser, checkpoint);
    }

    let element = parser.checkpoint();
    let named = starts_name_colon(parser);
    if named {
        parse_subpattern(parser);
    } else {
        parse_pattern(parser);
    }

    if !named && !parser.at_punct(Punct::Comma) {
        parser.expect_punct(Punct::CloseParen);
        parser.start_node_at(checkpoint, NodeKind::ParenthesizedPattern);
        return parser.finish_node();
    }

    if !named {
        parser.start_node_at(element, NodeKind::Subpattern);
        parser.finish_node();
    }
    while parser.eat_punct(Punct::Comma) {
        parse_subpattern(parser);
    }
    parser.expect_punct(Punct::CloseParen);
    parser.start_node_at(checkpoint, NodeKind::PositionalPatternClause);
    parser.finish_node();
    finish_positional(parser, checkpoint)
}

fn finish_positional(parser: &mut dyn Parser, checkpoint: Checkpoint) -> NodeId {
    if parser.at_punct(Punct::OpenBrace) {
        parse_property_clause(parser);
    }
    parse_optional_designation(parser);
    parser.start_node_at(checkpoint, NodeKind::RecursivePattern);
    parser.finish_node()
}

fn parse_positional_clause(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::PositionalPatternClause);
    parser.bump();
    if !parser.at_punct(Punct::CloseParen) {
        loop {
            parse_subpattern(parser);
            if !parser.eat_punct(Punct::Comma) {
                break;
            }
        }
    }
    parser.expect_punct(Punct::CloseParen);
    parser.finish_node()
}

fn parse_property_clause(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::PropertyPatternClause);
    parser.bump();
    while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        parse_subpattern(parser);
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

/// `name:` or `a.b.c:` ahead of a subpattern
fn starts_name_colon(parser: &dyn Parser) -> bool {
    let mut i = 0;
    while is_identifier(parser, i) {
        match parser.peek(i + 1) {
            Token::Punct(Punct::Colon) => return true,
            Token::Punct(Punct::Dot) => i += 2,
            _ => return false,
        }
    }
    false
}

/// subpattern ::= (expression ':')? pattern
fn parse_subpattern(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Subpattern);
    if starts_name_colon(parser) {
        parser.start_node(NodeKind::NameColon);
        if parser.peek(1).is_punct(Punct::Colon) {
            parse_identifier_name(parser);
        } else {
            parse_expression(parser);
        }
        parser.expect_punct(Punct::Colon);
        parser.finish_node();
    }
    parse_pattern(parser);
    parser.finish_node()
}

fn parse_list_pattern(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::ListPattern);
    parser.bump();
    while !parser.at_punct(Punct::CloseBracket) && !parser.at_end() {
        let before = parser.position();
        parse_pattern(parser);
        if !parser.eat_punct(Punct::Comma) {
            if parser.position() == before {
                skip_token(parser);
            } else {
                break;
            }
        }
    }
    parser.expect_punct(Punct::CloseBracket);
    parse_optional_designation(parser);
    parser.finish_node()
}

/// when_clause ::= 'when' expression
pub fn parse_when_clause(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::WhenClause);
    parser.bump_as(TokenRole::Keyword);
    parse_expression(parser);
    parser.finish_node()
}

#[cfg(test)]
mod tests {
    use crate::syntax::test_support::render_expression;

    #[test]
    fn test_declaration_and_type_patterns() {
        assert_eq!(
            render_expression("o is string s"),
            "(IsExpression (IdentifierName o) is (DeclarationPattern (PredefinedType string) \
             (SingleVariableDesignation s)))"
        );
        assert_eq!(
            render_expression("o is int[]"),
            "(IsExpression (IdentifierName o) is (TypePattern (ArrayType (PredefinedType int) \
             (ArrayRankSpecifier [ ]))))"
        );
    }

    #[test]
    fn test_combinators_and_relational_patterns() {
        assert_eq!(
            render_expression("n is > 0 and not 5"),
            "(IsExpression (IdentifierName n) is (BinaryPattern (RelationalPattern > (Literal 0)) and \
             (NotPattern not (ConstantPattern (Literal 5)))))"
        );
    }

    #[test]
    fn test_recursive_and_positional_patterns() {
        assert_eq!(
            render_expression("p is Point { X: 1 } q"),
            "(IsExpression (IdentifierName p) is (RecursivePattern (IdentifierName Point) \
             (PropertyPatternClause { (Subpattern (NameColon (IdentifierName X) :) \
             (ConstantPattern (Literal 1))) }) (SingleVariableDesignation q)))"
        );
        assert_eq!(
            render_expression("p is (1, _)"),
            "(IsExpression (IdentifierName p) is (RecursivePattern (PositionalPatternClause ( \
             (Subpattern (ConstantPattern (Literal 1))) , (Subpattern (DiscardPattern _)) ))))"
        );
    }

    #[test]
    fn test_var_and_list_patterns() {
        assert_eq!(
            render_expression("xs is [var first, ..]"),
            "(IsExpression (IdentifierName xs) is (ListPattern [ (VarPattern (IdentifierName var) \
             (SingleVariableDesignation first)) , (SlicePattern ..) ]))"
        );
    }

    #[test]
    fn test_switch_expression_arms() {
        assert_eq!(
            render_expression("x switch { 1 => a, _ => b }"),
            "(SwitchExpression (IdentifierName x) switch { (SwitchExpressionArm (ConstantPattern \
             (Literal 1)) => (IdentifierName a)) , (SwitchExpressionArm (DiscardPattern _) => \
             (IdentifierName b)) })"
        );
    }
}
