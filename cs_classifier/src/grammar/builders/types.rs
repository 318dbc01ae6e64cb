//! Type productions
//!
//! type ::= ref_type | (predefined | name | tuple_type | function_pointer) suffix*
//! suffix ::= '?' | '*' | array_rank

use crate::grammar::ast::{NodeId, NodeKind, TokenRole};
use crate::grammar::builders::atomic::{missing_node, parse_name, skip_token, Parser};
use crate::grammar::builders::expressions::parse_expression;
use crate::grammar::builders::helpers::{can_start_operand, is_identifier};
use crate::grammar::keywords::Keyword;
use crate::tokens::{Punct, Token};

/// How far a type may extend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeContext {
    /// Declarations: every suffix is part of the type
    Declaration,
    /// After `is`/`as` or in a cast: a `?` followed by an operand is the
    /// conditional operator
    Expression,
    /// `new T[n]`: rank specifiers may hold sizes
    ArrayCreation,
}

/// Whether the current token can begin a type
pub fn at_type_start(parser: &dyn Parser) -> bool {
    match parser.current() {
        Token::Identifier | Token::Punct(Punct::OpenParen) => true,
        Token::Keyword(keyword) => {
            keyword.is_predefined_type()
                || keyword == Keyword::Ref
                || (keyword == Keyword::Delegate && parser.peek(1).is_punct(Punct::Star))
        }
        _ => false,
    }
}

pub fn parse_type(parser: &mut dyn Parser) -> NodeId {
    parse_type_in(parser, TypeContext::Declaration)
}

pub fn parse_type_in(parser: &mut dyn Parser, context: TypeContext) -> NodeId {
    if !parser.enter() {
        return skip_token(parser);
    }
    let node = parse_type_inner(parser, context);
    parser.exit();
    node
}

fn parse_type_inner(parser: &mut dyn Parser, context: TypeContext) -> NodeId {
    if parser.at_keyword(Keyword::Ref) {
        parser.start_node(NodeKind::RefType);
        parser.bump();
        parser.eat_keyword(Keyword::Readonly);
        parse_type_in(parser, context);
        return parser.finish_node();
    }

    let checkpoint = parser.checkpoint();
    let mut node = match parser.current() {
        Token::Keyword(keyword) if keyword.is_predefined_type() => {
            parser.start_node(NodeKind::PredefinedType);
            parser.bump();
            parser.finish_node()
        }
        Token::Identifier => parse_name(parser),
        Token::Punct(Punct::OpenParen) => parse_tuple_type(parser),
        Token::Keyword(Keyword::Delegate) if parser.peek(1).is_punct(Punct::Star) => {
            parse_function_pointer_type(parser)
        }
        _ => return missing_node(parser, NodeKind::IdentifierName, "type"),
    };

    loop {
        match parser.current() {
            Token::Punct(Punct::Question) => {
                if context == TypeContext::Expression && can_start_operand(parser, 1) {
                    break;
                }
                parser.start_node_at(checkpoint, NodeKind::NullableType);
                parser.bump();
                node = parser.finish_node();
            }
            Token::Punct(Punct::Star) => {
                parser.start_node_at(checkpoint, NodeKind::PointerType);
                parser.bump();
                node = parser.finish_node();
            }
            Token::Punct(Punct::OpenBracket) => {
                if context != TypeContext::ArrayCreation && !rank_is_empty(parser) {
                    break;
                }
                parser.start_node_at(checkpoint, NodeKind::ArrayType);
                while parser.at_punct(Punct::OpenBracket) {
                    if context != TypeContext::ArrayCreation && !rank_is_empty(parser) {
                        break;
                    }
                    parse_array_rank_specifier(parser);
                }
                node = parser.finish_node();
            }
            _ => break,
        }
    }
    node
}

/// `[` `,`* `]`
fn rank_is_empty(parser: &dyn Parser) -> bool {
    let mut i = 1;
    while parser.peek(i).is_punct(Punct::Comma) {
        i += 1;
    }
    parser.peek(i).is_punct(Punct::CloseBracket)
}

/// array_rank ::= '[' (expression? ',')* expression? ']'
pub fn parse_array_rank_specifier(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::ArrayRankSpecifier);
    parser.bump();
    loop {
        if parser.at_punct(Punct::CloseBracket) || parser.at_end() {
            break;
        }
        if !parser.at_punct(Punct::Comma) {
            parse_expression(parser);
        }
        if !parser.eat_punct(Punct::Comma) {
            break;
        }
    }
    parser.expect_punct(Punct::CloseBracket);
    parser.finish_node()
}

/// type_argument_list ::= '<' type (',' type)* '>'
pub fn parse_type_argument_list(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::TypeArgumentList);
    parser.bump_as(TokenRole::Punctuation);

    loop {
        if parser.at_punct(Punct::Comma) || parser.at_punct(Punct::Gt) {
            parser.start_node(NodeKind::OmittedTypeArgument);
            parser.finish_node();
        } else {
            parse_type(parser);
        }
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

/// tuple_type ::= '(' tuple_element (',' tuple_element)+ ')'
fn parse_tuple_type(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::TupleType);
    parser.bump();
    loop {
        parser.start_node(NodeKind::TupleElement);
        parse_type(parser);
        if parser.at_identifier() {
            parser.bump_name();
        }
        parser.finish_node();
        if !parser.eat_punct(Punct::Comma) {
            break;
        }
    }
    parser.expect_punct(Punct::CloseParen);
    parser.finish_node()
}

/// function_pointer ::= 'delegate' '*' calling_convention? '<' (ref? type ',')* type '>'
fn parse_function_pointer_type(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::FunctionPointerType);
    parser.bump();
    parser.bump();

    if parser.at_contextual(Keyword::Managed) || parser.at_contextual(Keyword::Unmanaged) {
        parser.bump_as(TokenRole::Keyword);
    }
    if parser.at_punct(Punct::OpenBracket) {
        parser.bump();
        while is_identifier(parser, 0) {
            parse_name(parser);
            if !parser.eat_punct(Punct::Comma) {
                break;
            }
        }
        parser.expect_punct(Punct::CloseBracket);
    }

    if parser.at_punct(Punct::Lt) {
        parser.bump_as(TokenRole::Punctuation);
        loop {
            parser.start_node(NodeKind::Parameter);
            while matches!(
                parser.current(),
                Token::Keyword(Keyword::Ref | Keyword::Out | Keyword::In | Keyword::Readonly)
            ) {
                parser.bump();
            }
            parse_type(parser);
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
    } else {
        parser.report_missing("<");
    }
    parser.finish_node()
}

#[cfg(test)]
mod tests {
    use crate::syntax::test_support::render_type;

    #[test]
    fn test_generic_and_array_types() {
        assert_eq!(
            render_type("Dictionary<string, List<int>>[]"),
            "(ArrayType (GenericName Dictionary (TypeArgumentList < (PredefinedType string) , \
             (GenericName List (TypeArgumentList < (PredefinedType int) >)) >)) \
             (ArrayRankSpecifier [ ]))"
        );
    }

    #[test]
    fn test_nullable_pointer_and_tuple_types() {
        assert_eq!(
            render_type("int?"),
            "(NullableType (PredefinedType int) ?)"
        );
        assert_eq!(
            render_type("byte*"),
            "(PointerType (PredefinedType byte) *)"
        );
        assert_eq!(
            render_type("(int a, string)"),
            "(TupleType ( (TupleElement (PredefinedType int) a) , (TupleElement (PredefinedType string)) ))"
        );
    }

    #[test]
    fn test_qualified_and_alias_names() {
        assert_eq!(
            render_type("global::System.Int32"),
            "(QualifiedName (AliasQualifiedName (IdentifierName global) :: (IdentifierName System)) . \
             (IdentifierName Int32))"
        );
    }

    #[test]
    fn test_function_pointer_type() {
        assert_eq!(
            render_type("delegate* unmanaged<int, void>"),
            "(FunctionPointerType delegate * unmanaged < (Parameter (PredefinedType int)) , \
             (Parameter (PredefinedType void)) >)"
        );
    }
}
