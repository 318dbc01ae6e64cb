//! Statement productions
//!
//! Local declarations and local functions are recognised by lookahead
//! before falling back to an expression statement.

use crate::grammar::ast::{NodeId, NodeKind, TokenRole};
use crate::grammar::builders::atomic::{parse_identifier_name, skip_token, Parser};
use crate::grammar::builders::declarations::{parse_function_tail, parse_type_parameter_list};
use crate::grammar::builders::expressions::{
    parse_bracketed_argument_list, parse_declaration_expression, parse_expression,
    parse_implicit_type, parse_initializer,
};
use crate::grammar::builders::helpers::{
    can_start_operand, contextual_modifier_applies, is_identifier, matching_close, scan_declaration,
    scan_function_header, scan_type,
};
use crate::grammar::builders::patterns::{parse_pattern, parse_when_clause};
use crate::grammar::builders::types::parse_type;
use crate::grammar::keywords::Keyword;
use crate::tokens::{Punct, Token};

/// block ::= '{' statement* '}'
pub fn parse_block(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Block);
    parser.expect_punct(Punct::OpenBrace);
    while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        parse_statement(parser);
        if parser.position() == before {
            skip_token(parser);
        }
    }
    parser.expect_punct(Punct::CloseBrace);
    parser.finish_node()
}

pub fn parse_statement(parser: &mut dyn Parser) -> NodeId {
    if !parser.enter() {
        return skip_token(parser);
    }
    let node = parse_statement_inner(parser);
    parser.exit();
    node
}

fn parse_statement_inner(parser: &mut dyn Parser) -> NodeId {
    match parser.current() {
        Token::Punct(Punct::OpenBrace) => parse_block(parser),
        Token::Punct(Punct::Semicolon) => {
            parser.start_node(NodeKind::EmptyStatement);
            parser.bump();
            parser.finish_node()
        }
        Token::Keyword(keyword) => match keyword {
            Keyword::If => parse_if(parser),
            Keyword::While => parse_while(parser),
            Keyword::Do => parse_do(parser),
            Keyword::For => parse_for(parser),
            Keyword::Foreach => parse_foreach(parser),
            Keyword::Using => parse_using(parser),
            Keyword::Lock => parse_parenthesized_statement(parser, NodeKind::Lock),
            Keyword::Fixed => parse_fixed(parser),
            Keyword::Return => parse_jump(parser, NodeKind::Return, true),
            Keyword::Throw => parse_jump(parser, NodeKind::Throw, true),
            Keyword::Break => parse_jump(parser, NodeKind::Break, false),
            Keyword::Continue => parse_jump(parser, NodeKind::Continue, false),
            Keyword::Goto => parse_goto(parser),
            Keyword::Switch => parse_switch(parser),
            Keyword::Try => parse_try(parser),
            Keyword::Checked | Keyword::Unchecked if parser.peek(1).is_punct(Punct::OpenBrace) => {
                parser.start_node(NodeKind::CheckedStatement);
                parser.bump();
                parse_block(parser);
                parser.finish_node()
            }
            Keyword::Unsafe if parser.peek(1).is_punct(Punct::OpenBrace) => {
                parser.start_node(NodeKind::UnsafeStatement);
                parser.bump();
                parse_block(parser);
                parser.finish_node()
            }
            _ => parse_declaration_or_expression(parser),
        },
        Token::Identifier => {
            if parser.at_contextual(Keyword::Yield)
                && matches!(parser.peek(1), Token::Keyword(Keyword::Return | Keyword::Break))
            {
                return parse_yield(parser);
            }
            if parser.at_contextual(Keyword::Await)
                && matches!(parser.peek(1), Token::Keyword(Keyword::Foreach | Keyword::Using))
            {
                return parse_awaited_statement(parser);
            }
            if parser.peek(1).is_punct(Punct::Colon) {
                parser.start_node(NodeKind::LabeledStatement);
                parser.bump_name();
                parser.bump();
                parse_statement(parser);
                return parser.finish_node();
            }
            parse_declaration_or_expression(parser)
        }
        _ => parse_declaration_or_expression(parser),
    }
}

// === DECLARATIONS ===

/// Count of local modifiers ahead of a declaration
fn local_modifier_count(parser: &dyn Parser) -> usize {
    let mut i = 0;
    loop {
        match parser.peek(i) {
            Token::Keyword(
                Keyword::Const
                | Keyword::Static
                | Keyword::Extern
                | Keyword::Unsafe
                | Keyword::Readonly
                | Keyword::Volatile,
            ) => i += 1,
            Token::Identifier
                if (parser.peek_contextual(i, Keyword::Async) || parser.peek_contextual(i, Keyword::Scoped))
                    && contextual_modifier_applies(parser, i) =>
            {
                i += 1
            }
            _ => return i,
        }
    }
}

fn is_local_declaration(parser: &dyn Parser, n: usize) -> bool {
    let mut i = n;
    if parser.peek(i).is_keyword(Keyword::Ref) {
        i += 1;
        if parser.peek(i).is_keyword(Keyword::Readonly) {
            i += 1;
        }
    }
    match scan_declaration(parser, i) {
        Some(end) => !matches!(
            parser.peek(end + 1),
            Token::Punct(Punct::CloseParen) | Token::Keyword(Keyword::In)
        ),
        None => false,
    }
}

fn parse_declaration_or_expression(parser: &mut dyn Parser) -> NodeId {
    let modifiers = local_modifier_count(parser);
    let awaited = parser.peek_contextual(modifiers, Keyword::Await) && can_start_operand(parser, modifiers + 1);
    if awaited {
        return parse_expression_statement(parser);
    }
    if scan_function_header(parser, modifiers).is_some() {
        return parse_local_function(parser);
    }
    if is_local_declaration(parser, modifiers) {
        return parse_local_declaration(parser);
    }
    parse_expression_statement(parser)
}

fn parse_expression_statement(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::ExpressionStatement);
    parse_expression(parser);
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

fn bump_local_modifiers(parser: &mut dyn Parser) {
    loop {
        match parser.current() {
            Token::Keyword(
                Keyword::Using
                | Keyword::Const
                | Keyword::Static
                | Keyword::Extern
                | Keyword::Unsafe
                | Keyword::Readonly
                | Keyword::Volatile,
            ) => parser.bump(),
            Token::Identifier
                if (parser.at_contextual(Keyword::Await) && parser.peek(1).is_keyword(Keyword::Using))
                    || ((parser.at_contextual(Keyword::Async) || parser.at_contextual(Keyword::Scoped))
                        && contextual_modifier_applies(parser, 0)) =>
            {
                parser.bump_as(TokenRole::Keyword)
            }
            _ => return,
        }
    }
}

/// local_declaration ::= modifier* variable_declaration ';'
pub fn parse_local_declaration(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::LocalDeclaration);
    bump_local_modifiers(parser);
    parse_variable_declaration(parser, true);
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

fn parse_local_function(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::LocalFunction);
    bump_local_modifiers(parser);
    parse_type(parser);
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    if parser.at_punct(Punct::Lt) {
        parse_type_parameter_list(parser);
    }
    parse_function_tail(parser);
    parser.finish_node()
}

/// `var` is an implicit type only when a declarator follows
fn at_implicit_type(parser: &dyn Parser) -> bool {
    parser.at_contextual(Keyword::Var) && is_identifier(parser, 1)
}

/// variable_declaration ::= type declarator (',' declarator)*
pub fn parse_variable_declaration(parser: &mut dyn Parser, implicit_allowed: bool) -> NodeId {
    parser.start_node(NodeKind::VariableDeclaration);
    if implicit_allowed && at_implicit_type(parser) {
        parse_implicit_type(parser);
    } else if implicit_allowed
        && parser.at_keyword(Keyword::Ref)
        && parser.peek_contextual(1, Keyword::Var)
        && is_identifier(parser, 2)
    {
        parser.start_node(NodeKind::RefType);
        parser.bump();
        parse_implicit_type(parser);
        parser.finish_node();
    } else {
        parse_type(parser);
    }
    parse_variable_declarators(parser);
    parser.finish_node()
}

/// Declarators after a type that is already in the tree
pub fn parse_variable_declarators(parser: &mut dyn Parser) {
    loop {
        parse_variable_declarator(parser);
        if !parser.eat_punct(Punct::Comma) {
            break;
        }
    }
}

fn parse_variable_declarator(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::VariableDeclarator);
    if parser.at_identifier() {
        parser.bump_name();
    } else {
        parser.report_missing("identifier");
    }
    if parser.at_punct(Punct::OpenBracket) {
        parse_bracketed_argument_list(parser);
    }
    if parser.at_punct(Punct::Eq) {
        parse_equals_value(parser);
    }
    parser.finish_node()
}

/// equals_value ::= '=' (initializer | 'ref'? expression)
pub fn parse_equals_value(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::EqualsValueClause);
    parser.bump();
    if parser.at_punct(Punct::OpenBrace) {
        parse_initializer(parser);
    } else {
        parse_expression(parser);
    }
    parser.finish_node()
}

// === CONTROL FLOW ===

fn parse_condition(parser: &mut dyn Parser) {
    if parser.expect_punct(Punct::OpenParen) {
        parse_expression(parser);
        parser.expect_punct(Punct::CloseParen);
    }
}

fn parse_embedded_statement(parser: &mut dyn Parser) {
    if parser.at_end() || parser.at_punct(Punct::CloseBrace) {
        parser.report_missing("statement");
    } else {
        parse_statement(parser);
    }
}

fn parse_if(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::If);
    parser.bump();
    parse_condition(parser);
    parse_embedded_statement(parser);
    if parser.at_keyword(Keyword::Else) {
        parser.start_node(NodeKind::ElseClause);
        parser.bump();
        parse_embedded_statement(parser);
        parser.finish_node();
    }
    parser.finish_node()
}

fn parse_while(parser: &mut dyn Parser) -> NodeId {
    parse_parenthesized_statement(parser, NodeKind::While)
}

/// `keyword ( expression ) statement`
fn parse_parenthesized_statement(parser: &mut dyn Parser, kind: NodeKind) -> NodeId {
    parser.start_node(kind);
    parser.bump();
    parse_condition(parser);
    parse_embedded_statement(parser);
    parser.finish_node()
}

fn parse_do(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Do);
    parser.bump();
    parse_embedded_statement(parser);
    parser.expect_keyword(Keyword::While);
    parse_condition(parser);
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

fn parse_for(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::For);
    parser.bump();
    if parser.expect_punct(Punct::OpenParen) {
        if is_local_declaration(parser, 0) {
            parse_variable_declaration(parser, true);
        } else if !parser.at_punct(Punct::Semicolon) {
            parse_expression_list(parser);
        }
        parser.expect_punct(Punct::Semicolon);
        if !parser.at_punct(Punct::Semicolon) {
            parse_expression(parser);
        }
        parser.expect_punct(Punct::Semicolon);
        if !parser.at_punct(Punct::CloseParen) {
            parse_expression_list(parser);
        }
        parser.expect_punct(Punct::CloseParen);
    }
    parse_embedded_statement(parser);
    parser.finish_node()
}

fn parse_expression_list(parser: &mut dyn Parser) {
    loop {
        parse_expression(parser);
        if !parser.eat_punct(Punct::Comma) {
            break;
        }
    }
}

/// foreach ::= 'foreach' '(' (type identifier | declaration_expression) 'in' expression ')' statement
fn parse_foreach(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Foreach);
    parser.eat_contextual(Keyword::Await);
    parser.bump();
    if parser.expect_punct(Punct::OpenParen) {
        let deconstruction = (parser.at_contextual(Keyword::Var) && parser.peek(1).is_punct(Punct::OpenParen))
            || (parser.at_punct(Punct::OpenParen)
                && scan_type(parser, 0).is_none()
                && matching_close(parser, 0)
                    .map(|close| parser.peek(close + 1).is_keyword(Keyword::In))
                    .unwrap_or(false));
        if deconstruction && parser.at_punct(Punct::OpenParen) {
            parse_expression(parser);
        } else if deconstruction {
            parse_declaration_expression(parser);
        } else {
            parse_type(parser);
            if parser.at_identifier() {
                parser.bump_name();
            } else {
                parser.report_missing("identifier");
            }
        }
        parser.expect_keyword(Keyword::In);
        parse_expression(parser);
        parser.expect_punct(Punct::CloseParen);
    }
    parse_embedded_statement(parser);
    parser.finish_node()
}

/// `using (resource) statement` or `using var x = ...;`
fn parse_using(parser: &mut dyn Parser) -> NodeId {
    if !parser.peek(1).is_punct(Punct::OpenParen) {
        return parse_local_declaration(parser);
    }
    parse_using_statement(parser)
}

fn parse_using_statement(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Using);
    parser.eat_contextual(Keyword::Await);
    parser.bump();
    parse_using_resource(parser);
    parse_embedded_statement(parser);
    parser.finish_node()
}

fn parse_using_resource(parser: &mut dyn Parser) {
    if parser.expect_punct(Punct::OpenParen) {
        if is_local_declaration(parser, 0) {
            parse_variable_declaration(parser, true);
        } else {
            parse_expression(parser);
        }
        parser.expect_punct(Punct::CloseParen);
    }
}

/// `await foreach`, `await using (...)` and `await using var`
fn parse_awaited_statement(parser: &mut dyn Parser) -> NodeId {
    if parser.peek(1).is_keyword(Keyword::Foreach) {
        return parse_foreach(parser);
    }
    if !parser.peek(2).is_punct(Punct::OpenParen) {
        return parse_local_declaration(parser);
    }
    parse_using_statement(parser)
}

fn parse_fixed(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Fixed);
    parser.bump();
    if parser.expect_punct(Punct::OpenParen) {
        parse_variable_declaration(parser, true);
        parser.expect_punct(Punct::CloseParen);
    }
    parse_embedded_statement(parser);
    parser.finish_node()
}

fn parse_jump(parser: &mut dyn Parser, kind: NodeKind, with_value: bool) -> NodeId {
    parser.start_node(kind);
    parser.bump();
    if with_value && !parser.at_punct(Punct::Semicolon) && !parser.at_end() {
        parse_expression(parser);
    }
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

fn parse_goto(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Goto);
    parser.bump();
    match parser.current() {
        Token::Keyword(Keyword::Case) => {
            parser.bump();
            parse_expression(parser);
        }
        Token::Keyword(Keyword::Default) => parser.bump(),
        _ => {
            parse_identifier_name(parser);
        }
    }
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

fn parse_yield(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::YieldStatement);
    parser.bump_as(TokenRole::Keyword);
    let returns = parser.at_keyword(Keyword::Return);
    parser.bump();
    if returns && !parser.at_punct(Punct::Semicolon) {
        parse_expression(parser);
    }
    parser.expect_punct(Punct::Semicolon);
    parser.finish_node()
}

// === SWITCH ===

fn parse_switch(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Switch);
    parser.bump();
    parse_condition(parser);
    if parser.expect_punct(Punct::OpenBrace) {
        while !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
            let before = parser.position();
            if at_switch_label(parser) {
                parse_switch_section(parser);
            } else {
                parse_statement(parser);
            }
            if parser.position() == before {
                skip_token(parser);
            }
        }
        parser.expect_punct(Punct::CloseBrace);
    }
    parser.finish_node()
}

fn at_switch_label(parser: &dyn Parser) -> bool {
    parser.at_keyword(Keyword::Case)
        || (parser.at_keyword(Keyword::Default) && parser.peek(1).is_punct(Punct::Colon))
}

fn parse_switch_section(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::SwitchSection);
    while at_switch_label(parser) {
        if parser.at_keyword(Keyword::Case) {
            parser.start_node(NodeKind::CaseLabel);
            parser.bump();
            parse_pattern(parser);
            if parser.at_contextual(Keyword::When) {
                parse_when_clause(parser);
            }
            parser.expect_punct(Punct::Colon);
            parser.finish_node();
        } else {
            parser.start_node(NodeKind::DefaultLabel);
            parser.bump();
            parser.bump();
            parser.finish_node();
        }
    }
    while !at_switch_label(parser) && !parser.at_punct(Punct::CloseBrace) && !parser.at_end() {
        let before = parser.position();
        parse_statement(parser);
        if parser.position() == before {
            skip_token(parser);
        }
    }
    parser.finish_node()
}

// === EXCEPTIONS ===

fn parse_try(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::Try);
    parser.bump();
    parse_block(parser);
    while parser.at_keyword(Keyword::Catch) {
        parse_catch(parser);
    }
    if parser.at_keyword(Keyword::Finally) {
        parser.start_node(NodeKind::FinallyClause);
        parser.bump();
        parse_block(parser);
        parser.finish_node();
    }
    parser.finish_node()
}

fn parse_catch(parser: &mut dyn Parser) -> NodeId {
    parser.start_node(NodeKind::CatchClause);
    parser.bump();
    if parser.at_punct(Punct::OpenParen) {
        parser.start_node(NodeKind::CatchDeclaration);
        parser.bump();
        parse_type(parser);
        if parser.at_identifier() {
            parser.bump_name();
        }
        parser.expect_punct(Punct::CloseParen);
        parser.finish_node();
    }
    if parser.at_contextual(Keyword::When) {
        parser.start_node(NodeKind::CatchFilter);
        parser.bump_as(TokenRole::Keyword);
        parse_condition(parser);
        parser.finish_node();
    }
    parse_block(parser);
    parser.finish_node()
}

#[cfg(test)]
mod tests {
    use crate::syntax::test_support::render_statement;

    #[test]
    fn test_local_declaration_with_var() {
        assert_eq!(
            render_statement("var x = 1, y;"),
            "(LocalDeclaration (VariableDeclaration (IdentifierName var) \
             (VariableDeclarator x (EqualsValueClause = (Literal 1))) , (VariableDeclarator y)) ;)"
        );
    }

    #[test]
    fn test_generic_local_versus_expression() {
        assert_eq!(
            render_statement("List<int> xs;"),
            "(LocalDeclaration (VariableDeclaration (GenericName List (TypeArgumentList < \
             (PredefinedType int) >)) (VariableDeclarator xs)) ;)"
        );
        assert_eq!(
            render_statement("a.b = c;"),
            "(ExpressionStatement (Assignment (MemberAccess (IdentifierName a) . (IdentifierName b)) \
             = (IdentifierName c)) ;)"
        );
    }

    #[test]
    fn test_local_function() {
        assert_eq!(
            render_statement("int Add(int a) => a;"),
            "(LocalFunction (PredefinedType int) Add (ParameterList ( (Parameter (PredefinedType int) a) )) \
             (ArrowExpressionClause => (IdentifierName a)) ;)"
        );
    }

    #[test]
    fn test_foreach_and_labels() {
        assert_eq!(
            render_statement("foreach (var item in items) done: break;"),
            "(Foreach foreach ( (IdentifierName var) item in (IdentifierName items) ) \
             (LabeledStatement done : (Break break ;)))"
        );
    }

    #[test]
    fn test_switch_sections() {
        assert_eq!(
            render_statement("switch (x) { case int n when n > 0: return; default: break; }"),
            "(Switch switch ( (IdentifierName x) ) { (SwitchSection (CaseLabel case (DeclarationPattern \
             (PredefinedType int) (SingleVariableDesignation n)) (WhenClause when (Binary \
             (IdentifierName n) > (Literal 0))) :) (Return return ;)) (SwitchSection \
             (DefaultLabel default :) (Break break ;)) })"
        );
    }

    #[test]
    fn test_try_catch_filter() {
        assert_eq!(
            render_statement("try { } catch (Exception e) when (e != null) { }"),
            "(Try try (Block { }) (CatchClause catch (CatchDeclaration ( (IdentifierName Exception) e )) \
             (CatchFilter when ( (Binary (IdentifierName e) != (Literal null)) )) (Block { })))"
        );
    }

    #[test]
    fn test_yield_and_using_declaration() {
        assert_eq!(
            render_statement("yield return 1;"),
            "(YieldStatement yield return (Literal 1) ;)"
        );
        assert_eq!(
            render_statement("using var s = Open();"),
            "(LocalDeclaration using (VariableDeclaration (IdentifierName var) (VariableDeclarator s \
             (EqualsValueClause = (Invocation (IdentifierName Open) (ArgumentList ( )))))) ;)"
        );
    }
}
