//! Lookahead scans used to pick a production before committing to it
//!
//! Every scan is pure: it only peeks at significant tokens relative to the
//! cursor and returns the offset just past what it recognised. Scans give
//! up after `MAX_LOOKAHEAD_TOKENS`.

use crate::config::constants::compile_time::syntax::MAX_LOOKAHEAD_TOKENS;
use crate::grammar::builders::atomic::Parser;
use crate::grammar::keywords::Keyword;
use crate::tokens::{Punct, Token};

fn too_far(start: usize, at: usize) -> bool {
    at.saturating_sub(start) > MAX_LOOKAHEAD_TOKENS
}

pub fn is_identifier(parser: &dyn Parser, n: usize) -> bool {
    matches!(parser.peek(n), Token::Identifier)
}

// === TYPES ===

/// type_argument_list ::= '<' type (',' type)* '>' | '<' ','* '>'
pub fn scan_type_argument_list(parser: &dyn Parser, n: usize) -> Option<usize> {
    if !parser.peek(n).is_punct(Punct::Lt) {
        return None;
    }
    let mut i = n + 1;

    if matches!(parser.peek(i), Token::Punct(Punct::Gt | Punct::Comma)) {
        while parser.peek(i).is_punct(Punct::Comma) {
            i += 1;
        }
        return parser.peek(i).is_punct(Punct::Gt).then_some(i + 1);
    }

    loop {
        // attributes on type arguments do not exist; `in`/`out` only on parameters
        i = scan_type(parser, i)?;
        match parser.peek(i) {
            Token::Punct(Punct::Comma) => i += 1,
            Token::Punct(Punct::Gt) => return Some(i + 1),
            _ => return None,
        }
        if too_far(n, i) {
            return None;
        }
    }
}

/// Dotted, possibly generic and alias-qualified name
pub fn scan_name(parser: &dyn Parser, n: usize) -> Option<usize> {
    if !is_identifier(parser, n) {
        return None;
    }
    let mut i = n;
    if parser.peek(i + 1).is_punct(Punct::ColonColon) {
        i += 2;
        if !is_identifier(parser, i) {
            return None;
        }
    }

    loop {
        i += 1;
        if let Some(end) = scan_type_argument_list(parser, i) {
            i = end;
        }
        if parser.peek(i).is_punct(Punct::Dot) && is_identifier(parser, i + 1) {
            i += 1;
        } else {
            return Some(i);
        }
        if too_far(n, i) {
            return None;
        }
    }
}

fn scan_tuple_type(parser: &dyn Parser, n: usize) -> Option<usize> {
    let mut i = n + 1;
    let mut elements = 0;
    loop {
        i = scan_type(parser, i)?;
        if is_identifier(parser, i) {
            i += 1;
        }
        elements += 1;
        match parser.peek(i) {
            Token::Punct(Punct::Comma) => i += 1,
            Token::Punct(Punct::CloseParen) if elements >= 2 => return Some(i + 1),
            _ => return None,
        }
        if too_far(n, i) {
            return None;
        }
    }
}

/// `delegate*` [calling convention] `<` types `>`
fn scan_function_pointer(parser: &dyn Parser, n: usize) -> Option<usize> {
    let mut i = n + 2;
    if is_identifier(parser, i) {
        i += 1;
    }
    if parser.peek(i).is_punct(Punct::OpenBracket) {
        i = matching_close(parser, i)? + 1;
    }
    scan_type_argument_list(parser, i)
}

/// type ::= (predefined | name | tuple | function_pointer) ('?' | '*' | rank)*
pub fn scan_type(parser: &dyn Parser, n: usize) -> Option<usize> {
    let mut i = match parser.peek(n) {
        Token::Keyword(keyword) if keyword.is_predefined_type() => n + 1,
        Token::Identifier => scan_name(parser, n)?,
        Token::Punct(Punct::OpenParen) => scan_tuple_type(parser, n)?,
        Token::Keyword(Keyword::Delegate) if parser.peek(n + 1).is_punct(Punct::Star) => {
            scan_function_pointer(parser, n)?
        }
        _ => return None,
    };

    loop {
        match parser.peek(i) {
            Token::Punct(Punct::Question | Punct::Star) => i += 1,
            Token::Punct(Punct::OpenBracket) => {
                let mut j = i + 1;
                while parser.peek(j).is_punct(Punct::Comma) {
                    j += 1;
                }
                if !parser.peek(j).is_punct(Punct::CloseBracket) {
                    return Some(i);
                }
                i = j + 1;
            }
            _ => return Some(i),
        }
        if too_far(n, i) {
            return None;
        }
    }
}

/// Type scan that leaves a trailing `?` alone when it reads as a
/// conditional operator (`x is T ? a : b`)
pub fn scan_type_in_expression(parser: &dyn Parser, n: usize) -> Option<usize> {
    let end = scan_type(parser, n)?;
    if end > n + 1 && parser.peek(end - 1).is_punct(Punct::Question) && can_start_operand(parser, end)
    {
        return Some(end - 1);
    }
    Some(end)
}

/// Tokens that confirm a `<...>` in an expression was a type argument list
pub fn generic_follows(parser: &dyn Parser, n: usize) -> bool {
    matches!(
        parser.peek(n),
        Token::Punct(
            Punct::OpenParen
                | Punct::CloseParen
                | Punct::CloseBracket
                | Punct::CloseBrace
                | Punct::Colon
                | Punct::Semicolon
                | Punct::Comma
                | Punct::Dot
                | Punct::Question
                | Punct::EqEq
                | Punct::BangEq
                | Punct::Pipe
                | Punct::Caret
                | Punct::AmpAmp
                | Punct::PipePipe
                | Punct::Amp
                | Punct::OpenBracket
        ) | Token::Eof
            | Token::InterpolationClose
    )
}

// === BRACKETS ===

/// Offset of the bracket closing the one at `n`
pub fn matching_close(parser: &dyn Parser, n: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = n;
    loop {
        match parser.peek(i) {
            Token::Punct(Punct::OpenParen | Punct::OpenBracket | Punct::OpenBrace) => depth += 1,
            Token::Punct(Punct::CloseParen | Punct::CloseBracket | Punct::CloseBrace) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            Token::Eof => return None,
            _ => {}
        }
        i += 1;
        if too_far(n, i) {
            return None;
        }
    }
}

// === EXPRESSIONS ===

/// Tokens that can begin an operand
pub fn can_start_operand(parser: &dyn Parser, n: usize) -> bool {
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
                    Keyword::This
                        | Keyword::Base
                        | Keyword::New
                        | Keyword::Typeof
                        | Keyword::Default
                        | Keyword::Checked
                        | Keyword::Unchecked
                        | Keyword::Sizeof
                        | Keyword::Null
                        | Keyword::True
                        | Keyword::False
                        | Keyword::Delegate
                        | Keyword::Stackalloc
                )
        }
        Token::Punct(Punct::OpenParen | Punct::Bang | Punct::Tilde | Punct::PlusPlus | Punct::MinusMinus) => {
            true
        }
        _ => false,
    }
}

/// Tokens that can begin any expression, prefix operators included
pub fn can_start_expression(parser: &dyn Parser, n: usize) -> bool {
    can_start_operand(parser, n)
        || matches!(
            parser.peek(n),
            Token::Punct(
                Punct::Plus
                    | Punct::Minus
                    | Punct::Amp
                    | Punct::Star
                    | Punct::Caret
                    | Punct::OpenBracket
                    | Punct::DotDot
            ) | Token::Keyword(Keyword::Throw | Keyword::Ref)
        )
}

/// `x =>`, `async x =>`, `(...) =>`, `static (...) =>`
pub fn is_lambda_start(parser: &dyn Parser, n: usize) -> bool {
    let mut i = n;
    loop {
        let modifier = (parser.peek_contextual(i, Keyword::Async) && !parser.peek(i + 1).is_punct(Punct::Arrow))
            || parser.peek(i).is_keyword(Keyword::Static);
        if !modifier {
            break;
        }
        i += 1;
    }
    match parser.peek(i) {
        Token::Identifier => parser.peek(i + 1).is_punct(Punct::Arrow),
        Token::Punct(Punct::OpenParen) => matching_close(parser, i)
            .map(|close| parser.peek(close + 1).is_punct(Punct::Arrow))
            .unwrap_or(false),
        _ => false,
    }
}

/// `(T)x`: a parenthesised type followed by something that can only be an
/// operand
pub fn is_cast(parser: &dyn Parser, n: usize) -> bool {
    let Some(end) = scan_type(parser, n + 1) else {
        return false;
    };
    if !parser.peek(end).is_punct(Punct::CloseParen) {
        return false;
    }
    let after = end + 1;
    let predefined = end == n + 2 && matches!(parser.peek(n + 1), Token::Keyword(k) if k.is_predefined_type());
    if predefined {
        return can_start_expression(parser, after);
    }
    match parser.peek(after) {
        Token::Identifier => !parser.peek_contextual(after, Keyword::With),
        _ => can_start_operand(parser, after),
    }
}

/// `from x in` or `from T x in`
pub fn is_query_start(parser: &dyn Parser, n: usize) -> bool {
    if !parser.peek_contextual(n, Keyword::From) {
        return false;
    }
    if is_identifier(parser, n + 1) && parser.peek(n + 2).is_keyword(Keyword::In) {
        return true;
    }
    match scan_type(parser, n + 1) {
        Some(end) => is_identifier(parser, end) && parser.peek(end + 1).is_keyword(Keyword::In),
        None => false,
    }
}

// === DECLARATIONS ===

/// type identifier followed by something a declarator allows
pub fn scan_declaration(parser: &dyn Parser, n: usize) -> Option<usize> {
    let end = scan_type(parser, n)?;
    if !is_identifier(parser, end) {
        return None;
    }
    matches!(
        parser.peek(end + 1),
        Token::Punct(
            Punct::Eq | Punct::Semicolon | Punct::Comma | Punct::OpenBracket | Punct::CloseParen
        ) | Token::Keyword(Keyword::In)
    )
    .then_some(end)
}

/// Type followed by a name and `(` or `<`: a method or local function
pub fn scan_function_header(parser: &dyn Parser, n: usize) -> Option<usize> {
    let end = scan_type(parser, n)?;
    if !is_identifier(parser, end) {
        return None;
    }
    match parser.peek(end + 1) {
        Token::Punct(Punct::OpenParen) => Some(end),
        Token::Punct(Punct::Lt) => {
            let after = scan_type_argument_list(parser, end + 1)?;
            parser.peek(after).is_punct(Punct::OpenParen).then_some(end)
        }
        _ => None,
    }
}

/// Whether a contextual modifier at `n` is followed by more declaration
pub fn contextual_modifier_applies(parser: &dyn Parser, n: usize) -> bool {
    match parser.peek(n + 1) {
        Token::Keyword(keyword) => {
            keyword.is_modifier()
                || matches!(
                    keyword,
                    Keyword::Class
                        | Keyword::Struct
                        | Keyword::Interface
                        | Keyword::Enum
                        | Keyword::Delegate
                        | Keyword::Void
                        | Keyword::Event
                        | Keyword::Implicit
                        | Keyword::Explicit
                )
                || (keyword.is_predefined_type() && member_name_follows_type(parser, n + 1))
        }
        Token::Identifier => {
            let next = parser.peek_text(n + 1);
            matches!(next, "partial" | "async" | "record" | "required" | "file" | "scoped")
                || member_name_follows_type(parser, n + 1)
        }
        Token::Punct(Punct::OpenParen) => parser.peek_contextual(n, Keyword::Async),
        _ => false,
    }
}

/// A type at `n` followed by a member name, `operator` or `this`
fn member_name_follows_type(parser: &dyn Parser, n: usize) -> bool {
    match scan_type(parser, n) {
        Some(end) => {
            is_identifier(parser, end)
                || matches!(parser.peek(end), Token::Keyword(Keyword::Operator | Keyword::This))
        }
        None => false,
    }
}

/// `record` starting a record declaration
pub fn is_record_start(parser: &dyn Parser, n: usize) -> bool {
    parser.peek_contextual(n, Keyword::Record)
        && (is_identifier(parser, n + 1)
            || matches!(
                parser.peek(n + 1),
                Token::Keyword(Keyword::Class | Keyword::Struct)
            ))
}
