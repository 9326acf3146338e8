use crate::ast::{Identifier, LetStatement, ReturnStatement, Statement};
use crate::parser::expressions::{parse_expression, Precedence};
use crate::parser::{ParseError, Parser};
use crate::token::{Token, TokenKind};

pub fn parse_statement<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<Statement, ParseError> {
    match parser.peek_token().map(|t| &t.kind) {
        Some(TokenKind::Let) => Ok(Statement::Let(parse_let_statement(parser)?)),
        Some(TokenKind::Return) => Ok(Statement::Return(parse_return_statement(parser)?)),
        _ => Ok(Statement::Expression(parse_expression_statement(parser)?)),
    }
}

fn parse_let_statement<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<LetStatement, ParseError> {
    parser.expect_token(TokenKind::Let)?;
    let name = parser.parse_ident()?;
    parser.expect_token(TokenKind::Assign)?;
    let value = parse_expression(parser, Precedence::Lowest)?;

    Ok(LetStatement {
        identifier: Identifier { name },
        value,
    })
}

// A value is required: `return;` is rejected by the expression parser.
fn parse_return_statement<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<ReturnStatement, ParseError> {
    parser.expect_token(TokenKind::Return)?;
    let value = parse_expression(parser, Precedence::Lowest)?;

    Ok(ReturnStatement { value })
}

fn parse_expression_statement<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<crate::ast::Expression, ParseError> {
    parse_expression(parser, Precedence::Lowest)
}
