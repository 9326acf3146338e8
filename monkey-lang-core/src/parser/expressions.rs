use super::error::ParseError;
use super::statements::parse_statement;
use crate::ast::{BlockStatement, Expression, Identifier, InfixOperationKind, PrefixOperationKind};
use crate::parser::Parser;
use crate::token::{Token, TokenKind};

#[derive(PartialOrd, PartialEq, Debug, Clone, Copy)]
pub enum Precedence {
    Lowest = 0,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

enum InfixRule {
    Operation(InfixOperationKind),
    Call,
}

/// The infix rule a token starts, together with the precedence it binds with.
fn infix_rule(token: &TokenKind) -> Option<(Precedence, InfixRule)> {
    use InfixOperationKind as Kind;

    let operation = |precedence, kind| Some((precedence, InfixRule::Operation(kind)));
    match token {
        TokenKind::Equal => operation(Precedence::Equals, Kind::Equal),
        TokenKind::NotEqual => operation(Precedence::Equals, Kind::NotEqual),
        TokenKind::LessThan => operation(Precedence::LessGreater, Kind::LessThan),
        TokenKind::GreaterThan => operation(Precedence::LessGreater, Kind::GreaterThan),
        TokenKind::Plus => operation(Precedence::Sum, Kind::Plus),
        TokenKind::Minus => operation(Precedence::Sum, Kind::Minus),
        TokenKind::Asterisk => operation(Precedence::Product, Kind::Multiply),
        TokenKind::Slash => operation(Precedence::Product, Kind::Divide),
        TokenKind::LParen => Some((Precedence::Call, InfixRule::Call)),
        _ => None,
    }
}

pub fn parse_expression<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
    precedence: Precedence,
) -> Result<Expression, ParseError> {
    let Some(token) = parser.next_token() else {
        return Err(ParseError::premature_end_expected_expression());
    };
    let mut left_expression = prefix_parsing(token, parser)?;

    while let Some((next_precedence, rule)) =
        parser.peek_token().and_then(|token| infix_rule(&token.kind))
    {
        if precedence >= next_precedence {
            break;
        }
        parser.next_token();

        left_expression = match rule {
            InfixRule::Operation(kind) => Expression::InfixOperation(
                kind,
                Box::new(left_expression),
                Box::new(parse_expression(parser, next_precedence)?),
            ),
            InfixRule::Call => parse_call_expression(left_expression, parser)?,
        };
    }

    Ok(left_expression)
}

pub fn prefix_parsing<I: Iterator<Item = Token>>(
    token: Token,
    parser: &mut Parser<I>,
) -> Result<Expression, ParseError> {
    match &token.kind {
        TokenKind::Ident(name) => Ok(Expression::Identifier(Identifier { name: name.clone() })),
        TokenKind::Int(digits) => match digits.parse() {
            Ok(value) => Ok(Expression::IntegerLiteral(value)),
            Err(source) => Err(ParseError::InvalidInteger { token, source }),
        },
        TokenKind::String(contents) => Ok(Expression::StringLiteral(contents.to_string())),
        TokenKind::True => Ok(Expression::BooleanLiteral(true)),
        TokenKind::False => Ok(Expression::BooleanLiteral(false)),
        TokenKind::Bang => parse_prefix_operation(PrefixOperationKind::Bang, parser),
        TokenKind::Minus => parse_prefix_operation(PrefixOperationKind::Minus, parser),
        TokenKind::LParen => parse_grouped_expression(parser),
        TokenKind::If => parse_if_expression(parser),
        TokenKind::Function => parse_function_literal(parser),
        _ => Err(ParseError::NoPrefixRule(token)),
    }
}

fn parse_prefix_operation<I: Iterator<Item = Token>>(
    kind: PrefixOperationKind,
    parser: &mut Parser<I>,
) -> Result<Expression, ParseError> {
    Ok(Expression::PrefixOperation(
        kind,
        Box::new(parse_expression(parser, Precedence::Prefix)?),
    ))
}

fn parse_grouped_expression<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<Expression, ParseError> {
    let expression = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::RParen)?;

    Ok(expression)
}

fn parse_sequence<T, I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
    parse_element: impl Fn(&mut Parser<I>) -> Result<T, ParseError>,
    separator: TokenKind,
    terminator: TokenKind,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();
    if parser.next_if_kind(&terminator).is_some() {
        return Ok(elements);
    }

    // After a separator another element is required: `f(1, )` is rejected.
    loop {
        elements.push(parse_element(parser)?);

        match parser.next_token() {
            Some(next) if next.kind == separator => continue,
            Some(next) if next.kind == terminator => return Ok(elements),
            next => return Err(ParseError::unexpected_token(terminator, next)),
        }
    }
}

fn parse_if_expression<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<Expression, ParseError> {
    parser.expect_token(TokenKind::LParen)?;
    let condition = Box::new(parse_expression(parser, Precedence::Lowest)?);
    parser.expect_token(TokenKind::RParen)?;

    let consequence = parse_block_statement(parser)?;

    let alternative = if parser.next_if_kind(&TokenKind::Else).is_some() {
        Some(parse_block_statement(parser)?)
    } else {
        None
    };

    Ok(Expression::IfExpression {
        condition,
        consequence,
        alternative,
    })
}

/// Parses `{ statement* }`. Statements may be separated by optional semicolons.
///
/// A statement that fails to parse is recorded on the parser and skipped up to
/// the next `;` or the closing `}`.
pub(crate) fn parse_block_statement<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<BlockStatement, ParseError> {
    parser.expect_token(TokenKind::LBrace)?;

    let mut statements = Vec::new();
    loop {
        match parser.peek_token() {
            Some(Token {
                kind: TokenKind::RBrace,
                ..
            }) => {
                parser.next_token();
                return Ok(BlockStatement { statements });
            }
            None => return Err(ParseError::unexpected_token(TokenKind::RBrace, None)),
            Some(_) => match parse_statement(parser) {
                Ok(statement) => {
                    statements.push(statement);
                    parser.next_if_kind(&TokenKind::SemiColon);
                }
                Err(error @ ParseError::PrematureEndOfInput { .. }) => return Err(error),
                Err(error) => {
                    if parser.recover(error, true) {
                        return Ok(BlockStatement { statements });
                    }
                }
            },
        }
    }
}

fn parse_function_literal<I: Iterator<Item = Token>>(
    parser: &mut Parser<I>,
) -> Result<Expression, ParseError> {
    parser.expect_token(TokenKind::LParen)?;
    let parameters = parse_sequence(
        parser,
        |parser| parser.parse_ident().map(|name| Identifier { name }),
        TokenKind::Comma,
        TokenKind::RParen,
    )?;

    let body = parse_block_statement(parser)?;

    Ok(Expression::FunctionLiteral { parameters, body })
}

fn parse_call_expression<I: Iterator<Item = Token>>(
    function: Expression,
    parser: &mut Parser<I>,
) -> Result<Expression, ParseError> {
    let arguments = parse_sequence(
        parser,
        |parser| parse_expression(parser, Precedence::Lowest),
        TokenKind::Comma,
        TokenKind::RParen,
    )?;

    Ok(Expression::CallExpression {
        function: Box::new(function),
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precedence_of(token: &TokenKind) -> Precedence {
        infix_rule(token).map_or(Precedence::Lowest, |(precedence, _)| precedence)
    }

    #[test]
    fn test_precedence_order() {
        let ordered = [
            TokenKind::Equal,
            TokenKind::LessThan,
            TokenKind::Plus,
            TokenKind::Asterisk,
            TokenKind::LParen,
        ];
        for pair in ordered.windows(2) {
            assert!(precedence_of(&pair[0]) < precedence_of(&pair[1]));
        }
        assert!(Precedence::Product < Precedence::Prefix);
        assert!(Precedence::Prefix < Precedence::Call);
        assert_eq!(precedence_of(&TokenKind::SemiColon), Precedence::Lowest);
        assert_eq!(precedence_of(&TokenKind::NotEqual), Precedence::Equals);
    }
}
