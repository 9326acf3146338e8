use std::fmt::Display;

use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    PrematureEndOfInput { expected: Expected },
    #[error("expected {expected}, got `{}` at position {}", .got.kind, .got.start)]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("no prefix parse rule for `{}` at position {}", .0.kind, .0.start)]
    NoPrefixRule(Token),
    #[error("could not parse `{}` at position {} as an integer: {source}", .token.kind, .token.start)]
    InvalidInteger {
        token: Token,
        source: std::num::ParseIntError,
    },
}

#[derive(Debug, PartialEq)]
pub enum Expected {
    Token(TokenKind),
    Identifier,
    Expression,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "`{}`", kind),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
        }
    }
}

impl ParseError {
    pub fn premature_end_expected_expression() -> Self {
        ParseError::PrematureEndOfInput {
            expected: Expected::Expression,
        }
    }

    pub fn unexpected_token(expected: TokenKind, got: Option<Token>) -> ParseError {
        Self::unexpected_other(Expected::Token(expected), got)
    }

    pub fn unexpected_other(expected: Expected, got: Option<Token>) -> ParseError {
        match got {
            Some(got) => ParseError::UnexpectedToken { expected, got },
            None => ParseError::PrematureEndOfInput { expected },
        }
    }

    /// The token the error points at, if it was not caused by the end of input.
    pub fn token(&self) -> Option<&Token> {
        match self {
            ParseError::PrematureEndOfInput { .. } => None,
            ParseError::UnexpectedToken { got, .. } => Some(got),
            ParseError::NoPrefixRule(token) => Some(token),
            ParseError::InvalidInteger { token, .. } => Some(token),
        }
    }
}
