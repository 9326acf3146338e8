pub mod error;
pub mod expressions;
pub mod statements;

use crate::ast::Program;
use crate::lexer::Tokenizer;
use crate::token::{Token, TokenKind};
pub use error::ParseError;
use statements::parse_statement;

pub struct Parser<I: Iterator<Item = Token>> {
    iter: std::iter::Peekable<I>,
    errors: Vec<ParseError>,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    /// Accepts any token source: a `Tokenizer`, or the `Vec<Token>` returned
    /// by `lex`.
    pub fn new(tokens: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: tokens.into_iter().peekable(),
            errors: Vec::new(),
        }
    }

    /// Consumes the next token. `Eof` is never consumed and reads as `None`.
    pub(crate) fn next_token(&mut self) -> Option<Token> {
        self.iter.next_if(|token| token.kind != TokenKind::Eof)
    }

    pub(crate) fn peek_token(&mut self) -> Option<&Token> {
        self.iter.peek().filter(|token| token.kind != TokenKind::Eof)
    }

    pub(crate) fn next_if_kind(&mut self, kind: &TokenKind) -> Option<Token> {
        self.iter.next_if(|token| &token.kind == kind)
    }

    pub(crate) fn parse_ident(&mut self) -> Result<std::rc::Rc<str>, ParseError> {
        let token = self.next_token();
        match token {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(name),
            _ => Err(ParseError::unexpected_other(
                error::Expected::Identifier,
                token,
            )),
        }
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<(), ParseError> {
        let token = self.next_token();
        match token {
            Some(Token { kind, .. }) if kind == token_kind => Ok(()),
            _ => Err(ParseError::unexpected_token(token_kind, token)),
        }
    }

    /// Records `error` and skips the rest of the statement it interrupted.
    ///
    /// Returns `true` when the token that caused the error was the `}` closing
    /// the block being parsed, so that block is already finished.
    pub(crate) fn recover(&mut self, error: ParseError, inside_block: bool) -> bool {
        let kind = error.token().map(|token| token.kind.clone());
        let depth = match kind {
            // Already consumed, the next statement starts right here.
            Some(TokenKind::SemiColon) => None,
            Some(TokenKind::RBrace) if inside_block => {
                self.errors.push(error);
                return true;
            }
            Some(TokenKind::LBrace) => Some(1),
            _ => Some(0),
        };
        self.errors.push(error);
        if let Some(depth) = depth {
            self.synchronize(depth, inside_block);
        }
        false
    }

    /// Drops tokens up to and including the next `;` that is not nested in
    /// braces. Inside a block it also stops in front of the block's `}`.
    fn synchronize(&mut self, mut depth: usize, inside_block: bool) {
        while let Some(kind) = self.peek_token().map(|token| token.kind.clone()) {
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => {
                    if inside_block {
                        return;
                    }
                }
                TokenKind::RBrace => depth -= 1,
                TokenKind::SemiColon if depth == 0 => {
                    self.next_token();
                    return;
                }
                _ => {}
            }
            self.next_token();
        }
    }

    /// Parses every statement of the input. Errors are collected instead of
    /// stopping at the first one, so all of them are returned together.
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut statements = Vec::new();

        while self.peek_token().is_some() {
            match parse_statement(self) {
                Ok(statement) => {
                    statements.push(statement);
                    self.next_if_kind(&TokenKind::SemiColon);
                }
                Err(err) => {
                    self.recover(err, false);
                }
            }
        }

        let errors = std::mem::take(&mut self.errors);
        if errors.is_empty() {
            Ok(Program { statements })
        } else {
            tracing::debug!(errors = errors.len(), "parsing finished with errors");
            Err(errors)
        }
    }
}

pub fn parse(input: &str) -> Result<Program, Vec<ParseError>> {
    Parser::new(Tokenizer::new(input)).parse_program()
}

#[cfg(test)]
mod tests {
    use super::error::Expected;
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            let tokenizer = Tokenizer::new(input);
            let mut parser = Parser::new(tokenizer);

            let program = parser.parse_program().unwrap();

            assert_eq!(program.to_string(), expected)
        }
    }

    fn parse_errors(input: &str) -> Vec<ParseError> {
        parse(input).unwrap_err()
    }

    #[test]
    fn test_statements() {
        let tests = vec![
            ("let x = 5;", "let x = 5;\n"),
            ("let y = true;", "let y = true;\n"),
            ("let foobar = y;", "let foobar = y;\n"),
            ("return 5;", "return 5;\n"),
            ("return 10", "return 10;\n"),
            ("return add(15);", "return add(15);\n"),
            ("\"hello world\";", "\"hello world\";\n"),
            ("let a = 1 let b = 2", "let a = 1;\nlet b = 2;\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_expression_1() {
        let tests = vec![
            ("-a * b", "((-a) * b);\n"),
            ("!-a", "(!(-a));\n"),
            ("a + b + c", "((a + b) + c);\n"),
            ("a + b - c", "((a + b) - c);\n"),
            ("a * b * c", "((a * b) * c);\n"),
            ("a * b / c", "((a * b) / c);\n"),
            ("a + b / c", "(a + (b / c));\n"),
            (
                "a + b * c + d / e - f",
                "(((a + (b * c)) + (d / e)) - f);\n",
            ),
            ("3 + 4; -5 * 5", "(3 + 4);\n((-5) * 5);\n"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4));\n"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4));\n"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)));\n",
            ),
            ("true", "true;\n"),
            ("3 > 5 == false", "((3 > 5) == false);\n"),
            ("!true != !!false", "((!true) != (!(!false)));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_expression_precedence() {
        let tests = vec![
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4);\n"),
            ("(5 + 5) * 2", "((5 + 5) * 2);\n"),
            ("5 + 5 * 2", "(5 + (5 * 2));\n"),
            ("2 / (5 + 5)", "(2 / (5 + 5));\n"),
            ("-(5 + 5)", "(-(5 + 5));\n"),
            ("!(true == true)", "(!(true == true));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_call_expression() {
        let tests = vec![
            ("a + add(b * c) + d", "((a + add((b * c))) + d);\n"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)));\n",
            ),
            (
                "add(a + b + c * d / f + g)",
                "add((((a + b) + ((c * d) / f)) + g));\n",
            ),
            ("f()", "f();\n"),
            ("f(1)(2)", "f(1)(2);\n"),
            ("-f(1)", "(-f(1));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_conditional() {
        let tests = vec![
            ("if (x < y) { x }", "if (x < y) {x;};\n"),
            (
                "if (x < y) { x } else { y }",
                "if (x < y) {x;} else {y;};\n",
            ),
            (
                "if (a) { let b = a; b } else { }",
                "if a {let b = a; b;} else {};\n",
            ),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_function() {
        let tests = vec![
            ("fn() {};", "fn() {};\n"),
            ("fn(x) { x; };", "fn(x) {x;};\n"),
            ("fn(x, y, z) { x }", "fn(x, y, z) {x;};\n"),
            (
                "let add = fn(a, b) { return a + b; };",
                "let add = fn(a, b) {return (a + b);};\n",
            ),
            ("fn(x) { x }(5)", "fn(x) {x;}(5);\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_missing_assign_is_reported_and_parsing_continues() {
        let errors = parse_errors("let x 5; let y = 10; let 838383;");

        assert_eq!(
            errors,
            vec![
                ParseError::UnexpectedToken {
                    expected: Expected::Token(TokenKind::Assign),
                    got: Token::new(TokenKind::Int("5".into()), 6, 7),
                },
                ParseError::UnexpectedToken {
                    expected: Expected::Identifier,
                    got: Token::new(TokenKind::Int("838383".into()), 25, 31),
                },
            ]
        );
    }

    #[test]
    fn test_error_on_semicolon_does_not_skip_next_statement() {
        let errors = parse_errors("let x = ; let = 1;");

        assert_eq!(
            errors,
            vec![
                ParseError::NoPrefixRule(Token::new(TokenKind::SemiColon, 8, 9)),
                ParseError::UnexpectedToken {
                    expected: Expected::Identifier,
                    got: Token::new(TokenKind::Assign, 14, 15),
                },
            ]
        );
    }

    #[test]
    fn test_bare_return_is_rejected() {
        let errors = parse_errors("return;");

        assert_eq!(
            errors,
            vec![ParseError::NoPrefixRule(Token::new(TokenKind::SemiColon, 6, 7))]
        );
    }

    #[test]
    fn test_if_requires_parentheses() {
        let errors = parse_errors("if x { 1 }");

        assert_eq!(
            errors,
            vec![ParseError::UnexpectedToken {
                expected: Expected::Token(TokenKind::LParen),
                got: Token::new(TokenKind::Ident("x".into()), 3, 4),
            }]
        );
    }

    #[test]
    fn test_illegal_token_and_premature_end() {
        let errors = parse_errors("1 + @; fn(x");

        assert_eq!(
            errors,
            vec![
                ParseError::NoPrefixRule(Token::new(TokenKind::Illegal("@".into()), 4, 5)),
                ParseError::PrematureEndOfInput {
                    expected: Expected::Token(TokenKind::RParen),
                },
            ]
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        let errors = parse_errors("9223372036854775808");

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ParseError::InvalidInteger { token, .. } if token.start == 0 && token.end == 19
        ));
        assert_eq!(parse("9223372036854775807").unwrap().to_string(), "9223372036854775807;\n");
    }

    #[test]
    fn test_unclosed_block() {
        let errors = parse_errors("if (true) { 1");

        assert_eq!(
            errors,
            vec![ParseError::PrematureEndOfInput {
                expected: Expected::Token(TokenKind::RBrace),
            }]
        );
    }

    #[test]
    fn test_error_inside_block_is_reported_once() {
        let errors = parse_errors("if (x) { let y 5; z }; let w = 1;");

        assert_eq!(
            errors,
            vec![ParseError::UnexpectedToken {
                expected: Expected::Token(TokenKind::Assign),
                got: Token::new(TokenKind::Int("5".into()), 15, 16),
            }]
        );
    }

    #[test]
    fn test_error_inside_block_keeps_following_statements() {
        let errors = parse_errors("fn() { let x = ; } let g 1;");

        assert_eq!(
            errors,
            vec![
                ParseError::NoPrefixRule(Token::new(TokenKind::SemiColon, 15, 16)),
                ParseError::UnexpectedToken {
                    expected: Expected::Token(TokenKind::Assign),
                    got: Token::new(TokenKind::Int("1".into()), 25, 26),
                },
            ]
        );
    }

    #[test]
    fn test_closing_brace_as_error_token_ends_block() {
        let errors = parse_errors("if (true) { let a = } let b 2;");

        assert_eq!(
            errors,
            vec![
                ParseError::NoPrefixRule(Token::new(TokenKind::RBrace, 20, 21)),
                ParseError::UnexpectedToken {
                    expected: Expected::Token(TokenKind::Assign),
                    got: Token::new(TokenKind::Int("2".into()), 28, 29),
                },
            ]
        );
    }

    #[test]
    fn test_recovery_skips_semicolons_nested_in_braces() {
        let errors = parse_errors("let x 5 + fn() { 1; 2 }; let y = 2;");

        assert_eq!(
            errors,
            vec![ParseError::UnexpectedToken {
                expected: Expected::Token(TokenKind::Assign),
                got: Token::new(TokenKind::Int("5".into()), 6, 7),
            }]
        );
    }

    #[test]
    fn test_trailing_separator_is_rejected() {
        assert_eq!(
            parse_errors("a(1, )"),
            vec![ParseError::NoPrefixRule(Token::new(TokenKind::RParen, 5, 6))]
        );
        assert_eq!(
            parse_errors("fn(x,) {}"),
            vec![ParseError::UnexpectedToken {
                expected: Expected::Identifier,
                got: Token::new(TokenKind::RParen, 5, 6),
            }]
        );
        assert_eq!(
            parse_errors("a(,)"),
            vec![ParseError::NoPrefixRule(Token::new(TokenKind::Comma, 2, 3))]
        );
    }

    #[test]
    fn test_parse_lexed_tokens() {
        let input = "let add = fn(a, b) { a + b }; add(1, 2)";
        let tokens = crate::lexer::lex(input);

        let from_tokens = Parser::new(tokens).parse_program().unwrap();
        let from_source = parse(input).unwrap();

        assert_eq!(from_tokens, from_source);
        assert_eq!(
            from_tokens.to_string(),
            "let add = fn(a, b) {(a + b);};\nadd(1, 2);\n"
        );
    }

    #[test]
    fn test_parse_tokens_without_eof() {
        let tokens = vec![
            Token::new(TokenKind::Int("1".into()), 0, 1),
            Token::new(TokenKind::Plus, 2, 3),
            Token::new(TokenKind::Int("2".into()), 4, 5),
        ];

        assert_eq!(
            Parser::new(tokens).parse_program().unwrap().to_string(),
            "(1 + 2);\n"
        );
    }
}
