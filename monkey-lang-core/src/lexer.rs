use crate::token::{lookup_ident, Token, TokenKind};

/// Lazily splits source text into tokens.
///
/// Once the input is exhausted `next_token` keeps returning `Eof`. As an
/// iterator the tokenizer yields that `Eof` exactly once and then stops.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    iter: std::iter::Peekable<std::str::CharIndices<'a>>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let iter = input.char_indices().peekable();
        Self {
            input,
            iter,
            finished: false,
        }
    }

    fn is_letter(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self
            .iter
            .next_if(|(_, ch)| Self::is_letter(*ch) || ch.is_ascii_digit())
            .is_some()
        {}

        let end = self.next_idx();
        Token::new(lookup_ident(&self.input[start..end]), start, end)
    }

    fn read_number(&mut self, start: usize) -> Token {
        while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}

        let end = self.next_idx();
        Token::new(TokenKind::Int(self.input[start..end].into()), start, end)
    }

    fn read_string(&mut self, start: usize) -> Token {
        let contents_start = self.next_idx();
        loop {
            match self.iter.next() {
                Some((idx, '"')) => {
                    let contents = &self.input[contents_start..idx];
                    return Token::new(TokenKind::String(contents.into()), start, self.next_idx());
                }
                None => {
                    tracing::trace!(start, "unterminated string literal");
                    return Token::new(
                        TokenKind::Illegal(self.input[start..].into()),
                        start,
                        self.input.len(),
                    );
                }
                _ => {}
            }
        }
    }

    /// Reads a one character operator, or the two character one when it is
    /// followed by `=`.
    fn read_operator(&mut self, start: usize, single: TokenKind, double: TokenKind) -> Token {
        let kind = if self.iter.next_if(|(_, ch)| *ch == '=').is_some() {
            double
        } else {
            single
        };
        Token::new(kind, start, self.next_idx())
    }

    fn next_idx(&mut self) -> usize {
        self.iter
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }

    pub fn next_token(&mut self) -> Token {
        while self.iter.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}

        let Some((idx, ch)) = self.iter.next() else {
            let end = self.input.len();
            return Token::new(TokenKind::Eof, end, end);
        };

        let kind = match ch {
            '=' => return self.read_operator(idx, TokenKind::Assign, TokenKind::Equal),
            '!' => return self.read_operator(idx, TokenKind::Bang, TokenKind::NotEqual),
            '"' => return self.read_string(idx),
            c if Self::is_letter(c) => return self.read_identifier(idx),
            c if c.is_ascii_digit() => return self.read_number(idx),
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '<' => TokenKind::LessThan,
            '>' => TokenKind::GreaterThan,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::SemiColon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => {
                tracing::trace!(position = idx, character = %ch, "illegal character");
                TokenKind::Illegal(ch.to_string().into())
            }
        };
        Token::new(kind, idx, self.next_idx())
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

pub fn lex(input: &str) -> Vec<Token> {
    Tokenizer::new(input).collect()
}
