use thiserror::Error;

use crate::ast::{Comparator, Token, TokenKind};
use crate::value::Value;

/// Malformed expression text, reported by both the lexer and the parser.
///
/// `position` is the 0-based character offset the problem was found at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at position {position}: {message}")]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            position,
            message: message.into(),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Reads every token up to and including `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn slice_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    /// Consumes `len` characters and builds a token from them.
    fn symbol(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.position;
        self.position += len;
        Token::new(kind, self.slice_from(start), start)
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Reads up to the closing `delim`, keeping escapes as written.
    ///
    /// Returns the raw body between the delimiters; callers decode it.
    fn read_delimited(&mut self, delim: char, what: &str) -> Result<String, SyntaxError> {
        let start = self.position;
        self.advance(); // opening delimiter
        let mut body = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == delim => {
                    self.advance();
                    return Ok(body);
                }
                '\\' => {
                    body.push(ch);
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => {
                            body.push(escaped);
                            self.advance();
                        }
                        None => break,
                    }
                }
                _ => {
                    body.push(ch);
                    self.advance();
                }
            }
        }

        Err(SyntaxError::new(
            start,
            format!("unterminated {}: missing closing {}", what, delim),
        ))
    }

    fn read_quoted_identifier(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let body = self.read_delimited('"', "quoted identifier")?;
        let name: String = serde_json::from_str(&format!("\"{}\"", body)).map_err(|e| {
            SyntaxError::new(start, format!("invalid quoted identifier: {}", e))
        })?;
        Ok(Token::new(
            TokenKind::QuotedIdentifier(name),
            self.slice_from(start),
            start,
        ))
    }

    fn read_raw_string(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let body = self.read_delimited('\'', "raw string")?;
        let text = body.replace("\\'", "'");
        Ok(Token::new(
            TokenKind::RawString(text),
            self.slice_from(start),
            start,
        ))
    }

    fn read_literal(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let body = self.read_delimited('`', "literal")?;
        let json = body.replace("\\`", "`");
        let value: serde_json::Value = serde_json::from_str(json.trim())
            .map_err(|e| SyntaxError::new(start, format!("invalid JSON literal: {}", e)))?;
        Ok(Token::new(
            TokenKind::Literal(Value::from(value)),
            self.slice_from(start),
            start,
        ))
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        if self.current_char() == Some('-') {
            self.advance();
        }
        if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            return Err(SyntaxError::new(
                start,
                "malformed number: '-' must be followed by a digit",
            ));
        }
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let text = self.slice_from(start);
        let n = text
            .parse::<i64>()
            .map_err(|_| SyntaxError::new(start, format!("malformed number: {}", text)))?;
        Ok(Token::new(TokenKind::Number(n), text, start))
    }

    /// Picks the two-character operator when `second` follows, else the
    /// single-character one.
    fn one_or_two(&mut self, second: char, double: TokenKind, single: TokenKind) -> Token {
        if self.peek_char(1) == Some(second) {
            self.symbol(double, 2)
        } else {
            self.symbol(single, 1)
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        let token = match self.current_char() {
            None => Token::new(TokenKind::Eof, "", self.position),
            Some('.') => self.symbol(TokenKind::Dot, 1),
            Some('*') => self.symbol(TokenKind::Star, 1),
            Some(',') => self.symbol(TokenKind::Comma, 1),
            Some(':') => self.symbol(TokenKind::Colon, 1),
            Some('@') => self.symbol(TokenKind::At, 1),
            Some('(') => self.symbol(TokenKind::LParen, 1),
            Some(')') => self.symbol(TokenKind::RParen, 1),
            Some('{') => self.symbol(TokenKind::LBrace, 1),
            Some('}') => self.symbol(TokenKind::RBrace, 1),
            Some(']') => self.symbol(TokenKind::RBracket, 1),
            Some('[') => match self.peek_char(1) {
                Some(']') => self.symbol(TokenKind::Flatten, 2),
                Some('?') => self.symbol(TokenKind::Filter, 2),
                _ => self.symbol(TokenKind::LBracket, 1),
            },
            Some('|') => self.one_or_two('|', TokenKind::Or, TokenKind::Pipe),
            Some('&') => self.one_or_two('&', TokenKind::And, TokenKind::Ampersand),
            Some('!') => self.one_or_two(
                '=',
                TokenKind::Comparator(Comparator::NotEqual),
                TokenKind::Not,
            ),
            Some('<') => self.one_or_two(
                '=',
                TokenKind::Comparator(Comparator::LessEqual),
                TokenKind::Comparator(Comparator::LessThan),
            ),
            Some('>') => self.one_or_two(
                '=',
                TokenKind::Comparator(Comparator::GreaterEqual),
                TokenKind::Comparator(Comparator::GreaterThan),
            ),
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.symbol(TokenKind::Comparator(Comparator::Equal), 2)
                } else {
                    return Err(SyntaxError::new(
                        self.position,
                        "unexpected '=' (did you mean '=='?)",
                    ));
                }
            }
            Some('"') => self.read_quoted_identifier()?,
            Some('\'') => self.read_raw_string()?,
            Some('`') => self.read_literal()?,
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let start = self.position;
                let ident = self.read_identifier();
                Token::new(TokenKind::Identifier(ident.clone()), ident, start)
            }
            Some(ch) => {
                return Err(SyntaxError::new(
                    self.position,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(token)
    }
}

#[test]
fn test_operators() {
    let mut lexer = Lexer::new("a || b && !c");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("a".to_string()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Or);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("b".to_string()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::And);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Not);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("c".to_string()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_positions() {
    let tokens = Lexer::new("foo[?bar]").tokenize().unwrap();
    let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 3, 5, 8, 9]);
    assert_eq!(tokens[1].text, "[?");
}
