//! Sift lexer: pull-based tokenizer for the query language.
//!
//! Each call to [`Lexer::next_token`] classifies the characters at the current
//! position into exactly one [`Token`]. No token array is built up front; the
//! parser pulls tokens as it needs them. Errors are fatal: after an
//! unterminated string or an unrecognized character the lexer does not try to
//! resynchronize.

mod cursor;

use cursor::Cursor;
use sift_common::span::Span;
use sift_common::token::{Token, TokenKind};

/// A fatal tokenization failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string literal starting at offset {start}")]
    UnterminatedString { start: u32 },
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar { ch: char, offset: u32 },
}

impl LexError {
    /// Source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { start } => Span::at(*start),
            LexError::UnexpectedChar { ch, offset } => {
                Span::new(*offset, offset + ch.len_utf8() as u32)
            }
        }
    }
}

/// The Sift lexer.
///
/// Implements `Iterator<Item = Result<Token, LexError>>`; the iterator yields
/// the final `Eof` token and then stops. It also stops after the first error.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            finished: false,
        }
    }

    /// Convenience: tokenize the whole input, including whitespace and the
    /// trailing `Eof` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(source).collect()
    }

    /// Classify the next characters into one token.
    ///
    /// Once the input is exhausted every further call returns `Eof`.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, start, start));
        };

        let token = match c {
            // ── Single-character tokens ──────────────────────────────────
            '.' => self.single_char_token(TokenKind::Dot, start),
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            '+' => self.single_char_token(TokenKind::Plus, start),
            '-' => self.single_char_token(TokenKind::Minus, start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '/' => self.single_char_token(TokenKind::Slash, start),
            '%' => self.single_char_token(TokenKind::Percent, start),

            // ── One- or two-character operators ──────────────────────────
            '=' => self.one_or_two(start, '>', TokenKind::Arrow, TokenKind::Equal),
            '<' => self.one_or_two(start, '=', TokenKind::LessOrEqual, TokenKind::LessThan),
            '>' => {
                self.one_or_two(start, '=', TokenKind::GreaterOrEqual, TokenKind::GreaterThan)
            }
            '!' => self.two_only(start, '=', TokenKind::NotEqual)?,
            '&' => self.two_only(start, '&', TokenKind::AndAlso)?,
            '|' => self.two_only(start, '|', TokenKind::OrElse)?,

            // ── Literals, names, whitespace ──────────────────────────────
            '"' => self.lex_string(start)?,
            '0'..='9' => self.lex_number(start),
            c if is_ident_start(c) => self.lex_ident(start),
            c if c.is_whitespace() => {
                self.cursor.eat_while(char::is_whitespace);
                Token::new(TokenKind::Whitespace, start, self.cursor.pos())
            }

            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    offset: start,
                })
            }
        };
        Ok(token)
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// `c` alone is `single`; `c` followed by `second` is `double`.
    fn one_or_two(&mut self, start: u32, second: char, double: TokenKind, single: TokenKind) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat(second) { double } else { single };
        Token::new(kind, start, self.cursor.pos())
    }

    /// Operators such as `&&` whose first character is meaningless alone.
    fn two_only(&mut self, start: u32, second: char, kind: TokenKind) -> Result<Token, LexError> {
        let first = self.cursor.advance().unwrap_or_default();
        if self.cursor.eat(second) {
            Ok(Token::new(kind, start, self.cursor.pos()))
        } else {
            Err(LexError::UnexpectedChar {
                ch: first,
                offset: start,
            })
        }
    }

    /// Digit run with an optional single fraction. `1.` lexes as `1` followed
    /// by `.` because the dot must be followed by a digit to be a fraction.
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.at_fraction() {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        Token::with_text(TokenKind::Number, start, self.cursor.pos(), self.cursor.since(start))
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.eat_while(is_ident_continue);
        Token::with_text(TokenKind::Identifier, start, self.cursor.pos(), self.cursor.since(start))
    }

    /// Quoted string literal. Known escapes are `\\ \" \n \r \t \v`; any
    /// other escape passes through as the backslash plus the character.
    fn lex_string(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.cursor.advance() {
                None => return Err(LexError::UnterminatedString { start }),
                Some('"') => break,
                Some('\\') => match self.cursor.advance() {
                    None => return Err(LexError::UnterminatedString { start }),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('v') => value.push('\u{000B}'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some(c) => value.push(c),
            }
        }
        Ok(Token::with_text(TokenKind::String, start, self.cursor.pos(), value))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(tok) if tok.kind == TokenKind::Eof => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("lexes")
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn two_char_operators_win_over_prefixes() {
        assert_eq!(
            kinds("=> = != <= >= < > && ||"),
            vec![
                TokenKind::Arrow,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::LessOrEqual,
                TokenKind::GreaterOrEqual,
                TokenKind::LessThan,
                TokenKind::GreaterThan,
                TokenKind::AndAlso,
                TokenKind::OrElse,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn fraction_requires_a_digit_after_the_dot() {
        let toks = Lexer::tokenize("1.5 2.x").expect("lexes");
        assert_eq!(toks[0].text(), "1.5");
        assert_eq!(toks[2].text(), "2");
        assert_eq!(toks[3].kind, TokenKind::Dot);
    }

    #[test]
    fn next_token_keeps_returning_eof() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().map(|t| t.kind), Ok(TokenKind::Eof));
        assert_eq!(lexer.next_token().map(|t| t.kind), Ok(TokenKind::Eof));
    }

    #[test]
    fn iterator_stops_after_error() {
        let items: Vec<_> = Lexer::new("a # b").collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(
            items[2],
            Err(LexError::UnexpectedChar { ch: '#', offset: 2 })
        ));
    }

    #[test]
    fn lone_ampersand_is_fatal() {
        assert_eq!(
            Lexer::tokenize("a & b"),
            Err(LexError::UnexpectedChar { ch: '&', offset: 2 })
        );
    }
}
