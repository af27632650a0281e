//! Recursive descent parser for Sift queries.
//!
//! The parser pulls tokens from the lexer on demand and keeps at most two
//! significant tokens of lookahead; whitespace is dropped as it is pulled.
//! Lambda parameters are resolved to [`Symbol`]s while parsing, so every
//! identifier in the produced tree already refers to its binder.

pub(crate) mod expressions;

use std::collections::VecDeque;

use sift_common::span::Span;
use sift_common::token::{Token, TokenKind};
use sift_lexer::Lexer;

use crate::ast::Symbol;
use crate::error::ParseError;

/// Tunables for a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum expression nesting depth before the parse is rejected.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

pub(crate) struct Parser<'src> {
    lexer: Lexer<'src>,
    /// Significant tokens pulled but not yet consumed.
    lookahead: VecDeque<Token>,
    /// Lambda parameters in scope, innermost last.
    scopes: Vec<Symbol>,
    /// Current expression nesting depth.
    depth: usize,
    options: ParseOptions,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, options: ParseOptions) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: VecDeque::with_capacity(2),
            scopes: Vec::new(),
            depth: 0,
            options,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Make sure at least `n + 1` significant tokens are buffered.
    fn fill(&mut self, n: usize) -> Result<(), ParseError> {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_token()?;
            if !token.kind.is_trivia() {
                self.lookahead.push_back(token);
            }
        }
        Ok(())
    }

    /// The Nth significant token ahead (`nth(0)` is the current token).
    pub(crate) fn nth(&mut self, n: usize) -> Result<&Token, ParseError> {
        self.fill(n)?;
        Ok(&self.lookahead[n])
    }

    pub(crate) fn current(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.nth(0)?.kind)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        Ok(self.current()? == kind)
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume and return the current token.
    pub(crate) fn bump(&mut self) -> Result<Token, ParseError> {
        self.fill(0)?;
        // fill(0) guarantees one buffered token.
        Ok(self
            .lookahead
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, 0, 0)))
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<Option<Token>, ParseError> {
        if self.at(kind)? {
            self.bump().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Consume a token of the given kind or fail.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.eat(kind)? {
            Some(token) => Ok(token),
            None => Err(self.unexpected(kind.describe())?),
        }
    }

    /// Build an error describing the current token.
    pub(crate) fn unexpected(&mut self, expected: &'static str) -> Result<ParseError, ParseError> {
        let token = self.nth(0)?;
        Ok(ParseError::UnexpectedToken {
            expected,
            found: token.kind,
            span: token.span,
        })
    }

    // ── Nesting ────────────────────────────────────────────────────────

    pub(crate) fn enter(&mut self, span: Span) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(ParseError::TooDeep {
                max_depth: self.options.max_depth,
                span,
            });
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    // ── Binders ────────────────────────────────────────────────────────

    pub(crate) fn push_binder(&mut self, symbol: Symbol) {
        self.scopes.push(symbol);
    }

    pub(crate) fn pop_binder(&mut self) {
        self.scopes.pop();
    }

    /// Innermost parameter spelled `name`, if any.
    pub(crate) fn lookup_binder(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find(|s| s.name() == name)
    }
}
