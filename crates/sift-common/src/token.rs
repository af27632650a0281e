use serde::Serialize;

use crate::span::Span;

/// A token produced by the Sift lexer.
///
/// `text` carries the token's payload where the kind alone does not: the
/// identifier name, the numeric literal digits, or the *unescaped* contents
/// of a string literal. Punctuation and whitespace tokens leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: Option<String>,
}

impl Token {
    /// Create a payload-free token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
            text: None,
        }
    }

    /// Create a token that carries text.
    pub fn with_text(kind: TokenKind, start: u32, end: u32, text: impl Into<String>) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
            text: Some(text.into()),
        }
    }

    /// The token's payload, or the empty string for punctuation.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Every kind of token in the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Operators ──────────────────────────────────────────────────────
    /// `.`
    Dot,
    /// `&&`
    AndAlso,
    /// `||`
    OrElse,
    /// `=>`
    Arrow,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,

    // ── Delimiters ─────────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,

    // ── Literals and names ─────────────────────────────────────────────
    /// A quoted string literal; `text` holds the unescaped contents.
    String,
    /// A digit run with an optional fraction; `text` holds the digits.
    Number,
    Identifier,

    // ── Special ────────────────────────────────────────────────────────
    /// A run of whitespace characters.
    Whitespace,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Whether the parser skips this token.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }

    /// Human-readable description used in parse errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Dot => "`.`",
            TokenKind::AndAlso => "`&&`",
            TokenKind::OrElse => "`||`",
            TokenKind::Arrow => "`=>`",
            TokenKind::Equal => "`=`",
            TokenKind::NotEqual => "`!=`",
            TokenKind::LessOrEqual => "`<=`",
            TokenKind::GreaterOrEqual => "`>=`",
            TokenKind::LessThan => "`<`",
            TokenKind::GreaterThan => "`>`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Comma => "`,`",
            TokenKind::String => "string literal",
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Eof => "end of input",
        }
    }
}
