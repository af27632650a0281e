//! Parse error types.

use sift_common::span::Span;
use sift_common::token::TokenKind;
use sift_lexer::LexError;

/// A fatal parse failure. The parser never recovers; the first error ends
/// the parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected {expected}, found {}", found.describe())]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        span: Span,
    },
    #[error("unbound identifier `{name}`")]
    UnboundIdentifier { name: String, span: Span },
    #[error("expected a query of the form `param => body`, found a {shape}")]
    ExpectedLambda { shape: &'static str, span: Span },
    #[error("expression nested deeper than {max_depth} levels")]
    TooDeep { max_depth: usize, span: Span },
}

impl ParseError {
    /// Source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(err) => err.span(),
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnboundIdentifier { span, .. }
            | ParseError::ExpectedLambda { span, .. }
            | ParseError::TooDeep { span, .. } => *span,
        }
    }
}
