//! Shared types for the Sift query pipeline.
//!
//! Every stage speaks in terms of byte-offset [`span::Span`]s and the
//! [`token::Token`] vocabulary produced by the lexer.

pub mod span;
pub mod token;

pub use span::{LineIndex, Span};
pub use token::{Token, TokenKind};
