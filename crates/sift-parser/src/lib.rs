//! Sift parser: query text to an immutable, alpha-comparable AST.
//!
//! [`parse`] accepts any expression of the grammar; [`parse_lambda`] is the
//! entry point for whole queries and additionally requires the root to be a
//! `param => body` lambda. Parsing stops at the first error.

pub mod alpha;
pub mod ast;
pub mod error;
mod parser;
pub mod print;

pub use alpha::alpha_eq;
pub use ast::{BinaryOp, Node, NodeKind, Param, Symbol};
pub use error::ParseError;
pub use parser::ParseOptions;
pub use print::to_canonical_string;

use parser::Parser;

/// Parse an expression with default options.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse an expression.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    let mut p = Parser::new(source, *options);
    let node = parser::expressions::root(&mut p)?;
    tracing::trace!(shape = node.shape(), "parsed expression");
    Ok(node)
}

/// Parse a query, which must be a single lambda at the root.
pub fn parse_lambda(source: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    let node = parse_with(source, options)?;
    if !node.is_lambda() {
        return Err(ParseError::ExpectedLambda {
            shape: node.shape(),
            span: node.span,
        });
    }
    tracing::debug!(query = %node, "parsed query");
    Ok(node)
}
