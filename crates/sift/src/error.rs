//! The error every pipeline entry point returns.

use sift_codegen::CompileError;
use sift_common::span::Span;
use sift_parser::ParseError;
use sift_rt::EvalError;
use sift_typeck::{Type, TypeError};

/// A failed query, with the text and root type it was checked against.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct QueryError {
    pub input: String,
    /// Absent when the query failed before a root type was involved.
    pub root_type: Option<Type>,
    #[source]
    pub kind: QueryErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl QueryError {
    pub fn new(
        input: &str,
        root_type: Option<&Type>,
        kind: impl Into<QueryErrorKind>,
    ) -> Self {
        QueryError {
            input: input.to_string(),
            root_type: root_type.cloned(),
            kind: kind.into(),
        }
    }

    /// Where in `input` the error points, if anywhere.
    pub fn span(&self) -> Option<Span> {
        match &self.kind {
            QueryErrorKind::Parse(err) => Some(err.span()),
            QueryErrorKind::Type(err) => Some(err.span()),
            QueryErrorKind::Compile(err) => Some(err.span()),
            QueryErrorKind::Eval(_) => None,
        }
    }
}
