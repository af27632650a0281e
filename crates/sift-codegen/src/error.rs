//! Code generation errors.
//!
//! Inference has already checked the tree, so these only surface for
//! literals that do not fit their inferred type or for typed trees that
//! were assembled by hand.

use std::sync::Arc;

use sift_common::span::Span;
use sift_typeck::Type;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("`null` cannot be used as a value of type `{ty}`")]
    NullToValueType { ty: Type, span: Span },
    #[error("`{raw}` is not a valid `{ty}` literal")]
    InvalidLiteral { raw: Arc<str>, ty: Type, span: Span },
    #[error("operand of `{op}` must be `bool`, found `{ty}`")]
    NonBooleanOperand {
        op: &'static str,
        ty: Type,
        span: Span,
    },
    #[error("call to `{name}` has no resolved function")]
    MissingFunction { name: Arc<str>, span: Span },
    #[error("query compiled to a {found}, expected a function")]
    NotAFunction { found: &'static str, span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::NullToValueType { span, .. }
            | CompileError::InvalidLiteral { span, .. }
            | CompileError::NonBooleanOperand { span, .. }
            | CompileError::MissingFunction { span, .. }
            | CompileError::NotAFunction { span, .. } => *span,
        }
    }
}
