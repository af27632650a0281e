//! Type errors.
//!
//! Every error carries the span of the node whose slot failed, so the
//! diagnostics renderer can point at the offending part of the query.

use std::fmt;
use std::sync::Arc;

use sift_common::span::Span;

use crate::ty::Type;

/// Why a concrete type failed a constraint bag.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintReason {
    MissingMember { name: Arc<str> },
    MissingInterface { interface: Type },
    IncompatibleBase { base: Type },
    Numeric { expected: bool },
    Nullable { expected: bool },
    Lambda { expected: bool },
}

impl fmt::Display for ConstraintReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negated = |expected: bool| if expected { "not " } else { "" };
        match self {
            ConstraintReason::MissingMember { name } => write!(f, "has no member `{name}`"),
            ConstraintReason::MissingInterface { interface } => {
                write!(f, "does not implement `{interface}`")
            }
            ConstraintReason::IncompatibleBase { base } => write!(f, "is unrelated to `{base}`"),
            ConstraintReason::Numeric { expected } => write!(f, "is {}numeric", negated(*expected)),
            ConstraintReason::Nullable { expected } => {
                write!(f, "is {}nullable", negated(*expected))
            }
            ConstraintReason::Lambda { expected } => {
                write!(f, "is {}a function", negated(*expected))
            }
        }
    }
}

/// A type inference failure. All of these abort inference.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TypeError {
    /// No registered resolver matched a call.
    #[error("no function matches `{name}({args})`")]
    UnresolvedCall {
        name: Arc<str>,
        /// The argument constraints, rendered for the message.
        args: String,
        span: Span,
    },
    #[error("type `{ty}` {reason}")]
    TypeConstraintMismatch {
        ty: Type,
        reason: ConstraintReason,
        span: Span,
    },
    /// Two constraint bags disagree on a flag or base type.
    #[error("conflicting {what} constraints")]
    ConstraintConflict { what: &'static str, span: Span },
    #[error("expected `{expected}`, found `{found}`")]
    IncompatibleTypes {
        expected: Type,
        found: Type,
        span: Span,
    },
    #[error("argument {} of `{function}` must be a lambda", .index + 1)]
    LambdaArgumentExpected {
        function: Arc<str>,
        index: usize,
        span: Span,
    },
    #[error("call to `{name}` is ambiguous: {candidates} resolvers match")]
    AmbiguousCall {
        name: Arc<str>,
        candidates: usize,
        span: Span,
    },
    #[error("the type of this expression depends on itself")]
    InfiniteType { span: Span },
    #[error("cannot infer the parameter or result type of this lambda")]
    IncompleteLambda { span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::UnresolvedCall { span, .. }
            | TypeError::TypeConstraintMismatch { span, .. }
            | TypeError::ConstraintConflict { span, .. }
            | TypeError::IncompatibleTypes { span, .. }
            | TypeError::LambdaArgumentExpected { span, .. }
            | TypeError::AmbiguousCall { span, .. }
            | TypeError::InfiniteType { span }
            | TypeError::IncompleteLambda { span } => *span,
        }
    }
}
