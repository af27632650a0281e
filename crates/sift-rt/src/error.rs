//! Evaluation errors.

/// A failure while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("{op} by zero")]
    DivideByZero { op: &'static str },
    #[error("cannot apply {op} to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{operation} called on null")]
    NullReference { operation: String },
    #[error("parameter #{id} is not bound")]
    UnboundParameter { id: u32 },
    #[error("{ticks} ticks is outside the representable date range")]
    InvalidDate { ticks: i64 },
}

pub type EvalResult<T = crate::Value> = Result<T, EvalError>;
