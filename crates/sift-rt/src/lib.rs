//! Sift runtime.
//!
//! Compiled queries are trees of [`Expr`] closures over [`Value`]s. This
//! crate owns the value model, parameter scopes and the primitive
//! operations that built-in operators and functions evaluate to.
//!
//! ## Modules
//!
//! - [`value`]: runtime values, records and function values
//! - [`expr`]: executable expressions and parameter scopes
//! - [`ops`]: arithmetic and comparison semantics, including null handling
//! - [`string`], [`collections`], [`datetime`]: built-in function bodies

pub mod collections;
pub mod datetime;
pub mod error;
pub mod expr;
pub mod ops;
pub mod string;
pub mod value;

pub use error::{EvalError, EvalResult};
pub use expr::{Expr, ParamId, Scope};
pub use value::{FunctionValue, RecordValue, Value};
