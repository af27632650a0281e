//! Sift type checker: constraint-based inference over query lambdas.
//!
//! Given a parsed query and the type of its root parameter, assigns a
//! concrete [`Type`] to every node. Member types and call signatures may be
//! unknown when first seen; they are recorded as structural constraints and
//! settled once enough is known.
//!
//! # Architecture
//!
//! - [`ty`]: types, records and inference slots
//! - [`constraints`]: type variables, constraint bags and the merge rule
//! - [`properties`]: member resolution for concrete types
//! - [`functions`]: the pluggable function registry
//! - [`builtins`]: built-in string, collection, array and date functions
//! - [`infer`]: the inference passes
//! - [`typed`]: the typed tree handed to code generation
//! - [`diagnostics`]: ariadne rendering of type errors

pub mod builtins;
pub mod constraints;
pub mod diagnostics;
pub mod error;
pub mod functions;
pub mod infer;
pub mod properties;
mod slots;
pub mod ty;
pub mod typed;
mod unify;

pub use constraints::{TypeConstraints, TypeVariable};
pub use error::{ConstraintReason, TypeError};
pub use functions::{AmbiguityPolicy, FunctionDescriptor, FunctionRegistry, FunctionResolver};
pub use infer::infer;
pub use properties::{CachingPropertyResolver, DefaultPropertyResolver, Property, PropertyResolver};
pub use ty::{Field, RecordType, Slot, Type};
pub use typed::{render_typed, TypeInfo, TypedNode};
