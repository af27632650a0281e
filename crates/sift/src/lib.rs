//! Sift: a small query-expression language that survives serialization.
//!
//! A query is text of the form `o => o.num > 2 && includes(array(1, 2, 3), o.id)`.
//! [`Engine`] parses it, infers a type for every node against a root record
//! type, and compiles it into a [`CompiledQuery`] callable over runtime
//! [`Value`]s. The canonical form of a query ([`Engine::format`]) is its
//! wire format.
//!
//! ```text
//! text -> Node -> TypedNode -> CompiledQuery -> Value
//! ```
//!
//! Data models come from TOML [`schema`]s and data from [`json`] documents.

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod json;
pub mod schema;

pub use cache::{CacheStats, QueryCache};
pub use config::{ConfigError, SiftConfig};
pub use engine::Engine;
pub use error::{QueryError, QueryErrorKind};
pub use json::DataError;
pub use schema::{Schema, SchemaError};

pub use sift_codegen::CompiledQuery;
pub use sift_parser::Node;
pub use sift_rt::{RecordValue, Value};
pub use sift_typeck::{FunctionResolver, RecordType, Type, TypedNode};
