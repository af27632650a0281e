//! Code generation for Sift queries.
//!
//! Turns a typed tree from `sift-typeck` into a composable
//! [`sift_rt::Expr`]. Codegen trusts inference: it reads the type on each
//! node and the function descriptor on each call, and only fails for
//! literals that cannot be read as their inferred type.
//!
//! ## Pipeline
//!
//! ```text
//! TypedNode -> Expr -> CompiledQuery (a callable over the root type)
//! ```

pub mod constant;
pub mod error;
mod expr;

use sift_rt::{EvalResult, Expr, FunctionValue, Scope, Value};
use sift_typeck::{PropertyResolver, Type, TypedNode};

pub use error::CompileError;

use expr::Compiler;

/// Compile a typed expression of any shape.
pub fn compile(node: &TypedNode, props: &dyn PropertyResolver) -> Result<Expr, CompileError> {
    Compiler::new(props).compile(node)
}

/// Compile a typed query lambda into a callable.
///
/// # Errors
///
/// Returns [`CompileError::NotAFunction`] when the root is not a lambda,
/// and any error [`compile`] reports.
#[tracing::instrument(level = "debug", skip_all, fields(ty = %node.ann.ty))]
pub fn compile_query(
    node: &TypedNode,
    props: &dyn PropertyResolver,
) -> Result<CompiledQuery, CompileError> {
    let (root, result) = match &node.ann.ty {
        Type::Function(param, result) => ((**param).clone(), (**result).clone()),
        _ => {
            return Err(CompileError::NotAFunction {
                found: "value",
                span: node.span,
            })
        }
    };
    let expr = compile(node, props)?;
    // A lambda closes over the scope it is evaluated in; the root has none.
    match expr.eval(&Scope::empty()) {
        Ok(Value::Function(function)) => {
            tracing::debug!(%root, %result, "compiled query");
            Ok(CompiledQuery {
                root,
                result,
                function,
            })
        }
        Ok(other) => Err(CompileError::NotAFunction {
            found: other.type_name(),
            span: node.span,
        }),
        Err(_) => Err(CompileError::NotAFunction {
            found: "failing expression",
            span: node.span,
        }),
    }
}

/// A compiled query: a function from the root type to `result`.
#[derive(Clone)]
pub struct CompiledQuery {
    root: Type,
    result: Type,
    function: FunctionValue,
}

impl CompiledQuery {
    pub fn root_type(&self) -> &Type {
        &self.root
    }

    pub fn result_type(&self) -> &Type {
        &self.result
    }

    /// True when the query is a predicate usable as a filter.
    pub fn is_predicate(&self) -> bool {
        self.result == Type::Bool
    }

    pub fn call(&self, root: Value) -> EvalResult {
        self.function.call(root)
    }
}

impl std::fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompiledQuery(({}) => {})", self.root, self.result)
    }
}
