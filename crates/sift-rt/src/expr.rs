//! Composable executable expressions.
//!
//! An [`Expr`] is a shared closure from a [`Scope`] of parameter bindings to
//! a value. Compiled queries are trees of these closures, built once and
//! evaluated many times, possibly from several threads at once.

use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, EvalResult};
use crate::value::{FunctionValue, Value};

/// Identifies one lambda parameter within a compiled query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Persistent list of parameter bindings, innermost first.
#[derive(Clone, Default)]
pub struct Scope(Option<Arc<Frame>>);

struct Frame {
    param: ParamId,
    value: Value,
    parent: Scope,
}

impl Scope {
    pub fn empty() -> Self {
        Scope(None)
    }

    /// A new scope with `param` bound on top of this one.
    pub fn bind(&self, param: ParamId, value: Value) -> Scope {
        Scope(Some(Arc::new(Frame {
            param,
            value,
            parent: self.clone(),
        })))
    }

    pub fn lookup(&self, param: ParamId) -> Option<&Value> {
        let mut frame = self.0.as_deref();
        while let Some(f) = frame {
            if f.param == param {
                return Some(&f.value);
            }
            frame = f.parent.0.as_deref();
        }
        None
    }
}

/// An executable expression.
#[derive(Clone)]
pub struct Expr(Arc<dyn Fn(&Scope) -> EvalResult + Send + Sync>);

impl Expr {
    pub fn new(f: impl Fn(&Scope) -> EvalResult + Send + Sync + 'static) -> Self {
        Expr(Arc::new(f))
    }

    pub fn eval(&self, scope: &Scope) -> EvalResult {
        (self.0)(scope)
    }

    /// A captured value, returned as-is on every evaluation.
    pub fn constant(value: Value) -> Self {
        Expr::new(move |_| Ok(value.clone()))
    }

    /// The value bound to `param`.
    pub fn param(param: ParamId) -> Self {
        Expr::new(move |scope| {
            scope
                .lookup(param)
                .cloned()
                .ok_or(EvalError::UnboundParameter { id: param.0 })
        })
    }

    /// A one-parameter function closing over the scope it is evaluated in.
    pub fn lambda(param: ParamId, body: Expr) -> Self {
        Expr::new(move |scope| {
            let captured = scope.clone();
            let body = body.clone();
            Ok(Value::Function(FunctionValue::new(move |arg| {
                body.eval(&captured.bind(param, arg))
            })))
        })
    }

    /// Read the field `name` of the record `instance` evaluates to.
    pub fn field(instance: Expr, name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Expr::new(move |scope| match instance.eval(scope)? {
            Value::Record(record) => Ok(record.field(&name)),
            Value::Null => Err(EvalError::NullReference {
                operation: format!("member `{name}`"),
            }),
            other => Err(EvalError::UnexpectedValue {
                expected: "record",
                found: other.type_name(),
            }),
        })
    }

    /// Apply `f` to the values of `args`, evaluated left to right.
    pub fn apply(args: Vec<Expr>, f: impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static) -> Self {
        Expr::new(move |scope| {
            let values = args
                .iter()
                .map(|arg| arg.eval(scope))
                .collect::<EvalResult<Vec<_>>>()?;
            f(&values)
        })
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Expr(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_binding_shadows_outer() {
        let scope = Scope::empty()
            .bind(ParamId(0), Value::Int32(1))
            .bind(ParamId(0), Value::Int32(2));
        assert_eq!(scope.lookup(ParamId(0)), Some(&Value::Int32(2)));
        assert_eq!(scope.lookup(ParamId(1)), None);
    }

    #[test]
    fn lambda_captures_enclosing_scope() {
        // x => y => x
        let inner = Expr::lambda(ParamId(1), Expr::param(ParamId(0)));
        let outer = Expr::lambda(ParamId(0), inner);
        let f = outer.eval(&Scope::empty()).unwrap();
        let g = f.call(Value::Int32(7)).unwrap();
        assert_eq!(g.call(Value::Int32(9)).unwrap(), Value::Int32(7));
    }

    #[test]
    fn field_access_on_null_fails() {
        let record = Value::Record(crate::RecordValue::new("Order", [("Num", Value::Int32(2))]));
        let num = Expr::field(Expr::constant(record), "num");
        assert_eq!(num.eval(&Scope::empty()).unwrap(), Value::Int32(2));
        let err = Expr::field(Expr::constant(Value::Null), "num")
            .eval(&Scope::empty())
            .unwrap_err();
        assert_eq!(err.to_string(), "member `num` called on null");
    }

    #[test]
    fn unbound_parameter_is_an_error() {
        let err = Expr::param(ParamId(3)).eval(&Scope::empty()).unwrap_err();
        assert_eq!(err, EvalError::UnboundParameter { id: 3 });
    }
}
