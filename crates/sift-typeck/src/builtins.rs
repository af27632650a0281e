//! Built-in functions.
//!
//! Four resolvers, registered in this order by
//! [`FunctionRegistry::with_builtins`](crate::FunctionRegistry::with_builtins):
//! - strings: `length`, `contains`, `startsWith`, `endsWith`, `lower`,
//!   `upper`, `trim`
//! - collections: `any`, `every`, `includes`, `count`
//! - `array(...)`, element type from the expected result or the first
//!   concrete argument
//! - `dateTimeOffset(ticks)`
//!
//! Names match case-insensitively.

use sift_rt::{collections, datetime, string, EvalResult, Expr, Value};

use crate::constraints::TypeVariable;
use crate::functions::{FunctionDescriptor, FunctionRegistry, FunctionResolver};
use crate::ty::Type;

/// Register every built-in resolver.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register(StringFunctions);
    registry.register(CollectionFunctions);
    registry.register(ArrayConstructor);
    registry.register(DateTimeFunctions);
}

// ── Helpers ────────────────────────────────────────────────────────────

fn fits(args: &[TypeVariable], params: &[Type]) -> bool {
    args.len() == params.len() && args.iter().zip(params).all(|(arg, p)| arg.admits(p))
}

fn signature(
    args: &[TypeVariable],
    name: &str,
    result: Type,
    params: Vec<Type>,
    build: impl Fn(Vec<Expr>) -> Expr + Send + Sync + 'static,
) -> Option<FunctionDescriptor> {
    fits(args, &params).then(|| FunctionDescriptor::new(name, result, params, build))
}

fn call1(op: fn(&Value) -> EvalResult) -> impl Fn(Vec<Expr>) -> Expr + Send + Sync + 'static {
    move |args| Expr::apply(args, move |values| op(&values[0]))
}

fn call2(
    op: fn(&Value, &Value) -> EvalResult,
) -> impl Fn(Vec<Expr>) -> Expr + Send + Sync + 'static {
    move |args| Expr::apply(args, move |values| op(&values[0], &values[1]))
}

// ── Strings ────────────────────────────────────────────────────────────

pub struct StringFunctions;

impl FunctionResolver for StringFunctions {
    fn resolve(
        &self,
        name: &str,
        _result: &TypeVariable,
        args: &[TypeVariable],
    ) -> Option<FunctionDescriptor> {
        let unary = |name: &str, result: Type, op: fn(&Value) -> EvalResult| {
            signature(args, name, result, vec![Type::String], call1(op))
        };
        let binary = |name: &str, op: fn(&Value, &Value) -> EvalResult| {
            signature(args, name, Type::Bool, vec![Type::String, Type::String], call2(op))
        };
        match name.to_lowercase().as_str() {
            "length" => unary("length", Type::Int32, string::length),
            "lower" => unary("lower", Type::String, string::to_lower),
            "upper" => unary("upper", Type::String, string::to_upper),
            "trim" => unary("trim", Type::String, string::trim),
            "contains" => binary("contains", string::contains),
            "startswith" => binary("startsWith", string::starts_with),
            "endswith" => binary("endsWith", string::ends_with),
            _ => None,
        }
    }
}

// ── Collections ────────────────────────────────────────────────────────

pub struct CollectionFunctions;

impl FunctionResolver for CollectionFunctions {
    fn resolve(
        &self,
        name: &str,
        _result: &TypeVariable,
        args: &[TypeVariable],
    ) -> Option<FunctionDescriptor> {
        let elem = args
            .first()
            .and_then(TypeVariable::resolved)
            .and_then(Type::element_type)
            .cloned();
        let predicate = |name: &str, elem: Type, op: fn(&Value, &Value) -> EvalResult| {
            let params = vec![
                Type::sequence(elem.clone()),
                Type::function(elem, Type::Bool),
            ];
            signature(args, name, Type::Bool, params, call2(op))
        };
        match name.to_lowercase().as_str() {
            "any" if args.len() == 1 => signature(
                args,
                "any",
                Type::Bool,
                vec![Type::sequence(elem?)],
                call1(collections::non_empty),
            ),
            "any" => predicate("any", elem?, collections::any),
            "every" => predicate("every", elem?, collections::every),
            "includes" => {
                // The element type can also come from the item.
                let elem = elem.or_else(|| args.get(1)?.resolved().cloned())?;
                signature(
                    args,
                    "includes",
                    Type::Bool,
                    vec![Type::sequence(elem.clone()), elem],
                    call2(collections::includes),
                )
            }
            "count" => signature(
                args,
                "count",
                Type::Int32,
                vec![Type::sequence(elem?)],
                call1(collections::count),
            ),
            _ => None,
        }
    }
}

// ── Arrays ─────────────────────────────────────────────────────────────

/// `array(a, b, ...)`: a fixed-arity array of one element type.
pub struct ArrayConstructor;

impl FunctionResolver for ArrayConstructor {
    fn resolve(
        &self,
        name: &str,
        result: &TypeVariable,
        args: &[TypeVariable],
    ) -> Option<FunctionDescriptor> {
        if !name.eq_ignore_ascii_case("array") {
            return None;
        }
        let elem = result
            .resolved()
            .and_then(Type::element_type)
            .cloned()
            .or_else(|| args.iter().find_map(|arg| arg.resolved().cloned()))?;
        signature(
            args,
            "array",
            Type::array(elem.clone()),
            vec![elem; args.len()],
            |args| Expr::apply(args, |values| Ok(Value::array(values.iter().cloned()))),
        )
    }
}

// ── Dates ──────────────────────────────────────────────────────────────

pub struct DateTimeFunctions;

impl FunctionResolver for DateTimeFunctions {
    fn resolve(
        &self,
        name: &str,
        _result: &TypeVariable,
        args: &[TypeVariable],
    ) -> Option<FunctionDescriptor> {
        if !name.eq_ignore_ascii_case("dateTimeOffset") {
            return None;
        }
        signature(
            args,
            "dateTimeOffset",
            Type::DateTimeOffset,
            vec![Type::Int64],
            call1(datetime::construct),
        )
    }
}
