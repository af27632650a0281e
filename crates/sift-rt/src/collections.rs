//! Sequence operations backing the built-in collection functions.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

fn items<'v>(value: &'v Value, operation: &str) -> EvalResult<&'v [Value]> {
    match value {
        Value::Array(items) => Ok(&**items),
        Value::Null => Err(EvalError::NullReference {
            operation: operation.to_string(),
        }),
        other => Err(EvalError::UnexpectedValue {
            expected: "array",
            found: other.type_name(),
        }),
    }
}

/// Whether the predicate holds for some element. Stops at the first hit.
pub fn any(seq: &Value, predicate: &Value) -> EvalResult {
    for item in items(seq, "any")? {
        if predicate.call(item.clone())?.as_bool()? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Whether the sequence has any element at all.
pub fn non_empty(seq: &Value) -> EvalResult {
    Ok(Value::Bool(!items(seq, "any")?.is_empty()))
}

/// Whether the predicate holds for every element. Stops at the first miss.
pub fn every(seq: &Value, predicate: &Value) -> EvalResult {
    for item in items(seq, "every")? {
        if !predicate.call(item.clone())?.as_bool()? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Whether `item` is an element of the sequence, by value equality.
pub fn includes(seq: &Value, item: &Value) -> EvalResult {
    Ok(Value::Bool(items(seq, "includes")?.contains(item)))
}

pub fn count(seq: &Value) -> EvalResult {
    let n = items(seq, "count")?.len();
    Ok(Value::Int32(i32::try_from(n).unwrap_or(i32::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FunctionValue;

    fn nums() -> Value {
        Value::array([Value::Int32(1), Value::Int32(2), Value::Int32(3)])
    }

    fn greater_than(n: i32) -> Value {
        Value::Function(FunctionValue::new(move |v| {
            Ok(Value::Bool(matches!(v, Value::Int32(x) if x > n)))
        }))
    }

    #[test]
    fn quantifiers() {
        assert_eq!(any(&nums(), &greater_than(2)).unwrap(), Value::Bool(true));
        assert_eq!(every(&nums(), &greater_than(2)).unwrap(), Value::Bool(false));
        assert_eq!(every(&nums(), &greater_than(0)).unwrap(), Value::Bool(true));
        let empty = Value::array([]);
        assert_eq!(any(&empty, &greater_than(0)).unwrap(), Value::Bool(false));
        assert_eq!(every(&empty, &greater_than(0)).unwrap(), Value::Bool(true));
        assert_eq!(non_empty(&empty).unwrap(), Value::Bool(false));
    }

    #[test]
    fn membership_and_count() {
        assert_eq!(includes(&nums(), &Value::Int32(2)).unwrap(), Value::Bool(true));
        assert_eq!(includes(&nums(), &Value::Null).unwrap(), Value::Bool(false));
        assert_eq!(count(&nums()).unwrap(), Value::Int32(3));
    }

    #[test]
    fn predicate_must_return_bool() {
        let bad = Value::Function(FunctionValue::new(|_| Ok(Value::Int32(1))));
        assert!(any(&nums(), &bad).is_err());
    }
}
