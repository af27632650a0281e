//! String operations backing the built-in string functions.
//!
//! Each operation takes its receiver as a `Value` and fails with
//! `NullReference` when the receiver is null.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

fn receiver<'v>(value: &'v Value, operation: &str) -> EvalResult<&'v str> {
    match value {
        Value::String(s) => Ok(&**s),
        Value::Null => Err(EvalError::NullReference {
            operation: operation.to_string(),
        }),
        other => Err(EvalError::UnexpectedValue {
            expected: "string",
            found: other.type_name(),
        }),
    }
}

/// Number of Unicode codepoints (not bytes).
pub fn length(s: &Value) -> EvalResult {
    let n = receiver(s, "length")?.chars().count();
    Ok(Value::Int32(i32::try_from(n).unwrap_or(i32::MAX)))
}

pub fn contains(haystack: &Value, needle: &Value) -> EvalResult {
    let needle = receiver(needle, "contains")?;
    Ok(Value::Bool(receiver(haystack, "contains")?.contains(needle)))
}

pub fn starts_with(s: &Value, prefix: &Value) -> EvalResult {
    let prefix = receiver(prefix, "startsWith")?;
    Ok(Value::Bool(receiver(s, "startsWith")?.starts_with(prefix)))
}

pub fn ends_with(s: &Value, suffix: &Value) -> EvalResult {
    let suffix = receiver(suffix, "endsWith")?;
    Ok(Value::Bool(receiver(s, "endsWith")?.ends_with(suffix)))
}

/// Trim whitespace from both sides.
pub fn trim(s: &Value) -> EvalResult {
    Ok(Value::string(receiver(s, "trim")?.trim()))
}

pub fn to_upper(s: &Value) -> EvalResult {
    Ok(Value::string(receiver(s, "upper")?.to_uppercase()))
}

pub fn to_lower(s: &Value) -> EvalResult {
    Ok(Value::string(receiver(s, "lower")?.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_codepoints() {
        assert_eq!(length(&Value::string("caf\u{e9}")).unwrap(), Value::Int32(4));
    }

    #[test]
    fn predicates() {
        let s = Value::string("hello world");
        assert_eq!(contains(&s, &Value::string("o w")).unwrap(), Value::Bool(true));
        assert_eq!(starts_with(&s, &Value::string("hello")).unwrap(), Value::Bool(true));
        assert_eq!(ends_with(&s, &Value::string("hello")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn case_and_trim() {
        assert_eq!(to_upper(&Value::string("aB")).unwrap(), Value::string("AB"));
        assert_eq!(to_lower(&Value::string("aB")).unwrap(), Value::string("ab"));
        assert_eq!(trim(&Value::string("  x \t")).unwrap(), Value::string("x"));
    }

    #[test]
    fn null_receiver_is_an_error() {
        let err = length(&Value::Null).unwrap_err();
        assert_eq!(
            err,
            EvalError::NullReference {
                operation: "length".to_string()
            }
        );
    }
}
