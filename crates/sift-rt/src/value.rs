//! Runtime values.
//!
//! `Value` is cheap to clone: strings, arrays and records share their
//! payload behind `Arc`. Every type of the query language maps onto one
//! variant; nullable types use `Null` for the missing case.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::error::{EvalError, EvalResult};

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(Arc<str>),
    DateTime(DateTime<FixedOffset>),
    Array(Arc<[Value]>),
    Record(RecordValue),
    Function(FunctionValue),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int",
            Value::Int64(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
        }
    }

    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::UnexpectedValue {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(&**items),
            _ => None,
        }
    }

    /// Call a function value with one argument.
    pub fn call(&self, arg: Value) -> EvalResult {
        match self {
            Value::Function(f) => f.call(arg),
            other => Err(EvalError::UnexpectedValue {
                expected: "function",
                found: other.type_name(),
            }),
        }
    }

    /// Ordering between two non-null values of comparable kinds. Integers
    /// and doubles compare across widths.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
                Some(self.as_i64()?.cmp(&other.as_i64()?))
            }
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(f64::from(*n)),
            Value::Int64(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }
}

/// Structural equality. `Null` equals only `Null`; functions are never
/// equal to anything, themselves included.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(_), _) | (_, Value::Function(_)) => false,
            (Value::Null, _) | (_, Value::Null) => false,
            (a, b) => a.compare(b) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}L"),
            Value::Double(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(record) => write!(f, "{record}"),
            Value::Function(_) => f.write_str("<function>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ── Records ────────────────────────────────────────────────────────────

/// An instance of a named record type.
///
/// Field lookup ignores case. A field the instance does not carry reads as
/// `Null`, matching an unset nullable property.
#[derive(Clone, PartialEq)]
pub struct RecordValue {
    type_name: Arc<str>,
    fields: Arc<[(Arc<str>, Value)]>,
}

impl RecordValue {
    pub fn new<N: Into<Arc<str>>>(
        type_name: &str,
        fields: impl IntoIterator<Item = (N, Value)>,
    ) -> Self {
        RecordValue {
            type_name: Arc::from(type_name),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| fold_eq(field, name))
            .map(|(_, value)| value)
    }

    /// Field value, `Null` when unset.
    pub fn field(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (&**n, v))
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{name}: {value}")?;
        }
        if self.fields.is_empty() {
            f.write_str("}")
        } else {
            f.write_str(" }")
        }
    }
}

pub(crate) fn fold_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ── Functions ──────────────────────────────────────────────────────────

/// A single-argument callable, produced by evaluating a lambda.
#[derive(Clone)]
pub struct FunctionValue(Arc<dyn Fn(Value) -> EvalResult + Send + Sync>);

impl FunctionValue {
    pub fn new(f: impl Fn(Value) -> EvalResult + Send + Sync + 'static) -> Self {
        FunctionValue(Arc::new(f))
    }

    pub fn call(&self, arg: Value) -> EvalResult {
        (self.0)(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_only_equals_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Int32(0));
        assert_ne!(Value::string(""), Value::Null);
    }

    #[test]
    fn numbers_compare_across_widths() {
        assert_eq!(Value::Int32(3), Value::Int64(3));
        assert_eq!(
            Value::Int32(2).compare(&Value::Double(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int32(1).compare(&Value::string("1")), None);
    }

    #[test]
    fn record_fields_ignore_case_and_default_to_null() {
        let r = RecordValue::new("Order", [("Num", Value::Int32(2))]);
        assert_eq!(r.field("num"), Value::Int32(2));
        assert_eq!(r.field("value"), Value::Null);
        assert_eq!(r.to_string(), "Order { Num: 2 }");
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Double(3.0).to_string(), "3.0");
        assert_eq!(Value::Int64(7).to_string(), "7L");
        let arr = Value::array([Value::Int32(1), Value::string("a\"b")]);
        assert_eq!(arr.to_string(), r#"[1, "a\"b"]"#);
    }

    #[test]
    fn functions_are_never_equal() {
        let f = Value::Function(FunctionValue::new(Ok));
        assert_ne!(f.clone(), f);
        assert_eq!(f.call(Value::Int32(4)).unwrap(), Value::Int32(4));
    }
}
