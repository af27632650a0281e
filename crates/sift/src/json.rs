//! JSON documents as runtime values.
//!
//! Conversion is driven by the expected [`Type`]: the same JSON number is an
//! `int`, a `long` or a `double` depending on the field it lands in, and a
//! `datetime` is either an RFC 3339 string or a tick count.

use std::sync::Arc;

use serde_json::{Map, Number, Value as Json};
use sift_rt::{datetime, RecordValue, Value};
use sift_typeck::Type;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("at {path}: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: &'static str,
    },
    #[error("at {path}: {number} does not fit in `{ty}`")]
    OutOfRange {
        path: String,
        number: Number,
        ty: Type,
    },
    #[error("at {path}: `{text}` is not an RFC 3339 date")]
    InvalidDate { path: String, text: String },
    #[error("at {path}: `{record}` has no field `{field}`")]
    UnknownField {
        path: String,
        record: String,
        field: String,
    },
}

/// Parse `text` and convert it to a value of type `ty`.
pub fn from_json_str(text: &str, ty: &Type) -> Result<Value, DataError> {
    let json: Json = serde_json::from_str(text)?;
    from_json(&json, ty)
}

pub fn from_json(json: &Json, ty: &Type) -> Result<Value, DataError> {
    convert(json, ty, "$")
}

fn kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

fn convert(json: &Json, ty: &Type, path: &str) -> Result<Value, DataError> {
    let mismatch = || DataError::Mismatch {
        path: path.to_string(),
        expected: format!("`{ty}`"),
        found: kind(json),
    };
    let out_of_range = |number: &Number| DataError::OutOfRange {
        path: path.to_string(),
        number: number.clone(),
        ty: ty.clone(),
    };

    if json.is_null() {
        return if ty.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(mismatch())
        };
    }

    match (ty.underlying(), json) {
        (Type::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (Type::Int32, Json::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int32)
            .ok_or_else(|| out_of_range(n)),
        (Type::Int64, Json::Number(n)) => n.as_i64().map(Value::Int64).ok_or_else(|| out_of_range(n)),
        (Type::Double, Json::Number(n)) => n.as_f64().map(Value::Double).ok_or_else(|| out_of_range(n)),
        (Type::String, Json::String(s)) => Ok(Value::string(s.as_str())),
        (Type::DateTimeOffset, Json::String(s)) => {
            datetime::parse(s)
                .map(Value::DateTime)
                .ok_or_else(|| DataError::InvalidDate {
                    path: path.to_string(),
                    text: s.clone(),
                })
        }
        (Type::DateTimeOffset, Json::Number(n)) => n
            .as_i64()
            .and_then(|ticks| datetime::from_ticks(ticks).ok())
            .map(Value::DateTime)
            .ok_or_else(|| out_of_range(n)),
        (Type::Array(elem) | Type::Sequence(elem), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| convert(item, elem, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::array),
        (Type::Record(record), Json::Object(fields)) => {
            let mut values = Vec::with_capacity(fields.len());
            for (key, item) in fields {
                let Some(field) = record.find_field(key) else {
                    return Err(DataError::UnknownField {
                        path: path.to_string(),
                        record: record.name.to_string(),
                        field: key.clone(),
                    });
                };
                let value = convert(item, &field.ty, &format!("{path}.{key}"))?;
                values.push((field.name.clone(), value));
            }
            Ok(Value::Record(RecordValue::new(&record.name, values)))
        }
        (Type::Object, _) => Ok(untyped(json)),
        _ => Err(mismatch()),
    }
}

/// A value for an `object` slot, shaped by the JSON alone.
fn untyped(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(n) => i32::try_from(n).map_or(Value::Int64(n), Value::Int32),
            None => n.as_f64().map_or(Value::Null, Value::Double),
        },
        Json::String(s) => Value::string(s.as_str()),
        Json::Array(items) => Value::array(items.iter().map(untyped)),
        Json::Object(fields) => Value::Record(RecordValue::new(
            "object",
            fields
                .iter()
                .map(|(k, v)| (Arc::<str>::from(k.as_str()), untyped(v))),
        )),
    }
}

/// Render a runtime value as JSON, for printing results.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int32(n) => Json::from(*n),
        Value::Int64(n) => Json::from(*n),
        Value::Double(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.to_string()),
        Value::DateTime(dt) => Json::String(dt.to_rfc3339()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Record(record) => Json::Object(
            record
                .fields()
                .map(|(name, value)| (name.to_string(), to_json(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Function(_) => Json::String("<function>".to_string()),
    }
}
