//! Literal materialization.
//!
//! Query text keeps literals untyped; the inferred type decides how the raw
//! text is read.

use std::sync::Arc;

use sift_common::span::Span;
use sift_rt::{datetime, Value};
use sift_typeck::Type;

use crate::error::CompileError;

/// Turn a literal into a runtime value of type `ty`. `raw` is `None` for
/// `null`.
pub fn materialize(raw: Option<&Arc<str>>, ty: &Type, span: Span) -> Result<Value, CompileError> {
    let Some(raw) = raw else {
        if ty.is_nullable() {
            return Ok(Value::Null);
        }
        return Err(CompileError::NullToValueType {
            ty: ty.clone(),
            span,
        });
    };
    let invalid = || CompileError::InvalidLiteral {
        raw: raw.clone(),
        ty: ty.clone(),
        span,
    };
    let text: &str = raw;
    match ty.underlying() {
        Type::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        Type::Int32 => text.parse().map(Value::Int32).map_err(|_| invalid()),
        Type::Int64 => text.parse().map(Value::Int64).map_err(|_| invalid()),
        Type::Double => text.parse().map(Value::Double).map_err(|_| invalid()),
        Type::DateTimeOffset => datetime::parse(text).map(Value::DateTime).ok_or_else(invalid),
        Type::String | Type::Object => Ok(Value::String(raw.clone())),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(raw: &str, ty: &Type) -> Result<Value, CompileError> {
        materialize(Some(&Arc::from(raw)), ty, Span::new(0, 1))
    }

    #[test]
    fn numbers_follow_the_inferred_width() {
        assert_eq!(lit("42", &Type::Int32).unwrap(), Value::Int32(42));
        assert_eq!(lit("42", &Type::Int64).unwrap(), Value::Int64(42));
        assert_eq!(lit("42", &Type::Double).unwrap(), Value::Double(42.0));
        assert_eq!(
            lit("7", &Type::nullable(Type::Int32)).unwrap(),
            Value::Int32(7)
        );
    }

    #[test]
    fn out_of_range_integers_are_rejected() {
        let err = lit("3000000000", &Type::Int32).unwrap_err();
        assert_eq!(err.to_string(), "`3000000000` is not a valid `int` literal");
        assert!(lit("3000000000", &Type::Int64).is_ok());
    }

    #[test]
    fn text_types_keep_the_raw_text() {
        assert_eq!(lit("abc", &Type::String).unwrap(), Value::string("abc"));
        assert_eq!(lit("1", &Type::Object).unwrap(), Value::string("1"));
        assert_eq!(lit("true", &Type::Bool).unwrap(), Value::Bool(true));
        assert!(lit("yes", &Type::Bool).is_err());
    }

    #[test]
    fn dates_parse_as_rfc3339() {
        let value = lit("2024-05-01T10:00:00+02:00", &Type::DateTimeOffset).unwrap();
        assert!(matches!(value, Value::DateTime(_)));
        assert!(lit("yesterday", &Type::DateTimeOffset).is_err());
    }

    #[test]
    fn null_needs_a_nullable_type() {
        let span = Span::new(3, 7);
        assert_eq!(
            materialize(None, &Type::nullable(Type::Int32), span).unwrap(),
            Value::Null
        );
        assert_eq!(materialize(None, &Type::String, span).unwrap(), Value::Null);
        let err = materialize(None, &Type::Int32, span).unwrap_err();
        assert_eq!(err.to_string(), "`null` cannot be used as a value of type `int`");
        assert_eq!(err.span(), span);
    }
}
