//! Binary operator semantics.
//!
//! Dispatch is a direct match on the operand variants. Null propagates
//! through arithmetic, equality treats null as an ordinary value, and an
//! ordering comparison involving null is false.

use std::cmp::Ordering;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithOp {
    fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "addition",
            ArithOp::Subtract => "subtraction",
            ArithOp::Multiply => "multiplication",
            ArithOp::Divide => "division",
            ArithOp::Modulo => "modulo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

/// Evaluate an arithmetic operator.
///
/// Integers wrap on overflow. Mixed widths widen to the wider operand;
/// an integer mixed with a double is computed in double.
pub fn arith(op: ArithOp, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int32(a), Value::Int32(b)) => int32(op, *a, *b),
        (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
            match (left.as_i64(), right.as_i64()) {
                (Some(a), Some(b)) => int64(op, a, b),
                _ => Err(mismatch(op, left, right)),
            }
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(double(op, a, b))),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

fn int32(op: ArithOp, a: i32, b: i32) -> EvalResult {
    let n = match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Subtract => a.wrapping_sub(b),
        ArithOp::Multiply => a.wrapping_mul(b),
        ArithOp::Divide => {
            zero_guard(op, b == 0)?;
            a.wrapping_div(b)
        }
        ArithOp::Modulo => {
            zero_guard(op, b == 0)?;
            a.wrapping_rem(b)
        }
    };
    Ok(Value::Int32(n))
}

fn int64(op: ArithOp, a: i64, b: i64) -> EvalResult {
    let n = match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Subtract => a.wrapping_sub(b),
        ArithOp::Multiply => a.wrapping_mul(b),
        ArithOp::Divide => {
            zero_guard(op, b == 0)?;
            a.wrapping_div(b)
        }
        ArithOp::Modulo => {
            zero_guard(op, b == 0)?;
            a.wrapping_rem(b)
        }
    };
    Ok(Value::Int64(n))
}

fn double(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Subtract => a - b,
        ArithOp::Multiply => a * b,
        ArithOp::Divide => a / b,
        ArithOp::Modulo => a % b,
    }
}

fn zero_guard(op: ArithOp, is_zero: bool) -> Result<(), EvalError> {
    if is_zero {
        Err(EvalError::DivideByZero { op: op.name() })
    } else {
        Ok(())
    }
}

fn mismatch(op: ArithOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.name(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// Evaluate a comparison operator.
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> EvalResult {
    let accept: fn(Ordering) -> bool = match op {
        CmpOp::Equal => return Ok(Value::Bool(left == right)),
        CmpOp::NotEqual => return Ok(Value::Bool(left != right)),
        CmpOp::LessThan => Ordering::is_lt,
        CmpOp::LessOrEqual => Ordering::is_le,
        CmpOp::GreaterThan => Ordering::is_gt,
        CmpOp::GreaterOrEqual => Ordering::is_ge,
    };
    if left.is_null() || right.is_null() {
        return Ok(Value::Bool(false));
    }
    let ordering = left.compare(right).ok_or(EvalError::TypeMismatch {
        op: "comparison",
        left: left.type_name(),
        right: right.type_name(),
    })?;
    Ok(Value::Bool(accept(ordering)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_wraps() {
        assert_eq!(
            arith(ArithOp::Add, &Value::Int32(i32::MAX), &Value::Int32(1)).unwrap(),
            Value::Int32(i32::MIN)
        );
        assert_eq!(
            arith(ArithOp::Divide, &Value::Int32(i32::MIN), &Value::Int32(-1)).unwrap(),
            Value::Int32(i32::MIN)
        );
    }

    #[test]
    fn division_by_zero() {
        let err = arith(ArithOp::Modulo, &Value::Int64(5), &Value::Int64(0)).unwrap_err();
        assert_eq!(err, EvalError::DivideByZero { op: "modulo" });
        let inf = arith(ArithOp::Divide, &Value::Double(1.0), &Value::Double(0.0)).unwrap();
        assert_eq!(inf, Value::Double(f64::INFINITY));
    }

    #[test]
    fn null_propagates_through_arithmetic() {
        assert!(arith(ArithOp::Add, &Value::Null, &Value::Int32(1)).unwrap().is_null());
    }

    #[test]
    fn widening() {
        assert_eq!(
            arith(ArithOp::Multiply, &Value::Int32(3), &Value::Int64(4)).unwrap(),
            Value::Int64(12)
        );
        assert_eq!(
            arith(ArithOp::Add, &Value::Int32(1), &Value::Double(0.5)).unwrap(),
            Value::Double(1.5)
        );
    }

    #[test]
    fn null_comparisons() {
        let gt = compare(CmpOp::GreaterThan, &Value::Null, &Value::Int32(2)).unwrap();
        assert_eq!(gt, Value::Bool(false));
        let le = compare(CmpOp::LessOrEqual, &Value::Int32(2), &Value::Null).unwrap();
        assert_eq!(le, Value::Bool(false));
        let eq = compare(CmpOp::Equal, &Value::Null, &Value::Null).unwrap();
        assert_eq!(eq, Value::Bool(true));
        let ne = compare(CmpOp::NotEqual, &Value::Int32(1), &Value::Null).unwrap();
        assert_eq!(ne, Value::Bool(true));
    }

    #[test]
    fn strings_order_lexicographically() {
        let lt = compare(CmpOp::LessThan, &Value::string("abc"), &Value::string("abd")).unwrap();
        assert_eq!(lt, Value::Bool(true));
    }
}
