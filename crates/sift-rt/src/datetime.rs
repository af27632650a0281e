//! Date-time values measured in ticks.
//!
//! A tick is 100 nanoseconds; tick zero is midnight, January 1 of year 1,
//! UTC. Dates built from ticks carry a zero offset.

use chrono::{DateTime, Datelike, FixedOffset};

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between tick zero and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

pub fn from_ticks(ticks: i64) -> EvalResult<DateTime<FixedOffset>> {
    let since_epoch = ticks
        .checked_sub(UNIX_EPOCH_TICKS)
        .ok_or(EvalError::InvalidDate { ticks })?;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    // In range 0..10_000_000, so the product fits in u32.
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.fixed_offset())
        .ok_or(EvalError::InvalidDate { ticks })
}

pub fn to_ticks(dt: &DateTime<FixedOffset>) -> i64 {
    let secs = dt.timestamp();
    let sub = i64::from(dt.timestamp_subsec_nanos()) / 100;
    secs.wrapping_mul(TICKS_PER_SECOND)
        .wrapping_add(sub)
        .wrapping_add(UNIX_EPOCH_TICKS)
}

/// Parse an RFC 3339 timestamp, as written in a query constant.
pub fn parse(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}

fn receiver<'v>(value: &'v Value, operation: &str) -> EvalResult<&'v DateTime<FixedOffset>> {
    match value {
        Value::DateTime(dt) => Ok(dt),
        Value::Null => Err(EvalError::NullReference {
            operation: operation.to_string(),
        }),
        other => Err(EvalError::UnexpectedValue {
            expected: "datetime",
            found: other.type_name(),
        }),
    }
}

/// `dateTimeOffset(ticks)`.
pub fn construct(ticks: &Value) -> EvalResult {
    match ticks {
        Value::Int64(n) => from_ticks(*n).map(Value::DateTime),
        Value::Int32(n) => from_ticks(i64::from(*n)).map(Value::DateTime),
        Value::Null => Err(EvalError::NullReference {
            operation: "dateTimeOffset".to_string(),
        }),
        other => Err(EvalError::UnexpectedValue {
            expected: "long",
            found: other.type_name(),
        }),
    }
}

pub fn year(dt: &Value) -> EvalResult {
    Ok(Value::Int32(receiver(dt, "year")?.year()))
}

pub fn month(dt: &Value) -> EvalResult {
    Ok(Value::Int32(receiver(dt, "month")?.month() as i32))
}

pub fn day(dt: &Value) -> EvalResult {
    Ok(Value::Int32(receiver(dt, "day")?.day() as i32))
}

pub fn ticks(dt: &Value) -> EvalResult {
    Ok(Value::Int64(to_ticks(receiver(dt, "ticks")?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch() {
        let dt = from_ticks(UNIX_EPOCH_TICKS).unwrap();
        assert_eq!(dt.to_rfc3339(), "1970-01-01T00:00:00+00:00");
        assert_eq!(to_ticks(&dt), UNIX_EPOCH_TICKS);
    }

    #[test]
    fn tick_zero_is_year_one() {
        let dt = construct(&Value::Int64(0)).unwrap();
        assert_eq!(year(&dt).unwrap(), Value::Int32(1));
        assert_eq!(month(&dt).unwrap(), Value::Int32(1));
        assert_eq!(day(&dt).unwrap(), Value::Int32(1));
    }

    #[test]
    fn sub_second_ticks_survive() {
        let t = UNIX_EPOCH_TICKS + 12_345_678;
        assert_eq!(to_ticks(&from_ticks(t).unwrap()), t);
    }

    #[test]
    fn out_of_range() {
        assert_eq!(
            from_ticks(i64::MIN).unwrap_err(),
            EvalError::InvalidDate { ticks: i64::MIN }
        );
    }
}
