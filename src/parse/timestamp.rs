use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Naive layouts tried after RFC3339, assumed to be UTC
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S,%f",
];

/// Common log format, e.g. `10/Oct/2000:13:55:36 -0700`
const CLF_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Parse a timestamp taken from a JSON value. First matching format wins.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => from_epoch_int(i),
            None => n.as_f64().and_then(from_epoch_float),
        },
        _ => None,
    }
}

/// Parse a textual timestamp: RFC3339, naive date-times, common log format, epoch
pub fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ndt.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_str(s, CLF_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(i) = s.parse::<i64>() {
        return from_epoch_int(i);
    }
    s.parse::<f64>().ok().and_then(from_epoch_float)
}

/// Integer epoch; the magnitude picks seconds, millis, micros or nanos
fn from_epoch_int(value: i64) -> Option<DateTime<Utc>> {
    let magnitude = value.unsigned_abs();
    if magnitude < 100_000_000_000 {
        DateTime::from_timestamp(value, 0)
    } else if magnitude < 100_000_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else if magnitude < 100_000_000_000_000_000 {
        DateTime::from_timestamp_micros(value)
    } else {
        Some(DateTime::from_timestamp_nanos(value))
    }
}

fn from_epoch_float(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    if value.abs() >= 100_000_000_000.0 {
        return from_epoch_int(value as i64);
    }
    let secs = value.floor();
    let nanos = ((value - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}
