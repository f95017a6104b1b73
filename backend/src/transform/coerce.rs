//! Lenient value coercions used by the entity transforms and validators.
//!
//! These follow browser semantics for numbers: a leading numeric prefix is
//! enough (`"12kg"` is 12) and anything unparseable falls back to zero at the
//! call site rather than failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?)").expect("valid float regex")
});

static INT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("valid integer regex"));

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Scalar JSON value as text. Null, arrays and objects have no text form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Whether a cell counts as filled in: present, not null, not an empty string,
/// not `false`.
pub fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Longest leading decimal literal of `text`, after leading whitespace.
/// Literals that overflow to infinity are not numbers.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let found = FLOAT_PREFIX.find(text.trim_start())?;
    found.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Longest leading integer literal of `text`, after leading whitespace.
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let found = INT_PREFIX.find(text.trim_start())?;
    found.as_str().parse::<i64>().ok()
}

/// Float coercion, `0` for anything non-numeric.
pub fn to_float(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_float_prefix(s),
        _ => None,
    }
    .unwrap_or(0.0)
}

/// Integer coercion, `0` for anything non-numeric.
pub fn to_integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => parse_int_prefix(s),
        _ => None,
    }
    .unwrap_or(0)
}

/// Only the exact text `"true"` (or a JSON `true`) is true.
pub fn to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Parse a calendar date from the formats users put in spreadsheets.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc().date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// `YYYY-MM-DD` for a filled, parseable date; null otherwise.
pub fn to_date(value: Option<&Value>) -> Value {
    if !is_filled(value) {
        return Value::Null;
    }
    value
        .and_then(as_text)
        .and_then(|text| parse_date(&text))
        .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

/// Array from a JSON-encoded string. Empty, absent or malformed input gives
/// an empty array; an array value is kept as is.
pub fn to_array(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(Value::String(s)) if !s.trim().is_empty() => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Value::Array(items),
            _ => Value::Array(Vec::new()),
        },
        _ => Value::Array(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_float_prefix() {
        assert_eq!(parse_float_prefix("150.00"), Some(150.0));
        assert_eq!(parse_float_prefix("  12.5kg"), Some(12.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("-3"), Some(-3.0));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("1e400"), None);
    }

    #[test]
    fn test_int_prefix() {
        assert_eq!(parse_int_prefix("45"), Some(45));
        assert_eq!(parse_int_prefix("1.9"), Some(1));
        assert_eq!(parse_int_prefix(" 7 units"), Some(7));
        assert_eq!(parse_int_prefix("x7"), None);
    }

    #[test]
    fn test_numbers_default_to_zero() {
        assert_eq!(to_float(Some(&json!("not a number"))), 0.0);
        assert_eq!(to_float(None), 0.0);
        assert_eq!(to_float(Some(&json!("99.9"))), 99.9);
        assert_eq!(to_float(Some(&json!(12.5))), 12.5);
        assert_eq!(to_float(Some(&json!("1e400"))), 0.0);
        assert_eq!(to_integer(Some(&json!("oops"))), 0);
        assert_eq!(to_integer(Some(&json!("50"))), 50);
        assert_eq!(to_integer(Some(&json!(3))), 3);
    }

    #[test]
    fn test_bool_is_exact() {
        assert!(to_bool(Some(&json!("true"))));
        assert!(to_bool(Some(&json!(true))));
        assert!(!to_bool(Some(&json!("True"))));
        assert!(!to_bool(Some(&json!(" true"))));
        assert!(!to_bool(Some(&json!("yes"))));
        assert!(!to_bool(None));
    }

    #[test]
    fn test_dates_normalized() {
        assert_eq!(to_date(Some(&json!("2024-12-31"))), json!("2024-12-31"));
        assert_eq!(to_date(Some(&json!("2024/12/31"))), json!("2024-12-31"));
        assert_eq!(to_date(Some(&json!("12/31/2024"))), json!("2024-12-31"));
        assert_eq!(to_date(Some(&json!("2024-12-31T10:00:00Z"))), json!("2024-12-31"));
        assert_eq!(to_date(Some(&json!("2024-12-31T10:00:00"))), json!("2024-12-31"));
        assert_eq!(to_date(Some(&json!(""))), Value::Null);
        assert_eq!(to_date(Some(&json!("someday"))), Value::Null);
        assert_eq!(to_date(None), Value::Null);
    }

    #[test]
    fn test_arrays_from_json() {
        assert_eq!(
            to_array(Some(&json!("[\"charger\", \"case\"]"))),
            json!(["charger", "case"])
        );
        assert_eq!(to_array(Some(&json!(""))), json!([]));
        assert_eq!(to_array(None), json!([]));
        assert_eq!(to_array(Some(&json!("[broken"))), json!([]));
        assert_eq!(to_array(Some(&json!(["a"]))), json!(["a"]));
    }

    #[test]
    fn test_is_filled() {
        assert!(is_filled(Some(&json!("x"))));
        assert!(is_filled(Some(&json!(" "))));
        assert!(!is_filled(Some(&json!(""))));
        assert!(!is_filled(Some(&Value::Null)));
        assert!(!is_filled(None));
    }
}
