//! Cell validators shared by the entity schemas.
//!
//! Each rule is only called for a non-empty cell and receives the whole row so
//! a rule may look at sibling columns.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::RawRecord;
use crate::transform::coerce::{parse_date, parse_float_prefix, parse_int_prefix};

/// E.164-style number, optional leading `+`.
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid phone regex"));

pub fn non_blank(value: &str, _row: &RawRecord) -> bool {
    !value.trim().is_empty()
}

/// Phone numbers may contain spaces for readability.
pub fn phone(value: &str, _row: &RawRecord) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE.is_match(&compact)
}

pub fn customer_type(value: &str, _row: &RawRecord) -> bool {
    matches!(value, "distributor" | "consumer")
}

pub fn service_fee_type(value: &str, _row: &RawRecord) -> bool {
    matches!(value, "free" | "paid")
}

pub fn boolean_flag(value: &str, _row: &RawRecord) -> bool {
    matches!(value, "true" | "false")
}

pub fn non_negative_decimal(value: &str, _row: &RawRecord) -> bool {
    parse_float_prefix(value).is_some_and(|n| n >= 0.0)
}

pub fn non_negative_integer(value: &str, _row: &RawRecord) -> bool {
    parse_int_prefix(value).is_some_and(|n| n >= 0)
}

pub fn date(value: &str, _row: &RawRecord) -> bool {
    parse_date(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RawRecord {
        RawRecord::new()
    }

    #[test]
    fn test_phone() {
        assert!(phone("+966501234567", &row()));
        assert!(phone("+966 50 123 4567", &row()));
        assert!(phone("0501234567".trim_start_matches('0'), &row()));
        assert!(!phone("not-a-phone", &row()));
        assert!(!phone("0501234567", &row()));
        assert!(!phone("+1234567890123456", &row()));
    }

    #[test]
    fn test_enumerations() {
        assert!(customer_type("consumer", &row()));
        assert!(customer_type("distributor", &row()));
        assert!(!customer_type("Consumer", &row()));
        assert!(service_fee_type("paid", &row()));
        assert!(!service_fee_type("maybe", &row()));
        assert!(boolean_flag("false", &row()));
        assert!(!boolean_flag("TRUE", &row()));
    }

    #[test]
    fn test_numbers() {
        assert!(non_negative_decimal("150.00", &row()));
        assert!(non_negative_decimal("0", &row()));
        assert!(!non_negative_decimal("-1", &row()));
        assert!(!non_negative_decimal("abc", &row()));
        assert!(!non_negative_decimal("1e400", &row()));
        assert!(non_negative_integer("45", &row()));
        assert!(!non_negative_integer("-5", &row()));
        assert!(!non_negative_integer("five", &row()));
    }

    #[test]
    fn test_blank_and_dates() {
        assert!(non_blank("x", &row()));
        assert!(!non_blank("   ", &row()));
        assert!(date("2024-12-31", &row()));
        assert!(date("2024/12/31", &row()));
        assert!(!date("31st of never", &row()));
    }
}
