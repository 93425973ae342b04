//! Raw upstream records and tolerant field accessors
//!
//! Envirofacts returns each row as a flat JSON object. Numbers sometimes
//! arrive as strings, and any field may be null or missing.

use serde_json::{Map, Value};

/// One upstream row: field name to scalar (string, number or null)
pub type RawRecord = Map<String, Value>;

/// String form of a field, `None` when missing or null
///
/// Numbers are rendered so that ids like `region: 9` survive as text.
pub fn field_str(record: &RawRecord, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric form of a field, `None` when missing, null or not numeric
pub fn field_f64(record: &RawRecord, field: &str) -> Option<f64> {
    match record.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer year from a numeric or string field
pub fn field_year(record: &RawRecord, field: &str) -> Option<i32> {
    match record.get(field)? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_field_str_handles_numbers_and_nulls() {
        let r = record(json!({"region": 9, "state": "CA", "county": null}));

        assert_eq!(field_str(&r, "region"), Some("9".to_string()));
        assert_eq!(field_str(&r, "state"), Some("CA".to_string()));
        assert_eq!(field_str(&r, "county"), None);
        assert_eq!(field_str(&r, "missing"), None);
    }

    #[test]
    fn test_field_f64_accepts_numeric_strings() {
        let r = record(json!({"a": 1.5, "b": " 34.25 ", "c": "n/a", "d": null}));

        assert_eq!(field_f64(&r, "a"), Some(1.5));
        assert_eq!(field_f64(&r, "b"), Some(34.25));
        assert_eq!(field_f64(&r, "c"), None);
        assert_eq!(field_f64(&r, "d"), None);
    }

    #[test]
    fn test_field_year() {
        let r = record(json!({"n": 2020, "s": "2015", "bad": "20x5", "f": 2020.5}));

        assert_eq!(field_year(&r, "n"), Some(2020));
        assert_eq!(field_year(&r, "s"), Some(2015));
        assert_eq!(field_year(&r, "bad"), None);
        assert_eq!(field_year(&r, "f"), None);
    }
}
