//! Typed field values

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const WIRE_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current value of one form field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Key of the selected option
    Choice(Value),
    /// Keys of the selected options
    Choices(Vec<Value>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl FieldValue {
    /// Empty string, missing value or null selection
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Choice(v) => v.is_null(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Decimal(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Choice(v) => v.as_f64(),
            _ => None,
        }
    }

    /// String form used for comparisons and display
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Decimal(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::DateTime(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
            FieldValue::Choice(v) => value_text(v),
            FieldValue::Choices(vs) => vs.iter().map(value_text).collect::<Vec<_>>().join(", "),
        }
    }

    /// Wire representation sent in request payloads
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(n) => Value::from(*n),
            FieldValue::Decimal(n) => Value::from(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            FieldValue::DateTime(dt) => Value::String(dt.format(WIRE_DATE_TIME_FORMAT).to_string()),
            FieldValue::Choice(v) => v.clone(),
            FieldValue::Choices(vs) => Value::Array(vs.clone()),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a wire date-time, accepting a trailing offset or fractional seconds
pub fn parse_wire_date_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_representation() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(FieldValue::Date(date).to_json(), json!("2024-03-09"));

        let dt = date.and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(FieldValue::DateTime(dt).to_json(), json!("2024-03-09T14:30:00"));
        assert_eq!(FieldValue::DateTime(dt).as_text(), "2024-03-09 14:30");

        assert_eq!(FieldValue::Empty.to_json(), Value::Null);
        assert_eq!(FieldValue::Choices(vec![json!(1), json!(2)]).to_json(), json!([1, 2]));
    }

    #[test]
    fn test_parse_wire_date_time_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_wire_date_time("2024-03-09T14:30:00"), Some(expected));
        assert_eq!(parse_wire_date_time("2024-03-09T14:30:00.000"), Some(expected));
        assert_eq!(parse_wire_date_time("2024-03-09T14:30:00+07:00"), Some(expected));
        assert_eq!(parse_wire_date_time("2024-03-09 14:30"), Some(expected));
        assert_eq!(parse_wire_date_time("yesterday"), None);
    }
}
