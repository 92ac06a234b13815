//! Field validation rules

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::value::FieldValue;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// Closed set of validation rules a field can declare
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Email,
    /// Value must equal the value of another field
    Match { field: String, label: String },
    NoBelowZero,
    PositiveNumber,
    NotEmptyArray,
}

impl Rule {
    pub fn matching(field: &str, label: &str) -> Self {
        Rule::Match {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    /// Check `value`; `values` gives access to sibling fields
    pub fn check(
        &self,
        value: &FieldValue,
        values: &BTreeMap<String, FieldValue>,
    ) -> Result<(), String> {
        let ok = match self {
            Rule::Required => required(value),
            Rule::Email => email(&value.as_text()),
            Rule::Match { field, .. } => {
                let other = values.get(field).map(FieldValue::as_text).unwrap_or_default();
                matches(&value.as_text(), &other)
            }
            Rule::NoBelowZero => no_below_zero(value),
            Rule::PositiveNumber => positive_number(value),
            Rule::NotEmptyArray => not_empty_array(value),
        };

        if ok {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    pub fn message(&self) -> String {
        match self {
            Rule::Required => "This field is required".to_string(),
            Rule::Email => "Invalid email address".to_string(),
            Rule::Match { label, .. } => format!("Does not match {}", label),
            Rule::NoBelowZero => "Value cannot be below zero".to_string(),
            Rule::PositiveNumber => "Value must be a positive number".to_string(),
            Rule::NotEmptyArray => "Select at least one item".to_string(),
        }
    }
}

/// False only for an empty string or a missing value
pub fn required(value: &FieldValue) -> bool {
    !value.is_blank()
}

/// Empty input is accepted; `required` covers presence
pub fn email(value: &str) -> bool {
    value.is_empty() || EMAIL_RE.is_match(value)
}

pub fn matches(value: &str, matcher: &str) -> bool {
    value == matcher
}

pub fn no_below_zero(value: &FieldValue) -> bool {
    value.as_number().map_or(true, |n| n >= 0.0)
}

pub fn positive_number(value: &FieldValue) -> bool {
    value.as_number().map_or(true, |n| n > 0.0)
}

pub fn not_empty_array(value: &FieldValue) -> bool {
    match value {
        FieldValue::Choices(items) => !items.is_empty(),
        other => !other.is_blank(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        assert!(!required(&FieldValue::Empty));
        assert!(!required(&FieldValue::Text(String::new())));
        assert!(!required(&FieldValue::Choice(json!(null))));
        assert!(required(&FieldValue::Text("a".to_string())));
        assert!(required(&FieldValue::Integer(0)));
        assert!(required(&FieldValue::Bool(false)));
        assert!(required(&FieldValue::Choices(vec![])));
    }

    #[test]
    fn test_email() {
        assert!(email(""));
        assert!(email("ana.lee+piano@school.co.id"));
        assert!(!email("ana.lee"));
        assert!(!email("ana@"));
        assert!(!email("@school.com"));
    }

    #[test]
    fn test_match_is_exact() {
        assert!(matches("Secret1", "Secret1"));
        assert!(!matches("Secret1", "secret1"));
        assert!(!matches("Secret1", "Secret1 "));

        let mut values = BTreeMap::new();
        values.insert("password".to_string(), FieldValue::Text("Secret1".to_string()));
        let rule = Rule::matching("password", "Password");
        assert!(rule.check(&FieldValue::Text("Secret1".to_string()), &values).is_ok());
        assert_eq!(
            rule.check(&FieldValue::Text("Secret2".to_string()), &values).unwrap_err(),
            "Does not match Password"
        );
    }

    #[test]
    fn test_numeric_rules() {
        assert!(no_below_zero(&FieldValue::Integer(0)));
        assert!(!no_below_zero(&FieldValue::Integer(-1)));
        assert!(!no_below_zero(&FieldValue::Decimal(-0.5)));
        assert!(positive_number(&FieldValue::Decimal(0.5)));
        assert!(!positive_number(&FieldValue::Integer(0)));
        assert!(positive_number(&FieldValue::Empty));
    }

    #[test]
    fn test_not_empty_array() {
        assert!(!not_empty_array(&FieldValue::Choices(vec![])));
        assert!(not_empty_array(&FieldValue::Choices(vec![json!(1)])));
        assert!(!not_empty_array(&FieldValue::Empty));
    }
}
