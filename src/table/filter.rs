//! Client-side row filters

use std::collections::BTreeSet;

use serde_json::Value;

use super::cell::{lookup, Cell};
use crate::form::SelectOption;

/// How a filter takes its input
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Case-insensitive substring match
    TextInput,
    /// Pick from options; `None` derives them from the rows
    Select { options: Option<Vec<SelectOption>> },
    /// Numeric comparison such as `>=100`
    Arithmetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    /// Row path the filter reads
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
}

impl FilterDescriptor {
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FilterKind::TextInput,
        }
    }

    pub fn select(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FilterKind::Select { options: None },
        }
    }

    pub fn select_from(key: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FilterKind::Select {
                options: Some(options),
            },
        }
    }

    pub fn arithmetic(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FilterKind::Arithmetic,
        }
    }
}

/// Committed input of one filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Text(String),
    Selection(Vec<Value>),
}

impl FilterInput {
    pub fn is_empty(&self) -> bool {
        match self {
            FilterInput::Text(text) => text.trim().is_empty(),
            FilterInput::Selection(selected) => selected.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Eq(f64),
    Lt(f64),
    Le(f64),
    Gt(f64),
    Ge(f64),
}

impl Comparison {
    pub fn test(&self, value: f64) -> bool {
        match *self {
            Comparison::Eq(n) => value == n,
            Comparison::Lt(n) => value < n,
            Comparison::Le(n) => value <= n,
            Comparison::Gt(n) => value > n,
            Comparison::Ge(n) => value >= n,
        }
    }
}

/// Parse `=`, `<`, `<=`, `>` or `>=` followed by a number. Returns `None`
/// for anything else, including a bare number.
pub fn parse_arithmetic(expr: &str) -> Option<Comparison> {
    // two-character operators first
    let operators: [(&str, fn(f64) -> Comparison); 5] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
        ("=", Comparison::Eq),
    ];

    let expr = expr.trim();
    let (rest, constructor) = operators
        .iter()
        .find_map(|(op, constructor)| expr.strip_prefix(op).map(|rest| (rest, *constructor)))?;

    rest.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(constructor)
}

/// Whether `value` satisfies the comparison `expr`; input that does not
/// parse as a comparison does not filter anything out
pub fn advanced_number_filter(value: f64, expr: &str) -> bool {
    match parse_arithmetic(expr) {
        Some(comparison) => comparison.test(value),
        None => true,
    }
}

/// True when non-empty arithmetic input will be ignored
pub fn is_ignored_arithmetic(expr: &str) -> bool {
    !expr.trim().is_empty() && parse_arithmetic(expr).is_none()
}

/// A filter with its committed input, ready to test rows
#[derive(Debug, Clone, PartialEq)]
pub enum TableFilter {
    Text { key: String, needle: String },
    Select { key: String, selected: Vec<Value> },
    Arithmetic { key: String, comparison: Comparison },
}

impl TableFilter {
    /// `None` when the input does not constrain the rows
    pub fn from_input(descriptor: &FilterDescriptor, input: &FilterInput) -> Option<Self> {
        let key = descriptor.key.clone();
        match (&descriptor.kind, input) {
            (FilterKind::TextInput, FilterInput::Text(text)) => {
                let needle = text.trim().to_lowercase();
                (!needle.is_empty()).then_some(TableFilter::Text { key, needle })
            }
            (FilterKind::Select { .. }, FilterInput::Selection(selected)) => {
                (!selected.is_empty()).then(|| TableFilter::Select {
                    key,
                    selected: selected.clone(),
                })
            }
            (FilterKind::Arithmetic, FilterInput::Text(expr)) => {
                parse_arithmetic(expr).map(|comparison| TableFilter::Arithmetic { key, comparison })
            }
            _ => None,
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match self {
            TableFilter::Text { key, needle } => Cell::at(row, key)
                .display()
                .to_lowercase()
                .contains(needle.as_str()),
            TableFilter::Select { key, selected } => {
                let cell = Cell::at(row, key);
                selected.iter().any(|value| cell.equals_value(value))
            }
            TableFilter::Arithmetic { key, comparison } => match Cell::at(row, key) {
                Cell::List(items) => items
                    .iter()
                    .filter_map(Cell::as_number)
                    .any(|n| comparison.test(n)),
                cell => cell.as_number().map_or(false, |n| comparison.test(n)),
            },
        }
    }
}

/// Indices of the rows passing every filter, in row order
pub fn apply_filters(rows: &[Value], filters: &[TableFilter]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| filters.iter().all(|f| f.matches(row)))
        .map(|(index, _)| index)
        .collect()
}

/// Distinct values present at `key`, as options sorted by label
pub fn distinct_options(rows: &[Value], key: &str) -> Vec<SelectOption> {
    let mut seen = BTreeSet::new();
    let mut options = Vec::new();

    for row in rows {
        for value in lookup(row, key) {
            let items: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for item in items {
                let label = Cell::from_value(item).display();
                if !label.is_empty() && seen.insert(label.clone()) {
                    options.push(SelectOption::new(item.clone(), label));
                }
            }
        }
    }

    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({ "id": 1, "name": "Piano Grade 1", "fee": 100, "instrument": { "name": "Piano" } }),
            json!({ "id": 2, "name": "Violin Grade 2", "fee": 250, "instrument": { "name": "Violin" } }),
            json!({ "id": 3, "name": "Piano Grade 3", "fee": 400, "instrument": { "name": "Piano" } }),
        ]
    }

    #[test]
    fn test_advanced_number_filter() {
        assert!(advanced_number_filter(100.0, "<200"));
        assert!(!advanced_number_filter(100.0, ">200"));
        assert!(advanced_number_filter(100.0, "200"));
        assert!(advanced_number_filter(100.0, ""));
        assert!(advanced_number_filter(100.0, "=100"));
        assert!(!advanced_number_filter(100.0, "=99"));
        assert!(advanced_number_filter(100.0, ">= 100"));
        assert!(advanced_number_filter(100.0, "<=100"));
        assert!(advanced_number_filter(100.0, "<abc"));
    }

    #[test]
    fn test_ignored_arithmetic_input() {
        assert!(is_ignored_arithmetic("200"));
        assert!(is_ignored_arithmetic("abc"));
        assert!(is_ignored_arithmetic(">x"));
        assert!(!is_ignored_arithmetic(""));
        assert!(!is_ignored_arithmetic(">200"));
    }

    #[test]
    fn test_text_filter_is_case_insensitive() {
        let rows = rows();
        let filter = TableFilter::from_input(
            &FilterDescriptor::text("name", "Name"),
            &FilterInput::Text("PIANO".to_string()),
        )
        .unwrap();
        assert_eq!(apply_filters(&rows, &[filter]), vec![0, 2]);
    }

    #[test]
    fn test_empty_inputs_do_not_filter() {
        let select = FilterDescriptor::select("instrument.name", "Instrument");
        assert!(TableFilter::from_input(&select, &FilterInput::Selection(vec![])).is_none());

        let text = FilterDescriptor::text("name", "Name");
        assert!(TableFilter::from_input(&text, &FilterInput::Text("  ".to_string())).is_none());

        let rows = rows();
        assert_eq!(apply_filters(&rows, &[]), vec![0, 1, 2]);
    }

    #[test]
    fn test_combined_filters_are_idempotent() {
        let rows = rows();
        let filters = vec![
            TableFilter::from_input(
                &FilterDescriptor::select("instrument.name", "Instrument"),
                &FilterInput::Selection(vec![json!("Piano")]),
            )
            .unwrap(),
            TableFilter::from_input(
                &FilterDescriptor::arithmetic("fee", "Fee"),
                &FilterInput::Text(">=200".to_string()),
            )
            .unwrap(),
        ];

        let once = apply_filters(&rows, &filters);
        assert_eq!(once, vec![2]);

        let subset: Vec<Value> = once.iter().map(|&i| rows[i].clone()).collect();
        let twice = apply_filters(&subset, &filters);
        assert_eq!(twice, vec![0]);
        assert_eq!(subset[twice[0]], rows[once[0]]);
    }

    #[test]
    fn test_distinct_options() {
        let options = distinct_options(&rows(), "instrument.name");
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Piano", "Violin"]);
        assert_eq!(options[0].value, json!("Piano"));
    }
}
