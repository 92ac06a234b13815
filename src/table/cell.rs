//! Column descriptions and cell extraction from JSON rows

use serde_json::Value;

/// Values at a dot-separated path. Arrays met along the way fan out, so
/// `students.user.email` on a class yields every student's email.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![root];
    if path.is_empty() {
        return current;
    }

    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(items.iter().filter_map(|item| item.get(segment))),
                },
                Value::Object(object) => next.extend(object.get(segment)),
                _ => {}
            }
        }
        current = next;
    }

    current.into_iter().filter(|v| !v.is_null()).collect()
}

/// Display-ready value of one table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Cell bound to a path that fans out over a list
    List(Vec<Cell>),
}

impl Cell {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(items) => Cell::List(items.iter().map(Cell::from_value).collect()),
            Value::Object(object) => match object.get("id") {
                Some(id) => Cell::from_value(id),
                None => Cell::Text(value.to_string()),
            },
        }
    }

    /// Cell of `row` at `path`
    pub fn at(row: &Value, path: &str) -> Self {
        let mut found = lookup(row, path);
        match found.len() {
            0 => Cell::Empty,
            1 => Cell::from_value(found.remove(0)),
            _ => Cell::List(found.into_iter().map(Cell::from_value).collect()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(true) => "Yes".to_string(),
            Cell::Bool(false) => "No".to_string(),
            Cell::List(items) => items
                .iter()
                .map(Cell::display)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Equality against a selected option key; list cells match on any element
    pub fn equals_value(&self, selected: &Value) -> bool {
        match self {
            Cell::List(items) => items.iter().any(|item| item.equals_value(selected)),
            Cell::Empty => selected.is_null(),
            Cell::Bool(b) => selected.as_bool() == Some(*b),
            Cell::Number(n) => match selected {
                Value::Number(s) => s.as_f64() == Some(*n),
                Value::String(s) => s.trim().parse::<f64>().ok() == Some(*n),
                _ => false,
            },
            Cell::Text(t) => match selected {
                Value::String(s) => s == t,
                other => other.to_string() == *t,
            },
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One table column bound to a row path
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub header: String,
    /// Preferred width in terminal cells
    pub width: u16,
}

impl Column {
    pub fn new(key: &str, header: &str, width: u16) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
            width,
        }
    }

    pub fn cell(&self, row: &Value) -> Cell {
        Cell::at(row, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn class_row() -> Value {
        json!({
            "id": 4,
            "course": { "id": 2, "instrument": { "name": "Piano" } },
            "teacher": null,
            "students": [
                { "id": 10, "user": { "email": "a@x.io" } },
                { "id": 11, "user": { "email": "b@x.io" } }
            ],
            "transportFee": 15000.5,
            "isDeactivated": false
        })
    }

    #[test]
    fn test_lookup_nested_and_fan_out() {
        let row = class_row();
        assert_eq!(lookup(&row, "course.instrument.name"), vec![&json!("Piano")]);
        assert_eq!(
            lookup(&row, "students.user.email"),
            vec![&json!("a@x.io"), &json!("b@x.io")]
        );
        assert_eq!(lookup(&row, "students.1.id"), vec![&json!(11)]);
        assert!(lookup(&row, "teacher.user.email").is_empty());
        assert!(lookup(&row, "missing").is_empty());
    }

    #[test]
    fn test_cell_display() {
        let row = class_row();
        assert_eq!(Cell::at(&row, "id").display(), "4");
        assert_eq!(Cell::at(&row, "transportFee").display(), "15000.5");
        assert_eq!(Cell::at(&row, "isDeactivated").display(), "No");
        assert_eq!(Cell::at(&row, "students.user.email").display(), "a@x.io, b@x.io");
        assert_eq!(Cell::at(&row, "teacher").display(), "");
    }

    #[test]
    fn test_equals_value() {
        let row = class_row();
        assert!(Cell::at(&row, "course").equals_value(&json!(2)));
        assert!(Cell::at(&row, "students.id").equals_value(&json!(11)));
        assert!(!Cell::at(&row, "students.id").equals_value(&json!(12)));
        assert!(Cell::at(&row, "isDeactivated").equals_value(&json!(false)));
        assert!(Cell::at(&row, "course.instrument.name").equals_value(&json!("Piano")));
    }
}
