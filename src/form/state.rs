//! Form state reducer keyed by field name

use std::collections::BTreeMap;

use super::value::FieldValue;

static EMPTY: FieldValue = FieldValue::Empty;

/// State transitions of a form
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    /// Replace the value of a field, keeping its text buffer
    SetValue { field: String, value: FieldValue },
    /// Replace both the text buffer and the value parsed from it
    SetInput { field: String, input: String, value: FieldValue },
    SetError { field: String, message: String },
    ClearError { field: String },
    ClearErrors,
    /// Merge field errors, e.g. from a rejected submission
    ApplyErrors(BTreeMap<String, String>),
    SetFormError(Option<String>),
    /// Start over from the given values
    Reset(BTreeMap<String, FieldValue>),
}

/// Values and per-field errors of one form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
    inputs: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
    form_error: Option<String>,
}

/// Copy of the form taken at submit time
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub values: BTreeMap<String, FieldValue>,
    pub errors: BTreeMap<String, String>,
}

impl FormSnapshot {
    pub fn value(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&EMPTY)
    }
}

impl FormState {
    pub fn new(values: BTreeMap<String, FieldValue>) -> Self {
        let mut state = Self::default();
        state.reduce(FormAction::Reset(values));
        state
    }

    pub fn reduce(&mut self, action: FormAction) {
        match action {
            FormAction::SetValue { field, value } => {
                self.values.insert(field, value);
            }
            FormAction::SetInput { field, input, value } => {
                self.inputs.insert(field.clone(), input);
                self.values.insert(field, value);
            }
            FormAction::SetError { field, message } => {
                self.errors.insert(field, message);
            }
            FormAction::ClearError { field } => {
                self.errors.remove(&field);
            }
            FormAction::ClearErrors => {
                self.errors.clear();
                self.form_error = None;
            }
            FormAction::ApplyErrors(errors) => {
                self.errors.extend(errors);
            }
            FormAction::SetFormError(message) => {
                self.form_error = message;
            }
            FormAction::Reset(values) => {
                self.inputs = values
                    .iter()
                    .map(|(name, value)| (name.clone(), value.as_text()))
                    .collect();
                self.values = values;
                self.errors.clear();
                self.form_error = None;
            }
        }
    }

    pub fn value(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&EMPTY)
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    /// Text buffer of a field as typed by the user
    pub fn input(&self, field: &str) -> &str {
        self.inputs.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            values: self.values.clone(),
            errors: self.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_seeds_text_buffers_and_clears_errors() {
        let mut state = FormState::default();
        state.reduce(FormAction::SetError {
            field: "fee".to_string(),
            message: "bad".to_string(),
        });

        let mut values = BTreeMap::new();
        values.insert("fee".to_string(), FieldValue::Integer(150));
        state.reduce(FormAction::Reset(values));

        assert_eq!(state.input("fee"), "150");
        assert!(!state.has_errors());
    }

    #[test]
    fn test_set_value_keeps_other_fields() {
        let mut state = FormState::default();
        state.reduce(FormAction::SetInput {
            field: "name".to_string(),
            input: "Pi".to_string(),
            value: FieldValue::Text("Pi".to_string()),
        });
        state.reduce(FormAction::SetValue {
            field: "active".to_string(),
            value: FieldValue::Bool(true),
        });

        assert_eq!(state.value("name"), &FieldValue::Text("Pi".to_string()));
        assert_eq!(state.value("active"), &FieldValue::Bool(true));
        assert_eq!(state.value("missing"), &FieldValue::Empty);
    }
}
