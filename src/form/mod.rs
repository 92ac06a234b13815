//! Generic form layer
//!
//! A [`Form`] renders nothing by itself: it owns the field descriptors, the
//! [`FormState`] reducer and the submit flow. Screens feed it key input and
//! draw it, pages supply the submit handler that performs the network call.
//!
//! Submission runs client-side validation first. When a field fails, the
//! handler is never invoked, so no request is made. Otherwise the handler
//! runs exactly once; a [`FailedResponse`] it returns is mapped back onto the
//! fields through the form's [`ErrorMap`].

pub mod descriptor;
pub mod state;
pub mod validation;
pub mod value;

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

pub use descriptor::{FieldDescriptor, FieldKind, OptionSource, SelectOption, TextKind};
pub use state::{FormAction, FormSnapshot, FormState};
pub use validation::Rule;
pub use value::FieldValue;

use crate::api::{ApiResponse, FailedResponse};
use crate::table::cell::lookup;
use value::{parse_wire_date_time, DATE_FORMAT, DATE_TIME_FORMAT};

/// Form field name to backend field name pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorMap {
    entries: Vec<(String, String)>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, form_field: &str, backend_field: &str) -> Self {
        self.entries
            .push((form_field.to_string(), backend_field.to_string()));
        self
    }

    /// Map every field sent under a path other than its own name
    pub fn from_payload_paths(fields: &[FieldDescriptor]) -> Self {
        fields
            .iter()
            .filter(|f| !f.client_only && f.payload_path() != f.name)
            .fold(Self::new(), |map, f| map.map(&f.name, f.payload_path()))
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Raised by a submit handler that refuses to send the request
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitBlocked(pub String);

/// Result of [`Form::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Client-side validation failed, nothing was sent
    Blocked,
    /// The request was sent and the server refused it
    Rejected(FailedResponse),
    Accepted(ApiResponse<T>),
}

impl<T> SubmitOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

pub struct Form {
    descriptors: Vec<FieldDescriptor>,
    state: FormState,
    error_map: ErrorMap,
    options: BTreeMap<String, Vec<SelectOption>>,
    editing: Option<i64>,
}

impl Form {
    pub fn new(descriptors: Vec<FieldDescriptor>) -> Self {
        let mut options = BTreeMap::new();
        for descriptor in &descriptors {
            if let FieldKind::Select {
                source: OptionSource::Static(static_options),
                ..
            } = &descriptor.kind
            {
                options.insert(descriptor.name.clone(), static_options.clone());
            }
        }

        let mut form = Self {
            descriptors,
            state: FormState::default(),
            error_map: ErrorMap::default(),
            options,
            editing: None,
        };
        form.reset();
        form
    }

    pub fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.error_map = error_map;
        self
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn dispatch(&mut self, action: FormAction) {
        self.state.reduce(action);
    }

    /// Id of the record being edited, `None` for a new record
    pub fn editing_id(&self) -> Option<i64> {
        self.editing
    }

    /// Back to descriptor defaults, as a form for a new record
    pub fn reset(&mut self) {
        let defaults = self
            .descriptors
            .iter()
            .map(|d| (d.name.clone(), d.default.clone()))
            .collect();
        self.editing = None;
        self.state.reduce(FormAction::Reset(defaults));
    }

    /// Load the fields of an existing record for editing
    pub fn prefill(&mut self, record: &Value) {
        let values = self
            .descriptors
            .iter()
            .map(|d| {
                let found = lookup(record, d.source_path());
                let value = match found.as_slice() {
                    [] => d.default.clone(),
                    [single] => value_from_json(&d.kind, single),
                    many => {
                        let items = many.iter().map(|v| (*v).clone()).collect();
                        value_from_json(&d.kind, &Value::Array(items))
                    }
                };
                (d.name.clone(), value)
            })
            .collect();

        self.editing = record.get("id").and_then(Value::as_i64);
        self.state.reduce(FormAction::Reset(values));
    }

    /// Options of a select field
    pub fn options(&self, name: &str) -> &[SelectOption] {
        self.options.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_options(&mut self, name: &str, options: Vec<SelectOption>) {
        self.options.insert(name.to_string(), options);
    }

    /// Fields whose options come from another resource
    pub fn lookups(&self) -> Vec<(String, crate::models::Resource)> {
        self.descriptors
            .iter()
            .filter_map(|d| match &d.kind {
                FieldKind::Select {
                    source: OptionSource::Lookup(resource),
                    ..
                } => Some((d.name.clone(), *resource)),
                _ => None,
            })
            .collect()
    }

    /// Text typed into a field; parsed according to the field kind
    pub fn input(&mut self, name: &str, text: &str) {
        let Some(descriptor) = self.descriptor(name) else {
            return;
        };
        let parsed = parse_input(&descriptor.kind, text);
        let value = parsed.clone().unwrap_or(FieldValue::Empty);

        self.state.reduce(FormAction::SetInput {
            field: name.to_string(),
            input: text.to_string(),
            value,
        });

        match parsed {
            Ok(_) => {
                self.validate_field(name);
            }
            Err(message) => self.state.reduce(FormAction::SetError {
                field: name.to_string(),
                message,
            }),
        }
    }

    pub fn set_value(&mut self, name: &str, value: FieldValue) {
        self.state.reduce(FormAction::SetInput {
            field: name.to_string(),
            input: value.as_text(),
            value,
        });
        self.validate_field(name);
    }

    pub fn toggle_switch(&mut self, name: &str) {
        let current = matches!(self.state.value(name), FieldValue::Bool(true));
        self.set_value(name, FieldValue::Bool(!current));
    }

    /// Add or remove one option of a multiple select
    pub fn toggle_choice(&mut self, name: &str, choice: Value) {
        let mut selected = match self.state.value(name) {
            FieldValue::Choices(items) => items.clone(),
            _ => Vec::new(),
        };
        if let Some(pos) = selected.iter().position(|v| *v == choice) {
            selected.remove(pos);
        } else {
            selected.push(choice);
        }
        self.set_value(name, FieldValue::Choices(selected));
    }

    /// Run the field's parser and rules, recording the first error
    pub fn validate_field(&mut self, name: &str) -> bool {
        let Some(descriptor) = self.descriptor(name) else {
            return true;
        };

        let mut result = Ok(());
        if descriptor.kind.is_textual() {
            if let Err(message) = parse_input(&descriptor.kind, self.state.input(name)) {
                result = Err(message);
            }
        }
        if result.is_ok() {
            let value = self.state.value(name);
            result = descriptor
                .rules
                .iter()
                .try_for_each(|rule| rule.check(value, self.state.values()));
        }

        match result {
            Ok(()) => {
                self.state.reduce(FormAction::ClearError {
                    field: name.to_string(),
                });
                true
            }
            Err(message) => {
                self.state.reduce(FormAction::SetError {
                    field: name.to_string(),
                    message,
                });
                false
            }
        }
    }

    pub fn validate_all(&mut self) -> bool {
        let names: Vec<String> = self.descriptors.iter().map(|d| d.name.clone()).collect();
        let mut valid = true;
        for name in names {
            if !self.validate_field(&name) {
                valid = false;
            }
        }
        valid
    }

    /// Request body for this form, including `id` when editing
    ///
    /// Values are nested along each field's payload path. Client-only fields
    /// and blank fields marked `omit_blank` are left out.
    pub fn payload(&self) -> Value {
        let mut object = Map::new();
        for descriptor in &self.descriptors {
            let value = self.state.value(&descriptor.name);
            if descriptor.client_only || (descriptor.omit_blank && value.is_blank()) {
                continue;
            }
            insert_path(&mut object, descriptor.payload_path(), value.to_json());
        }
        if let Some(id) = self.editing {
            object.insert("id".to_string(), Value::from(id));
        }
        Value::Object(object)
    }

    /// Put server validation messages next to the matching inputs
    pub fn apply_failure(&mut self, failed: &FailedResponse) {
        let mut errors = BTreeMap::new();

        for (form_field, backend_field) in self.error_map.entries() {
            if let Some(message) = find_field_error(failed, backend_field) {
                errors.insert(form_field.clone(), message);
            }
        }

        for descriptor in &self.descriptors {
            if errors.contains_key(&descriptor.name) {
                continue;
            }
            let message = find_field_error(failed, descriptor.payload_path())
                .or_else(|| find_field_error(failed, &descriptor.name));
            if let Some(message) = message {
                errors.insert(descriptor.name.clone(), message);
            }
        }

        debug!("Mapped {} server error(s) onto form fields", errors.len());
        self.state.reduce(FormAction::ApplyErrors(errors));
        self.state
            .reduce(FormAction::SetFormError(Some(failed.message.clone())));
    }

    /// Validate, then hand a snapshot to `handler`
    pub async fn submit<T, F, Fut>(&mut self, handler: F) -> SubmitOutcome<T>
    where
        F: FnOnce(FormSnapshot) -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, SubmitBlocked>>,
    {
        self.state.reduce(FormAction::SetFormError(None));
        if !self.validate_all() {
            debug!("Submission blocked by client-side validation");
            return SubmitOutcome::Blocked;
        }

        match handler(self.state.snapshot()).await {
            Err(SubmitBlocked(reason)) => {
                debug!("Submission blocked by handler: {}", reason);
                self.state.reduce(FormAction::SetFormError(Some(reason)));
                SubmitOutcome::Blocked
            }
            Ok(ApiResponse::Failed(failed)) => {
                self.apply_failure(&failed);
                SubmitOutcome::Rejected(failed)
            }
            Ok(response) => SubmitOutcome::Accepted(response),
        }
    }
}

/// Error keyed by `path`, or by a longer key ending in `.path` such as
/// `data.0.user.email`
fn find_field_error(failed: &FailedResponse, path: &str) -> Option<String> {
    if let Some(message) = failed.field_errors.get(path) {
        return Some(message.clone());
    }
    let suffix = format!(".{}", path);
    failed
        .field_errors
        .iter()
        .find(|(key, _)| key.ends_with(&suffix))
        .map(|(_, message)| message.clone())
}

/// Set `value` at a dotted path, creating intermediate objects
fn insert_path(object: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            object.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = object
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Parse typed text into a value of the given kind
fn parse_input(kind: &FieldKind, text: &str) -> Result<FieldValue, String> {
    let trimmed = text.trim();
    match kind {
        FieldKind::Text(TextKind::Number) => {
            if trimmed.is_empty() {
                Ok(FieldValue::Empty)
            } else {
                trimmed
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .map_err(|_| "Must be a number".to_string())
            }
        }
        FieldKind::Text(TextKind::Decimal) => {
            if trimmed.is_empty() {
                Ok(FieldValue::Empty)
            } else {
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(FieldValue::Decimal(n)),
                    _ => Err("Must be a number".to_string()),
                }
            }
        }
        FieldKind::Text(_) => Ok(FieldValue::Text(text.to_string())),
        FieldKind::Date => {
            if trimmed.is_empty() {
                Ok(FieldValue::Empty)
            } else {
                NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                    .map(FieldValue::Date)
                    .map_err(|_| "Invalid date format (YYYY-MM-DD)".to_string())
            }
        }
        FieldKind::DateTime => {
            if trimmed.is_empty() {
                Ok(FieldValue::Empty)
            } else {
                NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT)
                    .map(FieldValue::DateTime)
                    .map_err(|_| "Invalid date format (YYYY-MM-DD HH:MM)".to_string())
            }
        }
        FieldKind::Switch | FieldKind::Select { .. } => Ok(FieldValue::Text(text.to_string())),
    }
}

/// Option key of a record reference: its `id` when it is an object
fn option_key(value: &Value) -> Value {
    match value.get("id") {
        Some(id) => id.clone(),
        None => value.clone(),
    }
}

fn value_from_json(kind: &FieldKind, json: &Value) -> FieldValue {
    if json.is_null() {
        return match kind {
            FieldKind::Select { multiple: true, .. } => FieldValue::Choices(Vec::new()),
            FieldKind::Switch => FieldValue::Bool(false),
            _ => FieldValue::Empty,
        };
    }

    match kind {
        FieldKind::Text(TextKind::Number) => json
            .as_i64()
            .map(FieldValue::Integer)
            .unwrap_or(FieldValue::Empty),
        FieldKind::Text(TextKind::Decimal) => json
            .as_f64()
            .map(FieldValue::Decimal)
            .unwrap_or(FieldValue::Empty),
        FieldKind::Text(_) => match json {
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        },
        FieldKind::Date => json
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), DATE_FORMAT).ok())
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Empty),
        FieldKind::DateTime => json
            .as_str()
            .and_then(parse_wire_date_time)
            .map(FieldValue::DateTime)
            .unwrap_or(FieldValue::Empty),
        FieldKind::Switch => FieldValue::Bool(json.as_bool().unwrap_or(false)),
        FieldKind::Select { multiple: true, .. } => match json {
            Value::Array(items) => FieldValue::Choices(items.iter().map(option_key).collect()),
            other => FieldValue::Choices(vec![option_key(other)]),
        },
        FieldKind::Select { .. } => FieldValue::Choice(option_key(json)),
    }
}
