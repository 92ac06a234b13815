//! Declarative form field descriptions

use serde_json::Value;

use super::validation::Rule;
use super::value::FieldValue;
use crate::models::Resource;

/// Flavour of a free-text input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Plain,
    Email,
    Password,
    /// Whole numbers
    Number,
    Decimal,
    Multiline,
}

/// One entry of a select input
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Where a select input gets its options from
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    Static(Vec<SelectOption>),
    /// Rows of another resource, keyed by id
    Lookup(Resource),
}

/// Input type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(TextKind),
    Select { source: OptionSource, multiple: bool },
    Date,
    DateTime,
    Switch,
}

impl FieldKind {
    /// Kinds edited through a text buffer
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::Text(_) | FieldKind::Date | FieldKind::DateTime)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field key in the form state
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Path in an existing record used to prefill the field, defaults to `name`
    pub source: Option<String>,
    pub rules: Vec<Rule>,
    pub placeholder: String,
    pub default: FieldValue,
    /// Dotted key in the request payload and in server errors, defaults to `name`
    pub payload_path: Option<String>,
    /// Only feeds validation of other fields, never sent
    pub client_only: bool,
    /// Left out of the payload while blank
    pub omit_blank: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        let default = match kind {
            FieldKind::Switch => FieldValue::Bool(false),
            FieldKind::Select { multiple: true, .. } => FieldValue::Choices(Vec::new()),
            FieldKind::Text(TextKind::Number | TextKind::Decimal) => FieldValue::Empty,
            FieldKind::Text(_) => FieldValue::Text(String::new()),
            _ => FieldValue::Empty,
        };

        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            source: None,
            rules: Vec::new(),
            placeholder: String::new(),
            default,
            payload_path: None,
            client_only: false,
            omit_blank: false,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text(TextKind::Plain))
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text(TextKind::Email)).with_rule(Rule::Email)
    }

    pub fn password(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text(TextKind::Password)).omit_blank()
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text(TextKind::Number))
    }

    pub fn decimal(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text(TextKind::Decimal))
    }

    pub fn multiline(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text(TextKind::Multiline))
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Date).with_placeholder("YYYY-MM-DD")
    }

    pub fn date_time(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::DateTime).with_placeholder("YYYY-MM-DD HH:MM")
    }

    pub fn switch(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Switch)
    }

    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select {
                source: OptionSource::Static(options),
                multiple: false,
            },
        )
    }

    pub fn lookup(name: &str, label: &str, resource: Resource) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select {
                source: OptionSource::Lookup(resource),
                multiple: false,
            },
        )
    }

    pub fn multi_lookup(name: &str, label: &str, resource: Resource) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select {
                source: OptionSource::Lookup(resource),
                multiple: true,
            },
        )
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
        self
    }

    pub fn required(self) -> Self {
        self.with_rule(Rule::Required)
    }

    pub fn with_source(mut self, path: &str) -> Self {
        self.source = Some(path.to_string());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = value;
        self
    }

    pub fn with_payload_path(mut self, path: &str) -> Self {
        self.payload_path = Some(path.to_string());
        self
    }

    pub fn client_only(mut self) -> Self {
        self.client_only = true;
        self
    }

    pub fn omit_blank(mut self) -> Self {
        self.omit_blank = true;
        self
    }

    /// Path written in the request payload
    pub fn payload_path(&self) -> &str {
        self.payload_path.as_deref().unwrap_or(&self.name)
    }

    /// Path read when prefilling from a record
    pub fn source_path(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }
}
