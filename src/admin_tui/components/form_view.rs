//! Form component: draws a [`Form`] and routes keys into it

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::admin_tui::traits::FormHandler;
use crate::admin_tui::ui::Styles;
use crate::form::{FieldKind, FieldValue, Form, TextKind};

const FIELD_HEIGHT: u16 = 3;

pub struct FormView {
    pub form: Form,
    pub title: String,
    pub current_field: usize,
    option_cursor: usize,
}

impl FormView {
    pub fn new(form: Form, title: &str) -> Self {
        Self {
            form,
            title: title.to_string(),
            current_field: 0,
            option_cursor: 0,
        }
    }

    fn current_name(&self) -> Option<String> {
        self.form
            .descriptors()
            .get(self.current_field)
            .map(|d| d.name.clone())
    }

    fn current_kind(&self) -> Option<&FieldKind> {
        self.form.descriptors().get(self.current_field).map(|d| &d.kind)
    }

    /// Keys not covered by [`FormHandler`]: option picking and switches
    pub fn handle_key(&mut self, key: KeyEvent) {
        let Some(name) = self.current_name() else {
            return;
        };
        let kind = self.current_kind().cloned();

        match (key.code, kind) {
            (KeyCode::Tab | KeyCode::Down, _) => self.next_field(),
            (KeyCode::BackTab | KeyCode::Up, _) => self.previous_field(),
            (KeyCode::Char(' '), Some(FieldKind::Switch)) => self.form.toggle_switch(&name),
            (KeyCode::Left, Some(FieldKind::Select { .. })) => {
                let count = self.form.options(&name).len();
                if count > 0 {
                    self.option_cursor = (self.option_cursor + count - 1) % count;
                }
            }
            (KeyCode::Right, Some(FieldKind::Select { .. })) => {
                let count = self.form.options(&name).len();
                if count > 0 {
                    self.option_cursor = (self.option_cursor + 1) % count;
                }
            }
            (KeyCode::Char(' '), Some(FieldKind::Select { multiple, .. })) => {
                let choice = self
                    .form
                    .options(&name)
                    .get(self.option_cursor)
                    .map(|o| o.value.clone());
                if let Some(choice) = choice {
                    if multiple {
                        self.form.toggle_choice(&name, choice);
                    } else {
                        self.form.set_value(&name, FieldValue::Choice(choice));
                    }
                }
            }
            (KeyCode::Backspace, _) => self.handle_backspace(),
            (KeyCode::Char(c), Some(kind)) if kind.is_textual() => self.handle_char_input(c),
            _ => {}
        }
    }

    /// True while the focused field takes typed characters
    pub fn captures_input(&self) -> bool {
        self.current_kind().map_or(false, FieldKind::is_textual)
    }

    fn display_value(&self, index: usize) -> String {
        let Some(descriptor) = self.form.descriptors().get(index) else {
            return String::new();
        };
        let state = self.form.state();
        let name = &descriptor.name;

        match &descriptor.kind {
            FieldKind::Text(TextKind::Password) => "•".repeat(state.input(name).chars().count()),
            FieldKind::Switch => match state.value(name) {
                FieldValue::Bool(true) => "[x] Yes".to_string(),
                _ => "[ ] No".to_string(),
            },
            FieldKind::Select { .. } => {
                let options = self.form.options(name);
                let label_of = |value: &serde_json::Value| {
                    options
                        .iter()
                        .find(|o| o.value == *value)
                        .map(|o| o.label.clone())
                        .unwrap_or_else(|| value.to_string())
                };
                let chosen = match state.value(name) {
                    FieldValue::Choice(value) if !value.is_null() => label_of(value),
                    FieldValue::Choices(values) => values
                        .iter()
                        .map(label_of)
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => String::new(),
                };
                if index == self.current_field {
                    match options.get(self.option_cursor) {
                        Some(option) => format!("{}   ◀ {} ▶", chosen, option.label),
                        None => format!("{}   (no options)", chosen),
                    }
                } else {
                    chosen
                }
            }
            _ => state.input(name).to_string(),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, styles: &Styles) {
        f.render_widget(Clear, area);
        let outer = Block::default()
            .title(format!("{} (Ctrl+S: save, Esc: cancel)", self.title))
            .borders(Borders::ALL)
            .border_style(styles.active_border())
            .style(styles.base());
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let form_error_height = if self.form.state().form_error().is_some() { 2 } else { 0 };
        let fields_area = Rect {
            height: inner.height.saturating_sub(form_error_height),
            ..inner
        };

        // scroll so the focused field stays visible
        let fits = (fields_area.height / FIELD_HEIGHT).max(1) as usize;
        let first = self.current_field.saturating_sub(fits - 1);
        let count = self.form.descriptors().len();
        let shown: Vec<usize> = (first..count).take(fits).collect();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                shown
                    .iter()
                    .map(|_| Constraint::Length(FIELD_HEIGHT))
                    .chain(std::iter::once(Constraint::Min(0)))
                    .collect::<Vec<_>>(),
            )
            .split(fields_area);

        for (slot, &index) in shown.iter().enumerate() {
            let descriptor = &self.form.descriptors()[index];
            let error = self.form.state().error(&descriptor.name);
            let focused = index == self.current_field;

            let required = if descriptor.is_required() { " *" } else { "" };
            let title = match error {
                Some(error) => format!("{}{} - Error: {}", descriptor.label, required, error),
                None => format!("{}{}", descriptor.label, required),
            };
            let border_style = if focused {
                styles.active_border()
            } else if error.is_some() {
                styles.error()
            } else {
                styles.inactive_border()
            };

            let value = self.display_value(index);
            let (text, text_style) = if value.is_empty() && !descriptor.placeholder.is_empty() {
                (descriptor.placeholder.clone(), styles.inactive())
            } else {
                (value, styles.base())
            };

            let block = Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style);
            f.render_widget(Paragraph::new(text).style(text_style).block(block), chunks[slot]);

            if focused && descriptor.kind.is_textual() {
                let area = chunks[slot];
                let cursor_x = area.x + 1 + self.form.state().input(&descriptor.name).chars().count() as u16;
                if cursor_x < area.x + area.width.saturating_sub(1) {
                    f.set_cursor(cursor_x, area.y + 1);
                }
            }
        }

        if let Some(message) = self.form.state().form_error() {
            let area = Rect {
                y: inner.y + inner.height.saturating_sub(form_error_height),
                height: form_error_height,
                ..inner
            };
            f.render_widget(
                Paragraph::new(message.to_string())
                    .style(styles.error())
                    .wrap(Wrap { trim: true }),
                area,
            );
        }
    }
}

impl FormHandler for FormView {
    fn get_current_field(&self) -> usize {
        self.current_field
    }

    fn set_current_field(&mut self, field: usize) {
        if field < self.form.descriptors().len() {
            self.current_field = field;
            self.option_cursor = 0;
        }
    }

    fn get_field_count(&self) -> usize {
        self.form.descriptors().len()
    }

    fn handle_char_input(&mut self, c: char) {
        if let Some(name) = self.current_name() {
            let mut text = self.form.state().input(&name).to_string();
            text.push(c);
            self.form.input(&name, &text);
        }
    }

    fn handle_backspace(&mut self) {
        let Some(name) = self.current_name() else {
            return;
        };
        match self.current_kind() {
            Some(kind) if kind.is_textual() => {
                let mut text = self.form.state().input(&name).to_string();
                text.pop();
                self.form.input(&name, &text);
            }
            Some(FieldKind::Select { multiple: true, .. }) => {
                self.form.set_value(&name, FieldValue::Choices(Vec::new()))
            }
            Some(FieldKind::Select { .. }) => self.form.set_value(&name, FieldValue::Empty),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldDescriptor, SelectOption};
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_and_field_navigation() {
        let form = Form::new(vec![
            FieldDescriptor::number("fee", "Fee"),
            FieldDescriptor::switch("isPaid", "Paid"),
            FieldDescriptor::select(
                "level",
                "Level",
                vec![SelectOption::new(1, "Beginner"), SelectOption::new(2, "Advanced")],
            ),
        ]);
        let mut view = FormView::new(form, "Payment");

        for c in "12a".chars() {
            view.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(view.form.state().error("fee"), Some("Must be a number"));
        view.handle_key(press(KeyCode::Backspace));
        assert_eq!(view.form.state().value("fee"), &FieldValue::Integer(12));
        assert!(view.captures_input());

        view.handle_key(press(KeyCode::Tab));
        assert!(!view.captures_input());
        view.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(view.form.state().value("isPaid"), &FieldValue::Bool(true));

        view.handle_key(press(KeyCode::Tab));
        view.handle_key(press(KeyCode::Right));
        view.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(view.form.state().value("level"), &FieldValue::Choice(json!(2)));

        view.handle_key(press(KeyCode::Tab));
        assert_eq!(view.get_current_field(), 0);
    }

    #[test]
    fn test_password_is_masked() {
        let mut view = FormView::new(
            Form::new(vec![FieldDescriptor::password("password", "Password")]),
            "Login",
        );
        for c in "abc".chars() {
            view.handle_char_input(c);
        }
        assert_eq!(view.display_value(0), "•••");
    }
}
