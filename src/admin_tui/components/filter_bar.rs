//! Filter bar: one line per filter, edited in place

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use serde_json::Value;

use crate::admin_tui::ui::Styles;
use crate::form::SelectOption;
use crate::table::{distinct_options, DebounceWindows, FilterDescriptor, FilterInput, FilterKind, FilterSet};

pub struct FilterBar {
    pub filters: FilterSet,
    /// Options per filter index; empty for text and arithmetic filters
    options: Vec<Vec<SelectOption>>,
    pub focused: usize,
    option_cursor: usize,
}

impl FilterBar {
    pub fn new(descriptors: Vec<FilterDescriptor>, windows: DebounceWindows) -> Self {
        let options = descriptors
            .iter()
            .map(|d| match &d.kind {
                FilterKind::Select {
                    options: Some(options),
                } => options.clone(),
                _ => Vec::new(),
            })
            .collect();

        Self {
            filters: FilterSet::new(descriptors, windows),
            options,
            focused: 0,
            option_cursor: 0,
        }
    }

    /// Rebuild derived select options from freshly loaded rows
    pub fn refresh_options(&mut self, rows: &[Value]) {
        for index in 0..self.filters.len() {
            if let Some(FilterDescriptor {
                key,
                kind: FilterKind::Select { options: None },
                ..
            }) = self.filters.descriptor(index)
            {
                self.options[index] = distinct_options(rows, key);
            }
        }
        self.clamp_cursor();
    }

    pub fn height(&self) -> u16 {
        self.filters.len() as u16 + 2
    }

    fn clamp_cursor(&mut self) {
        let count = self.options.get(self.focused).map_or(0, Vec::len);
        if self.option_cursor >= count {
            self.option_cursor = 0;
        }
    }

    fn focus(&mut self, index: usize) {
        self.focused = index;
        self.option_cursor = 0;
    }

    /// Returns true when the key was consumed
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.filters.is_empty() {
            return false;
        }
        let count = self.filters.len();
        let is_select = matches!(
            self.filters.descriptor(self.focused).map(|d| &d.kind),
            Some(FilterKind::Select { .. })
        );

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus((self.focused + 1) % count),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus(if self.focused == 0 { count - 1 } else { self.focused - 1 })
            }
            KeyCode::Left if is_select => {
                let options = self.options[self.focused].len();
                if options > 0 {
                    self.option_cursor = (self.option_cursor + options - 1) % options;
                }
            }
            KeyCode::Right if is_select => {
                let options = self.options[self.focused].len();
                if options > 0 {
                    self.option_cursor = (self.option_cursor + 1) % options;
                }
            }
            KeyCode::Char(' ') if is_select => {
                if let Some(option) = self.options[self.focused].get(self.option_cursor) {
                    let value = option.value.clone();
                    self.filters.toggle_selection(self.focused, value, now);
                }
            }
            KeyCode::Char(c) if !is_select => self.filters.push_char(self.focused, c, now),
            KeyCode::Backspace if !is_select => self.filters.pop_char(self.focused, now),
            _ => return false,
        }
        true
    }

    fn describe(&self, index: usize) -> String {
        match self.filters.draft(index) {
            Some(FilterInput::Text(text)) => text.clone(),
            Some(FilterInput::Selection(selected)) => {
                let labels: Vec<String> = selected
                    .iter()
                    .map(|value| {
                        self.options[index]
                            .iter()
                            .find(|o| o.value == *value)
                            .map(|o| o.label.clone())
                            .unwrap_or_else(|| value.to_string())
                    })
                    .collect();
                if labels.is_empty() {
                    "(all)".to_string()
                } else {
                    labels.join(", ")
                }
            }
            None => String::new(),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, styles: &Styles, active: bool) {
        let mut lines = Vec::new();
        for index in 0..self.filters.len() {
            let Some(descriptor) = self.filters.descriptor(index) else {
                continue;
            };
            let focused = active && index == self.focused;
            let label_style = if focused { styles.selected() } else { styles.info() };

            let mut spans = vec![
                Span::styled(format!("{}: ", descriptor.label), label_style),
                Span::styled(self.describe(index), styles.base()),
            ];
            if self.filters.is_ignored(index) {
                spans.push(Span::styled(
                    "  (ignored: use =, <, <=, > or >=)",
                    styles.warning(),
                ));
            }
            if focused {
                if let Some(option) = self.options[index].get(self.option_cursor) {
                    spans.push(Span::styled(
                        format!("  ◀ {} ▶ [space]", option.label),
                        styles.inactive(),
                    ));
                }
            }
            lines.push(Line::from(spans));
        }

        let title = if self.filters.is_pending() {
            "Filters (applying...)"
        } else {
            "Filters"
        };
        let border = if active {
            styles.active_border()
        } else {
            styles.inactive_border()
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border);
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_select_filter_uses_row_values() {
        let mut bar = FilterBar::new(
            vec![
                FilterDescriptor::text("name", "Name"),
                FilterDescriptor::select("grade", "Grade"),
            ],
            DebounceWindows::default(),
        );
        let rows = vec![json!({ "grade": "B" }), json!({ "grade": "A" })];
        bar.refresh_options(&rows);

        let now = Instant::now();
        assert!(bar.handle_key(press(KeyCode::Tab), now));
        assert!(bar.handle_key(press(KeyCode::Right), now));
        assert!(bar.handle_key(press(KeyCode::Char(' ')), now));
        bar.filters.flush();

        assert_eq!(bar.filters.visible(&rows), vec![0]);
        assert_eq!(bar.describe(1), "B");
    }

    #[test]
    fn test_typing_goes_to_text_filter() {
        let mut bar = FilterBar::new(
            vec![FilterDescriptor::arithmetic("fee", "Fee")],
            DebounceWindows::default(),
        );
        let now = Instant::now();
        for c in ">=5".chars() {
            bar.handle_key(press(KeyCode::Char(c)), now);
        }
        bar.handle_key(press(KeyCode::Backspace), now);
        assert_eq!(bar.describe(0), ">=");
        assert!(bar.filters.is_ignored(0));
    }
}
