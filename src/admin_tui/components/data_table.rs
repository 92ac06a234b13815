//! Table component rendering JSON rows through column descriptors

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use serde_json::Value;

use crate::admin_tui::traits::{Navigable, Paginated};
use crate::admin_tui::ui::{fit, Styles};
use crate::table::{page_count, page_slice, Column};

/// Rows of one resource with the subset the filters let through
pub struct DataTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Value>,
    /// Indices into `rows` passing the filters
    pub visible: Vec<usize>,
    pub state: ListState,
    pub current_page: usize,
    pub items_per_page: usize,
}

impl DataTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            visible: Vec::new(),
            state: ListState::default(),
            current_page: 0,
            items_per_page: 20,
        }
    }

    pub fn with_pagination(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page.max(1);
        self
    }

    /// Replace rows and visible subset, keeping the selection when possible
    pub fn set_rows(&mut self, rows: Vec<Value>, visible: Vec<usize>) {
        let selected_id = self.selected_row().and_then(|row| row.get("id")).cloned();

        self.rows = rows;
        self.visible = visible;
        if self.current_page >= self.get_total_pages() {
            self.current_page = 0;
        }

        let position = selected_id.and_then(|id| {
            self.page_indices()
                .iter()
                .position(|&i| self.rows[i].get("id") == Some(&id))
        });
        let fallback = (!self.page_indices().is_empty()).then_some(0);
        self.state.select(position.or(fallback));
    }

    /// Apply a new visible subset, back on the first page
    pub fn set_visible(&mut self, visible: Vec<usize>) {
        self.visible = visible;
        self.current_page = 0;
        let first = (!self.page_indices().is_empty()).then_some(0);
        self.state.select(first);
    }

    pub fn page_indices(&self) -> &[usize] {
        page_slice(&self.visible, self.current_page, self.items_per_page)
    }

    pub fn selected_row(&self) -> Option<&Value> {
        let index = self.state.selected()?;
        let row = *self.page_indices().get(index)?;
        self.rows.get(row)
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected_row()?.get("id")?.as_i64()
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, styles: &Styles, title: &str) {
        let mut items = Vec::new();

        let separator = Span::styled(" │ ", styles.title());
        let mut header = Vec::new();
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                header.push(separator.clone());
            }
            header.push(Span::styled(fit(&column.header, column.width as usize), styles.title()));
        }
        items.push(ListItem::new(Line::from(header)));

        let selected = self.state.selected();
        for (i, &row_index) in self.page_indices().iter().enumerate() {
            let row = &self.rows[row_index];
            let style = if Some(i) == selected {
                styles.selected()
            } else {
                styles.base()
            };

            let mut spans = Vec::new();
            for (c, column) in self.columns.iter().enumerate() {
                if c > 0 {
                    spans.push(Span::styled(" │ ", style));
                }
                spans.push(Span::styled(
                    fit(&column.cell(row).display(), column.width as usize),
                    style,
                ));
            }
            items.push(ListItem::new(Line::from(spans)));
        }

        let title = if self.visible.is_empty() {
            format!("{} (Empty)", title)
        } else {
            format!(
                "{} ({}/{} - Page {}/{})",
                title,
                self.visible.len(),
                self.rows.len(),
                self.current_page + 1,
                self.get_total_pages()
            )
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(styles.active_border());

        // the header takes the first list slot
        let mut state = ListState::default();
        state.select(self.state.selected().map(|i| i + 1));
        f.render_stateful_widget(List::new(items).block(block), area, &mut state);
    }
}

impl Navigable for DataTable {
    fn navigate_up(&mut self) {
        let count = self.get_item_count();
        if count == 0 {
            return;
        }
        let selected = self.state.selected().unwrap_or(0);
        self.state
            .select(Some(if selected == 0 { count - 1 } else { selected - 1 }));
    }

    fn navigate_down(&mut self) {
        let count = self.get_item_count();
        if count == 0 {
            return;
        }
        let selected = self.state.selected().unwrap_or(0);
        self.state.select(Some((selected + 1) % count));
    }

    fn get_selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        self.state.select(index);
    }

    fn get_item_count(&self) -> usize {
        self.page_indices().len()
    }
}

impl Paginated for DataTable {
    fn get_current_page(&self) -> usize {
        self.current_page
    }

    fn set_current_page(&mut self, page: usize) {
        self.current_page = page;
        let first = (!self.page_indices().is_empty()).then_some(0);
        self.state.select(first);
    }

    fn get_total_pages(&self) -> usize {
        page_count(self.visible.len(), self.items_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> DataTable {
        let mut table = DataTable::new(vec![Column::new("id", "ID", 4)]).with_pagination(2);
        let rows = (1..=5).map(|id| json!({ "id": id })).collect();
        table.set_rows(rows, vec![0, 1, 2, 3, 4]);
        table
    }

    #[test]
    fn test_paging_and_selection() {
        let mut table = table();
        assert_eq!(table.get_total_pages(), 3);
        assert_eq!(table.selected_id(), Some(1));

        table.navigate_down();
        assert_eq!(table.selected_id(), Some(2));
        table.navigate_down();
        assert_eq!(table.selected_id(), Some(1));

        table.next_page();
        table.next_page();
        assert_eq!(table.selected_id(), Some(5));
        table.next_page();
        assert_eq!(table.get_current_page(), 2);
    }

    #[test]
    fn test_set_rows_keeps_selected_record() {
        let mut table = table();
        table.navigate_down();
        let rows = vec![json!({ "id": 2 }), json!({ "id": 9 })];
        table.set_rows(rows, vec![1, 0]);
        assert_eq!(table.selected_id(), Some(2));
    }

    #[test]
    fn test_filtered_out_rows_are_not_selectable() {
        let mut table = table();
        table.set_visible(vec![]);
        assert_eq!(table.selected_row(), None);
        table.navigate_down();
        assert_eq!(table.get_selected_index(), None);
    }
}
