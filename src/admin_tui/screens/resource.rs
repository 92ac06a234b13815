//! Generic administration screen: one table, its filters and an edit form

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::admin_tui::components::{DataTable, FilterBar, FormView};
use crate::admin_tui::traits::{Navigable, Paginated, ResourceView, ScreenAction};
use crate::admin_tui::ui::{centered_rect, Styles};
use crate::api::{ApiResponse, FailedResponse, ResourceApi};
use crate::catalog::{self, ResourceSpec};
use crate::config::Config;
use crate::form::{SelectOption, SubmitBlocked, SubmitOutcome};
use crate::models::{
    Attendance, Class, Course, EnrollmentPayment, Grade, Instrument, ListQuery, Presence, Record,
    Resource, Student, StudentLearningToken, Teacher, TeacherSpecialFee, User,
};
use crate::page::ResourcePage;
use crate::table::DebounceWindows;

const ROWS_PER_SCREEN_PAGE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
    Edit,
    ConfirmDelete(i64),
}

/// Screen for the records of `T`
pub struct ResourceScreen<T: Record> {
    spec: ResourceSpec,
    page: ResourcePage<T>,
    table: DataTable,
    filters: FilterBar,
    form: Option<FormView>,
    mode: Mode,
    /// Select options of related resources, dropped on refresh
    lookups: BTreeMap<Resource, Vec<SelectOption>>,
}

/// Build the screen administering `resource`
pub fn open(resource: Resource, config: &Config) -> Box<dyn ResourceView> {
    match resource {
        Resource::User => Box::new(ResourceScreen::<User>::new(config)),
        Resource::Teacher => Box::new(ResourceScreen::<Teacher>::new(config)),
        Resource::Student => Box::new(ResourceScreen::<Student>::new(config)),
        Resource::Course => Box::new(ResourceScreen::<Course>::new(config)),
        Resource::Class => Box::new(ResourceScreen::<Class>::new(config)),
        Resource::Attendance => Box::new(ResourceScreen::<Attendance>::new(config)),
        Resource::Presence => Box::new(ResourceScreen::<Presence>::new(config)),
        Resource::EnrollmentPayment => Box::new(ResourceScreen::<EnrollmentPayment>::new(config)),
        Resource::StudentLearningToken => {
            Box::new(ResourceScreen::<StudentLearningToken>::new(config))
        }
        Resource::Grade => Box::new(ResourceScreen::<Grade>::new(config)),
        Resource::Instrument => Box::new(ResourceScreen::<Instrument>::new(config)),
        Resource::TeacherSpecialFee => Box::new(ResourceScreen::<TeacherSpecialFee>::new(config)),
    }
}

impl<T: Record> ResourceScreen<T> {
    pub fn new(config: &Config) -> Self {
        let spec = catalog::spec(T::RESOURCE);
        let table = DataTable::new(spec.columns.clone()).with_pagination(ROWS_PER_SCREEN_PAGE);
        let filters = FilterBar::new(spec.filters.clone(), DebounceWindows::from(config));

        Self {
            page: ResourcePage::new(ListQuery::new(1, config.results_per_page)),
            table,
            filters,
            form: None,
            mode: Mode::Browse,
            lookups: BTreeMap::new(),
            spec,
        }
    }

    /// Push the page rows into the table and filter bar
    fn sync_rows(&mut self) {
        let rows = self.page.as_values();
        self.filters.refresh_options(&rows);
        let visible = self.filters.filters.visible(&rows);
        self.table.set_rows(rows, visible);
    }

    fn apply_filters(&mut self) {
        let visible = self.filters.filters.visible(&self.table.rows);
        debug!(
            "{} filter: {}/{} row(s) visible",
            T::RESOURCE.as_str(),
            visible.len(),
            self.table.rows.len()
        );
        self.table.set_visible(visible);
    }

    async fn lookup_options(
        &mut self,
        resource: Resource,
        api: &dyn ResourceApi,
    ) -> Result<Vec<SelectOption>, FailedResponse> {
        if let Some(options) = self.lookups.get(&resource) {
            return Ok(options.clone());
        }

        let rows = match api.list(resource, &ListQuery::default()).await {
            ApiResponse::Failed(failed) => return Err(failed),
            response => response.into_rows().unwrap_or_default(),
        };
        let options = catalog::lookup_options(resource, &rows);
        self.lookups.insert(resource, options.clone());
        Ok(options)
    }

    /// Open the form, prefilled from `record` when editing
    async fn open_form(&mut self, record: Option<Value>, api: &dyn ResourceApi) -> ScreenAction {
        let mut form = self.spec.form();
        let mut action = ScreenAction::None;
        for (name, resource) in form.lookups() {
            match self.lookup_options(resource, api).await {
                Ok(options) => form.set_options(&name, options),
                Err(failed) => {
                    action = ScreenAction::SetError(format!(
                        "Could not load {} options: {}",
                        resource.as_str(),
                        failed.message
                    ));
                }
            }
        }

        let title = match &record {
            Some(record) => {
                form.prefill(record);
                format!("Edit {} #{}", T::RESOURCE.as_str(), form.editing_id().unwrap_or_default())
            }
            None => format!("New {}", T::RESOURCE.as_str()),
        };

        self.form = Some(FormView::new(form, &title));
        self.mode = Mode::Edit;
        action
    }

    async fn submit(&mut self, api: &dyn ResourceApi) -> ScreenAction {
        let Some(view) = self.form.as_mut() else {
            return ScreenAction::None;
        };
        let editing = view.form.editing_id().is_some();
        let payload = view.form.payload();
        let page = &mut self.page;

        let outcome = view
            .form
            .submit(|_| async move {
                let response = if editing {
                    page.update(api, vec![payload]).await
                } else {
                    page.insert(api, vec![payload]).await
                };
                Ok::<_, SubmitBlocked>(response)
            })
            .await;

        match outcome {
            SubmitOutcome::Accepted(_) => {
                info!("Saved {} record", T::RESOURCE.as_str());
                self.form = None;
                self.mode = Mode::Browse;
                self.sync_rows();
                ScreenAction::SetStatus(format!("{} saved", T::RESOURCE.as_str()))
            }
            SubmitOutcome::Rejected(failed) => ScreenAction::SetError(failed.message),
            SubmitOutcome::Blocked => {
                ScreenAction::SetError("Please correct the highlighted fields".to_string())
            }
        }
    }

    async fn delete(&mut self, id: i64, api: &dyn ResourceApi) -> ScreenAction {
        self.mode = Mode::Browse;
        match self.page.delete(api, vec![id]).await {
            ApiResponse::Failed(failed) => ScreenAction::SetError(failed.message),
            _ => {
                info!("Deleted {} #{}", T::RESOURCE.as_str(), id);
                self.sync_rows();
                ScreenAction::SetStatus(format!("Deleted {} #{}", T::RESOURCE.as_str(), id))
            }
        }
    }

    async fn change_server_page(&mut self, forward: bool, api: &dyn ResourceApi) -> ScreenAction {
        let current = self.page.query().page;
        let last = self.page.pagination().map_or(1, |p| p.total_pages.max(1));
        let target = if forward { current + 1 } else { current.saturating_sub(1) };
        if target < 1 || target > last {
            return ScreenAction::None;
        }
        self.page.set_page(target);
        self.refresh(api).await
    }

    async fn handle_browse_key(&mut self, key: KeyEvent, api: &dyn ResourceApi) -> ScreenAction {
        match key.code {
            KeyCode::Up => self.table.navigate_up(),
            KeyCode::Down => self.table.navigate_down(),
            KeyCode::Home => self.table.navigate_to_first(),
            KeyCode::End => self.table.navigate_to_last(),
            KeyCode::PageUp => self.table.previous_page(),
            KeyCode::PageDown => self.table.next_page(),
            KeyCode::Char('[') => return self.change_server_page(false, api).await,
            KeyCode::Char(']') => return self.change_server_page(true, api).await,
            KeyCode::Char('r') => {
                self.lookups.clear();
                return self.refresh(api).await;
            }
            KeyCode::Char('n') => return self.open_form(None, api).await,
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(row) = self.table.selected_row().cloned() {
                    return self.open_form(Some(row), api).await;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.table.selected_id() {
                    self.mode = Mode::ConfirmDelete(id);
                }
            }
            KeyCode::Char('/') if !self.filters.filters.is_empty() => self.mode = Mode::Filter,
            KeyCode::Char('x') => {
                if self.filters.filters.clear() {
                    self.apply_filters();
                }
            }
            KeyCode::Esc => return ScreenAction::NavigateBack,
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if self.filters.filters.flush() {
                    self.apply_filters();
                }
                self.mode = Mode::Browse;
            }
            KeyCode::Esc => self.mode = Mode::Browse,
            _ => {
                self.filters.handle_key(key, Instant::now());
            }
        }
    }

    fn draw_hints(&self, f: &mut Frame, area: Rect, styles: &Styles) {
        let hints = match self.mode {
            Mode::Filter => "Tab: next filter  ←/→ Space: pick  Enter: apply  Esc: done",
            _ => "n: new  e: edit  d: delete  /: filter  x: clear filters  r: refresh  [ ]: server page  Esc: back",
        };
        let server_page = match self.page.pagination() {
            Some(p) => format!("  |  page {}/{} ({} total)", p.current_page, p.total_pages, p.total_results),
            None => String::new(),
        };
        let line = Line::from(vec![
            Span::styled(hints, styles.inactive()),
            Span::styled(server_page, styles.info()),
        ]);
        f.render_widget(Paragraph::new(line), area);
    }

    fn draw_confirm(&self, f: &mut Frame, area: Rect, styles: &Styles, id: i64) {
        let popup = centered_rect(50, 20, area);
        f.render_widget(Clear, popup);
        let text = format!("Delete {} #{}? (y/N)", T::RESOURCE.as_str(), id);
        let block = Block::default()
            .title("Confirm")
            .borders(Borders::ALL)
            .border_style(styles.warning());
        f.render_widget(Paragraph::new(text).style(styles.base()).block(block), popup);
    }
}

#[async_trait]
impl<T: Record> ResourceView for ResourceScreen<T> {
    fn resource(&self) -> Resource {
        T::RESOURCE
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, styles: &Styles) {
        let filter_height = if self.filters.filters.is_empty() {
            0
        } else {
            self.filters.height()
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(filter_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        if filter_height > 0 {
            self.filters
                .render(f, chunks[0], styles, self.mode == Mode::Filter);
        }

        let title = match self.page.last_error() {
            Some(failed) if !self.page.is_loaded() => {
                format!("{} - {}", T::RESOURCE.as_str(), failed.message)
            }
            _ => T::RESOURCE.as_str().to_string(),
        };
        self.table.render(f, chunks[1], styles, &title);
        self.draw_hints(f, chunks[2], styles);

        match self.mode {
            Mode::Edit => {
                if let Some(view) = &self.form {
                    view.render(f, centered_rect(70, 90, area), styles);
                }
            }
            Mode::ConfirmDelete(id) => self.draw_confirm(f, area, styles, id),
            _ => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent, api: &dyn ResourceApi) -> ScreenAction {
        match self.mode {
            Mode::Browse => self.handle_browse_key(key, api).await,
            Mode::Filter => {
                self.handle_filter_key(key);
                ScreenAction::None
            }
            Mode::ConfirmDelete(id) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.delete(id, api).await,
                _ => {
                    self.mode = Mode::Browse;
                    ScreenAction::None
                }
            },
            Mode::Edit => {
                let save = key.code == KeyCode::F(10)
                    || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL));
                if save {
                    return self.submit(api).await;
                }
                if key.code == KeyCode::Esc {
                    self.form = None;
                    self.mode = Mode::Browse;
                } else if let Some(view) = self.form.as_mut() {
                    view.handle_key(key);
                }
                ScreenAction::None
            }
        }
    }

    async fn refresh(&mut self, api: &dyn ResourceApi) -> ScreenAction {
        if self.page.fetch(api).await {
            self.sync_rows();
            ScreenAction::SetStatus(format!(
                "Loaded {} {}",
                self.page.rows().len(),
                T::RESOURCE.as_str()
            ))
        } else {
            let message = self
                .page
                .last_error()
                .map(|failed| failed.message.clone())
                .unwrap_or_else(|| format!("Failed to load {}", T::RESOURCE.as_str()));
            ScreenAction::SetError(message)
        }
    }

    fn tick(&mut self, now: Instant) {
        if self.filters.filters.tick(now) {
            self.apply_filters();
        }
    }

    fn captures_input(&self) -> bool {
        match self.mode {
            Mode::Browse => false,
            Mode::Filter | Mode::ConfirmDelete(_) => true,
            Mode::Edit => self.form.as_ref().map_or(false, |view| view.captures_input()),
        }
    }

    fn help(&self) -> &'static str {
        match self.mode {
            Mode::Edit => {
                "Edit Record:\n\
                Tab / Shift+Tab - Next / previous field\n\
                Type in text fields\n\
                ←/→ - Choose option, Space - Select / toggle\n\
                Ctrl+S / F10 - Save\n\
                Esc - Cancel"
            }
            Mode::Filter => {
                "Filters:\n\
                Tab - Next filter\n\
                Type text, or =, <, <=, >, >= followed by a number\n\
                ←/→ - Choose option, Space - Toggle\n\
                Enter - Apply now, Esc - Back to table"
            }
            _ => {
                "Records:\n\
                ↑/↓ - Navigate rows\n\
                Page Up/Down - Navigate pages\n\
                [ / ] - Previous / next server page\n\
                n - New record, e / Enter - Edit\n\
                d - Delete selected\n\
                / - Edit filters, x - Clear filters\n\
                r - Refresh"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ManyResult, Pagination};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeApi {
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl ResourceApi for FakeApi {
        async fn list(&self, _: Resource, _: &ListQuery) -> ApiResponse<Value> {
            let results = vec![
                json!({ "id": 1, "name": "Piano" }),
                json!({ "id": 2, "name": "Violin" }),
                json!({ "id": 3, "name": "Viola" }),
            ];
            ApiResponse::Many(ManyResult {
                results,
                pagination: Pagination::single_page(3),
            })
        }

        async fn insert(&self, _: Resource, data: Vec<Value>) -> ApiResponse<Value> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let mut row = data[0].clone();
            row["id"] = json!(4);
            ApiResponse::Many(ManyResult {
                results: vec![row],
                pagination: Pagination::single_page(1),
            })
        }

        async fn update(&self, _: Resource, data: Vec<Value>) -> ApiResponse<Value> {
            ApiResponse::Many(ManyResult {
                results: data,
                pagination: Pagination::single_page(1),
            })
        }

        async fn delete(&self, _: Resource, _: Vec<i64>) -> ApiResponse<Value> {
            ApiResponse::Many(ManyResult {
                results: Vec::new(),
                pagination: Pagination::single_page(0),
            })
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen() -> ResourceScreen<Instrument> {
        let config = Config::from_env().unwrap();
        ResourceScreen::new(&config)
    }

    #[tokio::test]
    async fn test_refresh_fills_table() {
        let api = FakeApi::default();
        let mut screen = screen();
        let action = screen.refresh(&api).await;
        assert_eq!(action, ScreenAction::SetStatus("Loaded 3 Instruments".to_string()));
        assert_eq!(screen.table.visible, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_filter_applies_after_quiet_period() {
        let api = FakeApi::default();
        let mut screen = screen();
        screen.refresh(&api).await;

        screen.handle_key(press(KeyCode::Char('/')), &api).await;
        assert!(screen.captures_input());
        for c in "vio".chars() {
            screen.handle_key(press(KeyCode::Char(c)), &api).await;
        }
        assert_eq!(screen.table.visible.len(), 3);

        screen.tick(Instant::now() + Duration::from_secs(5));
        assert_eq!(screen.table.visible, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let api = FakeApi::default();
        let mut screen = screen();
        screen.refresh(&api).await;

        screen.handle_key(press(KeyCode::Char('n')), &api).await;
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let action = screen.handle_key(save, &api).await;
        assert!(matches!(action, ScreenAction::SetError(_)));
        assert_eq!(api.inserts.load(Ordering::SeqCst), 0);

        for c in "Cello".chars() {
            screen.handle_key(press(KeyCode::Char(c)), &api).await;
        }
        let action = screen.handle_key(press(KeyCode::F(10)), &api).await;
        assert_eq!(action, ScreenAction::SetStatus("Instruments saved".to_string()));
        assert_eq!(api.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(screen.page.rows().len(), 4);
        assert!(!screen.captures_input());
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let api = FakeApi::default();
        let mut screen = screen();
        screen.refresh(&api).await;

        screen.handle_key(press(KeyCode::Char('d')), &api).await;
        screen.handle_key(press(KeyCode::Char('n')), &api).await;
        assert_eq!(screen.page.rows().len(), 3);

        screen.handle_key(press(KeyCode::Char('d')), &api).await;
        screen.handle_key(press(KeyCode::Char('y')), &api).await;
        assert_eq!(screen.page.rows().len(), 2);
        assert_eq!(screen.page.get(1).map(|r| r.id), None);
    }
}
