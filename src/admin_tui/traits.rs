//! Core traits for the admin TUI architecture

use std::time::Instant;

use async_trait::async_trait;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use super::app::Screen;
use super::ui::Styles;
use crate::api::ResourceApi;
use crate::models::Resource;

/// Actions that can be returned from screen event handling
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    /// Navigate to a different screen
    NavigateTo(Screen),
    /// Go back to previous screen
    NavigateBack,
    Quit,
    SetStatus(String),
    SetError(String),
    /// No action taken
    None,
}

/// A screen administering one resource, independent of its record type
#[async_trait]
pub trait ResourceView: Send {
    fn resource(&self) -> Resource;

    fn draw(&mut self, f: &mut Frame, area: Rect, styles: &Styles);

    /// Handle a key; network calls are awaited before returning
    async fn handle_key(&mut self, key: KeyEvent, api: &dyn ResourceApi) -> ScreenAction;

    /// (Re)load the rows
    async fn refresh(&mut self, api: &dyn ResourceApi) -> ScreenAction;

    /// Advance filter debouncers
    fn tick(&mut self, now: Instant);

    /// True while keys are typed into a text input
    fn captures_input(&self) -> bool;

    /// Context help lines
    fn help(&self) -> &'static str;
}

/// Trait for components with navigable lists
pub trait Navigable {
    fn navigate_up(&mut self);

    fn navigate_down(&mut self);

    fn get_selected_index(&self) -> Option<usize>;

    fn set_selected_index(&mut self, index: Option<usize>);

    fn get_item_count(&self) -> usize;

    fn navigate_to_first(&mut self) {
        if self.get_item_count() > 0 {
            self.set_selected_index(Some(0));
        }
    }

    fn navigate_to_last(&mut self) {
        let count = self.get_item_count();
        if count > 0 {
            self.set_selected_index(Some(count - 1));
        }
    }
}

/// Trait for components with paginated content
pub trait Paginated {
    /// Get current page number (0-based)
    fn get_current_page(&self) -> usize;

    fn set_current_page(&mut self, page: usize);

    fn get_total_pages(&self) -> usize;

    fn next_page(&mut self) {
        let current = self.get_current_page();
        if current + 1 < self.get_total_pages() {
            self.set_current_page(current + 1);
        }
    }

    fn previous_page(&mut self) {
        let current = self.get_current_page();
        if current > 0 {
            self.set_current_page(current - 1);
        }
    }
}

/// Trait for form handling
pub trait FormHandler {
    fn get_current_field(&self) -> usize;

    fn set_current_field(&mut self, field: usize);

    fn get_field_count(&self) -> usize;

    fn next_field(&mut self) {
        let total = self.get_field_count();
        if total > 0 {
            self.set_current_field((self.get_current_field() + 1) % total);
        }
    }

    fn previous_field(&mut self) {
        let current = self.get_current_field();
        let total = self.get_field_count();
        if total > 0 {
            self.set_current_field(if current == 0 { total - 1 } else { current - 1 });
        }
    }

    fn handle_char_input(&mut self, c: char);

    fn handle_backspace(&mut self);
}
