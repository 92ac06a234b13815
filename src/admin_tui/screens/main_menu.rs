//! Main menu screen for the admin TUI

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::admin_tui::{app::Screen, traits::ScreenAction, ui::Styles};
use crate::models::Resource;

/// Main menu options
#[derive(Debug, Clone)]
pub struct MenuOption {
    pub title: String,
    pub description: String,
    pub shortcut: char,
    pub screen: Screen,
}

impl MenuOption {
    pub fn new(title: &str, description: &str, shortcut: char, screen: Screen) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            shortcut,
            screen,
        }
    }

    fn resource(resource: Resource, shortcut: char) -> Self {
        Self::new(
            resource.as_str(),
            &format!("Browse, filter and edit {}", resource.as_str().to_lowercase()),
            shortcut,
            Screen::Resource(resource),
        )
    }
}

/// Main menu screen state
pub struct MainMenuScreen {
    pub menu_state: ListState,
    pub menu_options: Vec<MenuOption>,
}

impl Default for MainMenuScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl MainMenuScreen {
    pub fn new() -> Self {
        let menu_options = vec![
            MenuOption::new("Dashboard", "Record counts at a glance", 'd', Screen::Dashboard),
            MenuOption::resource(Resource::Attendance, 'a'),
            MenuOption::resource(Resource::Class, 'c'),
            MenuOption::resource(Resource::Course, 'o'),
            MenuOption::resource(Resource::EnrollmentPayment, 'e'),
            MenuOption::resource(Resource::Grade, 'g'),
            MenuOption::resource(Resource::Instrument, 'i'),
            MenuOption::resource(Resource::Presence, 'p'),
            MenuOption::resource(Resource::Student, 's'),
            MenuOption::resource(Resource::StudentLearningToken, 'k'),
            MenuOption::resource(Resource::Teacher, 't'),
            MenuOption::resource(Resource::TeacherSpecialFee, 'f'),
            MenuOption::resource(Resource::User, 'u'),
            MenuOption::new("Help", "View help and keyboard shortcuts", 'h', Screen::Help),
            MenuOption::new("Logout", "Sign out and return to the login form", 'l', Screen::Login),
        ];

        let mut menu_state = ListState::default();
        menu_state.select(Some(0));

        Self {
            menu_state,
            menu_options,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        let count = self.menu_options.len();
        match key.code {
            KeyCode::Up => {
                let selected = self.menu_state.selected().unwrap_or(0);
                self.menu_state
                    .select(Some(if selected == 0 { count - 1 } else { selected - 1 }));
            }
            KeyCode::Down => {
                let selected = self.menu_state.selected().unwrap_or(0);
                self.menu_state.select(Some((selected + 1) % count));
            }
            KeyCode::Enter => {
                if let Some(option) = self
                    .menu_state
                    .selected()
                    .and_then(|i| self.menu_options.get(i))
                {
                    return ScreenAction::NavigateTo(option.screen.clone());
                }
            }
            KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                if let Some(option) = self.menu_options.iter().find(|o| o.shortcut == c) {
                    return ScreenAction::NavigateTo(option.screen.clone());
                }
            }
            _ => {}
        }
        ScreenAction::None
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, styles: &Styles) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Menu
                Constraint::Length(3), // Instructions
            ])
            .split(area);

        let title = Paragraph::new("Sonata Music School Admin")
            .style(styles.title())
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        self.draw_menu(f, chunks[1], styles);

        let instructions = Line::from(vec![
            Span::styled("Navigation: ", styles.info()),
            Span::raw("↑/↓ to move, "),
            Span::styled("Enter", styles.base().add_modifier(Modifier::BOLD)),
            Span::raw(" or shortcut to open, q to quit"),
        ]);
        f.render_widget(
            Paragraph::new(instructions).block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );
    }

    fn draw_menu(&mut self, f: &mut Frame, area: Rect, styles: &Styles) {
        let selected = self.menu_state.selected();
        let items: Vec<ListItem> = self
            .menu_options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let style = if Some(i) == selected {
                    styles.selected()
                } else {
                    styles.base()
                };

                ListItem::new(Line::from(vec![
                    Span::styled(format!("[{}] ", option.shortcut), styles.info()),
                    Span::styled(format!("{:<26}", option.title), style.add_modifier(Modifier::BOLD)),
                    Span::styled(option.description.clone(), styles.inactive()),
                ]))
            })
            .collect();

        let menu = List::new(items)
            .block(
                Block::default()
                    .title("Main Menu")
                    .borders(Borders::ALL)
                    .border_style(styles.active_border()),
            )
            .highlight_style(styles.selected());

        f.render_stateful_widget(menu, area, &mut self.menu_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_shortcuts_are_unique() {
        let menu = MainMenuScreen::new();
        let mut shortcuts: Vec<char> = menu.menu_options.iter().map(|o| o.shortcut).collect();
        shortcuts.sort_unstable();
        shortcuts.dedup();
        assert_eq!(shortcuts.len(), menu.menu_options.len());
    }

    #[test]
    fn test_shortcut_navigates() {
        let mut menu = MainMenuScreen::new();
        let action = menu.handle_key(KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT));
        assert_eq!(
            action,
            ScreenAction::NavigateTo(Screen::Resource(Resource::StudentLearningToken))
        );

        menu.handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE));
        let action = menu.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(action, ScreenAction::NavigateTo(Screen::Login));
    }
}
