//! Help screen for the admin TUI

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::admin_tui::{traits::ScreenAction, ui::Styles};

/// Help sections
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HelpSection {
    Overview,
    Navigation,
    Records,
    Filters,
    Forms,
    Shortcuts,
}

impl HelpSection {
    pub const ALL: [HelpSection; 6] = [
        HelpSection::Overview,
        HelpSection::Navigation,
        HelpSection::Records,
        HelpSection::Filters,
        HelpSection::Forms,
        HelpSection::Shortcuts,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            HelpSection::Overview => "Overview",
            HelpSection::Navigation => "Navigation",
            HelpSection::Records => "Records",
            HelpSection::Filters => "Filters",
            HelpSection::Forms => "Forms",
            HelpSection::Shortcuts => "Keyboard Shortcuts",
        }
    }

    fn content(&self) -> &'static [&'static str] {
        match self {
            HelpSection::Overview => &[
                "Sonata Admin manages the records of the music school:",
                "students, teachers, classes, courses, attendances, presences,",
                "enrollment payments, learning tokens, grades and instruments.",
                "",
                "Rows are loaded from the admin API one server page at a time.",
                "Filtering happens locally on the loaded rows.",
            ],
            HelpSection::Navigation => &[
                "↑/↓        Move the selection",
                "Enter      Open the selected entry",
                "Esc        Back to the previous screen",
                "q          Quit (outside text inputs)",
            ],
            HelpSection::Records => &[
                "n          New record",
                "e / Enter  Edit the selected record",
                "d          Delete the selected record (confirm with y)",
                "r          Reload from the server",
                "PgUp/PgDn  Previous / next screen page",
                "[ / ]      Previous / next server page",
            ],
            HelpSection::Filters => &[
                "/          Focus the filter bar, x clears every filter",
                "Text       Rows containing the text, ignoring case",
                "Select     Rows matching any chosen option; none chosen shows all",
                "Number     =N, <N, <=N, >N or >=N; anything else is ignored",
                "",
                "Filters apply once typing pauses; Enter applies at once.",
            ],
            HelpSection::Forms => &[
                "Tab        Next field, Shift+Tab previous",
                "←/→        Browse options of a select field",
                "Space      Choose an option or flip a switch",
                "Ctrl+S/F10 Save; invalid fields block the request",
                "Esc        Discard the form",
                "",
                "Dates are typed as YYYY-MM-DD, date-times as YYYY-MM-DD HH:MM.",
            ],
            HelpSection::Shortcuts => &[
                "F1 / ?     Toggle the context help popup",
                "F2         Switch between dark and light theme",
                "Ctrl+C     Quit immediately",
            ],
        }
    }
}

/// Help screen state
pub struct HelpScreen {
    pub section_state: ListState,
    pub scroll_offset: u16,
}

impl Default for HelpScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpScreen {
    pub fn new() -> Self {
        let mut section_state = ListState::default();
        section_state.select(Some(0));
        Self {
            section_state,
            scroll_offset: 0,
        }
    }

    fn current(&self) -> HelpSection {
        HelpSection::ALL[self.section_state.selected().unwrap_or(0)]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        let selected = self.section_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Up if selected > 0 => {
                self.section_state.select(Some(selected - 1));
                self.scroll_offset = 0;
            }
            KeyCode::Down | KeyCode::Tab if selected + 1 < HelpSection::ALL.len() => {
                self.section_state.select(Some(selected + 1));
                self.scroll_offset = 0;
            }
            KeyCode::PageUp => self.scroll_offset = self.scroll_offset.saturating_sub(10),
            KeyCode::PageDown => self.scroll_offset = self.scroll_offset.saturating_add(10),
            KeyCode::Home => self.scroll_offset = 0,
            KeyCode::Esc => return ScreenAction::NavigateBack,
            _ => {}
        }
        ScreenAction::None
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, styles: &Styles) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(0)])
            .split(area);

        let items: Vec<ListItem> = HelpSection::ALL
            .iter()
            .map(|section| ListItem::new(section.as_str().to_string()))
            .collect();
        let sections = List::new(items)
            .block(
                Block::default()
                    .title("Sections")
                    .borders(Borders::ALL)
                    .border_style(styles.active_border()),
            )
            .highlight_style(styles.selected());
        f.render_stateful_widget(sections, chunks[0], &mut self.section_state);

        let section = self.current();
        let lines: Vec<Line> = section
            .content()
            .iter()
            .map(|line| Line::from(Span::styled(*line, styles.base())))
            .collect();
        let content = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(section.as_str())
                    .borders(Borders::ALL)
                    .border_style(styles.inactive_border()),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.scroll_offset, 0));
        f.render_widget(content, chunks[1]);
    }
}
