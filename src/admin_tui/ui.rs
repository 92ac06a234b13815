//! Common UI styles and layout helpers for the admin TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Palette of the active theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styles {
    dark: bool,
}

impl Styles {
    pub fn new(dark: bool) -> Self {
        Self { dark }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    fn foreground(&self) -> Color {
        if self.dark {
            Color::White
        } else {
            Color::Black
        }
    }

    fn background(&self) -> Color {
        if self.dark {
            Color::Black
        } else {
            Color::White
        }
    }

    fn accent(&self) -> Color {
        if self.dark {
            Color::Yellow
        } else {
            Color::Blue
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.foreground()).bg(self.background())
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(if self.dark { Color::Blue } else { Color::LightBlue })
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(if self.dark { Color::Yellow } else { Color::Magenta })
    }

    pub fn info(&self) -> Style {
        Style::default().fg(if self.dark { Color::Cyan } else { Color::Blue })
    }

    pub fn inactive(&self) -> Style {
        Style::default().fg(if self.dark { Color::Gray } else { Color::DarkGray })
    }

    pub fn active_border(&self) -> Style {
        Style::default().fg(self.accent())
    }

    pub fn inactive_border(&self) -> Style {
        self.inactive()
    }

    /// Banner shown outside production
    pub fn banner(&self) -> Style {
        Style::default()
            .bg(Color::Red)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }
}

/// Helper function to center a rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Pad or cut `text` to exactly `width` terminal cells
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        let padding = width - text.width();
        return format!("{}{}", text, " ".repeat(padding));
    }

    let mut out = String::new();
    let mut used = 0;
    let limit = width.saturating_sub(1);
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > limit {
            break;
        }
        out.push(c);
        used += w;
    }
    if width > 0 {
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("Piano", 8), "Piano   ");
        assert_eq!(fit("Violoncello", 6), "Violo…");
        assert_eq!(fit("", 3), "   ");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn test_fit_counts_wide_characters() {
        // each CJK character takes two cells
        let fitted = fit("音楽学校", 5);
        assert_eq!(fitted.width(), 5);
        assert!(fitted.starts_with("音楽"));
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(80, 70, area);
        assert!(popup.x > 0 && popup.y > 0);
        assert!(popup.width < area.width && popup.height < area.height);
        assert!(popup.right() <= area.right() && popup.bottom() <= area.bottom());
    }

    #[test]
    fn test_themes_differ() {
        assert_ne!(Styles::new(true).base(), Styles::new(false).base());
    }
}
