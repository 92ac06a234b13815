//! Snackbar line showing the latest notification

use std::collections::VecDeque;
use std::time::Duration;

use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::admin_tui::ui::Styles;
use crate::notify::{Notification, Severity};

pub struct StatusDisplay {
    pub current_message: Option<Notification>,
    pub message_history: VecDeque<Notification>,
    pub max_history: usize,
    pub show_timestamp: bool,
    pub auto_clear_timeout: Option<Duration>,
}

impl Default for StatusDisplay {
    fn default() -> Self {
        Self {
            current_message: None,
            message_history: VecDeque::new(),
            max_history: 100,
            show_timestamp: false,
            auto_clear_timeout: None,
        }
    }
}

impl StatusDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamp = true;
        self
    }

    pub fn with_auto_clear(mut self, timeout: Duration) -> Self {
        self.auto_clear_timeout = Some(timeout);
        self
    }

    pub fn set_message(&mut self, message: Notification) {
        self.archive_current();
        self.current_message = Some(message);
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.set_message(Notification::info(message));
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.set_message(Notification::success(message));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set_message(Notification::error(message));
    }

    pub fn clear(&mut self) {
        self.archive_current();
    }

    fn archive_current(&mut self) {
        if let Some(current) = self.current_message.take() {
            self.message_history.push_back(current);
            while self.message_history.len() > self.max_history {
                self.message_history.pop_front();
            }
        }
    }

    pub fn get_current(&self) -> Option<&Notification> {
        self.current_message.as_ref()
    }

    /// Clear the message once it outlived the timeout
    pub fn expire(&mut self) {
        let expired = match (self.auto_clear_timeout, &self.current_message) {
            (Some(timeout), Some(message)) => message.is_expired(timeout),
            _ => false,
        };
        if expired {
            self.clear();
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, styles: &Styles, fallback: &str) {
        let (content, style) = match &self.current_message {
            Some(message) => (
                self.format_message(message),
                match message.severity {
                    Severity::Info => styles.info(),
                    Severity::Success => styles.success(),
                    Severity::Warning => styles.warning(),
                    Severity::Error => styles.error(),
                },
            ),
            None => (fallback.to_string(), styles.inactive()),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles.inactive_border());

        f.render_widget(Paragraph::new(content).style(style).block(block), area);
    }

    fn format_message(&self, message: &Notification) -> String {
        let prefix = match message.severity {
            Severity::Info => "ℹ",
            Severity::Success => "✓",
            Severity::Warning => "⚠",
            Severity::Error => "✗",
        };

        if self.show_timestamp {
            format!(
                "{} [{}] {}",
                prefix,
                message.timestamp.format("%H:%M:%S"),
                message.message
            )
        } else {
            format!("{} {}", prefix, message.message)
        }
    }
}
