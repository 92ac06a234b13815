//! Snackbar notification queue shared between the API layer and the UI
//!
//! The queue is created once at the composition root and handed to whoever
//! needs to publish or display messages. Cloning is cheap and every clone
//! observes the same queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A single snackbar message
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Local>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp: Local::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    /// Whether the message has been visible longer than `timeout`
    pub fn is_expired(&self, timeout: std::time::Duration) -> bool {
        let elapsed = Local::now().signed_duration_since(self.timestamp);
        elapsed.to_std().unwrap_or_default() > timeout
    }
}

#[derive(Debug)]
struct Inner {
    pending: VecDeque<Notification>,
    capacity: usize,
}

/// FIFO of notifications waiting to be shown
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    inner: Arc<Mutex<Inner>>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                pending: VecDeque::new(),
                capacity: capacity.max(1),
            })),
        }
    }

    /// Enqueue a notification, dropping the oldest one when full
    pub fn push(&self, notification: Notification) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if inner.pending.len() >= inner.capacity {
            inner.pending.pop_front();
        }
        inner.pending.push_back(notification);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Notification::error(message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Notification::success(message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Notification::info(message));
    }

    /// Take the oldest pending notification
    pub fn pop(&self) -> Option<Notification> {
        match self.inner.lock() {
            Ok(mut guard) => guard.pending.pop_front(),
            Err(poisoned) => poisoned.into_inner().pending.pop_front(),
        }
    }

    /// Take every pending notification in arrival order
    pub fn drain(&self) -> Vec<Notification> {
        match self.inner.lock() {
            Ok(mut guard) => guard.pending.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().pending.drain(..).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.pending.len(),
            Err(poisoned) => poisoned.into_inner().pending.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_queue() {
        let queue = NotificationQueue::new();
        let publisher = queue.clone();
        publisher.error("Failed to load students");
        publisher.success("Saved");

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].severity, Severity::Error);
        assert_eq!(drained[1].message, "Saved");
        assert!(publisher.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let queue = NotificationQueue::with_capacity(2);
        queue.info("one");
        queue.info("two");
        queue.info("three");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().message, "two");
    }
}
