//! Quiet-period commit of rapidly changing input

use std::time::{Duration, Instant};

use crate::config::Config;

/// Holds the latest input until no new input arrived for `delay`.
///
/// The caller supplies every instant, so the state machine never sleeps and
/// is trivially testable.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record new input, restarting the quiet period
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// The pending value once its quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Commit the pending value immediately
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Delay per filter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceWindows {
    pub text: Duration,
    pub select: Duration,
    pub arithmetic: Duration,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self {
            text: Duration::from_millis(800),
            select: Duration::from_millis(500),
            arithmetic: Duration::from_millis(800),
        }
    }
}

impl From<&Config> for DebounceWindows {
    fn from(config: &Config) -> Self {
        Self {
            text: config.text_filter_debounce(),
            select: config.select_filter_debounce(),
            arithmetic: config.arithmetic_filter_debounce(),
        }
    }
}
