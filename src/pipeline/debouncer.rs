//! Debounce control for the initial-query lane
//!
//! Keeps only the latest submission and releases it once no newer one has
//! arrived for the whole delay. Time is read from tokio's clock so paused-time
//! tests drive it deterministically.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct SearchDebouncer<T> {
    pub debounce_delay: Duration,

    /// Latest submission, waiting for the quiet period to end
    pub pending: Option<T>,

    pub last_input_time: Option<Instant>,
}

impl<T> SearchDebouncer<T> {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            debounce_delay: delay,
            pending: None,
            last_input_time: None,
        }
    }

    /// Replace the pending submission and restart the quiet period.
    pub fn set_pending(&mut self, item: T) {
        self.pending = Some(item);
        self.last_input_time = Some(Instant::now());
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
        self.last_input_time = None;
    }

    /// Take the pending submission if the delay has elapsed.
    pub fn check_ready(&mut self) -> Option<T> {
        let last_time = self.last_input_time?;
        if last_time.elapsed() >= self.debounce_delay {
            self.last_input_time = None;
            return self.pending.take();
        }
        None
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some() && self.last_input_time.is_some()
    }

    /// Remaining time until the pending submission is released.
    pub fn time_until_ready(&self) -> Option<Duration> {
        let last_time = self.last_input_time?;
        Some(self.debounce_delay.saturating_sub(last_time.elapsed()))
    }
}
