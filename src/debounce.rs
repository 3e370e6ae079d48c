//! Time-based debouncing of mechanical inputs.

use std::time::Duration;

use crate::clock::{duration_micros, elapsed_micros};
use crate::types::Microseconds;

/// Accepts a reading only if at least `interval` has passed since the last accepted one.
///
/// Rejected readings do not restart the window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Microseconds,
    last_accepted: Option<Microseconds>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: duration_micros(interval),
            last_accepted: None,
        }
    }

    /// Decide whether a reading at `now` is accepted, recording it if so.
    pub fn accept(&mut self, now: Microseconds) -> bool {
        if let Some(last) = self.last_accepted {
            if elapsed_micros(last, now) < self.interval {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reading_is_accepted() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        assert!(debouncer.accept(0));
    }

    #[test]
    fn test_bounces_within_window_are_rejected() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        assert!(debouncer.accept(1_000));
        assert!(!debouncer.accept(1_001));
        assert!(!debouncer.accept(5_000));
        assert!(!debouncer.accept(10_999));
        assert!(debouncer.accept(11_000));
        assert!(!debouncer.accept(11_500));
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        assert!(debouncer.accept(0));
        for t in (1..10).map(|ms| ms * 1_000) {
            assert!(!debouncer.accept(t));
        }
        assert!(debouncer.accept(10_000));
    }

    #[test]
    fn test_window_across_counter_wrap() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let start = u64::MAX - 2_000;
        assert!(debouncer.accept(start));
        assert!(!debouncer.accept(start.wrapping_add(9_999)));
        assert!(debouncer.accept(start.wrapping_add(10_000)));
    }

    #[test]
    fn test_reset() {
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        assert!(debouncer.accept(0));
        debouncer.reset();
        assert!(debouncer.accept(1));
    }
}
