//! Monotonic microsecond clocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::{Microseconds, Time};

/// A monotonic microsecond counter.
pub trait Clock {
    fn now_micros(&self) -> Microseconds;
}

/// Microseconds elapsed from `since` to `now`, correct across a counter wrap.
pub fn elapsed_micros(since: Microseconds, now: Microseconds) -> Microseconds {
    now.wrapping_sub(since)
}

/// Seconds elapsed from `epoch` to `now`.
pub fn elapsed_seconds(epoch: Microseconds, now: Microseconds) -> Time {
    elapsed_micros(epoch, now) as f64 / 1_000_000.0
}

/// Convert a duration into clock ticks, saturating at the counter range.
pub fn duration_micros(duration: Duration) -> Microseconds {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Clock backed by the host's monotonic `Instant`, counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_micros(&self) -> Microseconds {
        duration_micros(self.start.elapsed())
    }
}

/// A clock that only moves when told to. Clones share the same counter, so one handle
/// can drive a clock owned by another thread.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Microseconds) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Microseconds) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advance the counter, wrapping like a hardware timer.
    pub fn advance(&self, micros: Microseconds) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.wrapping_add(micros))
            });
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> Microseconds {
        self.now.load(Ordering::SeqCst)
    }
}
