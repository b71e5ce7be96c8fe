//! Wall-clock sources for the controller.

use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};

use chrono::Utc;
use spimf_core::TimeOfDay;

/// Time source read on every startup check and tick.
pub trait Clock: Send + Sync {
    /// Unix epoch milliseconds, used for notice expiry and loading elapsed time.
    fn now_ms(&self) -> u64;

    /// Local wall-clock time of day, used by the operating-window evaluator.
    fn time_of_day(&self) -> TimeOfDay;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }

    fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::now_local()
    }
}

/// Deterministic clock for tests and demos.
///
/// Epoch milliseconds and time of day are set independently.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicU64,
    minute_of_day: AtomicU16,
}

impl ManualClock {
    /// Creates a clock frozen at `time` and `now_ms`.
    pub fn new(time: TimeOfDay, now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
            minute_of_day: AtomicU16::new(time.minute_of_day()),
        }
    }

    /// Moves the wall-clock time of day.
    pub fn set_time(&self, time: TimeOfDay) {
        self.minute_of_day
            .store(time.minute_of_day(), Ordering::SeqCst);
    }

    /// Advances epoch milliseconds.
    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_minute_of_day(self.minute_of_day.load(Ordering::SeqCst))
            .unwrap_or(TimeOfDay::MIDNIGHT)
    }
}
