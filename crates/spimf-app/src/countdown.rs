//! Cancellable countdown shared by every request.
//!
//! One [`Countdown`] carries both the tick stream shown to the user and the
//! hard deadline of the call it decorates. Tick instants are scheduled from
//! the start instant, not from wake-up times, so remaining values are exact
//! and strictly decreasing.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

const MIN_GRANULARITY: Duration = Duration::from_millis(1);

/// One countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Time left before the deadline.
    pub remaining: Duration,
}

impl CountdownTick {
    /// Remaining time rounded up to whole seconds for display.
    pub fn remaining_secs(&self) -> u64 {
        let millis = self.remaining.as_millis();
        u64::try_from(millis.div_ceil(1_000)).unwrap_or(u64::MAX)
    }

    /// Returns `true` for the tick emitted at the deadline.
    pub fn is_deadline(&self) -> bool {
        self.remaining.is_zero()
    }
}

/// Tick stream ending at a deadline.
#[derive(Debug)]
pub struct Countdown {
    deadline: Instant,
    granularity: Duration,
    next_tick: Instant,
    finished: bool,
}

impl Countdown {
    /// Starts a countdown of `total`, ticking every `granularity`.
    ///
    /// The first tick is due immediately and carries the full `total`; the
    /// last tick is due at the deadline and carries zero.
    pub fn start(total: Duration, granularity: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now + total,
            granularity: granularity.max(MIN_GRANULARITY),
            next_tick: now,
            finished: false,
        }
    }

    /// Absolute deadline.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the next tick; `None` once the deadline tick was delivered.
    ///
    /// Cancel safe: dropping the returned future before it completes leaves
    /// the schedule untouched.
    pub async fn tick(&mut self) -> Option<CountdownTick> {
        if self.finished {
            return None;
        }

        sleep_until(self.next_tick).await;

        let remaining = self.deadline.saturating_duration_since(self.next_tick);
        if remaining.is_zero() {
            self.finished = true;
        } else {
            self.next_tick = (self.next_tick + self.granularity).min(self.deadline);
        }

        Some(CountdownTick { remaining })
    }
}
