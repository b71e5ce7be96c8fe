#![warn(missing_docs)]
//! # spimf-benchmarks
//!
//! Deterministic workloads shared by the smoke benchmarks in `tests/`.

use spimf_core::{
    MINUTES_PER_DAY, OperatingSchedule, TimeLabel, TimeOfDay, is_active, next_activation,
    next_deactivation,
};

/// Totals from one sweep over every minute of a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySweep {
    /// Minutes inside some window.
    pub active_minutes: u32,
    /// Minutes whose next activation falls tomorrow.
    pub tomorrow_labels: u32,
    /// Minutes with no determinable boundary.
    pub unknown_labels: u32,
}

/// Evaluates every minute of one day against `schedule`.
pub fn sweep_day(schedule: &OperatingSchedule) -> DaySweep {
    let mut sweep = DaySweep::default();
    for minute in 0..MINUTES_PER_DAY {
        let Ok(now) = TimeOfDay::from_minute_of_day(minute) else {
            continue;
        };
        let label = if is_active(now, schedule) {
            sweep.active_minutes += 1;
            next_deactivation(now, schedule)
        } else {
            next_activation(now, schedule)
        };
        match label {
            TimeLabel::Tomorrow(_) => sweep.tomorrow_labels += 1,
            TimeLabel::Unknown => sweep.unknown_labels += 1,
            TimeLabel::Today(_) => {}
        }
    }
    sweep
}
