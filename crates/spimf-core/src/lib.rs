#![warn(missing_docs)]
//! # spimf-core
//!
//! ## Purpose
//! Defines the pure operating-window model used across the `spimf` workspace.
//!
//! ## Responsibilities
//! - Represent wall-clock [`TimeOfDay`] values and same-day [`TimeRange`]s.
//! - Hold the configured [`OperatingSchedule`].
//! - Evaluate availability: [`is_active`], [`next_activation`] and
//!   [`next_deactivation`].
//!
//! ## Data flow
//! Configuration parses `HH:MM` ranges into an [`OperatingSchedule`]. On every
//! startup check and UI tick, the app reads the current [`TimeOfDay`] and asks
//! the evaluator for the active state and the [`TimeLabel`]s to display.
//!
//! ## Ownership and lifetimes
//! All values are small owned `Copy` types or `Vec`s; evaluator functions only
//! borrow the schedule and never mutate or cache it, because wall-clock time
//! advances outside this crate.
//!
//! ## Error model
//! Malformed times and inverted ranges return [`CoreError`] variants.
//!
//! ## Example
//! ```rust
//! use spimf_core::{is_active, next_activation, OperatingSchedule, TimeLabel, TimeOfDay};
//!
//! let schedule = OperatingSchedule::parse_list("06:00-11:30,12:00-18:00").unwrap();
//! let now: TimeOfDay = "11:45".parse().unwrap();
//! assert!(!is_active(now, &schedule));
//! assert_eq!(next_activation(now, &schedule).to_string(), "12:00");
//! assert!(matches!(next_activation(now, &schedule), TimeLabel::Today(_)));
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minutes in one wall-clock day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock minute of day (`00:00` ..= `23:59`).
///
/// Ordering is numeric minute-of-day, which matches lexicographic ordering of
/// the zero-padded `HH:MM` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minute_of_day: u16,
}

impl TimeOfDay {
    /// Midnight.
    pub const MIDNIGHT: Self = Self { minute_of_day: 0 };

    /// Builds a validated time from hour and minute.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTime`] when `hour > 23` or `minute > 59`.
    pub fn new(hour: u8, minute: u8) -> Result<Self, CoreError> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }

        Ok(Self {
            minute_of_day: u16::from(hour) * 60 + u16::from(minute),
        })
    }

    /// Builds a time from minutes since midnight.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTime`] when `minute_of_day >= 1440`.
    pub fn from_minute_of_day(minute_of_day: u16) -> Result<Self, CoreError> {
        if minute_of_day >= MINUTES_PER_DAY {
            return Err(CoreError::InvalidTime(format!(
                "minute of day {minute_of_day} is out of range"
            )));
        }
        Ok(Self { minute_of_day })
    }

    /// Truncates a chrono time to minute precision.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        // NaiveTime hour/minute are always in range.
        Self {
            minute_of_day: (time.hour() * 60 + time.minute()) as u16,
        }
    }

    /// Reads the local wall clock.
    pub fn now_local() -> Self {
        Self::from_naive_time(Local::now().time())
    }

    /// Hour component.
    pub fn hour(self) -> u8 {
        (self.minute_of_day / 60) as u8
    }

    /// Minute component.
    pub fn minute(self) -> u8 {
        (self.minute_of_day % 60) as u8
    }

    /// Minutes since midnight.
    pub fn minute_of_day(self) -> u16 {
        self.minute_of_day
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    /// Parses strict zero-padded `HH:MM`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidTime(raw.to_string());
        let trimmed = raw.trim();
        let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;

        if hour.len() != 2
            || minute.len() != 2
            || !hour.bytes().all(|b| b.is_ascii_digit())
            || !minute.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Same-day wall-clock range, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: TimeOfDay,
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = CoreError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Builds a validated same-day range.
    ///
    /// # Errors
    /// Returns [`CoreError::InvertedRange`] when `start >= end`. Overnight
    /// ranges are not supported.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Range opening time.
    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    /// Range closing time.
    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Returns `true` when `now` lies within `[start, end]`.
    pub fn contains(&self, now: TimeOfDay) -> bool {
        self.start <= now && now <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeRange {
    type Err = CoreError;

    /// Parses the compact `HH:MM-HH:MM` form.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (start, end) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| CoreError::InvalidRange(raw.to_string()))?;
        Self::new(start.parse()?, end.parse()?)
    }
}

/// Ordered list of daily operating windows.
///
/// Ranges are expected in chronological order and are assumed not to
/// overlap; neither property is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatingSchedule {
    ranges: Vec<TimeRange>,
}

impl OperatingSchedule {
    /// Wraps ranges as given.
    pub fn new(ranges: Vec<TimeRange>) -> Self {
        Self { ranges }
    }

    /// Parses a comma separated list such as `06:00-11:30,12:00-18:00`.
    ///
    /// # Errors
    /// Returns the first [`CoreError`] hit while parsing a range. An empty or
    /// whitespace-only input yields an empty schedule.
    pub fn parse_list(raw: &str) -> Result<Self, CoreError> {
        let ranges = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<TimeRange>, _>>()?;
        Ok(Self { ranges })
    }

    /// Configured ranges in presentation order.
    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    /// Returns `true` when no window is configured.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl fmt::Display for OperatingSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, range) in self.ranges.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

/// Boundary label shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabel {
    /// Boundary later today.
    Today(TimeOfDay),
    /// No boundary remains today; first boundary tomorrow.
    Tomorrow(TimeOfDay),
    /// Boundary cannot be determined for the current state.
    Unknown,
}

impl TimeLabel {
    /// Time component, when known.
    pub fn time(&self) -> Option<TimeOfDay> {
        match self {
            Self::Today(time) | Self::Tomorrow(time) => Some(*time),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today(time) => write!(f, "{time}"),
            Self::Tomorrow(time) => write!(f, "tomorrow {time}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// First range containing `now`, in schedule order.
pub fn active_range(now: TimeOfDay, schedule: &OperatingSchedule) -> Option<&TimeRange> {
    schedule.ranges.iter().find(|range| range.contains(now))
}

/// Returns `true` when `now` falls inside any configured window.
///
/// Both boundary minutes count as active.
pub fn is_active(now: TimeOfDay, schedule: &OperatingSchedule) -> bool {
    active_range(now, schedule).is_some()
}

/// Start of the next window opening strictly after `now`.
///
/// Falls back to tomorrow's first window when none remains today, and to
/// [`TimeLabel::Unknown`] for an empty schedule.
pub fn next_activation(now: TimeOfDay, schedule: &OperatingSchedule) -> TimeLabel {
    if let Some(range) = schedule.ranges.iter().find(|range| range.start > now) {
        return TimeLabel::Today(range.start);
    }

    schedule
        .ranges
        .first()
        .map_or(TimeLabel::Unknown, |range| TimeLabel::Tomorrow(range.start))
}

/// End of the window containing `now`, or [`TimeLabel::Unknown`] when `now`
/// is outside every window.
pub fn next_deactivation(now: TimeOfDay, schedule: &OperatingSchedule) -> TimeLabel {
    active_range(now, schedule).map_or(TimeLabel::Unknown, |range| TimeLabel::Today(range.end))
}

/// Error type for time parsing and schedule validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Value is not a zero-padded `HH:MM` wall-clock time.
    #[error("invalid time of day: {0:?}")]
    InvalidTime(String),
    /// Value is not an `HH:MM-HH:MM` range.
    #[error("invalid time range: {0:?}")]
    InvalidRange(String),
    /// Range start is not strictly before its end.
    #[error("time range {start}-{end} must start before it ends")]
    InvertedRange {
        /// Rendered start time.
        start: String,
        /// Rendered end time.
        end: String,
    },
}

#[cfg(test)]
mod tests {
    //! Unit tests for parsing and boundary evaluation.

    use super::*;

    fn at(raw: &str) -> TimeOfDay {
        raw.parse().expect("fixture time should parse")
    }

    #[test]
    fn parses_only_zero_padded_times() {
        assert_eq!(at("06:05").minute_of_day(), 365);
        assert_eq!(at("23:59").to_string(), "23:59");
        assert!("6:05".parse::<TimeOfDay>().is_err());
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("1200".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn rejects_inverted_and_empty_ranges() {
        assert!("18:00-06:00".parse::<TimeRange>().is_err());
        assert!("12:00-12:00".parse::<TimeRange>().is_err());
        assert!("06:00-11:30".parse::<TimeRange>().is_ok());
    }

    #[test]
    fn boundaries_are_inclusive() {
        let schedule = OperatingSchedule::parse_list("06:00-11:30").unwrap();
        assert!(is_active(at("06:00"), &schedule));
        assert!(is_active(at("11:30"), &schedule));
        assert!(!is_active(at("05:59"), &schedule));
        assert!(!is_active(at("11:31"), &schedule));
    }

    #[test]
    fn next_activation_rolls_over_to_tomorrow() {
        let schedule = OperatingSchedule::parse_list("06:00-11:30,12:00-18:00").unwrap();
        assert_eq!(
            next_activation(at("18:00"), &schedule),
            TimeLabel::Tomorrow(at("06:00"))
        );
        assert_eq!(next_activation(at("05:00"), &schedule), TimeLabel::Today(at("06:00")));
        assert_eq!(next_activation(at("06:00"), &schedule), TimeLabel::Today(at("12:00")));
    }

    #[test]
    fn deactivation_is_unknown_outside_windows() {
        let schedule = OperatingSchedule::parse_list("06:00-11:30").unwrap();
        assert_eq!(next_deactivation(at("12:00"), &schedule), TimeLabel::Unknown);
        assert_eq!(next_deactivation(at("07:00"), &schedule).to_string(), "11:30");
    }

    #[test]
    fn empty_schedule_is_never_active() {
        let schedule = OperatingSchedule::default();
        assert!(!is_active(at("12:00"), &schedule));
        assert_eq!(next_activation(at("12:00"), &schedule), TimeLabel::Unknown);
    }

    #[test]
    fn inverted_list_entry_reports_both_ends() {
        assert_eq!(
            OperatingSchedule::parse_list("06:00-11:30, 18:00-08:00"),
            Err(CoreError::InvertedRange {
                start: "18:00".to_string(),
                end: "08:00".to_string(),
            })
        );
        assert_eq!(
            TimeOfDay::new(24, 0),
            Err(CoreError::InvalidTime("24:00".to_string()))
        );
    }

    #[test]
    fn schedule_json_uses_hh_mm_strings() {
        let schedule: OperatingSchedule =
            serde_json::from_str(r#"[{"start":"06:00","end":"11:30"}]"#).unwrap();
        assert_eq!(schedule.to_string(), "06:00-11:30");
        assert!(
            serde_json::from_str::<OperatingSchedule>(r#"[{"start":"11:30","end":"06:00"}]"#)
                .is_err()
        );
    }
}
