//! A single configured opening interval with its door thresholds.

use std::fmt;

use chrono::{NaiveDate, TimeDelta};
use chrono_tz::Tz;

use crate::daytime::DayTimeRange;
use crate::time_range::TimeRange;

/// One configured `from - to` interval.
///
/// The door unlocks `open_before` ahead of `from` and locks `close_after`
/// past `to`; that widened interval is the *effective* interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHour {
    pub range: DayTimeRange,
    pub open_before: TimeDelta,
    pub close_after: TimeDelta,
    pub applies_to_holidays: bool,
}

impl OpeningHour {
    /// An interval with no thresholds that does not apply to holidays.
    #[must_use]
    pub fn new(range: DayTimeRange) -> Self {
        Self {
            range,
            open_before: TimeDelta::zero(),
            close_after: TimeDelta::zero(),
            applies_to_holidays: false,
        }
    }

    /// Set the unlock lead time. Negative values are clamped to zero.
    #[must_use]
    pub fn open_before(mut self, threshold: TimeDelta) -> Self {
        self.open_before = threshold.max(TimeDelta::zero());
        self
    }

    /// Set the lock delay. Negative values are clamped to zero.
    #[must_use]
    pub fn close_after(mut self, threshold: TimeDelta) -> Self {
        self.close_after = threshold.max(TimeDelta::zero());
        self
    }

    #[must_use]
    pub fn applies_to_holidays(mut self, applies: bool) -> Self {
        self.applies_to_holidays = applies;
        self
    }

    /// Effective start in minutes relative to the day's midnight (may be negative).
    #[must_use]
    pub fn effective_open(&self) -> i64 {
        i64::from(self.range.from().as_minutes()) - self.open_before.num_minutes()
    }

    /// Effective end in minutes relative to the day's midnight (may exceed a day).
    #[must_use]
    pub fn effective_close(&self) -> i64 {
        i64::from(self.range.to().as_minutes()) + self.close_after.num_minutes()
    }

    /// The effective interval on `date` in `tz`.
    #[must_use]
    pub fn effective_at(&self, date: NaiveDate, tz: Tz) -> TimeRange {
        let range = self.range.at(date, tz);
        TimeRange::new(range.from - self.open_before, range.to + self.close_after)
    }
}

impl fmt::Display for OpeningHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.range)
    }
}
