//! Opening-hours resolver. Turns the rule layers into absolute intervals.
//!
//! For every local calendar date the resolver picks exactly one rule layer
//! (date-specific → holiday → regular) and widens its opening hours by their
//! thresholds. Walking forward day by day yields the effective intervals that
//! cover or follow an instant, which in turn decide the door state.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use portier_domain::door::{DoorState, ResolvedState};
use portier_domain::opening_hours::{MonthDay, OpeningHour, RuleLayer, RuleSet};
use portier_domain::time::{Timestamp, local_date, midnight};
use portier_domain::time_range::TimeRange;

use crate::ports::HolidayProvider;

/// Upper bound of the forward walk, so sparse rule sets (a single
/// date-specific day, holidays only) still terminate.
const MAX_LOOKAHEAD_DAYS: usize = 400;

/// Resolves opening hours for instants in a fixed time zone.
///
/// Built once per configuration load and never mutated; a reload builds a
/// new resolver.
pub struct OpeningHoursResolver<H> {
    rules: RuleSet,
    location: Tz,
    country: String,
    holidays: H,
}

impl<H: HolidayProvider> OpeningHoursResolver<H> {
    /// Create a resolver over a validated rule set.
    pub fn new(rules: RuleSet, location: Tz, country: impl Into<String>, holidays: H) -> Self {
        Self {
            rules,
            location,
            country: country.into(),
            holidays,
        }
    }

    /// The time zone all rules are interpreted in.
    #[must_use]
    pub fn location(&self) -> Tz {
        self.location
    }

    /// The country passed to the holiday provider.
    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Select the rule layer that governs `date`.
    ///
    /// A failing holiday lookup is logged and the date treated as a
    /// regular day.
    pub fn layer_for(&self, date: NaiveDate) -> (RuleLayer, &[OpeningHour]) {
        let day = MonthDay::of(date);
        if let Some(hours) = self.rules.date_specific(day) {
            return (RuleLayer::DateSpecific(day), hours);
        }

        match self.holidays.is_holiday(&self.country, date) {
            Ok(true) => return (RuleLayer::Holiday, self.rules.holiday()),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(
                    %date,
                    country = %self.country,
                    error = ?err,
                    "holiday lookup failed, treating date as a regular day"
                );
            }
        }

        let weekday = date.weekday();
        (RuleLayer::Regular(weekday), self.rules.regular(weekday))
    }

    /// Effective intervals of a single local date, in start order.
    pub fn opening_hours_on(&self, date: NaiveDate) -> Vec<TimeRange> {
        let (_, hours) = self.layer_for(date);
        hours
            .iter()
            .map(|hour| hour.effective_at(date, self.location))
            .collect()
    }

    /// Up to `count` effective intervals, in start order, beginning with the
    /// one that covers `at` (if any) or else the next one after `at`.
    ///
    /// Returns an empty vector when the rule set is empty; callers treat that
    /// as "always locked".
    pub fn upcoming_intervals(&self, at: Timestamp, count: usize) -> Vec<TimeRange> {
        self.collect_intervals(at, count, MAX_LOOKAHEAD_DAYS)
    }

    /// The door state the schedule asks for at `at`.
    ///
    /// - inside an interval: unlocked until the interval ends
    /// - before an interval starting on the same local day: locked until it starts
    /// - otherwise: locked with no known end (`valid_until == None`)
    pub fn state_for(&self, at: Timestamp) -> ResolvedState {
        // yesterday (thresholds past midnight), today and tomorrow (thresholds
        // before midnight) are enough to know today's schedule
        let Some(interval) = self.collect_intervals(at, 1, 3).into_iter().next() else {
            return ResolvedState::locked_indefinitely();
        };

        if interval.covers(at) {
            return ResolvedState {
                state: DoorState::Unlocked,
                valid_until: Some(interval.to),
            };
        }

        let end_of_day = local_date(at, self.location)
            .succ_opt()
            .map(|tomorrow| midnight(tomorrow, self.location));
        if end_of_day.is_some_and(|end| interval.from >= end) {
            return ResolvedState::locked_indefinitely();
        }

        ResolvedState {
            state: DoorState::Locked,
            valid_until: Some(interval.from),
        }
    }

    /// Whether the door is scheduled to be unlocked at `at`.
    pub fn is_open(&self, at: Timestamp) -> bool {
        self.state_for(at).state == DoorState::Unlocked
    }

    fn collect_intervals(&self, at: Timestamp, count: usize, days: usize) -> Vec<TimeRange> {
        if count == 0 || self.rules.is_empty() {
            return Vec::new();
        }

        let today = local_date(at, self.location);
        let start = today.pred_opt().unwrap_or(today);

        let mut intervals = Vec::new();
        // once enough intervals are found, look at one more day in case its
        // thresholds reach back before the ones already collected
        let mut extra_days = 1;
        for date in start.iter_days().take(days) {
            intervals.extend(
                self.opening_hours_on(date)
                    .into_iter()
                    .filter(|interval| interval.to >= at),
            );
            if intervals.len() >= count {
                if extra_days == 0 {
                    break;
                }
                extra_days -= 1;
            }
        }

        intervals.sort_by_key(|interval| interval.from);
        intervals.truncate(count);
        intervals
    }
}
