//! Holiday calendar backed by configured dates.

use std::collections::HashSet;

use chrono::NaiveDate;

use portier_app::ports::HolidayProvider;
use portier_domain::error::PortierError;
use portier_domain::opening_hours::MonthDay;

use crate::error::CalendarError;

/// Holidays of a single country: one-off dates plus dates that recur every
/// year.
#[derive(Debug, Clone)]
pub struct StaticHolidayCalendar {
    country: String,
    fixed: HashSet<NaiveDate>,
    recurring: HashSet<MonthDay>,
}

impl StaticHolidayCalendar {
    /// An empty calendar for `country` (ISO 3166 alpha-2, case-insensitive).
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            fixed: HashSet::new(),
            recurring: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_fixed(mut self, date: NaiveDate) -> Self {
        self.add_fixed(date);
        self
    }

    #[must_use]
    pub fn with_recurring(mut self, day: MonthDay) -> Self {
        self.add_recurring(day);
        self
    }

    pub fn add_fixed(&mut self, date: NaiveDate) {
        self.fixed.insert(date);
    }

    pub fn add_recurring(&mut self, day: MonthDay) {
        self.recurring.insert(day);
    }

    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Number of configured holidays (fixed and recurring).
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixed.len() + self.recurring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HolidayProvider for StaticHolidayCalendar {
    fn is_holiday(&self, country: &str, date: NaiveDate) -> Result<bool, PortierError> {
        if !self.country.eq_ignore_ascii_case(country) {
            return Err(CalendarError::UnknownCountry(country.to_string()).into_domain());
        }
        Ok(self.fixed.contains(&date) || self.recurring.contains(&MonthDay::of(date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> StaticHolidayCalendar {
        StaticHolidayCalendar::new("AT")
            .with_fixed(date(2026, 4, 6))
            .with_recurring(MonthDay::new(12, 25).unwrap())
    }

    #[test]
    fn should_match_fixed_dates_only_in_their_year() {
        let calendar = calendar();
        assert!(calendar.is_holiday("AT", date(2026, 4, 6)).unwrap());
        assert!(!calendar.is_holiday("AT", date(2027, 4, 6)).unwrap());
    }

    #[test]
    fn should_match_recurring_dates_every_year() {
        let calendar = calendar();
        assert!(calendar.is_holiday("AT", date(2025, 12, 25)).unwrap());
        assert!(calendar.is_holiday("at", date(2031, 12, 25)).unwrap());
        assert!(!calendar.is_holiday("AT", date(2031, 12, 26)).unwrap());
    }

    #[test]
    fn should_fail_for_other_countries() {
        let result = calendar().is_holiday("DE", date(2025, 12, 25));
        assert!(matches!(result, Err(PortierError::HolidayLookup(_))));
    }

    #[test]
    fn should_count_configured_holidays() {
        assert_eq!(calendar().len(), 2);
        assert!(StaticHolidayCalendar::new("AT").is_empty());
    }
}
