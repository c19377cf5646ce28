//! Holiday calendar port.

use chrono::NaiveDate;

use portier_domain::error::PortierError;

/// Answers whether a calendar date is a public holiday in a country.
///
/// Lookups are synchronous: the resolver evaluates rules as a pure function
/// of time, so implementations are expected to answer from memory (a static
/// calendar, or a cache refreshed elsewhere).
pub trait HolidayProvider: Send + Sync {
    /// Whether `date` is a holiday in `country` (ISO 3166 alpha-2 code).
    ///
    /// # Errors
    ///
    /// Returns [`PortierError::HolidayLookup`] if the calendar cannot answer.
    fn is_holiday(&self, country: &str, date: NaiveDate) -> Result<bool, PortierError>;
}

impl<T: HolidayProvider> HolidayProvider for std::sync::Arc<T> {
    fn is_holiday(&self, country: &str, date: NaiveDate) -> Result<bool, PortierError> {
        (**self).is_holiday(country, date)
    }
}

/// A calendar without any holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayProvider for NoHolidays {
    fn is_holiday(&self, _country: &str, _date: NaiveDate) -> Result<bool, PortierError> {
        Ok(false)
    }
}
