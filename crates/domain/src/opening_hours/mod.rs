//! Opening hours: the calendar rules that decide when the door is open.
//!
//! Rules come in three layers, evaluated per calendar date with the
//! precedence date-specific → holiday → regular:
//!
//! - **regular**: one ordered sequence of [`OpeningHour`]s per weekday
//! - **date-specific**: keyed by [`MonthDay`], replaces every other layer on
//!   that date, every year
//! - **holiday**: used instead of the regular layer on public holidays
//!
//! A [`RuleSet`] is built once through [`RuleSetBuilder`] and is immutable
//! afterwards. Building fails if any layer contains overlapping effective
//! intervals.

mod month_day;
mod opening_hour;
mod rule_set;

pub use month_day::MonthDay;
pub use opening_hour::OpeningHour;
pub use rule_set::{RuleLayer, RuleSet, RuleSetBuilder};

use chrono::Weekday;

use crate::error::ValidationError;

/// Parse a weekday name (`mon`, `Monday`, …).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidWeekday`] for unknown names.
pub fn parse_weekday(s: &str) -> Result<Weekday, ValidationError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| ValidationError::InvalidWeekday(s.to_string()))
}
