//! Minute-resolution times of day and same-day ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{Timestamp, resolve_local};
use crate::time_range::TimeRange;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A `HH:MM` time during the day.
///
/// Ordering is total and follows [`as_minutes`](Self::as_minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayTime {
    hour: u8,
    minute: u8,
}

impl DayTime {
    /// Midnight, `00:00`.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Create a day time, validating `hour < 24` and `minute < 60`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDayTime`] when out of range.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidDayTime(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Build a day time from minutes since midnight.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDayTime`] for values of a day or more.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_minutes(minutes: u16) -> Result<Self, ValidationError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(ValidationError::InvalidDayTime(minutes.to_string()));
        }
        Ok(Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        })
    }

    #[must_use]
    pub fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    #[must_use]
    pub fn as_minutes(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Offset from midnight as a duration.
    #[must_use]
    pub fn as_duration(self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.as_minutes()))
    }

    /// The instant this day time denotes on `date` in `tz`.
    #[must_use]
    pub fn at(self, date: NaiveDate, tz: Tz) -> Timestamp {
        resolve_local(date.and_time(NaiveTime::MIN) + self.as_duration(), tz)
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for DayTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidDayTime(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let parse = |part: &str| -> Result<u8, ValidationError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            // tolerate any amount of leading zeros
            let trimmed = part.trim_start_matches('0');
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed.parse().map_err(|_| invalid())
        };

        Self::new(parse(hour)?, parse(minute)?).map_err(|_| invalid())
    }
}

impl TryFrom<String> for DayTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayTime> for String {
    fn from(value: DayTime) -> Self {
        value.to_string()
    }
}

/// A `from - to` range within a single day (`from < to`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayTimeRange {
    from: DayTime,
    to: DayTime,
}

impl DayTimeRange {
    /// Create a range, rejecting overnight or empty spans.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRange`] when `from >= to`.
    pub fn new(from: DayTime, to: DayTime) -> Result<Self, ValidationError> {
        if from >= to {
            return Err(ValidationError::EmptyRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    #[must_use]
    pub fn from(self) -> DayTime {
        self.from
    }

    #[must_use]
    pub fn to(self) -> DayTime {
        self.to
    }

    /// The absolute range this denotes on `date` in `tz`.
    #[must_use]
    pub fn at(self, date: NaiveDate, tz: Tz) -> TimeRange {
        TimeRange::new(self.from.at(date, tz), self.to.at(date, tz))
    }
}

impl fmt::Display for DayTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.from, self.to)
    }
}

impl FromStr for DayTimeRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| ValidationError::InvalidRange(s.to_string()))?;
        if to.contains('-') {
            return Err(ValidationError::InvalidRange(s.to_string()));
        }
        Self::new(from.trim().parse()?, to.trim().parse()?)
    }
}

impl TryFrom<String> for DayTimeRange {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayTimeRange> for String {
    fn from(value: DayTimeRange) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn dt(s: &str) -> DayTime {
        s.parse().unwrap()
    }

    #[test]
    fn should_parse_padded_and_unpadded_times() {
        assert_eq!(dt("08:05"), DayTime::new(8, 5).unwrap());
        assert_eq!(dt("8:5"), DayTime::new(8, 5).unwrap());
        assert_eq!(dt("00:00"), DayTime::MIDNIGHT);
        assert_eq!(dt("23:59").as_minutes(), 1439);
    }

    #[test]
    fn should_reject_out_of_range_values() {
        assert!("24:00".parse::<DayTime>().is_err());
        assert!("12:60".parse::<DayTime>().is_err());
        assert!(DayTime::new(24, 0).is_err());
        assert!(DayTime::from_minutes(1440).is_err());
    }

    #[test]
    fn should_reject_malformed_times() {
        for input in ["1200", "12:", ":30", "12:30:00", "ab:cd", "-1:00", "+1:00", ""] {
            assert!(input.parse::<DayTime>().is_err(), "{input:?} parsed");
        }
    }

    #[test]
    fn should_order_by_minutes() {
        assert!(dt("07:59") < dt("08:00"));
        assert!(dt("10:00") > dt("09:59"));
        assert_eq!(DayTime::from_minutes(485).unwrap(), dt("08:05"));
    }

    #[test]
    fn should_display_zero_padded() {
        assert_eq!(DayTime::new(7, 3).unwrap().to_string(), "07:03");
    }

    #[test]
    fn should_place_day_time_on_date_in_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let t = dt("08:00").at(date, chrono_tz::Europe::Vienna);
        // CEST is UTC+2 in July.
        assert_eq!((t.hour(), t.minute()), (6, 0));
    }

    #[test]
    fn should_parse_range() {
        let range: DayTimeRange = "08:00 - 12:30".parse().unwrap();
        assert_eq!(range.from(), dt("08:00"));
        assert_eq!(range.to(), dt("12:30"));
        let compact: DayTimeRange = "8:00-12:30".parse().unwrap();
        assert_eq!(range, compact);
    }

    #[test]
    fn should_reject_inverted_or_empty_ranges() {
        assert!(matches!(
            "12:00 - 08:00".parse::<DayTimeRange>(),
            Err(ValidationError::EmptyRange { .. })
        ));
        assert!("08:00 - 08:00".parse::<DayTimeRange>().is_err());
        assert!("08:00".parse::<DayTimeRange>().is_err());
        assert!("08:00 - 09:00 - 10:00".parse::<DayTimeRange>().is_err());
    }

    #[test]
    fn should_roundtrip_range_through_serde() {
        let range: DayTimeRange = "14:00 - 18:00".parse().unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"14:00 - 18:00\"");
        let back: DayTimeRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
    }
}
