//! The three rule layers and their construction-time validation.

use std::collections::HashMap;
use std::fmt;

use chrono::Weekday;

use super::{MonthDay, OpeningHour};
use crate::error::ValidationError;

/// Names one rule layer (and, where relevant, which sequence of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleLayer {
    Regular(Weekday),
    DateSpecific(MonthDay),
    Holiday,
}

impl fmt::Display for RuleLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular(weekday) => write!(f, "regular layer ({weekday})"),
            Self::DateSpecific(md) => write!(f, "date-specific layer ({md})"),
            Self::Holiday => f.write_str("holiday layer"),
        }
    }
}

/// Immutable, validated opening-hour rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    regular: HashMap<Weekday, Vec<OpeningHour>>,
    date_specific: HashMap<MonthDay, Vec<OpeningHour>>,
    holiday: Vec<OpeningHour>,
}

impl RuleSet {
    /// Create a builder for constructing a [`RuleSet`].
    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Regular opening hours of `weekday`, sorted by start.
    #[must_use]
    pub fn regular(&self, weekday: Weekday) -> &[OpeningHour] {
        self.regular.get(&weekday).map(Vec::as_slice).unwrap_or_default()
    }

    /// Date-specific opening hours, if any are configured for `day`.
    ///
    /// An entry that is present but empty still overrides the other layers
    /// (the door stays closed that day).
    #[must_use]
    pub fn date_specific(&self, day: MonthDay) -> Option<&[OpeningHour]> {
        self.date_specific.get(&day).map(Vec::as_slice)
    }

    /// Opening hours used on holidays, sorted by start.
    #[must_use]
    pub fn holiday(&self) -> &[OpeningHour] {
        &self.holiday
    }

    /// Whether the rule set can never produce an opening interval.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regular.values().all(Vec::is_empty)
            && self.date_specific.values().all(Vec::is_empty)
            && self.holiday.is_empty()
    }
}

/// Collects opening hours per layer; [`build`](Self::build) sorts and validates.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    regular: HashMap<Weekday, Vec<OpeningHour>>,
    date_specific: HashMap<MonthDay, Vec<OpeningHour>>,
    holiday: Vec<OpeningHour>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn regular(mut self, weekday: Weekday, hour: OpeningHour) -> Self {
        self.add_regular(weekday, hour);
        self
    }

    #[must_use]
    pub fn date_specific(mut self, day: MonthDay, hour: OpeningHour) -> Self {
        self.add_date_specific(day, hour);
        self
    }

    #[must_use]
    pub fn holiday(mut self, hour: OpeningHour) -> Self {
        self.add_holiday(hour);
        self
    }

    pub fn add_regular(&mut self, weekday: Weekday, hour: OpeningHour) {
        self.regular.entry(weekday).or_default().push(hour);
    }

    pub fn add_date_specific(&mut self, day: MonthDay, hour: OpeningHour) {
        self.date_specific.entry(day).or_default().push(hour);
    }

    /// Mark `day` as date-specific without adding hours (closed all day).
    pub fn close_on(&mut self, day: MonthDay) {
        self.date_specific.entry(day).or_default();
    }

    pub fn add_holiday(&mut self, hour: OpeningHour) {
        self.holiday.push(hour);
    }

    /// Sort every layer by start time and reject overlaps.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OverlappingHours`] naming the first layer
    /// in which two effective intervals touch or overlap.
    pub fn build(self) -> Result<RuleSet, ValidationError> {
        let Self {
            mut regular,
            mut date_specific,
            mut holiday,
        } = self;

        for (weekday, hours) in &mut regular {
            sort_and_validate(RuleLayer::Regular(*weekday), hours)?;
        }
        for (day, hours) in &mut date_specific {
            sort_and_validate(RuleLayer::DateSpecific(*day), hours)?;
        }
        sort_and_validate(RuleLayer::Holiday, &mut holiday)?;

        Ok(RuleSet {
            regular,
            date_specific,
            holiday,
        })
    }
}

/// Sort by `from` and check that each effective interval ends strictly
/// before the next one starts.
fn sort_and_validate(layer: RuleLayer, hours: &mut [OpeningHour]) -> Result<(), ValidationError> {
    hours.sort_by_key(|hour| hour.range.from());

    for pair in hours.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.effective_close() >= next.effective_open() {
            return Err(ValidationError::OverlappingHours {
                layer,
                first: current.to_string(),
                second: next.to_string(),
            });
        }
    }
    Ok(())
}
