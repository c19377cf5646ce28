//! Absolute time intervals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A range in time that may start and end on different dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl TimeRange {
    #[must_use]
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { from, to }
    }

    /// Whether `t` lies within the range, both ends inclusive.
    #[must_use]
    pub fn covers(&self, t: Timestamp) -> bool {
        self.from <= t && t <= self.to
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} - {}>", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}
