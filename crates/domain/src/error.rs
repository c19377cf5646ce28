//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`PortierError`]
//! via `#[from]` (or an explicit `into_domain`) when crossing a port boundary.

use crate::door::DoorCommand;
use crate::opening_hours::RuleLayer;

/// Boxed error coming from an adapter (MQTT client, holiday backend, …).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for portier.
#[derive(Debug, thiserror::Error)]
pub enum PortierError {
    /// A value or a rule set violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The door hardware (or its transport) rejected or dropped a command.
    #[error("door hardware error")]
    Hardware(#[source] BoxError),

    /// The holiday calendar could not answer.
    #[error("holiday lookup failed")]
    HolidayLookup(#[source] BoxError),

    /// The door scheduler refused or could not complete a request.
    #[error("door scheduler error")]
    Scheduler(#[from] SchedulerError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A time of day was not in `[0,24)×[0,60)` or not in `HH:MM` form.
    #[error("invalid time of day {0:?}")]
    InvalidDayTime(String),

    /// A range whose start is not strictly before its end.
    #[error("range start {from} is not before end {to}")]
    EmptyRange { from: String, to: String },

    /// A range that is not in `HH:MM - HH:MM` form.
    #[error("invalid time range {0:?}")]
    InvalidRange(String),

    /// A date-specific key that is not a valid `MM/DD`.
    #[error("invalid month/day {0:?}")]
    InvalidMonthDay(String),

    /// A weekday name that could not be parsed.
    #[error("invalid weekday {0:?}")]
    InvalidWeekday(String),

    /// A door state other than `locked` or `unlocked`.
    #[error("invalid door state {0:?}")]
    InvalidDoorState(String),

    /// A scheduler policy value that cannot work (zero interval, inverted budgets, …).
    #[error("invalid scheduler policy: {0}")]
    InvalidSchedulerPolicy(&'static str),

    /// Two effective intervals of the same rule layer overlap.
    #[error("overlapping opening hours {first} and {second} in {layer}")]
    OverlappingHours {
        layer: RuleLayer,
        first: String,
        second: String,
    },
}

/// Lifecycle and hand-off failures of the door scheduler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The scheduler has been stopped; the request was not observed.
    #[error("door scheduler stopped")]
    Stopped,

    /// `start` was called on a scheduler that already runs (or ran).
    #[error("door scheduler already started")]
    AlreadyStarted,

    /// The scheduling loop did not accept the request in time.
    #[error("door scheduler did not accept the request in time")]
    RequestTimedOut,

    /// A hardware command did not complete within its deadline.
    #[error("door command {command} timed out")]
    CommandTimedOut { command: DoorCommand },
}

impl PortierError {
    /// Wrap an adapter error as a hardware failure.
    pub fn hardware(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Hardware(Box::new(err))
    }

    /// Wrap an adapter error as a holiday lookup failure.
    pub fn holiday_lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::HolidayLookup(Box::new(err))
    }
}
