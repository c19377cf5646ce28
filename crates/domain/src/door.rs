//! Door states, hardware commands and manual overwrites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;

/// The state the entry door should be in.
///
/// There is deliberately no "unknown" variant: anything that is not
/// `locked` or `unlocked` fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Locked,
    Unlocked,
}

impl DoorState {
    /// The hardware command that drives the door into this state.
    #[must_use]
    pub fn command(self) -> DoorCommand {
        match self {
            Self::Locked => DoorCommand::Lock,
            Self::Unlocked => DoorCommand::Unlock,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => f.write_str("locked"),
            Self::Unlocked => f.write_str("unlocked"),
        }
    }
}

impl FromStr for DoorState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            other => Err(ValidationError::InvalidDoorState(other.to_string())),
        }
    }
}

/// A command sent to the door hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorCommand {
    Lock,
    Unlock,
    /// Momentarily release the latch (buzzer).
    Open,
}

impl fmt::Display for DoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lock => f.write_str("lock"),
            Self::Unlock => f.write_str("unlock"),
            Self::Open => f.write_str("open"),
        }
    }
}

/// A manual overwrite of the scheduled door state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOverwrite {
    pub state: DoorState,
    pub until: Timestamp,
    /// Identity of whoever issued the overwrite.
    pub issued_by: String,
}

impl StateOverwrite {
    /// Whether the overwrite still governs the door at `at`.
    #[must_use]
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        self.until > at
    }
}

/// A desired door state together with how long it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedState {
    pub state: DoorState,
    /// `None` means "no known schedule": locked indefinitely.
    pub valid_until: Option<Timestamp>,
}

impl ResolvedState {
    /// Locked with no known end.
    #[must_use]
    pub fn locked_indefinitely() -> Self {
        Self {
            state: DoorState::Locked,
            valid_until: None,
        }
    }
}

/// Read-only snapshot of what the door scheduler currently wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStatus {
    pub state: DoorState,
    pub valid_until: Option<Timestamp>,
    pub reset_in_progress: bool,
    /// The overwrite that produced `state`, if one is active.
    pub overwrite: Option<StateOverwrite>,
}
