//! Door scheduler policy.

use std::time::Duration;

use portier_domain::door::DoorState;
use portier_domain::error::ValidationError;

/// Timing and retry policy of the [`DoorScheduler`](super::DoorScheduler).
///
/// The defaults were tuned against a single installation; every value is
/// meant to be overridden from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Wake up at least this often to re-send the desired state.
    pub resend_interval: Duration,
    /// How far ahead to sleep when the schedule has no known end.
    pub fallback_horizon: Duration,
    /// Command budget while the door should be locked.
    pub max_tries_locked: u32,
    /// Command budget while the door should be unlocked.
    pub max_tries_unlocked: u32,
    /// Deadline of a single `lock`/`unlock`/`open` call.
    pub command_timeout: Duration,
    /// Pause between the steps of a hard reset.
    pub reset_settle_delay: Duration,
    /// Deadline of each call during a hard reset.
    pub reset_command_timeout: Duration,
    /// How long a request may wait to be accepted by the loop.
    pub request_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            resend_interval: Duration::from_secs(60),
            fallback_horizon: Duration::from_secs(5 * 60),
            max_tries_locked: 60,
            max_tries_unlocked: 20,
            command_timeout: Duration::from_secs(1),
            reset_settle_delay: Duration::from_secs(2),
            reset_command_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl SchedulerConfig {
    /// The command budget for driving the door into `state`.
    #[must_use]
    pub fn max_tries(&self, state: DoorState) -> u32 {
        match state {
            DoorState::Locked => self.max_tries_locked,
            DoorState::Unlocked => self.max_tries_unlocked,
        }
    }

    /// Check the policy can drive a door.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSchedulerPolicy`] when:
    /// - `resend_interval` or `fallback_horizon` is zero (busy loop)
    /// - `max_tries_unlocked` exceeds `max_tries_locked` (locking must be
    ///   retried at least as hard as unlocking)
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resend_interval.is_zero() {
            return Err(ValidationError::InvalidSchedulerPolicy(
                "resend interval must be non-zero",
            ));
        }
        if self.fallback_horizon.is_zero() {
            return Err(ValidationError::InvalidSchedulerPolicy(
                "fallback horizon must be non-zero",
            ));
        }
        if self.max_tries_unlocked > self.max_tries_locked {
            return Err(ValidationError::InvalidSchedulerPolicy(
                "unlocked retry budget must not exceed the locked one",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.resend_interval, Duration::from_secs(60));
        assert_eq!(config.fallback_horizon, Duration::from_secs(300));
        assert_eq!(config.max_tries(DoorState::Locked), 60);
        assert_eq!(config.max_tries(DoorState::Unlocked), 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_resend_interval() {
        let config = SchedulerConfig {
            resend_interval: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_fallback_horizon() {
        let config = SchedulerConfig {
            fallback_horizon: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_unlock_budget_above_lock_budget() {
        let config = SchedulerConfig {
            max_tries_locked: 5,
            max_tries_unlocked: 6,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidSchedulerPolicy(_))
        ));
    }
}
