//! Clock port.

use portier_domain::time::{self, Timestamp};

/// Source of the current time for the door scheduler.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        time::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_follow_wall_clock() {
        let before = time::now();
        let now = SystemClock.now();
        assert!(now >= before);
        assert!(now <= time::now());
    }
}
