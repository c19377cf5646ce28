//! Virtual adapter error types.

use portier_domain::error::PortierError;

/// Errors of the [`VirtualDoor`](crate::VirtualDoor).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VirtualDoorError {
    /// The door was switched offline.
    #[error("virtual door is offline")]
    Offline,
}

impl VirtualDoorError {
    /// Convert into a [`PortierError::Hardware`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> PortierError {
        PortierError::hardware(self)
    }
}

impl From<VirtualDoorError> for PortierError {
    fn from(err: VirtualDoorError) -> Self {
        err.into_domain()
    }
}

/// Errors of the [`StaticHolidayCalendar`](crate::StaticHolidayCalendar).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The calendar only knows the holidays of another country.
    #[error("no holidays configured for country {0:?}")]
    UnknownCountry(String),
}

impl CalendarError {
    /// Convert into a [`PortierError::HolidayLookup`].
    #[must_use]
    pub fn into_domain(self) -> PortierError {
        PortierError::holiday_lookup(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_offline_to_hardware_error() {
        let err: PortierError = VirtualDoorError::Offline.into();
        assert!(matches!(err, PortierError::Hardware(_)));
    }

    #[test]
    fn should_convert_unknown_country_to_lookup_error() {
        let err = CalendarError::UnknownCountry("DE".to_string()).into_domain();
        assert!(matches!(err, PortierError::HolidayLookup(_)));
    }
}
