//! # portier-adapter-virtual
//!
//! In-memory adapters for demos, tests and installations that need no
//! external services.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualDoor`] | `DoorActuator` | Records every command; can be switched offline to inject failures |
//! | [`StaticHolidayCalendar`] | `HolidayProvider` | Answers from configured fixed dates and recurring `MM/DD` holidays |
//!
//! ## Dependency rule
//!
//! Depends on `portier-app` (port traits) and `portier-domain` only.

mod calendar;
mod door;
mod error;

pub use calendar::StaticHolidayCalendar;
pub use door::VirtualDoor;
pub use error::{CalendarError, VirtualDoorError};
