//! # portier-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DoorActuator`: lock, unlock and open the physical door
//!   - `HolidayProvider`: tell whether a date is a public holiday
//!   - `Clock`: the current time, replaceable in tests
//! - Define **driving/inbound ports** as use-case structs:
//!   - `OpeningHoursResolver`: which intervals are open around an instant
//!   - `DoorScheduler`: the control loop that keeps the door in its desired state
//! - Orchestrate domain objects without knowing *how* the hardware is reached
//!
//! ## Dependency rule
//! Depends on `portier-domain` only (plus `tokio` for the scheduling loop).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod resolver;
pub mod scheduler;
