//! # portier-domain
//!
//! Pure domain model for the portier entry-door controller.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **day times** and **ranges** (`HH:MM`, `HH:MM - HH:MM`, absolute intervals)
//! - Define **opening hours** and the three **rule layers** (regular, date-specific, holiday)
//! - Define **door states**, commands and manual **overwrites**
//! - Contain all invariant enforcement (sorted, non-overlapping rule layers)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod daytime;
pub mod door;
pub mod opening_hours;
pub mod time_range;
