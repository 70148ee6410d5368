//! Pure scheduling logic, free of timing and I/O.
//!
//! ## Contents
//! - [`next_occurrence`] recurrence calculator
//! - [`ReminderTracker`], [`Disposition`] four-way reminder classification

mod recurrence;
mod tracker;

pub use recurrence::next_occurrence;
pub use tracker::{Disposition, ReminderTracker};
