//! Event data model.
//!
//! ## Contents
//! - [`Event`], [`EventDocument`], [`EventId`], [`Recurrence`] the unit of scheduling
//! - [`ReminderOffset`], [`OffsetKey`] reminder offsets and their persistence keys

mod event;
mod offset;

pub use event::{Event, EventDocument, EventId, Recurrence};
pub use offset::{OffsetKey, ReminderOffset};
