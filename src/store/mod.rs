//! # Event store adapter contract.
//!
//! The scheduler never owns event documents; it reads and patches them through
//! [`EventStore`]. Writes are narrow on purpose:
//!
//! ```text
//! set_field(id, ReminderSent { key, true })     → reminders_sent.<key> = true
//! replace_fields(id, Occurrence { start, {} })  → start_time, reminders_sent
//! ```
//!
//! ## Rules
//! - Each write is atomic at the level of one document.
//! - Writes touch only the named fields; concurrent edits to other fields
//!   (name, description, ...) by other actors must survive.
//! - Implementations must be safe to share between the supervisor loop and
//!   every per-event task (`Send + Sync`).
//!
//! [`InMemoryStore`] is a complete reference implementation.

mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{EventDocument, EventId, OffsetKey};

pub use memory::InMemoryStore;

/// Single-field partial update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Sets `reminders_sent.<key>`.
    ReminderSent {
        /// Canonical offset key.
        key: OffsetKey,
        /// New flag value.
        sent: bool,
    },
}

impl FieldUpdate {
    /// Marks the reminder for `key` as sent.
    pub fn reminder_sent(key: OffsetKey) -> Self {
        FieldUpdate::ReminderSent { key, sent: true }
    }

    /// Dotted document path of the updated field (`reminders_sent.15m`).
    pub fn path(&self) -> String {
        match self {
            FieldUpdate::ReminderSent { key, .. } => format!("reminders_sent.{key}"),
        }
    }
}

/// Replacement for the fields that change on recurrence rollover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrence {
    /// Next occurrence.
    pub start_time: DateTime<Utc>,
    /// Delivery state for the new occurrence (empty on rollover).
    pub reminders_sent: BTreeMap<OffsetKey, bool>,
}

impl Occurrence {
    /// Fresh occurrence at `start_time` with nothing sent.
    pub fn fresh(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            reminders_sent: BTreeMap::new(),
        }
    }
}

/// Persistent collection of event documents.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Returns every document with `active = true`.
    async fn list_active_events(&self) -> Result<Vec<EventDocument>, StoreError>;

    /// Returns one document by id, active or not.
    async fn get_event(&self, id: &EventId) -> Result<Option<EventDocument>, StoreError>;

    /// Atomically applies a single-field update.
    async fn set_field(&self, id: &EventId, update: FieldUpdate) -> Result<(), StoreError>;

    /// Atomically replaces `start_time` and `reminders_sent`.
    async fn replace_fields(&self, id: &EventId, occurrence: Occurrence) -> Result<(), StoreError>;
}
