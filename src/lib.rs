//! # remindvisor
//!
//! **Remindvisor** is a supervised event reminder scheduler.
//!
//! Given a store of scheduled events (one-off or recurring), each carrying a
//! set of reminder offsets, it delivers every reminder at most once, catches up
//! on reminders that became due while the process was down, rolls recurring
//! events forward and announces each event when it starts. The event store
//! and the notification sink are traits implemented by the embedding
//! application.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                        ┌──────────────────────────┐
//!                        │   EventStore (trait)     │
//!                        │ list / get / set / repl. │
//!                        └────────────┬─────────────┘
//!                                     │ list_active_events() every poll_interval
//!                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - poll loop (tick)                                               │
//! │  - Registry (event id → JoinHandle + CancellationToken)           │
//! │  - Bus (runtime events)                                           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌────────────┐     ┌────────────┐     ┌────────────┐
//!   │ EventActor │     │ EventActor │     │ EventActor │   one per active event
//!   └─────┬──────┘     └─────┬──────┘     └─────┬──────┘
//!         │ next_occurrence (rollover)          │
//!         │ ReminderTracker::classify           │
//!         │ Courier::deliver (retry + backoff)  │
//!         ▼                                     ▼
//!   NotificationSink (trait)              EventStore::set_field
//!                                          (reminders_sent.<key> = true)
//!
//! Bus ──► subscriber listener ──► SubscriberSet ──► LogWriter (tracing), custom subscribers
//! ```
//!
//! ### Per-event lifecycle
//! ```text
//! start <= now ──► recurring? ── no ──► stale, exit
//!                      └─ yes ──► next_occurrence ──► replace_fields(start, {})
//!
//! for offset in offsets (largest first):
//!   reload document
//!   classify ──► already_sent | expired ──► skip
//!            ├─► due_now ──► deliver ──► set_field(reminders_sent.<key>)
//!            └─► pending ──► sleep ──► reload ──► classify again
//!
//! sleep until start ──► deliver started notice ──► exit
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                                |
//! |-------------------|----------------------------------------------------------------|---------------------------------------------------|
//! | **Supervision**   | Polling, one task per event, cancel/refresh, graceful stop.    | [`Supervisor`], [`SupervisorBuilder`]             |
//! | **Timeline**      | Recurrence and reminder classification, no I/O.                | [`next_occurrence`], [`ReminderTracker`]          |
//! | **Model**         | Strongly typed events validated from loose documents.          | [`Event`], [`EventDocument`], [`ReminderOffset`]  |
//! | **Collaborators** | Store and sink contracts, reference in-memory store.           | [`EventStore`], [`NotificationSink`], [`InMemoryStore`] |
//! | **Policies**      | Delivery attempt budget, backoff and jitter.                   | [`RetryPolicy`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Observability** | Runtime events, subscriber fan-out, `tracing` output.          | [`RuntimeEvent`], [`Subscribe`], [`LogWriter`]    |
//! | **Configuration** | TOML-loadable settings.                                        | [`SchedulerConfig`]                               |
//! | **Errors**        | Typed errors with stable labels.                               | [`StoreError`], [`DeliveryError`], [`EventError`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use chrono::{Duration, Utc};
//! use remindvisor::{
//!     DeliveryError, Destination, EventDocument, InMemoryStore, Message, NotificationSink,
//!     Supervisor,
//! };
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl NotificationSink for Stdout {
//!     async fn send(&self, dest: &Destination, msg: &Message) -> Result<(), DeliveryError> {
//!         println!("[{dest}] {}", msg.body);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     store
//!         .insert(EventDocument {
//!             id: "raid-night".into(),
//!             name: "Raid Night".into(),
//!             description: Some("Bring potions".into()),
//!             owner_group: "ABC".into(),
//!             start_time: Utc::now() + Duration::hours(3),
//!             recurrence: Some("weekly".into()),
//!             reminder_offsets: vec!["2h".into(), "15m".into()],
//!             reminder_hours: Vec::new(),
//!             active: true,
//!             destination: Some("1375476122061508619".into()),
//!             reminders_sent: Default::default(),
//!         })
//!         .await;
//!
//!     let sup = Supervisor::builder(store, Arc::new(Stdout)).build();
//!     let report = sup.tick().await?;
//!     assert_eq!(report.spawned, 1);
//!
//!     sup.stop().await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod model;
mod policies;
mod sink;
mod store;
mod subscribers;
mod timeline;

// ---- Public re-exports ----

pub use crate::core::{
    Clock, SchedulerConfig, Supervisor, SupervisorBuilder, SystemClock, TickReport, TokioClock,
};
pub use crate::error::{ConfigError, DeliveryError, EventError, RecurrenceError, RuntimeError, StoreError};
pub use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
pub use crate::model::{Event, EventDocument, EventId, OffsetKey, Recurrence, ReminderOffset};
pub use crate::policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use crate::sink::{Destination, Message, NotificationSink, Notice, Tone};
pub use crate::store::{EventStore, FieldUpdate, InMemoryStore, Occurrence};
pub use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use crate::timeline::{Disposition, ReminderTracker, next_occurrence};
