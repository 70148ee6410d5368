//! # Logging subscriber.
//!
//! [`LogWriter`] turns runtime events into `tracing` records with structured
//! fields. It does not install a `tracing` subscriber; the embedding
//! application decides where records go.
//!
//! ## Levels
//! ```text
//! info   spawned, cancelled, rolled over, delivered, shutdown
//! warn   invalid document, expired reminder, failed attempt, stale snapshot, mirror failure
//! error  poll failure, abandoned delivery, rollover failure, state write failure, subscriber panic
//! debug  waits, backoff, already-sent skips, pruning
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use remindvisor::{LogWriter, Subscribe};
//!
//! let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//! assert_eq!(subs[0].name(), "log");
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{RuntimeEvent, RuntimeEventKind};
use crate::subscribers::Subscribe;

/// Forwards runtime events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &RuntimeEvent) {
        let event = e.event_id.as_deref().unwrap_or("-");
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            RuntimeEventKind::PollCompleted => {
                debug!(active = e.count.unwrap_or(0), "poll completed");
            }
            RuntimeEventKind::PollFailed => {
                error!(reason, "reading active events failed");
            }
            RuntimeEventKind::EventInvalid => {
                warn!(event, reason, "skipping invalid event");
            }
            RuntimeEventKind::TaskSpawned => {
                info!(event, "event task spawned");
            }
            RuntimeEventKind::TaskCancelled => {
                info!(event, "event task cancelled");
            }
            RuntimeEventKind::TaskPruned => {
                debug!(event, exit = reason, "event task pruned");
            }
            RuntimeEventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            RuntimeEventKind::AllStoppedWithin => {
                info!("all event tasks stopped within grace");
            }
            RuntimeEventKind::GraceExceeded => {
                warn!(stuck = e.count.unwrap_or(0), "grace period exceeded");
            }
            RuntimeEventKind::RolledOver => {
                info!(event, start_time = reason, "recurring event rolled over");
            }
            RuntimeEventKind::EventStale => {
                debug!(event, "past non-recurring event skipped");
            }
            RuntimeEventKind::RolloverFailed => {
                error!(event, reason, "recurrence rollover failed");
            }
            RuntimeEventKind::ReminderAlreadySent => {
                debug!(event, key, "reminder already sent");
            }
            RuntimeEventKind::ReminderExpired => {
                warn!(
                    event,
                    key,
                    overdue_ms = e.delay_ms.unwrap_or(0),
                    "reminder expired, not sending"
                );
            }
            RuntimeEventKind::ReminderWaiting => {
                debug!(event, key, wait_ms = e.delay_ms.unwrap_or(0), "waiting for reminder");
            }
            RuntimeEventKind::WaitingForStart => {
                debug!(event, wait_ms = e.delay_ms.unwrap_or(0), "waiting for event start");
            }
            RuntimeEventKind::SnapshotStale => {
                warn!(event, reason, "re-read failed, using last snapshot");
            }
            RuntimeEventKind::EventVanished => {
                info!(event, "event no longer in store");
            }
            RuntimeEventKind::TaskCompleted => {
                info!(event, "event task completed");
            }
            RuntimeEventKind::DeliveryAttemptFailed => {
                warn!(
                    event,
                    key,
                    attempt = e.attempt.unwrap_or(0),
                    reason,
                    "delivery attempt failed"
                );
            }
            RuntimeEventKind::BackoffScheduled => {
                debug!(
                    event,
                    key,
                    attempt = e.attempt.unwrap_or(0),
                    delay_ms = e.delay_ms.unwrap_or(0),
                    "retrying after backoff"
                );
            }
            RuntimeEventKind::NoticeDelivered => {
                info!(event, key, attempt = e.attempt.unwrap_or(0), "notice delivered");
            }
            RuntimeEventKind::DeliveryAbandoned => {
                error!(event, key, reason, "delivery abandoned");
            }
            RuntimeEventKind::MirrorFailed => {
                warn!(event, key, reason, "group mirror failed");
            }
            RuntimeEventKind::StateWriteFailed => {
                error!(event, key, reason, "could not persist reminder state");
            }
            RuntimeEventKind::SubscriberPanicked => {
                error!(subscriber = e.subscriber.unwrap_or("-"), reason, "subscriber panicked");
            }
            RuntimeEventKind::SubscriberOverflow => {
                warn!(subscriber = e.subscriber.unwrap_or("-"), reason, "subscriber dropped event");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
