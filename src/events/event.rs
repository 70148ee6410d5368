//! # Runtime events emitted by the supervisor and per-event tasks.
//!
//! [`RuntimeEventKind`] covers four groups:
//! - **Supervision**: polling, spawning, cancelling, pruning, shutdown
//! - **Timeline**: rollover, stale events, waits, expired or already-sent reminders
//! - **Delivery**: attempts, backoff, success, abandonment, state writes
//! - **Subscribers**: overflow and panics in the fan-out workers
//!
//! [`RuntimeEvent`] carries the optional metadata (event id, offset key, attempt,
//! delay, reason). Each event has a global monotonic `seq`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use remindvisor::{RuntimeEvent, RuntimeEventKind};
//!
//! let ev = RuntimeEvent::new(RuntimeEventKind::BackoffScheduled)
//!     .with_event("ev-1")
//!     .with_key("15m")
//!     .with_attempt(1)
//!     .with_delay(Duration::from_secs(1));
//!
//! assert_eq!(ev.event_id.as_deref(), Some("ev-1"));
//! assert_eq!(ev.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeEventKind {
    // === Supervision ===
    /// A poll finished. `count`: active documents read.
    PollCompleted,
    /// Reading active events failed. `reason`: store error.
    PollFailed,
    /// A document failed validation and was not scheduled. `event_id`, `reason`.
    EventInvalid,
    /// A per-event task was spawned and registered. `event_id`.
    TaskSpawned,
    /// A live task was cancelled by `cancel`/`refresh`/`stop`. `event_id`.
    TaskCancelled,
    /// A finished task was removed from the registry. `event_id`, `reason`: exit.
    TaskPruned,
    /// `stop()` or an OS signal asked the scheduler to stop.
    ShutdownRequested,
    /// Every task exited within the grace period.
    AllStoppedWithin,
    /// Some tasks were still running when the grace period ran out. `count`.
    GraceExceeded,

    // === Timeline ===
    /// A recurring event was advanced. `event_id`, `reason`: new start time.
    RolledOver,
    /// A past, non-recurring event was skipped. `event_id`.
    EventStale,
    /// The next occurrence could not be computed or persisted. `event_id`, `reason`.
    RolloverFailed,
    /// A reminder is recorded as sent. `event_id`, `key`.
    ReminderAlreadySent,
    /// A reminder is past the tolerance window and abandoned. `event_id`, `key`, `delay_ms`: overdue.
    ReminderExpired,
    /// Task sleeps until a reminder is due. `event_id`, `key`, `delay_ms`.
    ReminderWaiting,
    /// Task sleeps until the event starts. `event_id`, `delay_ms`.
    WaitingForStart,
    /// A re-read failed; the task continues with its last snapshot. `event_id`, `reason`.
    SnapshotStale,
    /// The document disappeared from the store. `event_id`.
    EventVanished,
    /// All notices were processed. `event_id`.
    TaskCompleted,

    // === Delivery ===
    /// A sink call failed. `event_id`, `key`, `attempt`, `reason`.
    DeliveryAttemptFailed,
    /// Next attempt scheduled. `event_id`, `key`, `attempt`, `delay_ms`.
    BackoffScheduled,
    /// The sink accepted the notice. `event_id`, `key`, `attempt`.
    NoticeDelivered,
    /// Attempts exhausted or destination unusable. `event_id`, `key`, `reason`.
    DeliveryAbandoned,
    /// Mirror to the owner group's reminders destination failed. `event_id`, `key`, `reason`.
    MirrorFailed,
    /// `reminders_sent` could not be persisted after delivery. `event_id`, `key`, `reason`.
    StateWriteFailed,

    // === Subscribers ===
    /// Subscriber panicked during processing. `reason`: panic message.
    SubscriberPanicked,
    /// Subscriber queue dropped an event. `reason`: "full" or "closed".
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct RuntimeEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    pub kind: RuntimeEventKind,

    /// Scheduled event the runtime event is about.
    pub event_id: Option<Arc<str>>,
    /// Offset key (`"15m"`) or `"started"` for the started notice.
    pub key: Option<Arc<str>>,
    /// Delivery attempt (1-based).
    pub attempt: Option<u32>,
    /// Wait, backoff or overdue duration in milliseconds.
    pub delay_ms: Option<u64>,
    /// Counter payload (documents polled, tasks stuck).
    pub count: Option<u64>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
    /// Subscriber name for subscriber events.
    pub subscriber: Option<&'static str>,
}

impl RuntimeEvent {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: RuntimeEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            event_id: None,
            key: None,
            attempt: None,
            delay_ms: None,
            count: None,
            reason: None,
            subscriber: None,
        }
    }

    #[inline]
    pub fn with_event(mut self, id: impl AsRef<str>) -> Self {
        self.event_id = Some(Arc::from(id.as_ref()));
        self
    }

    #[inline]
    pub fn with_key(mut self, key: impl AsRef<str>) -> Self {
        self.key = Some(Arc::from(key.as_ref()));
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a duration (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = RuntimeEvent::new(RuntimeEventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = RuntimeEvent::new(RuntimeEventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Returns `true` if this event concerns scheduled event `id`.
    #[inline]
    pub fn is_about(&self, id: &str) -> bool {
        self.event_id.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = RuntimeEvent::new(RuntimeEventKind::PollCompleted);
        let b = RuntimeEvent::new(RuntimeEventKind::PollCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_events_carry_name() {
        let ev = RuntimeEvent::subscriber_overflow("log", "full");
        assert_eq!(ev.subscriber, Some("log"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
        assert!(!ev.is_about("log"));
    }
}
