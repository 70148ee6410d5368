//! # EventActor: timeline of one event instance.
//!
//! Drives one event from its entry into the registry until the started notice.
//!
//! ## State machine
//! ```text
//! enter ──► rollover (recurring, start <= now) ──► Scheduling
//!   └─► stale (non-recurring, start <= now) ──► exit
//!
//! Scheduling ── next offset (largest first), reload, classify ──┐
//!   │                                                          │
//!   │  already_sent / expired ──► Scheduling                   │
//!   │  due_now                ──► Delivering(reminder)         │
//!   │  pending                ──► Waiting(offset)              │
//!   └─ no offsets left        ──► WaitingForStart              │
//!                                                              │
//! Waiting(offset) ── sleep, reload, classify again ────────────┘
//! Delivering(reminder) ── deliver ──► persist reminders_sent[key] ──► Scheduling
//! WaitingForStart ── sleep ──► Delivering(started) ──► Completed
//!
//! any state ── cancel ──► Cancelled (no store writes)
//! ```
//!
//! ## Rules
//! - The document is re-read before every classification; a failed read keeps
//!   the previous snapshot, a missing or deactivated document ends the task.
//! - A reminder is recorded as sent only after the sink accepted it.
//! - The started notice is delivered with retry but has no persisted flag.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::clock::Clock;
use crate::core::delivery::{Courier, Delivery};
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::model::{Event, ReminderOffset};
use crate::sink::Notice;
use crate::store::{EventStore, FieldUpdate, Occurrence};
use crate::timeline::{Disposition, ReminderTracker, next_occurrence};

/// Current position of an [`EventActor`] in its timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TaskState {
    /// Picking and classifying the next reminder.
    Scheduling,
    /// Sleeping until the reminder is due.
    Waiting(ReminderOffset),
    /// Offering a notice to the sink.
    Delivering(Notice),
    /// Every reminder processed; sleeping until the event starts.
    WaitingForStart,
    /// Started notice processed.
    Completed,
    /// Stopped by the supervisor.
    Cancelled,
}

/// Why an actor returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActorExit {
    /// All notices were processed.
    Completed,
    /// The event was already past and does not recur.
    Stale,
    /// Cancelled by `cancel`, `refresh` or `stop`.
    Cancelled,
    /// The document was deleted or deactivated while the task ran.
    Vanished,
    /// The next occurrence could not be computed or persisted; retried next tick.
    Unschedulable,
}

impl ActorExit {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            ActorExit::Completed => "completed",
            ActorExit::Stale => "stale",
            ActorExit::Cancelled => "cancelled",
            ActorExit::Vanished => "vanished",
            ActorExit::Unschedulable => "unschedulable",
        }
    }
}

/// Collaborators shared by every event actor.
#[derive(Clone)]
pub(crate) struct ActorContext {
    pub store: Arc<dyn EventStore>,
    pub clock: Arc<dyn Clock>,
    pub courier: Courier,
    pub tracker: ReminderTracker,
    pub bus: Bus,
}

/// Runs the reminder timeline of one event.
pub(crate) struct EventActor {
    ctx: ActorContext,
    snapshot: Event,
    queue: VecDeque<ReminderOffset>,
    state: TaskState,
}

impl EventActor {
    /// Creates an actor for `event`, as read by the supervisor.
    pub(crate) fn new(ctx: ActorContext, event: Event) -> Self {
        Self {
            ctx,
            snapshot: event,
            queue: VecDeque::new(),
            state: TaskState::Scheduling,
        }
    }

    /// Runs the actor until completion or cancellation.
    pub(crate) async fn run(mut self, token: CancellationToken) -> ActorExit {
        if let Err(exit) = self.enter(&token).await {
            return exit;
        }
        self.queue = self.snapshot.offsets_desc().collect();

        loop {
            if token.is_cancelled() {
                self.state = TaskState::Cancelled;
            }

            self.state = match self.state {
                TaskState::Scheduling => match self.queue.pop_front() {
                    Some(offset) => match self.reload().await {
                        Ok(()) => self.classify(offset),
                        Err(exit) => return exit,
                    },
                    None => TaskState::WaitingForStart,
                },
                TaskState::Waiting(offset) => {
                    let due = self.snapshot.due_time(&offset);
                    let wait = self.until(due);
                    self.publish(
                        RuntimeEvent::new(RuntimeEventKind::ReminderWaiting)
                            .with_key(offset.key())
                            .with_delay(wait),
                    );
                    if !sleep_or_cancel(wait, &token).await {
                        return ActorExit::Cancelled;
                    }
                    if let Err(exit) = self.reload().await {
                        return exit;
                    }
                    self.classify(offset)
                }
                TaskState::Delivering(notice) => {
                    let now = self.ctx.clock.now();
                    match self
                        .ctx
                        .courier
                        .deliver(&self.snapshot, notice, now, &token)
                        .await
                    {
                        Delivery::Cancelled => TaskState::Cancelled,
                        Delivery::NotDelivered => match notice {
                            Notice::Reminder(_) => TaskState::Scheduling,
                            Notice::Started => TaskState::Completed,
                        },
                        Delivery::Delivered => match notice {
                            Notice::Reminder(offset) => {
                                self.mark_sent(offset).await;
                                TaskState::Scheduling
                            }
                            Notice::Started => TaskState::Completed,
                        },
                    }
                }
                TaskState::WaitingForStart => {
                    let wait = self.until(self.snapshot.start_time);
                    if !wait.is_zero() {
                        self.publish(
                            RuntimeEvent::new(RuntimeEventKind::WaitingForStart).with_delay(wait),
                        );
                        if !sleep_or_cancel(wait, &token).await {
                            return ActorExit::Cancelled;
                        }
                    }
                    TaskState::Delivering(Notice::Started)
                }
                TaskState::Completed => {
                    self.publish(RuntimeEvent::new(RuntimeEventKind::TaskCompleted));
                    return ActorExit::Completed;
                }
                TaskState::Cancelled => return ActorExit::Cancelled,
            };
        }
    }

    /// Skips stale events and rolls recurring ones forward.
    async fn enter(&mut self, token: &CancellationToken) -> Result<(), ActorExit> {
        let now = self.ctx.clock.now();
        if self.snapshot.start_time > now {
            return Ok(());
        }
        if !self.snapshot.recurrence.is_recurring() {
            self.publish(RuntimeEvent::new(RuntimeEventKind::EventStale));
            return Err(ActorExit::Stale);
        }

        let next = match next_occurrence(self.snapshot.start_time, self.snapshot.recurrence, now) {
            Ok(Some(next)) => next,
            Ok(None) => {
                self.publish(RuntimeEvent::new(RuntimeEventKind::EventStale));
                return Err(ActorExit::Stale);
            }
            Err(err) => {
                self.publish(
                    RuntimeEvent::new(RuntimeEventKind::RolloverFailed).with_reason(err.as_label()),
                );
                return Err(ActorExit::Unschedulable);
            }
        };

        if token.is_cancelled() {
            return Err(ActorExit::Cancelled);
        }
        if let Err(err) = self
            .ctx
            .store
            .replace_fields(&self.snapshot.id, Occurrence::fresh(next))
            .await
        {
            self.publish(
                RuntimeEvent::new(RuntimeEventKind::RolloverFailed).with_reason(err.to_string()),
            );
            return Err(ActorExit::Unschedulable);
        }

        self.snapshot.start_time = next;
        self.snapshot.reminders_sent.clear();
        self.publish(
            RuntimeEvent::new(RuntimeEventKind::RolledOver).with_reason(next.to_rfc3339()),
        );
        Ok(())
    }

    /// Refreshes the snapshot's delivery state and display fields.
    ///
    /// Start time and offsets stay as they were when the task was spawned;
    /// schedule edits go through `refresh`.
    async fn reload(&mut self) -> Result<(), ActorExit> {
        let doc = match self.ctx.store.get_event(&self.snapshot.id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                self.publish(RuntimeEvent::new(RuntimeEventKind::EventVanished));
                return Err(ActorExit::Vanished);
            }
            Err(err) => {
                self.publish(
                    RuntimeEvent::new(RuntimeEventKind::SnapshotStale).with_reason(err.to_string()),
                );
                return Ok(());
            }
        };

        let fresh = match Event::try_from(doc) {
            Ok(fresh) => fresh,
            Err(err) => {
                self.publish(
                    RuntimeEvent::new(RuntimeEventKind::SnapshotStale).with_reason(err.to_string()),
                );
                return Ok(());
            }
        };
        if !fresh.active {
            self.publish(
                RuntimeEvent::new(RuntimeEventKind::EventVanished).with_reason("deactivated"),
            );
            return Err(ActorExit::Vanished);
        }

        for (key, sent) in fresh.reminders_sent {
            if sent {
                self.snapshot.reminders_sent.insert(key, true);
            }
        }
        self.snapshot.name = fresh.name;
        self.snapshot.description = fresh.description;
        self.snapshot.owner_group = fresh.owner_group;
        self.snapshot.destination = fresh.destination;
        Ok(())
    }

    fn classify(&self, offset: ReminderOffset) -> TaskState {
        let now = self.ctx.clock.now();
        match self.ctx.tracker.classify(&self.snapshot, &offset, now) {
            Disposition::AlreadySent => {
                self.publish(
                    RuntimeEvent::new(RuntimeEventKind::ReminderAlreadySent).with_key(offset.key()),
                );
                TaskState::Scheduling
            }
            Disposition::Expired { overdue } => {
                self.publish(
                    RuntimeEvent::new(RuntimeEventKind::ReminderExpired)
                        .with_key(offset.key())
                        .with_delay(overdue),
                );
                TaskState::Scheduling
            }
            Disposition::DueNow => TaskState::Delivering(Notice::Reminder(offset)),
            Disposition::Pending { .. } => TaskState::Waiting(offset),
        }
    }

    /// Persists `reminders_sent[key] = true` after a successful delivery.
    async fn mark_sent(&mut self, offset: ReminderOffset) {
        let key = offset.key();
        self.snapshot.reminders_sent.insert(key.clone(), true);
        if let Err(err) = self
            .ctx
            .store
            .set_field(&self.snapshot.id, FieldUpdate::reminder_sent(key.clone()))
            .await
        {
            self.publish(
                RuntimeEvent::new(RuntimeEventKind::StateWriteFailed)
                    .with_key(key)
                    .with_reason(err.to_string()),
            );
        }
    }

    fn until(&self, at: chrono::DateTime<chrono::Utc>) -> Duration {
        (at - self.ctx.clock.now()).to_std().unwrap_or(Duration::ZERO)
    }

    fn publish(&self, ev: RuntimeEvent) {
        self.ctx.bus.publish(ev.with_event(&self.snapshot.id));
    }
}

/// Sleeps for `wait`; returns `false` if `token` fired first.
async fn sleep_or_cancel(wait: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
