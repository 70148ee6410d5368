//! # Supervisor: polling loop, live-task registry and graceful shutdown.
//!
//! The [`Supervisor`] guarantees that every active event has exactly one live
//! event task in this process. It owns the runtime
//! event [`Bus`], the registry of live tasks and the polling loop.
//!
//! ## High-level architecture
//! ```text
//! start():
//!   poll loop ──► tick() every poll_interval (first tick immediately)
//!
//! tick():
//!   Registry::prune_finished()           ──► TaskPruned(exit)
//!   EventStore::list_active_events()
//!     ├─ Err ──► PollFailed (retried next interval)
//!     └─ Ok(docs) ──► for each doc:
//!          Event::try_from(doc)
//!            ├─ Err ──► EventInvalid (retried every tick)
//!            └─ Ok  ──► Registry::spawn_if_absent ──► TaskSpawned | already live
//!
//! Event flow:
//!   EventActor / Courier / Registry ── publish ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                    └──► Supervisor::subscribe() receivers
//!
//! stop():
//!   ShutdownRequested ──► cancel poll loop ──► Registry::cancel_all(grace)
//!     ├─ all joined  ──► AllStoppedWithin
//!     └─ stuck tasks ──► GraceExceeded ──► RuntimeError::GraceExceeded
//!   ──► cancel subscriber listener ──► forward queued events ──► SubscriberSet::shutdown
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use remindvisor::{
//!     DeliveryError, Destination, InMemoryStore, Message, NotificationSink, Supervisor,
//! };
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl NotificationSink for Stdout {
//!     async fn send(&self, dest: &Destination, msg: &Message) -> Result<(), DeliveryError> {
//!         println!("[{dest}] {}", msg.to_plain_text());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(Arc::new(InMemoryStore::new()), Arc::new(Stdout)).build();
//!     sup.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::actor::ActorContext;
use crate::core::builder::SupervisorBuilder;
use crate::core::config::SchedulerConfig;
use crate::core::registry::{Registry, Spawn};
use crate::core::shutdown;
use crate::error::{RuntimeError, StoreError};
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::model::{Event, EventDocument, EventId};
use crate::sink::NotificationSink;
use crate::store::EventStore;

/// Counters describing one [`Supervisor::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Active documents returned by the store.
    pub active: usize,
    /// Tasks spawned by this tick.
    pub spawned: usize,
    /// Active events that already had a live task.
    pub already_live: usize,
    /// Finished tasks removed from the registry.
    pub pruned: usize,
    /// Documents skipped because they failed validation.
    pub invalid: usize,
}

/// Running poll loop.
struct PollLoop {
    join: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Task forwarding bus events to the subscriber set.
pub(crate) struct SubscriberListener {
    pub join: JoinHandle<()>,
    pub cancel: CancellationToken,
}

/// Polls the event store and keeps one live task per active event.
pub struct Supervisor {
    cfg: SchedulerConfig,
    bus: Bus,
    store: Arc<dyn EventStore>,
    ctx: ActorContext,
    registry: Registry,
    poll: Mutex<Option<PollLoop>>,
    listener: Mutex<Option<SubscriberListener>>,
}

impl Supervisor {
    /// Starts building a supervisor for `store` and `sink`.
    pub fn builder(
        store: Arc<dyn EventStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> SupervisorBuilder {
        SupervisorBuilder::new(store, sink)
    }

    pub(crate) fn new_internal(
        cfg: SchedulerConfig,
        bus: Bus,
        ctx: ActorContext,
        listener: Option<SubscriberListener>,
    ) -> Self {
        Self {
            store: Arc::clone(&ctx.store),
            registry: Registry::new(bus.clone()),
            cfg,
            bus,
            ctx,
            poll: Mutex::new(None),
            listener: Mutex::new(listener),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.cfg
    }

    /// Starts the polling loop. Calling it while running has no effect.
    pub async fn start(self: &Arc<Self>) {
        let mut poll = self.poll.lock().await;
        if poll.as_ref().is_some_and(|p| !p.join.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let me = Arc::clone(self);
        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(me.cfg.poll_interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                // Failures are published on the bus; the next interval retries.
                let _ = me.tick().await;
            }
        });
        *poll = Some(PollLoop { join, cancel });
    }

    /// Stops the polling loop, cancels every live task and drains the
    /// subscribers.
    ///
    /// Waits up to the configured grace period for the tasks. Subscribers see
    /// every event published up to and including the final
    /// `AllStoppedWithin`/`GraceExceeded`, and receive nothing afterwards;
    /// [`Supervisor::subscribe`] receivers keep working.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let res = self.stop_tasks().await;
        self.close_subscribers().await;
        res
    }

    async fn stop_tasks(&self) -> Result<(), RuntimeError> {
        let poll = self.poll.lock().await.take();
        if poll.is_none() && self.registry.list().await.is_empty() {
            return Ok(());
        }
        self.bus
            .publish(RuntimeEvent::new(RuntimeEventKind::ShutdownRequested));
        if let Some(poll) = poll {
            poll.cancel.cancel();
            let _ = poll.join.await;
        }

        let grace = self.cfg.grace();
        let stuck = self.registry.cancel_all(grace).await;
        if stuck.is_empty() {
            self.bus
                .publish(RuntimeEvent::new(RuntimeEventKind::AllStoppedWithin));
            Ok(())
        } else {
            self.bus.publish(
                RuntimeEvent::new(RuntimeEventKind::GraceExceeded).with_count(stuck.len() as u64),
            );
            Err(RuntimeError::GraceExceeded {
                grace,
                stuck: stuck.iter().map(ToString::to_string).collect(),
            })
        }
    }

    async fn close_subscribers(&self) {
        if let Some(listener) = self.listener.lock().await.take() {
            listener.cancel.cancel();
            let _ = listener.join.await;
        }
    }

    /// Returns `true` while the polling loop runs.
    pub async fn is_running(&self) -> bool {
        self.poll
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| !p.join.is_finished())
    }

    /// One polling cycle: prune finished tasks, then spawn tasks for active
    /// events that have none.
    ///
    /// A store failure is published as `PollFailed` and returned; nothing is
    /// spawned in that case.
    pub async fn tick(&self) -> Result<TickReport, StoreError> {
        let mut report = TickReport {
            pruned: self.registry.prune_finished().await,
            ..TickReport::default()
        };

        let docs = match self.store.list_active_events().await {
            Ok(docs) => docs,
            Err(err) => {
                self.bus.publish(
                    RuntimeEvent::new(RuntimeEventKind::PollFailed).with_reason(err.to_string()),
                );
                return Err(err);
            }
        };

        for doc in docs.into_iter().filter(|d| d.active) {
            report.active += 1;
            let Some(event) = self.validate(doc) else {
                report.invalid += 1;
                continue;
            };
            match self.registry.spawn_if_absent(event, &self.ctx).await {
                Spawn::Spawned => report.spawned += 1,
                Spawn::AlreadyLive => report.already_live += 1,
            }
        }

        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::PollCompleted).with_count(report.active as u64),
        );
        Ok(report)
    }

    /// Cancels the live task for `id`, if any. Returns whether one was registered.
    ///
    /// The event is picked up again by the next tick if it is still active.
    pub async fn cancel(&self, id: &EventId) -> bool {
        self.registry.cancel(id).await
    }

    /// Cancels the task for `id`, re-reads the event and respawns it right away
    /// if it is still active and valid. Returns whether a task was spawned.
    pub async fn refresh(&self, id: &EventId) -> Result<bool, StoreError> {
        self.registry.cancel(id).await;

        let Some(doc) = self.store.get_event(id).await? else {
            return Ok(false);
        };
        if !doc.active {
            return Ok(false);
        }
        let Some(event) = self.validate(doc) else {
            return Ok(false);
        };
        Ok(self.registry.spawn_if_absent(event, &self.ctx).await == Spawn::Spawned)
    }

    /// Sorted ids of events with a live task.
    pub async fn live_events(&self) -> Vec<EventId> {
        self.registry.list().await
    }

    /// Receiver for runtime events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.bus.subscribe()
    }

    /// Starts, waits for a termination signal, then stops gracefully.
    pub async fn run_until_signal(self: &Arc<Self>) -> Result<(), RuntimeError> {
        self.start().await;
        let signal = shutdown::wait_for_shutdown_signal().await;
        let stopped = self.stop().await;
        signal?;
        stopped
    }

    fn validate(&self, doc: EventDocument) -> Option<Event> {
        let id = doc.id.clone();
        match Event::try_from(doc) {
            Ok(event) => Some(event),
            Err(err) => {
                self.bus.publish(
                    RuntimeEvent::new(RuntimeEventKind::EventInvalid)
                        .with_event(&id)
                        .with_reason(err.to_string()),
                );
                None
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.get_mut().take() {
            listener.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::TokioClock;
    use crate::error::DeliveryError;
    use crate::sink::{Destination, Message};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct Quiet;

    #[async_trait]
    impl NotificationSink for Quiet {
        async fn send(&self, _d: &Destination, _m: &Message) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
    }

    fn doc(id: &str, hours: i64) -> EventDocument {
        EventDocument {
            id: id.into(),
            name: id.into(),
            description: None,
            owner_group: String::new(),
            start_time: anchor() + chrono::Duration::hours(hours),
            recurrence: None,
            reminder_offsets: vec!["15m".into()],
            reminder_hours: Vec::new(),
            active: true,
            destination: Some("chan".into()),
            reminders_sent: BTreeMap::new(),
        }
    }

    fn supervisor(store: Arc<InMemoryStore>) -> Arc<Supervisor> {
        Supervisor::builder(store, Arc::new(Quiet))
            .with_clock(Arc::new(TokioClock::new(anchor())))
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn tick_spawns_once_per_active_event() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(doc("a", 2)).await;
        store.insert(doc("b", 3)).await;
        let sup = supervisor(store);

        let first = sup.tick().await.unwrap();
        assert_eq!(first.active, 2);
        assert_eq!(first.spawned, 2);

        let second = sup.tick().await.unwrap();
        assert_eq!(second.spawned, 0);
        assert_eq!(second.already_live, 2);
        assert_eq!(
            sup.live_events().await,
            vec![EventId::new("a"), EventId::new("b")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_documents_are_skipped_every_tick() {
        let store = Arc::new(InMemoryStore::new());
        let mut bad = doc("bad", 2);
        bad.recurrence = Some("hourly".into());
        store.insert(bad).await;
        let sup = supervisor(store);

        for _ in 0..2 {
            let r = sup.tick().await.unwrap();
            assert_eq!((r.invalid, r.spawned), (1, 0));
        }
        assert!(sup.live_events().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(doc("a", 2)).await;
        let sup = supervisor(store);

        sup.start().await;
        sup.start().await;
        assert!(sup.is_running().await);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sup.live_events().await, vec![EventId::new("a")]);

        sup.stop().await.unwrap();
        sup.stop().await.unwrap();
        assert!(!sup.is_running().await);
        assert!(sup.live_events().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_respawns_active_events_only() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(doc("a", 2)).await;
        let sup = supervisor(store.clone());
        sup.tick().await.unwrap();

        assert!(sup.refresh(&EventId::new("a")).await.unwrap());
        assert_eq!(sup.live_events().await, vec![EventId::new("a")]);

        store.update("a", |d| d.active = false).await;
        assert!(!sup.refresh(&EventId::new("a")).await.unwrap());
        assert!(sup.live_events().await.is_empty());
    }
}
