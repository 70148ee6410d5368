//! # Non-blocking fan-out to subscribers.
//!
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► sub1.on_event()   (panic → SubscriberPanicked)
//!     └──► [queue N] ──► worker N ──► subN.on_event()
//! ```
//!
//! ## Rules
//! - `emit()` uses `try_send` and returns immediately
//! - each subscriber sees events in order; there is no cross-subscriber ordering
//! - overflow drops the event for that subscriber and publishes `SubscriberOverflow`
//!   (overflow events themselves are never re-reported)
//! - a panicking subscriber keeps its worker alive and does not affect others

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<RuntimeEvent>>,
}

/// Per-subscriber queues and workers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<RuntimeEvent>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = if let Some(msg) = panic.downcast_ref::<&'static str>() {
                            (*msg).to_string()
                        } else if let Some(msg) = panic.downcast_ref::<String>() {
                            msg.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        worker_bus.publish(RuntimeEvent::subscriber_panicked(sub.name(), info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Queues `event` for every subscriber without waiting.
    pub fn emit(&self, event: RuntimeEvent) {
        let event = Arc::new(event);
        let is_overflow = matches!(event.kind, RuntimeEventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow {
                self.bus
                    .publish(RuntimeEvent::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain.
    pub async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Collect(Arc<Mutex<Vec<RuntimeEventKind>>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &RuntimeEvent) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &RuntimeEvent) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_isolates_panics() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Explode), Arc::new(Collect(seen.clone()))];
        let set = SubscriberSet::new(subs, bus.clone());

        set.emit(RuntimeEvent::new(RuntimeEventKind::PollCompleted));
        set.emit(RuntimeEvent::new(RuntimeEventKind::TaskSpawned));
        set.shutdown().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![RuntimeEventKind::PollCompleted, RuntimeEventKind::TaskSpawned]
        );

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, RuntimeEventKind::SubscriberPanicked);
        assert_eq!(ev.subscriber, Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}
