//! # Broadcast bus for runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that the supervisor, the registry
//! and every per-event task can publish without blocking.
//!
//! ```text
//! Publishers (many):                    Receivers:
//!   Supervisor ──┐
//!   Registry   ──┼──► Bus ──► subscriber_listener ──► SubscriberSet (LogWriter, ...)
//!   EventActor ──┤        └─► Supervisor::subscribe() receivers (tests, embedders)
//!   deliver()  ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - A lagging receiver observes `RecvError::Lagged(n)` and skips `n` events.

use tokio::sync::broadcast;

use super::event::RuntimeEvent;

/// Cloneable broadcast handle for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<RuntimeEvent>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<RuntimeEvent>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every current receiver.
    pub fn publish(&self, ev: RuntimeEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RuntimeEventKind;

    #[tokio::test]
    async fn receivers_see_events_published_after_subscribe() {
        let bus = Bus::new(8);
        bus.publish(RuntimeEvent::new(RuntimeEventKind::PollFailed));

        let mut rx = bus.subscribe();
        bus.publish(RuntimeEvent::new(RuntimeEventKind::PollCompleted).with_count(2));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, RuntimeEventKind::PollCompleted);
        assert_eq!(ev.count, Some(2));
    }

    #[test]
    fn publish_without_receivers_is_fine() {
        let bus = Bus::new(0);
        bus.publish(RuntimeEvent::new(RuntimeEventKind::ShutdownRequested));
    }
}
