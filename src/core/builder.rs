//! # Builder for [`Supervisor`].
//!
//! Wires the collaborators into one runtime:
//!
//! ```text
//! SupervisorBuilder::build()
//!   ├─ Bus::new(bus_capacity)
//!   ├─ SubscriberSet (LogWriter first, then custom subscribers)
//!   │    └─ subscriber listener: Bus ──► SubscriberSet::emit   (owned by the Supervisor)
//!   ├─ Courier (sink, RetryPolicy, mirror_to_group)
//!   └─ ActorContext (store, clock, courier, tracker, bus)
//! ```
//!
//! The listener runs until [`Supervisor::stop`] or until the supervisor is
//! dropped; it then forwards what is still queued and drains the subscribers.

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::core::actor::ActorContext;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::SchedulerConfig;
use crate::core::delivery::Courier;
use crate::core::supervisor::{SubscriberListener, Supervisor};
use crate::events::Bus;
use crate::sink::NotificationSink;
use crate::store::EventStore;
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

/// Builder for constructing a [`Supervisor`].
///
/// Defaults: [`SchedulerConfig::default`], [`SystemClock`] and a [`LogWriter`]
/// subscriber.
pub struct SupervisorBuilder {
    store: Arc<dyn EventStore>,
    sink: Arc<dyn NotificationSink>,
    cfg: SchedulerConfig,
    clock: Arc<dyn Clock>,
    log_writer: bool,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a builder for `store` and `sink`.
    pub fn new(store: Arc<dyn EventStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            sink,
            cfg: SchedulerConfig::default(),
            clock: Arc::new(SystemClock),
            log_writer: true,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: SchedulerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adds subscribers for runtime events.
    ///
    /// Each one gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Leaves out the default [`LogWriter`].
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Builds the supervisor. Must be called inside a tokio runtime.
    ///
    /// The polling loop is not started; call [`Supervisor::start`].
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity);

        let mut subscribers = self.subscribers;
        if self.log_writer {
            subscribers.insert(0, Arc::new(LogWriter::new()));
        }
        let listener = (!subscribers.is_empty())
            .then(|| subscriber_listener(&bus, SubscriberSet::new(subscribers, bus.clone())));

        let ctx = ActorContext {
            store: self.store,
            clock: self.clock,
            courier: Courier {
                sink: self.sink,
                bus: bus.clone(),
                retry: self.cfg.retry_policy(),
                mirror_to_group: self.cfg.mirror_to_group,
            },
            tracker: self.cfg.tracker(),
            bus: bus.clone(),
        };
        Arc::new(Supervisor::new_internal(self.cfg, bus, ctx, listener))
    }
}

/// Forwards bus events to the subscriber set until cancelled.
fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> SubscriberListener {
    let mut rx = bus.subscribe();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
        // events published before the cancel
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        set.shutdown().await;
    });
    SubscriberListener { join, cancel }
}
