#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use remindvisor::{
    Clock, DeliveryError, Destination, EventDocument, EventId, EventStore, FieldUpdate,
    InMemoryStore, Message, NotificationSink, Occurrence, SchedulerConfig, StoreError,
    Supervisor, TokioClock,
};

pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 18, 19, 0, 0).unwrap()
}

/// Active, non-recurring document starting `start_in` after the anchor.
pub fn doc(id: &str, start_in: Duration, offsets: &[&str]) -> EventDocument {
    EventDocument {
        id: id.into(),
        name: "Raid".into(),
        description: None,
        owner_group: String::new(),
        start_time: anchor() + start_in,
        recurrence: None,
        reminder_offsets: offsets.iter().map(|s| s.to_string()).collect(),
        reminder_hours: Vec::new(),
        active: true,
        destination: Some("chan".into()),
        reminders_sent: BTreeMap::new(),
    }
}

#[derive(Clone, Debug)]
pub struct Sent {
    pub destination: String,
    pub title: String,
    pub body: String,
    pub at: DateTime<Utc>,
}

/// Records every call; fails the first calls with the queued errors.
pub struct RecordingSink {
    clock: TokioClock,
    sent: Mutex<Vec<Sent>>,
    failures: Mutex<VecDeque<DeliveryError>>,
}

impl RecordingSink {
    pub fn new(clock: TokioClock) -> Arc<Self> {
        Arc::new(Self {
            clock,
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        })
    }

    pub fn fail_next(&self, errors: impl IntoIterator<Item = DeliveryError>) {
        self.failures.lock().unwrap().extend(errors);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.body).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, destination: &Destination, message: &Message) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(Sent {
            destination: destination.to_string(),
            title: message.title.clone(),
            body: message.body.clone(),
            at: self.clock.now(),
        });
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory store whose reads and writes can be switched off.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_flag_writes: AtomicBool,
    pub fail_rollovers: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_flag_writes_failing(&self, failing: bool) {
        self.fail_flag_writes.store(failing, Ordering::SeqCst);
    }

    pub fn set_rollovers_failing(&self, failing: bool) {
        self.fail_rollovers.store(failing, Ordering::SeqCst);
    }

    fn check(switch: &AtomicBool) -> Result<(), StoreError> {
        if switch.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn list_active_events(&self) -> Result<Vec<EventDocument>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.list_active_events().await
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<EventDocument>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.get_event(id).await
    }

    async fn set_field(&self, id: &EventId, update: FieldUpdate) -> Result<(), StoreError> {
        Self::check(&self.fail_flag_writes)?;
        self.inner.set_field(id, update).await
    }

    async fn replace_fields(&self, id: &EventId, occurrence: Occurrence) -> Result<(), StoreError> {
        Self::check(&self.fail_rollovers)?;
        self.inner.replace_fields(id, occurrence).await
    }
}

/// Supervisor over a [`FlakyStore`], clock starting at [`anchor`].
pub fn flaky_harness() -> (Arc<FlakyStore>, Arc<RecordingSink>, Arc<Supervisor>) {
    let clock = TokioClock::new(anchor());
    let store = Arc::new(FlakyStore::default());
    let sink = RecordingSink::new(clock);
    let sup = Supervisor::builder(store.clone(), sink.clone())
        .with_clock(Arc::new(clock))
        .build();
    (store, sink, sup)
}

pub struct Harness {
    pub clock: TokioClock,
    pub store: Arc<InMemoryStore>,
    pub sink: Arc<RecordingSink>,
    pub sup: Arc<Supervisor>,
}

/// Supervisor on a fresh in-memory store, clock starting at [`anchor`].
pub fn harness(cfg: SchedulerConfig) -> Harness {
    let clock = TokioClock::new(anchor());
    let store = Arc::new(InMemoryStore::new());
    let sink = RecordingSink::new(clock);
    let sup = Supervisor::builder(store.clone(), sink.clone())
        .with_config(cfg)
        .with_clock(Arc::new(clock))
        .build();
    Harness {
        clock,
        store,
        sink,
        sup,
    }
}
