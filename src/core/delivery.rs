//! # Delivery with retry.
//!
//! [`Courier::deliver`] offers one rendered notice to the sink under the
//! configured [`RetryPolicy`].
//!
//! ```text
//! Destination::parse ──err──► DeliveryAbandoned (no retry)
//!        │
//!        ▼
//! attempt 1 ──ok──► NoticeDelivered ──► mirror (reminders only, best-effort)
//!    │ err
//!    ├─► DeliveryAttemptFailed
//!    ├─► BackoffScheduled ──► sleep(1s)     (cancellable)
//!    ▼
//! attempt 2 ... attempt N ──err──► DeliveryAbandoned
//! ```
//!
//! ## Rules
//! - Destination errors end the loop at once; other errors are retried.
//! - Cancellation interrupts both the sink call and the backoff sleep.
//! - A mirror failure is reported but never changes the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::DeliveryError;
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::model::Event;
use crate::policies::RetryPolicy;
use crate::sink::{Destination, Message, NotificationSink, Notice};

/// Result of offering one notice to the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The primary destination accepted the message.
    Delivered,
    /// Attempts exhausted or the destination is unusable.
    NotDelivered,
    /// The task was cancelled before the sink accepted the message.
    Cancelled,
}

/// Sends notices for event tasks.
#[derive(Clone)]
pub(crate) struct Courier {
    pub sink: Arc<dyn NotificationSink>,
    pub bus: Bus,
    pub retry: RetryPolicy,
    pub mirror_to_group: bool,
}

impl Courier {
    /// Delivers `notice` for `event`, retrying failed attempts with backoff.
    pub(crate) async fn deliver(
        &self,
        event: &Event,
        notice: Notice,
        now: DateTime<Utc>,
        token: &CancellationToken,
    ) -> Delivery {
        let key = notice_key(notice);
        let destination = match Destination::parse(event.destination.as_deref()) {
            Ok(d) => d,
            Err(err) => {
                self.abandon(event, &key, &err);
                return Delivery::NotDelivered;
            }
        };
        let message = Message::render(event, notice, now);

        let mut attempt: u32 = 1;
        loop {
            let res = tokio::select! {
                biased;
                _ = token.cancelled() => return Delivery::Cancelled,
                res = self.sink.send(&destination, &message) => res,
            };

            let err = match res {
                Ok(()) => {
                    self.bus.publish(
                        RuntimeEvent::new(RuntimeEventKind::NoticeDelivered)
                            .with_event(&event.id)
                            .with_key(&key)
                            .with_attempt(attempt),
                    );
                    if let Notice::Reminder(_) = notice {
                        self.mirror(event, &destination, &message, &key, token).await;
                    }
                    return Delivery::Delivered;
                }
                Err(err) => err,
            };

            self.bus.publish(
                RuntimeEvent::new(RuntimeEventKind::DeliveryAttemptFailed)
                    .with_event(&event.id)
                    .with_key(&key)
                    .with_attempt(attempt)
                    .with_reason(err.to_string()),
            );

            if !err.is_retryable() {
                self.abandon(event, &key, &err);
                return Delivery::NotDelivered;
            }

            let Some(delay) = self.retry.delay_after(attempt) else {
                self.abandon(event, &key, &err);
                return Delivery::NotDelivered;
            };

            self.bus.publish(
                RuntimeEvent::new(RuntimeEventKind::BackoffScheduled)
                    .with_event(&event.id)
                    .with_key(&key)
                    .with_attempt(attempt)
                    .with_delay(delay),
            );
            tokio::select! {
                biased;
                _ = token.cancelled() => return Delivery::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Posts a copy to the owner group's reminders destination, once.
    async fn mirror(
        &self,
        event: &Event,
        primary: &Destination,
        message: &Message,
        key: &str,
        token: &CancellationToken,
    ) {
        if !self.mirror_to_group {
            return;
        }
        let Some(group) = Destination::group_reminders(&event.owner_group) else {
            return;
        };
        if &group == primary {
            return;
        }

        let res = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            res = self.sink.send(&group, message) => res,
        };
        if let Err(err) = res {
            self.bus.publish(
                RuntimeEvent::new(RuntimeEventKind::MirrorFailed)
                    .with_event(&event.id)
                    .with_key(key)
                    .with_reason(format!("{group}: {err}")),
            );
        }
    }

    fn abandon(&self, event: &Event, key: &str, err: &DeliveryError) {
        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::DeliveryAbandoned)
                .with_event(&event.id)
                .with_key(key)
                .with_reason(err.as_label()),
        );
    }
}

/// Key used in runtime events: the offset key or `"started"`.
pub(crate) fn notice_key(notice: Notice) -> String {
    match notice {
        Notice::Reminder(offset) => offset.key().to_string(),
        Notice::Started => "started".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventId, Recurrence, ReminderOffset};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::{BTreeMap, BTreeSet, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Scripted {
        failures: Mutex<VecDeque<DeliveryError>>,
        sent: Mutex<Vec<(String, Instant)>>,
    }

    #[async_trait]
    impl NotificationSink for Scripted {
        async fn send(&self, dest: &Destination, _msg: &Message) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((dest.to_string(), Instant::now()));
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn event(destination: Option<&str>) -> Event {
        Event {
            id: EventId::new("ev"),
            name: "Raid".into(),
            description: None,
            owner_group: "ABC".into(),
            start_time: Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap(),
            recurrence: Recurrence::None,
            reminder_offsets: BTreeSet::new(),
            active: true,
            destination: destination.map(str::to_string),
            reminders_sent: BTreeMap::new(),
        }
    }

    fn courier(sink: Arc<Scripted>, mirror: bool) -> Courier {
        Courier {
            sink,
            bus: Bus::new(64),
            retry: RetryPolicy::default(),
            mirror_to_group: mirror,
        }
    }

    fn reminder() -> Notice {
        Notice::Reminder(ReminderOffset::from_minutes(15).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_one_then_two_second_backoff() {
        let sink = Arc::new(Scripted::default());
        sink.failures.lock().unwrap().extend([
            DeliveryError::Transport("reset".into()),
            DeliveryError::Transport("reset".into()),
        ]);
        let c = courier(sink.clone(), false);
        let token = CancellationToken::new();

        let out = c.deliver(&event(Some("chan")), reminder(), Utc::now(), &token).await;
        assert_eq!(out, Delivery::Delivered);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].1 - sent[0].1, Duration::from_secs(1));
        assert_eq!(sent[2].1 - sent[1].1, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_last_attempt() {
        let sink = Arc::new(Scripted::default());
        sink.failures
            .lock()
            .unwrap()
            .extend((0..5).map(|_| DeliveryError::Rejected("503".into())));
        let c = courier(sink.clone(), true);
        let mut rx = c.bus.subscribe();

        let out = c
            .deliver(&event(Some("chan")), reminder(), Utc::now(), &CancellationToken::new())
            .await;
        assert_eq!(out, Delivery::NotDelivered);
        assert_eq!(sink.sent.lock().unwrap().len(), 3);

        let mut abandoned = false;
        while let Ok(ev) = rx.try_recv() {
            abandoned |= ev.kind == RuntimeEventKind::DeliveryAbandoned;
        }
        assert!(abandoned);
    }

    #[tokio::test]
    async fn missing_destination_is_not_retried() {
        let sink = Arc::new(Scripted::default());
        let c = courier(sink.clone(), true);

        let out = c
            .deliver(&event(None), reminder(), Utc::now(), &CancellationToken::new())
            .await;
        assert_eq!(out, Delivery::NotDelivered);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let sink = Arc::new(Scripted::default());
        sink.failures
            .lock()
            .unwrap()
            .push_back(DeliveryError::Transport("reset".into()));
        let c = courier(sink.clone(), false);
        let token = CancellationToken::new();

        let t = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            t.cancel();
        });

        let out = c.deliver(&event(Some("chan")), reminder(), Utc::now(), &token).await;
        assert_eq!(out, Delivery::Cancelled);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reminders_are_mirrored_to_the_group_but_started_is_not() {
        let sink = Arc::new(Scripted::default());
        let c = courier(sink.clone(), true);
        let token = CancellationToken::new();
        let ev = event(Some("chan"));

        c.deliver(&ev, reminder(), Utc::now(), &token).await;
        c.deliver(&ev, Notice::Started, Utc::now(), &token).await;

        let dests: Vec<String> = sink.sent.lock().unwrap().iter().map(|(d, _)| d.clone()).collect();
        assert_eq!(dests, vec!["chan", "abc-reminders", "chan"]);
    }

    struct MirrorDown;

    #[async_trait]
    impl NotificationSink for MirrorDown {
        async fn send(&self, dest: &Destination, _msg: &Message) -> Result<(), DeliveryError> {
            if dest.as_str().ends_with("-reminders") {
                Err(DeliveryError::InvalidDestination(dest.to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn mirror_failure_keeps_the_notice_delivered() {
        let c = Courier {
            sink: Arc::new(MirrorDown),
            bus: Bus::new(64),
            retry: RetryPolicy::default(),
            mirror_to_group: true,
        };
        let mut rx = c.bus.subscribe();

        let out = c
            .deliver(&event(Some("chan")), reminder(), Utc::now(), &CancellationToken::new())
            .await;
        assert_eq!(out, Delivery::Delivered);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![RuntimeEventKind::NoticeDelivered, RuntimeEventKind::MirrorFailed]
        );
    }
}
