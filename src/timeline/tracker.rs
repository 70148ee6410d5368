//! # Reminder tracker: due/window classification.
//!
//! [`ReminderTracker::classify`] places one reminder of one event into one of
//! four dispositions relative to `now` and the catch-up tolerance:
//!
//! ```text
//!            expired        │      due_now       │      pending
//! ──────────────────────────┼─────────┬──────────┼──────────────────► due_time
//!                    now - tolerance  now  now + tolerance
//!
//! already_sent: reminders_sent[key] == true (checked first)
//! ```
//!
//! Both window edges belong to `due_now`.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::{Event, ReminderOffset};

/// Outcome of classifying a reminder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// The canonical key is already recorded as sent.
    AlreadySent,
    /// The due time is further in the past than the tolerance; abandon.
    Expired {
        /// How far past the due time `now` is.
        overdue: Duration,
    },
    /// The due time is inside the tolerance window; deliver immediately.
    DueNow,
    /// The due time is beyond the tolerance window; wait first.
    Pending {
        /// Time left until the due time.
        wait: Duration,
    },
}

/// Classifies reminders against a fixed catch-up tolerance.
#[derive(Clone, Copy, Debug)]
pub struct ReminderTracker {
    tolerance: Duration,
}

impl Default for ReminderTracker {
    /// Tolerance of 60 seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl ReminderTracker {
    /// Creates a tracker with the given catch-up tolerance.
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    /// Returns the configured tolerance.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Classifies the reminder for `offset` of `event` at `now`.
    pub fn classify(
        &self,
        event: &Event,
        offset: &ReminderOffset,
        now: DateTime<Utc>,
    ) -> Disposition {
        if event.is_sent(offset) {
            return Disposition::AlreadySent;
        }

        let due = event.due_time(offset);
        if due >= now {
            let wait = (due - now).to_std().unwrap_or(Duration::ZERO);
            if wait > self.tolerance {
                Disposition::Pending { wait }
            } else {
                Disposition::DueNow
            }
        } else {
            let overdue = (now - due).to_std().unwrap_or(Duration::MAX);
            if overdue > self.tolerance {
                Disposition::Expired { overdue }
            } else {
                Disposition::DueNow
            }
        }
    }
}
