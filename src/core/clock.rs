//! # Wall-clock source for the scheduler.
//!
//! All "now" decisions (rollover, classification, wait lengths) go through a
//! [`Clock`]. Sleeping always uses `tokio::time`, so pausing tokio time in tests
//! moves both together when [`TokioClock`] is used.
//!
//! - [`SystemClock`]: `chrono::Utc::now()`
//! - [`TokioClock`]: a fixed anchor plus the elapsed [`tokio::time::Instant`]

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of the current UTC time.
pub trait Clock: Send + Sync + Debug + 'static {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock driven by tokio's (possibly paused) timer.
///
/// `now()` is `anchor + (Instant::now() - created)`.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use remindvisor::{Clock, TokioClock};
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
/// let clock = TokioClock::new(anchor);
/// tokio::time::sleep(Duration::from_secs(90)).await;
/// assert_eq!(clock.now(), anchor + chrono::Duration::seconds(90));
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    created: Instant,
}

impl TokioClock {
    /// Starts the clock at `anchor`. Must be called inside a tokio runtime.
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            created: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.created.elapsed())
            .unwrap_or(chrono::Duration::MAX);
        self.anchor
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
