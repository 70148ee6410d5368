//! # Scheduler configuration.
//!
//! [`SchedulerConfig`] gathers every tunable of the runtime. All fields have
//! defaults, so an empty TOML document is a valid configuration.
//!
//! ```toml
//! poll_interval_secs = 60
//! tolerance_secs = 60
//! max_attempts = 3
//! backoff_first_ms = 1000
//! backoff_factor = 2.0
//! backoff_max_ms = 30000
//! jitter = "none"          # none | full | equal | decorrelated
//! bus_capacity = 1024
//! grace_secs = 10
//! mirror_to_group = true
//! ```
//!
//! ## Sentinel values
//! - `poll_interval_secs = 0` is clamped to 1 second by [`SchedulerConfig::poll_interval`]
//! - `max_attempts = 0` behaves like 1 (see [`RetryPolicy::attempts`])
//! - `bus_capacity = 0` is clamped to 1 by the bus

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
use crate::timeline::ReminderTracker;

/// Runtime configuration of the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two supervisor ticks.
    pub poll_interval_secs: u64,
    /// Catch-up tolerance in seconds.
    pub tolerance_secs: u64,
    /// Delivery attempts per notice, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt, in milliseconds.
    pub backoff_first_ms: u64,
    /// Multiplicative growth of the delay per failed attempt.
    pub backoff_factor: f64,
    /// Upper bound of a single delay, in milliseconds.
    pub backoff_max_ms: u64,
    /// Randomization applied to delays.
    pub jitter: JitterPolicy,
    /// Runtime event ring buffer size.
    pub bus_capacity: usize,
    /// Seconds `stop()` waits for tasks to exit.
    pub grace_secs: u64,
    /// Also post reminders to the owner group's reminders destination.
    pub mirror_to_group: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            tolerance_secs: 60,
            max_attempts: 3,
            backoff_first_ms: 1_000,
            backoff_factor: 2.0,
            backoff_max_ms: 30_000,
            jitter: JitterPolicy::None,
            bus_capacity: 1024,
            grace_secs: 10,
            mirror_to_group: true,
        }
    }
}

impl SchedulerConfig {
    /// Parses a TOML document; missing keys take their defaults.
    ///
    /// # Example
    /// ```rust
    /// use std::time::Duration;
    /// use remindvisor::SchedulerConfig;
    ///
    /// let cfg = SchedulerConfig::from_toml_str("poll_interval_secs = 30").unwrap();
    /// assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
    /// assert_eq!(cfg.max_attempts, 3);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Interval between supervisor ticks (at least one second).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Catch-up tolerance.
    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }

    /// Grace period for `stop()`.
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    /// Backoff schedule between delivery attempts.
    pub fn backoff(&self) -> BackoffPolicy {
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        BackoffPolicy {
            first: Duration::from_millis(self.backoff_first_ms),
            max: Duration::from_millis(self.backoff_max_ms.max(self.backoff_first_ms)),
            factor,
            jitter: self.jitter,
        }
    }

    /// Attempt budget and backoff for one delivery.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff(),
        }
    }

    /// Reminder tracker using the configured tolerance.
    pub fn tracker(&self) -> ReminderTracker {
        ReminderTracker::new(self.tolerance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let cfg = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SchedulerConfig::default());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(60));
        assert_eq!(cfg.tracker().tolerance(), Duration::from_secs(60));
    }

    #[test]
    fn default_retry_policy_waits_one_then_two_seconds() {
        let retry = SchedulerConfig::default().retry_policy();
        assert_eq!(retry.attempts(), 3);
        assert_eq!(retry.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(retry.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(retry.delay_after(3), None);
    }

    #[test]
    fn parses_jitter_and_overrides() {
        let cfg = SchedulerConfig::from_toml_str(
            "jitter = \"equal\"\nmax_attempts = 5\nmirror_to_group = false\n",
        )
        .unwrap();
        assert_eq!(cfg.jitter, JitterPolicy::Equal);
        assert_eq!(cfg.retry_policy().attempts(), 5);
        assert!(!cfg.mirror_to_group);
    }

    #[test]
    fn rejects_wrong_types() {
        let err = SchedulerConfig::from_toml_str("tolerance_secs = \"soon\"").unwrap_err();
        assert_eq!(err.as_label(), "config_parse");
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = SchedulerConfig {
            poll_interval_secs: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "grace_secs = 3").unwrap();
        let cfg = SchedulerConfig::load(file.path()).unwrap();
        assert_eq!(cfg.grace(), Duration::from_secs(3));

        let missing = SchedulerConfig::load(file.path().with_extension("missing")).unwrap_err();
        assert_eq!(missing.as_label(), "config_io");
    }
}
