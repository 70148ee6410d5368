//! Error types used by the scheduler runtime and its collaborators.
//!
//! - [`StoreError`] — failures of the event store adapter (transient, never fatal).
//! - [`DeliveryError`] — failures of the notification sink.
//! - [`EventError`] — an event document that cannot be scheduled as-is.
//! - [`RecurrenceError`] — calendar arithmetic left the representable range.
//! - [`ConfigError`] — configuration file could not be read or parsed.
//! - [`RuntimeError`] — the supervisor could not shut down or listen for signals.
//!
//! Every enum provides `as_label` (stable snake_case, for logs/metrics).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by an [`EventStore`](crate::EventStore) implementation.
///
/// The scheduler treats all of them as transient: a failed read is retried on
/// the next tick, a failed write is left for the next task rebuild.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write targeted a document that does not exist.
    #[error("event {id} not found")]
    NotFound {
        /// Identifier of the missing document.
        id: String,
    },

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use remindvisor::StoreError;
    ///
    /// let err = StoreError::NotFound { id: "ev-1".into() };
    /// assert_eq!(err.as_label(), "store_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "store_unavailable",
            StoreError::NotFound { .. } => "store_not_found",
            StoreError::Backend(_) => "store_backend",
        }
    }
}

/// # Errors produced by a [`NotificationSink`](crate::NotificationSink).
///
/// The sink only has to distinguish failure from success; the variants exist so
/// that destination problems skip the retry loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The event has no destination configured.
    #[error("event has no destination")]
    MissingDestination,

    /// The destination does not resolve to a deliverable target.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// The target refused the message.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// Network or transport failure; may succeed if retried.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::MissingDestination => "delivery_missing_destination",
            DeliveryError::InvalidDestination(_) => "delivery_invalid_destination",
            DeliveryError::Rejected(_) => "delivery_rejected",
            DeliveryError::Transport(_) => "delivery_transport",
        }
    }

    /// Indicates whether another attempt may succeed.
    ///
    /// Destination problems are permanent for the current event document.
    ///
    /// # Example
    /// ```
    /// use remindvisor::DeliveryError;
    ///
    /// assert!(DeliveryError::Transport("reset".into()).is_retryable());
    /// assert!(!DeliveryError::MissingDestination.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Rejected(_) | DeliveryError::Transport(_)
        )
    }
}

/// # Errors raised while validating an event document.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Document has an empty identifier.
    #[error("event id is empty")]
    EmptyId,

    /// Recurrence rule is not one of the supported periods.
    #[error("unrecognized recurrence rule {0:?}")]
    UnknownRecurrence(String),

    /// Reminder offset could not be parsed.
    #[error("invalid reminder offset {0:?}")]
    InvalidOffset(String),

    /// Reminder offset is zero or negative.
    #[error("reminder offset must be positive, got {0:?}")]
    NonPositiveOffset(String),
}

impl EventError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::EmptyId => "event_empty_id",
            EventError::UnknownRecurrence(_) => "event_unknown_recurrence",
            EventError::InvalidOffset(_) => "event_invalid_offset",
            EventError::NonPositiveOffset(_) => "event_non_positive_offset",
        }
    }
}

/// # Errors raised by the recurrence calculator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// Advancing the start time left chrono's representable range.
    #[error("next occurrence is out of range")]
    Overflow,
}

impl RecurrenceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RecurrenceError::Overflow => "recurrence_overflow",
        }
    }
}

/// # Errors raised while loading [`SchedulerConfig`](crate::SchedulerConfig).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse(_) => "config_parse",
        }
    }
}

/// # Errors produced by the supervisor runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Some event tasks did not exit within the grace period and were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of the events whose tasks were still running.
        stuck: Vec<String>,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use remindvisor::RuntimeError;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}
