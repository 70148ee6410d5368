//! # Notification sink contract.
//!
//! The sink is the external messaging target (a chat channel, a webhook, ...).
//! It accepts a rendered [`Message`] for a [`Destination`] and may fail
//! transiently; the scheduler owns retries.
//!
//! ## Destinations
//! Event documents carry a raw destination string. It is validated by
//! [`Destination::parse`] right before delivery; a missing or invalid
//! destination is a non-retried failure. Owner groups additionally map to a
//! reminders destination (`"{group}-reminders"`, lowercased) used as a
//! best-effort mirror.

mod message;

use std::fmt;

use async_trait::async_trait;

use crate::error::DeliveryError;

pub use message::{Message, Notice, Tone};

/// Validated notification target identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    /// Validates a raw destination.
    ///
    /// Rejects absent, empty and whitespace-containing identifiers.
    ///
    /// # Example
    /// ```
    /// use remindvisor::{Destination, DeliveryError};
    ///
    /// assert!(Destination::parse(Some("1375476122061508619")).is_ok());
    /// assert_eq!(Destination::parse(None), Err(DeliveryError::MissingDestination));
    /// assert!(matches!(
    ///     Destination::parse(Some("two words")),
    ///     Err(DeliveryError::InvalidDestination(_))
    /// ));
    /// ```
    pub fn parse(raw: Option<&str>) -> Result<Self, DeliveryError> {
        let raw = raw.ok_or(DeliveryError::MissingDestination)?.trim();
        if raw.is_empty() {
            return Err(DeliveryError::MissingDestination);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(DeliveryError::InvalidDestination(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Reminders destination of an owner group, or `None` for an empty group.
    pub fn group_reminders(group: &str) -> Option<Self> {
        let group = group.trim();
        if group.is_empty() || group.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(format!("{}-reminders", group.to_lowercase())))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External messaging target.
///
/// ### Implementation requirements
/// - Return `Err` for any failure; the error kind only steers retrying.
/// - Do not retry internally; the scheduler applies its own policy.
/// - Use async I/O; calls may be cancelled mid-flight.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Sends one message to one destination.
    async fn send(&self, destination: &Destination, message: &Message) -> Result<(), DeliveryError>;
}
