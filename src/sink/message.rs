//! # Notices and their rendered messages.
//!
//! A [`Notice`] is what the scheduler wants to say; a [`Message`] is the
//! sink-agnostic rendering of it (title, body, optional fields, timestamp).
//! Sinks map `Message` onto their own format (embed, e-mail, plain text).
//!
//! ```text
//! Notice::Reminder(15m) ─► "Event Reminder"  "**Raid** starts in 15 minutes!"
//! Notice::Started       ─► "Event Started!"  "**Raid** has started! Good luck to all participants!"
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

use crate::model::{Event, ReminderOffset};

/// What is being announced for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Reminder `offset` before the start.
    Reminder(ReminderOffset),
    /// The event has started.
    Started,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Reminder(offset) => write!(f, "reminder:{}", offset.key()),
            Notice::Started => f.write_str("started"),
        }
    }
}

/// Visual tone of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Upcoming event.
    Reminder,
    /// Event in progress.
    Started,
}

/// Sink-agnostic rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
    /// Named extra fields, in display order.
    pub fields: Vec<(String, String)>,
    /// Timestamp to display alongside the message.
    pub timestamp: DateTime<Utc>,
    pub footer: Option<String>,
    pub tone: Tone,
}

impl Message {
    /// Renders `notice` for `event`; `now` stamps the started notice.
    pub fn render(event: &Event, notice: Notice, now: DateTime<Utc>) -> Self {
        let mut fields = Vec::new();
        if let Some(desc) = &event.description {
            fields.push(("Description".to_string(), desc.clone()));
        }

        match notice {
            Notice::Reminder(offset) => Message {
                title: "\u{23f0} Event Reminder".to_string(),
                body: format!("**{}** starts in {}!", event.name, offset.humanize()),
                fields,
                timestamp: event.start_time,
                footer: Some("Event starts at".to_string()),
                tone: Tone::Reminder,
            },
            Notice::Started => Message {
                title: "\u{1f680} Event Started!".to_string(),
                body: format!(
                    "**{}** has started! Good luck to all participants!",
                    event.name
                ),
                fields,
                timestamp: now,
                footer: None,
                tone: Tone::Started,
            },
        }
    }

    /// Plain-text rendering for sinks without rich formatting.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("{}\n{}", self.title, self.body);
        for (name, value) in &self.fields {
            out.push_str(&format!("\n{name}: {value}"));
        }
        match &self.footer {
            Some(footer) => out.push_str(&format!("\n{footer} {}", self.timestamp.to_rfc2822())),
            None => out.push_str(&format!("\n{}", self.timestamp.to_rfc2822())),
        }
        out
    }
}
