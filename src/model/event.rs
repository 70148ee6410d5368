//! # Scheduled events: wire document and validated form.
//!
//! The store hands out loosely typed [`EventDocument`]s (optional fields, legacy
//! aliases, recurrence as free text). The scheduler converts each one into a
//! strongly typed [`Event`] exactly once, at the store boundary:
//!
//! ```text
//! EventStore ──► EventDocument ──TryFrom──► Event ──► EventActor
//!                                   │
//!                                   └─► EventError (logged, skipped, retried next tick)
//! ```
//!
//! ## Rules
//! - `reminders_sent` keys outside the event's offsets are dropped on conversion
//! - a missing key means "not sent"
//! - `reminder_hours` (fractional hours) is accepted alongside `reminder_offsets`;
//!   their legacy `reminders_sent` keys (`"2.0h"`, `"1.5h"`) map to canonical keys
//! - `destination` (alias `channel_id`) may be a string or an integer id

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EventError;
use crate::model::offset::{OffsetKey, ReminderOffset};

/// Opaque event identifier, stable across recurrences.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Recurrence rule of an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Recurrence {
    /// One-off event.
    #[default]
    None,
    /// Every day.
    Daily,
    /// Every second day.
    EveryTwoDays,
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Same day of the next calendar month.
    Monthly,
}

impl Recurrence {
    /// Canonical rule name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::EveryTwoDays => "every_2_days",
            Recurrence::Weekly => "weekly",
            Recurrence::Biweekly => "biweekly",
            Recurrence::Monthly => "monthly",
        }
    }

    /// Returns `true` for every rule except [`Recurrence::None`].
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "every_2_days" | "2days" => Ok(Recurrence::EveryTwoDays),
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => Err(EventError::UnknownRecurrence(s.to_string())),
        }
    }
}

impl TryFrom<String> for Recurrence {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Recurrence> for String {
    fn from(value: Recurrence) -> Self {
        value.as_str().to_string()
    }
}

fn default_active() -> bool {
    true
}

/// Destination as stored: a string, or a numeric channel id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDestination {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

fn deserialize_destination<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDestination>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        RawDestination::Text(s) => s,
        RawDestination::Unsigned(n) => n.to_string(),
        RawDestination::Signed(n) => n.to_string(),
    }))
}

/// Event as persisted by the store (loosely typed).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    /// Document identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional display description.
    #[serde(default)]
    pub description: Option<String>,
    /// Community the event belongs to.
    #[serde(default, alias = "alliance")]
    pub owner_group: String,
    /// Next (or only) occurrence, UTC.
    pub start_time: DateTime<Utc>,
    /// Recurrence rule as free text.
    #[serde(default, alias = "recurring")]
    pub recurrence: Option<String>,
    /// Canonical offset keys (`"15m"`, `"2h"`).
    #[serde(default)]
    pub reminder_offsets: Vec<String>,
    /// Legacy offsets in fractional hours.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminder_hours: Vec<f64>,
    /// Inactive events are never scheduled.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Notification target.
    #[serde(
        default,
        alias = "channel_id",
        deserialize_with = "deserialize_destination"
    )]
    pub destination: Option<String>,
    /// Delivery state keyed by canonical offset key.
    #[serde(default)]
    pub reminders_sent: BTreeMap<String, bool>,
}

/// Validated event, ready for scheduling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub owner_group: String,
    pub start_time: DateTime<Utc>,
    pub recurrence: Recurrence,
    pub reminder_offsets: BTreeSet<ReminderOffset>,
    pub active: bool,
    /// Raw destination; validated by the delivery path.
    pub destination: Option<String>,
    pub reminders_sent: BTreeMap<OffsetKey, bool>,
}

impl Event {
    /// Returns `true` if the reminder for `offset` is recorded as sent.
    pub fn is_sent(&self, offset: &ReminderOffset) -> bool {
        self.reminders_sent
            .get(&offset.key())
            .copied()
            .unwrap_or(false)
    }

    /// Offsets sorted largest first (earliest reminder first).
    pub fn offsets_desc(&self) -> impl Iterator<Item = ReminderOffset> + '_ {
        self.reminder_offsets.iter().rev().copied()
    }

    /// Instant at which the reminder for `offset` is due.
    pub fn due_time(&self, offset: &ReminderOffset) -> DateTime<Utc> {
        self.start_time
            .checked_sub_signed(offset.as_chrono())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl TryFrom<EventDocument> for Event {
    type Error = EventError;

    fn try_from(doc: EventDocument) -> Result<Self, Self::Error> {
        if doc.id.trim().is_empty() {
            return Err(EventError::EmptyId);
        }

        let recurrence = match doc.recurrence.as_deref() {
            Some(rule) => rule.parse()?,
            None => Recurrence::None,
        };

        let mut offsets = BTreeSet::new();
        for raw in &doc.reminder_offsets {
            offsets.insert(raw.parse::<ReminderOffset>()?);
        }
        let mut legacy_keys = Vec::with_capacity(doc.reminder_hours.len());
        for hours in &doc.reminder_hours {
            let offset = ReminderOffset::from_fractional_hours(*hours)?;
            legacy_keys.push((ReminderOffset::legacy_hours_key(*hours), offset.key()));
            offsets.insert(offset);
        }

        let mut known: BTreeMap<String, OffsetKey> = offsets
            .iter()
            .map(|o| (o.key().to_string(), o.key()))
            .collect();
        known.extend(legacy_keys);

        // A flag recorded under either spelling counts as sent.
        let mut reminders_sent = BTreeMap::new();
        for (raw, sent) in doc.reminders_sent {
            if let Some(key) = known.get(&raw) {
                *reminders_sent.entry(key.clone()).or_insert(false) |= sent;
            }
        }

        Ok(Event {
            id: EventId(doc.id),
            name: doc.name,
            description: doc.description.filter(|d| !d.trim().is_empty()),
            owner_group: doc.owner_group,
            start_time: doc.start_time,
            recurrence,
            reminder_offsets: offsets,
            active: doc.active,
            destination: doc.destination,
            reminders_sent,
        })
    }
}

impl From<&Event> for EventDocument {
    fn from(ev: &Event) -> Self {
        EventDocument {
            id: ev.id.0.clone(),
            name: ev.name.clone(),
            description: ev.description.clone(),
            owner_group: ev.owner_group.clone(),
            start_time: ev.start_time,
            recurrence: ev
                .recurrence
                .is_recurring()
                .then(|| ev.recurrence.to_string()),
            reminder_offsets: ev.reminder_offsets.iter().map(|o| o.to_string()).collect(),
            reminder_hours: Vec::new(),
            active: ev.active,
            destination: ev.destination.clone(),
            reminders_sent: ev
                .reminders_sent
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc() -> EventDocument {
        EventDocument {
            id: "ev-1".into(),
            name: "Raid".into(),
            description: Some("bring potions".into()),
            owner_group: "ABC".into(),
            start_time: Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap(),
            recurrence: Some("weekly".into()),
            reminder_offsets: vec!["15m".into(), "2h".into()],
            reminder_hours: vec![],
            active: true,
            destination: Some("chan-1".into()),
            reminders_sent: BTreeMap::new(),
        }
    }

    #[test]
    fn converts_valid_document() {
        let ev = Event::try_from(doc()).unwrap();
        assert_eq!(ev.recurrence, Recurrence::Weekly);
        let keys: Vec<_> = ev.offsets_desc().map(|o| o.key().to_string()).collect();
        assert_eq!(keys, ["2h", "15m"]);
    }

    #[test]
    fn legacy_aliases_and_hours_are_accepted() {
        let json = r#"{
            "_id": "ev-9",
            "name": "War",
            "alliance": "XYZ",
            "start_time": "2026-01-01T10:00:00Z",
            "recurring": "2days",
            "reminder_hours": [0.25, 24],
            "channel_id": "12345",
            "reminders_sent": {"15m": true, "3h": true}
        }"#;
        let doc: EventDocument = serde_json::from_str(json).unwrap();
        let ev = Event::try_from(doc).unwrap();

        assert_eq!(ev.owner_group, "XYZ");
        assert_eq!(ev.recurrence, Recurrence::EveryTwoDays);
        assert_eq!(ev.destination.as_deref(), Some("12345"));
        assert!(ev.active);
        assert_eq!(ev.reminder_offsets.len(), 2);
        // "3h" is not one of the event's offsets
        assert_eq!(ev.reminders_sent.len(), 1);
        assert!(ev.is_sent(&ReminderOffset::from_minutes(15).unwrap()));
    }

    #[test]
    fn legacy_hour_keys_count_as_sent() {
        let json = r#"{
            "_id": "ev-10",
            "name": "War",
            "start_time": "2026-01-01T10:00:00Z",
            "reminder_hours": [2.0, 1.5, 24],
            "channel_id": 1375476122061508619,
            "reminders_sent": {"2.0h": true, "1.5h": true, "24h": false, "24.0h": true}
        }"#;
        let doc: EventDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.destination.as_deref(), Some("1375476122061508619"));

        let ev = Event::try_from(doc).unwrap();
        assert!(ev.is_sent(&ReminderOffset::from_hours(2).unwrap()));
        assert!(ev.is_sent(&ReminderOffset::from_minutes(90).unwrap()));
        assert!(ev.is_sent(&ReminderOffset::from_hours(24).unwrap()));
        let keys: Vec<_> = ev.reminders_sent.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["24h", "2h", "90m"]);
    }

    #[test]
    fn destination_accepts_strings_numbers_and_null() {
        let parse = |dest: &str| {
            let json = format!(
                r#"{{"id": "e", "name": "n", "start_time": "2026-01-01T10:00:00Z", "destination": {dest}}}"#
            );
            serde_json::from_str::<EventDocument>(&json).unwrap().destination
        };
        assert_eq!(parse(r#""chan""#).as_deref(), Some("chan"));
        assert_eq!(parse("42").as_deref(), Some("42"));
        assert_eq!(parse("-7").as_deref(), Some("-7"));
        assert_eq!(parse("null"), None);
    }

    #[test]
    fn unknown_recurrence_is_rejected() {
        let mut d = doc();
        d.recurrence = Some("hourly".into());
        assert_eq!(
            Event::try_from(d),
            Err(EventError::UnknownRecurrence("hourly".into()))
        );
    }

    #[test]
    fn bad_offset_is_rejected() {
        let mut d = doc();
        d.reminder_offsets.push("soon".into());
        assert!(matches!(
            Event::try_from(d),
            Err(EventError::InvalidOffset(_))
        ));
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut d = doc();
        d.id = "  ".into();
        assert_eq!(Event::try_from(d), Err(EventError::EmptyId));
    }

    #[test]
    fn due_time_subtracts_offset() {
        let ev = Event::try_from(doc()).unwrap();
        let off = ReminderOffset::from_hours(2).unwrap();
        assert_eq!(
            ev.due_time(&off),
            Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn document_roundtrip_keeps_schedule() {
        let ev = Event::try_from(doc()).unwrap();
        let back = Event::try_from(EventDocument::from(&ev)).unwrap();
        assert_eq!(ev, back);
    }
}
