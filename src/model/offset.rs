//! # Reminder offsets and their canonical persistence keys.
//!
//! A [`ReminderOffset`] is a positive duration measured before an event's start.
//! Its [`OffsetKey`] is the short string under which `reminders_sent` records
//! delivery, derived deterministically so persisted state survives restarts and
//! offset-list edits that keep the same offsets:
//!
//! ```text
//! whole hours    → "{h}h"   (2h, 24h)
//! whole minutes  → "{m}m"   (15m, 90m)
//! anything else  → "{s}s"   (45s)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use remindvisor::ReminderOffset;
//!
//! let off = ReminderOffset::from_minutes(15).unwrap();
//! assert_eq!(off.key().as_str(), "15m");
//! assert_eq!(off.as_duration(), Duration::from_secs(900));
//!
//! let parsed: ReminderOffset = "2h".parse().unwrap();
//! assert_eq!(parsed.key().as_str(), "2h");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EventError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Canonical key identifying a reminder offset in `reminders_sent`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetKey(String);

impl OffsetKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OffsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OffsetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Positive duration before an event's start at which a reminder is due.
///
/// Stored with whole-second precision. Ordering follows the duration, so the
/// largest offset (earliest reminder in time) sorts last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderOffset {
    secs: u64,
}

impl ReminderOffset {
    /// Creates an offset from whole seconds; zero is rejected.
    pub fn from_secs(secs: u64) -> Result<Self, EventError> {
        if secs == 0 {
            return Err(EventError::NonPositiveOffset(format!("{secs}s")));
        }
        Ok(Self { secs })
    }

    /// Creates an offset from whole minutes.
    pub fn from_minutes(minutes: u64) -> Result<Self, EventError> {
        Self::from_secs(minutes.saturating_mul(MINUTE))
    }

    /// Creates an offset from whole hours.
    pub fn from_hours(hours: u64) -> Result<Self, EventError> {
        Self::from_secs(hours.saturating_mul(HOUR))
    }

    /// Creates an offset from fractional hours (`0.25` → 15 minutes).
    ///
    /// Rounded to the nearest second.
    pub fn from_fractional_hours(hours: f64) -> Result<Self, EventError> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(EventError::NonPositiveOffset(format!("{hours}h")));
        }
        let secs = (hours * HOUR as f64).round();
        if secs > u64::MAX as f64 {
            return Err(EventError::InvalidOffset(format!("{hours}h")));
        }
        Self::from_secs(secs as u64)
    }

    /// Key under which legacy documents recorded a `reminder_hours` entry.
    ///
    /// Quarter and half hours were stored as `"15m"`/`"30m"`; every other
    /// value as the float followed by `h` (`2.0` → `"2.0h"`, `1.5` → `"1.5h"`).
    pub(crate) fn legacy_hours_key(hours: f64) -> String {
        if hours == 0.25 {
            "15m".to_string()
        } else if hours == 0.5 {
            "30m".to_string()
        } else if hours.fract() == 0.0 && hours.abs() < 1e16 {
            format!("{hours:.1}h")
        } else {
            format!("{hours}h")
        }
    }

    /// Returns the offset as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }

    /// Returns the offset as a chrono duration for timestamp arithmetic.
    pub fn as_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.secs).unwrap_or(i64::MAX))
    }

    /// Returns the whole number of seconds.
    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    /// Derives the canonical persistence key.
    pub fn key(&self) -> OffsetKey {
        let key = if self.secs % HOUR == 0 {
            format!("{}h", self.secs / HOUR)
        } else if self.secs % MINUTE == 0 {
            format!("{}m", self.secs / MINUTE)
        } else {
            format!("{}s", self.secs)
        };
        OffsetKey(key)
    }

    /// Human-readable form used in reminder messages (`1 hour 30 minutes`).
    pub fn humanize(&self) -> String {
        fn unit(n: u64, singular: &str) -> String {
            if n == 1 {
                format!("1 {singular}")
            } else {
                format!("{n} {singular}s")
            }
        }

        let hours = self.secs / HOUR;
        let minutes = (self.secs % HOUR) / MINUTE;
        let seconds = self.secs % MINUTE;

        let mut parts = Vec::with_capacity(3);
        if hours > 0 {
            parts.push(unit(hours, "hour"));
        }
        if minutes > 0 {
            parts.push(unit(minutes, "minute"));
        }
        if seconds > 0 {
            parts.push(unit(seconds, "second"));
        }
        parts.join(" ")
    }
}

impl fmt::Display for ReminderOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().as_str())
    }
}

impl FromStr for ReminderOffset {
    type Err = EventError;

    /// Parses `"<n><unit>"` where unit is one of `s`, `m`, `h`, `d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || EventError::InvalidOffset(s.to_string());

        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = raw.split_at(split);
        if digits.is_empty() {
            return Err(invalid());
        }
        let n: u64 = digits.parse().map_err(|_| invalid())?;

        let scale = match unit {
            "s" => 1,
            "m" => MINUTE,
            "h" => HOUR,
            "d" => DAY,
            _ => return Err(invalid()),
        };
        let secs = n.checked_mul(scale).ok_or_else(invalid)?;
        Self::from_secs(secs).map_err(|_| EventError::NonPositiveOffset(s.to_string()))
    }
}

impl TryFrom<String> for ReminderOffset {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReminderOffset> for String {
    fn from(value: ReminderOffset) -> Self {
        value.key().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_hours_keys_keep_the_float_form() {
        assert_eq!(ReminderOffset::legacy_hours_key(0.25), "15m");
        assert_eq!(ReminderOffset::legacy_hours_key(0.5), "30m");
        assert_eq!(ReminderOffset::legacy_hours_key(2.0), "2.0h");
        assert_eq!(ReminderOffset::legacy_hours_key(24.0), "24.0h");
        assert_eq!(ReminderOffset::legacy_hours_key(1.5), "1.5h");
        assert_eq!(ReminderOffset::legacy_hours_key(0.75), "0.75h");
    }

    #[test]
    fn keys_prefer_the_largest_whole_unit() {
        assert_eq!(ReminderOffset::from_minutes(15).unwrap().key().as_str(), "15m");
        assert_eq!(ReminderOffset::from_minutes(120).unwrap().key().as_str(), "2h");
        assert_eq!(ReminderOffset::from_minutes(90).unwrap().key().as_str(), "90m");
        assert_eq!(ReminderOffset::from_hours(24).unwrap().key().as_str(), "24h");
        assert_eq!(ReminderOffset::from_secs(45).unwrap().key().as_str(), "45s");
    }

    #[test]
    fn parse_accepts_every_unit() {
        assert_eq!("30m".parse::<ReminderOffset>().unwrap().as_secs(), 1800);
        assert_eq!("1d".parse::<ReminderOffset>().unwrap().key().as_str(), "24h");
        assert_eq!(" 2h ".parse::<ReminderOffset>().unwrap().as_secs(), 7200);
        assert_eq!("90s".parse::<ReminderOffset>().unwrap().key().as_str(), "90s");
    }

    #[test]
    fn parse_rejects_garbage_and_zero() {
        assert!(matches!(
            "".parse::<ReminderOffset>(),
            Err(EventError::InvalidOffset(_))
        ));
        assert!(matches!(
            "15".parse::<ReminderOffset>(),
            Err(EventError::InvalidOffset(_))
        ));
        assert!(matches!(
            "h".parse::<ReminderOffset>(),
            Err(EventError::InvalidOffset(_))
        ));
        assert!(matches!(
            "5w".parse::<ReminderOffset>(),
            Err(EventError::InvalidOffset(_))
        ));
        assert!(matches!(
            "0m".parse::<ReminderOffset>(),
            Err(EventError::NonPositiveOffset(_))
        ));
    }

    #[test]
    fn fractional_hours_match_legacy_documents() {
        let quarter = ReminderOffset::from_fractional_hours(0.25).unwrap();
        assert_eq!(quarter.key().as_str(), "15m");
        let half = ReminderOffset::from_fractional_hours(0.5).unwrap();
        assert_eq!(half.key().as_str(), "30m");
        assert!(ReminderOffset::from_fractional_hours(-1.0).is_err());
        assert!(ReminderOffset::from_fractional_hours(f64::NAN).is_err());
    }

    #[test]
    fn humanize_handles_mixed_units() {
        assert_eq!(ReminderOffset::from_minutes(15).unwrap().humanize(), "15 minutes");
        assert_eq!(ReminderOffset::from_hours(1).unwrap().humanize(), "1 hour");
        assert_eq!(
            ReminderOffset::from_minutes(90).unwrap().humanize(),
            "1 hour 30 minutes"
        );
    }

    #[test]
    fn ordering_follows_duration() {
        let mut offs = vec![
            ReminderOffset::from_minutes(15).unwrap(),
            ReminderOffset::from_hours(24).unwrap(),
            ReminderOffset::from_hours(2).unwrap(),
        ];
        offs.sort_unstable_by(|a, b| b.cmp(a));
        let keys: Vec<_> = offs.iter().map(|o| o.key().to_string()).collect();
        assert_eq!(keys, ["24h", "2h", "15m"]);
    }
}
