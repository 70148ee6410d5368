//! # Recurrence calculator.
//!
//! [`next_occurrence`] is the single place where recurrence periods are defined:
//!
//! | Rule           | Period                 |
//! |----------------|------------------------|
//! | `daily`        | 1 day                  |
//! | `every_2_days` | 2 days                 |
//! | `weekly`       | 7 days                 |
//! | `biweekly`     | 14 days                |
//! | `monthly`      | 1 calendar month       |
//! | `none`         | no next occurrence     |
//!
//! Monthly steps are always taken from the original start (`start + n months`),
//! so a day-of-month clamped in a short month (Jan 31 → Feb 28) springs back
//! in longer months (→ Mar 31). December rolls over into January of the next year.
//!
//! ## Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use remindvisor::{Recurrence, next_occurrence};
//!
//! let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
//! let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
//!
//! let next = next_occurrence(start, Recurrence::Weekly, now).unwrap();
//! assert_eq!(next, Some(Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap()));
//!
//! assert_eq!(next_occurrence(start, Recurrence::None, now).unwrap(), None);
//! ```

use chrono::{DateTime, Duration, Months, Utc};

use crate::error::RecurrenceError;
use crate::model::Recurrence;

/// Fixed-length period of a rule, `None` for calendar-based or non-recurring rules.
fn fixed_period(rule: Recurrence) -> Option<Duration> {
    match rule {
        Recurrence::Daily => Some(Duration::days(1)),
        Recurrence::EveryTwoDays => Some(Duration::days(2)),
        Recurrence::Weekly => Some(Duration::days(7)),
        Recurrence::Biweekly => Some(Duration::days(14)),
        Recurrence::Monthly | Recurrence::None => None,
    }
}

/// Returns the first occurrence of `rule` starting at `start` that is strictly after `now`.
///
/// - `Ok(None)` for [`Recurrence::None`].
/// - If `start` is already after `now` it is returned unchanged.
/// - Deterministic and side-effect free.
pub fn next_occurrence(
    start: DateTime<Utc>,
    rule: Recurrence,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, RecurrenceError> {
    if !rule.is_recurring() {
        return Ok(None);
    }
    if start > now {
        return Ok(Some(start));
    }

    if let Some(period) = fixed_period(rule) {
        let period_secs = period.num_seconds();
        let behind = now.signed_duration_since(start).num_seconds();
        let steps = behind / period_secs + 1;
        let advance = period_secs
            .checked_mul(steps)
            .and_then(Duration::try_seconds)
            .ok_or(RecurrenceError::Overflow)?;
        let next = start
            .checked_add_signed(advance)
            .ok_or(RecurrenceError::Overflow)?;
        return Ok(Some(next));
    }

    let mut months: u32 = 1;
    loop {
        let next = start
            .checked_add_months(Months::new(months))
            .ok_or(RecurrenceError::Overflow)?;
        if next > now {
            return Ok(Some(next));
        }
        months = months.checked_add(1).ok_or(RecurrenceError::Overflow)?;
    }
}
