//! # Delivery retry budget.
//!
//! [`RetryPolicy`] bounds how many times one notice is offered to the sink.
//!
//! ```text
//! attempt 1 ─fail─► sleep backoff.next(0) ─► attempt 2 ─fail─► sleep backoff.next(1) ─► attempt 3 ─fail─► give up
//! ```
//!
//! No sleep follows the final attempt.

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Attempt budget and backoff for one delivery.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// Returns 3 attempts with [`BackoffPolicy::default`].
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// Attempt budget clamped to at least one.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-based), or `None` if it was the last.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempts() {
            None
        } else {
            Some(self.backoff.next(attempt.saturating_sub(1)))
        }
    }
}
