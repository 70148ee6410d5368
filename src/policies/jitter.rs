//! # Jitter for retry delays.
//!
//! When a shared sink has a hiccup, every event task whose reminder was due at
//! that moment fails at once. [`JitterPolicy`] spreads their retries apart.
//!
//! - [`JitterPolicy::None`] exact backoff delay (default)
//! - [`JitterPolicy::Full`] random in `[0, delay]`
//! - [`JitterPolicy::Equal`] `delay/2 + random[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`] random in `[base, prev × 3]`, capped at max

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Randomization strategy applied to backoff delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterPolicy {
    /// Use the computed delay as is.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Uniform in `[delay/2, delay]`.
    Equal,
    /// Uniform in `[base, prev × 3]`, capped at the policy maximum.
    ///
    /// Needs extra context, see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` returns the input unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => full(delay),
            JitterPolicy::Equal => equal(delay),
        }
    }

    /// Applies decorrelated jitter; other policies fall back to [`apply`](Self::apply) on `prev`.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let base_ms = base.as_millis() as u64;
        let upper = (prev.as_millis() as u64)
            .saturating_mul(3)
            .min(max.as_millis() as u64)
            .max(base_ms);

        if base_ms >= upper {
            return base;
        }
        Duration::from_millis(rand::rng().random_range(base_ms..=upper))
    }
}

fn full(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    let half = ms / 2;
    if half == 0 {
        return delay;
    }
    Duration::from_millis(half + rand::rng().random_range(0..=half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn zero_delay_stays_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn decorrelated_falls_back_to_base_when_range_is_empty() {
        let base = Duration::from_secs(5);
        let out = JitterPolicy::Decorrelated.apply_decorrelated(
            base,
            Duration::from_secs(1),
            Duration::from_secs(2),
        );
        assert_eq!(out, base);
    }

    #[test]
    fn parses_lowercase_names() {
        #[derive(Deserialize)]
        struct Wrap {
            jitter: JitterPolicy,
        }
        let w: Wrap = toml::from_str(r#"jitter = "equal""#).unwrap();
        assert_eq!(w.jitter, JitterPolicy::Equal);
    }
}
