//! Delivery retry policies.
//!
//! This module groups the knobs that control **how many times** a notice is
//! offered to the sink and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RetryPolicy`]   attempt budget plus backoff
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! SchedulerConfig ──► RetryPolicy { max_attempts, backoff }
//!      └─► Courier::deliver uses:
//!           - max_attempts to bound sink.send() calls
//!           - backoff.next(attempt) to sleep between them
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → 3 attempts.
//! - `BackoffPolicy::default()` → first=1s, factor=2.0, max=30s, jitter=None (1s, 2s, 4s, ...).

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
