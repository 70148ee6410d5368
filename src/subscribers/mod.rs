//! # Runtime event subscribers.
//!
//! [`Subscribe`] is the extension point for reacting to scheduler activity;
//! [`SubscriberSet`] fans events out to every subscriber through its own
//! bounded queue and worker. [`LogWriter`] turns events into `tracing` records.
//!
//! ```text
//! Bus ──► subscriber_listener ──► SubscriberSet::emit
//!                                     ├──► [queue] ──► LogWriter ──► tracing
//!                                     └──► [queue] ──► custom (metrics, audit, ...)
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
