//! Runtime core: the supervisor and the per-event tasks it drives.
//!
//! - [`clock`]: wall-clock source ([`SystemClock`], [`TokioClock`]);
//! - [`config`]: [`SchedulerConfig`] and its TOML loader;
//! - `delivery`: sink calls with retry and backoff;
//! - `actor`: the reminder timeline of one event;
//! - `registry`: live task handles keyed by event id;
//! - [`supervisor`]: polling loop, `cancel`/`refresh`, graceful shutdown;
//! - `shutdown`: OS termination signals.

mod actor;
mod builder;
pub mod clock;
pub mod config;
mod delivery;
mod registry;
mod shutdown;
pub mod supervisor;

pub use builder::SupervisorBuilder;
pub use clock::{Clock, SystemClock, TokioClock};
pub use config::SchedulerConfig;
pub use supervisor::{Supervisor, TickReport};
