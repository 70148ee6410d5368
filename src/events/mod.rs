//! Runtime events: types and broadcast bus.
//!
//! Every scheduling decision is published as a [`RuntimeEvent`] on the [`Bus`]:
//! the supervisor reports polls and spawns, per-event tasks report waits,
//! deliveries, retries and rollovers.
//!
//! ## Contents
//! - [`RuntimeEventKind`], [`RuntimeEvent`] classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `Registry`, `EventActor`, `Courier`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the builder's subscriber listener (fans out to `SubscriberSet`),
//!   and anything holding [`Supervisor::subscribe`](crate::Supervisor::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{RuntimeEvent, RuntimeEventKind};
