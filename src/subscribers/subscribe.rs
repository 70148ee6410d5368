//! # Subscriber trait.
//!
//! Each subscriber gets a dedicated worker fed by a bounded queue owned by
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Slow subscribers only delay their own queue; they never block the
//!   scheduler or other subscribers.
//! - On overflow the event is dropped for this subscriber only and a
//!   `SubscriberOverflow` event is published.
//! - Panics are caught and published as `SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use remindvisor::{RuntimeEvent, RuntimeEventKind, Subscribe};
//!
//! struct Abandoned;
//!
//! #[async_trait]
//! impl Subscribe for Abandoned {
//!     async fn on_event(&self, ev: &RuntimeEvent) {
//!         if ev.kind == RuntimeEventKind::DeliveryAbandoned {
//!             // page someone
//!         }
//!     }
//!     fn name(&self) -> &'static str { "abandoned" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::RuntimeEvent;

/// Consumer of runtime events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publication order (FIFO per subscriber).
    async fn on_event(&self, event: &RuntimeEvent);

    /// Short name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
