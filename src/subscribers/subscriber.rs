//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to runtime events: logging,
//! alerting when a tail dies, counting restarts.
//!
//! Each subscriber gets its own bounded queue and worker task, so a slow or
//! panicking subscriber never stalls a tail worker or another subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use tailvisor::{Event, EventKind, Subscribe};
//!
//! struct DeadTails;
//!
//! #[async_trait]
//! impl Subscribe for DeadTails {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::WorkerDead) {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "dead-tails" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// - Events arrive in FIFO order on a dedicated worker task.
/// - A full queue drops the event for this subscriber and publishes `SubscriberOverflow`.
/// - Panics are caught and published as `SubscriberPanicked`.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events. Override the verbose default.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
