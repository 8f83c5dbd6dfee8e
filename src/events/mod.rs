//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TailCoordinator` (registry, shutdown), `TailActor`
//!   (lifecycle, faults, decisions), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the coordinator's listener (feeds `AliveTracker` and the
//!   `SubscriberSet`) and any receiver from `TailCoordinator::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
