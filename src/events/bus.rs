//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]. Publishing never blocks, so a tail
//! worker can report its lifecycle from inside its message loop without waiting
//! on slow observers.
//!
//! ```text
//! TailActor 1 ──┐
//! TailActor 2 ──┼──► Bus ──► coordinator listener ──► AliveTracker + SubscriberSet
//! Coordinator ──┘        └──► TailCoordinator::events() receivers
//! ```
//!
//! ## Rules
//! - A receiver only sees events sent after it subscribed.
//! - The ring buffer is shared; receivers that fall behind get `Lagged(n)`.
//! - With no receivers, events are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every current receiver.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
