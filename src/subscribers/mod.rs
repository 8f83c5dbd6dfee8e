//! # Event subscribers.
//!
//! ```text
//! TailActor ── publish(Event) ──► Bus ──► coordinator listener ──► SubscriberSet::emit
//!                                                                    ├──► LogWriter
//!                                                                    ├──► Metrics
//!                                                                    └──► Custom ...
//! ```
//!
//! Implement [`Subscribe`] and pass it to
//! [`CoordinatorBuilder::with_subscribers`](crate::CoordinatorBuilder::with_subscribers).

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
