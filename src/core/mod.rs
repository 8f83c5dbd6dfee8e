//! Runtime core: coordination and lifecycle.
//!
//! The public API from this module is [`TailCoordinator`] (with its builder,
//! handle and commands) and [`Config`].
//!
//! Internal modules:
//! - [`coordinator`]: command loop, event listener, graceful shutdown;
//! - [`registry`]: live actors by id and by path, reaping;
//! - [`actor`]: supervision loop for one tail worker (fault policy, quota, backoff);
//! - [`alive`]: which workers are alive, ordered by event sequence;
//! - [`shutdown`]: cross-platform termination signal handling.

mod actor;
mod alive;
mod builder;
mod command;
mod config;
mod coordinator;
mod registry;
mod shutdown;

pub use actor::ActorExitReason;
pub use builder::CoordinatorBuilder;
pub use command::{Command, CoordinatorHandle};
pub use config::Config;
pub use coordinator::TailCoordinator;
