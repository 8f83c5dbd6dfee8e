//! # Tailing primitives.
//!
//! Everything a single tail needs, independent of supervision:
//!
//! - [`WatchTarget`] absolute path split into watch directory + file name
//! - [`FileObserver`] OS change notifications filtered to one file
//! - [`Mailbox`] / [`MailboxReceiver`] per-worker FIFO of [`Notification`]s
//! - [`Report`] / [`ReportRef`] where tailed text is delivered
//! - [`TailWorker`] read handle + cursor + observer for one file
//!
//! ## Seams
//! The coordinator never names [`TailWorker`] directly. It asks a
//! [`TailFactory`] for a boxed [`Tail`], so tests can plug in scripted workers.
//!
//! ```text
//! TailActor ──start(path, report, mailbox)──► TailFactory ──► Box<dyn Tail>
//!     │                                                          │
//!     └──────────── handle(Notification) / dispose() ────────────┘
//! ```

mod mailbox;
mod notification;
mod observer;
mod report;
mod target;
mod worker;

use std::path::Path;

pub use mailbox::{Mailbox, MailboxReceiver};
pub use notification::Notification;
pub use observer::FileObserver;
pub use report::{Report, ReportFn, ReportRef};
pub use target::WatchTarget;
pub use worker::TailWorker;

use crate::error::TailError;

/// A started tail instance driven by its actor.
///
/// Both methods are called from the actor task only, one at a time.
pub trait Tail: Send + 'static {
    /// Handles one mailbox message. An `Err` is a fault escalated to supervision.
    fn handle(&mut self, msg: Notification) -> Result<(), TailError>;

    /// Releases every resource the instance holds. Must be idempotent.
    fn dispose(&mut self);
}

/// Creates tail instances. One factory serves every worker of a coordinator.
pub trait TailFactory: Send + Sync + 'static {
    /// Runs start-up for one instance.
    ///
    /// On success the instance may already have queued messages to `mailbox`
    /// (for file tails, the initial snapshot). On failure nothing is left open.
    fn start(
        &self,
        path: &Path,
        report: &ReportRef,
        mailbox: &Mailbox,
    ) -> Result<Box<dyn Tail>, TailError>;
}

/// Default factory: tails real files with [`TailWorker`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTailFactory;

impl TailFactory for FileTailFactory {
    fn start(
        &self,
        path: &Path,
        report: &ReportRef,
        mailbox: &Mailbox,
    ) -> Result<Box<dyn Tail>, TailError> {
        let worker = TailWorker::start(path, report.clone(), mailbox.clone())?;
        Ok(Box::new(worker))
    }
}
