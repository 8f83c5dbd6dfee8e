//! # tailvisor
//!
//! **Tailvisor** streams newly appended text of files to consumers and keeps
//! doing so through transient faults.
//!
//! Each tailed file gets a worker that owns one read handle and one OS change
//! observer. Workers are supervised per fault kind: arithmetic faults are
//! resumed, unsupported targets are stopped, anything else restarts the worker
//! from a fresh snapshot. A per-worker retry quota bounds restart storms.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   CoordinatorHandle::start_tail(path, report) / stop_tail(path)
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TailCoordinator                                                  │
//! │  - command loop (one command at a time)                           │
//! │  - Registry (workers by id, path index, reaping)                  │
//! │  - Bus (broadcast events) → AliveTracker + SubscriberSet          │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TailActor   │   │  TailActor   │   │  TailActor   │
//!     │ (fault loop) │   │ (fault loop) │   │ (fault loop) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TailWorker  │   │  TailWorker  │   │  TailWorker  │
//!     │ handle+cursor│   │ handle+cursor│   │ handle+cursor│
//!     └──────┬───────┘   └──────────────┘   └──────────────┘
//!            │ owns
//!            ▼
//!     FileObserver ── OS thread ──► Mailbox ──► TailWorker::handle ──► Report
//! ```
//!
//! ### Worker lifecycle
//! ```text
//! StartTail ──► Registry ──► TailActor::run()
//!
//! loop {
//!   ├─► attempt += 1, publish WorkerStarting
//!   ├─► start: resolve → open → observer.start() → snapshot → tell(InitialSnapshot)
//!   ├─► handle messages one at a time
//!   │       └─ Err(fault) ──► FaultPolicy::decide(kind) ──► RetryWindow::admit
//!   │             ├─ Resume  ─► same instance, next message
//!   │             ├─ Restart ─► dispose (observer, then handle) → drop stale notices → backoff → loop
//!   │             └─ Stop    ─► dispose → WorkerDead, exit
//!   └─ cancelled (StopTail / shutdown) ─► dispose → WorkerStopped, exit
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                          |
//! |-------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Coordination**  | Start/stop tails, graceful shutdown.                       | [`TailCoordinator`], [`CoordinatorHandle`]  |
//! | **Tailing**       | Snapshot + incremental reads driven by OS notifications.   | [`TailWorker`], [`FileObserver`], [`Report`]|
//! | **Policies**      | Fault kind → decision, retry quota, restart backoff.       | [`FaultPolicy`], [`RetryQuota`], [`BackoffPolicy`] |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom).       | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed faults and runtime errors.                           | [`TailError`], [`RuntimeError`]             |
//! | **Configuration** | Centralize runtime settings.                               | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (renders events via `tracing`).
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use tailvisor::{Config, ReportFn, TailCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = TailCoordinator::builder(Config::default()).build();
//!
//!     let stdout = ReportFn::arc(|text: String| print!("{text}"));
//!     coordinator.handle().start_tail("/var/log/syslog", stdout).await?;
//!
//!     // Tail until Ctrl-C, then stop every worker within the grace period.
//!     coordinator.run().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tail;

// ---- Public re-exports ----

pub use crate::core::{
    ActorExitReason, Command, Config, CoordinatorBuilder, CoordinatorHandle, TailCoordinator,
};
pub use error::{FaultKind, RuntimeError, SubmitError, TailError};
pub use events::{Event, EventKind};
pub use policies::{
    BackoffPolicy, FaultPolicy, JitterPolicy, RetryQuota, RetryWindow, SupervisionDecision,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tail::{
    FileObserver, FileTailFactory, Mailbox, MailboxReceiver, Notification, Report, ReportFn,
    ReportRef, Tail, TailFactory, TailWorker, WatchTarget,
};

// Optional: expose the built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
