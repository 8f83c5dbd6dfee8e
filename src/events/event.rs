//! # Runtime events emitted by the coordinator and tail workers.
//!
//! [`EventKind`] falls into four groups:
//! - **Registry events**: tails added/removed, rejected commands
//! - **Worker lifecycle**: starting, started, faulted, resumed, restart scheduled
//! - **Terminal events**: worker stopped (cancelled), dead (Stop decision), quota exhausted
//! - **Runtime events**: shutdown, grace, subscriber overflow/panic
//!
//! Every [`Event`] carries a global monotonic `seq` plus a wall-clock timestamp;
//! the remaining fields are set depending on the kind.
//!
//! ## Example
//! ```rust
//! use tailvisor::{Event, EventKind, FaultKind, SupervisionDecision};
//!
//! let ev = Event::new(EventKind::WorkerFaulted)
//!     .with_tail("/var/log/app.log#3")
//!     .with_id(3)
//!     .with_fault(FaultKind::Other)
//!     .with_decision(SupervisionDecision::Restart)
//!     .with_reason("cannot read");
//!
//! assert_eq!(ev.kind, EventKind::WorkerFaulted);
//! assert_eq!(ev.decision, Some(SupervisionDecision::Restart));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::FaultKind;
use crate::policies::SupervisionDecision;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `tail` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// An event was dropped for one subscriber (queue full or closed).
    ///
    /// Sets: `tail` (subscriber name), `reason`.
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal or explicit call).
    ShutdownRequested,

    /// All workers stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    GraceExceeded,

    // === Registry events ===
    /// A StartTail command spawned a worker.
    ///
    /// Sets: `tail`, `id`.
    TailAdded,

    /// A worker left the registry (stopped, dead, or removed by StopTail).
    ///
    /// Sets: `tail`, `id`.
    TailRemoved,

    /// A command could not be applied.
    ///
    /// Sets: `tail` (path), `reason` (e.g. `"tail_not_found"`).
    CommandRejected,

    // === Worker lifecycle ===
    /// Worker instance start-up begins.
    ///
    /// Sets: `tail`, `id`, `attempt` (1-based instance number).
    WorkerStarting,

    /// Worker instance opened its file and started its observer.
    ///
    /// Sets: `tail`, `id`, `attempt`.
    WorkerStarted,

    /// Worker instance faulted.
    ///
    /// Sets: `tail`, `id`, `attempt`, `fault`, `decision` (after quota), `reason`.
    WorkerFaulted,

    /// The fault was swallowed; the same instance continues.
    ///
    /// Sets: `tail`, `id`, `attempt`.
    WorkerResumed,

    /// A fresh instance will be started after `delay_ms`.
    ///
    /// Sets: `tail`, `id`, `attempt` (the faulted one), `delay_ms`, `reason`.
    RestartScheduled,

    /// The retry quota was exhausted; the decision was forced to Stop.
    ///
    /// Sets: `tail`, `id`, `attempt`, `reason`.
    QuotaExhausted,

    /// The OS watch subsystem reported an error (non-fatal).
    ///
    /// Sets: `tail`, `id`, `reason`.
    ObserverError,

    /// Worker stopped because it was cancelled (StopTail or shutdown).
    ///
    /// Sets: `tail`, `id`, `attempt`.
    WorkerStopped,

    /// Worker stopped permanently by a Stop decision.
    ///
    /// Sets: `tail`, `id`, `attempt`, `reason`.
    WorkerDead,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker label (`"{path}#{id}"`), path, or subscriber name.
    pub tail: Option<Arc<str>>,
    /// Worker id assigned by the coordinator.
    pub id: Option<u64>,
    /// Instance number of the worker (1-based, grows with each restart).
    pub attempt: Option<u32>,
    /// Human-readable reason (fault text, rejection reason, ...).
    pub reason: Option<Arc<str>>,
    /// Restart delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Kind of the fault, for `WorkerFaulted`.
    pub fault: Option<FaultKind>,
    /// Decision applied, for `WorkerFaulted`.
    pub decision: Option<SupervisionDecision>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            tail: None,
            id: None,
            attempt: None,
            reason: None,
            delay_ms: None,
            fault: None,
            decision: None,
        }
    }

    #[inline]
    pub fn with_tail(mut self, tail: impl Into<Arc<str>>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    #[inline]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_fault(mut self, fault: FaultKind) -> Self {
        self.fault = Some(fault);
        self
    }

    #[inline]
    pub fn with_decision(mut self, decision: SupervisionDecision) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_tail(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_tail(subscriber)
            .with_reason(info)
    }

    /// Whether the event ends a worker's life.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::WorkerStopped | EventKind::WorkerDead)
    }
}
