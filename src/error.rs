//! Error types used by the tailvisor runtime and its tail workers.
//!
//! - [`RuntimeError`] errors raised by the coordinator itself.
//! - [`TailError`] faults raised by a tail worker while opening, watching or reading.
//! - [`SubmitError`] failures to hand a command to the coordinator.
//!
//! Worker faults are classified by [`FaultKind`]; the coordinator maps the kind
//! to a [`SupervisionDecision`](crate::SupervisionDecision).

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// # Errors produced by the coordinator runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some workers had to be abandoned.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Workers that were still alive when the grace period ran out.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tailvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Coarse classification of a worker fault, used to pick a supervision decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Arithmetic fault (overflow of the read cursor and the like).
    Arithmetic,
    /// The requested operation is not supported for this target.
    NotSupported,
    /// Anything else: I/O failures, watch failures, truncation.
    Other,
}

impl FaultKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            FaultKind::Arithmetic => "arithmetic",
            FaultKind::NotSupported => "not_supported",
            FaultKind::Other => "other",
        }
    }
}

/// # Faults raised by a tail worker.
///
/// Any of these ends the current message (or the start-up) of a worker and is
/// escalated to the coordinator. Errors reported by the OS watch subsystem are
/// not faults: they reach the worker as a notification and are forwarded as text.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TailError {
    /// The path could not be resolved to an absolute file path.
    #[error("cannot resolve {path:?}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file could not be opened (or inspected) for reading.
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the open handle failed.
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS watch could not be installed.
    #[error("cannot watch {path:?}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The file shrank below the read cursor (truncation or rotation).
    #[error("{path:?} truncated: cursor at {position}, length {len}")]
    Truncated { path: PathBuf, position: u64, len: u64 },

    /// Arithmetic fault while tracking the stream position.
    #[error("arithmetic fault: {reason}")]
    Arithmetic { reason: String },

    /// The target does not support tailing.
    #[error("operation not supported: {reason}")]
    NotSupported { reason: String },
}

impl TailError {
    /// Classifies the fault for the supervision decision table.
    ///
    /// I/O errors of kind [`io::ErrorKind::Unsupported`] count as
    /// [`FaultKind::NotSupported`].
    ///
    /// # Example
    /// ```
    /// use tailvisor::{FaultKind, TailError};
    ///
    /// let err = TailError::Arithmetic { reason: "cursor overflow".into() };
    /// assert_eq!(err.kind(), FaultKind::Arithmetic);
    /// ```
    pub fn kind(&self) -> FaultKind {
        match self {
            TailError::Arithmetic { .. } => FaultKind::Arithmetic,
            TailError::NotSupported { .. } => FaultKind::NotSupported,
            TailError::Resolve { source, .. }
            | TailError::Open { source, .. }
            | TailError::Read { source, .. }
                if source.kind() == io::ErrorKind::Unsupported =>
            {
                FaultKind::NotSupported
            }
            _ => FaultKind::Other,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TailError::Resolve { .. } => "tail_resolve",
            TailError::Open { .. } => "tail_open",
            TailError::Read { .. } => "tail_read",
            TailError::Watch { .. } => "tail_watch",
            TailError::Truncated { .. } => "tail_truncated",
            TailError::Arithmetic { .. } => "tail_arithmetic",
            TailError::NotSupported { .. } => "tail_not_supported",
        }
    }
}

/// Error returned when a command cannot be handed to the coordinator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Command queue is full (retry, or use the async variant).
    #[error("command queue full")]
    Full,

    /// Coordinator is gone (shut down).
    #[error("coordinator closed")]
    Closed,
}
