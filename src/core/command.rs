//! # Coordinator commands and the handle that submits them.
//!
//! ```text
//! CoordinatorHandle ──(bounded mpsc, Config::command_capacity)──► coordinator loop
//!     start_tail / try_start_tail ─► Command::StartTail{path, report}
//!     stop_tail                   ─► Command::StopTail{path}
//! ```
//!
//! Commands are fire-and-forget: the outcome is observable as `TailAdded`,
//! `TailRemoved` or `CommandRejected` events.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::error::SubmitError;
use crate::tail::ReportRef;

/// Inbound message to the coordinator.
#[derive(Clone)]
pub enum Command {
    /// Spawn one new worker tailing `path` into `report`. Never deduplicated.
    StartTail { path: PathBuf, report: ReportRef },
    /// Stop every worker tailing `path`.
    StopTail { path: PathBuf },
}

impl Command {
    /// The path the command is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Command::StartTail { path, .. } | Command::StopTail { path } => path,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StartTail { path, .. } => {
                f.debug_struct("StartTail").field("path", path).finish_non_exhaustive()
            }
            Command::StopTail { path } => f.debug_struct("StopTail").field("path", path).finish(),
        }
    }
}

/// Cloneable sender of [`Command`]s.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Submits a command, waiting for queue space.
    pub async fn submit(&self, cmd: Command) -> Result<(), SubmitError> {
        self.tx.send(cmd).await.map_err(|_| SubmitError::Closed)
    }

    /// Submits a command without waiting.
    pub fn try_submit(&self, cmd: Command) -> Result<(), SubmitError> {
        self.tx.try_send(cmd).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    /// Starts a new worker tailing `path` into `report`.
    pub async fn start_tail(
        &self,
        path: impl Into<PathBuf>,
        report: ReportRef,
    ) -> Result<(), SubmitError> {
        self.submit(Command::StartTail {
            path: path.into(),
            report,
        })
        .await
    }

    /// Non-blocking [`start_tail`](Self::start_tail).
    pub fn try_start_tail(
        &self,
        path: impl Into<PathBuf>,
        report: ReportRef,
    ) -> Result<(), SubmitError> {
        self.try_submit(Command::StartTail {
            path: path.into(),
            report,
        })
    }

    /// Stops every worker tailing `path`.
    pub async fn stop_tail(&self, path: impl Into<PathBuf>) -> Result<(), SubmitError> {
        self.submit(Command::StopTail { path: path.into() }).await
    }

    /// Whether the coordinator loop is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn report() -> ReportRef {
        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        Arc::new(tx)
    }

    #[tokio::test]
    async fn test_full_queue_is_reported() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = CoordinatorHandle::new(tx);
        assert_eq!(handle.try_start_tail("/tmp/a.log", report()), Ok(()));
        assert_eq!(
            handle.try_start_tail("/tmp/b.log", report()),
            Err(SubmitError::Full)
        );
    }

    #[tokio::test]
    async fn test_closed_coordinator_is_reported() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let handle = CoordinatorHandle::new(tx);
        assert!(handle.is_closed());
        assert_eq!(handle.stop_tail("/tmp/a.log").await, Err(SubmitError::Closed));
    }

    #[test]
    fn test_debug_omits_report_target() {
        let cmd = Command::StartTail {
            path: PathBuf::from("/tmp/a.log"),
            report: report(),
        };
        assert_eq!(cmd.path(), std::path::Path::new("/tmp/a.log"));
        assert!(format!("{cmd:?}").starts_with("StartTail"));
    }
}
