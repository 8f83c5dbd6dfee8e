//! # LogWriter: runtime events rendered through `tracing`
//!
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO  tail added tail="/var/log/app.log#1"
//! INFO  worker started tail="/var/log/app.log#1" attempt=1
//! WARN  worker faulted tail="/var/log/app.log#1" fault="other" decision="restart" reason="..."
//! INFO  restart scheduled tail="/var/log/app.log#1" delay_ms=0
//! ERROR worker dead tail="/var/log/app.log#1" reason="operation not supported: ..."
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let tail = e.tail.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::TailAdded => tracing::info!(tail, "tail added"),
            EventKind::TailRemoved => tracing::info!(tail, "tail removed"),
            EventKind::CommandRejected => tracing::warn!(tail, reason, "command rejected"),
            EventKind::WorkerStarting => {
                tracing::debug!(tail, attempt = e.attempt, "worker starting")
            }
            EventKind::WorkerStarted => tracing::info!(tail, attempt = e.attempt, "worker started"),
            EventKind::WorkerFaulted => tracing::warn!(
                tail,
                fault = e.fault.map(|f| f.as_label()),
                decision = e.decision.map(|d| d.as_label()),
                reason,
                "worker faulted"
            ),
            EventKind::WorkerResumed => tracing::info!(tail, attempt = e.attempt, "worker resumed"),
            EventKind::RestartScheduled => {
                tracing::info!(tail, delay_ms = e.delay_ms, "restart scheduled")
            }
            EventKind::QuotaExhausted => tracing::error!(tail, reason, "retry quota exhausted"),
            EventKind::ObserverError => tracing::warn!(tail, reason, "observer error"),
            EventKind::WorkerStopped => tracing::info!(tail, "worker stopped"),
            EventKind::WorkerDead => tracing::error!(tail, reason, "worker dead"),
            EventKind::ShutdownRequested => tracing::info!("shutdown requested"),
            EventKind::AllStoppedWithin => tracing::info!("all workers stopped within grace"),
            EventKind::GraceExceeded => tracing::error!("grace exceeded"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = tail, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = tail, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
