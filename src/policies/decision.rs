//! # Fault-kind to supervision-decision table.
//!
//! When a tail worker faults, the coordinator looks the fault's [`FaultKind`]
//! up in a [`FaultPolicy`] and applies the resulting [`SupervisionDecision`]
//! to that one worker only.
//!
//! ```text
//! FaultKind::Arithmetic    ─► Resume   (keep state, next message)
//! FaultKind::NotSupported  ─► Stop     (tear down, no retry)
//! FaultKind::Other         ─► Restart  (dispose, start a fresh instance)
//! ```
//!
//! The table only proposes; the [`RetryQuota`](crate::RetryQuota) may still
//! turn a Resume or Restart into a Stop.

use crate::error::FaultKind;

/// Action taken for a faulting worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisionDecision {
    /// Swallow the fault; the worker keeps its state and handles the next message.
    Resume,
    /// Dispose the worker and start a fresh instance with the same arguments.
    Restart,
    /// Dispose the worker permanently.
    Stop,
}

impl SupervisionDecision {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisionDecision::Resume => "resume",
            SupervisionDecision::Restart => "restart",
            SupervisionDecision::Stop => "stop",
        }
    }

    /// Whether this decision is counted against the retry quota.
    pub fn is_retry(&self) -> bool {
        matches!(
            self,
            SupervisionDecision::Resume | SupervisionDecision::Restart
        )
    }
}

/// Decision table keyed on [`FaultKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPolicy {
    /// Decision for [`FaultKind::Arithmetic`].
    pub arithmetic: SupervisionDecision,
    /// Decision for [`FaultKind::NotSupported`].
    pub not_supported: SupervisionDecision,
    /// Decision for [`FaultKind::Other`].
    pub other: SupervisionDecision,
}

impl Default for FaultPolicy {
    /// Resume on arithmetic faults, stop on unsupported operations, restart otherwise.
    fn default() -> Self {
        Self {
            arithmetic: SupervisionDecision::Resume,
            not_supported: SupervisionDecision::Stop,
            other: SupervisionDecision::Restart,
        }
    }
}

impl FaultPolicy {
    /// Looks up the decision for `kind`.
    ///
    /// # Example
    /// ```
    /// use tailvisor::{FaultKind, FaultPolicy, SupervisionDecision};
    ///
    /// let policy = FaultPolicy::default();
    /// assert_eq!(policy.decide(FaultKind::Other), SupervisionDecision::Restart);
    /// ```
    pub fn decide(&self, kind: FaultKind) -> SupervisionDecision {
        match kind {
            FaultKind::Arithmetic => self.arithmetic,
            FaultKind::NotSupported => self.not_supported,
            FaultKind::Other => self.other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let policy = FaultPolicy::default();
        assert_eq!(
            policy.decide(FaultKind::Arithmetic),
            SupervisionDecision::Resume
        );
        assert_eq!(
            policy.decide(FaultKind::NotSupported),
            SupervisionDecision::Stop
        );
        assert_eq!(policy.decide(FaultKind::Other), SupervisionDecision::Restart);
    }

    #[test]
    fn test_stop_is_not_a_retry() {
        assert!(SupervisionDecision::Resume.is_retry());
        assert!(SupervisionDecision::Restart.is_retry());
        assert!(!SupervisionDecision::Stop.is_retry());
    }
}
