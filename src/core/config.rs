//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the tail coordinator.
//!
//! ## Sentinel values
//! - `grace = 0s` → no wait on shutdown; any live worker is reported as stuck
//! - `bus_capacity` / `command_capacity` below 1 are clamped to 1
//! - `restart_backoff.first = 0s` → immediate restart

use std::time::Duration;

use crate::policies::{BackoffPolicy, FaultPolicy, RetryQuota};

/// Global configuration for the tail coordinator.
///
/// ## Field semantics
/// - `grace`: Maximum wait for workers to stop on shutdown
/// - `bus_capacity`: Event bus ring buffer size
/// - `command_capacity`: Bounded queue between handles and the coordinator loop
/// - `fault_policy`: Fault kind → Resume / Restart / Stop
/// - `quota`: Retry decisions allowed per worker per rolling window
/// - `restart_backoff`: Delay between disposing a faulted worker and restarting it
/// - `report_stop`: Whether a permanently stopped worker says so to its report target
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for graceful shutdown.
    ///
    /// On shutdown every worker is cancelled and the coordinator waits up to
    /// `grace` for them to dispose their resources. If exceeded,
    /// `shutdown()` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Capacity of the command queue feeding the coordinator loop.
    ///
    /// `CoordinatorHandle::try_start_tail` fails with `SubmitError::Full` when
    /// the queue is at capacity.
    pub command_capacity: usize,

    /// Decision table applied to worker faults.
    pub fault_policy: FaultPolicy,

    /// Per-worker retry quota. Exceeding it forces Stop.
    pub quota: RetryQuota,

    /// Delay before a restarted worker starts again.
    pub restart_backoff: BackoffPolicy,

    /// Forward `"tailing stopped: {reason}"` to the report target when a worker
    /// is stopped by a Stop decision or quota exhaustion.
    pub report_stop: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    /// - `command_capacity = 256`
    /// - `fault_policy`: arithmetic → Resume, not supported → Stop, other → Restart
    /// - `quota = 10 per 30s`
    /// - `restart_backoff`: immediate
    /// - `report_stop = false`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
            command_capacity: 256,
            fault_policy: FaultPolicy::default(),
            quota: RetryQuota::default(),
            restart_backoff: BackoffPolicy::default(),
            report_stop: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacities_are_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            command_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.command_capacity_clamped(), 1);
    }

    #[test]
    fn test_default_quota_is_ten_per_thirty_seconds() {
        let cfg = Config::default();
        assert_eq!(cfg.quota.max_retries, 10);
        assert_eq!(cfg.quota.window, Duration::from_secs(30));
        assert!(!cfg.report_stop);
    }
}
