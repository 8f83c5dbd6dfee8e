//! # Retry quota over a rolling time window.
//!
//! [`RetryQuota`] caps how many Resume/Restart decisions one worker may receive
//! within a rolling window. [`RetryWindow`] is the per-worker tracker: it keeps
//! the instants of recent admitted decisions and prunes the expired ones on
//! every check.
//!
//! ```text
//! quota = 10 per 30s
//!
//! t=0s  fault #1  ─► admitted   (1 in window)
//! ...
//! t=9s  fault #10 ─► admitted   (10 in window)
//! t=10s fault #11 ─► rejected   ─► forced Stop
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Maximum number of retry decisions per rolling window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryQuota {
    /// Retry decisions allowed within `window`.
    pub max_retries: u32,
    /// Length of the rolling window.
    pub window: Duration,
}

impl Default for RetryQuota {
    /// 10 retries within 30 seconds.
    fn default() -> Self {
        Self {
            max_retries: 10,
            window: Duration::from_secs(30),
        }
    }
}

/// Per-worker sliding-window counter for a [`RetryQuota`].
#[derive(Debug)]
pub struct RetryWindow {
    quota: RetryQuota,
    recent: VecDeque<Instant>,
}

impl RetryWindow {
    /// Creates an empty window for `quota`.
    pub fn new(quota: RetryQuota) -> Self {
        Self {
            quota,
            recent: VecDeque::with_capacity(quota.max_retries as usize),
        }
    }

    /// Records a retry decision at `now` if the quota still allows one.
    ///
    /// Returns `false` when the window is already full; the decision is then
    /// not recorded and the caller must stop the worker.
    pub fn admit(&mut self, now: Instant) -> bool {
        self.prune(now);
        if self.recent.len() >= self.quota.max_retries as usize {
            return false;
        }
        self.recent.push_back(now);
        true
    }

    /// Number of admitted decisions still inside the window at `now`.
    pub fn in_window(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.recent.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.recent.front() {
            if now.saturating_duration_since(oldest) >= self.quota.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eleventh_within_window_is_rejected() {
        let mut window = RetryWindow::new(RetryQuota::default());
        let start = Instant::now();

        for i in 0..10 {
            let at = start + Duration::from_secs(i);
            assert!(window.admit(at), "fault #{} should be admitted", i + 1);
        }
        assert!(!window.admit(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_expired_entries_are_pruned() {
        let quota = RetryQuota {
            max_retries: 2,
            window: Duration::from_secs(30),
        };
        let mut window = RetryWindow::new(quota);
        let start = Instant::now();

        assert!(window.admit(start));
        assert!(window.admit(start + Duration::from_secs(1)));
        assert!(!window.admit(start + Duration::from_secs(2)));

        // First entry leaves the window at t=30s.
        assert!(window.admit(start + Duration::from_secs(30)));
        assert_eq!(window.in_window(start + Duration::from_secs(30)), 2);
    }

    #[test]
    fn test_rejection_is_not_recorded() {
        let quota = RetryQuota {
            max_retries: 1,
            window: Duration::from_secs(10),
        };
        let mut window = RetryWindow::new(quota);
        let start = Instant::now();

        assert!(window.admit(start));
        assert!(!window.admit(start + Duration::from_secs(5)));
        assert!(window.admit(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_quota_rejects_everything() {
        let quota = RetryQuota {
            max_retries: 0,
            window: Duration::from_secs(30),
        };
        let mut window = RetryWindow::new(quota);
        assert!(!window.admit(Instant::now()));
    }
}
