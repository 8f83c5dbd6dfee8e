//! Supervision policies.
//!
//! This module groups the knobs that decide **what** happens to a faulted tail
//! worker and **when**.
//!
//! ## Contents
//! - [`FaultPolicy`] / [`SupervisionDecision`] fault kind → Resume / Restart / Stop
//! - [`RetryQuota`] / [`RetryWindow`] at most N retry decisions per rolling window
//! - [`BackoffPolicy`] delay before a restarted worker comes back
//! - [`JitterPolicy`] randomization of that delay
//!
//! ## Quick wiring
//! ```text
//! TailError ──kind()──► FaultPolicy::decide ──► SupervisionDecision
//!                                                  │
//!                      RetryWindow::admit ◄────────┘ (Resume/Restart only)
//!                          ├─ admitted ─► apply decision
//!                          └─ rejected ─► Stop (QuotaExhausted)
//! ```

mod backoff;
mod decision;
mod jitter;
mod quota;

pub use backoff::BackoffPolicy;
pub use decision::{FaultPolicy, SupervisionDecision};
pub use jitter::JitterPolicy;
pub use quota::{RetryQuota, RetryWindow};
