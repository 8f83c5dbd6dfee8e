//! # Worker lifecycle tracker with sequence-based ordering.
//!
//! Maintains the coordinator's view of which tail workers are currently alive,
//! using event sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! TailActor ──► Bus ──► coordinator listener ──► AliveTracker::update()
//!                                                        │
//!                                                        ▼
//!                                           HashMap<label, WorkerState>
//!                                               (label → {seq, alive})
//! ```
//!
//! ## Rules
//! - `WorkerStarting` marks a worker alive; `WorkerStopped` / `WorkerDead` mark it gone
//! - Other worker events **update seq** but don't affect alive status
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Read operations (`snapshot`, `is_alive`) are **eventually consistent**

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone)]
struct WorkerState {
    last_seq: u64,
    alive: bool,
}

/// Thread-safe tracker of alive workers, keyed by worker label (`"{path}#{id}"`).
#[derive(Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<String, WorkerState>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates worker state if the event is newer than the last one seen.
    ///
    /// Returns `true` when the alive status changed.
    ///
    /// ```text
    /// update(WorkerStopped, seq=100)  → alive=false, last_seq=100
    /// update(WorkerStarting, seq=99)  → rejected (stale)
    /// ```
    pub async fn update(&self, ev: &Event) -> bool {
        let alive = match ev.kind {
            EventKind::WorkerStarting => Some(true),
            _ if ev.is_terminal() => Some(false),
            EventKind::WorkerStarted
            | EventKind::WorkerFaulted
            | EventKind::WorkerResumed
            | EventKind::RestartScheduled
            | EventKind::QuotaExhausted
            | EventKind::ObserverError => None,
            _ => return false,
        };
        let Some(label) = ev.tail.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(label.to_string()).or_insert(WorkerState {
            last_seq: 0,
            alive: false,
        });

        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        match alive {
            Some(alive) if alive != entry.alive => {
                entry.alive = alive;
                true
            }
            _ => false,
        }
    }

    /// Returns the sorted labels of workers currently alive.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, ws)| ws.alive)
            .map(|(label, _)| label.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    /// Returns true if the worker is currently alive.
    pub async fn is_alive(&self, label: &str) -> bool {
        self.state
            .read()
            .await
            .get(label)
            .map(|ws| ws.alive)
            .unwrap_or(false)
    }
}
