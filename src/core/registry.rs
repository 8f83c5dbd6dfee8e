//! # Worker registry owned by the coordinator loop.
//!
//! Keeps every running [`TailActor`] by id, plus a path index so StopTail can
//! find all workers of one file.
//!
//! ## Architecture
//! ```text
//! StartTail(path, report) → start()     → spawn actor, index id under path, TailAdded
//! StopTail(path)          → stop_path() → cancel every id under path (reaped later)
//! actor finishes          → reap()      → drop entry, TailRemoved (WorkerDead on panic)
//! shutdown                → shutdown()  → cancel all, reap until empty or grace runs out
//! ```
//!
//! ## Rules
//! - Only the coordinator loop touches the registry; no locking
//! - Every spawned actor is reaped exactly once; `TailRemoved` is published for each
//! - Paths are indexed in resolved form, so `./a.log`, `/cwd/x/../a.log` and `/cwd/a.log` match

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{AbortHandle, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::core::actor::{ActorExitReason, TailActor, TailActorParams};
use crate::events::{Bus, Event, EventKind};
use crate::tail::{ReportRef, TailFactory};

struct Entry {
    key: PathBuf,
    label: Arc<str>,
    cancel: CancellationToken,
    abort: AbortHandle,
}

/// Registry of live tail actors.
pub struct Registry {
    entries: HashMap<u64, Entry>,
    by_path: HashMap<PathBuf, BTreeSet<u64>>,
    actors: JoinSet<(u64, ActorExitReason)>,
    next_id: u64,
    factory: Arc<dyn TailFactory>,
    params: TailActorParams,
    bus: Bus,
    runtime_token: CancellationToken,
}

impl Registry {
    /// Creates an empty registry. Actor tokens are children of `runtime_token`.
    pub fn new(
        factory: Arc<dyn TailFactory>,
        params: TailActorParams,
        bus: Bus,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            by_path: HashMap::new(),
            actors: JoinSet::new(),
            next_id: 1,
            factory,
            params,
            bus,
            runtime_token,
        }
    }

    /// Spawns one new actor for `path` and returns its id.
    pub fn start(&mut self, path: PathBuf, report: ReportRef) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let key = path_key(&path);
        let label: Arc<str> = Arc::from(format!("{}#{id}", key.display()));
        let cancel = self.runtime_token.child_token();

        let actor = TailActor::new(
            id,
            label.clone(),
            path,
            report,
            self.factory.clone(),
            self.params.clone(),
            self.bus.clone(),
        );
        let token = cancel.clone();
        let abort = self
            .actors
            .spawn(async move { (id, actor.run(token).await) });

        self.by_path.entry(key.clone()).or_default().insert(id);
        self.entries.insert(
            id,
            Entry {
                key,
                label: label.clone(),
                cancel,
                abort,
            },
        );

        tracing::debug!(tail = %label, "tail added");
        self.bus
            .publish(Event::new(EventKind::TailAdded).with_tail(label).with_id(id));
        id
    }

    /// Cancels every actor tailing `path`. Returns how many were cancelled.
    ///
    /// The actors leave the registry once they finished disposing (see [`reap`](Self::reap)).
    pub fn stop_path(&mut self, path: &Path) -> usize {
        let Some(ids) = self.by_path.remove(&path_key(path)) else {
            return 0;
        };
        for id in &ids {
            if let Some(entry) = self.entries.get(id) {
                entry.cancel.cancel();
            }
        }
        ids.len()
    }

    /// Waits for the next actor to finish and removes it.
    ///
    /// Returns `None` immediately when no actor is running.
    pub async fn reap(&mut self) -> Option<(u64, ActorExitReason)> {
        loop {
            let joined = self.actors.join_next().await?;
            if let Some(done) = self.on_exit(joined) {
                return Some(done);
            }
        }
    }

    /// Whether no actor is running.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Sorted labels of the running actors.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.entries.values().map(|e| e.label.to_string()).collect();
        labels.sort_unstable();
        labels
    }

    /// Cancels every actor and reaps them within `grace`.
    ///
    /// On timeout the remaining actors are aborted and their labels returned.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<(), Vec<String>> {
        for entry in self.entries.values() {
            entry.cancel.cancel();
        }

        let drained = tokio::time::timeout(grace, async {
            while self.reap().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => Ok(()),
            Err(_elapsed) => {
                let stuck = self.labels();
                self.actors.abort_all();
                while let Some(joined) = self.actors.join_next().await {
                    self.on_exit(joined);
                }
                Err(stuck)
            }
        }
    }

    fn on_exit(
        &mut self,
        joined: Result<(u64, ActorExitReason), JoinError>,
    ) -> Option<(u64, ActorExitReason)> {
        let (id, reason) = match joined {
            Ok(done) => done,
            Err(err) => {
                let id = self
                    .entries
                    .iter()
                    .find(|(_, e)| e.abort.id() == err.id())
                    .map(|(id, _)| *id)?;
                if err.is_panic() {
                    if let Some(entry) = self.entries.get(&id) {
                        tracing::warn!(tail = %entry.label, "tail actor panicked");
                        self.bus.publish(
                            Event::new(EventKind::WorkerDead)
                                .with_tail(entry.label.clone())
                                .with_id(id)
                                .with_reason("actor_panic"),
                        );
                    }
                }
                (id, ActorExitReason::Stopped)
            }
        };

        let entry = self.entries.remove(&id)?;
        if let Some(ids) = self.by_path.get_mut(&entry.key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_path.remove(&entry.key);
            }
        }

        tracing::debug!(tail = %entry.label, ?reason, "tail removed");
        self.bus.publish(
            Event::new(EventKind::TailRemoved)
                .with_tail(entry.label)
                .with_id(id),
        );
        Some((id, reason))
    }
}

/// Index key for a path.
///
/// Resolved like the worker resolves it when the file exists; otherwise made
/// absolute with `.` and `..` folded away lexically.
fn path_key(path: &Path) -> PathBuf {
    if let Ok(real) = std::fs::canonicalize(path) {
        return real;
    }
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut key = PathBuf::new();
    for part in abs.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                key.pop();
            }
            other => key.push(other),
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TailError;
    use crate::policies::{BackoffPolicy, FaultPolicy, RetryQuota};
    use crate::tail::{Mailbox, Notification, Tail};
    use tokio::sync::mpsc;

    struct Idle;

    impl Tail for Idle {
        fn handle(&mut self, _msg: Notification) -> Result<(), TailError> {
            Ok(())
        }
        fn dispose(&mut self) {}
    }

    struct IdleFactory;

    impl TailFactory for IdleFactory {
        fn start(
            &self,
            path: &Path,
            _report: &ReportRef,
            _mailbox: &Mailbox,
        ) -> Result<Box<dyn Tail>, TailError> {
            if path.ends_with("unsupported.log") {
                return Err(TailError::NotSupported {
                    reason: "not a file".into(),
                });
            }
            Ok(Box::new(Idle))
        }
    }

    fn registry() -> (Registry, tokio::sync::broadcast::Receiver<Event>) {
        let bus = Bus::new(256);
        let rx = bus.subscribe();
        let params = TailActorParams {
            policy: FaultPolicy::default(),
            quota: RetryQuota::default(),
            backoff: BackoffPolicy::default(),
            report_stop: false,
        };
        let reg = Registry::new(Arc::new(IdleFactory), params, bus, CancellationToken::new());
        (reg, rx)
    }

    fn report() -> ReportRef {
        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        Arc::new(tx)
    }

    #[tokio::test]
    async fn test_same_path_gets_independent_workers() {
        let (mut reg, _rx) = registry();
        let a = reg.start(PathBuf::from("/tmp/a.log"), report());
        let b = reg.start(PathBuf::from("/tmp/a.log"), report());
        assert_ne!(a, b);
        assert_eq!(reg.labels(), vec!["/tmp/a.log#1", "/tmp/a.log#2"]);
    }

    #[tokio::test]
    async fn test_stop_path_cancels_all_workers_of_path() {
        let (mut reg, _rx) = registry();
        reg.start(PathBuf::from("/tmp/a.log"), report());
        reg.start(PathBuf::from("/tmp/a.log"), report());
        let other = reg.start(PathBuf::from("/tmp/b.log"), report());

        assert_eq!(reg.stop_path(Path::new("/tmp/a.log")), 2);
        assert_eq!(reg.stop_path(Path::new("/tmp/a.log")), 0);

        let mut reaped = vec![reg.reap().await, reg.reap().await];
        reaped.sort_unstable_by_key(|r| r.map(|(id, _)| id));
        assert_eq!(
            reaped,
            vec![
                Some((1, ActorExitReason::Cancelled)),
                Some((2, ActorExitReason::Cancelled))
            ]
        );
        assert_eq!(reg.labels(), vec![format!("/tmp/b.log#{other}")]);
    }

    #[tokio::test]
    async fn test_worker_that_stops_itself_is_reaped() {
        let (mut reg, mut rx) = registry();
        let id = reg.start(PathBuf::from("/tmp/unsupported.log"), report());

        assert_eq!(reg.reap().await, Some((id, ActorExitReason::Stopped)));
        assert!(reg.is_empty());
        assert_eq!(reg.stop_path(Path::new("/tmp/unsupported.log")), 0);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(kinds.first(), Some(&EventKind::TailAdded));
        assert_eq!(kinds.last(), Some(&EventKind::TailRemoved));
        assert!(kinds.contains(&EventKind::WorkerDead));
    }

    #[tokio::test]
    async fn test_stop_path_matches_parent_dir_spelling() {
        let (mut reg, _rx) = registry();
        reg.start(PathBuf::from("/no/such/x/../a.log"), report());
        reg.start(PathBuf::from("/no/such/./b.log"), report());

        assert_eq!(reg.labels(), vec!["/no/such/a.log#1", "/no/such/b.log#2"]);
        assert_eq!(reg.stop_path(Path::new("/no/such/a.log")), 1);
        assert_eq!(reg.stop_path(Path::new("/no/such/y/../b.log")), 1);
    }

    #[test]
    fn test_path_key_resolves_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        let file = dir.path().join("a.log");
        std::fs::write(&file, b"").expect("write");

        let real = std::fs::canonicalize(&file).expect("canonicalize");
        assert_eq!(path_key(&dir.path().join("sub/../a.log")), real);
        assert_eq!(path_key(&file), real);
    }

    #[tokio::test]
    async fn test_shutdown_reaps_everything() {
        let (mut reg, _rx) = registry();
        reg.start(PathBuf::from("/tmp/a.log"), report());
        reg.start(PathBuf::from("/tmp/b.log"), report());

        assert_eq!(reg.shutdown(Duration::from_secs(5)).await, Ok(()));
        assert!(reg.is_empty());
        assert!(reg.labels().is_empty());
        assert_eq!(reg.reap().await, None);
    }
}
