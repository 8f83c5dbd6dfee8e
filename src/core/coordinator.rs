//! # TailCoordinator: owns the workers, applies commands, shuts down gracefully.
//!
//! The coordinator owns the event bus, the [`SubscriberSet`], and a registry of
//! tail actors. Commands arrive through a bounded queue and are applied one at a
//! time by a single loop task, which also reaps actors that stopped on their own.
//!
//! ## High-level architecture
//! ```text
//! CoordinatorHandle ── Command ──► command_loop ──► Registry
//!                                       │              ├─ StartTail → spawn TailActor (child token)
//!                                       │              ├─ StopTail  → cancel actors of path
//!                                       │              └─ reap      → TailRemoved
//!                                       │
//! TailActor ... ── publish(Event) ──► Bus ──► listen ──► AliveTracker::update
//!                                                   └──► SubscriberSet::emit ──► [queue S1..SN]
//!
//! Shutdown path (run() on OS signal, or shutdown()):
//!   Bus.publish(ShutdownRequested)
//!   runtime_token.cancel()           → propagates to every actor token
//!   command_loop: Registry::shutdown(cfg.grace)
//!       ├─ all reaped in time → Bus.publish(AllStoppedWithin)
//!       └─ grace exceeded     → Bus.publish(GraceExceeded), RuntimeError::GraceExceeded{stuck}
//!   listener drains the bus, then SubscriberSet::shutdown()
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use tailvisor::{Config, TailCoordinator};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = TailCoordinator::builder(Config::default()).build();
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel::<String>();
//!     coordinator.handle().start_tail("/var/log/app.log", Arc::new(tx)).await?;
//!
//!     tokio::spawn(async move {
//!         while let Some(text) = rx.recv().await {
//!             print!("{text}");
//!         }
//!     });
//!
//!     coordinator.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    alive::AliveTracker,
    builder::CoordinatorBuilder,
    command::{Command, CoordinatorHandle},
    registry::Registry,
    shutdown,
};
use crate::{
    core::Config,
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet},
};

/// Background tasks started by the builder.
pub(super) struct Background {
    pub(super) commands: JoinHandle<Result<(), RuntimeError>>,
    pub(super) listener: JoinHandle<()>,
    pub(super) listener_stop: CancellationToken,
}

/// Supervises tail workers.
pub struct TailCoordinator {
    cfg: Config,
    bus: Bus,
    alive: Arc<AliveTracker>,
    handle: CoordinatorHandle,
    runtime_token: CancellationToken,
    background: Mutex<Option<Background>>,
}

impl TailCoordinator {
    /// Starts building a coordinator.
    pub fn builder(cfg: Config) -> CoordinatorBuilder {
        CoordinatorBuilder::new(cfg)
    }

    /// Builds a coordinator that tails real files, with the given subscribers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Arc<Self> {
        Self::builder(cfg).with_subscribers(subscribers).build()
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        alive: Arc<AliveTracker>,
        handle: CoordinatorHandle,
        runtime_token: CancellationToken,
        background: Background,
    ) -> Self {
        Self {
            cfg,
            bus,
            alive,
            handle,
            runtime_token,
            background: Mutex::new(Some(background)),
        }
    }

    /// A handle for submitting StartTail / StopTail.
    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Subscribes to runtime events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The configuration the coordinator was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Sorted labels (`"{path}#{id}"`) of the workers currently alive.
    pub async fn alive_workers(&self) -> Vec<String> {
        self.alive.snapshot().await
    }

    /// Whether the worker with this label is alive.
    pub async fn is_alive(&self, label: &str) -> bool {
        self.alive.is_alive(label).await
    }

    /// Waits for a termination signal (or another caller's shutdown), then shuts down.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        select! {
            res = shutdown::wait_for_signal() => match res {
                Ok(signal) => tracing::info!(signal, "termination signal received"),
                Err(err) => tracing::warn!(error = %err, "cannot listen for termination signals"),
            },
            _ = self.runtime_token.cancelled() => {}
        }
        self.shutdown().await
    }

    /// Stops every worker and waits up to [`Config::grace`] for them to dispose.
    ///
    /// Later calls return `Ok(())` immediately.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let background = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(background) = background else {
            return Ok(());
        };

        tracing::info!(grace = ?self.cfg.grace, "tail coordinator shutting down");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();

        let res = match background.commands.await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = %err, "command loop ended abnormally");
                Ok(())
            }
        };

        background.listener_stop.cancel();
        let _ = background.listener.await;
        res
    }
}

impl Drop for TailCoordinator {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

enum Step {
    Shutdown,
    Reaped,
    Command(Option<Command>),
}

/// Applies commands one at a time and reaps finished actors until cancelled.
pub(super) async fn command_loop(
    mut registry: Registry,
    mut rx: mpsc::Receiver<Command>,
    bus: Bus,
    grace: Duration,
    token: CancellationToken,
) -> Result<(), RuntimeError> {
    loop {
        let step = select! {
            biased;
            _ = token.cancelled() => Step::Shutdown,
            Some(_) = registry.reap(), if !registry.is_empty() => Step::Reaped,
            cmd = rx.recv() => Step::Command(cmd),
        };

        match step {
            Step::Shutdown | Step::Command(None) => break,
            Step::Reaped => {}
            Step::Command(Some(cmd)) => apply(&mut registry, cmd, &bus),
        }
    }

    rx.close();
    match registry.shutdown(grace).await {
        Ok(()) => {
            bus.publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        }
        Err(stuck) => {
            tracing::warn!(?stuck, "workers did not stop within grace");
            bus.publish(
                Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")),
            );
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }
}

fn apply(registry: &mut Registry, cmd: Command, bus: &Bus) {
    match cmd {
        Command::StartTail { path, report } => {
            registry.start(path, report);
        }
        Command::StopTail { path } => {
            let stopped = registry.stop_path(&path);
            if stopped == 0 {
                bus.publish(
                    Event::new(EventKind::CommandRejected)
                        .with_tail(path.display().to_string())
                        .with_reason("tail_not_found"),
                );
            } else {
                tracing::debug!(path = %path.display(), stopped, "stop requested");
            }
        }
    }
}

/// Feeds bus events to the alive tracker and subscribers until told to stop.
///
/// Events already queued when `stop` fires are still delivered.
pub(super) async fn listen(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    alive: Arc<AliveTracker>,
    stop: CancellationToken,
) {
    loop {
        let received = select! {
            biased;
            ev = rx.recv() => ev,
            _ = stop.cancelled() => break,
        };
        match received {
            Ok(ev) => {
                alive.update(&ev).await;
                subs.emit(&ev);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    subs.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SubmitError, TailError};
    use crate::tail::{Mailbox, Notification, ReportRef, Tail, TailFactory};
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(10);

    async fn next_event(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
        let fut = async {
            loop {
                match rx.recv().await {
                    Ok(ev) if ev.kind == kind => return ev,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
                }
            }
        };
        tokio::time::timeout(WAIT, fut)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
    }

    async fn next_report(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for report")
            .expect("report channel closed")
    }

    /// Collects reports until `expected.len()` bytes arrived, then compares.
    async fn expect_text(rx: &mut mpsc::UnboundedReceiver<String>, expected: &str) {
        let mut text = String::new();
        while text.len() < expected.len() {
            text.push_str(&next_report(rx).await);
        }
        assert_eq!(text, expected);
    }

    fn append(path: &Path, text: &str) {
        std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(text.as_bytes()))
            .expect("append");
    }

    fn channel() -> (ReportRef, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        (Arc::new(tx), rx)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tail_scenario_end_to_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("app.log");
        std::fs::write(&file, b"").expect("write");

        let coordinator = TailCoordinator::builder(Config::default()).build();
        let (report, mut rx) = channel();
        coordinator
            .handle()
            .start_tail(&file, report)
            .await
            .expect("submit");

        assert_eq!(next_report(&mut rx).await, "");

        append(&file, "hello\n");
        assert_eq!(next_report(&mut rx).await, "hello\n");

        append(&file, "world\n");
        append(&file, "world\n");
        expect_text(&mut rx, "world\nworld\n").await;

        coordinator.shutdown().await.expect("shutdown");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duplicate_start_gets_two_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("dup.log");
        std::fs::write(&file, b"seed\n").expect("write");

        let coordinator = TailCoordinator::builder(Config::default()).build();
        let mut events = coordinator.events();
        let (report, mut rx) = channel();
        let handle = coordinator.handle();
        handle.start_tail(&file, report.clone()).await.expect("submit");
        handle.start_tail(&file, report).await.expect("submit");

        let first = next_event(&mut events, EventKind::TailAdded).await;
        let second = next_event(&mut events, EventKind::TailAdded).await;
        assert_ne!(first.id, second.id);

        assert_eq!(next_report(&mut rx).await, "seed\n");
        assert_eq!(next_report(&mut rx).await, "seed\n");

        coordinator.shutdown().await.expect("shutdown");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_tail_removes_workers_and_rejects_unknown_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("stop.log");
        std::fs::write(&file, b"").expect("write");

        let coordinator = TailCoordinator::builder(Config::default()).build();
        let mut events = coordinator.events();
        let (report, mut rx) = channel();
        let handle = coordinator.handle();
        handle.start_tail(&file, report.clone()).await.expect("submit");
        handle.start_tail(&file, report).await.expect("submit");
        next_report(&mut rx).await;
        next_report(&mut rx).await;

        handle.stop_tail(&file).await.expect("submit");
        next_event(&mut events, EventKind::TailRemoved).await;
        next_event(&mut events, EventKind::TailRemoved).await;

        handle.stop_tail(&file).await.expect("submit");
        let rejected = next_event(&mut events, EventKind::CommandRejected).await;
        assert_eq!(rejected.reason.as_deref(), Some("tail_not_found"));

        append(&file, "ignored\n");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        coordinator.shutdown().await.expect("shutdown");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_file_exhausts_quota_and_is_reaped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let coordinator = TailCoordinator::builder(Config::default()).build();
        let mut events = coordinator.events();
        let (report, _rx) = channel();

        coordinator
            .handle()
            .start_tail(dir.path().join("missing.log"), report)
            .await
            .expect("submit");

        let exhausted = next_event(&mut events, EventKind::QuotaExhausted).await;
        assert_eq!(exhausted.attempt, Some(11));
        next_event(&mut events, EventKind::WorkerDead).await;
        next_event(&mut events, EventKind::TailRemoved).await;

        coordinator.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle_and_is_idempotent() {
        let coordinator = TailCoordinator::builder(Config::default()).build();
        let mut events = coordinator.events();
        let handle = coordinator.handle();

        coordinator.shutdown().await.expect("shutdown");
        next_event(&mut events, EventKind::ShutdownRequested).await;
        next_event(&mut events, EventKind::AllStoppedWithin).await;

        let (report, _rx) = channel();
        assert_eq!(
            handle.start_tail("/tmp/x.log", report).await,
            Err(SubmitError::Closed)
        );
        coordinator.shutdown().await.expect("second shutdown");
    }

    struct SlowStart;

    impl Tail for SlowStart {
        fn handle(&mut self, _msg: Notification) -> Result<(), TailError> {
            Ok(())
        }
        fn dispose(&mut self) {}
    }

    struct SlowFactory(Arc<AtomicUsize>);

    impl TailFactory for SlowFactory {
        fn start(
            &self,
            _path: &Path,
            _report: &ReportRef,
            _mailbox: &Mailbox,
        ) -> Result<Box<dyn Tail>, TailError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(1500));
            Ok(Box::new(SlowStart))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_grace_exceeded_names_stuck_worker() {
        let entered = Arc::new(AtomicUsize::new(0));
        let cfg = Config {
            grace: Duration::from_millis(100),
            ..Config::default()
        };
        let coordinator = TailCoordinator::builder(cfg)
            .with_factory(Arc::new(SlowFactory(entered.clone())))
            .build();

        let (report, _rx) = channel();
        coordinator
            .handle()
            .start_tail(PathBuf::from("/tmp/slow.log"), report)
            .await
            .expect("submit");
        while entered.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        match coordinator.shutdown().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => {
                assert_eq!(stuck, vec!["/tmp/slow.log#1"]);
            }
            other => panic!("expected grace exceeded, got {other:?}"),
        }
    }
}
