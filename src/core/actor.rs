//! # TailActor: supervision loop for one tail worker.
//!
//! Owns the worker's mailbox, starts instances through the [`TailFactory`],
//! feeds them one message at a time, and applies the [`FaultPolicy`] when an
//! instance faults. Siblings never see each other's faults.
//!
//! ## Event flow
//! ```text
//! WorkerStarting → factory.start() ─ Ok  → WorkerStarted → [handle messages]
//!                                  └ Err → WorkerFaulted → (decision)
//!
//! [handle messages]
//!   Error{..}        → ObserverError (text is forwarded by the instance)
//!   handle() == Err  → WorkerFaulted{fault, decision}
//!                        ├─ Resume  → WorkerResumed → next message
//!                        ├─ Restart → dispose → drop stale notices → RestartScheduled → sleep → WorkerStarting
//!                        └─ Stop    → dispose → WorkerDead (exit)
//!   cancelled        → dispose → WorkerStopped (exit)
//! ```
//!
//! ## Rules
//! - Instances run **sequentially**: the old one is disposed before the next starts
//! - Resume and Restart are charged to the [`RetryWindow`]; a rejected charge forces Stop
//!   and publishes `QuotaExhausted` before `WorkerFaulted`'s decision is applied
//! - A Resume for a start-up fault has no instance to resume and restarts instead
//! - Observer errors queued behind a Restart survive it and reach the next instance
//!   after its snapshot
//! - The attempt counter counts instances and never resets

use std::{path::PathBuf, sync::Arc};

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    error::TailError,
    events::{Bus, Event, EventKind},
    policies::{BackoffPolicy, FaultPolicy, RetryQuota, RetryWindow, SupervisionDecision},
    tail::{Mailbox, MailboxReceiver, Notification, ReportRef, Tail, TailFactory},
};

/// Supervision parameters shared by every actor of a coordinator.
#[derive(Clone, Debug)]
pub struct TailActorParams {
    /// Fault kind → decision table.
    pub policy: FaultPolicy,
    /// Retry decisions allowed per rolling window.
    pub quota: RetryQuota,
    /// Delay before a restarted instance starts.
    pub backoff: BackoffPolicy,
    /// Forward a final notice to the report target on a permanent Stop.
    pub report_stop: bool,
}

/// Why an actor finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExitReason {
    /// Cancelled by StopTail or shutdown.
    Cancelled,
    /// A fault was decided as Stop.
    Stopped,
    /// The retry quota ran out.
    QuotaExhausted,
}

/// Outcome of one steady-state run of an instance.
enum InstanceExit {
    Cancelled,
    Restart(TailError),
    Stop(TailError, ActorExitReason),
}

/// Supervises one tail worker.
pub struct TailActor {
    id: u64,
    label: Arc<str>,
    path: PathBuf,
    report: ReportRef,
    factory: Arc<dyn TailFactory>,
    params: TailActorParams,
    bus: Bus,
}

impl TailActor {
    /// Creates a new actor. Nothing runs until [`run`](Self::run).
    pub fn new(
        id: u64,
        label: Arc<str>,
        path: PathBuf,
        report: ReportRef,
        factory: Arc<dyn TailFactory>,
        params: TailActorParams,
        bus: Bus,
    ) -> Self {
        Self {
            id,
            label,
            path,
            report,
            factory,
            params,
            bus,
        }
    }

    /// Runs instances until cancelled or stopped by a decision.
    pub async fn run(self, token: CancellationToken) -> ActorExitReason {
        let (mailbox, mut inbox) = Mailbox::channel();
        let mut retries = RetryWindow::new(self.params.quota);
        let mut carried: Vec<Notification> = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            if token.is_cancelled() {
                return self.stopped(attempt);
            }

            attempt = attempt.saturating_add(1);
            self.publish(EventKind::WorkerStarting, attempt);

            let mut tail = match self.factory.start(&self.path, &self.report, &mailbox) {
                Ok(tail) => {
                    self.publish(EventKind::WorkerStarted, attempt);
                    for msg in carried.drain(..) {
                        mailbox.tell(msg);
                    }
                    tail
                }
                Err(err) => match self.supervise(&err, attempt, &mut retries, true) {
                    (SupervisionDecision::Stop, exit) => return self.dead(&err, attempt, exit),
                    _ => {
                        let resumed = self
                            .pause_before_restart(&err, attempt, &mut inbox, &mut carried, &mut retries, &token)
                            .await;
                        if !resumed {
                            return self.stopped(attempt);
                        }
                        continue;
                    }
                },
            };

            let exit = self
                .drive(tail.as_mut(), attempt, &mut inbox, &mut retries, &token)
                .await;
            tail.dispose();
            drop(tail);

            match exit {
                InstanceExit::Cancelled => return self.stopped(attempt),
                InstanceExit::Stop(err, reason) => return self.dead(&err, attempt, reason),
                InstanceExit::Restart(err) => {
                    let resumed = self
                        .pause_before_restart(&err, attempt, &mut inbox, &mut carried, &mut retries, &token)
                        .await;
                    if !resumed {
                        return self.stopped(attempt);
                    }
                }
            }
        }
    }

    /// Feeds messages to one instance until it must go away.
    async fn drive(
        &self,
        tail: &mut dyn Tail,
        attempt: u32,
        inbox: &mut MailboxReceiver,
        retries: &mut RetryWindow,
        token: &CancellationToken,
    ) -> InstanceExit {
        loop {
            let msg = select! {
                biased;
                _ = token.cancelled() => return InstanceExit::Cancelled,
                msg = inbox.recv() => msg,
            };
            let Some(msg) = msg else {
                return InstanceExit::Cancelled;
            };

            if let Notification::Error { reason, .. } = &msg {
                self.bus.publish(self.event(EventKind::ObserverError).with_reason(reason.as_str()));
            }

            let Err(err) = tail.handle(msg) else {
                continue;
            };
            match self.supervise(&err, attempt, retries, false) {
                (SupervisionDecision::Resume, _) => {
                    self.publish(EventKind::WorkerResumed, attempt);
                }
                (SupervisionDecision::Restart, _) => return InstanceExit::Restart(err),
                (SupervisionDecision::Stop, reason) => return InstanceExit::Stop(err, reason),
            }
        }
    }

    /// Maps a fault to a decision and charges it to the quota.
    fn supervise(
        &self,
        err: &TailError,
        attempt: u32,
        retries: &mut RetryWindow,
        starting: bool,
    ) -> (SupervisionDecision, ActorExitReason) {
        let fault = err.kind();
        let mut decision = self.params.policy.decide(fault);
        if starting && decision == SupervisionDecision::Resume {
            decision = SupervisionDecision::Restart;
        }

        let mut exit = ActorExitReason::Stopped;
        if decision.is_retry() && !retries.admit(time::Instant::now()) {
            decision = SupervisionDecision::Stop;
            exit = ActorExitReason::QuotaExhausted;
            self.bus.publish(
                self.event(EventKind::QuotaExhausted)
                    .with_attempt(attempt)
                    .with_reason(format!(
                        "{} retries within {:?}",
                        self.params.quota.max_retries, self.params.quota.window
                    )),
            );
        }

        tracing::warn!(
            tail = %self.label,
            attempt,
            fault = fault.as_label(),
            decision = decision.as_label(),
            error = %err,
            "tail worker faulted"
        );
        self.bus.publish(
            self.event(EventKind::WorkerFaulted)
                .with_attempt(attempt)
                .with_fault(fault)
                .with_decision(decision)
                .with_reason(err.to_string()),
        );

        (decision, exit)
    }

    /// Discards stale notifications and waits out the restart delay.
    ///
    /// Observer errors still queued are moved to `carried` for the next instance.
    /// Returns `false` if cancelled while waiting.
    async fn pause_before_restart(
        &self,
        err: &TailError,
        attempt: u32,
        inbox: &mut MailboxReceiver,
        carried: &mut Vec<Notification>,
        retries: &mut RetryWindow,
        token: &CancellationToken,
    ) -> bool {
        let stale = inbox.drain_stale(carried);
        if stale > 0 {
            tracing::debug!(tail = %self.label, stale, "discarded notifications of disposed instance");
        }

        let streak = retries.in_window(time::Instant::now()).saturating_sub(1);
        let delay = self.params.backoff.next(streak as u32);
        self.bus.publish(
            self.event(EventKind::RestartScheduled)
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(err.to_string()),
        );

        if delay.is_zero() {
            return !token.is_cancelled();
        }
        select! {
            _ = time::sleep(delay) => true,
            _ = token.cancelled() => false,
        }
    }

    fn dead(&self, err: &TailError, attempt: u32, reason: ActorExitReason) -> ActorExitReason {
        let why = match reason {
            ActorExitReason::QuotaExhausted => format!("retry quota exhausted: {err}"),
            _ => err.to_string(),
        };
        if self.params.report_stop {
            self.report.report(format!("tailing stopped: {why}"));
        }
        self.bus.publish(
            self.event(EventKind::WorkerDead)
                .with_attempt(attempt)
                .with_reason(why),
        );
        reason
    }

    fn stopped(&self, attempt: u32) -> ActorExitReason {
        self.publish(EventKind::WorkerStopped, attempt);
        ActorExitReason::Cancelled
    }

    fn publish(&self, kind: EventKind, attempt: u32) {
        self.bus.publish(self.event(kind).with_attempt(attempt));
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_tail(self.label.clone()).with_id(self.id)
    }
}
