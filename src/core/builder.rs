use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    actor::TailActorParams,
    alive::AliveTracker,
    command::CoordinatorHandle,
    coordinator::{self, Background, TailCoordinator},
    registry::Registry,
};
use crate::{
    core::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    tail::{FileTailFactory, TailFactory},
};

/// Builder for a [`TailCoordinator`].
pub struct CoordinatorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    factory: Arc<dyn TailFactory>,
}

impl CoordinatorBuilder {
    /// Creates a builder that tails real files with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            factory: Arc::new(FileTailFactory),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Each subscriber gets its own bounded queue and worker task.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the factory that creates tail instances.
    pub fn with_factory(mut self, factory: Arc<dyn TailFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Builds the coordinator and starts its command loop and event listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<TailCoordinator> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let events = bus.subscribe();
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let alive = Arc::new(AliveTracker::new());
        let runtime_token = CancellationToken::new();

        let params = TailActorParams {
            policy: self.cfg.fault_policy,
            quota: self.cfg.quota,
            backoff: self.cfg.restart_backoff,
            report_stop: self.cfg.report_stop,
        };
        let registry = Registry::new(self.factory, params, bus.clone(), runtime_token.clone());

        let (tx, rx) = mpsc::channel(self.cfg.command_capacity_clamped());
        let listener_stop = CancellationToken::new();

        let background = Background {
            listener: tokio::spawn(coordinator::listen(
                events,
                subs,
                alive.clone(),
                listener_stop.clone(),
            )),
            commands: tokio::spawn(coordinator::command_loop(
                registry,
                rx,
                bus.clone(),
                self.cfg.grace,
                runtime_token.clone(),
            )),
            listener_stop,
        };

        Arc::new(TailCoordinator::new_internal(
            self.cfg,
            bus,
            alive,
            CoordinatorHandle::new(tx),
            runtime_token,
            background,
        ))
    }
}
