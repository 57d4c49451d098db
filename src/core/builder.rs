//! # Runtime builder.
//!
//! [`RuntimeBuilder`] takes the four collaborators every runtime needs
//! (config, browser, task body, UI surface) and optional extras: subscribers,
//! a result sink with its polling delay, and pre-filled queues.
//! [`build`](RuntimeBuilder::build) creates the bus, the subscriber set, the
//! scheduler and the helper set, registering the `persist` helper when a sink
//! was given.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    core::Config,
    events::Bus,
    extract::{Browser, ResultSink},
    scheduler::{ResultQueue, Scheduler, TaskBody, WorkQueue},
    subscribers::{Subscribe, SubscriberSet},
    ui::UiSurface,
};

use super::helpers::{HelperSet, persist_results};
use super::runtime::Runtime;

/// Default polling delay of the result-persistence helper.
pub const PERSIST_POLL: Duration = Duration::from_millis(500);

/// Builder for constructing a [`Runtime`].
pub struct RuntimeBuilder {
    cfg: Config,
    browser: Arc<dyn Browser>,
    body: Arc<dyn TaskBody>,
    ui: Arc<dyn UiSurface>,

    subscribers: Vec<Arc<dyn Subscribe>>,
    sink: Option<(Arc<dyn ResultSink>, Duration)>,
    work: WorkQueue,
    results: ResultQueue,
}

impl RuntimeBuilder {
    /// Creates a builder from the required collaborators.
    pub fn new(
        cfg: Config,
        browser: Arc<dyn Browser>,
        body: Arc<dyn TaskBody>,
        ui: Arc<dyn UiSurface>,
    ) -> Self {
        Self {
            cfg,
            browser,
            body,
            ui,
            subscribers: Vec::new(),
            sink: None,
            work: WorkQueue::new(),
            results: ResultQueue::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Persists finished results into `sink`, polling at [`PERSIST_POLL`].
    pub fn with_result_sink(self, sink: Arc<dyn ResultSink>) -> Self {
        self.with_result_sink_every(sink, PERSIST_POLL)
    }

    /// Persists finished results into `sink`, polling every `poll_delay`.
    pub fn with_result_sink_every(
        mut self,
        sink: Arc<dyn ResultSink>,
        poll_delay: Duration,
    ) -> Self {
        self.sink = Some((sink, poll_delay));
        self
    }

    /// Uses an existing work queue (e.g. one already filled by the caller).
    pub fn with_work_queue(mut self, work: WorkQueue) -> Self {
        self.work = work;
        self
    }

    /// Uses an existing result queue.
    pub fn with_result_queue(mut self, results: ResultQueue) -> Self {
        self.results = results;
        self
    }

    /// Builds the runtime.
    ///
    /// Must be called inside a tokio runtime: subscriber workers and helpers
    /// are spawned here.
    pub fn build(self) -> Runtime {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        let scheduler = Arc::new(Scheduler::new(
            self.cfg.capacity_clamped(),
            self.browser,
            self.body,
            self.work,
            self.results.clone(),
            bus.clone(),
        ));

        let mut helpers = HelperSet::new(bus.clone());
        if let Some((sink, poll_delay)) = self.sink {
            helpers.spawn(
                "persist",
                poll_delay,
                persist_results(self.results, sink, bus.clone()),
            );
        }

        Runtime::new_internal(self.cfg, bus, subs, scheduler, self.ui, helpers)
    }
}
