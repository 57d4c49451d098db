//! # Runtime: wires the tick loop, scheduler, helpers and subscribers together.
//!
//! The [`Runtime`] owns the event bus, a [`SubscriberSet`], the [`Scheduler`],
//! the UI surface and the background helpers. It runs until the UI closes,
//! then drains live tasks and stops helpers.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!
//!   TickLoop (UiPump + Admitter over Scheduler)
//!       └─ ends when the UI surface reports closed (ShutdownRequested)
//!
//!   Scheduler::drain(cfg.grace)
//!       ├─ Ok      → publish AllStoppedWithin
//!       └─ Timeout → publish GraceExceeded (stuck task identities)
//!
//!   HelperSet::stop_all()     (ascending poll delay; cancel → join)
//! ```
//!
//! ## Rules
//! - Helpers are stopped even if the drain window is exceeded.
//! - The drain error takes precedence over a helper error.

use std::sync::Arc;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::scheduler::{ResultQueue, Scheduler, WorkQueue};
use crate::subscribers::SubscriberSet;
use crate::ui::{BlockFlag, UiPump, UiSurface};

use super::config::Config;
use super::helpers::HelperSet;
use super::tick::{Admitter, TickLoop};

/// Top-level process runtime. Build it with [`RuntimeBuilder`](super::RuntimeBuilder).
pub struct Runtime {
    /// Global runtime configuration.
    pub cfg: Config,
    /// Event bus shared by every component.
    pub bus: Bus,
    /// Event fan-out to subscribers.
    pub subs: Arc<SubscriberSet>,

    scheduler: Arc<Scheduler>,
    ui: Arc<dyn UiSurface>,
    block: BlockFlag,
    helpers: HelperSet,
}

impl Runtime {
    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        scheduler: Arc<Scheduler>,
        ui: Arc<dyn UiSurface>,
        helpers: HelperSet,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            scheduler,
            ui,
            block: BlockFlag::new(),
            helpers,
        }
    }

    /// The scheduler (for introspection: live tasks, counters).
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Input queue; enqueue work items here.
    pub fn work_queue(&self) -> WorkQueue {
        self.scheduler.work_queue().clone()
    }

    /// Output queue of finished results.
    pub fn result_queue(&self) -> ResultQueue {
        self.scheduler.result_queue().clone()
    }

    /// Flag that suspends UI servicing while held.
    pub fn block_flag(&self) -> BlockFlag {
        self.block.clone()
    }

    /// Spawns an additional background helper.
    pub fn spawn_helper<F, Fut>(&mut self, name: impl Into<Arc<str>>, poll_delay: Duration, pass: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.helpers.spawn(name, poll_delay, pass);
    }

    /// Runs until the UI closes, then drains tasks and stops helpers.
    pub async fn run(self) -> Result<(), RuntimeError> {
        self.subscriber_listener();

        let (pump, open) = UiPump::new(Arc::clone(&self.ui), self.block.clone());
        let period = self.cfg.tick_period(pump.refresh_rate_hz());
        let admitter = Admitter::new(Arc::clone(&self.scheduler), open, self.bus.clone());
        TickLoop::new(period, pump, admitter, self.bus.clone())
            .run()
            .await;

        let drained = self.drain().await;
        let stopped = self.helpers.stop_all().await;
        drained.and(stopped)
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                set.emit(&ev);
            }
        });
    }

    /// Waits for live tasks within the grace window, publishing the outcome.
    async fn drain(&self) -> Result<(), RuntimeError> {
        match self.scheduler.drain(self.cfg.grace).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(e) => {
                if let RuntimeError::GraceExceeded { stuck, .. } = &e {
                    self.bus.publish(
                        Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                    );
                }
                Err(e)
            }
        }
    }
}
