//! # Cooperative tick loop: UI servicing, then admission, once per tick.
//!
//! ```text
//! interval(period)
//!   └─ tick ─► UiPump::service() ─ Closed ──► publish ShutdownRequested, stop
//!                    │ Serviced / Skipped
//!                    ▼
//!              Admitter::admit_ready()
//!                    while open && can_admit(): admit_next()
//! ```
//!
//! ## Rules
//! - One logical activity at a time; nothing here preempts anything else.
//! - Several tasks may be admitted in a single tick.
//! - A session that cannot be opened ends admission for that tick; the item
//!   stays at the head of the queue for the next one.
//! - Missed ticks are delayed, not bursted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::events::{Bus, Event, EventKind};
use crate::scheduler::Scheduler;
use crate::ui::{PumpStatus, UiPump};

/// Admission half of the tick: fills free slots from the work queue.
pub struct Admitter {
    scheduler: Arc<Scheduler>,
    open: watch::Receiver<bool>,
    bus: Bus,
}

impl Admitter {
    /// Admits into `scheduler` while the UI reported by `open` is up.
    pub fn new(scheduler: Arc<Scheduler>, open: watch::Receiver<bool>, bus: Bus) -> Self {
        Self {
            scheduler,
            open,
            bus,
        }
    }

    /// Starts as many tasks as capacity and queue allow. Returns how many.
    pub async fn admit_ready(&self) -> usize {
        let mut admitted = 0;
        loop {
            let open = *self.open.borrow();
            if !open || !self.scheduler.can_admit() {
                break;
            }
            match self.scheduler.admit_next().await {
                Ok(Some(_)) => admitted += 1,
                Ok(None) => break,
                Err(e) => {
                    self.bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task("admission")
                            .with_reason(e.as_message()),
                    );
                    break;
                }
            }
        }
        admitted
    }
}

/// Fixed-rate loop composing [`UiPump`] and [`Admitter`].
pub struct TickLoop {
    period: Duration,
    pump: UiPump,
    admitter: Admitter,
    bus: Bus,
}

impl TickLoop {
    /// Creates a loop ticking every `period`.
    pub fn new(period: Duration, pump: UiPump, admitter: Admitter, bus: Bus) -> Self {
        Self {
            period,
            pump,
            admitter,
            bus,
        }
    }

    /// Ticks until the UI closes. Returns the number of ticks run.
    pub async fn run(self) -> u64 {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0u64;
        loop {
            interval.tick().await;
            ticks += 1;

            if self.pump.service() == PumpStatus::Closed {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                break;
            }
            self.admitter.admit_ready().await;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::extract::WorkItem;
    use crate::scheduler::{ResultQueue, TaskContext, TaskFn, WorkQueue};
    use crate::testkit::{FakeBrowser, FakeUi};
    use crate::ui::BlockFlag;

    fn scheduler(capacity: usize, items: usize, browser: Arc<FakeBrowser>) -> Arc<Scheduler> {
        let work = WorkQueue::new();
        for i in 0..items {
            work.enqueue(WorkItem::new(format!("s{i}"), format!("/in/s{i}")))
                .unwrap();
        }
        let body = TaskFn::arc("hold", |_ctx: TaskContext| async {
            std::future::pending::<()>().await;
            Ok::<(), TaskError>(())
        });
        Arc::new(Scheduler::new(
            capacity,
            browser,
            body,
            work,
            ResultQueue::new(),
            Bus::new(64),
        ))
    }

    #[tokio::test]
    async fn admits_up_to_capacity_in_one_pass() {
        let sched = scheduler(3, 5, Arc::new(FakeBrowser::new("chromium")));
        let (_tx, open) = watch::channel(true);
        let admitter = Admitter::new(sched.clone(), open, Bus::new(8));

        assert_eq!(admitter.admit_ready().await, 3);
        assert_eq!(sched.queued(), 2);
        assert_eq!(admitter.admit_ready().await, 0);
    }

    #[tokio::test]
    async fn closed_ui_stops_admission() {
        let sched = scheduler(3, 5, Arc::new(FakeBrowser::new("chromium")));
        let (tx, open) = watch::channel(true);
        tx.send_replace(false);
        let admitter = Admitter::new(sched.clone(), open, Bus::new(8));
        assert_eq!(admitter.admit_ready().await, 0);
        assert_eq!(sched.queued(), 5);
    }

    #[tokio::test]
    async fn session_failure_ends_the_pass() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        browser.fail_next_session();
        let sched = scheduler(2, 2, browser);
        let (_tx, open) = watch::channel(true);
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let admitter = Admitter::new(sched.clone(), open, bus);

        assert_eq!(admitter.admit_ready().await, 0);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TaskFailed);
        assert_eq!(admitter.admit_ready().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_runs_until_ui_closes() {
        let ui = Arc::new(FakeUi::new());
        ui.close_after(5);
        let sched = scheduler(2, 4, Arc::new(FakeBrowser::new("chromium")));
        let block = BlockFlag::new();
        let (pump, open) = UiPump::new(ui.clone(), block);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let ticks = TickLoop::new(
            Duration::from_millis(16),
            pump,
            Admitter::new(sched.clone(), open, bus.clone()),
            bus,
        )
        .run()
        .await;

        assert_eq!(ticks, 6);
        assert_eq!(ui.pumped(), 5);
        assert_eq!(sched.lifetime_task_count(), 2);
        let mut saw_shutdown = false;
        while let Ok(ev) = rx.try_recv() {
            saw_shutdown |= ev.kind == EventKind::ShutdownRequested;
        }
        assert!(saw_shutdown);
    }
}
