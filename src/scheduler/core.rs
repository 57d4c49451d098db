//! # Bounded task scheduler: admits at most `capacity` concurrent tasks.
//!
//! ```text
//! WorkQueue ──try_dequeue──► admit_next() ──acquire slot──► launch(item)
//!                                                              │
//!           Tab::open(browser) ◄── session + page ─────────────┤
//!           lifetime += 1, id = "<kind>#<n>"                    │
//!           LiveTasks::register → CompletionGuard               │
//!           tokio::spawn(run_task(body, ctx)) ◄─────────────────┘
//! ```
//!
//! ## Rules
//! - `held() <= capacity()` at every instant; the semaphore is the only
//!   shared counter and is paired with the task's completion guard.
//! - `lifetime_task_count` grows on every successful launch and never shrinks.
//! - If no session can be opened the slot is released. An item taken from the
//!   queue goes back to its head; an item handed to `start` stays with the caller.
//! - No ordering between tasks is guaranteed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::extract::{Browser, Tab, WorkItem};

use super::live::LiveTasks;
use super::queue::{ResultQueue, WorkQueue};
use super::runner::run_task;
use super::task::{TaskBody, TaskContext, TaskId};

/// Admission-controlled pool of extraction tasks.
pub struct Scheduler {
    capacity: usize,
    slots: Arc<Semaphore>,
    lifetime: AtomicU64,
    live: Arc<LiveTasks>,

    work: WorkQueue,
    results: ResultQueue,
    browser: Arc<dyn Browser>,
    body: Arc<dyn TaskBody>,
    bus: Bus,
}

impl Scheduler {
    /// Creates a scheduler with `capacity` slots (clamped to at least 1).
    pub fn new(
        capacity: usize,
        browser: Arc<dyn Browser>,
        body: Arc<dyn TaskBody>,
        work: WorkQueue,
        results: ResultQueue,
        bus: Bus,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
            lifetime: AtomicU64::new(0),
            live: LiveTasks::new(),
            work,
            results,
            browser,
            body,
            bus,
        }
    }

    /// True iff work is queued and a slot is free.
    pub fn can_admit(&self) -> bool {
        !self.work.is_empty() && self.slots.available_permits() > 0
    }

    /// Starts a task for `item`, waiting for a free slot first.
    ///
    /// The item is cloned into the task; on failure nothing is queued.
    pub async fn start(&self, item: &WorkItem) -> Result<TaskId, RuntimeError> {
        let permit = self.acquire().await?;
        let tab = self.open_tab().await?;
        Ok(self.launch(permit, tab, item.clone()))
    }

    /// Acquires a slot, then starts a task for the next queued item.
    ///
    /// Returns `Ok(None)` if the queue was empty once the slot was held.
    /// If no session can be opened the item is put back at the head of the queue.
    pub async fn admit_next(&self) -> Result<Option<TaskId>, RuntimeError> {
        let permit = self.acquire().await?;
        let Some(item) = self.work.try_dequeue() else {
            return Ok(None);
        };
        match self.open_tab().await {
            Ok(tab) => Ok(Some(self.launch(permit, tab, item))),
            Err(e) => {
                self.work.requeue(item);
                Err(e)
            }
        }
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, RuntimeError> {
        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_closed| RuntimeError::SlotsClosed)
    }

    async fn open_tab(&self) -> Result<Tab, RuntimeError> {
        Tab::open(self.browser.as_ref())
            .await
            .map_err(RuntimeError::SessionUnavailable)
    }

    fn launch(&self, permit: OwnedSemaphorePermit, tab: Tab, item: WorkItem) -> TaskId {
        let index = self.lifetime.fetch_add(1, Ordering::SeqCst) + 1;
        let id = TaskId::new(self.browser.kind(), index);
        self.bus.publish(
            Event::new(EventKind::TaskAdmitted)
                .with_task(id.label())
                .with_source(item.source_name.as_str()),
        );

        let guard = self.live.register(id.clone(), permit, self.bus.clone());
        let ctx = TaskContext {
            id: id.clone(),
            item,
            browser: Arc::clone(&self.browser),
            tab,
            results: self.results.clone(),
            bus: self.bus.clone(),
        };
        let body = Arc::clone(&self.body);
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let _ = run_task(body.as_ref(), ctx, &bus).await;
        });

        id
    }

    /// Waits until no task is live, at most `grace`.
    ///
    /// On timeout, returns the identities still live.
    pub async fn drain(&self, grace: Duration) -> Result<(), RuntimeError> {
        match tokio::time::timeout(grace, self.live.wait_idle()).await {
            Ok(()) => Ok(()),
            Err(_elapsed) => Err(RuntimeError::GraceExceeded {
                grace,
                stuck: self.live(),
            }),
        }
    }

    /// Sorted snapshot of live task identities.
    pub fn live(&self) -> Vec<String> {
        self.live.snapshot()
    }

    /// Slots currently held.
    pub fn held(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Configured slot count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks started since construction.
    pub fn lifetime_task_count(&self) -> u64 {
        self.lifetime.load(Ordering::SeqCst)
    }

    /// Work items waiting for admission.
    pub fn queued(&self) -> usize {
        self.work.len()
    }

    /// Input queue.
    pub fn work_queue(&self) -> &WorkQueue {
        &self.work
    }

    /// Output queue.
    pub fn result_queue(&self) -> &ResultQueue {
        &self.results
    }
}
