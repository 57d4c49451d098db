//! # Live-task registry and the completion guard bound to each task.
//!
//! ```text
//! Scheduler::launch
//!   ├─► LiveTasks::register(id, permit) ──► CompletionGuard
//!   └─► spawn(task body) ── owns guard ── finish / error / panic
//!                                              │ Drop
//!                                              ├─► unregister id
//!                                              ├─► release permit
//!                                              ├─► publish TaskReleased
//!                                              └─► wake drain waiters
//! ```
//!
//! ## Rules
//! - The guard's `Drop` runs exactly once per task, including during unwind.
//! - The id is unregistered before the permit is released, so the live count
//!   never exceeds capacity even transiently.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Notify, OwnedSemaphorePermit};

use crate::events::{Bus, Event, EventKind};

use super::task::TaskId;

/// Tasks currently holding a slot.
#[derive(Default)]
pub(crate) struct LiveTasks {
    tasks: Mutex<BTreeMap<u64, TaskId>>,
    idle: Notify,
}

impl LiveTasks {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records `id` as live and returns the guard that undoes it.
    pub(crate) fn register(
        self: &Arc<Self>,
        id: TaskId,
        permit: OwnedSemaphorePermit,
        bus: Bus,
    ) -> CompletionGuard {
        self.tasks().insert(id.index(), id.clone());
        CompletionGuard {
            live: Arc::clone(self),
            id,
            permit: Some(permit),
            bus,
        }
    }

    /// Sorted snapshot of live task labels.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        self.tasks().values().map(|id| id.to_string()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks().len()
    }

    /// Resolves once no task is live.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.len() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn unregister(&self, id: &TaskId) {
        self.tasks().remove(&id.index());
    }

    fn tasks(&self) -> MutexGuard<'_, BTreeMap<u64, TaskId>> {
        self.tasks.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Completion hook of one task.
pub(crate) struct CompletionGuard {
    live: Arc<LiveTasks>,
    id: TaskId,
    permit: Option<OwnedSemaphorePermit>,
    bus: Bus,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.live.unregister(&self.id);
        drop(self.permit.take());
        self.bus
            .publish(Event::new(EventKind::TaskReleased).with_task(self.id.label()));
        self.live.idle.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Semaphore;

    #[tokio::test]
    async fn guard_releases_slot_and_unregisters() {
        let slots = Arc::new(Semaphore::new(1));
        let live = LiveTasks::new();
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let permit = slots.clone().acquire_owned().await.unwrap();
        let guard = live.register(TaskId::new("chromium", 1), permit, bus);
        assert_eq!(live.snapshot(), vec!["chromium#1".to_string()]);
        assert_eq!(slots.available_permits(), 0);

        drop(guard);
        assert_eq!(live.len(), 0);
        assert_eq!(slots.available_permits(), 1);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskReleased);
        assert_eq!(ev.task.as_deref(), Some("chromium#1"));
    }

    #[tokio::test]
    async fn guard_runs_when_task_panics() {
        let slots = Arc::new(Semaphore::new(1));
        let live = LiveTasks::new();
        let permit = slots.clone().acquire_owned().await.unwrap();
        let guard = live.register(TaskId::new("chromium", 1), permit, Bus::new(8));

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("boom");
        });
        assert!(handle.await.unwrap_err().is_panic());
        live.wait_idle().await;
        assert_eq!(slots.available_permits(), 1);
    }
}
