//! # Unbounded async FIFO used for work items and results.
//!
//! ```text
//! producers ── enqueue ──► [ VecDeque ] ── dequeue().await ──► consumer
//!                               │        ── try_dequeue()   ──► tick loop
//!                            close() → pending dequeuers see None once empty
//! ```
//!
//! ## Rules
//! - `dequeue` suspends while the queue is empty and open.
//! - After `close`, `enqueue` fails with [`RuntimeError::QueueClosed`];
//!   remaining items can still be dequeued.
//! - Cheap to clone; clones share the same queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::error::RuntimeError;
use crate::extract::{ExtractionResult, WorkItem};

/// Pending work items.
pub type WorkQueue = Queue<WorkItem>;

/// Finished extraction results awaiting persistence.
pub type ResultQueue = Queue<ExtractionResult>;

struct Inner<T> {
    items: Mutex<VecDeque<T>>,
    ready: Notify,
    closed: AtomicBool,
}

/// Shared FIFO queue.
pub struct Queue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> Queue<T> {
    /// Creates an empty open queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::new()),
                ready: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Appends an item.
    pub fn enqueue(&self, item: T) -> Result<(), RuntimeError> {
        if self.is_closed() {
            return Err(RuntimeError::QueueClosed);
        }
        self.items().push_back(item);
        self.inner.ready.notify_one();
        Ok(())
    }

    /// Puts an item back at the head (e.g. after a failed admission).
    pub(crate) fn requeue(&self, item: T) {
        self.items().push_front(item);
        self.inner.ready.notify_one();
    }

    /// Removes the head, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            let notified = self.inner.ready.notified();
            if let Some(item) = self.try_dequeue() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// Removes the head without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        self.items().pop_front()
    }

    /// Takes everything currently queued.
    pub fn drain(&self) -> Vec<T> {
        self.items().drain(..).collect()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Stops accepting new items and wakes waiting consumers.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.ready.notify_waiters();
    }

    /// True after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A poisoned queue still holds consistent data: every mutation is a
        // single VecDeque call.
        self.inner
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
