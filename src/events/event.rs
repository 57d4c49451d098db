//! # Runtime events emitted by the scheduler, pipelines and extraction tasks.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Task lifecycle**: admission, start, completion, failure, slot release
//! - **Pipeline**: per-step success/failure outcomes
//! - **Extraction**: unit/record progress and session restarts
//! - **Runtime**: shutdown, helper stop, subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! cursor position, reasons, and restart delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use portalvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RecordNotFound)
//!     .with_task("chromium#2")
//!     .with_cursor(0, 7)
//!     .with_reason("12345678900");
//!
//! assert_eq!(ev.kind, EventKind::RecordNotFound);
//! assert_eq!(ev.record, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Runtime events ===
    /// The UI surface closed; the tick loop stops admitting.
    ShutdownRequested,

    /// All live tasks finished within the drain window.
    AllStoppedWithin,

    /// Drain window exceeded; some tasks were still live.
    ///
    /// Sets:
    /// - `reason`: stuck task identities
    GraceExceeded,

    /// A background helper was signalled and joined.
    ///
    /// Sets:
    /// - `task`: helper name
    /// - `delay_ms`: its polling delay
    HelperStopped,

    // === Task lifecycle ===
    /// A slot was acquired and a work item dequeued.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `source`: work item name
    TaskAdmitted,

    /// The task's session and page are ready and its body is running.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `source`: work item name
    TaskStarted,

    /// Task body returned `Ok`.
    ///
    /// Sets:
    /// - `task`: task identity
    TaskCompleted,

    /// Task body returned an error (or panicked).
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `reason`: error message
    TaskFailed,

    /// Completion hook ran: slot released and task unregistered.
    ///
    /// Sets:
    /// - `task`: task identity
    TaskReleased,

    // === Pipeline ===
    /// A primary step returned `true`.
    ///
    /// Sets:
    /// - `task`: task identity (if run inside a task)
    /// - `step`: step name
    StepSucceeded,

    /// A primary step returned `false`.
    ///
    /// Sets:
    /// - `task`: task identity (if run inside a task)
    /// - `step`: step name
    StepFailed,

    // === Extraction ===
    /// Authenticated into a unit's context.
    ///
    /// Sets:
    /// - `task`, `unit`, `record` (resume position)
    UnitEntered,

    /// All records of a unit were visited.
    ///
    /// Sets:
    /// - `task`, `unit`
    UnitCompleted,

    /// A record lookup found nothing; sentinel recorded.
    ///
    /// Sets:
    /// - `task`, `unit`, `record`
    /// - `reason`: record identifier
    RecordNotFound,

    /// Remaining session time fell below the safety threshold.
    ///
    /// Sets:
    /// - `task`, `unit`
    /// - `reason`: remaining seconds
    SessionProbeLow,

    /// Transient failure; a new session will be created after `delay_ms`.
    ///
    /// Sets:
    /// - `task`, `unit`, `record` (resume position)
    /// - `attempt`: consecutive restart count
    /// - `delay_ms`: delay before the new session
    /// - `reason`: the transient error
    SessionRestartScheduled,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task (or helper/subscriber) name, if applicable.
    pub task: Option<Arc<str>>,
    /// Step name, for pipeline events.
    pub step: Option<Arc<str>>,
    /// Work item name, for admission events.
    pub source: Option<Arc<str>>,
    /// Cursor unit index.
    pub unit: Option<usize>,
    /// Cursor record index.
    pub record: Option<usize>,
    /// Restart count.
    pub attempt: Option<u32>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            step: None,
            source: None,
            unit: None,
            record: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task name if one is known.
    #[inline]
    pub fn with_task_opt(mut self, task: Option<&str>) -> Self {
        self.task = task.map(Arc::from);
        self
    }

    /// Attaches a step name.
    #[inline]
    pub fn with_step(mut self, step: impl Into<Arc<str>>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Attaches a work item name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a cursor position.
    #[inline]
    pub fn with_cursor(mut self, unit: usize, record: usize) -> Self {
        self.unit = Some(unit);
        self.record = Some(record);
        self
    }

    /// Attaches a unit index only.
    #[inline]
    pub fn with_unit(mut self, unit: usize) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Attaches a restart count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
