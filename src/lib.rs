//! # portalvisor
//!
//! **Portalvisor** is a bounded, resumable extraction runtime for
//! browser-driven portals.
//!
//! It runs a list of work items (input sheets) through a portal: each item
//! becomes a task holding its own browser session, at most `capacity` tasks
//! are live at once, and each task either runs a named-step pipeline or walks
//! a two-level `(unit, record)` plan that survives session expiry by
//! restarting the session and resuming from its cursor.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   WorkQueue (sheets to process)
//!        │
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runtime                                                          │
//! │   TickLoop (fixed rate)                                           │
//! │    ├─ UiPump      service UI events unless BlockFlag is held      │
//! │    └─ Admitter    while can_admit(): Scheduler::admit_next()      │
//! │   Scheduler  (Semaphore(capacity), live registry, lifetime count) │
//! │   HelperSet  (result persistence, ...)                            │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌───────────┐      ┌───────────┐      ┌───────────┐
//!   │ task #1   │      │ task #2   │      │ task #K   │   own session each
//!   │ TaskBody  │      │ TaskBody  │      │ TaskBody  │
//!   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘
//!         │ PipelineJob: execute_in_order(ctx, names)
//!         │ ExtractionJob: ExtractionLoop::run() ─► ResultQueue
//!         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                   Bus (broadcast channel of Event)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          subscriber_listener ─► SubscriberSet
//!                                                  ├─ worker ─► LogWriter
//!                                                  └─ worker ─► custom
//! ```
//!
//! ### Shutdown
//! ```text
//! UI closed ─► ShutdownRequested
//!          ─► Scheduler::drain(grace) ─► AllStoppedWithin | GraceExceeded
//!          ─► HelperSet::stop_all()   (fastest poller first)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Pipelines**     | Named boolean steps with hooks and success/fail events.  | [`Step`], [`StepRegistry`], [`PipelineExecutor`] |
//! | **Scheduling**    | Bounded admission, one session per task.                 | [`Scheduler`], [`TaskBody`], [`WorkQueue`]  |
//! | **Extraction**    | Resumable `(unit, record)` walk with session restarts.   | [`ExtractionLoop`], [`Cursor`], [`Portal`]  |
//! | **Runtime**       | Tick loop, drain, ordered helper shutdown.               | [`RuntimeBuilder`], [`Runtime`], [`Config`] |
//! | **Subscriber API**| Hook into runtime events.                                | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for wiring, tasks and the runtime.          | [`StepError`], [`TaskError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use portalvisor::{ExecutionContext, PipelineExecutor, Step, StepKind, StepRegistry, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = StepRegistry::new();
//!     registry.register(Step::new("announce", StepKind::BeforeAll, |_| async {
//!         Ok::<_, TaskError>(true)
//!     }))?;
//!     registry.register(
//!         Step::primary("check_sheet", |args| async move {
//!             let rows = args.get::<usize>("rows")?;
//!             Ok::<_, TaskError>(*rows > 0)
//!         })
//!         .with_params(["rows"]),
//!     )?;
//!
//!     let exec = PipelineExecutor::new(Arc::new(registry));
//!     let ctx = ExecutionContext::new().with("rows", 12usize);
//!     let outcomes = exec.execute_in_order(&ctx, &["check_sheet"]).await?;
//!     assert!(outcomes[0].ok);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod events;
pub mod extract;
pub mod pipeline;
pub mod policies;
pub mod scheduler;
pub mod subscribers;
pub mod ui;

#[cfg(test)]
mod testkit;

// ---- Public re-exports ----

pub use self::core::{Admitter, Config, HelperSet, Runtime, RuntimeBuilder, TickLoop};
pub use error::{RuntimeError, StepError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use extract::{
    Browser, Cursor, ExtractionJob, ExtractionLoop, ExtractionPlan, ExtractionResult,
    ExtractionSettings, Locator, Page, PipelineJob, PlanSource, Portal, RecordOutcome,
    ResultSink, ResultTable, Session, Tab, WorkItem,
};
pub use pipeline::{
    ExecutionContext, PipelineExecutor, Step, StepArgs, StepEvent, StepKind, StepOutcome,
    StepRegistry,
};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use scheduler::{ResultQueue, Scheduler, TaskBody, TaskContext, TaskFn, TaskId, WorkQueue};
pub use subscribers::{Subscribe, SubscriberSet};
pub use ui::{BlockFlag, UiSurface};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
