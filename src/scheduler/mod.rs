//! # Bounded admission of extraction tasks.
//!
//! - [`Queue`] ([`WorkQueue`], [`ResultQueue`]): async FIFOs feeding and draining the pool
//! - [`Scheduler`]: at most `capacity` live tasks, each with its own session
//! - [`TaskBody`] / [`TaskFn`]: what every admitted task runs
//! - [`TaskContext`] / [`TaskId`]: per-task inputs and identity
//!
//! ```text
//! WorkQueue ─► Scheduler ──spawn──► run_task(body, ctx) ──► ResultQueue
//!                  │                      │
//!                  └── slot ◄── CompletionGuard (drop: release + unregister)
//! ```

mod core;
mod live;
mod queue;
mod runner;
mod task;

pub use self::core::Scheduler;
pub use queue::{Queue, ResultQueue, WorkQueue};
pub use task::{TaskBody, TaskContext, TaskFn, TaskId};
