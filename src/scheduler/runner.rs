//! # Run one admitted task body to its end.
//!
//! ```text
//! publish TaskStarted
//!   └─► body.run(ctx) ──► Ok      → publish TaskCompleted
//!                     ──► Err(e)  → publish TaskFailed(e)
//!                     ──► panic   → publish TaskFailed("panic: ..")
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event.
//! - A panicking body is contained here; sibling tasks and the tick loop
//!   never observe it.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;

use super::task::{TaskBody, TaskContext};

/// Executes `body` once for `ctx`, publishing lifecycle events to `bus`.
pub(crate) async fn run_task<B: TaskBody + ?Sized>(
    body: &B,
    ctx: TaskContext,
    bus: &Bus,
) -> Result<(), TaskError> {
    let label = ctx.id.label();
    bus.publish(
        Event::new(EventKind::TaskStarted)
            .with_task(label.clone())
            .with_source(ctx.item.source_name.as_str()),
    );

    let res = match AssertUnwindSafe(body.run(ctx)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(TaskError::fatal(format!(
            "panic: {}",
            panic_message(panic.as_ref())
        ))),
    };

    match &res {
        Ok(()) => bus.publish(Event::new(EventKind::TaskCompleted).with_task(label)),
        Err(e) => bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(label)
                .with_reason(e.as_message()),
        ),
    }
    res
}
