//! # Pipeline executor: runs hooks and requested primaries in contract order.
//!
//! ```text
//! execute_in_order(ctx, ["x", "y"])
//!   ├─► preconditions: EmptyRegistry / TooManyNames / UnknownStep
//!   ├─► before_all*                      (once)
//!   ├─► for name in names:
//!   │     ├─► before_every*
//!   │     ├─► primary(name)              false → on_fail, keep going
//!   │     └─► after_every*
//!   └─► after_all*                       (once)
//! ```
//!
//! ## Rules
//! - A primary returning `false` never halts the run.
//! - Any `Err` from a step or event callback aborts the run immediately; no
//!   retry happens here.
//! - Names may repeat; each occurrence re-runs the step.

use std::sync::Arc;

use crate::error::{StepError, TaskError};
use crate::events::{Event, EventKind};

use super::context::ExecutionContext;
use super::registry::StepRegistry;
use super::step::{Step, StepKind};

/// Result of one requested primary step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Step name.
    pub step: String,
    /// What the step returned.
    pub ok: bool,
}

/// Runs pipelines against a shared registry.
#[derive(Clone, Debug)]
pub struct PipelineExecutor {
    registry: Arc<StepRegistry>,
}

impl PipelineExecutor {
    /// Creates an executor over `registry`.
    pub fn new(registry: Arc<StepRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this executor reads.
    pub fn registry(&self) -> &Arc<StepRegistry> {
        &self.registry
    }

    /// Runs `names` in the caller's order, surrounded by the registered hooks.
    ///
    /// Returns the outcome of each requested primary, in execution order.
    pub async fn execute_in_order<S: AsRef<str>>(
        &self,
        ctx: &ExecutionContext,
        names: &[S],
    ) -> Result<Vec<StepOutcome>, TaskError> {
        let plan = self.resolve(names)?;
        let reg = &self.registry;

        run_hooks(reg.hooks(StepKind::BeforeAll), ctx).await?;

        let mut outcomes = Vec::with_capacity(plan.len());
        for step in plan {
            run_hooks(reg.hooks(StepKind::BeforeEvery), ctx).await?;

            let ok = step.run(ctx).await?;
            publish_outcome(ctx, step.name(), ok);
            outcomes.push(StepOutcome {
                step: step.name().to_string(),
                ok,
            });

            run_hooks(reg.hooks(StepKind::AfterEvery), ctx).await?;
        }

        run_hooks(reg.hooks(StepKind::AfterAll), ctx).await?;
        Ok(outcomes)
    }

    /// Checks preconditions and maps names to primary steps.
    fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<Step>>, StepError> {
        let available = self.registry.primary_count();
        if available == 0 {
            return Err(StepError::EmptyRegistry);
        }
        if names.len() > available {
            return Err(StepError::TooManyNames {
                requested: names.len(),
                available,
            });
        }
        names
            .iter()
            .map(|n| {
                self.registry
                    .primary(n.as_ref())
                    .cloned()
                    .ok_or_else(|| StepError::UnknownStep {
                        name: n.as_ref().to_string(),
                    })
            })
            .collect()
    }
}

async fn run_hooks(hooks: &[Arc<Step>], ctx: &ExecutionContext) -> Result<(), TaskError> {
    for hook in hooks {
        hook.run(ctx).await?;
    }
    Ok(())
}

fn publish_outcome(ctx: &ExecutionContext, step: &str, ok: bool) {
    let Some(bus) = ctx.bus() else { return };
    let kind = if ok {
        EventKind::StepSucceeded
    } else {
        EventKind::StepFailed
    };
    bus.publish(Event::new(kind).with_task_opt(ctx.task()).with_step(step));
}
