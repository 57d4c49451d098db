//! # Named-step pipelines.
//!
//! - [`Step`] / [`StepKind`] / [`Param`]: a named, boolean-returning unit of work
//! - [`StepEvent`]: the `on_success` / `on_fail` callbacks each step owns
//! - [`ExecutionContext`] / [`StepArgs`]: named resources handed to steps
//! - [`StepRegistry`]: primaries by name plus four ordered hook lists
//! - [`PipelineExecutor`]: runs hooks and requested primaries in order
//!
//! ## Wiring
//! ```text
//! startup:  StepRegistry::register(..)  ─►  Arc<StepRegistry>
//!                                                │
//! per task: PipelineExecutor::execute_in_order(ctx, names)
//!             └─ ctx = { browser, session, page, work_item, results, task_id }
//! ```

mod context;
mod executor;
mod registry;
mod step;
mod step_event;

pub use context::{ExecutionContext, STEP_FIELD, StepArgs, StepInfo};
pub use executor::{PipelineExecutor, StepOutcome};
pub use registry::StepRegistry;
pub use step::{IntoStepValue, Param, Step, StepKind, StepValue};
pub use step_event::StepEvent;
