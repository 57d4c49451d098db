//! # Task identity, per-task context and the body a task runs.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::events::Bus;
use crate::extract::{Browser, Tab, WorkItem};

use super::queue::ResultQueue;

/// Identity of one admitted task: `"<browser kind>#<index>"`.
///
/// Used for logs and live-task snapshots, never for correctness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    index: u64,
    label: Arc<str>,
}

impl TaskId {
    /// Builds the identity of the `index`-th task on a `kind` browser.
    pub fn new(kind: &str, index: u64) -> Self {
        Self {
            index,
            label: Arc::from(format!("{kind}#{index}")),
        }
    }

    /// Monotonic admission index (1-based).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Display label.
    pub fn as_str(&self) -> &str {
        &self.label
    }

    pub(crate) fn label(&self) -> Arc<str> {
        Arc::clone(&self.label)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Everything a task body receives.
#[derive(Clone)]
pub struct TaskContext {
    /// Task identity.
    pub id: TaskId,
    /// The work item this task processes.
    pub item: WorkItem,
    /// Shared browser (for replacement sessions).
    pub browser: Arc<dyn Browser>,
    /// Session and page opened for this task at admission.
    pub tab: Tab,
    /// Where finished results go.
    pub results: ResultQueue,
    /// Runtime event bus.
    pub bus: Bus,
}

/// # What an admitted task runs.
///
/// One shared body serves every task; per-task state arrives in [`TaskContext`].
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use portalvisor::{TaskBody, TaskContext, TaskError};
///
/// struct Noop;
///
/// #[async_trait]
/// impl TaskBody for Noop {
///     fn name(&self) -> &str { "noop" }
///
///     async fn run(&self, _ctx: TaskContext) -> Result<(), TaskError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskBody: Send + Sync + 'static {
    /// Stable, human-readable body name.
    fn name(&self) -> &str;

    /// Processes one work item.
    async fn run(&self, ctx: TaskContext) -> Result<(), TaskError>;
}

/// Closure-backed [`TaskBody`].
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Wraps a closure creating one future per task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Same as [`new`](Self::new), returned as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> TaskBody for TaskFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: TaskContext) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_combines_kind_and_index() {
        let id = TaskId::new("chromium", 7);
        assert_eq!(id.as_str(), "chromium#7");
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "chromium#7");
    }

    #[test]
    fn task_fn_keeps_name() {
        let body = TaskFn::new("extract", |_ctx: TaskContext| async { Ok::<(), TaskError>(()) });
        assert_eq!(body.name(), "extract");
    }
}
