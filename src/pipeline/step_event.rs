//! # One-shot lifecycle callbacks attached to a step.
//!
//! Every [`Step`](super::Step) owns two [`StepEvent`]s: `on_success` and
//! `on_fail`. At most one callback is bound to an event at a time.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{StepError, TaskError};

use super::context::ExecutionContext;

type EventCallback =
    Arc<dyn Fn(ExecutionContext) -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;

/// A named hook slot owned by a step.
pub struct StepEvent {
    name: String,
    owner: Arc<str>,
    callback: Mutex<Option<EventCallback>>,
}

impl StepEvent {
    pub(crate) fn new(owner: Arc<str>, suffix: &str) -> Self {
        Self {
            name: format!("{owner}.{suffix}"),
            owner,
            callback: Mutex::new(None),
        }
    }

    /// Event name, `"<step>.on_success"` or `"<step>.on_fail"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the step owning this event.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Binds a callback.
    ///
    /// Fails with [`StepError::AlreadyBound`] if one is already bound.
    pub fn bind<F, Fut>(&self, f: F) -> Result<(), StepError>
    where
        F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(StepError::AlreadyBound {
                event: self.name.clone(),
            });
        }
        *slot = Some(Arc::new(move |ctx| f(ctx).boxed()));
        Ok(())
    }

    /// Removes the bound callback.
    ///
    /// Fails with [`StepError::NotBound`] if nothing is bound.
    pub fn unbind(&self) -> Result<(), StepError> {
        match self.slot().take() {
            Some(_) => Ok(()),
            None => Err(StepError::NotBound {
                event: self.name.clone(),
            }),
        }
    }

    /// True if a callback is bound.
    pub fn is_bound(&self) -> bool {
        self.slot().is_some()
    }

    /// Runs the bound callback to completion; no-op when unbound.
    pub async fn run(&self, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let cb = self.slot().clone();
        match cb {
            Some(cb) => cb(ctx.clone()).await,
            None => Ok(()),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<EventCallback>> {
        self.callback.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for StepEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEvent")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}
