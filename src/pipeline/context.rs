//! # Execution context shared by every step of one pipeline run.
//!
//! [`ExecutionContext`] is a bag of named, type-erased resources (browser,
//! session, page, work item, result queue...). It is cheap to clone: every
//! resource sits behind an `Arc`.
//!
//! A step never sees the whole bag. It declares the fields it reads
//! ([`Param`](super::Param)) and receives a [`StepArgs`] holding exactly those,
//! plus a description of itself under the reserved name [`STEP_FIELD`].
//!
//! ```rust
//! use portalvisor::ExecutionContext;
//!
//! let ctx = ExecutionContext::new()
//!     .with("unit", String::from("12.345.678/0001-90"))
//!     .with("retries", 3u32);
//!
//! assert!(ctx.contains("unit"));
//! assert_eq!(ctx.get::<u32>("retries"), Some(&3));
//! assert_eq!(ctx.get::<String>("retries"), None);
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StepError;
use crate::events::Bus;

use super::step::StepKind;

/// Context field name reserved for the running step itself.
pub const STEP_FIELD: &str = "step";

type Resource = Arc<dyn Any + Send + Sync>;

/// Named resources passed to steps and step events.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    fields: BTreeMap<Arc<str>, Resource>,
    bus: Option<Bus>,
    task: Option<Arc<str>>,
}

impl ExecutionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a named resource.
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<Arc<str>>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds (or replaces) a named resource in place.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<Arc<str>>, value: T) {
        self.fields.insert(name.into(), Arc::new(value));
    }

    /// Attaches the bus pipeline events are published on, and the owning task identity.
    pub fn with_bus(mut self, bus: Bus, task: Option<&str>) -> Self {
        self.bus = Some(bus);
        self.task = task.map(Arc::from);
        self
    }

    /// True if a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_ref())
    }

    /// Typed access to a field. `None` if absent or of another type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.fields.get(name)?.downcast_ref::<T>()
    }

    pub(crate) fn bus(&self) -> Option<&Bus> {
        self.bus.as_ref()
    }

    pub(crate) fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    /// Builds the argument view for one step: its declared fields plus itself.
    pub(crate) fn select(
        &self,
        step: StepInfo,
        params: impl IntoIterator<Item = Arc<str>>,
    ) -> Result<StepArgs, StepError> {
        if self.contains(STEP_FIELD) {
            return Err(StepError::ReservedArgument {
                name: STEP_FIELD.to_string(),
            });
        }
        let mut fields = BTreeMap::new();
        for name in params {
            if name.as_ref() == STEP_FIELD {
                continue;
            }
            let Some(value) = self.fields.get(&name) else {
                return Err(StepError::MissingArgument {
                    step: step.name.to_string(),
                    name: name.to_string(),
                });
            };
            fields.insert(name, Arc::clone(value));
        }
        Ok(StepArgs { step, fields })
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("task", &self.task)
            .finish()
    }
}

/// Identity of the running step, handed to its callback as the `step` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepInfo {
    /// Step name.
    pub name: Arc<str>,
    /// Step kind.
    pub kind: StepKind,
}

/// The fields a step declared, resolved against the active context.
pub struct StepArgs {
    step: StepInfo,
    fields: BTreeMap<Arc<str>, Resource>,
}

impl StepArgs {
    /// The running step.
    pub fn step(&self) -> &StepInfo {
        &self.step
    }

    /// Typed access to a declared field.
    ///
    /// Returns [`StepError::MissingArgument`] if the field was not declared,
    /// or holds a value of another type.
    pub fn get<T: Any>(&self, name: &str) -> Result<&T, StepError> {
        self.fields
            .get(name)
            .and_then(|v| v.downcast_ref::<T>())
            .ok_or_else(|| StepError::MissingArgument {
                step: self.step.name.to_string(),
                name: name.to_string(),
            })
    }
}
