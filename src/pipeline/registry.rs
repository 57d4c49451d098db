//! # Step registry: primary steps by name plus four ordered hook lists.
//!
//! ```text
//! StepRegistry
//!   ├─ primaries     name → Step   (unique names, insertion order kept)
//!   ├─ before_all    [Step, ...]   (registration order)
//!   ├─ before_every  [Step, ...]
//!   ├─ after_every   [Step, ...]
//!   └─ after_all     [Step, ...]
//! ```
//!
//! ## Rules
//! - A primary's name is unique across the whole registry, hooks included.
//!   Hooks may share names with other hooks.
//! - Lookup, containment and iteration scan primaries first, then hooks in the
//!   fixed order `before_all, before_every, after_every, after_all`.
//! - Built once at startup and then shared read-only (`Arc<StepRegistry>`).

use std::sync::Arc;

use crate::error::StepError;

use super::step::{Step, StepKind};

/// Holds the steps a pipeline can run.
#[derive(Debug, Default)]
pub struct StepRegistry {
    primaries: Vec<Arc<Step>>,
    before_all: Vec<Arc<Step>>,
    before_every: Vec<Arc<Step>>,
    after_every: Vec<Arc<Step>>,
    after_all: Vec<Arc<Step>>,
}

impl StepRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a step under its kind.
    ///
    /// Parameter declarations are validated here, so a miswired step fails at
    /// startup rather than in the middle of a run.
    pub fn register(&mut self, step: Step) -> Result<Arc<Step>, StepError> {
        step.validate()?;
        let taken = match step.kind() {
            StepKind::Primary => self.contains(step.name()),
            _ => self.primary(step.name()).is_some(),
        };
        if taken {
            return Err(StepError::DuplicateStep {
                name: step.name().to_string(),
            });
        }
        let step = Arc::new(step);
        self.list_mut(step.kind()).push(Arc::clone(&step));
        Ok(step)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, step: Step) -> Result<Self, StepError> {
        self.register(step)?;
        Ok(self)
    }

    /// Removes a step. Primaries are matched by name, hooks by identity.
    ///
    /// Returns `None` if the step was not registered.
    pub fn remove(&mut self, step: &Step) -> Option<Arc<Step>> {
        let list = self.list_mut(step.kind());
        let pos = if step.kind() == StepKind::Primary {
            list.iter().position(|s| s.name() == step.name())
        } else {
            list.iter().position(|s| std::ptr::eq(s.as_ref(), step))
        }?;
        Some(list.remove(pos))
    }

    /// Looks a step up by name: primaries first, then hooks.
    pub fn get(&self, name: &str) -> Result<Arc<Step>, StepError> {
        self.iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| StepError::NotFound {
                name: name.to_string(),
            })
    }

    /// True if any step (primary or hook) carries this name.
    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|s| s.name() == name)
    }

    /// Primary step by name.
    pub fn primary(&self, name: &str) -> Option<&Arc<Step>> {
        self.primaries.iter().find(|s| s.name() == name)
    }

    /// Number of primary steps.
    pub fn primary_count(&self) -> usize {
        self.primaries.len()
    }

    /// Primary step names, in registration order.
    pub fn primary_names(&self) -> impl Iterator<Item = &str> {
        self.primaries.iter().map(|s| s.name())
    }

    /// Hooks of one kind, in registration order. Empty for [`StepKind::Primary`].
    pub fn hooks(&self, kind: StepKind) -> &[Arc<Step>] {
        match kind {
            StepKind::Primary => &[],
            StepKind::BeforeAll => &self.before_all,
            StepKind::BeforeEvery => &self.before_every,
            StepKind::AfterEvery => &self.after_every,
            StepKind::AfterAll => &self.after_all,
        }
    }

    /// All steps: primaries, then `before_all, before_every, after_every, after_all`.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Step>> {
        self.primaries
            .iter()
            .chain(&self.before_all)
            .chain(&self.before_every)
            .chain(&self.after_every)
            .chain(&self.after_all)
    }

    /// Total number of registered steps.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_mut(&mut self, kind: StepKind) -> &mut Vec<Arc<Step>> {
        match kind {
            StepKind::Primary => &mut self.primaries,
            StepKind::BeforeAll => &mut self.before_all,
            StepKind::BeforeEvery => &mut self.before_every,
            StepKind::AfterEvery => &mut self.after_every,
            StepKind::AfterAll => &mut self.after_all,
        }
    }
}
