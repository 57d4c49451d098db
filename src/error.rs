//! Error types used by the portalvisor runtime, pipelines and extraction tasks.
//!
//! This module defines three error enums:
//!
//! - [`StepError`]: step wiring mistakes (configuration errors and contract violations).
//! - [`TaskError`]: failures raised while a task talks to the portal.
//! - [`RuntimeError`]: failures of the scheduler / tick loop itself.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging, and
//! [`TaskError::is_transient`] drives the session-restart decision.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by step registration and pipeline execution.
///
/// Every variant is fatal to the call that triggered it and is never retried.
/// The first group are configuration errors (registry setup), the second group
/// are contract violations (a step wired incorrectly).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The name clashes with a registered step (primaries are unique across all kinds).
    #[error("step '{name}' is already registered")]
    DuplicateStep {
        /// Offending step name.
        name: String,
    },

    /// A step kind string did not name any known kind.
    #[error("unknown step kind '{kind}'")]
    UnknownStepKind {
        /// The unparsed kind.
        kind: String,
    },

    /// Pipeline requested on a registry without primary steps.
    #[error("no primary steps registered")]
    EmptyRegistry,

    /// More names requested than primary steps exist.
    #[error("{requested} step names requested but only {available} primary steps registered")]
    TooManyNames {
        /// Number of names passed to the pipeline.
        requested: usize,
        /// Number of registered primary steps.
        available: usize,
    },

    /// Requested name is not a registered primary step.
    #[error("'{name}' is not a registered primary step")]
    UnknownStep {
        /// Requested name.
        name: String,
    },

    /// Lookup by name found nothing.
    #[error("step '{name}' not found")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// The step callback returned something other than a boolean.
    #[error("step '{step}' returned {found}, expected bool")]
    NonBooleanReturn {
        /// Step name.
        step: String,
        /// Type name of the returned value.
        found: &'static str,
    },

    /// The execution context already uses the name reserved for the running step.
    #[error("context field '{name}' is reserved")]
    ReservedArgument {
        /// Reserved field name.
        name: String,
    },

    /// The step reads a field the context does not carry.
    #[error("step '{step}' requires context field '{name}'")]
    MissingArgument {
        /// Step name.
        step: String,
        /// Missing field name.
        name: String,
    },

    /// The step declares a parameter with a default value.
    #[error("step '{step}' declares a default for parameter '{name}'")]
    DefaultArgument {
        /// Step name.
        step: String,
        /// Parameter name.
        name: String,
    },

    /// A callback is already bound to the event.
    #[error("event '{event}' already has a callback bound")]
    AlreadyBound {
        /// Event name.
        event: String,
    },

    /// Unbind called on an event without a callback.
    #[error("event '{event}' has no callback bound")]
    NotBound {
        /// Event name.
        event: String,
    },
}

impl StepError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use portalvisor::StepError;
    ///
    /// let err = StepError::EmptyRegistry;
    /// assert_eq!(err.as_label(), "step_empty_registry");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StepError::DuplicateStep { .. } => "step_duplicate",
            StepError::UnknownStepKind { .. } => "step_unknown_kind",
            StepError::EmptyRegistry => "step_empty_registry",
            StepError::TooManyNames { .. } => "step_too_many_names",
            StepError::UnknownStep { .. } => "step_unknown",
            StepError::NotFound { .. } => "step_not_found",
            StepError::NonBooleanReturn { .. } => "step_non_boolean_return",
            StepError::ReservedArgument { .. } => "step_reserved_argument",
            StepError::MissingArgument { .. } => "step_missing_argument",
            StepError::DefaultArgument { .. } => "step_default_argument",
            StepError::AlreadyBound { .. } => "event_already_bound",
            StepError::NotBound { .. } => "event_not_bound",
        }
    }

    /// True for registry setup mistakes, false for wiring contract violations.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StepError::DuplicateStep { .. }
                | StepError::UnknownStepKind { .. }
                | StepError::EmptyRegistry
                | StepError::TooManyNames { .. }
                | StepError::UnknownStep { .. }
                | StepError::NotFound { .. }
        )
    }
}

/// # Errors produced while a task drives the portal.
///
/// `SessionExpired` and `NavigationTimeout` are transient: the extraction loop
/// discards the session and resumes from its cursor. Everything else aborts the task.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The portal session ended (logout, expiry, or low remaining time).
    #[error("session expired: {reason}")]
    SessionExpired {
        /// What detected the expiry.
        reason: String,
    },

    /// A browser interaction exceeded its wait timeout.
    #[error("navigation timed out after {timeout:?}")]
    NavigationTimeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (aborts the task).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// A step wiring error surfaced while running a pipeline.
    #[error(transparent)]
    Step(#[from] StepError),
}

impl TaskError {
    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::SessionExpired`].
    pub fn session_expired(reason: impl Into<String>) -> Self {
        TaskError::SessionExpired {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use portalvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::NavigationTimeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_navigation_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::SessionExpired { .. } => "task_session_expired",
            TaskError::NavigationTimeout { .. } => "task_navigation_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Step(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::SessionExpired { reason } => format!("session expired: {reason}"),
            TaskError::NavigationTimeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Step(e) => format!("step: {e}"),
        }
    }

    /// Indicates whether the error is an infra hiccup that a fresh session can fix.
    ///
    /// # Example
    /// ```
    /// use portalvisor::TaskError;
    ///
    /// assert!(TaskError::session_expired("logout").is_transient());
    /// assert!(!TaskError::fatal("nope").is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TaskError::SessionExpired { .. } | TaskError::NavigationTimeout { .. }
        )
    }
}

/// # Errors produced by the portalvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The work queue was closed while admission waited on it.
    #[error("work queue closed")]
    QueueClosed,

    /// The scheduler's slot pool was closed while waiting for a slot.
    ///
    /// The scheduler never closes its own pool; this only surfaces if the
    /// semaphore is closed from outside.
    #[error("scheduler slots closed")]
    SlotsClosed,

    /// The browser could not hand out a session or page for a new task.
    #[error("session unavailable: {0}")]
    SessionUnavailable(#[source] TaskError),

    /// Drain window was exceeded; some tasks were still live.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Identities of tasks that did not finish in time.
        stuck: Vec<String>,
    },

    /// A background helper panicked instead of stopping.
    #[error("helper '{name}' panicked")]
    HelperPanicked {
        /// Helper name.
        name: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use portalvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::QueueClosed => "runtime_queue_closed",
            RuntimeError::SlotsClosed => "runtime_slots_closed",
            RuntimeError::SessionUnavailable(_) => "runtime_session_unavailable",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::HelperPanicked { .. } => "runtime_helper_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::QueueClosed => "work queue closed".to_string(),
            RuntimeError::SlotsClosed => "scheduler slots closed".to_string(),
            RuntimeError::SessionUnavailable(e) => format!("session unavailable: {e}"),
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
            RuntimeError::HelperPanicked { name } => format!("helper panicked: {name}"),
        }
    }
}
