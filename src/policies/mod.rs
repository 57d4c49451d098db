//! Session-restart delay policies.
//!
//! When a task hits a transient failure (session expired, navigation timeout)
//! the extraction loop waits before opening a fresh session.
//!
//! - [`BackoffPolicy`] how the delay evolves with consecutive restarts
//! - [`JitterPolicy`]  randomization so sibling tasks don't log in simultaneously
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0 (constant), max=30s, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
