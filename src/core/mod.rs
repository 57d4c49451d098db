//! Runtime core: configuration, tick loop, helpers and orchestration.
//!
//! The public entry point is [`RuntimeBuilder`] → [`Runtime::run`].
//!
//! Internal modules:
//! - [`config`]: global settings and the tick-period clamp;
//! - [`tick`]: the cooperative loop (UI pump, then admission);
//! - [`helpers`]: periodic background helpers with ordered shutdown;
//! - [`runtime`]: runs the loop, drains tasks, stops helpers;
//! - [`builder`]: assembles a runtime from its collaborators.

mod builder;
mod config;
mod helpers;
mod runtime;
mod tick;

pub use builder::{PERSIST_POLL, RuntimeBuilder};
pub use config::{Config, DEFAULT_REFRESH_HZ, MAX_REFRESH_HZ, MIN_REFRESH_HZ};
pub use helpers::{HelperSet, persist_results};
pub use runtime::Runtime;
pub use tick::{Admitter, TickLoop};
