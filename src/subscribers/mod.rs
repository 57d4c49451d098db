//! # Event subscribers for the portalvisor runtime.
//!
//! Subscribers observe the runtime [`Bus`](crate::events::Bus) through the
//! [`SubscriberSet`] fan-out. Typical uses: progress logging, persisting
//! checkpoints, counting not-found records, alerting on fatal task errors.
//!
//! ```text
//! Task ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                  ┌─────────┼─────────┐
//!                                                  ▼         ▼         ▼
//!                                              LogWriter  Progress   Custom
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
