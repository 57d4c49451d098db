//! # Built-in subscribers
//!
//! - [`LogWriter`]: prints events in a human-readable form.

mod log;

pub use log::LogWriter;
