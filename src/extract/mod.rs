//! # Portal extraction: collaborators, resumable loop and task bodies.
//!
//! - [`Browser`] / [`Session`] / [`Page`] / [`Locator`]: the automation driver contract
//! - [`Portal`] / [`RecordOutcome`]: site-specific unit entry and record lookup
//! - [`Cursor`]: `(unit, record)` resumption point
//! - [`ResultTable`]: committed rows, with the [`NOT_FOUND`] sentinel
//! - [`ExtractionLoop`]: walks a plan, restarting sessions on transient failures
//! - [`ExtractionJob`] / [`PipelineJob`]: what scheduler tasks run
//!
//! ```text
//! WorkItem ─► PlanSource ─► ExtractionPlan ─► ExtractionLoop ─► ResultTable ─► ResultQueue
//!                                                  │
//!                                  Browser ─► Session ─► Page ◄─ Portal
//! ```

mod browser;
mod cursor;
mod extraction;
mod job;
mod portal;
mod table;
mod work;

pub use browser::{Browser, Locator, Page, Session, Tab};
pub use cursor::Cursor;
pub use extraction::{ExtractionLoop, ExtractionSettings};
pub use job::{ExtractionJob, PipelineJob, fields};
pub use portal::{Fields, Portal, RecordOutcome};
pub use table::{NOT_FOUND, ResultTable, Row};
pub use work::{ExtractionPlan, ExtractionResult, PlanSource, ResultSink, WorkItem};
