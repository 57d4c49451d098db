//! # Work items, extraction plans and produced results.
//!
//! ```text
//! WorkItem ──PlanSource::load──► ExtractionPlan ──ExtractionLoop──► ResultTable
//!                                                                        │
//!                              ExtractionResult { table, source_* } ◄────┘
//!                                        │
//!                              ResultQueue ──► ResultSink::persist
//! ```

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::TaskError;

use super::table::ResultTable;

/// One unit of work: an input source to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Display name of the source.
    pub source_name: String,
    /// Where the source lives.
    pub source_path: PathBuf,
}

impl WorkItem {
    /// Creates a work item.
    pub fn new(source_name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_name: source_name.into(),
            source_path: source_path.into(),
        }
    }
}

/// What one extraction run walks: every record of every unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionPlan {
    /// Units (organizations), outer loop.
    pub units: Vec<String>,
    /// Records (persons), inner loop, identical for every unit.
    pub records: Vec<String>,
    /// Field columns exported in the result table.
    pub columns: Vec<String>,
}

impl ExtractionPlan {
    /// Total lookups the plan requires.
    pub fn size(&self) -> usize {
        self.units.len() * self.records.len()
    }
}

/// Turns a work item into an extraction plan (reads the source file).
pub trait PlanSource: Send + Sync + 'static {
    /// Loads the plan for `item`.
    fn load(&self, item: &WorkItem) -> Result<ExtractionPlan, TaskError>;
}

/// Finished table tagged with the work item that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Extracted rows.
    pub table: ResultTable,
    /// Source display name.
    pub source_name: String,
    /// Source location.
    pub source_path: PathBuf,
}

impl ExtractionResult {
    /// Tags `table` with `item`.
    pub fn new(table: ResultTable, item: &WorkItem) -> Self {
        Self {
            table,
            source_name: item.source_name.clone(),
            source_path: item.source_path.clone(),
        }
    }
}

/// Persists finished results (e.g. writes a spreadsheet next to the source).
#[async_trait]
pub trait ResultSink: Send + Sync + 'static {
    /// Stores one result.
    async fn persist(&self, result: ExtractionResult) -> Result<(), TaskError>;
}
