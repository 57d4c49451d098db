//! # Portal collaborator: the two site-specific operations of an extraction run.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::TaskError;

use super::browser::Tab;

/// Field name → value read from one record's page.
pub type Fields = BTreeMap<String, String>;

/// Outcome of looking one record up.
///
/// A missing record is a normal result, not an error: the loop records the
/// sentinel and moves on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record exists; these are its fields.
    Found(Fields),
    /// The portal has no such record.
    NotFound,
}

impl RecordOutcome {
    /// True for [`RecordOutcome::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordOutcome::NotFound)
    }
}

/// Site-specific navigation.
#[async_trait]
pub trait Portal: Send + Sync + 'static {
    /// Authenticates into `unit`'s context inside the given tab.
    async fn enter_unit(&self, tab: &Tab, unit: &str) -> Result<(), TaskError>;

    /// Reads `record` within the current unit.
    ///
    /// Must return only after the record has been fully read, so the caller can
    /// commit it atomically.
    async fn lookup(&self, tab: &Tab, unit: &str, record: &str)
    -> Result<RecordOutcome, TaskError>;
}
