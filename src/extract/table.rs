//! # Result table accumulated by one extraction run.
//!
//! Rows are keyed by cursor position, so a record committed twice (possible
//! only if a caller resumes behind its own cursor) overwrites rather than
//! duplicates.

use std::collections::BTreeMap;

use super::cursor::Cursor;
use super::portal::RecordOutcome;

/// Cell value written for every column of a record the portal does not have.
pub const NOT_FOUND: &str = "NOT FOUND";

/// One committed record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Unit identifier.
    pub unit: String,
    /// Record identifier.
    pub record: String,
    /// What the lookup produced.
    pub outcome: RecordOutcome,
}

/// Ordered set of committed rows plus the column layout used when exporting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: BTreeMap<Cursor, Row>,
}

impl ResultTable {
    /// Creates an empty table exporting the given field columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: BTreeMap::new(),
        }
    }

    /// Commits a fully read record at `at`.
    pub fn commit(
        &mut self,
        at: Cursor,
        unit: impl Into<String>,
        record: impl Into<String>,
        outcome: RecordOutcome,
    ) {
        self.rows.insert(
            at,
            Row {
                unit: unit.into(),
                record: record.into(),
                outcome,
            },
        );
    }

    /// Field columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row at a cursor position.
    pub fn get(&self, at: Cursor) -> Option<&Row> {
        self.rows.get(&at)
    }

    /// Rows in cursor order.
    pub fn rows(&self) -> impl Iterator<Item = (&Cursor, &Row)> {
        self.rows.iter()
    }

    /// Committed row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if nothing was committed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows recorded with the not-found sentinel.
    pub fn not_found_count(&self) -> usize {
        self.rows
            .values()
            .filter(|r| r.outcome.is_not_found())
            .count()
    }

    /// Flattens the table to a header plus one string row per record.
    ///
    /// Header is `unit, record, <columns..>`. Missing fields render empty;
    /// not-found records carry [`NOT_FOUND`] in every field column.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        let mut header = vec!["unit".to_string(), "record".to_string()];
        header.extend(self.columns.iter().cloned());
        grid.push(header);

        for row in self.rows.values() {
            let mut line = vec![row.unit.clone(), row.record.clone()];
            for col in &self.columns {
                let cell = match &row.outcome {
                    RecordOutcome::Found(fields) => fields.get(col).cloned().unwrap_or_default(),
                    RecordOutcome::NotFound => NOT_FOUND.to_string(),
                };
                line.push(cell);
            }
            grid.push(line);
        }
        grid
    }
}
