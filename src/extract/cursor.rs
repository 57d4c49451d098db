//! # Two-level resumption point of an extraction run.

use std::fmt;

/// `(unit, record)` position inside one extraction run.
///
/// Owned by exactly one [`ExtractionLoop`](super::ExtractionLoop); survives
/// session restarts, reset only when a new work item starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    /// Index into the unit (organization) list.
    pub unit: usize,
    /// Index into the record (person) list.
    pub record: usize,
}

impl Cursor {
    /// Start of a brand-new run.
    pub const START: Cursor = Cursor { unit: 0, record: 0 };

    /// Creates a cursor at an explicit position.
    pub const fn new(unit: usize, record: usize) -> Self {
        Self { unit, record }
    }

    /// Next record in the same unit.
    #[must_use]
    pub const fn next_record(self) -> Self {
        Self {
            unit: self.unit,
            record: self.record + 1,
        }
    }

    /// First record of the next unit.
    #[must_use]
    pub const fn next_unit(self) -> Self {
        Self {
            unit: self.unit + 1,
            record: 0,
        }
    }

    /// True once every unit of a plan with `units` entries has been walked.
    pub const fn is_done(&self, units: usize) -> bool {
        self.unit >= units
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.unit, self.record)
    }
}
