//! # Exclusive-UI flag consulted by the tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Set while some operation owns the UI exclusively (e.g. a modal dialog).
///
/// Counting: nested holds are fine, the flag clears when the last guard drops.
#[derive(Clone, Debug, Default)]
pub struct BlockFlag {
    holders: Arc<AtomicUsize>,
}

impl BlockFlag {
    /// Creates a clear flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the UI as held until the returned guard is dropped.
    #[must_use = "the UI is released as soon as the guard is dropped"]
    pub fn hold(&self) -> BlockGuard {
        self.holders.fetch_add(1, Ordering::AcqRel);
        BlockGuard {
            holders: Arc::clone(&self.holders),
        }
    }

    /// True while at least one guard lives.
    pub fn is_held(&self) -> bool {
        self.holders.load(Ordering::Acquire) > 0
    }
}

/// Releases its hold on drop.
#[derive(Debug)]
pub struct BlockGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for BlockGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::AcqRel);
    }
}
