use std::sync::{Arc, PoisonError, RwLock};

use crate::IncidentIndex;

/// The active [`IncidentIndex`] of a serving process.
///
/// Readers take a cheap `Arc` snapshot with [`SharedIndex::current`] and
/// query it without holding any lock. [`SharedIndex::replace`] swaps in a
/// freshly built index; snapshots taken before the swap keep answering
/// from the old instance until they are dropped.
#[derive(Debug)]
pub struct SharedIndex {
    active: RwLock<Arc<IncidentIndex>>,
}

impl SharedIndex {
    /// Wraps an initial index.
    #[must_use]
    pub fn new(index: IncidentIndex) -> Self {
        Self {
            active: RwLock::new(Arc::new(index)),
        }
    }

    /// Snapshot of the active index.
    #[must_use]
    pub fn current(&self) -> Arc<IncidentIndex> {
        // The guarded value is a single `Arc`, so a poisoned lock still
        // holds a complete index.
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Makes `index` the active index and returns the one it replaced.
    pub fn replace(&self, index: IncidentIndex) -> Arc<IncidentIndex> {
        let next = Arc::new(index);
        log::info!("Swapping active incident index ({} incidents)", next.len());
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}
