use alloc::collections::BTreeSet;

/// Tracks the lowest index whose offsets must be recomputed by the engine.
///
/// Two sources feed the flush floor:
/// - the dirty floor, lowered by [`DirtyIndexTracker::mark_dirty`] and reset after each flush;
/// - the mounted rows that are still waiting for their first measurement. Those rows are laid
///   out with the default size and may shift everything after them once measured.
#[derive(Clone, Debug)]
pub struct DirtyIndexTracker {
    floor: usize,
    clean: usize,
    pending: BTreeSet<usize>,
}

impl DirtyIndexTracker {
    pub fn new(item_count: usize) -> Self {
        let clean = item_count.saturating_add(1);
        Self {
            floor: clean,
            clean,
            pending: BTreeSet::new(),
        }
    }

    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn is_dirty(&self) -> bool {
        self.floor < self.clean
    }

    pub fn mark_dirty(&mut self, index: usize) {
        self.floor = self.floor.min(index);
    }

    /// Adds a freshly mounted row to the pending set.
    pub fn mount(&mut self, index: usize) {
        self.pending.insert(index);
    }

    /// Removes a row from the pending set once its first measurement was recorded.
    pub fn settle(&mut self, index: usize) {
        self.pending.remove(&index);
    }

    pub fn unmount(&mut self, index: usize) {
        self.pending.remove(&index);
    }

    pub fn first_pending(&self) -> Option<usize> {
        self.pending.first().copied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the index the engine must recompute from, or `None` when a flush would be a
    /// no-op (nothing dirty and no pending rows).
    pub fn compute_flush_floor(&self) -> Option<usize> {
        let dirty = self.is_dirty().then_some(self.floor);
        match (dirty, self.first_pending()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Marks everything clean. `item_count + 1` is above any valid index.
    pub fn reset_after_flush(&mut self, item_count: usize) {
        self.clean = item_count.saturating_add(1);
        self.floor = self.clean;
    }
}
