#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
type SizeMap = HashMap<usize, u32>;
#[cfg(not(feature = "std"))]
type SizeMap = BTreeMap<usize, u32>;

/// Sparse per-index cache of measured item sizes.
///
/// Unmeasured indexes report the default size. [`SizeCache::set`] is the only gate between a
/// measurement and a recompute: it reports a change only when the effective size moves.
#[derive(Clone, Debug)]
pub struct SizeCache {
    sizes: SizeMap,
    default_size: u32,
}

impl SizeCache {
    pub fn new(default_size: u32) -> Self {
        Self {
            sizes: SizeMap::new(),
            default_size,
        }
    }

    pub fn default_size(&self) -> u32 {
        self.default_size
    }

    /// Returns the measured size for `index`, or the default size when it was never measured.
    pub fn get(&self, index: usize) -> u32 {
        self.sizes
            .get(&index)
            .copied()
            .unwrap_or(self.default_size)
    }

    /// Stores `size` for `index` and returns `true` if the effective size changed.
    ///
    /// Re-measuring the same value (including the default for an unmeasured item) is a no-op.
    pub fn set(&mut self, index: usize, size: u32) -> bool {
        if self.get(index) == size {
            return false;
        }
        self.sizes.insert(index, size);
        true
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.sizes.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn clear(&mut self) {
        self.sizes.clear();
    }

    /// Iterates cached entries. Order is unspecified with `feature = "std"`.
    pub fn for_each(&self, mut f: impl FnMut(usize, u32)) {
        for (&index, &size) in &self.sizes {
            f(index, size);
        }
    }
}
