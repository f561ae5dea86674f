/// A platform-agnostic viewport rect.
///
/// - `main` is the virtualized axis size (e.g. height for vertical lists)
/// - `cross` is the cross axis size (e.g. width for vertical lists)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub main: u32,
    pub cross: u32,
}

/// A lightweight snapshot of the list's bookkeeping, useful for debugging and overlays.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListSnapshot {
    /// Incremented every time the item collection is replaced.
    pub epoch: u64,
    pub item_count: usize,
    pub mounted_rows: usize,
    pub measured_items: usize,
    pub anchor_index: usize,
    /// `item_count + 1` when nothing is dirty.
    pub dirty_floor: usize,
    pub flush_pending: bool,
    /// Number of recompute commands issued to the engine in the current epoch.
    pub flushes: u64,
}
