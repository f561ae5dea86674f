use alloc::rc::Weak;
use core::cell::RefCell;

use crate::Rect;
use crate::list::ListState;

/// The outbound side of a viewport virtualization engine.
///
/// The engine owns offsets, visible ranges and the real scroll position; this crate only
/// tells it when cached offsets went stale and where to scroll back to.
pub trait ListEngine {
    /// Total number of items the engine currently knows about.
    fn item_count(&self) -> usize;

    /// Drops cached offsets for `index..` and re-reads sizes through `item_size`.
    ///
    /// Implementations must keep the current scroll offset.
    fn recompute_from(&mut self, index: usize, item_size: &dyn Fn(usize) -> u32);

    /// Scrolls so that `index` is the first item in the viewport.
    fn scroll_to_item(&mut self, index: usize);
}

impl<E: ListEngine + ?Sized> ListEngine for &mut E {
    fn item_count(&self) -> usize {
        (**self).item_count()
    }

    fn recompute_from(&mut self, index: usize, item_size: &dyn Fn(usize) -> u32) {
        (**self).recompute_from(index, item_size);
    }

    fn scroll_to_item(&mut self, index: usize) {
        (**self).scroll_to_item(index);
    }
}

/// The size-lookup function handed to the engine.
///
/// It reads the live cache of the list that created it. Once that list is dropped or its
/// items are replaced, every lookup returns the default size.
#[derive(Clone, Debug)]
pub struct SizeLookup {
    state: Weak<RefCell<ListState>>,
    epoch: u64,
    default_size: u32,
}

impl SizeLookup {
    pub(crate) fn new(state: Weak<RefCell<ListState>>, epoch: u64, default_size: u32) -> Self {
        Self {
            state,
            epoch,
            default_size,
        }
    }

    pub fn size(&self, index: usize) -> u32 {
        let Some(state) = self.state.upgrade() else {
            return self.default_size;
        };
        let Ok(state) = state.try_borrow() else {
            vwarn!(index, "SizeLookup: list state is borrowed, using default size");
            return self.default_size;
        };
        if state.epoch() != self.epoch {
            return self.default_size;
        }
        state.item_size(index)
    }
}

/// Everything an engine needs to render a non-empty list.
#[derive(Clone, Debug)]
pub struct EngineRegistration {
    pub item_count: usize,
    pub overscan: usize,
    /// `None` until the host reported a viewport.
    pub viewport: Option<Rect>,
    pub item_size: SizeLookup,
}
