use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::anchor::ScrollAnchor;
use crate::debounce::FlushDebouncer;
use crate::scheduler::RowScheduler;
use crate::timer::TimerQueue;
use crate::{
    AutoSizeListOptions, DirtyIndexTracker, EngineRegistration, ListEngine, ListSnapshot,
    MeasureMode, Rect, SizeCache, SizeLookup,
};

/// Where a row publishes its rendered size.
///
/// The host writes the size after layout (the equivalent of reading an element's height);
/// measurements read it back. An empty ref means "nothing to measure" and is skipped.
#[derive(Clone, Debug, Default)]
pub struct SizeRef(Rc<Cell<Option<u32>>>);

impl SizeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, size: u32) {
        self.0.set(Some(size));
    }

    pub fn clear(&self) {
        self.0.set(None);
    }

    pub fn get(&self) -> Option<u32> {
        self.0.get()
    }
}

/// Lets a row request an immediate measurement of itself.
///
/// The handle is tied to the list state and the item epoch it was created in. Calls after the
/// row unmounted, after the items were replaced, or after the list was dropped are ignored.
///
/// A change arms the flush debounce relative to the last time the list was driven (the latest
/// `now_ms` passed to `advance`, `mount_row` or `on_viewport_resize`).
#[derive(Clone, Debug)]
pub struct MeasureHandle {
    state: Weak<RefCell<ListState>>,
    epoch: u64,
    index: usize,
}

impl MeasureHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Measures the row now. Returns `true` if its cached size changed.
    pub fn measure_now(&self) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let Ok(mut state) = state.try_borrow_mut() else {
            vwarn!(
                index = self.index,
                "MeasureHandle: list state is borrowed, skipping measurement"
            );
            return false;
        };
        if state.epoch != self.epoch {
            return false;
        }
        state.measure(self.index)
    }
}

/// Input to the item renderer.
pub struct ItemProps<'a, T> {
    pub index: usize,
    pub item: &'a T,
    /// The ref the host must keep up to date with this row's rendered size.
    pub size_ref: SizeRef,
    pub measure: MeasureHandle,
    /// Current viewport cross-axis size, for width-dependent layouts.
    pub container_width: u32,
}

impl<T: fmt::Debug> fmt::Debug for ItemProps<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemProps")
            .field("index", &self.index)
            .field("item", self.item)
            .field("size_ref", &self.size_ref)
            .field("container_width", &self.container_width)
            .finish_non_exhaustive()
    }
}

/// What the host should render for the current items.
#[derive(Debug)]
pub enum ListView<R> {
    /// No items: only the empty renderer's output. No engine is involved.
    Empty(R),
    /// Register these values with the engine and render its window.
    Virtualized(EngineRegistration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Task {
    FirstMeasure(usize),
    Remeasure(usize),
    Flush,
    RestoreAnchor,
}

/// State shared between the list and every row handle.
#[derive(Debug)]
pub(crate) struct ListState {
    epoch: u64,
    clock_ms: u64,
    mode: MeasureMode,
    sizes: SizeCache,
    dirty: DirtyIndexTracker,
    rows: BTreeMap<usize, RowScheduler>,
    flush: FlushDebouncer,
    flushes: u64,
    anchor: ScrollAnchor,
    timers: TimerQueue<Task>,
}

impl ListState {
    fn new<T, R>(options: &AutoSizeListOptions<T, R>, item_count: usize) -> Self {
        Self {
            epoch: 0,
            clock_ms: 0,
            mode: options.measure_mode,
            sizes: SizeCache::new(options.default_size),
            dirty: DirtyIndexTracker::new(item_count),
            rows: BTreeMap::new(),
            flush: FlushDebouncer::new(options.flush_debounce_ms),
            flushes: 0,
            anchor: ScrollAnchor::default(),
            timers: TimerQueue::new(),
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn item_size(&self, index: usize) -> u32 {
        self.sizes.get(index)
    }

    fn touch_clock(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    /// Unmounts every row, drops all sizes and any pending flush. The anchor survives.
    fn start_epoch(&mut self, item_count: usize) {
        let rows = core::mem::take(&mut self.rows);
        for (_, mut row) in rows {
            row.cancel(&mut self.timers);
        }
        self.flush.cancel(&mut self.timers);
        self.sizes.clear();
        self.dirty = DirtyIndexTracker::new(item_count);
        self.flushes = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn mount(&mut self, index: usize, size_ref: SizeRef, container_width: u32) -> bool {
        if let Some(row) = self.rows.get_mut(&index) {
            row.set_size_ref(size_ref);
            return false;
        }
        let mut row = RowScheduler::new(size_ref, container_width);
        row.arm(index, self.mode, self.clock_ms, &mut self.timers);
        self.rows.insert(index, row);
        self.dirty.mount(index);
        true
    }

    fn unmount(&mut self, index: usize) -> bool {
        let Some(mut row) = self.rows.remove(&index) else {
            return false;
        };
        row.cancel(&mut self.timers);
        self.dirty.unmount(index);
        true
    }

    /// Reads a mounted row and feeds the result through the cache.
    pub(crate) fn measure(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get_mut(&index) else {
            return false;
        };
        let Some(size) = row.read() else {
            vtrace!(index, "measure: size ref is empty, skipping");
            return false;
        };
        self.dirty.settle(index);
        if !self.sizes.set(index, size) {
            return false;
        }
        vdebug!(index, size, "measure: size changed");
        self.dirty.mark_dirty(index);
        self.flush.schedule(self.clock_ms, &mut self.timers, Task::Flush);
        true
    }

    /// Runs a measurement timer and arms the next periodic one.
    fn on_measure_timer(&mut self, index: usize, fired_at_ms: u64, now_ms: u64) {
        let mode = self.mode;
        let Some(row) = self.rows.get_mut(&index) else {
            return;
        };
        if !row.rearm_interval(index, mode, fired_at_ms, now_ms, &mut self.timers) {
            vtrace!(index, now_ms, "measure timer: no further tick armed");
        }
        self.measure(index);
    }

    fn set_container_width(&mut self, width: u32) {
        let mode = self.mode;
        let stale: Vec<usize> = self
            .rows
            .iter_mut()
            .filter_map(|(&index, row)| row.set_container_width(width, mode).then_some(index))
            .collect();
        for index in stale {
            self.measure(index);
        }
    }

    fn request_restore(&mut self) {
        self.anchor.request_restore(self.clock_ms, &mut self.timers);
    }
}

/// Keeps a virtualization engine fed with measured item sizes and a stable scroll anchor.
///
/// `T` is the item type, `R` the output of the renderers.
///
/// The list never owns the engine. Commands are issued during [`AutoSizeList::advance`] (and
/// [`AutoSizeList::scroll_to_item`]) against whatever engine the host passes in.
pub struct AutoSizeList<T, R> {
    options: AutoSizeListOptions<T, R>,
    items: Arc<[T]>,
    viewport: Option<Rect>,
    state: Rc<RefCell<ListState>>,
}

impl<T, R> AutoSizeList<T, R> {
    pub fn new(items: Arc<[T]>, options: AutoSizeListOptions<T, R>) -> Self {
        vdebug!(
            count = items.len(),
            default_size = options.default_size,
            "AutoSizeList::new"
        );
        let state = ListState::new(&options, items.len());
        Self {
            options,
            items,
            viewport: None,
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn options(&self) -> &AutoSizeListOptions<T, R> {
        &self.options
    }

    pub fn items(&self) -> &Arc<[T]> {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    /// Replaces the item collection.
    ///
    /// Collections are compared by identity (`Arc::ptr_eq`), not by value. Passing the same
    /// `Arc` again keeps every cached size. A different `Arc` starts a new epoch: all rows are
    /// unmounted, their timers cancelled and all cached sizes discarded, since indexes of the
    /// old collection say nothing about the new one.
    ///
    /// Returns `true` when a new epoch was started.
    pub fn set_items(&mut self, items: Arc<[T]>) -> bool {
        if Arc::ptr_eq(&self.items, &items) {
            return false;
        }
        self.items = items;
        let count = self.items.len();
        let mut state = self.state.borrow_mut();
        state.start_epoch(count);
        vdebug!(count, epoch = state.epoch, "set_items: new epoch");
        if count > 0 && self.viewport.is_some() {
            state.request_restore();
        }
        true
    }

    /// Returns what to render: the empty placeholder, or the engine registration.
    pub fn view(&self) -> ListView<R> {
        match self.size_lookup() {
            None => ListView::Empty((self.options.render_empty)()),
            Some(item_size) => ListView::Virtualized(EngineRegistration {
                item_count: self.items.len(),
                overscan: self.options.overscan,
                viewport: self.viewport,
                item_size,
            }),
        }
    }

    /// The size-lookup function for the engine, or `None` while the list is empty.
    pub fn size_lookup(&self) -> Option<SizeLookup> {
        if self.items.is_empty() {
            return None;
        }
        Some(SizeLookup::new(
            Rc::downgrade(&self.state),
            self.state.borrow().epoch,
            self.options.default_size,
        ))
    }

    pub fn item_size(&self, index: usize) -> u32 {
        self.state.borrow().item_size(index)
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.state.borrow().sizes.is_measured(index)
    }

    pub fn anchor_index(&self) -> usize {
        self.state.borrow().anchor.index()
    }

    pub fn is_mounted(&self, index: usize) -> bool {
        self.state.borrow().rows.contains_key(&index)
    }

    /// Earliest pending timer deadline, for hosts that sleep between calls to `advance`.
    pub fn next_deadline(&self) -> Option<u64> {
        self.state.borrow().timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.state.borrow();
        ListSnapshot {
            epoch: state.epoch,
            item_count: self.items.len(),
            mounted_rows: state.rows.len(),
            measured_items: state.sizes.len(),
            anchor_index: state.anchor.index(),
            dirty_floor: state.dirty.floor(),
            flush_pending: state.flush.is_pending(),
            flushes: state.flushes,
        }
    }

    /// Reports the viewport rect (the auto-sizer output).
    ///
    /// The first report and every change post one deferred scroll-to-anchor. A cross-axis
    /// change is forwarded to every mounted row as its new container width.
    pub fn on_viewport_resize(&mut self, rect: Rect, now_ms: u64) {
        if self.viewport == Some(rect) {
            return;
        }
        vtrace!(main = rect.main, cross = rect.cross, now_ms, "on_viewport_resize");
        self.viewport = Some(rect);
        if self.items.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        state.touch_clock(now_ms);
        state.request_restore();
        state.set_container_width(rect.cross);
    }

    /// Records the first visible index from the engine's render-window notification.
    pub fn on_items_rendered(&mut self, first_visible: usize) {
        self.state.borrow_mut().anchor.capture(first_visible);
    }

    /// Attaches a row. Controlled rows start their measurement timers here.
    ///
    /// Mounting an already mounted row only swaps its size ref. Out-of-range indexes are logged
    /// and ignored. Returns `true` when a new row was attached.
    pub fn mount_row(&mut self, index: usize, size_ref: SizeRef, now_ms: u64) -> bool {
        if index >= self.items.len() {
            vwarn!(index, count = self.items.len(), "mount_row: out-of-bounds index");
            return false;
        }
        let width = self.viewport.map_or(0, |r| r.cross);
        let mut state = self.state.borrow_mut();
        state.touch_clock(now_ms);
        let mounted = state.mount(index, size_ref, width);
        if mounted {
            vtrace!(index, "mount_row");
        }
        mounted
    }

    /// Detaches a row and cancels its timers. No measurement of `index` happens afterwards
    /// unless it is mounted again.
    pub fn unmount_row(&mut self, index: usize) -> bool {
        let unmounted = self.state.borrow_mut().unmount(index);
        if unmounted {
            vtrace!(index, "unmount_row");
        }
        unmounted
    }

    /// Measures a mounted row now. Returns `true` if its cached size changed.
    pub fn measure_now(&mut self, index: usize) -> bool {
        self.state.borrow_mut().measure(index)
    }

    /// Renders a mounted row through the item renderer. Returns `None` for rows that are not
    /// mounted.
    pub fn render_row(&self, index: usize) -> Option<R> {
        let item = self.items.get(index)?;
        // Release the borrow before calling out: the renderer may measure right away.
        let (size_ref, container_width, measure) = {
            let state = self.state.borrow();
            let row = state.rows.get(&index)?;
            let measure = MeasureHandle {
                state: Rc::downgrade(&self.state),
                epoch: state.epoch,
                index,
            };
            (row.size_ref().clone(), row.container_width(), measure)
        };
        Some((self.options.render_item)(ItemProps {
            index,
            item,
            size_ref,
            measure,
            container_width,
        }))
    }

    /// Forwards a scroll event to the engine's handler, then to the custom handler.
    pub fn handle_scroll(&self, offset: u64, engine_handler: impl FnOnce(u64)) {
        engine_handler(offset);
        if let Some(on_scroll) = &self.options.on_scroll {
            on_scroll(offset);
        }
    }

    /// Size of the inner container for a given engine total size.
    pub fn inner_size(&self, total_size: u64) -> u64 {
        total_size.saturating_add(self.options.inner_end_padding as u64)
    }

    /// Imperatively scrolls the engine to `index` (clamped to the last item).
    pub fn scroll_to_item<E: ListEngine + ?Sized>(&self, engine: &mut E, index: usize) {
        let count = engine.item_count();
        if count == 0 {
            return;
        }
        engine.scroll_to_item(index.min(count - 1));
    }

    /// Runs every timer due at or before `now_ms`, in deadline order, issuing engine commands
    /// as flushes and anchor restores come due.
    ///
    /// Periodic measurements do not replay ticks missed since the previous call: each row
    /// measures at most once for the whole gap.
    ///
    /// Returns the number of tasks that ran.
    pub fn advance<E: ListEngine + ?Sized>(&mut self, now_ms: u64, engine: &mut E) -> usize {
        let mut ran = 0usize;
        loop {
            let (fired_at_ms, task) = {
                let mut state = self.state.borrow_mut();
                let Some((handle, task)) = state.timers.pop_due(now_ms) else {
                    break;
                };
                state.touch_clock(handle.deadline_ms());
                (handle.deadline_ms(), task)
            };
            ran += 1;
            match task {
                Task::FirstMeasure(index) | Task::Remeasure(index) => {
                    self.state
                        .borrow_mut()
                        .on_measure_timer(index, fired_at_ms, now_ms);
                }
                Task::Flush => self.flush(engine),
                Task::RestoreAnchor => self.restore_anchor(engine),
            }
        }
        self.state.borrow_mut().touch_clock(now_ms);
        ran
    }

    fn flush<E: ListEngine + ?Sized>(&mut self, engine: &mut E) {
        let floor = {
            let mut state = self.state.borrow_mut();
            state.flush.fired();
            state.dirty.compute_flush_floor()
        };
        let Some(floor) = floor else {
            vtrace!("flush: nothing to recompute");
            let count = engine.item_count();
            self.state.borrow_mut().dirty.reset_after_flush(count);
            return;
        };
        vdebug!(floor, "flush: recompute_from");
        let lookup = SizeLookup::new(
            Rc::downgrade(&self.state),
            self.state.borrow().epoch,
            self.options.default_size,
        );
        engine.recompute_from(floor, &|index: usize| lookup.size(index));

        let count = engine.item_count();
        let mut state = self.state.borrow_mut();
        state.dirty.reset_after_flush(count);
        state.flushes = state.flushes.saturating_add(1);
        state.request_restore();
    }

    fn restore_anchor<E: ListEngine + ?Sized>(&mut self, engine: &mut E) {
        let target = self
            .state
            .borrow()
            .anchor
            .restore_target(engine.item_count());
        if let Some(index) = target {
            vtrace!(index, "restore_anchor");
            engine.scroll_to_item(index);
        }
    }
}

impl<T, R> fmt::Debug for AutoSizeList<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoSizeList")
            .field("options", &self.options)
            .field("item_count", &self.items.len())
            .field("viewport", &self.viewport)
            .field("state", &self.state)
            .finish()
    }
}
