use crate::*;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use alloc::format;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }
}

#[derive(Debug, Default)]
struct RecordingEngine {
    count: usize,
    recomputes: Vec<usize>,
    sizes_at_floor: Vec<u32>,
    scrolls: Vec<usize>,
}

impl RecordingEngine {
    fn new(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }
}

impl ListEngine for RecordingEngine {
    fn item_count(&self) -> usize {
        self.count
    }

    fn recompute_from(&mut self, index: usize, item_size: &dyn Fn(usize) -> u32) {
        self.recomputes.push(index);
        self.sizes_at_floor.push(item_size(index));
    }

    fn scroll_to_item(&mut self, index: usize) {
        self.scrolls.push(index);
    }
}

fn items(n: usize) -> Arc<[u32]> {
    (0..n as u32).collect::<Vec<_>>().into()
}

fn options() -> AutoSizeListOptions<u32, String> {
    AutoSizeListOptions::new(
        |p: ItemProps<'_, u32>| format!("row {} = {} @ {}", p.index, p.item, p.container_width),
        || String::from("empty"),
    )
}

fn mount_all(
    list: &mut AutoSizeList<u32, String>,
    range: core::ops::Range<usize>,
    size: u32,
    now_ms: u64,
) -> Vec<SizeRef> {
    range
        .map(|i| {
            let size_ref = SizeRef::new();
            size_ref.set(size);
            assert!(list.mount_row(i, size_ref.clone(), now_ms));
            size_ref
        })
        .collect()
}

#[test]
fn size_cache_reports_default_until_measured() {
    let mut cache = SizeCache::new(100);
    for i in [0usize, 1, 7, 10_000] {
        assert_eq!(cache.get(i), 100);
    }

    // Measuring the default is not a change.
    assert!(!cache.set(3, 100));
    assert!(!cache.is_measured(3));

    assert!(cache.set(3, 140));
    assert!(!cache.set(3, 140));
    assert_eq!(cache.get(3), 140);
    assert!(cache.set(3, 100));
    assert_eq!(cache.get(3), 100);
    assert_eq!(cache.len(), 1);
}

#[test]
fn size_cache_iterates_only_measured_entries() {
    let mut cache = SizeCache::new(24);
    assert_eq!(cache.default_size(), 24);
    assert!(cache.is_empty());

    assert!(cache.set(9, 30));
    assert!(cache.set(2, 18));
    assert!(!cache.set(5, cache.default_size()));

    let mut entries = Vec::new();
    cache.for_each(|index, size| entries.push((index, size)));
    entries.sort_unstable();
    assert_eq!(entries, [(2, 18), (9, 30)]);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get(9), 24);
}

#[test]
fn dirty_tracker_takes_min_of_dirty_floor_and_pending_rows() {
    let mut t = DirtyIndexTracker::new(10);
    assert_eq!(t.floor(), 11);
    assert!(!t.is_dirty());
    assert_eq!(t.compute_flush_floor(), None);

    t.mark_dirty(6);
    t.mark_dirty(8);
    assert_eq!(t.floor(), 6);
    assert_eq!(t.compute_flush_floor(), Some(6));

    t.mount(4);
    t.mount(2);
    assert_eq!(t.compute_flush_floor(), Some(2));
    t.settle(2);
    assert_eq!(t.compute_flush_floor(), Some(4));
    t.unmount(4);
    assert_eq!(t.pending_len(), 0);

    // With no pending rows the dirty floor alone decides.
    assert_eq!(t.compute_flush_floor(), Some(6));

    t.reset_after_flush(12);
    assert_eq!(t.floor(), 13);
    assert_eq!(t.compute_flush_floor(), None);
}

#[test]
fn controlled_first_measure_flushes_once_from_changed_index() {
    let mut list = AutoSizeList::new(items(10), options());
    let mut engine = RecordingEngine::new(10);

    let refs = mount_all(&mut list, 0..10, 100, 0);
    refs[3].set(140);

    list.advance(99, &mut engine);
    assert!(!list.is_measured(3));

    // First measurements at 100ms; only item 3 differs from the default.
    list.advance(100, &mut engine);
    assert_eq!(list.item_size(3), 140);
    assert!(list.snapshot().flush_pending);
    assert!(engine.recomputes.is_empty());

    list.advance(199, &mut engine);
    assert!(engine.recomputes.is_empty());

    list.advance(200, &mut engine);
    assert_eq!(engine.recomputes, [3]);
    assert_eq!(engine.sizes_at_floor, [140]);
    assert_eq!(list.snapshot().dirty_floor, 11);
    // Every flush is followed by an anchor restore.
    assert_eq!(engine.scrolls, [0]);

    // Periodic re-measurements of unchanged sizes never flush again.
    list.advance(5_000, &mut engine);
    assert_eq!(engine.recomputes, [3]);
    assert_eq!(list.item_size(3), 140);
}

#[test]
fn changes_within_debounce_window_flush_once_from_lowest_index() {
    let mut list = AutoSizeList::new(items(10), options());
    let mut engine = RecordingEngine::new(10);

    let refs = mount_all(&mut list, 0..10, 100, 0);
    list.advance(100, &mut engine);
    assert!(engine.recomputes.is_empty());

    list.advance(120, &mut engine);
    refs[5].set(130);
    assert!(list.measure_now(5));

    list.advance(150, &mut engine);
    refs[2].set(90);
    assert!(list.measure_now(2));

    // The debounce restarted at 150ms.
    list.advance(249, &mut engine);
    assert!(engine.recomputes.is_empty());

    list.advance(250, &mut engine);
    assert_eq!(engine.recomputes, [2]);
    assert_eq!(list.snapshot().flushes, 1);
}

#[test]
fn random_bursts_flush_once_with_minimum_index() {
    let mut rng = Lcg::new(0x5eed);

    for _ in 0..50 {
        let n = rng.gen_range_usize(5, 60);
        let mut list = AutoSizeList::new(items(n), options().with_manual_measuring());
        let mut engine = RecordingEngine::new(n);

        let refs = mount_all(&mut list, 0..n, 100, 0);
        for i in 0..n {
            assert!(!list.measure_now(i));
        }

        let mut now = 1_000u64;
        list.advance(now, &mut engine);
        let mut expected = usize::MAX;
        let burst = rng.gen_range_usize(1, 12);
        for _ in 0..burst {
            now += rng.gen_range_u64(0, 100);
            list.advance(now, &mut engine);
            let i = rng.gen_range_usize(0, n);
            refs[i].set(list.item_size(i) + 1 + rng.gen_range_u64(0, 50) as u32);
            assert!(list.measure_now(i));
            expected = expected.min(i);
        }

        list.advance(now + 99, &mut engine);
        assert!(engine.recomputes.is_empty());
        list.advance(now + 100, &mut engine);
        assert_eq!(engine.recomputes, [expected]);
        assert_eq!(list.snapshot().dirty_floor, n + 1);
    }
}

#[test]
fn unmount_cancels_pending_measurements() {
    let mut list = AutoSizeList::new(items(5), options());
    let mut engine = RecordingEngine::new(5);

    let refs = mount_all(&mut list, 0..3, 150, 0);
    assert_eq!(list.pending_timers(), 3);

    list.advance(50, &mut engine);
    assert!(list.unmount_row(2));
    assert!(!list.unmount_row(2));
    assert_eq!(list.pending_timers(), 2);

    // Row 0 measures at 100ms, then unmounts with its interval timer armed.
    list.advance(100, &mut engine);
    assert!(list.is_measured(0));
    assert!(list.unmount_row(0));

    refs[0].set(300);
    refs[2].set(300);
    list.advance(10_000, &mut engine);
    assert!(!list.is_measured(2));
    assert_eq!(list.item_size(0), 150);
    assert!(!list.is_mounted(0));
}

#[test]
fn empty_collection_renders_only_the_empty_state() {
    let mut list = AutoSizeList::new(items(0), options());
    let mut engine = RecordingEngine::new(0);

    match list.view() {
        ListView::Empty(out) => assert_eq!(out, "empty"),
        ListView::Virtualized(_) => panic!("expected empty view"),
    }
    assert!(list.size_lookup().is_none());

    assert!(!list.mount_row(0, SizeRef::new(), 0));
    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 0);
    list.on_items_rendered(0);
    assert_eq!(list.pending_timers(), 0);

    assert_eq!(list.advance(10_000, &mut engine), 0);
    assert!(engine.recomputes.is_empty());
    assert!(engine.scrolls.is_empty());
}

#[test]
fn viewport_resize_restores_anchor_once_per_resize() {
    let mut list = AutoSizeList::new(items(20), options());
    let mut engine = RecordingEngine::new(20);

    list.on_items_rendered(4);
    assert_eq!(list.anchor_index(), 4);
    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 0);
    // Deferred: nothing is issued until the list is driven.
    assert!(engine.scrolls.is_empty());
    list.advance(0, &mut engine);
    assert_eq!(engine.scrolls, [4]);

    // Same rect is not a resize.
    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 10);
    list.advance(10, &mut engine);
    assert_eq!(engine.scrolls, [4]);

    list.on_viewport_resize(Rect { main: 400, cross: 200 }, 20);
    list.on_viewport_resize(Rect { main: 500, cross: 200 }, 20);
    list.advance(20, &mut engine);
    assert_eq!(engine.scrolls, [4, 4, 4]);
    assert!(engine.recomputes.is_empty());
}

#[test]
fn anchor_restore_is_clamped_to_item_count() {
    let mut list = AutoSizeList::new(items(20), options());
    let mut engine = RecordingEngine::new(3);

    list.on_items_rendered(12);
    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 0);
    list.advance(0, &mut engine);
    assert_eq!(engine.scrolls, [2]);

    list.scroll_to_item(&mut engine, 1);
    list.scroll_to_item(&mut engine, 99);
    assert_eq!(engine.scrolls, [2, 1, 2]);
}

#[test]
fn same_items_keep_cache_and_new_items_start_a_new_epoch() {
    let first = items(10);
    let mut list = AutoSizeList::new(Arc::clone(&first), options().with_manual_measuring());
    let mut engine = RecordingEngine::new(10);

    let refs = mount_all(&mut list, 0..10, 120, 0);
    for i in 0..10 {
        assert!(list.measure_now(i));
    }
    let lookup = list.size_lookup().unwrap();
    assert_eq!(lookup.size(4), 120);

    assert!(!list.set_items(Arc::clone(&first)));
    assert_eq!(list.item_size(4), 120);
    assert!(list.is_mounted(4));
    assert_eq!(list.snapshot().epoch, 0);

    // Equal contents, different identity.
    assert!(list.set_items(items(10)));
    let snap = list.snapshot();
    assert_eq!(snap.epoch, 1);
    assert_eq!(snap.measured_items, 0);
    assert_eq!(snap.mounted_rows, 0);
    assert!(!snap.flush_pending);
    assert_eq!(list.pending_timers(), 0);
    assert_eq!(list.item_size(4), 100);
    // The old epoch's lookup goes stale.
    assert_eq!(lookup.size(4), 100);

    refs[4].set(500);
    assert!(!list.measure_now(4));
    list.advance(10_000, &mut engine);
    assert!(engine.recomputes.is_empty());
}

#[test]
fn controlled_rows_ignore_width_changes_until_first_measure() {
    let mut list = AutoSizeList::new(items(4), options());
    let mut engine = RecordingEngine::new(4);

    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 0);
    let refs = mount_all(&mut list, 0..2, 100, 0);

    refs[0].set(180);
    list.on_viewport_resize(Rect { main: 300, cross: 150 }, 10);
    assert!(!list.is_measured(0));

    list.advance(100, &mut engine);
    assert_eq!(list.item_size(0), 180);
    list.advance(300, &mut engine);
    assert_eq!(engine.recomputes, [0]);

    // After the first measure a width change re-measures right away.
    refs[1].set(60);
    list.on_viewport_resize(Rect { main: 300, cross: 120 }, 310);
    assert_eq!(list.item_size(1), 60);
    list.advance(410, &mut engine);
    assert_eq!(engine.recomputes, [0, 1]);
}

#[test]
fn manual_rows_measure_on_width_change_after_mount() {
    let mut list = AutoSizeList::new(items(4), options().with_manual_measuring());
    let mut engine = RecordingEngine::new(4);

    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 0);
    let refs = mount_all(&mut list, 0..4, 100, 0);
    assert_eq!(list.pending_timers(), 1); // the initial anchor restore
    list.advance(0, &mut engine);

    refs[2].set(75);
    list.on_viewport_resize(Rect { main: 300, cross: 180 }, 50);
    assert_eq!(list.item_size(2), 75);

    // Height-only resizes do not re-measure.
    refs[3].set(90);
    list.on_viewport_resize(Rect { main: 280, cross: 180 }, 60);
    assert!(!list.is_measured(3));

    // Rows 0, 1 and 3 were read at the default size: settled, but not dirty.
    list.advance(160, &mut engine);
    assert_eq!(engine.recomputes, [2]);
}

#[test]
fn empty_size_ref_is_skipped_and_row_stays_pending() {
    let mut list = AutoSizeList::new(items(6), options());
    let mut engine = RecordingEngine::new(6);

    let refs = mount_all(&mut list, 0..5, 100, 0);
    refs[1].clear();
    refs[3].set(200);

    list.advance(100, &mut engine);
    assert!(!list.is_measured(1));
    list.advance(200, &mut engine);
    assert_eq!(engine.recomputes, [1]);
    assert_eq!(engine.sizes_at_floor, [100]);
}

#[test]
fn flush_after_all_rows_unmounted_uses_dirty_floor() {
    let mut list = AutoSizeList::new(items(6), options());
    let mut engine = RecordingEngine::new(6);

    let refs = mount_all(&mut list, 0..6, 100, 0);
    refs[3].set(40);
    list.advance(100, &mut engine);
    for i in 0..6 {
        list.unmount_row(i);
    }
    list.advance(200, &mut engine);
    assert_eq!(engine.recomputes, [3]);
    assert_eq!(engine.sizes_at_floor, [40]);
}

#[test]
fn zero_interval_is_clamped() {
    let mut list = AutoSizeList::new(items(1), options().with_controlled_measuring(0, 0));
    let mut engine = RecordingEngine::new(1);
    mount_all(&mut list, 0..1, 100, 0);

    // The first measure at 0ms re-arms 1ms after the current time, not in a 0ms loop.
    assert_eq!(list.advance(10, &mut engine), 1);
    assert_eq!(list.next_deadline(), Some(11));
    assert_eq!(list.advance(11, &mut engine), 1);
    assert_eq!(list.next_deadline(), Some(12));
}

#[test]
fn long_gap_between_advances_measures_each_row_once() {
    let mut list = AutoSizeList::new(items(10), options());
    let mut engine = RecordingEngine::new(10);

    let refs = mount_all(&mut list, 0..10, 100, 0);
    assert_eq!(list.advance(100, &mut engine), 10);

    // An hour without driving the list: missed ticks collapse into one per row.
    // Row 6 changed, so its flush and the follow-up anchor restore also fall inside the gap.
    refs[6].set(170);
    let resumed = 100 + 3_600_000;
    assert_eq!(list.advance(resumed, &mut engine), 12);
    assert_eq!(list.item_size(6), 170);
    assert_eq!(engine.recomputes, [6]);
    assert_eq!(engine.scrolls, [0]);
    assert_eq!(list.next_deadline(), Some(resumed + 100));

    assert_eq!(list.advance(resumed + 100, &mut engine), 10);
    assert_eq!(engine.recomputes, [6]);
}

#[test]
fn advance_terminates_at_end_of_clock() {
    let mut list = AutoSizeList::new(items(1), options());
    let mut engine = RecordingEngine::new(1);
    mount_all(&mut list, 0..1, 100, 0);

    assert_eq!(list.advance(u64::MAX - 250, &mut engine), 1);
    assert_eq!(list.next_deadline(), Some(u64::MAX - 150));

    // No tick fits after the last representable instant.
    assert_eq!(list.advance(u64::MAX, &mut engine), 1);
    assert_eq!(list.next_deadline(), None);
    assert_eq!(list.advance(u64::MAX, &mut engine), 0);
}

#[test]
fn new_epoch_restores_anchor_when_viewport_is_known() {
    let mut list = AutoSizeList::new(items(10), options());
    let mut engine = RecordingEngine::new(12);

    list.on_items_rendered(4);
    list.on_viewport_resize(Rect { main: 300, cross: 200 }, 0);
    list.advance(0, &mut engine);
    assert_eq!(engine.scrolls, [4]);

    assert!(list.set_items(items(12)));
    assert_eq!(list.pending_timers(), 1);
    list.advance(10, &mut engine);
    assert_eq!(engine.scrolls, [4, 4]);
    list.advance(20, &mut engine);
    assert_eq!(engine.scrolls, [4, 4]);

    // Nothing to restore into an empty collection.
    assert!(list.set_items(items(0)));
    assert_eq!(list.pending_timers(), 0);
    list.advance(30, &mut engine);
    assert_eq!(engine.scrolls, [4, 4]);
}

#[test]
fn new_epoch_without_viewport_does_not_restore() {
    let mut list = AutoSizeList::new(items(10), options());
    let mut engine = RecordingEngine::new(10);

    list.on_items_rendered(4);
    assert!(list.set_items(items(10)));
    assert_eq!(list.advance(100, &mut engine), 0);
    assert!(engine.scrolls.is_empty());
}

#[test]
fn renderer_receives_props_and_can_measure_immediately() {
    let opts = AutoSizeListOptions::new(
        |p: ItemProps<'_, u32>| {
            p.size_ref.set(10 * (p.index as u32 + 1));
            let changed = p.measure.measure_now();
            format!("{}:{}:{}", p.item, p.container_width, changed)
        },
        || String::from("empty"),
    )
    .with_manual_measuring();
    let mut list = AutoSizeList::new(items(3), opts);

    assert_eq!(list.render_row(1), None);
    list.on_viewport_resize(Rect { main: 100, cross: 320 }, 0);
    assert!(list.mount_row(1, SizeRef::new(), 0));

    assert_eq!(list.render_row(1).as_deref(), Some("1:320:true"));
    assert_eq!(list.render_row(1).as_deref(), Some("1:320:false"));
    assert_eq!(list.item_size(1), 20);
}

#[test]
fn view_registers_engine_inputs() {
    let mut list = AutoSizeList::new(items(8), options().with_overscan(3).with_default_size(42));
    let mut engine = RecordingEngine::new(8);

    let ListView::Virtualized(reg) = list.view() else {
        panic!("expected virtualized view");
    };
    assert_eq!(reg.item_count, 8);
    assert_eq!(reg.overscan, 3);
    assert_eq!(reg.viewport, None);
    assert_eq!(reg.item_size.size(7), 42);

    let refs = mount_all(&mut list, 7..8, 42, 0);
    refs[0].set(64);
    list.advance(200, &mut engine);
    assert_eq!(reg.item_size.size(7), 64);
    assert_eq!(engine.recomputes, [7]);

    assert_eq!(list.inner_size(1_000), 1_001);
}

#[test]
fn custom_scroll_handler_runs_after_engine_handler() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let custom_log = Arc::clone(&log);
    let opts = options().with_on_scroll(Some(move |offset: u64| {
        custom_log.lock().unwrap().push(format!("custom {offset}"));
    }));
    let list = AutoSizeList::new(items(3), opts);

    list.handle_scroll(25, |offset| {
        log.lock().unwrap().push(format!("engine {offset}"));
    });
    assert_eq!(*log.lock().unwrap(), ["engine 25", "custom 25"]);
}

#[test]
fn engine_can_read_sizes_during_recompute() {
    struct ReadingEngine {
        lookup: Option<SizeLookup>,
        seen: Vec<u32>,
    }

    impl ListEngine for ReadingEngine {
        fn item_count(&self) -> usize {
            4
        }

        fn recompute_from(&mut self, index: usize, _item_size: &dyn Fn(usize) -> u32) {
            let lookup = self.lookup.as_ref().unwrap();
            self.seen.extend((index..4).map(|i| lookup.size(i)));
        }

        fn scroll_to_item(&mut self, _index: usize) {}
    }

    let mut list = AutoSizeList::new(items(4), options());
    let mut engine = ReadingEngine {
        lookup: list.size_lookup(),
        seen: Vec::new(),
    };
    let refs = mount_all(&mut list, 0..4, 100, 0);
    refs[2].set(7);
    list.advance(200, &mut engine);
    assert_eq!(engine.seen, [7, 100]);
}
