// Example: a host loop driving `AutoSizeList` against a tiny prefix-sum engine.
use std::sync::Arc;

use virtualizer_autosize::{
    AutoSizeList, AutoSizeListOptions, ItemProps, ListEngine, ListView, Rect, SizeRef,
};

/// A minimal engine: cached item offsets plus a scroll offset.
struct PrefixEngine {
    offsets: Vec<u64>,
    sizes: Vec<u32>,
    scroll_offset: u64,
}

impl PrefixEngine {
    fn new(count: usize, item_size: impl Fn(usize) -> u32) -> Self {
        let mut engine = Self {
            offsets: vec![0; count],
            sizes: vec![0; count],
            scroll_offset: 0,
        };
        engine.recompute_from(0, &item_size);
        engine
    }

    fn first_visible(&self) -> usize {
        self.offsets
            .partition_point(|&off| off <= self.scroll_offset)
            .saturating_sub(1)
    }

    fn visible(&self, viewport: u32) -> std::ops::Range<usize> {
        let start = self.first_visible();
        let bottom = self.scroll_offset + viewport as u64;
        let end = self.offsets.partition_point(|&off| off < bottom);
        start..end
    }

    fn total_size(&self) -> u64 {
        match (self.offsets.last(), self.sizes.last()) {
            (Some(&off), Some(&size)) => off + size as u64,
            _ => 0,
        }
    }
}

impl ListEngine for PrefixEngine {
    fn item_count(&self) -> usize {
        self.offsets.len()
    }

    fn recompute_from(&mut self, index: usize, item_size: &dyn Fn(usize) -> u32) {
        let mut off = if index == 0 {
            0
        } else {
            self.offsets[index - 1] + self.sizes[index - 1] as u64
        };
        for i in index..self.offsets.len() {
            self.offsets[i] = off;
            self.sizes[i] = item_size(i);
            off += self.sizes[i] as u64;
        }
    }

    fn scroll_to_item(&mut self, index: usize) {
        self.scroll_offset = self.offsets[index];
    }
}

fn main() {
    let items: Arc<[String]> = (0..1_000).map(|i| format!("message #{i}")).collect();
    let options = AutoSizeListOptions::new(
        |p: ItemProps<'_, String>| format!("[{:>4}] {} (w={})", p.index, p.item, p.container_width),
        || "no messages".to_string(),
    )
    .with_default_size(20)
    .with_controlled_measuring(16, 250)
    .with_flush_debounce_ms(50);
    let mut list = AutoSizeList::new(items, options);

    let ListView::Virtualized(reg) = list.view() else {
        return;
    };
    let mut engine = PrefixEngine::new(reg.item_count, |i| reg.item_size.size(i));

    let viewport = Rect {
        main: 200,
        cross: 640,
    };
    list.on_viewport_resize(viewport, 0);
    engine.scroll_offset = 2_000;

    let mut refs: Vec<(usize, SizeRef)> = Vec::new();
    for now_ms in (0..=600).step_by(16) {
        let window = engine.visible(viewport.main);
        list.on_items_rendered(window.start);

        refs.retain(|(i, _)| {
            let keep = window.contains(i);
            if !keep {
                list.unmount_row(*i);
            }
            keep
        });
        for i in window.clone() {
            if !list.is_mounted(i) {
                let size_ref = SizeRef::new();
                list.mount_row(i, size_ref.clone(), now_ms);
                refs.push((i, size_ref));
            }
        }

        // "Layout": every third message wraps onto a second line.
        for (i, size_ref) in &refs {
            size_ref.set(if i % 3 == 0 { 40 } else { 20 });
        }

        list.advance(now_ms, &mut engine);
    }

    let window = engine.visible(viewport.main);
    for i in window.clone() {
        if let Some(row) = list.render_row(i) {
            println!("{row}");
        }
    }
    println!(
        "window={window:?} scroll={} inner={} snapshot={:?}",
        engine.scroll_offset,
        list.inner_size(engine.total_size()),
        list.snapshot()
    );
}
