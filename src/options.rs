use alloc::sync::Arc;

use crate::{ItemProps, MeasureMode};

/// Renders one mounted row.
pub type ItemRenderer<T, R> = Arc<dyn Fn(ItemProps<'_, T>) -> R + Send + Sync>;

/// Renders the placeholder shown instead of the list when there are no items.
pub type EmptyRenderer<R> = Arc<dyn Fn() -> R + Send + Sync>;

/// A custom scroll handler, called after the engine's own handler.
pub type OnScrollCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Configuration for [`crate::AutoSizeList`].
///
/// Closures are stored in `Arc`s so cloning options is cheap.
pub struct AutoSizeListOptions<T, R> {
    pub render_item: ItemRenderer<T, R>,
    pub render_empty: EmptyRenderer<R>,

    /// Size reported for items that were never measured.
    pub default_size: u32,

    pub measure_mode: MeasureMode,

    /// Quiet period before a burst of size changes is flushed to the engine.
    pub flush_debounce_ms: u64,

    pub overscan: usize,

    pub on_scroll: Option<OnScrollCallback>,

    /// Extra space after the last item, so borders on the last row are not clipped.
    pub inner_end_padding: u32,
}

impl<T, R> Clone for AutoSizeListOptions<T, R> {
    fn clone(&self) -> Self {
        Self {
            render_item: Arc::clone(&self.render_item),
            render_empty: Arc::clone(&self.render_empty),
            default_size: self.default_size,
            measure_mode: self.measure_mode,
            flush_debounce_ms: self.flush_debounce_ms,
            overscan: self.overscan,
            on_scroll: self.on_scroll.clone(),
            inner_end_padding: self.inner_end_padding,
        }
    }
}

impl<T, R> AutoSizeListOptions<T, R> {
    /// Creates options with the default size (100), controlled measuring (100ms/100ms), a
    /// 100ms flush debounce and no overscan.
    pub fn new(
        render_item: impl Fn(ItemProps<'_, T>) -> R + Send + Sync + 'static,
        render_empty: impl Fn() -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            render_item: Arc::new(render_item),
            render_empty: Arc::new(render_empty),
            default_size: 100,
            measure_mode: MeasureMode::default(),
            flush_debounce_ms: 100,
            overscan: 0,
            on_scroll: None,
            inner_end_padding: 1,
        }
    }

    pub fn with_default_size(mut self, default_size: u32) -> Self {
        self.default_size = default_size;
        self
    }

    pub fn with_measure_mode(mut self, measure_mode: MeasureMode) -> Self {
        self.measure_mode = measure_mode;
        self
    }

    pub fn with_manual_measuring(self) -> Self {
        self.with_measure_mode(MeasureMode::Manual)
    }

    pub fn with_controlled_measuring(
        self,
        first_measure_delay_ms: u64,
        measure_interval_ms: u64,
    ) -> Self {
        self.with_measure_mode(MeasureMode::controlled(
            first_measure_delay_ms,
            measure_interval_ms,
        ))
    }

    pub fn with_flush_debounce_ms(mut self, flush_debounce_ms: u64) -> Self {
        self.flush_debounce_ms = flush_debounce_ms;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_on_scroll(mut self, on_scroll: Option<impl Fn(u64) + Send + Sync + 'static>) -> Self {
        self.on_scroll = on_scroll.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_inner_end_padding(mut self, inner_end_padding: u32) -> Self {
        self.inner_end_padding = inner_end_padding;
        self
    }
}

impl<T, R> core::fmt::Debug for AutoSizeListOptions<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AutoSizeListOptions")
            .field("default_size", &self.default_size)
            .field("measure_mode", &self.measure_mode)
            .field("flush_debounce_ms", &self.flush_debounce_ms)
            .field("overscan", &self.overscan)
            .field("inner_end_padding", &self.inner_end_padding)
            .finish_non_exhaustive()
    }
}
