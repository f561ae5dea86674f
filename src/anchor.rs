use crate::list::Task;
use crate::timer::TimerQueue;

/// Remembers the first visible index so it can be restored after offsets move.
///
/// Restores are posted as zero-delay tasks instead of being issued inline: they are requested
/// from inside resize handling and flushes, and the engine must not be driven re-entrantly.
/// This is a best-effort correction. If content above the anchor changes between capture and
/// restore, the viewport lands near, not exactly on, the previous position.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScrollAnchor {
    first_visible: usize,
}

impl ScrollAnchor {
    pub(crate) fn index(&self) -> usize {
        self.first_visible
    }

    pub(crate) fn capture(&mut self, first_visible: usize) {
        self.first_visible = first_visible;
    }

    pub(crate) fn request_restore(&self, now_ms: u64, timers: &mut TimerQueue<Task>) {
        timers.schedule(now_ms, Task::RestoreAnchor);
    }

    /// The index to scroll to, clamped to the engine's current item count.
    pub(crate) fn restore_target(&self, item_count: usize) -> Option<usize> {
        if item_count == 0 {
            return None;
        }
        Some(self.first_visible.min(item_count - 1))
    }
}
