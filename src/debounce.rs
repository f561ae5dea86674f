use crate::timer::{TimerHandle, TimerQueue};

/// Trailing-edge debounce over a single pending timer.
///
/// Every call to [`FlushDebouncer::schedule`] cancels the pending timer and arms a new one, so
/// a burst of calls yields exactly one firing, `wait_ms` after the last call.
#[derive(Clone, Debug)]
pub(crate) struct FlushDebouncer {
    wait_ms: u64,
    pending: Option<TimerHandle>,
}

impl FlushDebouncer {
    pub(crate) fn new(wait_ms: u64) -> Self {
        Self {
            wait_ms,
            pending: None,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn schedule<T>(&mut self, now_ms: u64, timers: &mut TimerQueue<T>, task: T) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
        let deadline = now_ms.saturating_add(self.wait_ms);
        self.pending = Some(timers.schedule(deadline, task));
    }

    /// Clears the handle once the owner popped the timer.
    pub(crate) fn fired(&mut self) {
        self.pending = None;
    }

    pub(crate) fn cancel<T>(&mut self, timers: &mut TimerQueue<T>) {
        if let Some(handle) = self.pending.take() {
            debug_assert!(
                timers.is_scheduled(handle),
                "FlushDebouncer: pending handle is not in the queue"
            );
            timers.cancel(handle);
        }
    }
}
