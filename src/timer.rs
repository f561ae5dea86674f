use alloc::collections::BTreeMap;

/// Identifies a scheduled entry in a [`TimerQueue`].
///
/// Handles order by deadline first, then by scheduling order, so entries that share a
/// deadline run in the order they were posted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TimerHandle {
    deadline_ms: u64,
    seq: u64,
}

impl TimerHandle {
    pub(crate) fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }
}

/// A host-driven timer queue.
///
/// Nothing here reads a clock: the owner pops due entries for a `now_ms` it was given.
/// A zero-delay entry posted while another entry runs is popped after it.
#[derive(Clone, Debug)]
pub(crate) struct TimerQueue<T> {
    entries: BTreeMap<TimerHandle, T>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn schedule(&mut self, deadline_ms: u64, task: T) -> TimerHandle {
        let handle = TimerHandle {
            deadline_ms,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.insert(handle, task);
        handle
    }

    pub(crate) fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        self.entries.remove(&handle)
    }

    pub(crate) fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub(crate) fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(TimerHandle::deadline_ms)
    }

    /// Removes and returns the earliest entry whose deadline is `<= now_ms`.
    pub(crate) fn pop_due(&mut self, now_ms: u64) -> Option<(TimerHandle, T)> {
        let (&handle, _) = self.entries.first_key_value()?;
        if handle.deadline_ms > now_ms {
            return None;
        }
        self.entries.pop_first()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
