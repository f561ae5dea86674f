use crate::list::{SizeRef, Task};
use crate::timer::{TimerHandle, TimerQueue};

/// How mounted rows get measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasureMode {
    /// No timers. Rows are measured when they call
    /// [`MeasureHandle::measure_now`](crate::MeasureHandle::measure_now) or when the container
    /// width changes.
    Manual,
    /// Measure once `first_measure_delay_ms` after mount, then every `measure_interval_ms`
    /// until the row unmounts.
    Controlled {
        first_measure_delay_ms: u64,
        measure_interval_ms: u64,
    },
}

impl MeasureMode {
    pub fn controlled(first_measure_delay_ms: u64, measure_interval_ms: u64) -> Self {
        Self::Controlled {
            first_measure_delay_ms,
            measure_interval_ms,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }
}

impl Default for MeasureMode {
    fn default() -> Self {
        Self::controlled(100, 100)
    }
}

/// Measurement timers and width tracking for one mounted row.
#[derive(Clone, Debug)]
pub(crate) struct RowScheduler {
    size_ref: SizeRef,
    container_width: u32,
    first_timer: Option<TimerHandle>,
    interval_timer: Option<TimerHandle>,
    has_measured: bool,
}

impl RowScheduler {
    pub(crate) fn new(size_ref: SizeRef, container_width: u32) -> Self {
        Self {
            size_ref,
            container_width,
            first_timer: None,
            interval_timer: None,
            has_measured: false,
        }
    }

    pub(crate) fn size_ref(&self) -> &SizeRef {
        &self.size_ref
    }

    pub(crate) fn set_size_ref(&mut self, size_ref: SizeRef) {
        self.size_ref = size_ref;
    }

    pub(crate) fn container_width(&self) -> u32 {
        self.container_width
    }

    /// Starts the row's schedule. Manual rows arm nothing.
    pub(crate) fn arm(
        &mut self,
        index: usize,
        mode: MeasureMode,
        now_ms: u64,
        timers: &mut TimerQueue<Task>,
    ) {
        if let MeasureMode::Controlled {
            first_measure_delay_ms,
            ..
        } = mode
        {
            let deadline = now_ms.saturating_add(first_measure_delay_ms);
            self.first_timer = Some(timers.schedule(deadline, Task::FirstMeasure(index)));
        }
    }

    /// Called when either timer fired at `fired_at_ms` during an `advance` to `now_ms`; arms
    /// the next periodic measurement.
    ///
    /// Ticks missed while the host was not driving the list collapse into one: the next tick
    /// is never scheduled at or before `now_ms`. Returns `false` when no tick can be armed
    /// because the clock is exhausted.
    pub(crate) fn rearm_interval(
        &mut self,
        index: usize,
        mode: MeasureMode,
        fired_at_ms: u64,
        now_ms: u64,
        timers: &mut TimerQueue<Task>,
    ) -> bool {
        self.first_timer = None;
        self.interval_timer = None;
        let MeasureMode::Controlled {
            measure_interval_ms,
            ..
        } = mode
        else {
            return false;
        };
        // A zero interval would fire forever within a single `advance`.
        let interval = measure_interval_ms.max(1);
        let mut deadline = fired_at_ms.saturating_add(interval);
        if deadline <= now_ms {
            deadline = now_ms.saturating_add(interval);
        }
        if deadline <= now_ms {
            return false;
        }
        self.interval_timer = Some(timers.schedule(deadline, Task::Remeasure(index)));
        true
    }

    /// Records a new container width and returns whether the row should be re-measured.
    ///
    /// Controlled rows wait for their first successful measurement so a width change never
    /// pre-empts the controlled schedule. Manual rows re-measure on every change after mount.
    pub(crate) fn set_container_width(&mut self, width: u32, mode: MeasureMode) -> bool {
        if self.container_width == width {
            return false;
        }
        self.container_width = width;
        mode.is_manual() || self.has_measured
    }

    /// Reads the rendered size, marking the row as measured on success.
    pub(crate) fn read(&mut self) -> Option<u32> {
        let size = self.size_ref.get()?;
        self.has_measured = true;
        Some(size)
    }

    pub(crate) fn cancel(&mut self, timers: &mut TimerQueue<Task>) {
        if let Some(handle) = self.first_timer.take() {
            timers.cancel(handle);
        }
        if let Some(handle) = self.interval_timer.take() {
            timers.cancel(handle);
        }
    }
}
