//! Automatic item measurement and scroll anchoring for headless list virtualizers.
//!
//! A virtualization engine (for example the `virtualizer` crate) knows how to turn an
//! item-size function into a rendered window, but it has to be told the sizes. This crate
//! sits between your UI layer and that engine and keeps the sizes honest:
//!
//! - a sparse cache of measured item sizes with a configurable default,
//! - per-row measurement timers (first measure after a delay, then periodic re-measure),
//! - a dirty floor that tracks the lowest index whose offsets must be recomputed,
//! - a trailing-edge debounce that coalesces bursts of changes into one recompute,
//! - a scroll anchor that re-issues "scroll to the first visible item" after recomputes
//!   and viewport resizes.
//!
//! It is UI-agnostic and single-threaded. A TUI/GUI layer is expected to:
//! - report viewport rects (`on_viewport_resize`) and the first visible index
//!   (`on_items_rendered`),
//! - mount/unmount rows as the engine's window changes, writing each row's rendered size
//!   into its [`SizeRef`],
//! - drive time by calling [`AutoSizeList::advance`] with an engine implementing
//!   [`ListEngine`].
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod debounce;
mod dirty;
mod engine;
mod list;
mod options;
mod scheduler;
mod size_cache;
mod timer;
mod types;

#[cfg(test)]
mod tests;

pub use dirty::DirtyIndexTracker;
pub use engine::{EngineRegistration, ListEngine, SizeLookup};
pub use list::{AutoSizeList, ItemProps, ListView, MeasureHandle, SizeRef};
pub use options::{AutoSizeListOptions, EmptyRenderer, ItemRenderer, OnScrollCallback};
pub use scheduler::MeasureMode;
pub use size_cache::SizeCache;
pub use types::{ListSnapshot, Rect};
