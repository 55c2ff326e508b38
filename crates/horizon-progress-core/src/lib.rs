//! Core systems for Horizon Progress.
//!
//! This crate holds the toolkit-neutral half of the progress framework:
//!
//! - **Monitors**: determinate and indeterminate progress monitors that fire
//!   immutable [`StatusEvent`]s to their listeners
//! - **Listeners**: the [`ProgressListener`] and [`CancelHandler`] traits and
//!   an ordered registry with snapshot dispatch
//! - **UI Context**: the thread-affine task queue and one-shot timers that
//!   presentation code runs on
//! - **Signals**: small signal type for host-facing notifications
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_progress_core::{
//!     DeterminateProgressMonitor, ProgressListener, ProgressMonitor, StatusEvent, UiContext,
//! };
//!
//! struct Forward(UiContext);
//!
//! impl ProgressListener for Forward {
//!     fn status_changed(&self, event: &StatusEvent) {
//!         let fraction = event.progress().fraction();
//!         self.0.invoke(move || println!("{:.0}%", fraction * 100.0));
//!     }
//!     fn canceled(&self, _event: &StatusEvent) {}
//! }
//!
//! let ui = UiContext::headless();
//! let monitor = DeterminateProgressMonitor::with_wait(0, 4, 0, Duration::from_millis(500));
//! monitor.add_listener(Arc::new(Forward(ui.clone())));
//!
//! let worker = monitor.clone();
//! std::thread::spawn(move || {
//!     for step in 1..=4 {
//!         worker.set_current(step, None);
//!     }
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(ui.process_events(), 4);
//! ```

pub mod error;
pub mod event;
pub mod listener;
pub mod logging;
pub mod monitor;
pub mod signal;
mod task;
pub mod thread_check;
mod timer;
pub mod ui_context;

pub use error::{CoreError, Result, TimerError};
pub use event::{MonitorId, Progress, StatusEvent};
pub use listener::{CancelHandler, ListenerId, ListenerRegistry, ProgressListener};
pub use monitor::{
    BoundsPolicy, DeterminateProgressMonitor, IndeterminateProgressMonitor, Monitor, MonitorBase,
    ProgressMonitor, WeakMonitor,
};
pub use signal::{ConnectionId, Signal};
pub use task::TaskId;
pub use thread_check::ThreadAffinity;
pub use timer::TimerId;
pub use ui_context::{DisplayMode, UiContext};
