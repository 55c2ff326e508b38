//! Horizon Progress: progress monitors with delayed popup dialogs.
//!
//! A background task reports progress through a monitor from
//! [`horizon_progress_core`]; this crate turns those reports into a progress
//! dialog that only appears when the task takes longer than a configurable
//! delay.
//!
//! - [`dialog`]: [`ProgressDialog`], the presentation state of the window
//! - [`popup`]: [`DelayedPopup`] and the `create_modal_*` factories
//! - [`config`]: [`ProgressConfig`], loadable from TOML
//! - [`l10n`]: the string table used for titles and button labels
//! - [`icons`]: details toggle icons
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use horizon_progress::{create_modal_determinate_progress_monitor, ProgressMonitor, UiContext};
//!
//! let ui = UiContext::new();
//! let progress = create_modal_determinate_progress_monitor(
//!     &ui,
//!     Some("Importing"),
//!     0,
//!     10,
//!     0,
//!     Duration::from_millis(500),
//!     Some(Arc::new(|| println!("import canceled"))),
//! )?;
//!
//! progress.monitor.start(Some("Reading files"));
//! ui.process_events_at(Instant::now() + Duration::from_millis(600));
//!
//! let dialog = progress.popup.dialog().expect("delay elapsed");
//! assert!(dialog.is_visible());
//! # Ok::<(), horizon_progress::ProgressError>(())
//! ```

pub mod config;
pub mod dialog;
mod error;
pub mod icons;
pub mod l10n;
pub mod popup;

pub use horizon_progress_core::*;

pub use config::ProgressConfig;
pub use dialog::{
    ActionButton, ButtonRole, CloseOperation, DialogSnapshot, Indicator, ProgressDialog,
};
pub use error::{ProgressError, Result};
pub use icons::{DetailsIcons, Icon};
pub use l10n::{StringKey, Strings};
pub use popup::{
    DelayedPopup, ModalProgress, PopupPhase, create_modal_determinate_progress_monitor,
    create_modal_determinate_progress_monitor_with_config,
    create_modal_indeterminate_progress_monitor,
    create_modal_indeterminate_progress_monitor_with_config,
};
