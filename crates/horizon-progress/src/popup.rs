//! Delayed progress popups.
//!
//! Showing a dialog for an operation that finishes in a few milliseconds
//! only makes the screen flicker. A [`DelayedPopup`] sits between a monitor
//! and the dialog: on the first status event it starts a one-shot timer for
//! the monitor's wait duration, and only when that timer fires does it build
//! a [`ProgressDialog`] and hand the monitor over to it. If the monitor
//! reports completion first, the timer is stopped and no dialog ever appears.
//!
//! The factory functions create a monitor with a popup already attached:
//!
//! ```
//! use std::time::Duration;
//! use horizon_progress::popup::create_modal_determinate_progress_monitor;
//! use horizon_progress::UiContext;
//!
//! let ui = UiContext::new();
//! let progress = create_modal_determinate_progress_monitor(
//!     &ui,
//!     Some("Copying"),
//!     0,
//!     10,
//!     0,
//!     Duration::from_millis(500),
//!     None,
//! )?;
//!
//! // Finishes before the delay: the dialog is never built.
//! progress.monitor.set_current(10, None);
//! assert!(progress.popup.dialog().is_none());
//! # Ok::<(), horizon_progress::ProgressError>(())
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use horizon_progress_core::logging::targets;
use horizon_progress_core::{
    CancelHandler, DeterminateProgressMonitor, IndeterminateProgressMonitor, ListenerId, Monitor,
    ProgressListener, ProgressMonitor, Signal, StatusEvent, TimerId, UiContext, WeakMonitor,
};

use crate::config::ProgressConfig;
use crate::dialog::ProgressDialog;
use crate::error::Result;
use crate::icons::DetailsIcons;
use crate::l10n::StringKey;

/// Where a popup is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPhase {
    /// No status event received yet.
    Idle,
    /// The delay timer is running.
    Waiting,
    /// The dialog has been built and owns the monitor.
    HandedOver,
    /// The operation completed or was canceled before the dialog appeared.
    Finished,
}

#[derive(Debug)]
struct PopupState {
    phase: PopupPhase,
    timer: Option<TimerId>,
    registration: Option<ListenerId>,
    dialog: Option<ProgressDialog>,
}

struct PopupInner {
    ui: UiContext,
    monitor: WeakMonitor,
    wait: Duration,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
    config: ProgressConfig,
    icons: DetailsIcons,
    state: Mutex<PopupState>,
    dialog_created: Signal<ProgressDialog>,
}

/// Shows a progress dialog once an operation outlives its wait delay.
///
/// At most one timer is started per popup. When it fires, the popup
/// deregisters itself, builds the dialog (which registers itself), brings
/// it up to date with the monitor and shows it.
#[derive(Clone)]
pub struct DelayedPopup {
    inner: Arc<PopupInner>,
}

impl DelayedPopup {
    /// Attach a popup to `monitor`.
    ///
    /// Icons are loaded now so the timer callback does no file I/O.
    ///
    /// # Errors
    ///
    /// Fails with a headless error when `ui` has no display.
    pub fn attach(
        ui: &UiContext,
        monitor: &Monitor,
        cancel_handler: Option<Arc<dyn CancelHandler>>,
        config: &ProgressConfig,
    ) -> Result<Self> {
        ui.require_display()?;

        let popup = Self {
            inner: Arc::new(PopupInner {
                ui: ui.clone(),
                monitor: monitor.downgrade(),
                wait: monitor.wait_duration(),
                cancel_handler,
                config: config.clone(),
                icons: config.load_icons(),
                state: Mutex::new(PopupState {
                    phase: PopupPhase::Idle,
                    timer: None,
                    registration: None,
                    dialog: None,
                }),
                dialog_created: Signal::new(),
            }),
        };

        let id = monitor.add_listener(Arc::new(popup.clone()));
        popup.inner.state.lock().registration = Some(id);
        tracing::debug!(
            target: targets::POPUP,
            monitor = monitor.id().as_u64(),
            wait = ?popup.inner.wait,
            "delayed popup attached"
        );
        Ok(popup)
    }

    pub fn phase(&self) -> PopupPhase {
        self.inner.state.lock().phase
    }

    /// Whether the delay timer is running.
    pub fn is_waiting(&self) -> bool {
        self.phase() == PopupPhase::Waiting
    }

    /// The pending delay timer, if any.
    pub fn timer(&self) -> Option<TimerId> {
        self.inner.state.lock().timer
    }

    /// The dialog, once the delay has elapsed.
    pub fn dialog(&self) -> Option<ProgressDialog> {
        self.inner.state.lock().dialog.clone()
    }

    /// Emitted with the new dialog right before it is synced and shown.
    ///
    /// Connect here to hook the dialog's own signals up to a host window.
    pub fn dialog_created(&self) -> &Signal<ProgressDialog> {
        &self.inner.dialog_created
    }

    #[tracing::instrument(skip_all, target = "horizon_progress::popup", level = "trace")]
    fn on_status(&self, event: &StatusEvent) {
        let mut state = self.inner.state.lock();
        let phase = state.phase;
        match phase {
            PopupPhase::HandedOver | PopupPhase::Finished => {}
            _ if event.is_completed() => {
                if let Some(timer) = state.timer.take() {
                    // The timer may already have fired; nothing left to stop then.
                    let _ = self.inner.ui.stop_timer(timer);
                }
                state.phase = PopupPhase::Finished;
                let registration = state.registration.take();
                drop(state);

                self.deregister(registration);
                tracing::debug!(target: targets::POPUP, "completed within the wait delay, no dialog");
            }
            PopupPhase::Idle => {
                let this = self.clone();
                let timer = self
                    .inner
                    .ui
                    .start_one_shot(self.inner.wait, move || this.on_timer());
                state.timer = Some(timer);
                state.phase = PopupPhase::Waiting;
                tracing::trace!(target: targets::POPUP, ?timer, "popup delay started");
            }
            PopupPhase::Waiting => {}
        }
    }

    #[tracing::instrument(skip_all, target = "horizon_progress::popup", level = "trace")]
    fn on_timer(&self) {
        let registration = {
            let mut state = self.inner.state.lock();
            state.timer = None;
            if state.phase != PopupPhase::Waiting {
                return;
            }
            state.phase = PopupPhase::HandedOver;
            state.registration.take()
        };
        self.deregister(registration);

        let Some(monitor) = self.inner.monitor.upgrade() else {
            tracing::debug!(target: targets::POPUP, "monitor dropped before the popup delay elapsed");
            self.inner.state.lock().phase = PopupPhase::Finished;
            return;
        };

        let dialog = match ProgressDialog::build(
            &self.inner.ui,
            &monitor,
            self.inner.cancel_handler.clone(),
            &self.inner.config,
            self.inner.icons.clone(),
        ) {
            Ok(dialog) => dialog,
            Err(err) => {
                tracing::error!(target: targets::POPUP, error = %err, "failed to build progress dialog");
                self.inner.state.lock().phase = PopupPhase::Finished;
                return;
            }
        };

        self.inner.state.lock().dialog = Some(dialog.clone());
        self.inner.dialog_created.emit(dialog.clone());

        // Catch up on anything that happened while no listener was registered.
        dialog.sync_with_monitor();
        if !dialog.is_disposed() {
            dialog.show();
        }
    }

    #[tracing::instrument(skip_all, target = "horizon_progress::popup", level = "trace")]
    fn on_canceled(&self, event: &StatusEvent) {
        let (timer, registration, dialog) = {
            let mut state = self.inner.state.lock();
            if state.phase != PopupPhase::HandedOver {
                state.phase = PopupPhase::Finished;
            }
            (
                state.timer.take(),
                state.registration.take(),
                state.dialog.clone(),
            )
        };

        if let Some(timer) = timer {
            let _ = self.inner.ui.stop_timer(timer);
        }
        self.deregister(registration);

        if let Some(dialog) = &dialog {
            let text = event
                .text()
                .unwrap_or_else(|| self.inner.config.strings.get(StringKey::DefaultCanceledText));
            dialog.update_status(Some(text));
        }
        if let Some(handler) = &self.inner.cancel_handler {
            handler.canceled();
        }
        if let Some(dialog) = dialog {
            dialog.dispose();
        }
        tracing::debug!(target: targets::POPUP, text = event.text(), "operation canceled");
    }

    fn deregister(&self, registration: Option<ListenerId>) {
        if let (Some(id), Some(monitor)) = (registration, self.inner.monitor.upgrade()) {
            monitor.remove_listener(id);
        }
    }
}

impl ProgressListener for DelayedPopup {
    fn status_changed(&self, event: &StatusEvent) {
        let this = self.clone();
        let event = event.clone();
        self.inner.ui.invoke(move || this.on_status(&event));
    }

    fn canceled(&self, event: &StatusEvent) {
        let this = self.clone();
        let event = event.clone();
        self.inner.ui.invoke(move || this.on_canceled(&event));
    }
}

impl std::fmt::Debug for DelayedPopup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DelayedPopup")
            .field("wait", &self.inner.wait)
            .field("phase", &state.phase)
            .field("timer", &state.timer)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(DelayedPopup: Send, Sync, Clone);

// ============================================================================
// Factories
// ============================================================================

/// A monitor together with the popup watching it.
#[derive(Debug, Clone)]
pub struct ModalProgress<M> {
    pub monitor: M,
    pub popup: DelayedPopup,
}

/// Create a determinate monitor whose dialog pops up after `wait`.
///
/// `title` falls back to the localized default title.
///
/// # Errors
///
/// Fails with a headless error when `ui` has no display.
pub fn create_modal_determinate_progress_monitor(
    ui: &UiContext,
    title: Option<&str>,
    min: i32,
    max: i32,
    current: i32,
    wait: Duration,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
) -> Result<ModalProgress<DeterminateProgressMonitor>> {
    let monitor = DeterminateProgressMonitor::with_wait(min, max, current, wait);
    attach_modal(ui, monitor, cancel_handler, &modal_config(title, wait))
}

/// Create a determinate monitor from a configuration.
///
/// The popup delay is `config.wait_ms`, in whole milliseconds.
pub fn create_modal_determinate_progress_monitor_with_config(
    ui: &UiContext,
    min: i32,
    max: i32,
    current: i32,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
    config: &ProgressConfig,
) -> Result<ModalProgress<DeterminateProgressMonitor>> {
    let monitor = DeterminateProgressMonitor::with_wait(min, max, current, config.wait());
    attach_modal(ui, monitor, cancel_handler, config)
}

/// Create an indeterminate monitor whose dialog pops up after `wait`.
///
/// # Errors
///
/// Fails with a headless error when `ui` has no display.
pub fn create_modal_indeterminate_progress_monitor(
    ui: &UiContext,
    title: Option<&str>,
    wait: Duration,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
) -> Result<ModalProgress<IndeterminateProgressMonitor>> {
    let monitor = IndeterminateProgressMonitor::with_wait(wait);
    attach_modal(ui, monitor, cancel_handler, &modal_config(title, wait))
}

/// Create an indeterminate monitor from a configuration.
pub fn create_modal_indeterminate_progress_monitor_with_config(
    ui: &UiContext,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
    config: &ProgressConfig,
) -> Result<ModalProgress<IndeterminateProgressMonitor>> {
    let monitor = IndeterminateProgressMonitor::with_wait(config.wait());
    attach_modal(ui, monitor, cancel_handler, config)
}

/// The popup takes its delay from the monitor, not from `config`.
fn attach_modal<M>(
    ui: &UiContext,
    monitor: M,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
    config: &ProgressConfig,
) -> Result<ModalProgress<M>>
where
    M: Clone + Into<Monitor>,
{
    let popup = DelayedPopup::attach(ui, &monitor.clone().into(), cancel_handler, config)?;
    Ok(ModalProgress { monitor, popup })
}

fn modal_config(title: Option<&str>, wait: Duration) -> ProgressConfig {
    let config = ProgressConfig::default().with_wait(wait).with_modal(true);
    match title {
        Some(title) => config.with_title(title),
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const WAIT: Duration = Duration::from_millis(500);

    fn counting_handler() -> (Arc<AtomicUsize>, Arc<dyn CancelHandler>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let handler: Arc<dyn CancelHandler> = Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, handler)
    }

    #[test]
    fn test_headless_factories_fail() {
        let ui = UiContext::headless();
        let err = create_modal_determinate_progress_monitor(&ui, None, 0, 10, 0, WAIT, None)
            .unwrap_err();
        assert!(err.is_headless());
        let err = create_modal_indeterminate_progress_monitor(&ui, None, WAIT, None).unwrap_err();
        assert!(err.is_headless());
    }

    #[test]
    fn test_first_event_starts_single_timer() {
        let ui = UiContext::new();
        let progress =
            create_modal_determinate_progress_monitor(&ui, None, 0, 10, 0, WAIT, None).unwrap();
        assert_eq!(progress.popup.phase(), PopupPhase::Idle);

        progress.monitor.start(None);
        progress.monitor.set_current(3, None);

        assert!(progress.popup.is_waiting());
        assert_eq!(ui.active_timer_count(), 1);
    }

    #[test]
    fn test_completion_before_delay_skips_dialog() {
        let ui = UiContext::new();
        let progress =
            create_modal_determinate_progress_monitor(&ui, None, 0, 10, 0, WAIT, None).unwrap();

        progress.monitor.start(None);
        progress.monitor.set_current(10, None);

        assert_eq!(progress.popup.phase(), PopupPhase::Finished);
        assert_eq!(ui.active_timer_count(), 0);
        assert_eq!(progress.monitor.listener_count(), 0);

        ui.process_events_at(Instant::now() + Duration::from_secs(1));
        assert!(progress.popup.dialog().is_none());
    }

    #[test]
    fn test_timer_hands_monitor_to_dialog() {
        let ui = UiContext::new();
        let progress = create_modal_indeterminate_progress_monitor(&ui, Some("Scan"), WAIT, None)
            .unwrap();
        let created = Arc::new(AtomicUsize::new(0));
        let created_clone = created.clone();
        progress.popup.dialog_created().connect(move |_| {
            created_clone.fetch_add(1, Ordering::SeqCst);
        });

        progress.monitor.update_status_text(Some("scanning"));
        ui.process_events_at(Instant::now() + Duration::from_millis(600));

        let dialog = progress.popup.dialog().unwrap();
        assert_eq!(progress.popup.phase(), PopupPhase::HandedOver);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(dialog.is_visible());
        assert_eq!(dialog.title(), "Scan");
        assert_eq!(dialog.status_text().as_deref(), Some("scanning"));
        assert_eq!(progress.monitor.listener_count(), 1);
    }

    #[test]
    fn test_cancel_before_delay_invokes_handler() {
        let ui = UiContext::new();
        let (canceled, handler) = counting_handler();
        let progress =
            create_modal_determinate_progress_monitor(&ui, None, 0, 10, 0, WAIT, Some(handler))
                .unwrap();

        progress.monitor.start(None);
        progress.monitor.cancel(Some("stop"));

        assert_eq!(canceled.load(Ordering::SeqCst), 1);
        assert_eq!(progress.popup.phase(), PopupPhase::Finished);
        assert_eq!(ui.active_timer_count(), 0);
        assert_eq!(progress.monitor.listener_count(), 0);
    }

    #[test]
    fn test_sub_millisecond_wait_is_kept() {
        let ui = UiContext::new();
        let wait = Duration::from_micros(900);
        let progress =
            create_modal_determinate_progress_monitor(&ui, None, 0, 10, 0, wait, None).unwrap();
        assert_eq!(progress.monitor.wait_duration(), wait);

        progress.monitor.start(None);
        ui.process_events_at(Instant::now() + Duration::from_millis(5));
        assert!(progress.popup.dialog().is_some());
    }

    #[test]
    fn test_unbounded_wait_keeps_popup_waiting() {
        let ui = UiContext::new();
        let monitor = DeterminateProgressMonitor::with_wait(0, 10, 0, Duration::MAX);
        let popup = DelayedPopup::attach(
            &ui,
            &Monitor::from(monitor.clone()),
            None,
            &ProgressConfig::default(),
        )
        .unwrap();

        monitor.start(None);
        assert!(popup.is_waiting());
        assert_eq!(ui.active_timer_count(), 1);

        ui.process_events_at(Instant::now() + Duration::from_secs(3600));
        assert!(popup.dialog().is_none());

        monitor.set_current(10, None);
        assert_eq!(popup.phase(), PopupPhase::Finished);
        assert_eq!(ui.active_timer_count(), 0);
    }

    #[test]
    fn test_config_wait_is_used() {
        let ui = UiContext::new();
        let config = ProgressConfig::default().with_wait(Duration::from_millis(50));
        let progress =
            create_modal_indeterminate_progress_monitor_with_config(&ui, None, &config).unwrap();
        assert_eq!(progress.monitor.wait_duration(), Duration::from_millis(50));
    }
}
