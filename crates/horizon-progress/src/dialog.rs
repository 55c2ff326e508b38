//! Progress dialog implementation.
//!
//! This module provides [`ProgressDialog`], a listener that turns a monitor's
//! status events into the presentation state of a progress window: title,
//! status label with a history log, a collapsible details pane, a progress
//! indicator and a dual-purpose cancel/close button.
//!
//! The dialog does not draw anything itself. A host toolkit connects to the
//! [`shown`](ProgressDialog::shown), [`changed`](ProgressDialog::changed) and
//! [`disposed`](ProgressDialog::disposed) signals and renders the
//! [`DialogSnapshot`] it receives.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_progress::{
//!     DeterminateProgressMonitor, Monitor, ProgressDialog, ProgressMonitor, UiContext,
//! };
//!
//! let ui = UiContext::new();
//! let monitor = Monitor::from(DeterminateProgressMonitor::new(0, 100, 0));
//! let dialog = ProgressDialog::new(&ui, &monitor, Some(Arc::new(|| println!("stop!"))))?;
//!
//! dialog.changed().connect(|snapshot| {
//!     println!("{:?} {}%", snapshot.status, snapshot.indicator.percent());
//! });
//! dialog.show();
//!
//! if let Some(m) = monitor.as_determinate() {
//!     m.set_current(40, Some("Copying"));
//! }
//! assert_eq!(dialog.indicator().value, 40);
//! # Ok::<(), horizon_progress::ProgressError>(())
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_progress_core::logging::targets;
use horizon_progress_core::{
    CancelHandler, ListenerId, Monitor, Progress, ProgressListener, ProgressMonitor, Signal,
    StatusEvent, UiContext, WeakMonitor,
};

use crate::config::ProgressConfig;
use crate::error::Result;
use crate::icons::{DetailsIcons, Icon};
use crate::l10n::{StringKey, Strings};

// ============================================================================
// Presentation types
// ============================================================================

/// What the action button does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Cancel the monitored operation.
    Cancel,
    /// Dispose the dialog.
    Close,
}

/// The dialog's dual-purpose cancel/close button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub role: ButtonRole,
}

/// What happens when the user asks the window to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseOperation {
    /// Ignore the request.
    #[default]
    DoNothing,
    /// Dispose the dialog.
    Dispose,
}

/// The progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub min: i32,
    pub max: i32,
    pub value: i32,
    /// Busy animation instead of a filled bar.
    pub indeterminate: bool,
}

impl Indicator {
    /// Range used for indeterminate monitors.
    const BUSY_RANGE: (i32, i32) = (0, 100);

    fn for_progress(progress: Progress) -> Self {
        match progress {
            Progress::Determinate { min, max, current } => Self {
                min,
                max,
                value: current,
                indeterminate: false,
            },
            Progress::Indeterminate { .. } => Self {
                min: Self::BUSY_RANGE.0,
                max: Self::BUSY_RANGE.1,
                value: Self::BUSY_RANGE.0,
                indeterminate: true,
            },
        }
    }

    /// Fraction of the bar to fill (0.0 to 1.0).
    ///
    /// Returns 0.0 while the indicator is indeterminate.
    pub fn fraction(&self) -> f32 {
        self.as_progress().fraction()
    }

    /// The fill as a whole percentage.
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }

    fn as_progress(&self) -> Progress {
        if self.indeterminate {
            Progress::Indeterminate { complete: false }
        } else {
            Progress::Determinate {
                min: self.min,
                max: self.max,
                current: self.value,
            }
        }
    }
}

/// Everything a host toolkit needs to draw the dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogSnapshot {
    pub title: String,
    pub modal: bool,
    pub visible: bool,
    pub disposed: bool,
    /// Current status label.
    pub status: Option<String>,
    /// Earlier labels, one per line, each ending in a newline.
    pub history: String,
    pub details_expanded: bool,
    pub details_label: String,
    pub indicator: Indicator,
    /// `None` when the operation cannot be canceled.
    pub action_button: Option<ActionButton>,
    pub close_operation: CloseOperation,
}

// ============================================================================
// ProgressDialog
// ============================================================================

#[derive(Debug)]
struct DialogState {
    title: String,
    modal: bool,
    visible: bool,
    disposed: bool,
    status: Option<String>,
    history: String,
    details_expanded: bool,
    indicator: Indicator,
    action_button: Option<ActionButton>,
    close_operation: CloseOperation,
    auto_close_on_complete: bool,
    auto_close_on_cancel: bool,
}

impl DialogState {
    /// Replace the label, moving a differing previous label into the history.
    fn update_status(&mut self, text: Option<&str>) {
        let previous = std::mem::replace(&mut self.status, text.map(str::to_owned));
        if let Some(previous) = previous
            && Some(previous.as_str()) != text
        {
            self.history.push_str(&previous);
            self.history.push('\n');
        }
    }

    fn snapshot(&self, details_label: &str) -> DialogSnapshot {
        DialogSnapshot {
            title: self.title.clone(),
            modal: self.modal,
            visible: self.visible,
            disposed: self.disposed,
            status: self.status.clone(),
            history: self.history.clone(),
            details_expanded: self.details_expanded,
            details_label: details_label.to_owned(),
            indicator: self.indicator,
            action_button: self.action_button.clone(),
            close_operation: self.close_operation,
        }
    }
}

struct DialogInner {
    ui: UiContext,
    monitor: WeakMonitor,
    cancel_handler: Option<Arc<dyn CancelHandler>>,
    strings: Strings,
    icons: DetailsIcons,
    state: Mutex<DialogState>,
    registration: Mutex<Option<ListenerId>>,
    shown: Signal<DialogSnapshot>,
    changed: Signal<DialogSnapshot>,
    disposed: Signal<()>,
}

/// A progress window driven by a monitor.
///
/// The dialog registers itself as a listener of its monitor on construction
/// and deregisters when disposed. Listener callbacks arriving on a worker
/// thread are posted to the [`UiContext`]; every state change happens on the
/// UI thread.
///
/// # Cancel and Close
///
/// Without a cancel handler the dialog has no action button at all. With
/// one, the button starts as **Cancel** and asks the monitor to cancel. If
/// the operation completes while auto-close-on-complete is off, the button
/// turns into **Close** and simply disposes the dialog.
///
/// # Signals
///
/// - `shown()`: emitted when the dialog becomes visible
/// - `changed()`: emitted after every presentation change
/// - `disposed()`: emitted once when the dialog is disposed
#[derive(Clone)]
pub struct ProgressDialog {
    inner: Arc<DialogInner>,
}

impl ProgressDialog {
    /// Create a dialog with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails with a headless error when `ui` has no display.
    pub fn new(
        ui: &UiContext,
        monitor: &Monitor,
        cancel_handler: Option<Arc<dyn CancelHandler>>,
    ) -> Result<Self> {
        Self::with_config(ui, monitor, cancel_handler, &ProgressConfig::default())
    }

    /// Create a dialog with a title and the default configuration.
    pub fn with_title(
        ui: &UiContext,
        title: impl Into<String>,
        monitor: &Monitor,
        cancel_handler: Option<Arc<dyn CancelHandler>>,
    ) -> Result<Self> {
        let config = ProgressConfig::default().with_title(title);
        Self::with_config(ui, monitor, cancel_handler, &config)
    }

    /// Create a dialog from a configuration.
    ///
    /// Icons are loaded from the configured directory; a missing icon is
    /// logged and left out.
    pub fn with_config(
        ui: &UiContext,
        monitor: &Monitor,
        cancel_handler: Option<Arc<dyn CancelHandler>>,
        config: &ProgressConfig,
    ) -> Result<Self> {
        Self::build(ui, monitor, cancel_handler, config, config.load_icons())
    }

    pub(crate) fn build(
        ui: &UiContext,
        monitor: &Monitor,
        cancel_handler: Option<Arc<dyn CancelHandler>>,
        config: &ProgressConfig,
        icons: DetailsIcons,
    ) -> Result<Self> {
        ui.require_display()?;

        let strings = config.strings.clone();
        let action_button = cancel_handler.as_ref().map(|_| ActionButton {
            label: strings.get(StringKey::CancelButton).to_owned(),
            role: ButtonRole::Cancel,
        });

        let state = DialogState {
            title: config.resolved_title().to_owned(),
            modal: config.modal,
            visible: false,
            disposed: false,
            status: None,
            history: String::new(),
            details_expanded: false,
            indicator: Indicator::for_progress(monitor.progress()),
            action_button,
            close_operation: CloseOperation::DoNothing,
            auto_close_on_complete: config.auto_close_on_complete,
            auto_close_on_cancel: config.auto_close_on_cancel,
        };

        let dialog = Self {
            inner: Arc::new(DialogInner {
                ui: ui.clone(),
                monitor: monitor.downgrade(),
                cancel_handler,
                strings,
                icons,
                state: Mutex::new(state),
                registration: Mutex::new(None),
                shown: Signal::new(),
                changed: Signal::new(),
                disposed: Signal::new(),
            }),
        };

        let id = monitor.add_listener(Arc::new(dialog.clone()));
        *dialog.inner.registration.lock() = Some(id);

        tracing::debug!(
            target: targets::DIALOG,
            monitor = monitor.id().as_u64(),
            listener = id.as_u64(),
            cancelable = dialog.is_cancelable(),
            "progress dialog created"
        );
        Ok(dialog)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set whether to dispose when the monitor reports completion.
    pub fn set_auto_close_on_complete(&self, auto_close: bool) {
        self.inner.state.lock().auto_close_on_complete = auto_close;
    }

    /// Set whether to dispose after a cancellation.
    pub fn set_auto_close_on_cancel(&self, auto_close: bool) {
        self.inner.state.lock().auto_close_on_cancel = auto_close;
    }

    pub fn auto_close_on_complete(&self) -> bool {
        self.inner.state.lock().auto_close_on_complete
    }

    pub fn auto_close_on_cancel(&self) -> bool {
        self.inner.state.lock().auto_close_on_cancel
    }

    /// Whether a cancel handler was supplied.
    pub fn is_cancelable(&self) -> bool {
        self.inner.cancel_handler.is_some()
    }

    // =========================================================================
    // Presentation state
    // =========================================================================

    /// A copy of the full presentation state.
    pub fn snapshot(&self) -> DialogSnapshot {
        self.inner.state.lock().snapshot(self.details_label())
    }

    pub fn title(&self) -> String {
        self.inner.state.lock().title.clone()
    }

    pub fn is_modal(&self) -> bool {
        self.inner.state.lock().modal
    }

    pub fn is_visible(&self) -> bool {
        self.inner.state.lock().visible
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// The current status label.
    pub fn status_text(&self) -> Option<String> {
        self.inner.state.lock().status.clone()
    }

    /// Earlier status labels, newline-terminated.
    pub fn history(&self) -> String {
        self.inner.state.lock().history.clone()
    }

    pub fn indicator(&self) -> Indicator {
        self.inner.state.lock().indicator
    }

    pub fn action_button(&self) -> Option<ActionButton> {
        self.inner.state.lock().action_button.clone()
    }

    pub fn close_operation(&self) -> CloseOperation {
        self.inner.state.lock().close_operation
    }

    pub fn is_details_expanded(&self) -> bool {
        self.inner.state.lock().details_expanded
    }

    /// Label of the details toggle.
    pub fn details_label(&self) -> &str {
        self.inner.strings.get(StringKey::DetailsButton)
    }

    /// Icon of the details toggle in its current state, if one was loaded.
    pub fn details_icon(&self) -> Option<Icon> {
        let expanded = self.is_details_expanded();
        self.inner.icons.for_state(expanded).cloned()
    }

    // =========================================================================
    // Signal Access
    // =========================================================================

    /// Emitted when the dialog becomes visible.
    pub fn shown(&self) -> &Signal<DialogSnapshot> {
        &self.inner.shown
    }

    /// Emitted after every presentation change.
    pub fn changed(&self) -> &Signal<DialogSnapshot> {
        &self.inner.changed
    }

    /// Emitted once when the dialog is disposed.
    pub fn disposed(&self) -> &Signal<()> {
        &self.inner.disposed
    }

    // =========================================================================
    // User interaction (UI thread)
    // =========================================================================

    /// Make the dialog visible.
    ///
    /// Returns `false` if the dialog was already disposed.
    pub fn show(&self) -> bool {
        self.assert_ui_thread();
        let snapshot = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                tracing::warn!(target: targets::DIALOG, "show called on a disposed dialog");
                return false;
            }
            if state.visible {
                return true;
            }
            state.visible = true;
            state.snapshot(self.details_label())
        };
        tracing::debug!(target: targets::DIALOG, title = %snapshot.title, "progress dialog shown");
        self.inner.shown.emit(snapshot);
        true
    }

    /// Set the status label.
    ///
    /// A previous label that differs from `text` is appended to the history.
    pub fn update_status(&self, text: Option<&str>) {
        self.assert_ui_thread();
        self.mutate(|state| state.update_status(text));
    }

    /// Expand or collapse the details pane.
    pub fn toggle_details(&self) -> bool {
        self.assert_ui_thread();
        let mut expanded = false;
        self.mutate(|state| {
            state.details_expanded = !state.details_expanded;
            expanded = state.details_expanded;
        });
        expanded
    }

    /// Handle a click on the action button.
    ///
    /// A **Close** button disposes the dialog; a **Cancel** button asks the
    /// monitor to cancel, which reaches the cancel handler through
    /// [`ProgressListener::canceled`]. Returns `false` when there is no
    /// button.
    pub fn click_action_button(&self) -> bool {
        self.assert_ui_thread();
        let role = {
            let state = self.inner.state.lock();
            if state.disposed {
                return false;
            }
            state.action_button.as_ref().map(|button| button.role)
        };

        match role {
            None => false,
            Some(ButtonRole::Close) => {
                tracing::debug!(target: targets::DIALOG, "close button clicked");
                self.dispose();
                true
            }
            Some(ButtonRole::Cancel) => {
                tracing::debug!(target: targets::DIALOG, "cancel button clicked");
                match self.inner.monitor.upgrade() {
                    Some(monitor) => monitor.cancel(None),
                    None => {
                        tracing::warn!(target: targets::DIALOG, "monitor already dropped, nothing to cancel");
                    }
                }
                true
            }
        }
    }

    /// Handle a window-close request according to the close operation.
    ///
    /// Returns `true` if the dialog was disposed.
    pub fn request_close(&self) -> bool {
        self.assert_ui_thread();
        match self.close_operation() {
            CloseOperation::Dispose => {
                self.dispose();
                true
            }
            CloseOperation::DoNothing => {
                tracing::trace!(target: targets::DIALOG, "close request ignored");
                false
            }
        }
    }

    /// Hide the dialog, deregister it from its monitor and emit `disposed`.
    ///
    /// Disposing twice has no effect.
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.visible = false;
        }

        let registration = self.inner.registration.lock().take();
        if let (Some(id), Some(monitor)) = (registration, self.inner.monitor.upgrade()) {
            monitor.remove_listener(id);
        }

        tracing::debug!(target: targets::DIALOG, "progress dialog disposed");
        self.inner.disposed.emit(());
    }

    /// Apply the monitor's current state as if it had just fired.
    pub fn sync_with_monitor(&self) {
        if let Some(monitor) = self.inner.monitor.upgrade() {
            self.apply_status(&monitor.current_event());
        }
    }

    // =========================================================================
    // Event handling
    // =========================================================================

    #[tracing::instrument(skip_all, target = "horizon_progress::dialog", level = "trace")]
    fn apply_status(&self, event: &StatusEvent) {
        let mut dispose = false;
        let close_label = self.inner.strings.get(StringKey::CloseButton);
        let applied = self.mutate(|state| {
            state.update_status(event.text());

            if let Progress::Determinate { min, max, current } = event.progress() {
                state.indicator.min = min;
                state.indicator.max = max;
                state.indicator.value = current;
            }

            if event.is_completed() {
                state.indicator.indeterminate = false;
                state.indicator.value = state.indicator.max;
                if state.auto_close_on_complete {
                    dispose = true;
                } else {
                    state.close_operation = CloseOperation::Dispose;
                    if let Some(button) = state.action_button.as_mut() {
                        button.label = close_label.to_owned();
                        button.role = ButtonRole::Close;
                    }
                }
            }
        });

        if applied && dispose {
            self.dispose();
        }
    }

    #[tracing::instrument(skip_all, target = "horizon_progress::dialog", level = "trace")]
    fn apply_canceled(&self, event: &StatusEvent) {
        let text = event
            .text()
            .unwrap_or_else(|| self.inner.strings.get(StringKey::DefaultCanceledText))
            .to_owned();

        let mut dispose = false;
        let applied = self.mutate(|state| {
            state.update_status(Some(&text));
            dispose = state.auto_close_on_cancel;
        });
        if !applied {
            return;
        }

        if let Some(handler) = &self.inner.cancel_handler {
            handler.canceled();
        }
        if dispose {
            self.dispose();
        }
    }

    /// Run `f` on the state unless disposed, then emit `changed`.
    fn mutate(&self, f: impl FnOnce(&mut DialogState)) -> bool {
        let snapshot = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                tracing::trace!(target: targets::DIALOG, "ignoring update to a disposed dialog");
                return false;
            }
            f(&mut state);
            state.snapshot(self.details_label())
        };
        self.inner.changed.emit(snapshot);
        true
    }

    fn assert_ui_thread(&self) {
        self.inner
            .ui
            .affinity()
            .debug_assert_same_thread("ProgressDialog must be used on the UI thread");
    }
}

impl ProgressListener for ProgressDialog {
    fn status_changed(&self, event: &StatusEvent) {
        let this = self.clone();
        let event = event.clone();
        if self.inner.ui.invoke(move || this.apply_status(&event)).is_some() {
            tracing::trace!(target: targets::DIALOG, "status change posted to the UI thread");
        }
    }

    fn canceled(&self, event: &StatusEvent) {
        let this = self.clone();
        let event = event.clone();
        if self.inner.ui.invoke(move || this.apply_canceled(&event)).is_some() {
            tracing::trace!(target: targets::DIALOG, "cancellation posted to the UI thread");
        }
    }
}

impl std::fmt::Debug for ProgressDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ProgressDialog")
            .field("title", &state.title)
            .field("visible", &state.visible)
            .field("disposed", &state.disposed)
            .field("status", &state.status)
            .field("indicator", &state.indicator)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ProgressDialog: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_progress_core::{DeterminateProgressMonitor, IndeterminateProgressMonitor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler() -> (Arc<AtomicUsize>, Arc<dyn CancelHandler>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let handler: Arc<dyn CancelHandler> = Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, handler)
    }

    fn determinate(min: i32, max: i32, current: i32) -> (DeterminateProgressMonitor, Monitor) {
        let monitor = DeterminateProgressMonitor::new(min, max, current);
        (monitor.clone(), Monitor::from(monitor))
    }

    #[test]
    fn test_headless_context_fails_fast() {
        let ui = UiContext::headless();
        let (_, monitor) = determinate(0, 10, 0);
        let err = ProgressDialog::new(&ui, &monitor, None).unwrap_err();
        assert!(err.is_headless());
        assert_eq!(monitor.listener_count(), 0);
    }

    #[test]
    fn test_dialog_registers_with_monitor() {
        let ui = UiContext::new();
        let (_, monitor) = determinate(0, 10, 3);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();

        assert_eq!(monitor.listener_count(), 1);
        assert_eq!(dialog.title(), "Progress");
        assert!(dialog.is_modal());
        assert!(!dialog.is_visible());
        assert_eq!(
            dialog.indicator(),
            Indicator {
                min: 0,
                max: 10,
                value: 3,
                indeterminate: false
            }
        );
    }

    #[test]
    fn test_no_handler_means_no_button() {
        let ui = UiContext::new();
        let monitor = Monitor::from(IndeterminateProgressMonitor::new());
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();

        assert!(!dialog.is_cancelable());
        assert!(dialog.action_button().is_none());
        assert!(!dialog.click_action_button());
        assert!(dialog.indicator().indeterminate);
    }

    #[test]
    fn test_update_status_keeps_history() {
        let ui = UiContext::new();
        let (_, monitor) = determinate(0, 10, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();

        dialog.update_status(Some("one"));
        dialog.update_status(Some("one"));
        dialog.update_status(Some("two"));
        dialog.update_status(None);
        dialog.update_status(Some("three"));

        assert_eq!(dialog.status_text().as_deref(), Some("three"));
        assert_eq!(dialog.history(), "one\ntwo\n");
    }

    #[test]
    fn test_status_event_syncs_indicator() {
        let ui = UiContext::new();
        let (det, monitor) = determinate(0, 10, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();

        det.set_range(5, 20);
        det.set_current(12, Some("halfway"));

        let indicator = dialog.indicator();
        assert_eq!((indicator.min, indicator.max, indicator.value), (5, 20, 12));
        assert_eq!(dialog.status_text().as_deref(), Some("halfway"));
    }

    #[test]
    fn test_completion_auto_closes() {
        let ui = UiContext::new();
        let (det, monitor) = determinate(0, 10, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();
        let disposed = Arc::new(AtomicUsize::new(0));
        let disposed_clone = disposed.clone();
        dialog.disposed().connect(move |_| {
            disposed_clone.fetch_add(1, Ordering::SeqCst);
        });
        dialog.show();

        det.set_current(10, None);

        assert!(dialog.is_disposed());
        assert!(!dialog.is_visible());
        assert_eq!(dialog.indicator().value, 10);
        assert_eq!(monitor.listener_count(), 0);
        dialog.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completion_without_auto_close_turns_button_into_close() {
        let ui = UiContext::new();
        let (det, monitor) = determinate(0, 10, 0);
        let (canceled, handler) = counting_handler();
        let dialog = ProgressDialog::new(&ui, &monitor, Some(handler)).unwrap();
        dialog.set_auto_close_on_complete(false);

        assert_eq!(dialog.close_operation(), CloseOperation::DoNothing);
        assert!(!dialog.request_close());

        det.set_current(10, Some("done"));

        let button = dialog.action_button().unwrap();
        assert_eq!(button.role, ButtonRole::Close);
        assert_eq!(button.label, "Close");
        assert_eq!(dialog.close_operation(), CloseOperation::Dispose);
        assert!(!dialog.is_disposed());

        assert!(dialog.click_action_button());
        assert!(dialog.is_disposed());
        assert_eq!(canceled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_indeterminate_completion_stops_animation() {
        let ui = UiContext::new();
        let indeterminate = IndeterminateProgressMonitor::new();
        let monitor = Monitor::from(indeterminate.clone());
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();
        dialog.set_auto_close_on_complete(false);

        indeterminate.set_completed(true);

        let indicator = dialog.indicator();
        assert!(!indicator.indeterminate);
        assert_eq!(indicator.value, indicator.max);
        assert_eq!(indicator.percent(), 100);
    }

    #[test]
    fn test_cancel_button_cancels_monitor() {
        let ui = UiContext::new();
        let (_, monitor) = determinate(0, 10, 2);
        let (canceled, handler) = counting_handler();
        let dialog = ProgressDialog::new(&ui, &monitor, Some(handler)).unwrap();
        dialog.show();

        let button = dialog.action_button().unwrap();
        assert_eq!(button.label, "Cancel");
        assert!(dialog.click_action_button());

        assert_eq!(canceled.load(Ordering::SeqCst), 1);
        assert_eq!(dialog.status_text().as_deref(), Some("Canceled"));
        assert!(dialog.is_disposed());
    }

    #[test]
    fn test_cancel_without_auto_close_keeps_dialog() {
        let ui = UiContext::new();
        let monitor = Monitor::from(IndeterminateProgressMonitor::new());
        let (canceled, handler) = counting_handler();
        let dialog = ProgressDialog::new(&ui, &monitor, Some(handler)).unwrap();
        dialog.set_auto_close_on_cancel(false);

        monitor.cancel(Some("user aborted"));

        assert_eq!(canceled.load(Ordering::SeqCst), 1);
        assert_eq!(dialog.status_text().as_deref(), Some("user aborted"));
        assert!(!dialog.is_disposed());
    }

    #[test]
    fn test_events_after_dispose_are_ignored() {
        let ui = UiContext::new();
        let (det, monitor) = determinate(0, 10, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();
        dialog.dispose();

        dialog.status_changed(&StatusEvent::new(
            monitor.id(),
            Some("late".into()),
            det.progress(),
        ));
        assert_eq!(dialog.status_text(), None);
        assert!(!dialog.show());
    }

    #[test]
    fn test_indicator_fraction() {
        let mut indicator = Indicator {
            min: 10,
            max: 20,
            value: 15,
            indeterminate: false,
        };
        assert_eq!(indicator.percent(), 50);

        indicator.value = 40;
        assert_eq!(indicator.fraction(), 1.0);

        indicator.indeterminate = true;
        assert_eq!(indicator.fraction(), 0.0);

        let empty = Indicator {
            min: 0,
            max: 0,
            value: 0,
            indeterminate: false,
        };
        assert_eq!(empty.percent(), 100);
    }

    #[test]
    fn test_toggle_details() {
        let ui = UiContext::new();
        let (_, monitor) = determinate(0, 1, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();

        assert_eq!(dialog.details_label(), "Details");
        assert!(dialog.toggle_details());
        assert!(dialog.is_details_expanded());
        assert!(!dialog.toggle_details());
        assert!(dialog.details_icon().is_none());
    }

    #[test]
    fn test_off_thread_events_wait_for_pump() {
        let ui = UiContext::new();
        let (det, monitor) = determinate(0, 10, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();

        std::thread::spawn(move || det.set_current(4, Some("from worker")))
            .join()
            .unwrap();

        assert_eq!(dialog.indicator().value, 0);
        assert_eq!(ui.process_events(), 1);
        assert_eq!(dialog.indicator().value, 4);
        assert_eq!(dialog.status_text().as_deref(), Some("from worker"));
    }

    #[test]
    fn test_changed_signal_carries_snapshot() {
        let ui = UiContext::new();
        let (det, monitor) = determinate(0, 4, 0);
        let dialog = ProgressDialog::new(&ui, &monitor, None).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        dialog.changed().connect(move |snapshot: &DialogSnapshot| {
            seen_clone.lock().push(snapshot.indicator.percent());
        });

        det.set_current(1, None);
        det.set_current(2, None);

        assert_eq!(*seen.lock(), vec![25, 50]);
    }

    #[test]
    fn test_custom_strings() {
        let ui = UiContext::new();
        let (_, monitor) = determinate(0, 1, 0);
        let (_, handler) = counting_handler();
        let config = ProgressConfig::default().with_strings(
            Strings::new()
                .with(StringKey::CancelButton, "Abbrechen")
                .with(StringKey::DefaultDialogTitle, "Fortschritt"),
        );
        let dialog = ProgressDialog::with_config(&ui, &monitor, Some(handler), &config).unwrap();

        assert_eq!(dialog.title(), "Fortschritt");
        assert_eq!(dialog.action_button().unwrap().label, "Abbrechen");
    }
}
