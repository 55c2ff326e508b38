//! Progress monitors.
//!
//! A monitor is the object a background task drives to report how far it has
//! come. Every mutation builds a fresh [`StatusEvent`] from the monitor's
//! state and delivers it synchronously to the registered listeners.
//!
//! Two flavours exist:
//!
//! - [`DeterminateProgressMonitor`] tracks a numeric `min..=max` range and is
//!   complete once `current >= max`.
//! - [`IndeterminateProgressMonitor`] has no range; the caller marks it
//!   complete explicitly.
//!
//! [`Monitor`] wraps either one for code that handles both.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_progress_core::{
//!     DeterminateProgressMonitor, ProgressListener, ProgressMonitor, StatusEvent,
//! };
//!
//! struct Log;
//!
//! impl ProgressListener for Log {
//!     fn status_changed(&self, event: &StatusEvent) {
//!         println!("{:?} completed={}", event.text(), event.is_completed());
//!     }
//!     fn canceled(&self, _event: &StatusEvent) {}
//! }
//!
//! let monitor = DeterminateProgressMonitor::new(0, 3, 0);
//! monitor.add_listener(Arc::new(Log));
//! monitor.start(Some("copying"));
//! for step in 1..=3 {
//!     monitor.set_current(step, Some(format!("file {step}").as_str()));
//! }
//! assert!(monitor.is_completed());
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::event::{MonitorId, Progress, StatusEvent, next_monitor_id};
use crate::listener::{ListenerId, ListenerRegistry, ProgressListener};
use crate::logging::{span_names, targets};

/// Common operations of every progress monitor.
pub trait ProgressMonitor: Send + Sync {
    /// The id carried as the source of every event this monitor fires.
    fn id(&self) -> MonitorId;

    /// How long a delayed popup waits before showing a dialog.
    fn wait_duration(&self) -> Duration;

    /// Announce that the operation has started.
    ///
    /// `text` becomes the event's status text; the stored text is unchanged.
    fn start(&self, text: Option<&str>);

    /// Announce that the operation was canceled.
    ///
    /// `text` becomes the event's status text; the stored text is unchanged.
    fn cancel(&self, text: Option<&str>);

    /// Register a listener. The same listener may be registered repeatedly.
    fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId;

    /// Remove one registration by id.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Remove the most recent registration of `listener`.
    fn remove_listener_instance(&self, listener: &Arc<dyn ProgressListener>) -> bool;

    /// Number of registrations.
    fn listener_count(&self) -> usize;

    /// The stored status text.
    fn status_text(&self) -> Option<String>;

    /// The current progress payload.
    fn progress(&self) -> Progress;

    /// Whether the current state reports finished work.
    fn is_completed(&self) -> bool {
        self.progress().is_completed()
    }

    /// Build an event from the current state with the stored status text.
    fn current_event(&self) -> StatusEvent {
        StatusEvent::new(self.id(), self.status_text(), self.progress())
    }
}

/// Listener registration, dispatch and wait delay shared by all monitors.
#[derive(Debug)]
pub struct MonitorBase {
    id: MonitorId,
    wait: Duration,
    listeners: ListenerRegistry,
}

impl MonitorBase {
    /// Create a base with a fresh monitor id.
    pub fn new(wait: Duration) -> Self {
        Self {
            id: next_monitor_id(),
            wait,
            listeners: ListenerRegistry::new(),
        }
    }

    /// The monitor id.
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// The popup wait delay.
    pub fn wait_duration(&self) -> Duration {
        self.wait
    }

    /// The listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Deliver a status event to every listener in registration order.
    pub fn fire_status(&self, event: &StatusEvent) -> usize {
        let _span = tracing::trace_span!(target: targets::MONITOR, span_names::DISPATCH).entered();
        tracing::debug!(
            target: targets::MONITOR,
            monitor = self.id.as_u64(),
            text = event.text(),
            progress = ?event.progress(),
            "status changed"
        );
        self.listeners.dispatch_status(event)
    }

    /// Deliver a cancellation event to every listener in registration order.
    pub fn fire_canceled(&self, event: &StatusEvent) -> usize {
        let _span = tracing::trace_span!(target: targets::MONITOR, span_names::DISPATCH).entered();
        tracing::debug!(
            target: targets::MONITOR,
            monitor = self.id.as_u64(),
            text = event.text(),
            "operation canceled"
        );
        self.listeners.dispatch_canceled(event)
    }
}

/// How a determinate monitor treats values outside `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Keep values as given.
    #[default]
    Allow,
    /// Clamp `current` into `min..=max`.
    Clamp,
}

impl BoundsPolicy {
    fn apply(self, min: i32, max: i32, value: i32) -> i32 {
        match self {
            BoundsPolicy::Allow => {
                if value < min || value > max {
                    tracing::debug!(
                        target: targets::MONITOR,
                        min,
                        max,
                        value,
                        "progress value outside range"
                    );
                }
                value
            }
            // `i32::clamp` panics on an inverted range.
            BoundsPolicy::Clamp => value.max(min).min(max),
        }
    }
}

// =============================================================================
// Determinate
// =============================================================================

#[derive(Debug)]
struct DeterminateState {
    min: i32,
    max: i32,
    current: i32,
    text: Option<String>,
    bounds_policy: BoundsPolicy,
}

impl DeterminateState {
    fn progress(&self) -> Progress {
        Progress::Determinate {
            min: self.min,
            max: self.max,
            current: self.current,
        }
    }
}

#[derive(Debug)]
struct DeterminateInner {
    base: MonitorBase,
    state: Mutex<DeterminateState>,
}

/// A monitor over a bounded numeric range.
///
/// Cloning yields another handle to the same monitor.
#[derive(Debug, Clone)]
pub struct DeterminateProgressMonitor {
    inner: Arc<DeterminateInner>,
}

impl DeterminateProgressMonitor {
    /// Create a monitor with no popup delay.
    pub fn new(min: i32, max: i32, current: i32) -> Self {
        Self::with_wait(min, max, current, Duration::ZERO)
    }

    /// Create a monitor with the given popup delay.
    pub fn with_wait(min: i32, max: i32, current: i32, wait: Duration) -> Self {
        Self {
            inner: Arc::new(DeterminateInner {
                base: MonitorBase::new(wait),
                state: Mutex::new(DeterminateState {
                    min,
                    max,
                    current,
                    text: None,
                    bounds_policy: BoundsPolicy::Allow,
                }),
            }),
        }
    }

    /// Create a monitor with an empty `0..=0` range and the given delay.
    pub fn with_wait_only(wait: Duration) -> Self {
        Self::with_wait(0, 0, 0, wait)
    }

    /// Set the bounds policy. Under [`BoundsPolicy::Clamp`] the current
    /// value is clamped immediately.
    pub fn with_bounds_policy(self, policy: BoundsPolicy) -> Self {
        {
            let mut state = self.inner.state.lock();
            state.bounds_policy = policy;
            if policy == BoundsPolicy::Clamp {
                state.current = policy.apply(state.min, state.max, state.current);
            }
        }
        self
    }

    /// The bounds policy in effect.
    pub fn bounds_policy(&self) -> BoundsPolicy {
        self.inner.state.lock().bounds_policy
    }

    pub fn min(&self) -> i32 {
        self.inner.state.lock().min
    }

    pub fn max(&self) -> i32 {
        self.inner.state.lock().max
    }

    pub fn current(&self) -> i32 {
        self.inner.state.lock().current
    }

    /// Store `value` and `text` and fire a status event.
    ///
    /// A `None` text clears the stored text. The event reports completion
    /// when `value >= max`.
    pub fn set_current(&self, value: i32, text: Option<&str>) {
        let event = {
            let mut state = self.inner.state.lock();
            state.current = state.bounds_policy.apply(state.min, state.max, value);
            state.text = text.map(str::to_owned);
            StatusEvent::new(self.inner.base.id(), state.text.clone(), state.progress())
        };
        self.inner.base.fire_status(&event);
    }

    /// Store `text` and fire a status event with unchanged numbers.
    pub fn update_status_text(&self, text: Option<&str>) {
        let event = {
            let mut state = self.inner.state.lock();
            state.text = text.map(str::to_owned);
            StatusEvent::new(self.inner.base.id(), state.text.clone(), state.progress())
        };
        self.inner.base.fire_status(&event);
    }

    /// Replace the range and fire a status event.
    pub fn set_range(&self, min: i32, max: i32) {
        let event = {
            let mut state = self.inner.state.lock();
            state.min = min;
            state.max = max;
            state.current = state.bounds_policy.apply(min, max, state.current);
            StatusEvent::new(self.inner.base.id(), state.text.clone(), state.progress())
        };
        self.inner.base.fire_status(&event);
    }

    /// A weak handle that does not keep the monitor alive.
    pub fn downgrade(&self) -> WeakMonitor {
        WeakMonitor(WeakKind::Determinate(Arc::downgrade(&self.inner)))
    }

    fn event_with_text(&self, text: Option<&str>) -> StatusEvent {
        let progress = self.inner.state.lock().progress();
        StatusEvent::new(self.inner.base.id(), text.map(str::to_owned), progress)
    }
}

impl ProgressMonitor for DeterminateProgressMonitor {
    fn id(&self) -> MonitorId {
        self.inner.base.id()
    }

    fn wait_duration(&self) -> Duration {
        self.inner.base.wait_duration()
    }

    fn start(&self, text: Option<&str>) {
        let event = self.event_with_text(text);
        self.inner.base.fire_status(&event);
    }

    fn cancel(&self, text: Option<&str>) {
        let event = self.event_with_text(text);
        self.inner.base.fire_canceled(&event);
    }

    fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.inner.base.listeners().add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.base.listeners().remove(id)
    }

    fn remove_listener_instance(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        self.inner.base.listeners().remove_instance(listener)
    }

    fn listener_count(&self) -> usize {
        self.inner.base.listeners().len()
    }

    fn status_text(&self) -> Option<String> {
        self.inner.state.lock().text.clone()
    }

    fn progress(&self) -> Progress {
        self.inner.state.lock().progress()
    }
}

// =============================================================================
// Indeterminate
// =============================================================================

#[derive(Debug, Default)]
struct IndeterminateState {
    text: Option<String>,
    complete: bool,
}

#[derive(Debug)]
struct IndeterminateInner {
    base: MonitorBase,
    state: Mutex<IndeterminateState>,
}

/// A monitor without a numeric range.
///
/// It only reports completion after [`set_completed(true)`](Self::set_completed).
#[derive(Debug, Clone)]
pub struct IndeterminateProgressMonitor {
    inner: Arc<IndeterminateInner>,
}

impl IndeterminateProgressMonitor {
    pub fn new() -> Self {
        Self::with_wait(Duration::ZERO)
    }

    pub fn with_wait(wait: Duration) -> Self {
        Self {
            inner: Arc::new(IndeterminateInner {
                base: MonitorBase::new(wait),
                state: Mutex::new(IndeterminateState::default()),
            }),
        }
    }

    /// Store `text` and fire a status event.
    pub fn update_status_text(&self, text: Option<&str>) {
        let event = {
            let mut state = self.inner.state.lock();
            state.text = text.map(str::to_owned);
            self.event_from(&state, state.text.clone())
        };
        self.inner.base.fire_status(&event);
    }

    /// Store the completion flag and fire a status event.
    pub fn set_completed(&self, complete: bool) {
        let event = {
            let mut state = self.inner.state.lock();
            state.complete = complete;
            self.event_from(&state, state.text.clone())
        };
        self.inner.base.fire_status(&event);
    }

    /// A weak handle that does not keep the monitor alive.
    pub fn downgrade(&self) -> WeakMonitor {
        WeakMonitor(WeakKind::Indeterminate(Arc::downgrade(&self.inner)))
    }

    fn event_from(&self, state: &IndeterminateState, text: Option<String>) -> StatusEvent {
        StatusEvent::new(
            self.inner.base.id(),
            text,
            Progress::Indeterminate {
                complete: state.complete,
            },
        )
    }

    fn event_with_text(&self, text: Option<&str>) -> StatusEvent {
        let state = self.inner.state.lock();
        self.event_from(&state, text.map(str::to_owned))
    }
}

impl Default for IndeterminateProgressMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMonitor for IndeterminateProgressMonitor {
    fn id(&self) -> MonitorId {
        self.inner.base.id()
    }

    fn wait_duration(&self) -> Duration {
        self.inner.base.wait_duration()
    }

    fn start(&self, text: Option<&str>) {
        let event = self.event_with_text(text);
        self.inner.base.fire_status(&event);
    }

    fn cancel(&self, text: Option<&str>) {
        let event = self.event_with_text(text);
        self.inner.base.fire_canceled(&event);
    }

    fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.inner.base.listeners().add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.base.listeners().remove(id)
    }

    fn remove_listener_instance(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        self.inner.base.listeners().remove_instance(listener)
    }

    fn listener_count(&self) -> usize {
        self.inner.base.listeners().len()
    }

    fn status_text(&self) -> Option<String> {
        self.inner.state.lock().text.clone()
    }

    fn progress(&self) -> Progress {
        Progress::Indeterminate {
            complete: self.inner.state.lock().complete,
        }
    }
}

// =============================================================================
// Either flavour
// =============================================================================

/// A handle to either kind of monitor.
#[derive(Debug, Clone)]
pub enum Monitor {
    Determinate(DeterminateProgressMonitor),
    Indeterminate(IndeterminateProgressMonitor),
}

impl Monitor {
    /// A weak handle that does not keep the monitor alive.
    pub fn downgrade(&self) -> WeakMonitor {
        match self {
            Monitor::Determinate(m) => m.downgrade(),
            Monitor::Indeterminate(m) => m.downgrade(),
        }
    }

    /// The determinate monitor, if this is one.
    pub fn as_determinate(&self) -> Option<&DeterminateProgressMonitor> {
        match self {
            Monitor::Determinate(m) => Some(m),
            Monitor::Indeterminate(_) => None,
        }
    }

    /// The indeterminate monitor, if this is one.
    pub fn as_indeterminate(&self) -> Option<&IndeterminateProgressMonitor> {
        match self {
            Monitor::Indeterminate(m) => Some(m),
            Monitor::Determinate(_) => None,
        }
    }

    fn as_dyn(&self) -> &dyn ProgressMonitor {
        match self {
            Monitor::Determinate(m) => m,
            Monitor::Indeterminate(m) => m,
        }
    }
}

impl From<DeterminateProgressMonitor> for Monitor {
    fn from(monitor: DeterminateProgressMonitor) -> Self {
        Monitor::Determinate(monitor)
    }
}

impl From<IndeterminateProgressMonitor> for Monitor {
    fn from(monitor: IndeterminateProgressMonitor) -> Self {
        Monitor::Indeterminate(monitor)
    }
}

impl ProgressMonitor for Monitor {
    fn id(&self) -> MonitorId {
        self.as_dyn().id()
    }

    fn wait_duration(&self) -> Duration {
        self.as_dyn().wait_duration()
    }

    fn start(&self, text: Option<&str>) {
        self.as_dyn().start(text)
    }

    fn cancel(&self, text: Option<&str>) {
        self.as_dyn().cancel(text)
    }

    fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.as_dyn().add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.as_dyn().remove_listener(id)
    }

    fn remove_listener_instance(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        self.as_dyn().remove_listener_instance(listener)
    }

    fn listener_count(&self) -> usize {
        self.as_dyn().listener_count()
    }

    fn status_text(&self) -> Option<String> {
        self.as_dyn().status_text()
    }

    fn progress(&self) -> Progress {
        self.as_dyn().progress()
    }
}

#[derive(Debug, Clone)]
enum WeakKind {
    Determinate(Weak<DeterminateInner>),
    Indeterminate(Weak<IndeterminateInner>),
}

/// A non-owning monitor handle.
///
/// Listeners that need to reach back into their monitor (to deregister or
/// cancel) hold one of these, so the monitor and its listeners do not keep
/// each other alive.
#[derive(Debug, Clone)]
pub struct WeakMonitor(WeakKind);

impl WeakMonitor {
    /// Get a strong handle if the monitor is still alive.
    pub fn upgrade(&self) -> Option<Monitor> {
        match &self.0 {
            WeakKind::Determinate(weak) => weak
                .upgrade()
                .map(|inner| Monitor::Determinate(DeterminateProgressMonitor { inner })),
            WeakKind::Indeterminate(weak) => weak
                .upgrade()
                .map(|inner| Monitor::Indeterminate(IndeterminateProgressMonitor { inner })),
        }
    }
}

static_assertions::assert_impl_all!(DeterminateProgressMonitor: Send, Sync, Clone);
static_assertions::assert_impl_all!(IndeterminateProgressMonitor: Send, Sync, Clone);
static_assertions::assert_impl_all!(Monitor: Send, Sync, Clone);
static_assertions::assert_impl_all!(WeakMonitor: Send, Sync);
