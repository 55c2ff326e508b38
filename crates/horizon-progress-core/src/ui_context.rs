//! The UI context: a thread-affine task and timer queue.
//!
//! Everything that touches presentation state runs on the thread that created
//! the [`UiContext`]. Other threads hand work over with [`UiContext::post`] or
//! [`UiContext::invoke`]; the UI thread runs it when it pumps events with
//! [`UiContext::process_events`], [`UiContext::run_for`] or
//! [`UiContext::run_until`].
//!
//! A context also knows whether it can show windows at all. A headless
//! context still runs tasks and timers, but refuses to back a dialog.
//!
//! ```
//! use horizon_progress_core::UiContext;
//!
//! let ui = UiContext::headless();
//! let handle = ui.clone();
//! std::thread::spawn(move || {
//!     handle.post(|| println!("running on the UI thread"));
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(ui.process_events(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::error::{CoreError, Result};
use crate::logging::{span_names, targets};
use crate::task::{SharedTaskQueue, TaskId};
use crate::thread_check::ThreadAffinity;
use crate::timer::{SharedTimerManager, TimerId};

/// Whether a UI context can show windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// A display is available; dialogs can be created.
    #[default]
    Windowed,
    /// No display; dialog and popup construction fails.
    Headless,
}

struct Inner {
    affinity: ThreadAffinity,
    display: DisplayMode,
    tasks: SharedTaskQueue,
    timers: SharedTimerManager,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    should_quit: AtomicBool,
}

/// Handle to the UI thread's task and timer queues.
///
/// Cloning is cheap; all clones refer to the same context. The handle is
/// `Send + Sync`, but pumping events is only allowed on the creating thread.
#[derive(Clone)]
pub struct UiContext {
    inner: Arc<Inner>,
}

impl UiContext {
    /// Create a windowed context bound to the current thread.
    pub fn new() -> Self {
        Self::with_display(DisplayMode::Windowed)
    }

    /// Create a headless context bound to the current thread.
    pub fn headless() -> Self {
        Self::with_display(DisplayMode::Headless)
    }

    /// Create a context with an explicit display mode.
    pub fn with_display(display: DisplayMode) -> Self {
        // One pending wake-up is enough; extra posts coalesce into it.
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        let display_mode = display;
        tracing::debug!(target: targets::UI_CONTEXT, display = ?display_mode, "ui context created");
        Self {
            inner: Arc::new(Inner {
                affinity: ThreadAffinity::current(),
                display,
                tasks: SharedTaskQueue::new(),
                timers: SharedTimerManager::new(),
                wake_tx,
                wake_rx,
                should_quit: AtomicBool::new(false),
            }),
        }
    }

    /// The thread affinity of this context.
    pub fn affinity(&self) -> ThreadAffinity {
        self.inner.affinity
    }

    /// Whether the caller is on the UI thread.
    pub fn is_ui_thread(&self) -> bool {
        self.inner.affinity.is_same_thread()
    }

    /// The display mode this context was created with.
    pub fn display_mode(&self) -> DisplayMode {
        self.inner.display
    }

    /// Whether windows can be shown.
    pub fn has_display(&self) -> bool {
        self.inner.display == DisplayMode::Windowed
    }

    /// Fail with [`CoreError::Headless`] unless windows can be shown.
    pub fn require_display(&self) -> Result<()> {
        if self.has_display() {
            Ok(())
        } else {
            Err(CoreError::Headless)
        }
    }

    // =========================================================================
    // Task hand-off
    // =========================================================================

    /// Queue `task` to run on the UI thread during the next pump.
    ///
    /// Thread-safe; may be called from any thread, including the UI thread.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.tasks.post(task);
        tracing::trace!(target: targets::UI_CONTEXT, task_id = id.as_u64(), "task posted");
        self.wake();
        id
    }

    /// Cancel a posted task that has not run yet.
    pub fn cancel_task(&self, id: TaskId) -> bool {
        self.inner.tasks.cancel(id)
    }

    /// Run `task` now when on the UI thread, otherwise post it.
    ///
    /// Returns the task id when the work was deferred.
    pub fn invoke<F>(&self, task: F) -> Option<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_ui_thread() {
            task();
            None
        } else {
            Some(self.post(task))
        }
    }

    /// Number of posted tasks waiting to run.
    pub fn pending_task_count(&self) -> usize {
        self.inner.tasks.pending_count()
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Start a one-shot timer; `callback` runs on the UI thread once
    /// `duration` has elapsed.
    pub fn start_one_shot<F>(&self, duration: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.timers.start_one_shot(duration, Box::new(callback));
        self.wake();
        id
    }

    /// Stop a pending timer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Timer`] if the timer already fired or was stopped.
    pub fn stop_timer(&self, id: TimerId) -> Result<()> {
        self.inner.timers.stop(id).map_err(CoreError::from)
    }

    /// Whether a timer is still pending.
    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.inner.timers.is_active(id)
    }

    /// Number of pending timers.
    pub fn active_timer_count(&self) -> usize {
        self.inner.timers.active_count()
    }

    // =========================================================================
    // Event pumping
    // =========================================================================

    /// Run posted tasks and expired timers once, using the current time.
    ///
    /// Returns the number of callbacks run.
    ///
    /// # Panics
    ///
    /// Panics in debug builds when called off the UI thread.
    pub fn process_events(&self) -> usize {
        self.process_events_at(Instant::now())
    }

    /// Run the tasks already queued, then timers due at `now`, then the
    /// tasks those timers posted.
    ///
    /// Queued work goes first so a timer never acts on state that a pending
    /// task (a cancellation, say) is about to change. Taking the time as a
    /// parameter lets callers step timers forward without sleeping.
    pub fn process_events_at(&self, now: Instant) -> usize {
        self.inner
            .affinity
            .debug_assert_same_thread("UiContext events must be processed on the UI thread");

        let _span = tracing::trace_span!(target: targets::UI_CONTEXT, span_names::EVENT_PUMP).entered();

        let mut processed = self.inner.tasks.process_pending();
        for (id, callback) in self.inner.timers.take_expired(now) {
            tracing::trace!(target: targets::UI_CONTEXT, ?id, "running timer callback");
            callback();
            processed += 1;
        }
        processed += self.inner.tasks.process_pending();
        processed
    }

    /// Pump events for `duration`.
    pub fn run_for(&self, duration: Duration) -> Result<usize> {
        self.run_until(Instant::now() + duration)
    }

    /// Pump events until `deadline` or until [`quit`](Self::quit) is called.
    ///
    /// Between rounds the thread sleeps until the next timer is due or work
    /// is posted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ContextQuit`] if the context had already quit.
    #[tracing::instrument(skip_all, target = "horizon_progress_core::ui_context", level = "debug")]
    pub fn run_until(&self, deadline: Instant) -> Result<usize> {
        if self.should_quit() {
            return Err(CoreError::ContextQuit);
        }

        let mut processed = 0;
        loop {
            let now = Instant::now();
            processed += self.process_events_at(now);

            if self.should_quit() {
                tracing::debug!(target: targets::UI_CONTEXT, "event pump stopped by quit");
                break;
            }
            if now >= deadline {
                break;
            }
            if self.inner.tasks.pending_count() > 0 {
                continue;
            }

            let mut wait = deadline.saturating_duration_since(now);
            if let Some(next_timer) = self.inner.timers.time_until_next(now) {
                wait = wait.min(next_timer);
            }
            // A timeout only means nothing was posted in the meantime.
            let _ = self.inner.wake_rx.recv_timeout(wait);
        }
        Ok(processed)
    }

    /// Ask a running pump to stop.
    ///
    /// Once quit, [`run_until`](Self::run_until) refuses to start again;
    /// [`process_events`](Self::process_events) keeps working.
    pub fn quit(&self) {
        tracing::info!(target: targets::UI_CONTEXT, "quit requested");
        self.inner.should_quit.store(true, Ordering::SeqCst);
        self.wake();
    }

    /// Whether [`quit`](Self::quit) has been called.
    pub fn should_quit(&self) -> bool {
        self.inner.should_quit.load(Ordering::SeqCst)
    }

    fn wake(&self) {
        match self.inner.wake_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                tracing::warn!(target: targets::UI_CONTEXT, "wake channel disconnected");
            }
        }
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("thread", &self.inner.affinity.thread_id())
            .field("display", &self.inner.display)
            .field("pending_tasks", &self.pending_task_count())
            .field("active_timers", &self.active_timer_count())
            .field("should_quit", &self.should_quit())
            .finish()
    }
}

static_assertions::assert_impl_all!(UiContext: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_display_modes() {
        assert!(UiContext::new().has_display());
        assert!(UiContext::new().require_display().is_ok());

        let headless = UiContext::headless();
        assert!(!headless.has_display());
        assert_eq!(headless.require_display(), Err(CoreError::Headless));
        assert_eq!(headless.display_mode(), DisplayMode::Headless);
    }

    #[test]
    fn test_invoke_runs_inline_on_ui_thread() {
        let ui = UiContext::headless();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        assert!(ui.invoke(move || ran_clone.store(true, Ordering::SeqCst)).is_none());
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(ui.pending_task_count(), 0);
    }

    #[test]
    fn test_invoke_off_thread_defers_until_pump() {
        let ui = UiContext::headless();
        let ran_on = Arc::new(Mutex::new(None));

        let handle = ui.clone();
        let ran_clone = ran_on.clone();
        std::thread::spawn(move || {
            let id = handle.invoke(move || {
                *ran_clone.lock() = Some(std::thread::current().id());
            });
            assert!(id.is_some());
        })
        .join()
        .unwrap();

        assert!(ran_on.lock().is_none());
        assert_eq!(ui.process_events(), 1);
        assert_eq!(*ran_on.lock(), Some(std::thread::current().id()));
    }

    #[test]
    fn test_cancel_posted_task() {
        let ui = UiContext::headless();
        let id = ui.post(|| panic!("cancelled task must not run"));
        assert!(ui.cancel_task(id));
        assert_eq!(ui.process_events(), 0);
    }

    #[test]
    fn test_timer_fires_at_deadline() {
        let ui = UiContext::headless();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        let start = Instant::now();
        let id = ui.start_one_shot(Duration::from_millis(500), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(ui.process_events_at(start), 0);
        assert!(ui.is_timer_active(id));

        ui.process_events_at(start + Duration::from_secs(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!ui.is_timer_active(id));
        assert!(ui.stop_timer(id).is_err());
    }

    #[test]
    fn test_stopped_timer_does_not_fire() {
        let ui = UiContext::headless();
        let id = ui.start_one_shot(Duration::ZERO, || panic!("stopped timer fired"));
        assert!(ui.stop_timer(id).is_ok());
        assert_eq!(ui.process_events_at(Instant::now() + Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_timer_callback_may_post() {
        let ui = UiContext::headless();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = ui.clone();
        let log_clone = log.clone();
        ui.start_one_shot(Duration::ZERO, move || {
            log_clone.lock().push("timer");
            let log_inner = log_clone.clone();
            handle.post(move || log_inner.lock().push("task"));
        });

        assert_eq!(ui.process_events_at(Instant::now() + Duration::from_millis(1)), 2);
        assert_eq!(*log.lock(), vec!["timer", "task"]);
    }

    #[test]
    fn test_queued_task_runs_before_due_timer() {
        let ui = UiContext::headless();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_clone = log.clone();
        let timer = ui.start_one_shot(Duration::from_millis(100), move || {
            log_clone.lock().push("timer");
        });

        let handle = ui.clone();
        let log_clone = log.clone();
        std::thread::spawn(move || {
            handle.post(move || log_clone.lock().push("task"));
        })
        .join()
        .unwrap();

        assert_eq!(ui.process_events_at(Instant::now() + Duration::from_secs(1)), 2);
        assert_eq!(*log.lock(), vec!["task", "timer"]);
        assert!(!ui.is_timer_active(timer));
    }

    #[test]
    fn test_queued_task_may_stop_due_timer() {
        let ui = UiContext::headless();
        let timer = ui.start_one_shot(Duration::ZERO, || panic!("stopped timer fired"));

        let handle = ui.clone();
        std::thread::spawn(move || {
            let stopper = handle.clone();
            handle.post(move || {
                assert!(stopper.stop_timer(timer).is_ok());
            });
        })
        .join()
        .unwrap();

        assert_eq!(ui.process_events_at(Instant::now() + Duration::from_secs(1)), 1);
        assert_eq!(ui.active_timer_count(), 0);
    }

    #[test]
    fn test_run_for_fires_real_timer() {
        let ui = UiContext::headless();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        ui.start_one_shot(Duration::from_millis(10), move || {
            fired_clone.store(true, Ordering::SeqCst);
        });

        let processed = ui.run_for(Duration::from_millis(200)).unwrap();
        assert!(processed >= 1);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_quit_stops_pump() {
        let ui = UiContext::headless();
        let handle = ui.clone();
        ui.post(move || handle.quit());

        let started = Instant::now();
        ui.run_for(Duration::from_secs(10)).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(ui.should_quit());
        assert_eq!(ui.run_for(Duration::ZERO), Err(CoreError::ContextQuit));
    }
}
