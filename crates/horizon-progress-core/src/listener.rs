//! Progress listeners and the registry monitors dispatch through.
//!
//! A [`ListenerRegistry`] keeps listeners in registration order. Dispatch
//! works on a snapshot taken before the first listener runs, so a listener
//! may add or remove listeners (itself included) from inside its callback;
//! the change applies from the next event on.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_progress_core::listener::{ListenerRegistry, ProgressListener};
//! use horizon_progress_core::StatusEvent;
//!
//! struct Printer;
//!
//! impl ProgressListener for Printer {
//!     fn status_changed(&self, event: &StatusEvent) {
//!         println!("status: {:?}", event.text());
//!     }
//!
//!     fn canceled(&self, _event: &StatusEvent) {
//!         println!("canceled");
//!     }
//! }
//!
//! let registry = ListenerRegistry::new();
//! let id = registry.add(Arc::new(Printer));
//! assert_eq!(registry.len(), 1);
//! registry.remove(id);
//! assert!(registry.is_empty());
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::event::StatusEvent;
use crate::logging::targets;

/// Receives status notifications from a progress monitor.
///
/// Both methods are called synchronously on the thread that changed the
/// monitor. Implementations that touch UI state must hand the work over to
/// the UI thread themselves (see [`crate::UiContext::invoke`]).
pub trait ProgressListener: Send + Sync {
    /// The monitor's state changed.
    fn status_changed(&self, event: &StatusEvent);

    /// The monitored operation was canceled.
    fn canceled(&self, event: &StatusEvent);
}

/// Delegate invoked when the user cancels a monitored operation.
///
/// Whoever owns the background work supplies this. Passing `None` where a
/// handler is expected marks the operation as not cancelable.
pub trait CancelHandler: Send + Sync {
    /// The operation should stop.
    fn canceled(&self);
}

impl<F> CancelHandler for F
where
    F: Fn() + Send + Sync,
{
    fn canceled(&self) {
        self()
    }
}

/// A unique identifier for one listener registration.
///
/// Registering the same listener twice yields two distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Get the raw u64 value of this listener ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

struct Registration {
    id: ListenerId,
    listener: Arc<dyn ProgressListener>,
}

/// Which listener callback a dispatch invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notification {
    StatusChanged,
    Canceled,
}

/// An ordered collection of progress listeners.
///
/// No deduplication is performed: a listener registered twice receives
/// every event twice.
#[derive(Default)]
pub struct ListenerRegistry {
    registrations: Mutex<Vec<Registration>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener at the end of the dispatch order.
    pub fn add(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        let id = next_listener_id();
        self.registrations.lock().push(Registration { id, listener });
        tracing::trace!(target: targets::LISTENER, listener = id.as_u64(), "listener added");
        id
    }

    /// Remove one registration by id.
    ///
    /// Returns `true` if the registration was found and removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.lock();
        let Some(pos) = registrations.iter().position(|r| r.id == id) else {
            return false;
        };
        registrations.remove(pos);
        tracing::trace!(target: targets::LISTENER, listener = id.as_u64(), "listener removed");
        true
    }

    /// Remove the most recent registration of `listener` (by pointer identity).
    ///
    /// Returns `true` if a registration was found and removed.
    pub fn remove_instance(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        let mut registrations = self.registrations.lock();
        let Some(pos) = registrations
            .iter()
            .rposition(|r| Arc::ptr_eq(&r.listener, listener))
        else {
            return false;
        };
        let removed = registrations.remove(pos);
        tracing::trace!(target: targets::LISTENER, listener = removed.id.as_u64(), "listener removed");
        true
    }

    /// Whether the registry holds a registration with this id.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.registrations.lock().iter().any(|r| r.id == id)
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.lock().is_empty()
    }

    /// Deliver `event` to every listener's [`ProgressListener::status_changed`].
    ///
    /// Returns the number of listeners that returned normally.
    pub fn dispatch_status(&self, event: &StatusEvent) -> usize {
        self.dispatch(event, Notification::StatusChanged)
    }

    /// Deliver `event` to every listener's [`ProgressListener::canceled`].
    ///
    /// Returns the number of listeners that returned normally.
    pub fn dispatch_canceled(&self, event: &StatusEvent) -> usize {
        self.dispatch(event, Notification::Canceled)
    }

    #[tracing::instrument(skip_all, target = "horizon_progress_core::listener", level = "trace")]
    fn dispatch(&self, event: &StatusEvent, notification: Notification) -> usize {
        // Snapshot so listeners can mutate the registry while we iterate.
        let snapshot: Vec<(ListenerId, Arc<dyn ProgressListener>)> = self
            .registrations
            .lock()
            .iter()
            .map(|r| (r.id, r.listener.clone()))
            .collect();

        tracing::trace!(
            target: targets::LISTENER,
            listener_count = snapshot.len(),
            ?notification,
            completed = event.is_completed(),
            "dispatching status event"
        );

        let mut delivered = 0;
        for (id, listener) in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| match notification {
                Notification::StatusChanged => listener.status_changed(event),
                Notification::Canceled => listener.canceled(event),
            }));
            match outcome {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    tracing::error!(
                        target: targets::LISTENER,
                        listener = id.as_u64(),
                        ?notification,
                        panic = panic_message(payload.as_ref()),
                        "progress listener panicked, continuing with the next listener"
                    );
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<u64> = self
            .registrations
            .lock()
            .iter()
            .map(|r| r.id.as_u64())
            .collect();
        f.debug_struct("ListenerRegistry").field("listeners", &ids).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

static_assertions::assert_impl_all!(ListenerRegistry: Send, Sync);
