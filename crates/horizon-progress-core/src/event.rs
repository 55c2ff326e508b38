//! Status events fired by progress monitors.
//!
//! A [`StatusEvent`] is an immutable snapshot of a monitor's state, built
//! fresh for every notification. The kind of progress is carried as a
//! [`Progress`] value so listeners match on it instead of asking which
//! monitor type sent it.

use std::sync::atomic::{AtomicU64, Ordering};

/// A unique identifier for a progress monitor.
///
/// Every event carries the id of the monitor that fired it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorId(u64);

impl MonitorId {
    /// Get the raw u64 value of this monitor ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique monitor IDs.
static NEXT_MONITOR_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_monitor_id() -> MonitorId {
    MonitorId(NEXT_MONITOR_ID.fetch_add(1, Ordering::Relaxed))
}

/// The progress payload of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Progress with a bounded numeric range.
    Determinate {
        /// Lower bound of the range.
        min: i32,
        /// Upper bound of the range.
        max: i32,
        /// Current position. Not guaranteed to lie within `min..=max`.
        current: i32,
    },
    /// Progress with no numeric range; completion is set explicitly.
    Indeterminate {
        /// Whether the caller has marked the work as done.
        complete: bool,
    },
}

impl Progress {
    /// Whether this payload reports finished work.
    ///
    /// Determinate progress is complete once `current >= max`.
    pub fn is_completed(&self) -> bool {
        match *self {
            Progress::Determinate { max, current, .. } => current >= max,
            Progress::Indeterminate { complete } => complete,
        }
    }

    /// Returns `true` for the determinate variant.
    pub fn is_determinate(&self) -> bool {
        matches!(self, Progress::Determinate { .. })
    }

    /// Fraction of the range covered (0.0 to 1.0).
    ///
    /// Indeterminate progress reports 0.0 until complete, then 1.0.
    pub fn fraction(&self) -> f32 {
        match *self {
            Progress::Determinate { min, max, current } => {
                let range = (max as i64 - min as i64) as f32;
                if range <= 0.0 {
                    return if current >= max { 1.0 } else { 0.0 };
                }
                ((current as i64 - min as i64) as f32 / range).clamp(0.0, 1.0)
            }
            Progress::Indeterminate { complete } => {
                if complete {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A notification describing a monitor's state at the moment it was fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    source: MonitorId,
    text: Option<String>,
    progress: Progress,
}

impl StatusEvent {
    /// Create a new status event.
    pub fn new(source: MonitorId, text: Option<String>, progress: Progress) -> Self {
        Self {
            source,
            text,
            progress,
        }
    }

    /// The monitor that fired this event.
    pub fn source(&self) -> MonitorId {
        self.source
    }

    /// The status text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The progress payload.
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Whether the event reports finished work.
    pub fn is_completed(&self) -> bool {
        self.progress.is_completed()
    }
}

static_assertions::assert_impl_all!(StatusEvent: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;

    fn determinate(min: i32, max: i32, current: i32) -> Progress {
        Progress::Determinate { min, max, current }
    }

    #[test]
    fn test_determinate_completion_is_derived() {
        assert!(!determinate(0, 10, 0).is_completed());
        assert!(!determinate(0, 10, 9).is_completed());
        assert!(determinate(0, 10, 10).is_completed());
        // Overshooting max still counts as complete.
        assert!(determinate(0, 10, 11).is_completed());
    }

    #[test]
    fn test_indeterminate_completion_is_explicit() {
        assert!(!Progress::Indeterminate { complete: false }.is_completed());
        assert!(Progress::Indeterminate { complete: true }.is_completed());
    }

    #[test]
    fn test_fraction() {
        assert_eq!(determinate(0, 10, 5).fraction(), 0.5);
        assert_eq!(determinate(10, 20, 10).fraction(), 0.0);
        assert_eq!(determinate(0, 10, 50).fraction(), 1.0);
        assert_eq!(determinate(0, 0, 0).fraction(), 1.0);
        assert_eq!(Progress::Indeterminate { complete: false }.fraction(), 0.0);
    }

    #[test]
    fn test_monitor_ids_are_unique() {
        let a = next_monitor_id();
        let b = next_monitor_id();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_event_accessors() {
        let id = next_monitor_id();
        let event = StatusEvent::new(id, Some("copying".into()), determinate(0, 4, 4));
        assert_eq!(event.source(), id);
        assert_eq!(event.text(), Some("copying"));
        assert!(event.is_completed());
        assert!(event.progress().is_determinate());
    }
}
