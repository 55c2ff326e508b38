//! One-shot timers that fire on the UI thread.
//!
//! Timers are owned by a [`crate::UiContext`]; their callbacks run when the
//! context pumps events, never on the thread that started them.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::TimerError;
use crate::logging::targets;
use crate::task::BoxedTask;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// Deadline offset used when `now + duration` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Internal timer data.
struct TimerData {
    /// When this timer should fire.
    fire_time: Instant,
    /// Run once when the timer fires.
    callback: BoxedTask,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages pending one-shot timers.
pub struct TimerManager {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
        }
    }

    /// Start a one-shot timer that fires `duration` after `now`.
    ///
    /// A duration too large to represent is capped at roughly thirty years.
    pub fn start_one_shot_at(
        &mut self,
        now: Instant,
        duration: Duration,
        callback: BoxedTask,
    ) -> TimerId {
        let fire_time = now
            .checked_add(duration)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        let id = self.timers.insert(TimerData {
            fire_time,
            callback,
        });
        self.queue.push(TimerQueueEntry { id, fire_time });
        tracing::trace!(target: targets::TIMER, ?id, ?duration, "one-shot timer started");
        id
    }

    /// Stop and remove a pending timer.
    pub fn stop(&mut self, id: TimerId) -> Result<(), TimerError> {
        if self.timers.remove(id).is_some() {
            tracing::trace!(target: targets::TIMER, ?id, "timer stopped");
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId)
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Get the duration from `now` until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        // Drop entries for stopped timers from the front of the queue.
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }

        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(now))
    }

    /// Remove every timer due at `now` and return their callbacks in fire order.
    #[tracing::instrument(skip_all, target = "horizon_progress_core::timer", level = "trace")]
    pub fn take_expired(&mut self, now: Instant) -> Vec<(TimerId, BoxedTask)> {
        let mut expired = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            // Stopped timers leave stale queue entries behind.
            let Some(timer) = self.timers.remove(entry.id) else {
                continue;
            };
            tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
            expired.push((entry.id, timer.callback));
        }

        expired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe wrapper around `TimerManager` for use from the UI context.
pub(crate) struct SharedTimerManager {
    inner: Mutex<TimerManager>,
}

impl SharedTimerManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TimerManager::new()),
        }
    }

    pub fn start_one_shot(&self, duration: Duration, callback: BoxedTask) -> TimerId {
        self.inner
            .lock()
            .start_one_shot_at(Instant::now(), duration, callback)
    }

    pub fn stop(&self, id: TimerId) -> Result<(), TimerError> {
        self.inner.lock().stop(id)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner.lock().is_active(id)
    }

    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.inner.lock().time_until_next(now)
    }

    pub fn take_expired(&self, now: Instant) -> Vec<(TimerId, BoxedTask)> {
        self.inner.lock().take_expired(now)
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }
}

impl Default for SharedTimerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> BoxedTask {
        let log = log.clone();
        Box::new(move || log.lock().push(name))
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut timers = TimerManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let now = Instant::now();

        timers.start_one_shot_at(now, Duration::from_millis(300), recorder(&log, "late"));
        timers.start_one_shot_at(now, Duration::from_millis(100), recorder(&log, "early"));

        assert!(timers.take_expired(now).is_empty());
        assert_eq!(
            timers.time_until_next(now),
            Some(Duration::from_millis(100))
        );

        for (_, callback) in timers.take_expired(now + Duration::from_millis(500)) {
            callback();
        }
        assert_eq!(*log.lock(), vec!["early", "late"]);
        assert_eq!(timers.active_count(), 0);
        assert_eq!(timers.time_until_next(now), None);
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let mut timers = TimerManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let now = Instant::now();

        let id = timers.start_one_shot_at(now, Duration::from_millis(10), recorder(&log, "x"));
        assert!(timers.is_active(id));
        assert!(timers.stop(id).is_ok());
        assert!(!timers.is_active(id));
        assert_eq!(timers.stop(id), Err(TimerError::InvalidTimerId));

        assert!(timers.take_expired(now + Duration::from_secs(1)).is_empty());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_huge_duration_does_not_overflow() {
        let mut timers = TimerManager::new();
        let now = Instant::now();
        let id = timers.start_one_shot_at(now, Duration::MAX, Box::new(|| {}));

        assert!(timers.is_active(id));
        assert!(timers.time_until_next(now).is_some_and(|d| d >= Duration::from_secs(3600)));
        assert!(timers.take_expired(now + Duration::from_secs(86_400)).is_empty());
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut timers = TimerManager::new();
        let now = Instant::now();
        let id = timers.start_one_shot_at(now, Duration::ZERO, Box::new(|| {}));

        let fired = timers.take_expired(now);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, id);
        assert!(!timers.is_active(id));
        assert!(timers.take_expired(now + Duration::from_secs(1)).is_empty());
    }
}
