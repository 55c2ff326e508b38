//! Deferred task queue for work handed over to the UI thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// A unique identifier for a deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A boxed task closure.
pub(crate) type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

/// A thread-safe FIFO of pending tasks.
///
/// Tasks are popped one at a time and run with the lock released, so a
/// running task may post more work.
pub(crate) struct SharedTaskQueue {
    tasks: Mutex<VecDeque<TaskData>>,
}

impl SharedTaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_task_id();
        self.tasks.lock().push_back(TaskData {
            id,
            task: Box::new(task),
        });
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        if let Some(pos) = tasks.iter().position(|t| t.id == id) {
            tasks.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run the tasks that were pending when this call started.
    ///
    /// Tasks posted while draining wait for the next call, which keeps a
    /// task that re-posts itself from starving timers.
    pub fn process_pending(&self) -> usize {
        let count = self.tasks.lock().len();
        let mut processed = 0;
        for _ in 0..count {
            let next = self.tasks.lock().pop_front();
            let Some(task_data) = next else {
                break;
            };
            (task_data.task)();
            processed += 1;
        }
        processed
    }
}

impl Default for SharedTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
