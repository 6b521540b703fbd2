//! Deferred work on a logical clock.
//!
//! The engine performs no internal threading. A host drives time by calling
//! `run_due` (through `ZoneContext::run_due`) with its own clock reading,
//! typically once per simulation tick. Tasks are fire-and-forget: there is
//! no cancellation, and a task must re-resolve anything it refers to (zones
//! in particular) because it may have disappeared by the time it runs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

/// Identifier of a scheduled task, for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// A task that runs once against the context `C`.
pub type Task<C> = Box<dyn FnOnce(&mut C)>;

/// A task waiting for its deadline.
pub struct Scheduled<C> {
    /// Identifier assigned at scheduling time.
    pub id: TaskId,
    /// Logical time at which the task becomes due.
    pub due: Duration,
    /// The work itself.
    pub task: Task<C>,
}

impl<C> PartialEq for Scheduled<C> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<C> Eq for Scheduled<C> {}

impl<C> PartialOrd for Scheduled<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Scheduled<C> {
    // Reversed so the max-heap pops the earliest deadline, then the oldest id.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.id.0.cmp(&self.id.0))
    }
}

/// Queue of deferred tasks ordered by deadline, FIFO among equal deadlines.
pub struct Scheduler<C> {
    now: Duration,
    queue: BinaryHeap<Scheduled<C>>,
    next_id: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            queue: BinaryHeap::new(),
            next_id: 0,
        }
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .finish()
    }
}

impl<C> Scheduler<C> {
    /// Create an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest time the scheduler has been advanced to.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of tasks not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run `task` once `delay` has elapsed past the current time.
    pub fn schedule_after(&mut self, delay: Duration, task: impl FnOnce(&mut C) + 'static) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.push(Scheduled {
            id,
            due: self.now.saturating_add(delay),
            task: Box::new(task),
        });
        id
    }

    /// Advance the clock to `now` and remove every task that is due, in
    /// run order. The clock never moves backwards.
    pub fn take_due(&mut self, now: Duration) -> Vec<Scheduled<C>> {
        self.now = self.now.max(now);
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|next| next.due <= self.now) {
            if let Some(next) = self.queue.pop() {
                due.push(next);
            }
        }
        due
    }

    /// Advance the clock and run every due task against `context`.
    ///
    /// Tasks scheduled while running are queued for a later call, even with
    /// a zero delay. Returns the number of tasks run.
    pub fn run_due(&mut self, now: Duration, context: &mut C) -> usize {
        let due = self.take_due(now);
        let count = due.len();
        for scheduled in due {
            (scheduled.task)(context);
        }
        count
    }
}
