use std::collections::BTreeMap;
use std::time::Duration;

/// Deferred work on the single UI thread.
///
/// Tasks run in order of due time; tasks due at the same time run in the
/// order they were queued. Time is virtual: it only moves on `advance`.
#[derive(Debug)]
pub struct TaskQueue<T> {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), T>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Queues `task` for the next scheduling turn.
    pub fn next_turn(&mut self, task: T) {
        self.after(Duration::ZERO, task);
    }

    pub fn after(&mut self, delay: Duration, task: T) {
        let key = (self.now + delay, self.next_seq);
        self.next_seq += 1;
        self.pending.insert(key, task);
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Removes and returns the earliest task that is due, if any.
    pub fn pop_due(&mut self) -> Option<T> {
        let (&key, _) = self.pending.first_key_value()?;
        if key.0 > self.now {
            return None;
        }
        self.pending.remove(&key)
    }

    /// Time until the next pending task is due.
    pub fn next_due_in(&self) -> Option<Duration> {
        self.pending
            .first_key_value()
            .map(|(&(due, _), _)| due.saturating_sub(self.now))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
