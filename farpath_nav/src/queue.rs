// Priority queue with arbitrary removal and re-keying, used by both the
// per-region and the coarse node-graph searches.
//
// Entries are kept in a `Vec` sorted by ascending priority so the front of the
// queue (highest priority) is the last element and `poll` is O(1). `add` and
// `remove` are O(n). Searches re-key entries whenever they find a cheaper
// route to a queued value, which a plain `BinaryHeap` cannot do without lazy
// deletion.
//
// Ordering among equal priorities is LIFO: a value added later is polled
// before earlier values of the same priority. `reprioritize` is remove + add,
// so a re-keyed value counts as the most recent.
//
// **Critical constraint: determinism.** Poll order is a pure function of the
// sequence of calls. Priorities compare with `f64::total_cmp`.

use std::cmp::Ordering;
use thiserror::Error;

/// The value passed to `remove`/`reprioritize` was not queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("value is not in the queue")]
pub struct NotQueued;

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    priority: f64,
}

/// Highest-priority-first queue. Each value should appear at most once.
#[derive(Clone, Debug)]
pub struct PriorityQueue<T> {
    /// Ascending by priority; the back is the front of the queue.
    entries: Vec<Entry<T>>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `value`. It will be polled before any value already queued
    /// with the same priority.
    pub fn add(&mut self, value: T, priority: f64) {
        let at = self
            .entries
            .partition_point(|e| e.priority.total_cmp(&priority) != Ordering::Greater);
        self.entries.insert(at, Entry { value, priority });
    }

    /// Remove `value` from the queue.
    pub fn remove(&mut self, value: &T) -> Result<(), NotQueued> {
        let at = self
            .entries
            .iter()
            .rposition(|e| e.value == *value)
            .ok_or(NotQueued)?;
        self.entries.remove(at);
        Ok(())
    }

    /// Change the priority of a queued value. Its tie-break position resets
    /// to "most recently added".
    pub fn reprioritize(&mut self, value: T, priority: f64) -> Result<(), NotQueued> {
        self.remove(&value)?;
        self.add(value, priority);
        Ok(())
    }

    /// The next value to be polled, if any.
    pub fn peek(&self) -> Option<&T> {
        self.entries.last().map(|e| &e.value)
    }

    /// Dequeue the highest-priority value.
    pub fn poll(&mut self) -> Option<T> {
        self.entries.pop().map(|e| e.value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.iter().any(|e| e.value == *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
