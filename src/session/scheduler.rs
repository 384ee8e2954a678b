//! Task Scheduler
//!
//! Virtual-time queue of delayed actions owned by the active run.
//! Time only moves when the owner says so (`pop_due` / `advance_to`),
//! which keeps every transition reproducible in tests. The async driver
//! maps wall time onto it.
//!
//! `cancel_all` drops every pending task in one call.

use std::collections::BTreeMap;

/// Handle to a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// A task whose time has come.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask<T> {
    /// Handle returned by `schedule_*`
    pub id: TaskId,
    /// When it was due (ms)
    pub due_ms: u64,
    /// Payload
    pub action: T,
}

/// Cancelable delayed-task queue.
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    /// Keyed by (due, id): ties run in scheduling order.
    pending: BTreeMap<(u64, u64), T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Empty scheduler at time zero.
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Current scheduler time (ms).
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Pending task count.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Nothing pending?
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run `action` `delay_ms` from now.
    pub fn schedule_in(&mut self, delay_ms: u64, action: T) -> TaskId {
        self.schedule_at(self.now_ms.saturating_add(delay_ms), action)
    }

    /// Run `action` at an absolute time. Past times run on the next pop.
    pub fn schedule_at(&mut self, due_ms: u64, action: T) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((due_ms, id), action);
        TaskId(id)
    }

    /// Cancel one task. Returns false if it already ran or was canceled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let key = self.pending.keys().find(|(_, task)| *task == id.0).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    /// Cancel everything. Safe to call repeatedly. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// When the earliest task is due (ms).
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Time until the earliest task (ms, zero if overdue).
    pub fn next_due_in(&self) -> Option<u64> {
        self.next_due_ms().map(|due| due.saturating_sub(self.now_ms))
    }

    /// Remove the earliest task due at or before `until_ms`.
    ///
    /// Time moves forward to the task's due time, so anything it
    /// schedules is relative to when it was meant to run.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledTask<T>> {
        let (&(due_ms, id), _) = self.pending.iter().next()?;
        if due_ms > until_ms {
            return None;
        }
        let action = self.pending.remove(&(due_ms, id))?;
        self.now_ms = self.now_ms.max(due_ms);
        Some(ScheduledTask {
            id: TaskId(id),
            due_ms,
            action,
        })
    }

    /// Move time forward without running anything.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(300, "c");
        scheduler.schedule_in(100, "a");
        scheduler.schedule_in(200, "b");

        assert_eq!(scheduler.next_due_in(), Some(100));
        let order: Vec<&str> = std::iter::from_fn(|| scheduler.pop_due(1_000))
            .map(|task| task.action)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(scheduler.now_ms(), 300);
    }

    #[test]
    fn test_ties_keep_scheduling_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(50, 1);
        scheduler.schedule_in(50, 2);
        assert_eq!(scheduler.pop_due(50).map(|t| t.action), Some(1));
        assert_eq!(scheduler.pop_due(50).map(|t| t.action), Some(2));
    }

    #[test]
    fn test_not_due_yet() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(500, ());
        assert!(scheduler.pop_due(499).is_none());
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.pop_due(500).is_some());
    }

    #[test]
    fn test_schedule_relative_to_pop_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(100, "first");
        let task = scheduler.pop_due(10_000).unwrap();
        assert_eq!(task.due_ms, 100);

        scheduler.schedule_in(100, "second");
        assert_eq!(scheduler.next_due_ms(), Some(200));
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(10, ());
        scheduler.schedule_in(20, ());

        assert_eq!(scheduler.cancel_all(), 2);
        assert_eq!(scheduler.cancel_all(), 0);
        assert!(scheduler.is_empty());
        assert!(scheduler.pop_due(u64::MAX).is_none());
    }

    #[test]
    fn test_cancel_one() {
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule_in(10, "keep");
        let discard = scheduler.schedule_in(5, "discard");

        assert!(scheduler.cancel(discard));
        assert!(!scheduler.cancel(discard));
        let task = scheduler.pop_due(100).unwrap();
        assert_eq!(task.id, keep);
        assert_eq!(task.action, "keep");
    }

    #[test]
    fn test_advance_never_rewinds() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        scheduler.advance_to(1_000);
        scheduler.advance_to(10);
        assert_eq!(scheduler.now_ms(), 1_000);
    }
}
