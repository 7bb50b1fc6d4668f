//! Pending store: not-yet-admitted tasks in admission order.

use std::collections::VecDeque;

use super::record::TaskRecord;

/// Tasks ordered by non-increasing priority, FIFO among equal priorities.
///
/// Insert is O(n); backlogs are expected to stay small.
#[derive(Debug, Default)]
pub(crate) struct PendingStore {
    tasks: VecDeque<TaskRecord>,
}

impl PendingStore {
    pub(crate) fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Place `record` right after the last task whose priority is >= its own
    /// (or at the front when there is none).
    pub(crate) fn insert(&mut self, record: TaskRecord) {
        let priority = record.priority();
        let at = self
            .tasks
            .iter()
            .rposition(|task| task.priority() >= priority)
            .map_or(0, |i| i + 1);
        self.tasks.insert(at, record);
    }

    pub(crate) fn front(&self) -> Option<&TaskRecord> {
        self.tasks.front()
    }

    pub(crate) fn pop_front(&mut self) -> Option<TaskRecord> {
        self.tasks.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<u64> {
        self.tasks.iter().map(|task| task.id().as_u64()).collect()
    }
}
