//! Queue state and the admission decision.
//!
//! Plain data, no runtime: the scheduler wraps it in a mutex and only ever
//! holds the lock for the duration of one of these calls.

use super::pending::PendingStore;
use super::record::{TaskId, TaskRecord};
use crate::observability::QueueStats;

#[derive(Debug)]
pub(crate) struct QueueState {
    pending: PendingStore,

    weight_limit: u32,

    /// Sum of weights of in-flight tasks. May exceed `weight_limit` only
    /// after the limit was lowered.
    current_weight: u64,

    /// A drain pass has been requested and has not run yet.
    scheduled_run: bool,

    /// Start/stop gate, checked when a pass runs.
    started: bool,

    processing: usize,
    processed: u64,

    next_task_id: u64,
    drain_passes: u64,
}

impl QueueState {
    pub(crate) fn new(weight_limit: u32) -> Self {
        Self {
            pending: PendingStore::new(),
            weight_limit,
            current_weight: 0,
            scheduled_run: false,
            started: false,
            processing: 0,
            processed: 0,
            next_task_id: 1,
            drain_passes: 0,
        }
    }

    pub(crate) fn allocate_task_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        id
    }

    pub(crate) fn weight_limit(&self) -> u32 {
        self.weight_limit
    }

    /// Returns the previous limit.
    pub(crate) fn set_weight_limit(&mut self, limit: u32) -> u32 {
        std::mem::replace(&mut self.weight_limit, limit)
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    pub(crate) fn set_started(&mut self, started: bool) {
        self.started = started;
    }

    pub(crate) fn enqueue(&mut self, record: TaskRecord) {
        self.pending.insert(record);
    }

    /// Mark a drain pass as scheduled. Returns false when one already is,
    /// in which case the caller must not schedule another.
    pub(crate) fn schedule_run(&mut self) -> bool {
        if self.scheduled_run {
            return false;
        }
        self.scheduled_run = true;
        true
    }

    /// One drain pass: clear the scheduled flag and, if the gate is open,
    /// pop every head-of-line task that fits the remaining budget.
    ///
    /// Stops at the first head that does not fit, even if a later task
    /// would. Popped tasks are counted as in flight.
    pub(crate) fn drain_pass(&mut self) -> Vec<TaskRecord> {
        self.scheduled_run = false;
        self.drain_passes += 1;

        let mut admitted = Vec::new();
        if !self.started {
            return admitted;
        }

        while let Some(front) = self.pending.front() {
            if !self.fits(front) {
                break;
            }
            let Some(record) = self.pending.pop_front() else {
                break;
            };
            self.current_weight += record.weight();
            self.processing += 1;
            admitted.push(record);
        }
        admitted
    }

    fn fits(&self, record: &TaskRecord) -> bool {
        self.current_weight + record.weight() <= u64::from(self.weight_limit)
    }

    /// Settlement bookkeeping for one admitted task.
    pub(crate) fn release(&mut self, weight: u64) {
        debug_assert!(self.processing > 0 && self.current_weight >= weight);
        self.current_weight = self.current_weight.saturating_sub(weight);
        self.processing = self.processing.saturating_sub(1);
        self.processed += 1;
    }

    pub(crate) fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.pending.len(),
            processing: self.processing,
            processed: self.processed,
            weight_in_use: self.current_weight,
            weight_limit: self.weight_limit,
        }
    }

    pub(crate) fn drain_passes(&self) -> u64 {
        self.drain_passes
    }

    #[cfg(test)]
    pub(crate) fn pending_ids(&self) -> Vec<u64> {
        self.pending.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::record::noop_record;

    fn ids(records: &[TaskRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id().as_u64()).collect()
    }

    fn state_with(limit: u32, weights: &[u32]) -> QueueState {
        let mut state = QueueState::new(limit);
        for &weight in weights {
            let id = state.allocate_task_id();
            state.enqueue(noop_record(id.as_u64(), weight, 1));
        }
        state
    }

    #[test]
    fn stopped_pass_admits_nothing_but_clears_flag() {
        let mut state = state_with(5, &[1, 1]);
        assert!(state.schedule_run());
        assert!(!state.schedule_run());

        assert!(state.drain_pass().is_empty());
        assert_eq!(state.stats().pending, 2);
        assert!(state.schedule_run());
    }

    #[test]
    fn head_of_line_blocks_smaller_tasks_behind_it() {
        let mut state = state_with(5, &[1, 4, 2, 3, 2]);
        state.set_started(true);

        let admitted = state.drain_pass();
        assert_eq!(ids(&admitted), vec![1, 2]);
        assert_eq!(state.stats().weight_in_use, 5);

        // Releasing weight 1 frees 1: the weight-2 head still does not fit.
        state.release(1);
        assert!(state.drain_pass().is_empty());
        assert_eq!(state.pending_ids(), vec![3, 4, 5]);

        // Releasing weight 4 lets 2 + 3 in; the trailing 2 must wait.
        state.release(4);
        assert_eq!(ids(&state.drain_pass()), vec![3, 4]);
        assert_eq!(state.pending_ids(), vec![5]);
    }

    #[test]
    fn lowered_limit_keeps_in_flight_weight() {
        let mut state = state_with(4, &[2, 2, 1]);
        state.set_started(true);
        assert_eq!(state.drain_pass().len(), 2);

        assert_eq!(state.set_weight_limit(1), 4);
        let stats = state.stats();
        assert_eq!(stats.weight_in_use, 4);
        assert_eq!(stats.processing, 2);

        state.release(2);
        assert!(state.drain_pass().is_empty());
        state.release(2);
        assert_eq!(state.drain_pass().len(), 1);
    }

    #[test]
    fn counters_follow_admission_and_release() {
        let mut state = state_with(10, &[3]);
        assert_eq!(state.stats().pending, 1);

        state.set_started(true);
        state.drain_pass();
        let stats = state.stats();
        assert_eq!((stats.pending, stats.processing, stats.processed), (0, 1, 0));

        state.release(3);
        let stats = state.stats();
        assert_eq!((stats.pending, stats.processing, stats.processed), (0, 0, 1));
        assert_eq!(stats.weight_in_use, 0);
        assert_eq!(state.drain_passes(), 1);
    }
}
