//! Task record: identity + params + the deferred launch of its work.

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::TaskParams;

/// Identifier of a task within one queue, allocated in enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Completion hook handed to a launched task. Receives whether the work
/// succeeded and runs before the task's outcome settles.
pub(crate) type OnSettle = Box<dyn FnOnce(bool) + Send>;

/// Invokes the task's work and returns the future that relays it to the
/// outcome.
pub(crate) type Launch = Box<dyn FnOnce(OnSettle) -> BoxFuture<'static, ()> + Send>;

/// A task waiting in the pending store.
///
/// The record owns the settling side of the caller's outcome (inside
/// `launch`), so dropping an unlaunched record abandons that outcome.
pub(crate) struct TaskRecord {
    id: TaskId,
    params: TaskParams,
    launch: Launch,
}

impl TaskRecord {
    pub(crate) fn new(id: TaskId, params: TaskParams, launch: Launch) -> Self {
        Self { id, params, launch }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn weight(&self) -> u64 {
        u64::from(self.params.weight)
    }

    pub(crate) fn priority(&self) -> i32 {
        self.params.priority
    }

    /// Invoke the work. Consumes the record: a task is launched at most once.
    pub(crate) fn launch(self, on_settle: OnSettle) -> BoxFuture<'static, ()> {
        (self.launch)(on_settle)
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn noop_record(id: u64, weight: u32, priority: i32) -> TaskRecord {
    use futures::FutureExt;

    TaskRecord::new(
        TaskId::new(id),
        TaskParams::default()
            .with_weight(weight)
            .with_priority(priority),
        Box::new(|on_settle: OnSettle| async move { on_settle(true) }.boxed()),
    )
}
