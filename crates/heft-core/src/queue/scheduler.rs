//! Weighted priority queue: admission scheduling and task completion.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::builder::QueueBuilder;
use super::record::{Launch, OnSettle, TaskId, TaskRecord};
use super::state::QueueState;
use crate::config::{QueueConfig, QueueParams, TaskParams};
use crate::error::QueueError;
use crate::observability::QueueStats;
use crate::outcome::{self, Notifier, Outcome};

/// Admits asynchronous tasks under a global weight budget, highest priority
/// first, FIFO among equal priorities.
///
/// Cloning is cheap; clones share the same queue.
///
/// Admission happens in drain passes. Enqueueing, starting, changing the
/// limit and every task settlement request a pass; requests made before the
/// pass runs collapse into one. The pass runs as its own task on the queue's
/// runtime, never inside the call that requested it.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<QueueState>,
    runtime: Handle,
}

impl Queue {
    /// Build a queue on the current tokio runtime.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        QueueBuilder::new().config(config).build()
    }

    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    pub(crate) fn from_parts(config: QueueConfig, runtime: Handle) -> Self {
        let queue = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::new(config.weight_limit)),
                runtime,
            }),
        };
        if config.autostart {
            queue.start();
        }
        queue
    }

    /// Add a task. `work` is invoked once the task is admitted.
    ///
    /// Fails immediately if `params.weight` exceeds the current weight limit
    /// (or is zero); the task is then never queued. Otherwise returns the
    /// task's outcome handle before any admission decision is made.
    pub fn enqueue<W, Fut, T, E>(
        &self,
        work: W,
        params: TaskParams,
    ) -> Result<Outcome<T, E>, QueueError>
    where
        W: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.enqueue_with_progress(move |_: Notifier<()>| work(), params)
    }

    /// Like [`Queue::enqueue`], but `work` receives a [`Notifier`] whose
    /// events are relayed to the outcome's [`Outcome::progress`] stream.
    pub fn enqueue_with_progress<W, Fut, T, E, P>(
        &self,
        work: W,
        params: TaskParams,
    ) -> Result<Outcome<T, E, P>, QueueError>
    where
        W: FnOnce(Notifier<P>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        P: Send + 'static,
    {
        let outcome = {
            let mut state = self.inner.state.lock();
            let limit = state.weight_limit();
            if let Err(err) = params.validate(limit) {
                debug!(weight = params.weight, limit, "task rejected: {err}");
                return Err(err);
            }

            let id = state.allocate_task_id();
            let (deferred, outcome) = outcome::deferred(id);
            let launch: Launch = Box::new(move |on_settle: OnSettle| {
                let (tx, rx) = mpsc::unbounded_channel();
                let work = work(Notifier::new(tx));
                outcome::relay(work, rx, deferred, on_settle).boxed()
            });
            state.enqueue(TaskRecord::new(id, params, launch));

            debug!(
                task = %id,
                weight = params.weight,
                priority = params.priority,
                pending = state.stats().pending,
                "task enqueued"
            );
            outcome
        };

        self.inner.request_drain();
        Ok(outcome)
    }

    /// Apply runtime parameters. A new weight limit takes effect for future
    /// admissions only; tasks already in flight keep their weight.
    pub fn set_params(&self, params: QueueParams) {
        let Some(limit) = params.weight_limit else {
            return;
        };
        let previous = self.inner.state.lock().set_weight_limit(limit);
        info!(previous, limit, "weight limit changed");
        self.inner.request_drain();
    }

    pub fn set_weight_limit(&self, limit: u32) {
        self.set_params(QueueParams::weight_limit(limit));
    }

    /// Current runtime parameters.
    pub fn params(&self) -> QueueParams {
        QueueParams::weight_limit(self.inner.state.lock().weight_limit())
    }

    /// Open the gate and request a drain pass.
    pub fn start(&self) {
        self.inner.state.lock().set_started(true);
        info!("queue started");
        self.inner.request_drain();
    }

    /// Close the gate. In-flight tasks run on; nothing new is admitted, and a
    /// pass already requested but not yet run admits nothing.
    pub fn stop(&self) {
        self.inner.state.lock().set_started(false);
        info!("queue stopped");
    }

    pub fn is_started(&self) -> bool {
        self.inner.state.lock().is_started()
    }

    pub fn stats(&self) -> QueueStats {
        self.inner.state.lock().stats()
    }

    #[cfg(test)]
    fn drain_passes(&self) -> u64 {
        self.inner.state.lock().drain_passes()
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("stats", &self.stats())
            .field("started", &self.is_started())
            .finish()
    }
}

impl Inner {
    /// Schedule a drain pass unless one is already pending.
    fn request_drain(self: &Arc<Self>) {
        if !self.state.lock().schedule_run() {
            return;
        }
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            inner.drain();
        });
    }

    fn drain(self: &Arc<Self>) {
        let admitted = {
            let mut state = self.state.lock();
            let admitted = state.drain_pass();
            let stats = state.stats();
            trace!(
                pass = state.drain_passes(),
                started = state.is_started(),
                admitted = admitted.len(),
                pending = stats.pending,
                weight_in_use = stats.weight_in_use,
                "drain pass"
            );
            admitted
        };

        // The lock is released here, so work may call back into the queue.
        for record in admitted {
            let id = record.id();
            debug!(task = %id, weight = record.weight(), "task admitted");
            let settlement = Settlement::new(self, id, record.weight());
            let on_settle: OnSettle = Box::new(move |succeeded| settlement.complete(succeeded));

            // A work closure that panics before returning its future takes
            // only its own task down; the unwind drops its settlement.
            match panic::catch_unwind(AssertUnwindSafe(|| record.launch(on_settle))) {
                Ok(task) => {
                    self.runtime.spawn(task);
                }
                Err(_) => warn!(task = %id, "task work panicked on invocation"),
            }
        }
    }
}

/// Completion bookkeeping for one admitted task, run exactly once on drop:
/// release its weight, count it as processed, request another pass.
///
/// `complete` is called just before the task's outcome settles. Dropping
/// without `complete` (panic, runtime shutdown) still settles the
/// bookkeeping; the task's outcome then reports it as abandoned.
struct Settlement {
    inner: Arc<Inner>,
    id: TaskId,
    weight: u64,
    succeeded: Option<bool>,
}

impl Settlement {
    fn new(inner: &Arc<Inner>, id: TaskId, weight: u64) -> Self {
        Self {
            inner: Arc::clone(inner),
            id,
            weight,
            succeeded: None,
        }
    }

    fn complete(mut self, succeeded: bool) {
        self.succeeded = Some(succeeded);
    }
}

impl Drop for Settlement {
    fn drop(&mut self) {
        let stats = {
            let mut state = self.inner.state.lock();
            state.release(self.weight);
            state.stats()
        };
        match self.succeeded {
            Some(true) => debug!(task = %self.id, processed = stats.processed, "task fulfilled"),
            Some(false) => debug!(task = %self.id, processed = stats.processed, "task rejected"),
            None => warn!(task = %self.id, "task abandoned before settling"),
        }
        self.inner.request_drain();
    }
}
