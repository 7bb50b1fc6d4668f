//! Outcome handles and progress relaying.
//!
//! An [`Outcome`] is created at enqueue time, before its task has run. When
//! the task is admitted, [`relay`] drives the work's future, forwarding each
//! progress event onto the outcome as it is emitted, and finally passes the
//! work's result through unchanged, after the queue's own bookkeeping.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};

use crate::error::OutcomeError;
use crate::queue::TaskId;

/// Handle to the eventual result of an enqueued task.
///
/// Awaiting it yields the work's result. [`Outcome::progress`] yields the
/// progress events the work emitted, in order, and `None` once the task has
/// settled.
#[derive(Debug)]
pub struct Outcome<T, E, P = ()> {
    id: TaskId,
    result: oneshot::Receiver<Result<T, E>>,
    progress: mpsc::UnboundedReceiver<P>,
}

impl<T, E, P> Unpin for Outcome<T, E, P> {}

impl<T, E, P> Outcome<T, E, P> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Next progress event, or `None` after settlement.
    pub async fn progress(&mut self) -> Option<P> {
        self.progress.recv().await
    }
}

impl<T, E, P> Future for Outcome<T, E, P> {
    type Output = Result<T, OutcomeError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.result).poll(cx).map(|res| match res {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(OutcomeError::Failed(err)),
            Err(_) => Err(OutcomeError::Abandoned),
        })
    }
}

/// Emits progress events from inside a running task.
#[derive(Debug)]
pub struct Notifier<P> {
    tx: mpsc::UnboundedSender<P>,
}

impl<P> Clone for Notifier<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P> Notifier<P> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<P>) -> Self {
        Self { tx }
    }

    /// Send a progress event. Returns false once the task has settled and
    /// the event was dropped.
    pub fn notify(&self, event: P) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Settling side of an [`Outcome`].
pub(crate) struct Deferred<T, E, P> {
    result: oneshot::Sender<Result<T, E>>,
    progress: mpsc::UnboundedSender<P>,
}

impl<T, E, P> Deferred<T, E, P> {
    fn notify(&self, event: P) {
        // The caller may have dropped its outcome; nothing to deliver to.
        let _ = self.progress.send(event);
    }

    fn settle(self, result: Result<T, E>) {
        let Deferred { result: tx, progress } = self;
        // Close the progress stream first so `progress()` ends before the result lands.
        drop(progress);
        let _ = tx.send(result);
    }
}

/// Create a linked unsettled outcome and its settling side.
pub(crate) fn deferred<T, E, P>(id: TaskId) -> (Deferred<T, E, P>, Outcome<T, E, P>) {
    let (result_tx, result_rx) = oneshot::channel();
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    (
        Deferred {
            result: result_tx,
            progress: progress_tx,
        },
        Outcome {
            id,
            result: result_rx,
            progress: progress_rx,
        },
    )
}

/// Drive `work` to completion, chaining its progress events and its result
/// onto `deferred`.
///
/// `on_settle` receives whether the work succeeded and runs before the
/// outcome settles, so whoever awaits the outcome already sees its effects.
pub(crate) async fn relay<T, E, P, Fut, F>(
    work: Fut,
    mut events: mpsc::UnboundedReceiver<P>,
    deferred: Deferred<T, E, P>,
    on_settle: F,
) where
    Fut: Future<Output = Result<T, E>>,
    F: FnOnce(bool),
{
    tokio::pin!(work);

    let result = loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => deferred.notify(event),
            result = &mut work => break result,
        }
    };

    // Flush whatever was emitted in the same poll that finished the work.
    events.close();
    while let Ok(event) = events.try_recv() {
        deferred.notify(event);
    }

    on_settle(result.is_ok());
    deferred.settle(result);
}
