use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tokio::{sync::Mutex, task::JoinError};

use crate::{FailureCause, ProcessError, WorkerFailure, queue::QueueReceiver};

tokio::task_local! {
    static WORKER_INDEX: usize;
}

/// Processes one item taken from a pool's queue.
///
/// Any `Fn(I)` closure that is `Send + Sync + 'static` is a `ProcessorFunc`. The pool never looks at what the function
/// does; side effects and error handling are up to the caller. Use `try_process` on a pool to report failures instead.
pub trait ProcessorFunc<I>: Fn(I) + Send + Sync + 'static {}

impl<I, F> ProcessorFunc<I> for F where F: Fn(I) + Send + Sync + 'static {}

/// Returns the index of the worker running the current processor call.
///
/// Workers are numbered from `0` to `worker_count - 1`. For a [`HashedFanOut`](crate::HashedFanOut), the index is
/// also the bucket the worker drains. Returns `None` when called outside of a worker.
pub fn worker_index() -> Option<usize> {
    WORKER_INDEX.try_with(|index| *index).ok()
}

pub(crate) type Task<I, E> = Arc<dyn Fn(I) -> Result<(), E> + Send + Sync>;

/// Where a worker takes its items from.
pub(crate) enum Inbox<I> {
    /// A queue drained by this worker alone.
    Owned(QueueReceiver<I>),
    /// A queue drained by several workers, one `recv` at a time.
    Shared(Arc<Mutex<QueueReceiver<I>>>),
}

impl<I> Inbox<I> {
    async fn recv(&mut self) -> Option<I> {
        match self {
            Inbox::Owned(receiver) => receiver.recv().await,
            Inbox::Shared(receiver) => receiver.lock().await.recv().await,
        }
    }
}

/// Spawns one worker task per inbox and waits until all of them have exited.
///
/// Each worker runs `task` on every item of its inbox until the inbox is closed and drained. A failing item is
/// recorded and does not stop its worker.
pub(crate) async fn run<I, E>(inboxes: Vec<Inbox<I>>, task: Task<I, E>) -> Result<(), ProcessError<E>>
where
    I: Send + 'static,
    E: Send + 'static,
{
    let handles: Vec<_> = inboxes
        .into_iter()
        .enumerate()
        .map(|(worker, inbox)| {
            let task = task.clone();
            tokio::spawn(WORKER_INDEX.scope(worker, drain(worker, inbox, task)))
        })
        .collect();

    collect_outcomes(futures::future::join_all(handles).await)
}

/// Folds the join results of all workers into the outcome of a `process` call, in worker order.
pub(crate) fn collect_outcomes<E>(
    results: Vec<Result<Vec<WorkerFailure<E>>, JoinError>>,
) -> Result<(), ProcessError<E>> {
    let mut failures = Vec::new();
    let mut aborted = None;

    for (worker, result) in results.into_iter().enumerate() {
        match result {
            Ok(mut worker_failures) => failures.append(&mut worker_failures),
            Err(err) => {
                tracing::error!(worker, "worker task did not finish: {err}");
                aborted.get_or_insert(worker);
            }
        }
    }

    tracing::debug!(failed = failures.len(), aborted = aborted.is_some(), "all workers finished");

    match aborted {
        Some(worker) => Err(ProcessError::WorkerAborted { worker, failures }),
        None if failures.is_empty() => Ok(()),
        None => Err(ProcessError::Failed(failures)),
    }
}

async fn drain<I, E>(worker: usize, mut inbox: Inbox<I>, task: Task<I, E>) -> Vec<WorkerFailure<E>> {
    tracing::trace!(worker, "worker started");

    let mut processed = 0usize;
    let mut failures = Vec::new();

    while let Some(item) = inbox.recv().await {
        processed += 1;

        let cause = match panic::catch_unwind(AssertUnwindSafe(|| task(item))) {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => FailureCause::Error(err),
            Err(payload) => FailureCause::Panic(panic_message(payload)),
        };

        tracing::warn!(worker, "processor failed on an item");
        failures.push(WorkerFailure { worker, cause });
    }

    tracing::trace!(worker, processed, "worker stopped");

    failures
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "non-string panic payload".to_owned(),
        },
    }
}
