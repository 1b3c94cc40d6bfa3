use std::convert::Infallible;

/// Error type for handing items to a pool through [`FanOut::invoke`](crate::FanOut::invoke) and
/// [`HashedFanOut::invoke`](crate::HashedFanOut::invoke).
#[derive(Debug, thiserror::Error)]
pub enum InvokeError<T> {
    /// The pool was closed before the item could be queued. The error includes the item.
    #[error("fan-out closed")]
    Closed(T),

    /// The item was queued without a buffer, but the pool was dropped before any worker took it.
    #[error("item abandoned before a worker received it")]
    Abandoned,
}

/// Error type for [`FanOut::close`](crate::FanOut::close) and [`HashedFanOut::close`](crate::HashedFanOut::close).
#[derive(Debug, thiserror::Error)]
pub enum CloseError {
    /// `close` was already called on this pool.
    #[error("fan-out already closed")]
    AlreadyClosed,
}

/// Error type for [`FanOut::process`](crate::FanOut::process) and
/// [`HashedFanOut::process`](crate::HashedFanOut::process) and their `try_` variants.
///
/// `E` is the error type of the processor; it is [`Infallible`] for processors that return nothing.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError<E = Infallible> {
    /// The workers of this pool were already started by an earlier call.
    #[error("fan-out is already being processed")]
    AlreadyStarted,

    /// Every worker drained its queue, but some items failed.
    #[error("{} item(s) failed during processing", .0.len())]
    Failed(Vec<WorkerFailure<E>>),

    /// A worker task was cancelled by the runtime before its queue was drained.
    #[error("worker {worker} was aborted")]
    WorkerAborted {
        /// Index of the first aborted worker.
        worker: usize,

        /// Item failures reported by the workers that did finish.
        failures: Vec<WorkerFailure<E>>,
    },
}

/// A single item that could not be processed.
#[derive(Debug)]
pub struct WorkerFailure<E> {
    /// Index of the worker that ran the item.
    pub worker: usize,

    /// What went wrong.
    pub cause: FailureCause<E>,
}

/// Reason an item failed.
#[derive(Debug)]
pub enum FailureCause<E> {
    /// The processor returned an error.
    Error(E),

    /// The processor panicked. Holds the panic message when it was a string.
    Panic(String),
}

impl<E> ProcessError<E> {
    /// Returns the item failures collected before the error, if any.
    pub fn failures(&self) -> &[WorkerFailure<E>] {
        match self {
            ProcessError::Failed(failures) | ProcessError::WorkerAborted { failures, .. } => failures,
            ProcessError::AlreadyStarted => &[],
        }
    }
}
