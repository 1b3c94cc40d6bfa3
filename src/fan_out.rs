use std::{convert::Infallible, num::NonZeroUsize, sync::Arc};

use parking_lot::Mutex;

use crate::{
    CloseError, InvokeError, ProcessError, ProcessorFunc,
    queue::{QueueReceiver, QueueSender, queue},
    worker::{self, Inbox},
};

/// Fans items out to a fixed number of workers that share one queue.
///
/// Any idle worker takes the next item, so there is no ordering between items and no affinity between an item and a
/// worker. Use [`HashedFanOut`](crate::HashedFanOut) when related items must be handled by the same worker.
///
/// A `FanOut` is used once: producers [`invoke`](FanOut::invoke) it, one caller [`process`](FanOut::process)es it,
/// and [`close`](FanOut::close) is called after the last item has been handed in.
pub struct FanOut<I> {
    worker_count: NonZeroUsize,
    buffer_size: usize,
    sender: Mutex<Option<QueueSender<I>>>,
    receiver: Mutex<Option<QueueReceiver<I>>>,
}

impl<I> FanOut<I>
where
    I: Send + 'static,
{
    /// Creates a fan-out with `worker_count` workers and a shared queue that buffers up to `buffer_size` items.
    ///
    /// A `buffer_size` of zero makes every [`invoke`](FanOut::invoke) wait until a worker has taken the item.
    pub fn new(worker_count: NonZeroUsize, buffer_size: usize) -> Self {
        let (tx, rx) = queue(buffer_size);

        Self {
            worker_count,
            buffer_size,
            sender: Mutex::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
        }
    }

    /// Returns the number of workers [`process`](FanOut::process) runs.
    pub fn worker_count(&self) -> NonZeroUsize {
        self.worker_count
    }

    /// Returns the capacity of the queue.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Returns `true` once [`close`](FanOut::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Hands an item to the workers.
    ///
    /// This method waits while the queue is full. Without a buffer, it waits until a worker has taken the item.
    ///
    /// If [`close`](FanOut::close) was already called, this function returns an error. The error includes the item.
    ///
    /// # Cancel safety
    ///
    /// With a buffer, this method is cancel safe: if it is cancelled before completing, the item was not queued.
    ///
    /// Without a buffer, the item is queued first and the method then waits for a worker to take it. Cancelling it
    /// during that wait does not withdraw the item; a worker still processes it. Retrying an item after a timed-out
    /// unbuffered `invoke` may therefore process it twice.
    pub async fn invoke(&self, item: I) -> Result<(), InvokeError<I>> {
        match self.sender() {
            Some(sender) => sender.send(item).await,
            None => Err(InvokeError::Closed(item)),
        }
    }

    /// Blocking variant of [`invoke`](FanOut::invoke) for producers running on plain threads.
    ///
    /// # Panics
    ///
    /// This function panics if called within an asynchronous execution context.
    pub fn blocking_invoke(&self, item: I) -> Result<(), InvokeError<I>> {
        match self.sender() {
            Some(sender) => sender.blocking_send(item),
            None => Err(InvokeError::Closed(item)),
        }
    }

    /// Signals that no more items will be handed in.
    ///
    /// Workers finish the items already queued and then exit. Invocations still waiting for room in the queue complete
    /// normally. This must be called exactly once; a second call returns [`CloseError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), CloseError> {
        match self.sender.lock().take() {
            Some(_) => {
                tracing::debug!("fan-out closed");
                Ok(())
            }
            None => Err(CloseError::AlreadyClosed),
        }
    }

    /// Runs `processor` on every item with `worker_count` workers and waits until the queue is closed and drained.
    ///
    /// A panic in `processor` is caught; the worker moves on to the next item and the panic is reported as a
    /// [`ProcessError::Failed`] once all workers are done.
    ///
    /// This may be called once per fan-out; later calls return [`ProcessError::AlreadyStarted`].
    pub async fn process<F>(&self, processor: F) -> Result<(), ProcessError>
    where
        F: ProcessorFunc<I>,
    {
        self.try_process(move |item| {
            processor(item);
            Ok::<_, Infallible>(())
        })
        .await
    }

    /// Like [`process`](FanOut::process), with a processor that can fail.
    ///
    /// A failing item does not stop its worker. All failures are collected and returned as
    /// [`ProcessError::Failed`] after every worker has exited.
    pub async fn try_process<F, E>(&self, processor: F) -> Result<(), ProcessError<E>>
    where
        F: Fn(I) -> Result<(), E> + Send + Sync + 'static,
        E: Send + 'static,
    {
        let receiver = self.receiver.lock().take().ok_or(ProcessError::AlreadyStarted)?;
        let shared = Arc::new(tokio::sync::Mutex::new(receiver));

        let inboxes = (0..self.worker_count.get())
            .map(|_| Inbox::Shared(shared.clone()))
            .collect();

        worker::run(inboxes, Arc::new(processor)).await
    }

    fn sender(&self) -> Option<QueueSender<I>> {
        self.sender.lock().clone()
    }
}
