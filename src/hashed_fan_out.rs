use std::{convert::Infallible, hash::Hash, num::NonZeroUsize, sync::Arc};

use parking_lot::Mutex;

use crate::{
    CloseError, HashFunc, InvokeError, KeyFunc, KeyHasher, ProcessError, ProcessorFunc,
    queue::{QueueReceiver, QueueSender, queue},
    util::route_index,
    worker::{self, Inbox},
};

/// Fans items out to a fixed number of workers, each draining its own queue, routing every item by its hash.
///
/// An item goes to worker `hasher(item) % worker_count`. All items of one bucket are therefore handled by the same
/// worker, one at a time and in the order a producer handed them in. Buckets are processed in parallel with no
/// ordering between them. This lets a non-reentrant processor keep per-entity state without locking, as long as the
/// hasher maps each entity to a single bucket.
///
/// The number of buckets is the number of workers: a pool with a different `worker_count` partitions items
/// differently.
///
/// # Examples
///
/// ```rust
/// use std::{
///     num::NonZeroUsize,
///     sync::{
///         Arc,
///         atomic::{AtomicU64, Ordering},
///     },
/// };
///
/// use tokio_fanout::{HashedFanOut, StringHasher};
///
/// #[tokio::main]
/// async fn main() {
///     let pool = Arc::new(HashedFanOut::<u64, _>::new(
///         NonZeroUsize::new(4).unwrap(),
///         16,
///         StringHasher::new(|n: &u64| n.to_string()),
///     ));
///
///     let producer = {
///         let pool = pool.clone();
///         tokio::spawn(async move {
///             for n in 1..=100u64 {
///                 pool.invoke(n).await.unwrap();
///             }
///             pool.close().unwrap();
///         })
///     };
///
///     let sum = Arc::new(AtomicU64::new(0));
///     let total = sum.clone();
///     pool.process(move |n: u64| {
///         total.fetch_add(n, Ordering::Relaxed);
///     })
///     .await
///     .unwrap();
///
///     producer.await.unwrap();
///     assert_eq!(sum.load(Ordering::Relaxed), 5050);
/// }
/// ```
pub struct HashedFanOut<I, H> {
    worker_count: NonZeroUsize,
    buffer_size: usize,
    hasher: H,
    senders: Mutex<Option<Vec<QueueSender<I>>>>,
    receivers: Mutex<Option<Vec<QueueReceiver<I>>>>,
}

impl<I, F> HashedFanOut<I, KeyHasher<F>>
where
    I: Send + 'static,
    F: KeyFunc<I>,
    F::Key: Hash,
{
    /// Creates a hashed fan-out that routes items by the key `key_func` returns, hashed with a randomly seeded
    /// [`RandomState`](std::hash::RandomState).
    pub fn keyed(worker_count: NonZeroUsize, buffer_size: usize, key_func: F) -> Self {
        Self::new(worker_count, buffer_size, KeyHasher::new(key_func))
    }
}

impl<I, H> HashedFanOut<I, H>
where
    I: Send + 'static,
    H: HashFunc<I>,
{
    /// Creates a hashed fan-out with `worker_count` workers, each with its own queue buffering up to `buffer_size`
    /// items, and routes items with `hasher`.
    ///
    /// A `buffer_size` of zero makes every [`invoke`](HashedFanOut::invoke) wait until the target worker has taken the
    /// item.
    pub fn new(worker_count: NonZeroUsize, buffer_size: usize, hasher: H) -> Self {
        let mut senders = Vec::with_capacity(worker_count.get());
        let mut receivers = Vec::with_capacity(worker_count.get());

        for _ in 0..worker_count.get() {
            let (tx, rx) = queue(buffer_size);
            senders.push(tx);
            receivers.push(rx);
        }

        Self {
            worker_count,
            buffer_size,
            hasher,
            senders: Mutex::new(Some(senders)),
            receivers: Mutex::new(Some(receivers)),
        }
    }

    /// Returns the number of workers, which is also the number of buckets.
    pub fn worker_count(&self) -> NonZeroUsize {
        self.worker_count
    }

    /// Returns the capacity of each worker's queue.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Returns `true` once [`close`](HashedFanOut::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.senders.lock().is_none()
    }

    /// Returns the bucket, and so the worker index, `item` is routed to.
    pub fn bucket_of(&self, item: &I) -> usize {
        route_index(self.hasher.hash_input(item), self.worker_count)
    }

    /// Hands an item to the worker of its bucket.
    ///
    /// This method waits while that worker's queue is full, regardless of how full the other queues are. Without a
    /// buffer, it waits until the worker has taken the item.
    ///
    /// If [`close`](HashedFanOut::close) was already called, this function returns an error. The error includes the
    /// item.
    ///
    /// # Cancel safety
    ///
    /// With a buffer, this method is cancel safe: if it is cancelled before completing, the item was not queued.
    ///
    /// Without a buffer, the item is queued first and the method then waits for a worker to take it. Cancelling it
    /// during that wait does not withdraw the item; a worker still processes it. Retrying an item after a timed-out
    /// unbuffered `invoke` may therefore process it twice.
    pub async fn invoke(&self, item: I) -> Result<(), InvokeError<I>> {
        match self.sender_for(&item) {
            Some(sender) => sender.send(item).await,
            None => Err(InvokeError::Closed(item)),
        }
    }

    /// Blocking variant of [`invoke`](HashedFanOut::invoke) for producers running on plain threads.
    ///
    /// # Panics
    ///
    /// This function panics if called within an asynchronous execution context.
    pub fn blocking_invoke(&self, item: I) -> Result<(), InvokeError<I>> {
        match self.sender_for(&item) {
            Some(sender) => sender.blocking_send(item),
            None => Err(InvokeError::Closed(item)),
        }
    }

    /// Closes every worker's queue.
    ///
    /// Workers finish the items already queued and then exit. This must be called exactly once, after the last
    /// [`invoke`](HashedFanOut::invoke); a second call returns [`CloseError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), CloseError> {
        match self.senders.lock().take() {
            Some(senders) => {
                tracing::debug!(queues = senders.len(), "hashed fan-out closed");
                Ok(())
            }
            None => Err(CloseError::AlreadyClosed),
        }
    }

    /// Runs `processor` on every item with one worker per bucket and waits until every queue is closed and drained.
    ///
    /// Within a bucket, items are processed sequentially. A panic in `processor` is caught; the worker moves on to the
    /// next item of its bucket and the panic is reported as a [`ProcessError::Failed`] once all workers are done.
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

    /// Like [`process`](HashedFanOut::process), with a processor that can fail.
    ///
    /// A failing item does not stop its worker, so the rest of its bucket is still processed in order. All failures
    /// are collected and returned as [`ProcessError::Failed`] after every worker has exited.
    pub async fn try_process<F, E>(&self, processor: F) -> Result<(), ProcessError<E>>
    where
        F: Fn(I) -> Result<(), E> + Send + Sync + 'static,
        E: Send + 'static,
    {
        let receivers = self.receivers.lock().take().ok_or(ProcessError::AlreadyStarted)?;
        let inboxes = receivers.into_iter().map(Inbox::Owned).collect();

        worker::run(inboxes, Arc::new(processor)).await
    }

    fn sender_for(&self, item: &I) -> Option<QueueSender<I>> {
        let bucket = self.bucket_of(item);

        self.senders
            .lock()
            .as_ref()
            .and_then(|senders| senders.get(bucket))
            .cloned()
    }
}
