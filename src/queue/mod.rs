mod receiver;
mod sender;

pub(crate) use self::{receiver::QueueReceiver, sender::QueueSender};

use tokio::sync::{mpsc, oneshot};

/// An item in transit. Without a buffer, it also carries the acknowledgement its producer waits on.
pub(crate) struct Envelope<T> {
    pub(crate) item: T,
    pub(crate) ack: Option<oneshot::Sender<()>>,
}

/// Creates a bounded work queue that buffers up to `capacity` items.
///
/// Tokio channels cannot have a capacity of zero, so a zero `capacity` creates a rendezvous queue instead: one slot
/// holds the item in transit and every send waits until a receiver has taken its item out of the queue.
///
/// The queue is closed once every [`QueueSender`] has been dropped. The [`QueueReceiver`] keeps returning buffered
/// items after that and reports the end of the stream once they are drained.
pub(crate) fn queue<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    (
        QueueSender {
            sender: tx,
            rendezvous: capacity == 0,
        },
        QueueReceiver { receiver: rx },
    )
}
