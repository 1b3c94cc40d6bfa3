use tokio::sync::mpsc::Receiver as MpscReceiver;

use crate::queue::Envelope;

/// Receive items from the associated [`QueueSender`](crate::queue::QueueSender)s.
pub(crate) struct QueueReceiver<T> {
    pub(crate) receiver: MpscReceiver<Envelope<T>>,
}

impl<T> QueueReceiver<T> {
    /// Receives the next item from the queue.
    ///
    /// This method returns `None` once every sender has been dropped and the buffer is empty. If the buffer is empty
    /// but senders remain, it sleeps until an item arrives or the queue is closed.
    ///
    /// A producer waiting on a rendezvous queue is released as soon as its item is taken here.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. If it is cancelled before completing, no item was taken from the queue.
    pub(crate) async fn recv(&mut self) -> Option<T> {
        let Envelope { item, ack } = self.receiver.recv().await?;

        if let Some(ack) = ack {
            // The producer may have given up waiting; the item is still ours to process.
            let _ = ack.send(());
        }

        Some(item)
    }
}
