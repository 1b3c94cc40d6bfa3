use tokio::sync::{mpsc::Sender as MpscSender, oneshot};

use crate::{InvokeError, queue::Envelope};

/// Send items to the associated [`QueueReceiver`](crate::queue::QueueReceiver).
pub(crate) struct QueueSender<T> {
    pub(crate) sender: MpscSender<Envelope<T>>,
    pub(crate) rendezvous: bool,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            rendezvous: self.rendezvous,
        }
    }
}

impl<T> QueueSender<T> {
    /// Sends an item, waiting while the queue is at capacity.
    ///
    /// On a rendezvous queue this also waits until a receiver has taken the item.
    ///
    /// # Cancel safety
    ///
    /// On a buffered queue this method is cancel safe. On a rendezvous queue, cancelling it after the item entered the
    /// queue leaves the item there to be received.
    ///
    /// If the receive half of the queue is gone, this function returns an error that includes the item.
    pub(crate) async fn send(&self, item: T) -> Result<(), InvokeError<T>> {
        let (envelope, ack) = self.seal(item);

        self.sender
            .send(envelope)
            .await
            .map_err(|err| InvokeError::Closed(err.0.item))?;

        match ack {
            Some(ack) => ack.await.map_err(|_| InvokeError::Abandoned),
            None => Ok(()),
        }
    }

    /// Blocking variant of [`send`](QueueSender::send) for producers outside of the runtime.
    ///
    /// # Panics
    ///
    /// This function panics if called within an asynchronous execution context.
    pub(crate) fn blocking_send(&self, item: T) -> Result<(), InvokeError<T>> {
        let (envelope, ack) = self.seal(item);

        self.sender
            .blocking_send(envelope)
            .map_err(|err| InvokeError::Closed(err.0.item))?;

        match ack {
            Some(ack) => ack.blocking_recv().map_err(|_| InvokeError::Abandoned),
            None => Ok(()),
        }
    }

    fn seal(&self, item: T) -> (Envelope<T>, Option<oneshot::Receiver<()>>) {
        if !self.rendezvous {
            return (Envelope { item, ack: None }, None);
        }

        let (tx, rx) = oneshot::channel();
        (Envelope { item, ack: Some(tx) }, Some(rx))
    }
}
