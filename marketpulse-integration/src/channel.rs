use std::fmt::Debug;

/// A cheaply cloneable sender of `Self::Item` events.
///
/// Implemented by [`UnboundedTx`] and used throughout `marketpulse-data` adapters to forward
/// parsed records out of the WebSocket read loop without blocking it.
pub trait Tx
where
    Self: Debug + Clone + Send,
{
    type Item;
    fn send(&self, item: Self::Item) -> Result<(), Self::Item>;
}

/// Thin wrapper around [`tokio::sync::mpsc::UnboundedSender`].
#[derive(Debug)]
pub struct UnboundedTx<T> {
    tx: tokio::sync::mpsc::UnboundedSender<T>,
}

impl<T> Clone for UnboundedTx<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Tx for UnboundedTx<T>
where
    T: Debug + Clone + Send,
{
    type Item = T;

    fn send(&self, item: T) -> Result<(), T> {
        self.tx.send(item).map_err(|err| err.0)
    }
}

/// Thin wrapper around [`tokio::sync::mpsc::UnboundedReceiver`].
#[derive(Debug)]
pub struct UnboundedRx<T> {
    rx: tokio::sync::mpsc::UnboundedReceiver<T>,
}

impl<T> UnboundedRx<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// Construct a new unbounded [`UnboundedTx`]/[`UnboundedRx`] pair.
pub fn mpsc_unbounded<T>() -> (UnboundedTx<T>, UnboundedRx<T>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (UnboundedTx { tx }, UnboundedRx { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_recv_round_trip() {
        let (tx, mut rx) = mpsc_unbounded::<u32>();
        tx.send(7).unwrap();
        assert_eq!(rx.recv().await, Some(7));
    }

    #[tokio::test]
    async fn test_send_after_drop_returns_item() {
        let (tx, rx) = mpsc_unbounded::<u32>();
        drop(rx);
        assert_eq!(tx.send(42), Err(42));
    }
}
