use crate::endpoint::Endpoint;
use crate::error::BrokerError;
use crate::frame::{read_frame, write_frame};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The publishing half of a named endpoint.
///
/// `bind` creates the endpoint's directory tree, removes any stale socket left by a crashed
/// prior run, and spawns a background accept loop. `publish` fans `value` out to every
/// subscriber currently connected - best-effort, at-most-once, no replay (§4.C).
#[derive(Debug, Clone)]
pub struct Publisher<T> {
    connections: Arc<Mutex<Vec<OwnedWriteHalf>>>,
    _marker: PhantomData<fn(T)>,
}

impl<T> Publisher<T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn bind(endpoint: Endpoint, base_dir: impl AsRef<Path>) -> Result<Self, BrokerError> {
        let path = endpoint.path(base_dir);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                BrokerError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                }
            })?;
        }
        // A prior crashed publisher can leave a stale socket file bind() would otherwise fail on.
        let _ = tokio::fs::remove_file(&path).await;

        let listener = UnixListener::bind(&path).map_err(|source| BrokerError::Bind {
            path: path.display().to_string(),
            source,
        })?;

        let connections = Arc::new(Mutex::new(Vec::new()));
        let accepted = connections.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _addr)) => {
                        let (_read, write) = stream.into_split();
                        accepted.lock().await.push(write);
                        debug!("broker subscriber connected");
                    }
                    Err(error) => {
                        warn!(%error, "broker listener accept loop stopped");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            connections,
            _marker: PhantomData,
        })
    }

    /// Publish `value` to every subscriber connected at this instant. Subscribers that have
    /// disconnected are pruned from the live list; subscribers that connect after this call
    /// never see it.
    pub async fn publish(&self, value: &T) -> Result<(), BrokerError> {
        let mut connections = self.connections.lock().await;
        let mut alive = Vec::with_capacity(connections.len());
        for mut writer in connections.drain(..) {
            if write_frame(&mut writer, value).await.is_ok() {
                alive.push(writer);
            }
        }
        *connections = alive;
        Ok(())
    }

    /// Number of subscribers connected at this instant.
    pub async fn subscriber_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

/// The subscribing half of a named endpoint. Connects once; `recv` yields one message per call,
/// in publish order, with no replay of messages sent before the connection was established.
#[derive(Debug)]
pub struct Subscriber<T> {
    stream: UnixStream,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Subscriber<T>
where
    T: DeserializeOwned,
{
    pub async fn connect(endpoint: Endpoint, base_dir: impl AsRef<Path>) -> Result<Self, BrokerError> {
        let path = endpoint.path(base_dir);
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|source| BrokerError::Connect {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            stream,
            _marker: PhantomData,
        })
    }

    /// Receive the next message, or `None` once the publisher has closed the connection.
    pub async fn recv(&mut self) -> Result<Option<T>, BrokerError> {
        read_frame(&mut self.stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_instrument::{ExchangeId, Instrument, TradeType};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_publish_reaches_connected_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::Price(ExchangeId::Binance);

        let publisher = Publisher::<Instrument>::bind(endpoint, dir.path()).await.unwrap();
        let mut subscriber = Subscriber::<Instrument>::connect(endpoint, dir.path())
            .await
            .unwrap();

        // Give the accept loop a chance to register the connection before publishing.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let instrument = Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90));
        publisher.publish(&instrument).await.unwrap();

        let received = subscriber.recv().await.unwrap().unwrap();
        assert_eq!(received, instrument);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_publish() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::Price(ExchangeId::Okx);

        let publisher = Publisher::<Instrument>::bind(endpoint, dir.path()).await.unwrap();
        let early = Instrument::new("BTC-USDT", TradeType::Spot, dec!(1), dec!(1));
        publisher.publish(&early).await.unwrap();

        let mut late_subscriber = Subscriber::<Instrument>::connect(endpoint, dir.path())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let second = Instrument::new("ETH-USDT", TradeType::Spot, dec!(2), dec!(2));
        publisher.publish(&second).await.unwrap();

        let received = late_subscriber.recv().await.unwrap().unwrap();
        assert_eq!(received, second);
    }
}
