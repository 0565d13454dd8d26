//! Rebuild a process-local [`PriceIndex`] from the price adapter process's broker feed.
//!
//! The evaluator processes don't run adapters themselves (§5 multi-process model); they learn
//! prices the same way the scheduler does, by subscribing to `price/<exchange>` (§4.C).

use marketpulse_broker::{Endpoint, Subscriber};
use marketpulse_data::PriceIndex;
use marketpulse_instrument::ExchangeId;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawn one subscriber loop per exchange, each folding `Instrument` updates into `index`.
/// Returns the join handles so the caller can abort them on shutdown.
pub fn spawn_price_feed_subscribers(base_dir: &Path, index: Arc<PriceIndex>) -> Vec<JoinHandle<()>> {
    [ExchangeId::Binance, ExchangeId::Kucoin, ExchangeId::Okx]
        .into_iter()
        .map(|exchange| {
            let base_dir = base_dir.to_path_buf();
            let index = index.clone();
            tokio::spawn(async move {
                let mut subscriber = match Subscriber::connect(Endpoint::Price(exchange), &base_dir).await {
                    Ok(subscriber) => subscriber,
                    Err(error) => {
                        warn!(%exchange, %error, "failed to connect to price feed");
                        return;
                    }
                };
                loop {
                    match subscriber.recv().await {
                        Ok(Some(instrument)) => index.exchange(exchange).insert(instrument),
                        Ok(None) => {
                            info!(%exchange, "price feed publisher disconnected");
                            break;
                        }
                        Err(error) => warn!(%exchange, %error, "failed to decode price feed message"),
                    }
                }
            })
        })
        .collect()
}
