//! The price adapter process (§5): owns the price index for all three exchanges and republishes
//! it over the broker's `price/<exchange>` endpoints for the scheduler and evaluator processes.

use marketpulse::{Config, logging};
use marketpulse_broker::{Endpoint, Publisher};
use marketpulse_data::exchange_binance::BinancePriceAdapter;
use marketpulse_data::exchange_kucoin::KucoinPriceAdapter;
use marketpulse_data::exchange_okx::OkxPriceAdapter;
use marketpulse_data::{PriceIndex, run_price_adapter};
use marketpulse_instrument::{ExchangeId, Instrument, TradeType};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    logging::init_logging_from_env();
    let config = Config::from_env();
    let index = Arc::new(PriceIndex::new());

    let handles = vec![
        run_price_adapter(
            ExchangeId::Binance,
            Arc::new(BinancePriceAdapter::new(TradeType::Spot)),
            index.clone(),
        ),
        run_price_adapter(
            ExchangeId::Binance,
            Arc::new(BinancePriceAdapter::new(TradeType::Futures)),
            index.clone(),
        ),
        run_price_adapter(ExchangeId::Kucoin, Arc::new(KucoinPriceAdapter::new()), index.clone()),
        run_price_adapter(ExchangeId::Okx, Arc::new(OkxPriceAdapter::new()), index.clone()),
    ];

    for exchange in [ExchangeId::Binance, ExchangeId::Kucoin, ExchangeId::Okx] {
        let index = index.clone();
        let base_dir = config.broker_base_dir.clone();
        tokio::spawn(async move {
            match Publisher::<Instrument>::bind(Endpoint::Price(exchange), &base_dir).await {
                Ok(publisher) => republish_loop(exchange, index, publisher).await,
                Err(error) => error!(%exchange, %error, "failed to bind price endpoint"),
            }
        });
    }

    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c, shutting down anyway");
    }
    info!("price_monitor shutting down");
    for handle in handles {
        handle.stop();
    }
}

/// Republish this exchange's index as a one-second snapshot loop.
///
/// The adapters themselves write straight into the shared [`PriceIndex`]; this loop is what
/// turns that process-local state into the broker fan-out other processes read §4.C from.
async fn republish_loop(exchange: ExchangeId, index: Arc<PriceIndex>, publisher: Publisher<Instrument>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        for instrument in index.exchange(exchange).snapshot() {
            if let Err(error) = publisher.publish(&instrument).await {
                warn!(%exchange, %error, "failed to publish instrument");
            }
        }
    }
}
