use marketpulse_data::PriceIndex;
use marketpulse_instrument::{ExchangeId, Instrument, TradeType};
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_concurrent_writer_and_readers_observe_monotonic_prices() {
    let index = Arc::new(PriceIndex::new());
    let writer_index = index.clone();

    let writer = tokio::spawn(async move {
        let set = writer_index.exchange(ExchangeId::Binance);
        for price in 1..=50 {
            set.insert(Instrument::new(
                "BTCUSDT",
                TradeType::Spot,
                rust_decimal::Decimal::from(price),
                dec!(0),
            ));
            tokio::task::yield_now().await;
        }
    });

    let reader_index = index.clone();
    let reader = tokio::spawn(async move {
        let set = reader_index.exchange(ExchangeId::Binance);
        let mut last_seen = rust_decimal::Decimal::ZERO;
        for _ in 0..50 {
            if let Some(instrument) = set.find(&marketpulse_instrument::InstrumentKey::new(
                "BTCUSDT",
                TradeType::Spot,
            )) {
                assert!(instrument.last_price >= last_seen);
                last_seen = instrument.last_price;
            }
            tokio::task::yield_now().await;
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();
}

#[tokio::test]
async fn test_each_exchange_is_independent() {
    let index = PriceIndex::new();
    index
        .exchange(ExchangeId::Binance)
        .insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(1), dec!(1)));
    index
        .exchange(ExchangeId::Okx)
        .insert(Instrument::new("BTC-USDT", TradeType::Spot, dec!(2), dec!(2)));

    assert_eq!(index.exchange(ExchangeId::Binance).len(), 1);
    assert_eq!(index.exchange(ExchangeId::Okx).len(), 1);
    assert_eq!(index.exchange(ExchangeId::Kucoin).len(), 0);
}
