use marketpulse_instrument::{ExchangeId, Instrument, InstrumentKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A single exchange's set of latest-known [`Instrument`] records (§4.B).
///
/// `insert` replaces any existing element equal by [`InstrumentKey`]; multiple readers may run
/// concurrently with the single writer that owns this exchange's adapter, the lock is held only
/// for the duration of the map operation and never across I/O.
#[derive(Debug, Default)]
pub struct InstrumentSet {
    instruments: RwLock<HashMap<InstrumentKey, Instrument>>,
}

impl InstrumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `instrument`, replacing any existing record with the same [`InstrumentKey`].
    pub fn insert(&self, instrument: Instrument) {
        self.instruments.write().insert(instrument.key(), instrument);
    }

    /// Point-in-time copy of every instrument currently held.
    pub fn snapshot(&self) -> Vec<Instrument> {
        self.instruments.read().values().cloned().collect()
    }

    /// Look up a single instrument by key.
    pub fn find(&self, key: &InstrumentKey) -> Option<Instrument> {
        self.instruments.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.instruments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.read().is_empty()
    }
}

/// Process-global `Exchange -> InstrumentSet` map (§4.B).
///
/// Each exchange's [`InstrumentSet`] is reached through an `Arc`, so adapters and evaluators can
/// hold a long-lived reference to "their" exchange without re-locking the outer map on every
/// price update.
#[derive(Debug, Default)]
pub struct PriceIndex {
    exchanges: RwLock<HashMap<ExchangeId, Arc<InstrumentSet>>>,
}

impl PriceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the [`InstrumentSet`] for `exchange`, creating an empty one on first access.
    pub fn exchange(&self, exchange: ExchangeId) -> Arc<InstrumentSet> {
        if let Some(set) = self.exchanges.read().get(&exchange) {
            return set.clone();
        }
        self.exchanges
            .write()
            .entry(exchange)
            .or_insert_with(|| Arc::new(InstrumentSet::new()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_instrument::TradeType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_replaces_by_key_only() {
        let set = InstrumentSet::new();
        set.insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90)));
        set.insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(105), dec!(90)));

        assert_eq!(set.len(), 1);
        let found = set
            .find(&InstrumentKey::new("BTCUSDT", TradeType::Spot))
            .unwrap();
        assert_eq!(found.last_price, dec!(105));
    }

    #[test]
    fn test_snapshot_is_point_in_time_copy() {
        let set = InstrumentSet::new();
        set.insert(Instrument::new("ETHUSDT", TradeType::Spot, dec!(10), dec!(9)));
        let snapshot = set.snapshot();
        set.insert(Instrument::new("ETHUSDT", TradeType::Spot, dec!(20), dec!(9)));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].last_price, dec!(10));
    }

    #[test]
    fn test_price_index_creates_exchange_lazily() {
        let index = PriceIndex::new();
        let binance = index.exchange(ExchangeId::Binance);
        binance.insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(1), dec!(1)));

        assert_eq!(index.exchange(ExchangeId::Binance).len(), 1);
        assert_eq!(index.exchange(ExchangeId::Kucoin).len(), 0);
    }
}
