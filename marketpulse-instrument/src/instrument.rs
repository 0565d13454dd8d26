use crate::exchange::TradeType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::hash::{Hash, Hasher};

/// Unique `(symbol, trade_type)` key for an [`Instrument`].
///
/// Two [`Instrument`]s with the same [`InstrumentKey`] are the same instrument; this is the key
/// the price index uses for `insert`/`find`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct InstrumentKey {
    pub symbol: SmolStr,
    pub trade_type: TradeType,
}

impl InstrumentKey {
    pub fn new<S>(symbol: S, trade_type: TradeType) -> Self
    where
        S: Into<SmolStr>,
    {
        Self {
            symbol: symbol.into(),
            trade_type,
        }
    }
}

/// Latest known price record for a `(symbol, trade_type)` instrument on one exchange.
///
/// ### Notes
/// Equality and hashing are defined over [`InstrumentKey`] only (`symbol`, `trade_type`) - the
/// price fields are mutable-on-replace, matching the price index's replace-latest semantics
/// (see `marketpulse-data::index`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: SmolStr,
    pub trade_type: TradeType,
    pub last_price: Decimal,
    pub open_24h: Decimal,
}

impl Instrument {
    pub fn new<S>(symbol: S, trade_type: TradeType, last_price: Decimal, open_24h: Decimal) -> Self
    where
        S: Into<SmolStr>,
    {
        Self {
            symbol: symbol.into(),
            trade_type,
            last_price,
            open_24h,
        }
    }

    pub fn key(&self) -> InstrumentKey {
        InstrumentKey::new(self.symbol.clone(), self.trade_type)
    }
}

impl PartialEq for Instrument {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol && self.trade_type == other.trade_type
    }
}

impl Eq for Instrument {}

impl Hash for Instrument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
        self.trade_type.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_equality_ignores_price_fields() {
        let a = Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90));
        let b = Instrument::new("BTCUSDT", TradeType::Spot, dec!(101), dec!(90));
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_inequality_on_trade_type() {
        let a = Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90));
        let b = Instrument::new("BTCUSDT", TradeType::Futures, dec!(100), dec!(90));
        assert_ne!(a, b);
    }
}
