use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Unique identifier for a supported execution venue.
///
/// ### Notes
/// `Total` is a sentinel value used on the wire to mean "no exchange specified" (mirrors the
/// original system's `exchange_e::total`). It is never a valid choice for a submitted task and
/// is rejected by validation.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename = "exchange", rename_all = "snake_case")]
pub enum ExchangeId {
    Binance,
    Kucoin,
    Okx,
    Total,
}

impl ExchangeId {
    /// Return the `&str` representation of this [`ExchangeId`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Kucoin => "kucoin",
            ExchangeId::Okx => "okx",
            ExchangeId::Total => "total",
        }
    }

    /// `true` if this is a real, addressable exchange (ie/ not the `Total` sentinel).
    pub fn is_concrete(&self) -> bool {
        !matches!(self, ExchangeId::Total)
    }
}

/// Defines the market an [`Instrument`](crate::instrument::Instrument) is traded in.
///
/// ### Notes
/// `Total` is a sentinel value, analogous to [`ExchangeId::Total`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename = "trade_type", rename_all = "snake_case")]
pub enum TradeType {
    Spot,
    Futures,
    Swap,
    Total,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Spot => "spot",
            TradeType::Futures => "futures",
            TradeType::Swap => "swap",
            TradeType::Total => "total",
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, TradeType::Total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_exchange_id() {
        assert_eq!(
            serde_json::from_str::<ExchangeId>(r#""kucoin""#).unwrap(),
            ExchangeId::Kucoin
        );
        assert_eq!(
            serde_json::from_str::<ExchangeId>(r#""total""#).unwrap(),
            ExchangeId::Total
        );
    }

    #[test]
    fn test_is_concrete() {
        assert!(ExchangeId::Binance.is_concrete());
        assert!(!ExchangeId::Total.is_concrete());
        assert!(TradeType::Spot.is_concrete());
        assert!(!TradeType::Total.is_concrete());
    }
}
