use serde::{Deserialize, Serialize};

/// An execution report pushed by an exchange's private order-update stream.
///
/// All numeric fields are kept as `String` to preserve exchange precision (§3) - they are never
/// parsed here, only forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub user_id: String,
    pub symbol: String,
    pub order_id: String,
    pub side: String,
    pub order_status: String,
    pub price: String,
    pub quantity: String,
    pub filled_quantity: String,
}

/// A single-asset balance delta, as pushed by Binance's `balanceUpdate` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub user_id: String,
    pub asset: String,
    pub delta: String,
}

/// A single-asset balance snapshot line, expanded from Binance's `outboundAccountPosition` event -
/// one [`AccountPosition`] record per asset entry (§4.A).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPosition {
    pub user_id: String,
    pub asset: String,
    pub free: String,
    pub locked: String,
}

/// A single-asset balance line, as pushed by OKX's `balance_and_position` channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceData {
    pub user_id: String,
    pub currency: String,
    pub cash_balance: String,
}

/// Normalized per-account event, published on `account-result/<exchange>` (§4.C).
///
/// Binance emits `OrderUpdate`/`BalanceUpdate`/`AccountPosition`; OKX emits `OrderUpdate`/
/// `BalanceData`; KuCoin emits `OrderUpdate` only (its stop-order stage reuses the same shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AccountEvent {
    OrderUpdate(OrderUpdate),
    BalanceUpdate(BalanceUpdate),
    AccountPosition(AccountPosition),
    BalanceData(BalanceData),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_event_roundtrips_through_json() {
        let event = AccountEvent::OrderUpdate(OrderUpdate {
            user_id: "u1".into(),
            symbol: "BTCUSDT".into(),
            order_id: "1".into(),
            side: "BUY".into(),
            order_status: "FILLED".into(),
            price: "100.50".into(),
            quantity: "0.001".into(),
            filled_quantity: "0.001".into(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: AccountEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn test_numeric_fields_preserve_precision_as_strings() {
        let event = AccountEvent::AccountPosition(AccountPosition {
            user_id: "u1".into(),
            asset: "USDT".into(),
            free: "123.456789012345".into(),
            locked: "0".into(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("123.456789012345"));
    }
}
