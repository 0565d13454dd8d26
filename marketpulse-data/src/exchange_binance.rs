//! Binance price & account adapters (§4.A).

use crate::adapter::{PriceExchange, StopSignal};
use crate::account_event::{AccountEvent, AccountPosition, BalanceUpdate, OrderUpdate};
use crate::adapter::AdapterHandle;
use crate::error::DataError;
use crate::index::PriceIndex;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use marketpulse_instrument::{AccountCredential, ExchangeId, Instrument, TradeType};
use marketpulse_integration::channel::Tx;
use marketpulse_integration::protocol::websocket::{self, WsMessage};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SPOT_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/price";
const FUTURES_TICKER_URL: &str = "https://fapi.binance.com/fapi/v1/ticker/price";
const WS_TICKER_STREAM: &str = "wss://stream.binance.com:9443/ws/!ticker@arr";
const USER_DATA_STREAM_URL: &str = "https://api.binance.com/api/v3/userDataStream";
const LISTEN_KEY_RENEWAL: Duration = Duration::from_secs(30 * 60);

/// Price adapter for `spot` or `futures` tickers (§4.A "Binance (price)").
#[derive(Debug)]
pub struct BinancePriceAdapter {
    trade_type: TradeType,
    client: reqwest::Client,
}

impl BinancePriceAdapter {
    pub fn new(trade_type: TradeType) -> Self {
        Self {
            trade_type,
            client: reqwest::Client::new(),
        }
    }

    fn ticker_url(&self) -> &'static str {
        match self.trade_type {
            TradeType::Futures | TradeType::Swap => FUTURES_TICKER_URL,
            _ => SPOT_TICKER_URL,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

#[derive(Debug, Deserialize)]
struct ArrTicker {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    last_price: String,
    #[serde(rename = "o")]
    open_24h: String,
}

#[async_trait]
impl PriceExchange for BinancePriceAdapter {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn bootstrap(&self) -> Result<Vec<Instrument>, DataError> {
        let tickers: Vec<TickerPrice> = self
            .client
            .get(self.ticker_url())
            .send()
            .await
            .map_err(marketpulse_integration::SocketError::from)?
            .json()
            .await
            .map_err(marketpulse_integration::SocketError::from)?;

        // `/ticker/price` carries no 24h-open figure; the `!ticker@arr` websocket stream fills
        // it in on the first push right after this bootstrap completes.
        Ok(tickers
            .into_iter()
            .filter_map(|ticker| {
                let last_price = Decimal::from_str(&ticker.price).ok()?;
                Some(Instrument::new(
                    ticker.symbol,
                    self.trade_type,
                    last_price,
                    Decimal::ZERO,
                ))
            })
            .collect())
    }

    async fn stream_once(&self, index: &PriceIndex, stop: &StopSignal) -> Result<(), DataError> {
        let mut ws = websocket::connect(WS_TICKER_STREAM).await?;
        let set = index.exchange(ExchangeId::Binance);

        loop {
            tokio::select! {
                _ = stop.wait_stopped() => {
                    let _ = ws.close(None).await;
                    return Ok(());
                }
                message = ws.next() => {
                    let Some(message) = message else { return Ok(()) };
                    match websocket::parse::<Vec<ArrTicker>>(message) {
                        Some(Ok(tickers)) => {
                            for ticker in tickers {
                                let (Ok(last), Ok(open)) = (
                                    Decimal::from_str(&ticker.last_price),
                                    Decimal::from_str(&ticker.open_24h),
                                ) else {
                                    continue;
                                };
                                set.insert(Instrument::new(ticker.symbol, self.trade_type, last, open));
                            }
                        }
                        Some(Err(error)) => return Err(error.into()),
                        None => {}
                    }
                }
            }
        }
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs(3)
    }
}

#[derive(Debug, Deserialize)]
struct ListenKeyResponse {
    #[serde(rename = "listenKey")]
    listen_key: String,
}

async fn obtain_listen_key(
    client: &reqwest::Client,
    credential: &AccountCredential,
) -> Result<String, DataError> {
    let response: ListenKeyResponse = client
        .post(USER_DATA_STREAM_URL)
        .header("X-MBX-APIKEY", &credential.api_key)
        .send()
        .await
        .map_err(marketpulse_integration::SocketError::from)?
        .json()
        .await
        .map_err(marketpulse_integration::SocketError::from)?;
    Ok(response.listen_key)
}

async fn renew_listen_key(
    client: &reqwest::Client,
    credential: &AccountCredential,
    listen_key: &str,
) -> Result<(), DataError> {
    let url = format!("{USER_DATA_STREAM_URL}?listenKey={listen_key}");
    client
        .put(url)
        .header("X-MBX-APIKEY", &credential.api_key)
        .send()
        .await
        .map_err(marketpulse_integration::SocketError::from)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
enum UserDataEvent {
    #[serde(rename = "executionReport")]
    ExecutionReport {
        s: String,
        i: u64,
        #[serde(rename = "S")]
        side: String,
        #[serde(rename = "X")]
        order_status: String,
        p: String,
        q: String,
        z: String,
    },
    #[serde(rename = "balanceUpdate")]
    BalanceUpdate { a: String, d: String },
    #[serde(rename = "outboundAccountPosition")]
    OutboundAccountPosition { #[serde(rename = "B")] balances: Vec<BalanceEntry> },
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    a: String,
    f: String,
    l: String,
}

fn dispatch_user_data_event(user_id: &str, event: UserDataEvent) -> Vec<AccountEvent> {
    match event {
        UserDataEvent::ExecutionReport {
            s,
            i,
            side,
            order_status,
            p,
            q,
            z,
        } => vec![AccountEvent::OrderUpdate(OrderUpdate {
            user_id: user_id.to_string(),
            symbol: s,
            order_id: i.to_string(),
            side,
            order_status,
            price: p,
            quantity: q,
            filled_quantity: z,
        })],
        UserDataEvent::BalanceUpdate { a, d } => vec![AccountEvent::BalanceUpdate(BalanceUpdate {
            user_id: user_id.to_string(),
            asset: a,
            delta: d,
        })],
        // Expanded into one record per asset entry (§4.A).
        UserDataEvent::OutboundAccountPosition { balances } => balances
            .into_iter()
            .map(|entry| {
                AccountEvent::AccountPosition(AccountPosition {
                    user_id: user_id.to_string(),
                    asset: entry.a,
                    free: entry.f,
                    locked: entry.l,
                })
            })
            .collect(),
    }
}

/// Run the Binance account adapter until `stop` is signalled, publishing [`AccountEvent`]s to
/// `tx`. Caller is the per-exchange dispatch loop in `marketpulse-scheduler`.
pub async fn run_binance_account_stream<T>(
    credential: Arc<AccountCredential>,
    tx: T,
    stop: &StopSignal,
) -> Result<(), DataError>
where
    T: Tx<Item = AccountEvent>,
{
    let client = reqwest::Client::new();
    let listen_key = obtain_listen_key(&client, &credential).await?;
    let url = format!("wss://stream.binance.com:9443/ws/{listen_key}");
    let mut ws = websocket::connect(url).await?;
    let mut renewal = tokio::time::interval(LISTEN_KEY_RENEWAL);
    renewal.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            _ = stop.wait_stopped() => {
                let _ = ws.close(None).await;
                return Ok(());
            }
            _ = renewal.tick() => {
                if let Err(error) = renew_listen_key(&client, &credential, &listen_key).await {
                    warn!(%error, "listenKey renewal failed, letting the socket drop to reconnect");
                    return Err(error);
                }
                debug!("renewed binance listenKey");
            }
            message = ws.next() => {
                let Some(message) = message else { return Ok(()) };
                if let Ok(WsMessage::Ping(payload)) = &message {
                    let _ = ws.send(WsMessage::Pong(payload.clone())).await;
                    continue;
                }
                match websocket::parse::<UserDataEvent>(message) {
                    Some(Ok(event)) => {
                        for account_event in dispatch_user_data_event(&credential.user_id, event) {
                            if tx.send(account_event).is_err() {
                                return Ok(());
                            }
                        }
                    }
                    Some(Err(error)) => return Err(error.into()),
                    None => {}
                }
            }
        }
    }
}

/// Spawn [`run_binance_account_stream`] as a supervised, reconnecting task (§4.A reconnection
/// policy: 10 s cooldown, no backoff).
pub fn run_binance_account_adapter<T>(credential: AccountCredential, tx: T) -> AdapterHandle
where
    T: Tx<Item = AccountEvent> + 'static,
{
    let stop = StopSignal::new();
    let task_stop = stop.clone();
    let credential = Arc::new(credential);

    let join = tokio::spawn(async move {
        loop {
            if task_stop.is_stopped() {
                break;
            }
            if let Err(error) =
                run_binance_account_stream(credential.clone(), tx.clone(), &task_stop).await
            {
                warn!(%error, "binance account stream ended with error");
            }
            if task_stop.is_stopped() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(10)) => {},
                _ = task_stop.wait_stopped() => {},
            }
        }
        info!("binance account adapter stopped");
    });

    AdapterHandle::from_parts(stop, join)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_report_maps_to_order_update() {
        let event: UserDataEvent = serde_json::from_str(
            r#"{"e":"executionReport","s":"BTCUSDT","i":1,"S":"BUY","X":"FILLED","p":"100.5","q":"0.01","z":"0.01"}"#,
        )
        .unwrap();
        let events = dispatch_user_data_event("u1", event);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AccountEvent::OrderUpdate(_)));
    }

    #[test]
    fn test_outbound_account_position_expands_per_asset() {
        let event: UserDataEvent = serde_json::from_str(
            r#"{"e":"outboundAccountPosition","B":[{"a":"BTC","f":"1","l":"0"},{"a":"USDT","f":"100","l":"0"}]}"#,
        )
        .unwrap();
        let events = dispatch_user_data_event("u1", event);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, AccountEvent::AccountPosition(_))));
    }
}
