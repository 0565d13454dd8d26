//! OKX price & account adapters (§4.A).

use crate::account_event::{AccountEvent, BalanceData, OrderUpdate};
use crate::adapter::{AdapterHandle, PriceExchange, StopSignal};
use crate::error::DataError;
use crate::index::PriceIndex;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use marketpulse_instrument::{AccountCredential, ExchangeId, Instrument, TradeType};
use marketpulse_integration::channel::Tx;
use marketpulse_integration::protocol::websocket::{self, WsMessage};
use marketpulse_integration::signing::{epoch_seconds, hmac_sha256_base64};
use marketpulse_integration::SocketError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const WS_PUBLIC_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";
const WS_PRIVATE_URL: &str = "wss://ws.okx.com:8443/ws/v5/private";
const INST_TYPES: [&str; 3] = ["SPOT", "SWAP", "FUTURES"];

fn inst_type_to_trade_type(inst_type: &str) -> TradeType {
    match inst_type {
        "SWAP" => TradeType::Swap,
        "FUTURES" => TradeType::Futures,
        _ => TradeType::Spot,
    }
}

#[derive(Debug, Deserialize)]
struct OkxPush {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    arg: Option<OkxArg>,
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct OkxArg {
    channel: String,
    #[serde(default)]
    #[serde(rename = "instType")]
    inst_type: Option<String>,
}

/// Price adapter: learns `instId`s from the `instruments` channel, then streams `tickers`
/// (§4.A "OKX (price)").
#[derive(Debug, Default)]
pub struct OkxPriceAdapter;

impl OkxPriceAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PriceExchange for OkxPriceAdapter {
    fn name(&self) -> &'static str {
        "okx"
    }

    async fn bootstrap(&self) -> Result<Vec<Instrument>, DataError> {
        Ok(Vec::new())
    }

    async fn stream_once(&self, index: &PriceIndex, stop: &StopSignal) -> Result<(), DataError> {
        let mut ws = websocket::connect(WS_PUBLIC_URL).await?;

        let subscribe_instruments = json!({
            "op": "subscribe",
            "args": INST_TYPES.iter().map(|t| json!({"channel": "instruments", "instType": t})).collect::<Vec<_>>(),
        });
        send_json(&mut ws, &subscribe_instruments).await?;

        let mut known_ids: HashSet<String> = HashSet::new();
        let set = index.exchange(ExchangeId::Okx);

        loop {
            tokio::select! {
                _ = stop.wait_stopped() => {
                    let _ = ws.close(None).await;
                    return Ok(());
                }
                message = ws.next() => {
                    let Some(message) = message else { return Ok(()) };
                    match websocket::parse::<OkxPush>(message) {
                        Some(Ok(push)) => {
                            let Some(arg) = &push.arg else { continue };
                            match arg.channel.as_str() {
                                "instruments" => {
                                    if let Some(data) = &push.data {
                                        let mut new_ids = Vec::new();
                                        for entry in data {
                                            if let Some(inst_id) = entry.get("instId").and_then(|v| v.as_str()) {
                                                if known_ids.insert(inst_id.to_string()) {
                                                    new_ids.push(inst_id.to_string());
                                                }
                                            }
                                        }
                                        if !new_ids.is_empty() {
                                            let subscribe_tickers = json!({
                                                "op": "subscribe",
                                                "args": new_ids.iter().map(|id| json!({"channel": "tickers", "instId": id})).collect::<Vec<_>>(),
                                            });
                                            send_json(&mut ws, &subscribe_tickers).await?;
                                        }
                                    }
                                }
                                "tickers" => {
                                    if let Some(data) = &push.data {
                                        for entry in data {
                                            if let Some(instrument) = parse_ticker(entry) {
                                                set.insert(instrument);
                                            }
                                        }
                                    }
                                }
                                _ => {}
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

fn parse_ticker(entry: &serde_json::Value) -> Option<Instrument> {
    let inst_id = entry.get("instId")?.as_str()?;
    let inst_type = entry.get("instType").and_then(|v| v.as_str()).unwrap_or("SPOT");
    let last = Decimal::from_str(entry.get("last")?.as_str()?).ok()?;
    let open = entry
        .get("sodUtc8")
        .and_then(|v| v.as_str())
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO);
    Some(Instrument::new(
        inst_id,
        inst_type_to_trade_type(inst_type),
        last,
        open,
    ))
}

async fn send_json(
    ws: &mut websocket::WebSocket,
    value: &serde_json::Value,
) -> Result<(), DataError> {
    ws.send(WsMessage::text(value.to_string()))
        .await
        .map_err(|error| SocketError::WebSocket(Box::new(error)).into())
}

#[derive(Debug, Serialize)]
struct LoginArg {
    #[serde(rename = "apiKey")]
    api_key: String,
    passphrase: String,
    timestamp: String,
    sign: String,
}

fn login_message(credential: &AccountCredential) -> Result<(serde_json::Value, String), DataError> {
    let passphrase = credential.passphrase.clone().ok_or_else(|| DataError::Bootstrap {
        exchange: ExchangeId::Okx,
        reason: "credential missing required passphrase".into(),
    })?;
    let timestamp = epoch_seconds();
    let prehash = format!("{timestamp}GET/users/self/verify");
    let sign = hmac_sha256_base64(&credential.secret_key, &prehash);
    let arg = LoginArg {
        api_key: credential.api_key.clone(),
        passphrase,
        timestamp: timestamp.clone(),
        sign,
    };
    Ok((json!({"op": "login", "args": [arg]}), timestamp))
}

/// Run the OKX account adapter until `stop` is signalled: login, then `orders`, then (after the
/// first data push) `balance_and_position` (§4.A "OKX (account)").
pub async fn run_okx_account_stream<T>(
    credential: Arc<AccountCredential>,
    tx: T,
    stop: &StopSignal,
) -> Result<(), DataError>
where
    T: Tx<Item = AccountEvent>,
{
    let mut ws = websocket::connect(WS_PRIVATE_URL).await?;
    let (login, _timestamp) = login_message(&credential)?;
    send_json(&mut ws, &login).await?;

    let mut logged_in = false;
    let mut subscribed_balance = false;

    loop {
        tokio::select! {
            _ = stop.wait_stopped() => {
                let _ = ws.close(None).await;
                return Ok(());
            }
            message = ws.next() => {
                let Some(message) = message else { return Ok(()) };
                match websocket::parse::<OkxPush>(message) {
                    Some(Ok(push)) => {
                        if push.event.as_deref() == Some("login") {
                            if push.code.as_deref() == Some("0") {
                                logged_in = true;
                                let subscribe_orders = json!({
                                    "op": "subscribe",
                                    "args": [{"channel": "orders", "instType": "ANY"}],
                                });
                                send_json(&mut ws, &subscribe_orders).await?;
                            } else {
                                warn!(code = ?push.code, msg = ?push.msg, "okx login rejected");
                                return Err(SocketError::Auth(format!("okx login rejected: {:?}", push.code)).into());
                            }
                            continue;
                        }
                        let Some(arg) = &push.arg else { continue };
                        match arg.channel.as_str() {
                            "orders" => {
                                if let Some(data) = &push.data {
                                    for entry in data {
                                        if let Some(event) = parse_order(&credential.user_id, entry) {
                                            if tx.send(event).is_err() {
                                                return Ok(());
                                            }
                                        }
                                    }
                                }
                                if logged_in && !subscribed_balance {
                                    subscribed_balance = true;
                                    let subscribe_balance = json!({
                                        "op": "subscribe",
                                        "args": [{"channel": "balance_and_position"}],
                                    });
                                    send_json(&mut ws, &subscribe_balance).await?;
                                }
                            }
                            "balance_and_position" => {
                                if let Some(data) = &push.data {
                                    for entry in data {
                                        for event in parse_balance_and_position(&credential.user_id, entry) {
                                            if tx.send(event).is_err() {
                                                return Ok(());
                                            }
                                        }
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    Some(Err(error)) => return Err(error.into()),
                    None => {}
                }
            }
        }
    }
}

fn parse_order(user_id: &str, entry: &serde_json::Value) -> Option<AccountEvent> {
    Some(AccountEvent::OrderUpdate(OrderUpdate {
        user_id: user_id.to_string(),
        symbol: entry.get("instId")?.as_str()?.to_string(),
        order_id: entry.get("ordId")?.as_str()?.to_string(),
        side: entry.get("side").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        order_status: entry.get("state").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        price: entry.get("px").and_then(|v| v.as_str()).unwrap_or("0").to_string(),
        quantity: entry.get("sz").and_then(|v| v.as_str()).unwrap_or("0").to_string(),
        filled_quantity: entry
            .get("accFillSz")
            .and_then(|v| v.as_str())
            .unwrap_or("0")
            .to_string(),
    }))
}

fn parse_balance_and_position(user_id: &str, entry: &serde_json::Value) -> Vec<AccountEvent> {
    entry
        .get("balData")
        .and_then(|v| v.as_array())
        .map(|balances| {
            balances
                .iter()
                .filter_map(|bal| {
                    Some(AccountEvent::BalanceData(BalanceData {
                        user_id: user_id.to_string(),
                        currency: bal.get("ccy")?.as_str()?.to_string(),
                        cash_balance: bal.get("cashBal").and_then(|v| v.as_str()).unwrap_or("0").to_string(),
                    }))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Spawn [`run_okx_account_stream`] as a supervised, reconnecting task.
pub fn run_okx_account_adapter<T>(credential: AccountCredential, tx: T) -> AdapterHandle
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
                run_okx_account_stream(credential.clone(), tx.clone(), &task_stop).await
            {
                warn!(%error, "okx account stream ended with error");
            }
            if task_stop.is_stopped() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(10)) => {},
                _ = task_stop.wait_stopped() => {},
            }
        }
        info!("okx account adapter stopped");
    });

    AdapterHandle::from_parts(stop, join)
}
