//! KuCoin price & account adapters (§4.A).

use crate::account_event::{AccountEvent, OrderUpdate};
use crate::adapter::{AdapterHandle, PriceExchange, StopSignal};
use crate::error::DataError;
use crate::index::PriceIndex;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use marketpulse_instrument::{AccountCredential, ExchangeId, Instrument, TradeType};
use marketpulse_integration::channel::Tx;
use marketpulse_integration::protocol::websocket::{self, WsMessage};
use marketpulse_integration::signing::{epoch_millis, hmac_sha256_base64};
use marketpulse_integration::SocketError;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const BULLET_PUBLIC_URL: &str = "https://api.kucoin.com/api/v1/bullet-public";
const BULLET_PRIVATE_URL: &str = "https://api.kucoin.com/api/v1/bullet-private";

#[derive(Debug, Deserialize)]
struct BulletResponse {
    data: BulletData,
}

#[derive(Debug, Deserialize)]
struct BulletData {
    token: String,
    #[serde(rename = "instanceServers")]
    instance_servers: Vec<InstanceServer>,
}

#[derive(Debug, Clone, Deserialize)]
struct InstanceServer {
    endpoint: String,
    encrypt: bool,
    #[serde(rename = "pingInterval")]
    ping_interval: u64,
}

fn connect_id() -> String {
    let mut rng = rand::rng();
    (0..10)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect()
}

fn kucoin_signing_headers(
    credential: &AccountCredential,
    method: &str,
    path: &str,
    body: &str,
) -> Result<Vec<(&'static str, String)>, DataError> {
    let passphrase = credential.passphrase.as_deref().ok_or_else(|| {
        DataError::Bootstrap {
            exchange: ExchangeId::Kucoin,
            reason: "credential missing required passphrase".into(),
        }
    })?;
    let timestamp = epoch_millis().to_string();
    let prehash = format!("{timestamp}{method}{path}{body}");
    Ok(vec![
        ("KC-API-TIMESTAMP", timestamp),
        ("KC-API-KEY", credential.api_key.clone()),
        (
            "KC-API-PASSPHRASE",
            hmac_sha256_base64(&credential.secret_key, passphrase),
        ),
        ("KC-API-SIGN", hmac_sha256_base64(&credential.secret_key, &prehash)),
        ("KC-API-KEY-VERSION", "2".to_string()),
    ])
}

async fn bullet_public(client: &reqwest::Client) -> Result<BulletData, DataError> {
    let response: BulletResponse = client
        .post(BULLET_PUBLIC_URL)
        .send()
        .await
        .map_err(SocketError::from)?
        .json()
        .await
        .map_err(SocketError::from)?;
    Ok(response.data)
}

async fn bullet_private(
    client: &reqwest::Client,
    credential: &AccountCredential,
) -> Result<BulletData, DataError> {
    let headers = kucoin_signing_headers(credential, "POST", "/api/v1/bullet-private", "")?;
    let mut request = client.post(BULLET_PRIVATE_URL);
    for (name, value) in headers {
        request = request.header(name, value);
    }
    let response: BulletResponse = request
        .send()
        .await
        .map_err(SocketError::from)?
        .json()
        .await
        .map_err(SocketError::from)?;
    Ok(response.data)
}

fn pick_tls_instance(data: &BulletData) -> Result<InstanceServer, DataError> {
    data.instance_servers
        .iter()
        .find(|server| server.encrypt)
        .cloned()
        .ok_or_else(|| DataError::Bootstrap {
            exchange: ExchangeId::Kucoin,
            reason: "no TLS-capable instanceServer advertised".into(),
        })
}

#[derive(Debug, Serialize)]
struct SubscribeMessage {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    topic: String,
    #[serde(rename = "privateChannel")]
    private_channel: bool,
    response: bool,
}

fn subscribe_message(id: u64, topic: impl Into<String>, private: bool) -> SubscribeMessage {
    SubscribeMessage {
        id: id.to_string(),
        kind: "subscribe",
        topic: topic.into(),
        private_channel: private,
        response: true,
    }
}

#[derive(Debug, Deserialize)]
struct PushMessage {
    #[serde(rename = "type")]
    kind: String,
    topic: Option<String>,
    data: Option<serde_json::Value>,
}

/// Price adapter: subscribes to the all-symbols ticker topic (§4.A "KuCoin (price and account)").
#[derive(Debug)]
pub struct KucoinPriceAdapter {
    client: reqwest::Client,
}

impl KucoinPriceAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for KucoinPriceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceExchange for KucoinPriceAdapter {
    fn name(&self) -> &'static str {
        "kucoin"
    }

    async fn bootstrap(&self) -> Result<Vec<Instrument>, DataError> {
        Ok(Vec::new())
    }

    async fn stream_once(&self, index: &PriceIndex, stop: &StopSignal) -> Result<(), DataError> {
        let bullet = bullet_public(&self.client).await?;
        let instance = pick_tls_instance(&bullet)?;
        let url = format!(
            "{}?token={}&connectId={}",
            instance.endpoint,
            bullet.token,
            connect_id()
        );
        let mut ws = websocket::connect(url).await?;
        let mut ping = tokio::time::interval(Duration::from_millis(instance.ping_interval));
        ping.tick().await;

        let subscribe = subscribe_message(1, "/market/ticker:all", false);
        ws.send(WsMessage::text(serde_json::to_string(&subscribe).map_err(
            SocketError::Serialise,
        )?))
        .await
        .map_err(|error| SocketError::WebSocket(Box::new(error)))?;

        let set = index.exchange(ExchangeId::Kucoin);

        loop {
            tokio::select! {
                _ = stop.wait_stopped() => {
                    let _ = ws.close(None).await;
                    return Ok(());
                }
                _ = ping.tick() => {
                    let _ = ws.send(WsMessage::text(r#"{"id":"ping","type":"ping"}"#)).await;
                }
                message = ws.next() => {
                    let Some(message) = message else { return Ok(()) };
                    match websocket::parse::<PushMessage>(message) {
                        Some(Ok(push)) if push.kind == "message" => {
                            if let (Some(topic), Some(data)) = (push.topic, push.data) {
                                if let Some(instrument) = parse_ticker(&topic, &data) {
                                    set.insert(instrument);
                                }
                            }
                        }
                        Some(Ok(_)) => {}
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

fn parse_ticker(topic: &str, data: &serde_json::Value) -> Option<Instrument> {
    let symbol = topic.strip_prefix("/market/ticker:")?;
    if symbol == "all" {
        return None;
    }
    let last_price = Decimal::from_str(data.get("price")?.as_str()?).ok()?;
    let open_24h = data
        .get("open")
        .and_then(|v| v.as_str())
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO);
    Some(Instrument::new(symbol, TradeType::Spot, last_price, open_24h))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountStage {
    None,
    PrivOrder,
    Balance,
    StopOrder,
    Done,
}

impl AccountStage {
    fn next_topic(self) -> Option<(&'static str, AccountStage)> {
        match self {
            AccountStage::None => Some(("/spotMarket/tradeOrders", AccountStage::PrivOrder)),
            AccountStage::PrivOrder => Some(("/account/balance", AccountStage::Balance)),
            AccountStage::Balance => Some(("/spotMarket/advancedOrders", AccountStage::StopOrder)),
            AccountStage::StopOrder | AccountStage::Done => None,
        }
    }
}

/// Run the KuCoin account adapter until `stop` is signalled (§4.A stage machine
/// `none -> priv-order -> balance -> stop-order -> done`).
pub async fn run_kucoin_account_stream<T>(
    credential: Arc<AccountCredential>,
    tx: T,
    stop: &StopSignal,
) -> Result<(), DataError>
where
    T: Tx<Item = AccountEvent>,
{
    let client = reqwest::Client::new();
    let bullet = bullet_private(&client, &credential).await?;
    let instance = pick_tls_instance(&bullet)?;
    let url = format!(
        "{}?token={}&connectId={}",
        instance.endpoint,
        bullet.token,
        connect_id()
    );
    let mut ws = websocket::connect(url).await?;
    let mut ping = tokio::time::interval(Duration::from_millis(instance.ping_interval));
    ping.tick().await;

    let mut stage = AccountStage::None;
    let mut next_id = 1u64;
    if let Some((topic, advanced)) = stage.next_topic() {
        let subscribe = subscribe_message(next_id, topic, true);
        next_id += 1;
        ws.send(WsMessage::text(
            serde_json::to_string(&subscribe).map_err(SocketError::Serialise)?,
        ))
        .await
        .map_err(|error| SocketError::WebSocket(Box::new(error)))?;
        stage = advanced;
    }

    loop {
        tokio::select! {
            _ = stop.wait_stopped() => {
                let _ = ws.close(None).await;
                return Ok(());
            }
            _ = ping.tick() => {
                let _ = ws.send(WsMessage::text(r#"{"id":"ping","type":"ping"}"#)).await;
            }
            message = ws.next() => {
                let Some(message) = message else { return Ok(()) };
                match websocket::parse::<PushMessage>(message) {
                    Some(Ok(push)) if push.kind == "ack" => {
                        if let Some((topic, advanced)) = stage.next_topic() {
                            let subscribe = subscribe_message(next_id, topic, true);
                            next_id += 1;
                            ws.send(WsMessage::text(
                                serde_json::to_string(&subscribe).map_err(SocketError::Serialise)?,
                            ))
                            .await
                            .map_err(|error| SocketError::WebSocket(Box::new(error)))?;
                            stage = advanced;
                        } else if stage == AccountStage::StopOrder {
                            stage = AccountStage::Done;
                            debug!("kucoin account subscription sequence complete");
                        }
                    }
                    Some(Ok(push)) if push.kind == "message" => {
                        if let Some(data) = push.data {
                            if let Some(event) = parse_account_push(&credential.user_id, &data) {
                                if tx.send(event).is_err() {
                                    return Ok(());
                                }
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => return Err(error.into()),
                    None => {}
                }
            }
        }
    }
}

fn parse_account_push(user_id: &str, data: &serde_json::Value) -> Option<AccountEvent> {
    Some(AccountEvent::OrderUpdate(OrderUpdate {
        user_id: user_id.to_string(),
        symbol: data.get("symbol")?.as_str()?.to_string(),
        order_id: data.get("orderId")?.as_str()?.to_string(),
        side: data.get("side").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        order_status: data.get("status").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        price: data.get("price").and_then(|v| v.as_str()).unwrap_or("0").to_string(),
        quantity: data.get("size").and_then(|v| v.as_str()).unwrap_or("0").to_string(),
        filled_quantity: data
            .get("filledSize")
            .and_then(|v| v.as_str())
            .unwrap_or("0")
            .to_string(),
    }))
}

/// Spawn [`run_kucoin_account_stream`] as a supervised, reconnecting task.
pub fn run_kucoin_account_adapter<T>(credential: AccountCredential, tx: T) -> AdapterHandle
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
                run_kucoin_account_stream(credential.clone(), tx.clone(), &task_stop).await
            {
                warn!(%error, "kucoin account stream ended with error");
            }
            if task_stop.is_stopped() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(10)) => {},
                _ = task_stop.wait_stopped() => {},
            }
        }
        info!("kucoin account adapter stopped");
    });

    AdapterHandle::from_parts(stop, join)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_headers_require_passphrase() {
        let credential = AccountCredential::new("u1", "key", "secret", None);
        let result = kucoin_signing_headers(&credential, "POST", "/api/v1/bullet-private", "");
        assert!(result.is_err());
    }

    #[test]
    fn test_signing_headers_present_with_passphrase() {
        let credential = AccountCredential::new("u1", "key", "secret", Some("pass".into()));
        let headers = kucoin_signing_headers(&credential, "POST", "/api/v1/bullet-private", "").unwrap();
        let names: Vec<_> = headers.iter().map(|(name, _)| *name).collect();
        assert!(names.contains(&"KC-API-SIGN"));
        assert!(names.contains(&"KC-API-PASSPHRASE"));
        assert!(names.contains(&"KC-API-KEY-VERSION"));
    }

    #[test]
    fn test_account_stage_sequence() {
        let mut stage = AccountStage::None;
        let (_, next) = stage.next_topic().unwrap();
        stage = next;
        assert_eq!(stage, AccountStage::PrivOrder);
        let (_, next) = stage.next_topic().unwrap();
        stage = next;
        assert_eq!(stage, AccountStage::Balance);
        let (_, next) = stage.next_topic().unwrap();
        stage = next;
        assert_eq!(stage, AccountStage::StopOrder);
        assert!(stage.next_topic().is_none());
    }

    #[test]
    fn test_parse_ticker_skips_all_symbols_summary() {
        let value = serde_json::json!({"price": "1.0", "open": "1.0"});
        assert!(parse_ticker("/market/ticker:all", &value).is_none());
        assert!(parse_ticker("/market/ticker:BTC-USDT", &value).is_some());
    }
}
