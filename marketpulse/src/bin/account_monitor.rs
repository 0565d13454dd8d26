//! The account task scheduler process (§4.D, §5): one [`AccountDispatcher`] per exchange, each
//! reading `AccountTask` commands off its own broker endpoint and owning that exchange's live
//! account-adapter list.

use marketpulse::{Config, logging};
use marketpulse_broker::{BrokerError, Endpoint, Publisher, Subscriber};
use marketpulse_data::AccountEvent;
use marketpulse_data::exchange_binance::run_binance_account_adapter;
use marketpulse_data::exchange_kucoin::run_kucoin_account_adapter;
use marketpulse_data::exchange_okx::run_okx_account_adapter;
use marketpulse_instrument::ExchangeId;
use marketpulse_integration::channel::{UnboundedTx, mpsc_unbounded};
use marketpulse_scheduler::task::{AccountTask, AccountTaskResult};
use marketpulse_scheduler::{AccountDispatcher, run_account_dispatcher};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    logging::init_logging_from_env();
    let config = Config::from_env();

    let binance = tokio::spawn(run_binance(config.broker_base_dir.clone()));
    let kucoin = tokio::spawn(run_kucoin(config.broker_base_dir.clone()));
    let okx = tokio::spawn(run_okx(config.broker_base_dir.clone()));

    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c, shutting down anyway");
    }
    info!("account_monitor shutting down");
    binance.abort();
    kucoin.abort();
    okx.abort();
}

/// Fan events out of a dispatcher's synchronous [`Tx`](marketpulse_integration::channel::Tx) sink
/// onto its `account-result/<exchange>` broker endpoint, since [`Publisher::publish`] is async and
/// the dispatcher's spawn closures only hand adapters a synchronous sender.
fn spawn_event_relay(publisher: Publisher<AccountEvent>) -> UnboundedTx<AccountEvent> {
    let (tx, mut rx) = mpsc_unbounded::<AccountEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(error) = publisher.publish(&event).await {
                warn!(%error, "failed to publish account event");
            }
        }
    });
    tx
}

async fn bind_dispatcher_io(
    exchange: ExchangeId,
    base_dir: &Path,
) -> Result<
    (
        Subscriber<AccountTask>,
        Publisher<AccountTaskResult>,
        Publisher<AccountEvent>,
    ),
    BrokerError,
> {
    let task_rx = Subscriber::<AccountTask>::connect(Endpoint::AccountTask(exchange), base_dir).await?;
    let result_tx = Publisher::<AccountTaskResult>::bind(Endpoint::TaskStatusWriter, base_dir).await?;
    let event_tx = Publisher::<AccountEvent>::bind(Endpoint::AccountResult(exchange), base_dir).await?;
    Ok((task_rx, result_tx, event_tx))
}

async fn run_binance(base_dir: PathBuf) {
    let (task_rx, result_tx, event_publisher) = match bind_dispatcher_io(ExchangeId::Binance, &base_dir).await {
        Ok(io) => io,
        Err(error) => return error!(%error, "failed to bind binance account IPC"),
    };
    let events = spawn_event_relay(event_publisher);
    let dispatcher = AccountDispatcher::new(ExchangeId::Binance, run_binance_account_adapter, events);
    run_account_dispatcher(dispatcher, task_rx, result_tx).await;
}

async fn run_kucoin(base_dir: PathBuf) {
    let (task_rx, result_tx, event_publisher) = match bind_dispatcher_io(ExchangeId::Kucoin, &base_dir).await {
        Ok(io) => io,
        Err(error) => return error!(%error, "failed to bind kucoin account IPC"),
    };
    let events = spawn_event_relay(event_publisher);
    let dispatcher = AccountDispatcher::new(ExchangeId::Kucoin, run_kucoin_account_adapter, events);
    run_account_dispatcher(dispatcher, task_rx, result_tx).await;
}

async fn run_okx(base_dir: PathBuf) {
    let (task_rx, result_tx, event_publisher) = match bind_dispatcher_io(ExchangeId::Okx, &base_dir).await {
        Ok(io) => io,
        Err(error) => return error!(%error, "failed to bind okx account IPC"),
    };
    let events = spawn_event_relay(event_publisher);
    let dispatcher = AccountDispatcher::new(ExchangeId::Okx, run_okx_account_adapter, events);
    run_account_dispatcher(dispatcher, task_rx, result_tx).await;
}
