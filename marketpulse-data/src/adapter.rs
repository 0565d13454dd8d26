use crate::error::DataError;
use crate::index::PriceIndex;
use async_trait::async_trait;
use marketpulse_instrument::{ExchangeId, Instrument};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A cooperative stop flag shared between an [`AdapterHandle`] and its running task.
///
/// `stop()` is idempotent (§5 Cancellation): setting an already-set flag and notifying already
/// idle waiters are both no-ops in effect.
#[derive(Debug, Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Resolve once [`StopSignal::stop`] has been called; resolves immediately if already stopped.
    pub async fn wait_stopped(&self) {
        while !self.is_stopped() {
            self.notify.notified().await;
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A live price adapter, as returned by [`run_price_adapter`].
///
/// Dropping the handle does not stop the adapter - call [`AdapterHandle::stop`] explicitly.
#[derive(Debug)]
pub struct AdapterHandle {
    stop: StopSignal,
    join: JoinHandle<()>,
}

impl AdapterHandle {
    /// Assemble a handle around a task spawned by a bespoke (non-[`PriceExchange`]) adapter loop,
    /// e.g. the per-exchange account adapters in `exchange_binance`/`exchange_kucoin`/`exchange_okx`,
    /// or a fake adapter in a downstream crate's tests.
    pub fn from_parts(stop: StopSignal, join: JoinHandle<()>) -> Self {
        Self { stop, join }
    }

    /// Idempotent teardown request (§4.A public contract).
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Await the adapter's supervising task to exit after [`AdapterHandle::stop`].
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Capability set a price adapter must implement, driven by the generic reconnect loop in
/// [`run_price_adapter`] (§9 Design Notes: "a single generic state machine" over small per-exchange
/// structs rather than one sprawling trait shared with the account side, whose handshakes diverge
/// too much to unify).
#[async_trait]
pub trait PriceExchange: Send + Sync + 'static {
    /// Display name for logging, e.g. `"binance"`.
    fn name(&self) -> &'static str;

    /// REST bootstrap (`resolving -> connecting -> tls`): populate the instrument set before the
    /// websocket is opened.
    async fn bootstrap(&self) -> Result<Vec<Instrument>, DataError>;

    /// `ws-upgrade -> subscribing -> running <-> keepalive`: open the websocket, subscribe, and
    /// stream ticks into `index` until disconnected, an unrecoverable error occurs, or `stop` is
    /// signalled (in which case this should return `Ok(())`).
    async fn stream_once(&self, index: &PriceIndex, stop: &StopSignal) -> Result<(), DataError>;

    /// Cooldown before the next reconnect attempt. Price streams reconnect faster than account
    /// streams (§4.A: "price streams: 2-5 s").
    fn cooldown(&self) -> Duration {
        Duration::from_secs(3)
    }
}

/// Drive `exchange`'s `PriceExchange` impl through the `idle -> ... -> cooldown -> idle` cycle
/// (§4.A) until stopped, publishing ticks into `index`.
pub fn run_price_adapter<E>(
    exchange_id: ExchangeId,
    adapter: Arc<E>,
    index: Arc<PriceIndex>,
) -> AdapterHandle
where
    E: PriceExchange,
{
    let stop = StopSignal::new();
    let task_stop = stop.clone();

    let join = tokio::spawn(async move {
        loop {
            if task_stop.is_stopped() {
                break;
            }

            match adapter.bootstrap().await {
                Ok(initial) => {
                    let set = index.exchange(exchange_id);
                    for instrument in initial {
                        set.insert(instrument);
                    }
                }
                Err(error) => {
                    warn!(exchange = adapter.name(), %error, "bootstrap failed, entering cooldown");
                    cooldown(&adapter, &task_stop).await;
                    continue;
                }
            }

            if let Err(error) = adapter.stream_once(&index, &task_stop).await {
                warn!(exchange = adapter.name(), %error, "price stream ended with error");
            }

            if task_stop.is_stopped() {
                break;
            }
            cooldown(&adapter, &task_stop).await;
        }
        info!(exchange = adapter.name(), "price adapter stopped");
    });

    AdapterHandle { stop, join }
}

async fn cooldown<E: PriceExchange>(adapter: &E, stop: &StopSignal) {
    tokio::select! {
        _ = tokio::time::sleep(adapter.cooldown()) => {},
        _ = stop.wait_stopped() => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_instrument::TradeType;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Duration as StdDuration;

    struct FlakyThenOk {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl PriceExchange for FlakyThenOk {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn bootstrap(&self) -> Result<Vec<Instrument>, DataError> {
            Ok(vec![Instrument::new(
                "BTCUSDT",
                TradeType::Spot,
                rust_decimal::Decimal::ONE,
                rust_decimal::Decimal::ONE,
            )])
        }

        async fn stream_once(&self, _index: &PriceIndex, stop: &StopSignal) -> Result<(), DataError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt == 0 {
                return Err(DataError::Bootstrap {
                    exchange: ExchangeId::Binance,
                    reason: "simulated disconnect".into(),
                });
            }
            stop.stop();
            Ok(())
        }

        fn cooldown(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    #[tokio::test]
    async fn test_adapter_reconnects_after_stream_error_then_stops() {
        let index = Arc::new(PriceIndex::new());
        let adapter = Arc::new(FlakyThenOk {
            attempts: AtomicUsize::new(0),
        });

        let handle = run_price_adapter(ExchangeId::Binance, adapter, index.clone());
        tokio::time::timeout(StdDuration::from_secs(1), handle.join())
            .await
            .expect("adapter should self-stop after the second stream_once call");

        assert_eq!(index.exchange(ExchangeId::Binance).len(), 1);
    }

    #[tokio::test]
    async fn test_stop_signal_is_idempotent() {
        let stop = StopSignal::new();
        stop.stop();
        stop.stop();
        assert!(stop.is_stopped());
    }
}
