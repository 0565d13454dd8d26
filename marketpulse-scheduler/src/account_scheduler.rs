use crate::task::{AccountOperation, AccountTask, AccountTaskResult, AccountTaskState};
use marketpulse_broker::{Publisher, Subscriber};
use marketpulse_data::{AccountEvent, AdapterHandle};
use marketpulse_instrument::{AccountCredential, ExchangeId};
use marketpulse_integration::channel::Tx;
use tracing::{info, warn};

struct LiveAdapter {
    credential: AccountCredential,
    handle: AdapterHandle,
}

/// Per-exchange account task dispatcher (§4.D): one of these runs per exchange, owning the live
/// account-adapter list for that exchange.
pub struct AccountDispatcher<F, T> {
    exchange: ExchangeId,
    live: Vec<LiveAdapter>,
    spawn_adapter: F,
    event_tx: T,
}

impl<F, T> AccountDispatcher<F, T>
where
    F: Fn(AccountCredential, T) -> AdapterHandle,
    T: Tx<Item = AccountEvent> + Clone + 'static,
{
    pub fn new(exchange: ExchangeId, spawn_adapter: F, event_tx: T) -> Self {
        Self {
            exchange,
            live: Vec::new(),
            spawn_adapter,
            event_tx,
        }
    }

    /// Apply one `AccountTask` (§4.D). Tasks addressed to a different exchange are ignored
    /// entirely - no adapter mutation, no emitted result.
    pub fn apply(&mut self, task: AccountTask) -> Option<AccountTaskResult> {
        if task.exchange != self.exchange {
            return None;
        }

        let state = match task.operation {
            AccountOperation::Add => {
                let handle = (self.spawn_adapter)(task.credential.clone(), self.event_tx.clone());
                self.live.push(LiveAdapter {
                    credential: task.credential.clone(),
                    handle,
                });
                info!(exchange = %self.exchange, task_id = %task.task_id, "started account adapter");
                AccountTaskState::Running
            }
            AccountOperation::Remove => {
                match self.live.iter().position(|live| live.credential == task.credential) {
                    Some(pos) => {
                        let live = self.live.remove(pos);
                        live.handle.stop();
                        info!(exchange = %self.exchange, task_id = %task.task_id, "stopped account adapter");
                    }
                    None => {
                        warn!(
                            exchange = %self.exchange,
                            task_id = %task.task_id,
                            "remove requested for a credential with no live adapter"
                        );
                    }
                }
                AccountTaskState::Running
            }
            // Any other operation: no adapter mutation (§4.D).
            AccountOperation::Update => AccountTaskState::Stopped,
        };

        Some(AccountTaskResult {
            task_id: task.task_id,
            user_id: task.user_id,
            state,
        })
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// Drive an [`AccountDispatcher`] from `task_rx`, publishing every emitted [`AccountTaskResult`]
/// to `result_tx`, until the task publisher disconnects (§4.D).
pub async fn run_account_dispatcher<F, T>(
    mut dispatcher: AccountDispatcher<F, T>,
    mut task_rx: Subscriber<AccountTask>,
    result_tx: Publisher<AccountTaskResult>,
) where
    F: Fn(AccountCredential, T) -> AdapterHandle,
    T: Tx<Item = AccountEvent> + Clone + 'static,
{
    loop {
        match task_rx.recv().await {
            Ok(Some(task)) => {
                if let Some(result) = dispatcher.apply(task) {
                    if let Err(error) = result_tx.publish(&result).await {
                        warn!(%error, "failed to publish account task result");
                    }
                }
            }
            Ok(None) => {
                info!(exchange = %dispatcher.exchange, "account task publisher disconnected");
                break;
            }
            Err(error) => {
                warn!(%error, "failed to decode account task message, skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_data::StopSignal;
    use marketpulse_integration::channel::mpsc_unbounded;

    fn fake_spawn(
        _credential: AccountCredential,
        _tx: marketpulse_integration::channel::UnboundedTx<AccountEvent>,
    ) -> AdapterHandle {
        let stop = StopSignal::new();
        let join = tokio::spawn(async move {});
        AdapterHandle::from_parts(stop, join)
    }

    fn sample_task(exchange: ExchangeId, operation: AccountOperation) -> AccountTask {
        AccountTask {
            task_id: "t1".into(),
            user_id: "u1".into(),
            credential: AccountCredential::new("u1", "key", "secret", None),
            exchange,
            trade_type: None,
            operation,
        }
    }

    #[tokio::test]
    async fn test_ignores_task_for_different_exchange() {
        let (tx, _rx) = mpsc_unbounded::<AccountEvent>();
        let mut dispatcher = AccountDispatcher::new(ExchangeId::Binance, fake_spawn, tx);
        let result = dispatcher.apply(sample_task(ExchangeId::Okx, AccountOperation::Add));
        assert!(result.is_none());
        assert_eq!(dispatcher.live_count(), 0);
    }

    #[tokio::test]
    async fn test_add_then_remove_round_trip() {
        let (tx, _rx) = mpsc_unbounded::<AccountEvent>();
        let mut dispatcher = AccountDispatcher::new(ExchangeId::Binance, fake_spawn, tx);

        let added = dispatcher
            .apply(sample_task(ExchangeId::Binance, AccountOperation::Add))
            .unwrap();
        assert_eq!(added.state, AccountTaskState::Running);
        assert_eq!(dispatcher.live_count(), 1);

        let removed = dispatcher
            .apply(sample_task(ExchangeId::Binance, AccountOperation::Remove))
            .unwrap();
        assert_eq!(removed.state, AccountTaskState::Running);
        assert_eq!(dispatcher.live_count(), 0);
    }

    #[tokio::test]
    async fn test_update_operation_does_not_mutate_adapters() {
        let (tx, _rx) = mpsc_unbounded::<AccountEvent>();
        let mut dispatcher = AccountDispatcher::new(ExchangeId::Binance, fake_spawn, tx);

        let result = dispatcher
            .apply(sample_task(ExchangeId::Binance, AccountOperation::Update))
            .unwrap();
        assert_eq!(result.state, AccountTaskState::Stopped);
        assert_eq!(dispatcher.live_count(), 0);
    }
}
