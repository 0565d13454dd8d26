use crate::error::EvaluatorError;
use crate::registry::PriceTaskHandle;
use crate::task::{MatchedInstrument, PriceTask, PriceTaskResult, TaskProperty, TaskStatus};
use marketpulse_data::{PriceIndex, StopSignal};
use marketpulse_integration::channel::Tx;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the time-based evaluator for `task` (§4.E).
///
/// On each `timeProp.intervalMs` tick: snapshot the task's exchange index, project the subset
/// matching the task's `tokens` x `tradeType`, emit a [`PriceTaskResult`] if non-empty, and
/// reschedule. Calling this again on a stopped task's definition starts a fresh timer - the
/// evaluator carries no state across `run()` calls beyond what's in `task` itself.
pub fn spawn_time_evaluator<T>(
    mut task: PriceTask,
    index: Arc<PriceIndex>,
    results: T,
) -> Result<PriceTaskHandle, EvaluatorError>
where
    T: Tx<Item = PriceTaskResult> + 'static,
{
    let TaskProperty::Time(time_prop) = task.property else {
        return Err(EvaluatorError::WrongPropertyKind);
    };
    task.status = TaskStatus::Running;

    let stop = StopSignal::new();
    let task_stop = stop.clone();
    let running_task = task.clone();

    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(time_prop.interval_ms as u64));
        interval.tick().await; // the first tick fires immediately; the task's own period starts after it

        loop {
            tokio::select! {
                _ = task_stop.wait_stopped() => break,
                _ = interval.tick() => {
                    if emit_snapshot(&running_task, &index, &results).is_err() {
                        break;
                    }
                }
            }
        }
    });

    Ok(PriceTaskHandle::new(task, stop, join))
}

fn emit_snapshot<T>(task: &PriceTask, index: &PriceIndex, results: &T) -> Result<(), PriceTaskResult>
where
    T: Tx<Item = PriceTaskResult>,
{
    let snapshot = index.exchange(task.exchange).snapshot();
    let matched: Vec<MatchedInstrument> = snapshot
        .into_iter()
        .filter(|instrument| {
            instrument.trade_type == task.trade_type
                && task.tokens.iter().any(|token| token == &instrument.symbol)
        })
        .map(|instrument| MatchedInstrument { instrument })
        .collect();

    if matched.is_empty() {
        return Ok(());
    }

    results.send(PriceTaskResult {
        task: task.clone(),
        matched_instruments: matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{DurationUnit, TimeProp};
    use marketpulse_instrument::{ExchangeId, Instrument, TradeType};
    use marketpulse_integration::channel::mpsc_unbounded;
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;

    fn sample_task() -> PriceTask {
        PriceTask {
            task_id: "t1".into(),
            user_id: "u1".into(),
            tokens: vec!["BTCUSDT".into()],
            exchange: ExchangeId::Binance,
            trade_type: TradeType::Spot,
            property: TaskProperty::Time(TimeProp {
                interval_ms: 10,
                duration_unit: DurationUnit::Seconds,
            }),
            status: TaskStatus::Initiated,
            process_id: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_evaluator_emits_on_each_tick_while_matched() {
        let index = Arc::new(PriceIndex::new());
        index
            .exchange(ExchangeId::Binance)
            .insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90)));

        let (tx, mut rx) = mpsc_unbounded::<PriceTaskResult>();
        let handle = spawn_time_evaluator(sample_task(), index, tx).unwrap();

        tokio::time::advance(StdDuration::from_millis(25)).await;
        let first = rx.recv().await.unwrap();
        assert_eq!(first.matched_instruments.len(), 1);

        handle.stop();
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_evaluator_emits_nothing_when_no_tokens_match() {
        let index = Arc::new(PriceIndex::new());
        let mut task = sample_task();
        task.tokens = vec!["ETHUSDT".into()];

        let (tx, mut rx) = mpsc_unbounded::<PriceTaskResult>();
        let handle = spawn_time_evaluator(task, index, tx).unwrap();

        tokio::time::advance(StdDuration::from_millis(25)).await;
        handle.stop();
        handle.join().await;

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_property_kind_is_rejected() {
        let index = Arc::new(PriceIndex::new());
        let mut task = sample_task();
        task.property = TaskProperty::Percent(crate::task::PercentProp {
            percent: 5.0,
            direction: crate::task::Direction::Up,
        });

        let (tx, _rx) = mpsc_unbounded::<PriceTaskResult>();
        assert!(matches!(
            spawn_time_evaluator(task, index, tx),
            Err(EvaluatorError::WrongPropertyKind)
        ));
    }
}
