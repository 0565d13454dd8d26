use crate::error::EvaluatorError;
use crate::registry::PriceTaskHandle;
use crate::task::{MatchedInstrument, PriceTask, PriceTaskResult, TaskProperty, TaskStatus};
use marketpulse_data::{PriceIndex, StopSignal};
use marketpulse_instrument::InstrumentKey;
use marketpulse_integration::channel::Tx;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct AnchorEntry {
    symbol: SmolStr,
    anchor_price: Decimal,
}

/// Spawn the progress evaluator for `task` (§4.F).
///
/// Computes each token's anchor once, at spawn time, by adjusting its current price by
/// `|percent|`%: `anchor = current * (1 + percent/100)`. Every 100 ms each remaining entry is
/// compared against the live price; a crossing emits a [`PriceTaskResult`] and removes that
/// entry so it fires at most once. The anchor is never recomputed after spawn (pinned design
/// decision - a moving anchor would make "notify me once when it moves +5%" never converge).
/// Tokens with no known price at spawn time are dropped from the working set and never fire.
pub fn spawn_progress_evaluator<T>(
    mut task: PriceTask,
    index: Arc<PriceIndex>,
    results: T,
) -> Result<PriceTaskHandle, EvaluatorError>
where
    T: Tx<Item = PriceTaskResult> + 'static,
{
    let TaskProperty::Percent(percent_prop) = task.property else {
        return Err(EvaluatorError::WrongPropertyKind);
    };
    task.status = TaskStatus::Running;

    let set = index.exchange(task.exchange);
    let factor = Decimal::from_f64_retain(1.0 + percent_prop.percent / 100.0)
        .ok_or(EvaluatorError::InvalidPercent(percent_prop.percent))?;

    let mut working: Vec<AnchorEntry> = task
        .tokens
        .iter()
        .filter_map(|symbol| {
            let current = set.find(&InstrumentKey::new(symbol.clone(), task.trade_type))?;
            Some(AnchorEntry {
                symbol: symbol.clone(),
                anchor_price: current.last_price * factor,
            })
        })
        .collect();

    let stop = StopSignal::new();
    let task_stop = stop.clone();
    let running_task = task.clone();
    let ascending = percent_prop.percent >= 0.0;

    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.tick().await;

        loop {
            if working.is_empty() {
                break;
            }
            tokio::select! {
                _ = task_stop.wait_stopped() => break,
                _ = interval.tick() => {
                    let set = index.exchange(running_task.exchange);
                    let mut fired = Vec::new();

                    working.retain(|entry| {
                        let Some(current) = set.find(&InstrumentKey::new(entry.symbol.clone(), running_task.trade_type)) else {
                            return true;
                        };
                        let crossed = if ascending {
                            current.last_price >= entry.anchor_price
                        } else {
                            current.last_price <= entry.anchor_price
                        };
                        if crossed {
                            fired.push(current);
                            false
                        } else {
                            true
                        }
                    });

                    for instrument in fired {
                        let result = PriceTaskResult {
                            task: running_task.clone(),
                            matched_instruments: vec![MatchedInstrument { instrument }],
                        };
                        if results.send(result).is_err() {
                            task_stop.stop();
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok(PriceTaskHandle::new(task, stop, join))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Direction, PercentProp};
    use marketpulse_instrument::{ExchangeId, Instrument, TradeType};
    use marketpulse_integration::channel::mpsc_unbounded;
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;

    fn sample_task(percent: f64, direction: Direction) -> PriceTask {
        PriceTask {
            task_id: "t1".into(),
            user_id: "u1".into(),
            tokens: vec!["BTCUSDT".into()],
            exchange: ExchangeId::Binance,
            trade_type: TradeType::Spot,
            property: TaskProperty::Percent(PercentProp { percent, direction }),
            status: TaskStatus::Initiated,
            process_id: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_on_upward_crossing_then_goes_terminal() {
        let index = Arc::new(PriceIndex::new());
        index
            .exchange(ExchangeId::Binance)
            .insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90)));

        let (tx, mut rx) = mpsc_unbounded::<PriceTaskResult>();
        let handle = spawn_progress_evaluator(sample_task(5.0, Direction::Up), index.clone(), tx).unwrap();

        // anchor = 105; not yet crossed
        tokio::time::advance(StdDuration::from_millis(150)).await;
        index
            .exchange(ExchangeId::Binance)
            .insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(106), dec!(90)));
        tokio::time::advance(StdDuration::from_millis(150)).await;

        let result = rx.recv().await.unwrap();
        assert_eq!(result.matched_instruments.len(), 1);
        assert_eq!(result.matched_instruments[0].instrument.last_price, dec!(106));

        // working list is now empty -> evaluator reaches terminal state on its own
        tokio::time::timeout(StdDuration::from_secs(1), handle.join())
            .await
            .expect("evaluator should self-terminate once its working list is empty");
    }

    #[tokio::test(start_paused = true)]
    async fn test_downward_direction_uses_le_comparator() {
        let index = Arc::new(PriceIndex::new());
        index
            .exchange(ExchangeId::Binance)
            .insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(100), dec!(90)));

        let (tx, mut rx) = mpsc_unbounded::<PriceTaskResult>();
        // anchor = 100 * (1 - 0.05) = 95
        let handle =
            spawn_progress_evaluator(sample_task(-5.0, Direction::Down), index.clone(), tx).unwrap();

        index
            .exchange(ExchangeId::Binance)
            .insert(Instrument::new("BTCUSDT", TradeType::Spot, dec!(94), dec!(90)));
        tokio::time::advance(StdDuration::from_millis(150)).await;

        let result = rx.recv().await.unwrap();
        assert_eq!(result.matched_instruments[0].instrument.last_price, dec!(94));
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_token_at_anchor_time_never_fires() {
        let index = Arc::new(PriceIndex::new());
        let (tx, mut rx) = mpsc_unbounded::<PriceTaskResult>();
        let handle = spawn_progress_evaluator(sample_task(5.0, Direction::Up), index.clone(), tx).unwrap();

        // the token was never in the index, so the working list starts empty and the evaluator
        // should terminate almost immediately.
        tokio::time::timeout(StdDuration::from_secs(1), handle.join())
            .await
            .expect("evaluator with an empty working list should terminate immediately");
        assert!(rx.recv().await.is_none());
    }
}
