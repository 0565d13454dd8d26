use crate::error::ValidationError;
use crate::task::{PercentProp, PriceTask, TaskProperty, TaskStatus, TimeProp};
use marketpulse_instrument::{ExchangeId, TradeType};
use serde::Deserialize;
use smol_str::SmolStr;

/// The raw shape a price task is submitted in, before validation (§6: distilled from
/// `/add_pricing_tasks`' per-contract body - the HTTP edge itself is out of scope, but the
/// validation it must apply is not).
#[derive(Debug, Clone, Deserialize)]
pub struct PriceTaskRequest {
    pub task_id: String,
    pub user_id: String,
    pub tokens: Vec<SmolStr>,
    pub exchange: ExchangeId,
    pub trade_type: TradeType,
    pub time_prop: Option<TimeProp>,
    pub percent_prop: Option<PercentProp>,
}

/// Validate `request` and, if it passes, build the [`PriceTask`] the scheduler/evaluators will
/// run. Rules (§4 "Validation"): non-empty tokens; exactly one of `timeProp`/`percentProp`;
/// `percent` must not clamp to zero after bounding to ±100; `intervalMs > 0`; `exchange`/
/// `tradeType` must not be the `total` sentinel; no duplicate symbols.
pub fn validate_and_build(
    request: PriceTaskRequest,
    process_id: u64,
) -> Result<PriceTask, ValidationError> {
    if request.tokens.is_empty() {
        return Err(ValidationError::EmptyTokens);
    }

    if !request.exchange.is_concrete() {
        return Err(ValidationError::SentinelExchange);
    }
    if !request.trade_type.is_concrete() {
        return Err(ValidationError::SentinelTradeType);
    }

    let property = match (request.time_prop, request.percent_prop) {
        (Some(_), Some(_)) | (None, None) => return Err(ValidationError::PropertyCardinality),
        (Some(time_prop), None) => {
            if time_prop.interval_ms <= 0 {
                return Err(ValidationError::NonPositiveInterval);
            }
            TaskProperty::Time(time_prop)
        }
        (None, Some(percent_prop)) => {
            let clamped = percent_prop.percent.clamp(-100.0, 100.0);
            if clamped == 0.0 {
                return Err(ValidationError::ZeroPercent);
            }
            TaskProperty::Percent(PercentProp {
                percent: clamped,
                direction: percent_prop.direction,
            })
        }
    };

    let mut tokens = request.tokens;
    tokens.sort();
    for pair in tokens.windows(2) {
        if pair[0] == pair[1] {
            return Err(ValidationError::DuplicateSymbol(pair[0].to_string()));
        }
    }

    Ok(PriceTask {
        task_id: request.task_id,
        user_id: request.user_id,
        tokens,
        exchange: request.exchange,
        trade_type: request.trade_type,
        property,
        status: TaskStatus::Initiated,
        process_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Direction;

    fn base_request() -> PriceTaskRequest {
        PriceTaskRequest {
            task_id: "t1".into(),
            user_id: "u1".into(),
            tokens: vec!["BTCUSDT".into(), "ETHUSDT".into()],
            exchange: ExchangeId::Binance,
            trade_type: TradeType::Spot,
            time_prop: Some(TimeProp {
                interval_ms: 1000,
                duration_unit: crate::task::DurationUnit::Seconds,
            }),
            percent_prop: None,
        }
    }

    #[test]
    fn test_valid_time_task_is_accepted() {
        let task = validate_and_build(base_request(), 1).unwrap();
        assert_eq!(task.tokens, vec![SmolStr::from("BTCUSDT"), SmolStr::from("ETHUSDT")]);
    }

    #[test]
    fn test_empty_tokens_rejected() {
        let mut request = base_request();
        request.tokens = Vec::new();
        assert_eq!(validate_and_build(request, 1), Err(ValidationError::EmptyTokens));
    }

    #[test]
    fn test_neither_property_rejected() {
        let mut request = base_request();
        request.time_prop = None;
        assert_eq!(
            validate_and_build(request, 1),
            Err(ValidationError::PropertyCardinality)
        );
    }

    #[test]
    fn test_both_properties_rejected() {
        let mut request = base_request();
        request.percent_prop = Some(PercentProp {
            percent: 5.0,
            direction: Direction::Up,
        });
        assert_eq!(
            validate_and_build(request, 1),
            Err(ValidationError::PropertyCardinality)
        );
    }

    #[test]
    fn test_non_positive_interval_rejected() {
        let mut request = base_request();
        request.time_prop = Some(TimeProp {
            interval_ms: 0,
            duration_unit: crate::task::DurationUnit::Seconds,
        });
        assert_eq!(
            validate_and_build(request, 1),
            Err(ValidationError::NonPositiveInterval)
        );
    }

    #[test]
    fn test_percent_clamping_to_zero_rejected() {
        let mut request = base_request();
        request.time_prop = None;
        request.percent_prop = Some(PercentProp {
            percent: 0.0,
            direction: Direction::Up,
        });
        assert_eq!(validate_and_build(request, 1), Err(ValidationError::ZeroPercent));
    }

    #[test]
    fn test_sentinel_exchange_rejected() {
        let mut request = base_request();
        request.exchange = ExchangeId::Total;
        assert_eq!(
            validate_and_build(request, 1),
            Err(ValidationError::SentinelExchange)
        );
    }

    #[test]
    fn test_sentinel_trade_type_rejected() {
        let mut request = base_request();
        request.trade_type = TradeType::Total;
        assert_eq!(
            validate_and_build(request, 1),
            Err(ValidationError::SentinelTradeType)
        );
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let mut request = base_request();
        request.tokens = vec!["BTCUSDT".into(), "BTCUSDT".into()];
        assert_eq!(
            validate_and_build(request, 1),
            Err(ValidationError::DuplicateSymbol("BTCUSDT".into()))
        );
    }
}
