use thiserror::Error;

/// Rejections applied at task submission, before storage (§4 "Validation").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("tokens must not be empty")]
    EmptyTokens,

    #[error("exactly one of timeProp/percentProp must be set")]
    PropertyCardinality,

    #[error("percent clamps to zero after bounding to +/-100")]
    ZeroPercent,

    #[error("intervalMs must be > 0")]
    NonPositiveInterval,

    #[error("exchange must not be the total sentinel")]
    SentinelExchange,

    #[error("tradeType must not be the total sentinel")]
    SentinelTradeType,

    #[error("duplicate symbol in tokens: {0}")]
    DuplicateSymbol(String),
}

/// Errors raised constructing an evaluator from a [`crate::task::PriceTask`].
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluator constructed with a task carrying the wrong property kind")]
    WrongPropertyKind,

    #[error("percent value is not representable as a finite decimal: {0}")]
    InvalidPercent(f64),
}
