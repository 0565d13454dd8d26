use marketpulse_instrument::ExchangeId;
use thiserror::Error;

/// Errors produced by price/account adapters and the price index.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Socket(#[from] marketpulse_integration::SocketError),

    #[error("{exchange} adapter bootstrap failed: {reason}")]
    Bootstrap {
        exchange: ExchangeId,
        reason: String,
    },

    #[error("no live adapter on {0} matches the supplied credential")]
    NoMatchingAdapter(ExchangeId),

    #[error("adapter already stopped")]
    AlreadyStopped,
}
