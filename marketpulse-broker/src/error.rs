use thiserror::Error;

/// Errors produced while publishing or subscribing over a named endpoint.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to create endpoint directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind endpoint socket at {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to endpoint socket at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error on endpoint socket: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("frame exceeds maximum size of {max} bytes (got {got})")]
    FrameTooLarge { max: u32, got: u32 },
}
