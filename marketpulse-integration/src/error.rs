use thiserror::Error;

/// All socket/REST IO related errors generated across `marketpulse` exchange adapters.
///
/// Mirrors the error taxonomy described in §7: transient network errors drive reconnects,
/// protocol violations drop the offending message, authentication failures are treated as
/// transient.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("deserialising JSON error: {error} for payload: {payload}")]
    Deserialise {
        error: serde_json::Error,
        payload: String,
    },

    #[error("serialising JSON error: {0}")]
    Serialise(serde_json::Error),

    #[error("error parsing Url: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("error subscribing to resources over the socket: {0}")]
    Subscribe(String),

    #[error("WebSocket stream terminated with closing frame: {0}")]
    Terminated(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("HTTP request timed out")]
    HttpTimeout(reqwest::Error),

    #[error("HTTP response (status={0}) error: {1}")]
    HttpResponse(reqwest::StatusCode, String),

    #[error("consumed error message from exchange: {0}")]
    Exchange(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for SocketError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SocketError::HttpTimeout(error)
        } else {
            SocketError::Http(error)
        }
    }
}

impl SocketError {
    /// `true` for errors that should drive a reconnect rather than tear down the adapter.
    ///
    /// Per §7: transient network errors and authentication failures are both treated as
    /// transient - they log and cause the state machine to re-enter `cooldown`.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SocketError::Subscribe(_))
    }
}
