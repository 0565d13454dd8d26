use crate::error::SocketError;
use serde::Deserialize;
use std::fmt::Debug;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, client::IntoClientRequest, connect_async};
use tracing::debug;

/// Convenient type alias for a tungstenite `WebSocketStream`.
pub type WebSocket = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Convenient type alias for the `Sink` half of a tungstenite [`WebSocket`].
pub type WsSink = futures::stream::SplitSink<WebSocket, WsMessage>;

/// Convenient type alias for the `Stream` half of a tungstenite [`WebSocket`].
pub type WsStream = futures::stream::SplitStream<WebSocket>;

/// Communicative type alias for a tungstenite [`WebSocket`] `Message`.
pub type WsMessage = tokio_tungstenite::tungstenite::Message;

/// Communicative type alias for a tungstenite [`WebSocket`] `Error`.
pub type WsError = tokio_tungstenite::tungstenite::Error;

/// Connect asynchronously to a [`WebSocket`] server.
pub async fn connect<R>(request: R) -> Result<WebSocket, SocketError>
where
    R: IntoClientRequest + Unpin + Debug,
{
    debug!(?request, "attempting to establish WebSocket connection");
    connect_async(request)
        .await
        .map(|(websocket, _)| websocket)
        .map_err(|error| SocketError::WebSocket(Box::new(error)))
}

/// Deserialise a text/binary [`WsMessage`] payload into `Output`, logging and returning `None`
/// for Ping/Pong/Frame messages and an error for Close frames (§7: a Close frame is a terminal
/// condition that must drive a reconnect).
pub fn parse<Output>(message: Result<WsMessage, WsError>) -> Option<Result<Output, SocketError>>
where
    Output: for<'de> Deserialize<'de>,
{
    match message {
        Ok(WsMessage::Text(text)) => Some(serde_json::from_str::<Output>(&text).map_err(|error| {
            debug!(?error, payload = %text, "failed to deserialise WebSocket message");
            SocketError::Deserialise {
                error,
                payload: text.to_string(),
            }
        })),
        Ok(WsMessage::Binary(binary)) => {
            Some(serde_json::from_slice::<Output>(&binary).map_err(|error| {
                debug!(?error, "failed to deserialise binary WebSocket message");
                SocketError::Deserialise {
                    error,
                    payload: String::from_utf8_lossy(&binary).to_string(),
                }
            }))
        }
        Ok(WsMessage::Ping(payload)) => {
            debug!(?payload, "received Ping WebSocket message");
            None
        }
        Ok(WsMessage::Pong(payload)) => {
            debug!(?payload, "received Pong WebSocket message");
            None
        }
        Ok(WsMessage::Close(frame)) => {
            let frame = format!("{frame:?}");
            debug!(payload = %frame, "received Close WebSocket message");
            Some(Err(SocketError::Terminated(frame)))
        }
        Ok(WsMessage::Frame(frame)) => {
            debug!(payload = ?frame, "received unexpected raw Frame WebSocket message");
            None
        }
        Err(error) => Some(Err(SocketError::WebSocket(Box::new(error)))),
    }
}

/// Determine whether a [`WsError`] indicates the [`WebSocket`] has disconnected and a full
/// reconnect is required.
pub fn is_disconnected(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Io(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        a: u32,
    }

    #[test]
    fn test_parse_text_ok() {
        let msg = Ok(WsMessage::text(r#"{"a":1}"#));
        let parsed = parse::<Payload>(msg);
        assert_eq!(parsed.unwrap().unwrap(), Payload { a: 1 });
    }

    #[test]
    fn test_parse_text_invalid_json() {
        let msg = Ok(WsMessage::text("not json"));
        let parsed = parse::<Payload>(msg);
        assert!(matches!(parsed, Some(Err(SocketError::Deserialise { .. }))));
    }

    #[test]
    fn test_parse_ping_is_none() {
        let msg = Ok(WsMessage::Ping(Vec::new().into()));
        assert!(parse::<Payload>(msg).is_none());
    }

    #[test]
    fn test_parse_close_is_terminal_error() {
        let msg = Ok(WsMessage::Close(None));
        let parsed = parse::<Payload>(msg);
        assert!(matches!(parsed, Some(Err(SocketError::Terminated(_)))));
    }
}
