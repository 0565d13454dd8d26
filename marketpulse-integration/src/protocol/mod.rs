/// Thin wrapper around `tokio-tungstenite` connect/parse logic shared by every WebSocket-based
/// exchange adapter.
pub mod websocket;
