#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # Marketpulse-Integration
//! Transport-level primitives shared by every exchange adapter in `marketpulse-data`: the
//! [`SocketError`](error::SocketError) taxonomy, a thin [`protocol::websocket`] wrapper around
//! `tokio-tungstenite`, HMAC/base64 [`signing`] helpers for exchange REST/WS authentication, and
//! the [`channel`] fan-out primitives used to bridge async tasks.

/// Unified error taxonomy for transport-level failures (§7 of the design).
pub mod error;

/// WebSocket connect/parse helpers.
pub mod protocol;

/// HMAC-SHA256 and base64 signing primitives used by KuCoin and OKX request signers.
pub mod signing;

/// Unbounded mpsc `Tx`/`Rx` wrapper types used to fan events out of adapters.
pub mod channel;

pub use error::SocketError;
