#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # Marketpulse-Broker
//! The named-endpoint pub/sub transport used for process-to-process fan-out (§4.C): each logical
//! channel is a filesystem-scoped publisher endpoint (a Unix domain socket under
//! `/tmp/<app>/stream/...`) with any number of subscribers. Delivery is best-effort and
//! at-most-once - a subscriber that connects after a message was published simply never sees it.

/// Endpoint path layout (§4.C table, §6 "IPC endpoints").
pub mod endpoint;

/// Errors produced by publishers and subscribers.
pub mod error;

/// Length-prefixed MessagePack framing over an `AsyncRead`/`AsyncWrite`.
pub mod frame;

/// The publisher and subscriber halves of a named endpoint.
pub mod transport;

pub use endpoint::Endpoint;
pub use error::BrokerError;
pub use transport::{Publisher, Subscriber};
