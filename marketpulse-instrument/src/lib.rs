#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # Marketpulse-Instrument
//! Core data structures shared by every other `marketpulse` crate: the closed set of supported
//! [`ExchangeId`](exchange::ExchangeId)s, the [`Instrument`](instrument::Instrument) price record,
//! and the [`AccountCredential`](credential::AccountCredential) used to authenticate account
//! streams.

/// Defines the closed [`ExchangeId`](exchange::ExchangeId) and [`TradeType`](exchange::TradeType)
/// enums.
pub mod exchange;

/// Defines the [`Instrument`](instrument::Instrument) price record and its `(symbol, trade_type)`
/// key.
pub mod instrument;

/// Defines the [`AccountCredential`](credential::AccountCredential) used by account adapters.
pub mod credential;

pub use credential::AccountCredential;
pub use exchange::{ExchangeId, TradeType};
pub use instrument::{Instrument, InstrumentKey};
