#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

//! # Marketpulse-Data
//! Self-healing Binance/KuCoin/OKX WebSocket adapters (§4.A) and the concurrent per-exchange
//! price index (§4.B) they feed.
//!
//! Each exchange module implements the same stages described in §4.A
//! (`idle -> resolving -> connecting -> tls -> ws-upgrade -> subscribing -> running <-> keepalive`,
//! falling back to `cooldown` on any failure) via [`adapter::run_price_adapter`] /
//! [`adapter::AdapterHandle`], parameterised by a small per-exchange struct rather than a single
//! generic trait object - the exchanges' bootstrap/subscribe/sign flows differ too much to share
//! more than the reconnect skeleton (see `DESIGN.md`).

/// Errors produced by adapters and the price index.
pub mod error;

/// The [`index::PriceIndex`] - a concurrent, per-exchange set of the latest [`Instrument`].
pub mod index;

/// [`account_event::AccountEvent`] - the normalized per-account order/balance event union.
pub mod account_event;

/// The generic adapter reconnect/cooldown driver (§4.A, §5) shared by every price adapter.
pub mod adapter;

/// Binance price & account adapters.
pub mod exchange_binance;

/// KuCoin price & account adapters.
pub mod exchange_kucoin;

/// OKX price & account adapters.
pub mod exchange_okx;

pub use account_event::AccountEvent;
pub use adapter::{AdapterHandle, PriceExchange, StopSignal, run_price_adapter};
pub use error::DataError;
pub use index::{InstrumentSet, PriceIndex};
pub use marketpulse_instrument::Instrument;
