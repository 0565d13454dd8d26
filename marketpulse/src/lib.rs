#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # Marketpulse
//! Process wiring: each `src/bin/*.rs` is one of the independent OS processes described in §5 -
//! a price adapter process, the account task scheduler, and the two evaluator processes. This
//! library crate holds what they share: logging setup and environment-derived configuration.

/// `tracing`/`tracing-subscriber` initialisation: plain-text and JSON output, level controlled
/// by `RUST_LOG`.
pub mod logging;

/// Process configuration read from the environment (§1 Non-goals exclude CLI parsing, but every
/// process still needs *some* way to learn its broker base directory and exchange).
pub mod config;

/// Rebuilds a process-local price index from the price adapter process's broker feed, for the
/// processes that need read access to prices without running adapters themselves.
pub mod price_feed;

pub use config::Config;
