#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # Marketpulse-Scheduler
//! Everything downstream of the price index and the exchange adapters: price-task validation
//! (§4 "Validation"), the time-based and progress evaluators (§4.E, §4.F), the per-user task
//! registry (§4.G), and the per-exchange account task dispatcher (§4.D).

/// Data types shared by the scheduler's components: [`task::AccountTask`], [`task::PriceTask`]
/// and their result types.
pub mod task;

/// Submission-time validation for [`task::PriceTask`] requests.
pub mod validate;

/// Errors produced by validation and evaluator construction.
pub mod error;

/// The per-user task registry (§4.G).
pub mod registry;

/// The time-based price evaluator (§4.E).
pub mod evaluator_time;

/// The progress/percentage price evaluator (§4.F).
pub mod evaluator_progress;

/// The per-exchange account task dispatcher (§4.D).
pub mod account_scheduler;

pub use account_scheduler::{run_account_dispatcher, AccountDispatcher};
pub use error::{EvaluatorError, ValidationError};
pub use evaluator_progress::spawn_progress_evaluator;
pub use evaluator_time::spawn_time_evaluator;
pub use registry::{PriceTaskHandle, TaskRegistry};
pub use validate::{validate_and_build, PriceTaskRequest};
