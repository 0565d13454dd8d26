use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialise default non-JSON logging. Level is controlled by `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Initialise JSON logging, for deployments that ship logs to a structured sink.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}

/// Initialise logging per `MARKETPULSE_LOG_FORMAT` (`json` or anything else for plain text).
pub fn init_logging_from_env() {
    match std::env::var("MARKETPULSE_LOG_FORMAT").as_deref() {
        Ok("json") => init_json_logging(),
        _ => init_logging(),
    }
}
