use std::path::PathBuf;

const DEFAULT_BROKER_BASE_DIR: &str = "/tmp/marketpulse";

/// Environment-derived process configuration (§1 Non-goals excludes CLI parsing; processes take
/// their broker base directory and, where relevant, exchange credentials from the environment).
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_base_dir: PathBuf,
}

impl Config {
    /// Read configuration from the environment. `MARKETPULSE_BROKER_DIR` overrides the default
    /// `/tmp/marketpulse` base directory used to resolve every broker endpoint path.
    pub fn from_env() -> Self {
        let broker_base_dir = std::env::var("MARKETPULSE_BROKER_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_BROKER_BASE_DIR));

        Self { broker_base_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_broker_dir() {
        if std::env::var("MARKETPULSE_BROKER_DIR").is_err() {
            assert_eq!(Config::from_env().broker_base_dir, PathBuf::from(DEFAULT_BROKER_BASE_DIR));
        }
    }
}
