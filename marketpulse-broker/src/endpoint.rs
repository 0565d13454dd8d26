use marketpulse_instrument::ExchangeId;
use std::path::{Path, PathBuf};

const DEFAULT_BASE_DIR: &str = "/tmp/marketpulse";

/// A named pub/sub channel (§4.C table), resolved to a filesystem path under
/// `/tmp/<app>/stream/{price,account/{task,result,monitor}}` (§6 "IPC endpoints").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `price/<exchange>` - Price adapter process -> scheduler, evaluators.
    Price(ExchangeId),
    /// `account-task/<exchange>` - HTTP edge / scheduler -> account adapter process.
    AccountTask(ExchangeId),
    /// `account-result/<exchange>` - Account adapter -> aggregators.
    AccountResult(ExchangeId),
    /// `task-status/writer` - Account scheduler -> HTTP edge.
    TaskStatusWriter,
    /// `price-result` - Evaluators -> notification sink.
    PriceResult,
    /// `price-task/submit` - HTTP edge -> time/progress evaluator processes.
    ///
    /// Not in the original endpoint table: the HTTP edge that would normally hold
    /// `add_pricing_tasks` is out of scope, but the evaluator processes still need some
    /// process-external way to receive submissions, so this fills the gap in its idiom.
    PriceTaskSubmit,
    /// `price-task/stop` - HTTP edge -> time/progress evaluator processes. See
    /// [`Endpoint::PriceTaskSubmit`] for why this exists beyond the original table.
    PriceTaskStop,
}

impl Endpoint {
    /// Resolve this endpoint's socket path, rooted at `base_dir` (typically `/tmp/<app>`).
    pub fn path(&self, base_dir: impl AsRef<Path>) -> PathBuf {
        let base = base_dir.as_ref().join("stream");
        match self {
            Endpoint::Price(exchange) => base.join("price").join(exchange.as_str()),
            Endpoint::AccountTask(exchange) => base.join("account").join("task").join(exchange.as_str()),
            Endpoint::AccountResult(exchange) => {
                base.join("account").join("result").join(exchange.as_str())
            }
            Endpoint::TaskStatusWriter => base.join("account").join("monitor").join("writer"),
            Endpoint::PriceResult => base.join("price").join("result"),
            Endpoint::PriceTaskSubmit => base.join("price").join("task").join("submit"),
            Endpoint::PriceTaskStop => base.join("price").join("task").join("stop"),
        }
    }

    /// Resolve this endpoint's socket path under the default base directory `/tmp/marketpulse`.
    pub fn default_path(&self) -> PathBuf {
        self.path(DEFAULT_BASE_DIR)
    }
}
