use marketpulse_instrument::{AccountCredential, ExchangeId, Instrument, TradeType};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// `add`/`remove`/`update` as carried by an [`AccountTask`] (§3, §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountOperation {
    Add,
    Remove,
    Update,
}

/// Command routed to the account scheduler's per-exchange dispatch loop (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTask {
    pub task_id: String,
    pub user_id: String,
    pub credential: AccountCredential,
    pub exchange: ExchangeId,
    /// Required only for [`ExchangeId::Kucoin`] (§3).
    pub trade_type: Option<TradeType>,
    pub operation: AccountOperation,
}

/// State transition emitted by the account scheduler on every [`AccountTask`] processed (§3,
/// §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTaskState {
    Initiated,
    Running,
    Stopped,
    Restarted,
    Remove,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTaskResult {
    pub task_id: String,
    pub user_id: String,
    pub state: AccountTaskState,
}

/// `up`/`down` direction for a [`PercentProp`] threshold (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Informational unit a client expressed its interval in; `interval_ms` is always the canonical
/// value the evaluator schedules against (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeProp {
    pub interval_ms: i64,
    pub duration_unit: DurationUnit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentProp {
    pub percent: f64,
    pub direction: Direction,
}

/// Exactly one of [`TimeProp`]/[`PercentProp`] is set on a [`PriceTask`] (§3 invariant).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TaskProperty {
    Time(TimeProp),
    Percent(PercentProp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Initiated,
    Running,
    Stopped,
}

/// A scheduled price-alert task, common to both the time-based and progress evaluators (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTask {
    pub task_id: String,
    pub user_id: String,
    pub tokens: Vec<SmolStr>,
    pub exchange: ExchangeId,
    pub trade_type: TradeType,
    pub property: TaskProperty,
    pub status: TaskStatus,
    /// Scheduler-assigned monotonic id.
    pub process_id: u64,
}

/// A single instrument whose snapshot triggered a match, carried in a [`PriceTaskResult`] (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedInstrument {
    pub instrument: Instrument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTaskResult {
    pub task: PriceTask,
    pub matched_instruments: Vec<MatchedInstrument>,
}

/// `removeByUserAndTask` routed over the broker (§4.G), distilled from `/stop_price_tasks`'
/// per-task-id shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTaskStopRequest {
    pub user_id: String,
    pub task_id: String,
}
