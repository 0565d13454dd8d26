use crate::task::PriceTask;
use marketpulse_data::StopSignal;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// A running price-evaluator task: its definition plus the means to stop it (§4.G).
#[derive(Debug)]
pub struct PriceTaskHandle {
    pub task: PriceTask,
    stop: StopSignal,
    join: JoinHandle<()>,
}

impl PriceTaskHandle {
    pub fn new(task: PriceTask, stop: StopSignal, join: JoinHandle<()>) -> Self {
        Self { task, stop, join }
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Process-global `userId -> list<PriceTaskHandle>` mapping (§4.G).
///
/// Guarded by a single lock per the design's "per-user lock" wording in §5 - in practice a single
/// `RwLock` over the whole map, since per-entry locks would not make `list_all` observable as a
/// single consistent snapshot.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    by_user: RwLock<HashMap<String, Vec<PriceTaskHandle>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handle: PriceTaskHandle) {
        self.by_user
            .write()
            .entry(handle.task.user_id.clone())
            .or_default()
            .push(handle);
    }

    /// Stop and remove the handle matching `user_id`/`task_id`. Returns `true` if one was found.
    pub fn remove_by_user_and_task(&self, user_id: &str, task_id: &str) -> bool {
        let mut by_user = self.by_user.write();
        let Some(tasks) = by_user.get_mut(user_id) else {
            return false;
        };
        let Some(pos) = tasks.iter().position(|handle| handle.task.task_id == task_id) else {
            return false;
        };
        let handle = tasks.remove(pos);
        handle.stop();
        true
    }

    pub fn list_for_user(&self, user_id: &str) -> Vec<PriceTask> {
        self.by_user
            .read()
            .get(user_id)
            .map(|tasks| tasks.iter().map(|handle| handle.task.clone()).collect())
            .unwrap_or_default()
    }

    /// Flatten the map into a single sequence, in unspecified order (§4.G).
    pub fn list_all(&self) -> Vec<PriceTask> {
        self.by_user
            .read()
            .values()
            .flat_map(|tasks| tasks.iter().map(|handle| handle.task.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Direction, PercentProp, TaskProperty, TaskStatus};
    use marketpulse_instrument::{ExchangeId, TradeType};

    fn sample_task(user_id: &str, task_id: &str) -> PriceTask {
        PriceTask {
            task_id: task_id.into(),
            user_id: user_id.into(),
            tokens: vec!["BTCUSDT".into()],
            exchange: ExchangeId::Binance,
            trade_type: TradeType::Spot,
            property: TaskProperty::Percent(PercentProp {
                percent: 5.0,
                direction: Direction::Up,
            }),
            status: TaskStatus::Running,
            process_id: 1,
        }
    }

    fn noop_handle(task: PriceTask) -> PriceTaskHandle {
        let stop = StopSignal::new();
        let join = tokio::spawn(async move {});
        PriceTaskHandle::new(task, stop, join)
    }

    #[tokio::test]
    async fn test_add_then_list_for_user() {
        let registry = TaskRegistry::new();
        registry.add(noop_handle(sample_task("u1", "t1")));
        registry.add(noop_handle(sample_task("u1", "t2")));
        registry.add(noop_handle(sample_task("u2", "t3")));

        assert_eq!(registry.list_for_user("u1").len(), 2);
        assert_eq!(registry.list_for_user("u2").len(), 1);
        assert_eq!(registry.list_all().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_by_user_and_task() {
        let registry = TaskRegistry::new();
        registry.add(noop_handle(sample_task("u1", "t1")));

        assert!(registry.remove_by_user_and_task("u1", "t1"));
        assert!(registry.list_for_user("u1").is_empty());
        assert!(!registry.remove_by_user_and_task("u1", "t1"));
    }
}
