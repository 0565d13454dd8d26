//! The progress evaluator process (§4.F, §5): owns a per-user [`TaskRegistry`] of percent tasks,
//! fed submissions/stops over the broker and a read-only price feed from `price_monitor`.

use marketpulse::price_feed::spawn_price_feed_subscribers;
use marketpulse::{Config, logging};
use marketpulse_broker::{Endpoint, Publisher, Subscriber};
use marketpulse_data::PriceIndex;
use marketpulse_integration::channel::UnboundedTx;
use marketpulse_scheduler::task::{PriceTaskRequest, PriceTaskResult, PriceTaskStopRequest, TaskProperty};
use marketpulse_scheduler::{TaskRegistry, spawn_progress_evaluator, validate_and_build};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    logging::init_logging_from_env();
    let config = Config::from_env();

    let index = Arc::new(PriceIndex::new());
    let _price_feed = spawn_price_feed_subscribers(&config.broker_base_dir, index.clone());

    let registry = Arc::new(TaskRegistry::new());
    let next_process_id = Arc::new(AtomicU64::new(1));

    let results = match Publisher::<PriceTaskResult>::bind(Endpoint::PriceResult, &config.broker_base_dir).await {
        Ok(publisher) => publisher,
        Err(error) => {
            return tracing::error!(%error, "failed to bind price-result endpoint");
        }
    };

    let submissions = tokio::spawn(run_submissions(
        config.broker_base_dir.clone(),
        index,
        registry.clone(),
        next_process_id,
        results,
    ));
    let stops = tokio::spawn(run_stops(config.broker_base_dir.clone(), registry));

    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c, shutting down anyway");
    }
    info!("progress_tasks shutting down");
    submissions.abort();
    stops.abort();
}

async fn run_submissions(
    base_dir: std::path::PathBuf,
    index: Arc<PriceIndex>,
    registry: Arc<TaskRegistry>,
    next_process_id: Arc<AtomicU64>,
    results: Publisher<PriceTaskResult>,
) {
    let mut submissions = match Subscriber::<PriceTaskRequest>::connect(Endpoint::PriceTaskSubmit, &base_dir).await {
        Ok(subscriber) => subscriber,
        Err(error) => return tracing::error!(%error, "failed to connect to price-task submissions"),
    };

    let event_relay = spawn_result_relay(results);

    loop {
        match submissions.recv().await {
            Ok(Some(request)) => handle_submission(request, &index, &registry, &next_process_id, event_relay.clone()),
            Ok(None) => {
                info!("price-task submission publisher disconnected");
                break;
            }
            Err(error) => warn!(%error, "failed to decode price-task submission, skipping"),
        }
    }
}

fn handle_submission(
    request: PriceTaskRequest,
    index: &Arc<PriceIndex>,
    registry: &Arc<TaskRegistry>,
    next_process_id: &Arc<AtomicU64>,
    results: UnboundedTx<PriceTaskResult>,
) {
    let process_id = next_process_id.fetch_add(1, Ordering::Relaxed);
    let task = match validate_and_build(request, process_id) {
        Ok(task) => task,
        Err(error) => return warn!(%error, "rejected price-task submission"),
    };

    // This process only evaluates percentProp tasks; timeProp submissions are for time_tasks.
    if !matches!(task.property, TaskProperty::Percent(_)) {
        return;
    }

    let task_id = task.task_id.clone();
    match spawn_progress_evaluator(task, index.clone(), results) {
        Ok(handle) => registry.add(handle),
        Err(error) => warn!(%error, task_id, "failed to spawn progress evaluator"),
    }
}

async fn run_stops(base_dir: std::path::PathBuf, registry: Arc<TaskRegistry>) {
    let mut stops = match Subscriber::<PriceTaskStopRequest>::connect(Endpoint::PriceTaskStop, &base_dir).await {
        Ok(subscriber) => subscriber,
        Err(error) => return tracing::error!(%error, "failed to connect to price-task stop requests"),
    };

    loop {
        match stops.recv().await {
            Ok(Some(request)) => {
                registry.remove_by_user_and_task(&request.user_id, &request.task_id);
            }
            Ok(None) => {
                info!("price-task stop publisher disconnected");
                break;
            }
            Err(error) => warn!(%error, "failed to decode price-task stop request, skipping"),
        }
    }
}

/// Bridge the evaluators' synchronous [`Tx`](marketpulse_integration::channel::Tx) sink onto the
/// async `price-result` broker publisher.
fn spawn_result_relay(publisher: Publisher<PriceTaskResult>) -> UnboundedTx<PriceTaskResult> {
    let (tx, mut rx) = marketpulse_integration::channel::mpsc_unbounded::<PriceTaskResult>();
    tokio::spawn(async move {
        while let Some(result) = rx.recv().await {
            if let Err(error) = publisher.publish(&result).await {
                warn!(%error, "failed to publish price-task result");
            }
        }
    });
    tx
}
