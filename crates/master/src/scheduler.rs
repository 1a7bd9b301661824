//! Background experiment scheduling loop.
//!
//! One loop runs per submitted suite, spawned after every worker
//! environment is initialized. The loop keeps the worker pool saturated
//! with dispatches — it does not wait for the last experiments to finish,
//! and it never retries a failed send (the experiment stays where it is
//! and the gap shows up in the log).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use gauntlet_core::entity::{ExperimentStatus, Worker};
use gauntlet_core::protocol::RunRequest;

use crate::state::AppState;

/// Dispatch a suite's experiments across the worker pool.
///
/// Invariant: at most one Running experiment per worker. The loop snapshots
/// the Running count among already-dispatched experiments each iteration;
/// worker callbacks interleave at the await points and free slots for the
/// next snapshot to see.
pub async fn run_scheduling_loop(
    state: Arc<AppState>,
    experiment_ids: Vec<String>,
    workers: Vec<Worker>,
) {
    let workers_num = workers.len();
    let experiments_num = experiment_ids.len();
    if workers_num == 0 {
        warn!("no workers available, nothing to schedule");
        return;
    }

    info!(">>> Starting scheduling loop");
    info!("Found {} available workers.", workers_num);
    info!("Running {} experiments.", experiments_num);

    let tick = Duration::from_millis(state.config.scheduler.tick_ms);
    let mut todo: VecDeque<String> = experiment_ids.into_iter().collect();
    let mut dispatched: Vec<String> = Vec::new();
    let mut worker_index = 0usize;

    while !todo.is_empty() {
        let running_num = count_running(&state, &dispatched).await;
        if running_num < workers_num {
            if let Some(experiment_id) = todo.pop_front() {
                dispatch(&state, &experiment_id, &workers[worker_index]).await;
                dispatched.push(experiment_id);
                worker_index = (worker_index + 1) % workers_num;
            }
        }
        tokio::time::sleep(tick).await;
    }

    info!(
        "<<< Scheduling loop completed ({}/{}).",
        dispatched.len(),
        experiments_num
    );
}

/// Running experiments among those this loop has dispatched.
async fn count_running(state: &AppState, dispatched: &[String]) -> usize {
    let registry = state.registry.read().await;
    dispatched
        .iter()
        .filter(|id| {
            registry
                .experiment(id)
                .map(|e| e.status == ExperimentStatus::Running)
                .unwrap_or(false)
        })
        .count()
}

/// Send one experiment to one worker.
///
/// The transition to Scheduled happens on send, before the worker
/// acknowledges — the worker reports Running only once it begins work.
async fn dispatch(state: &AppState, experiment_id: &str, worker: &Worker) {
    let request = {
        let mut registry = state.registry.write().await;
        let experiment = match registry.experiment_mut(experiment_id) {
            Ok(experiment) => experiment,
            Err(e) => {
                warn!(experiment_id = %experiment_id, error = %e, "cannot dispatch");
                return;
            }
        };
        if let Err(e) = experiment.advance(ExperimentStatus::Scheduled) {
            warn!(experiment_id = %experiment_id, error = %e, "skipping dispatch");
            return;
        }
        RunRequest {
            suite_id: experiment.suite_id.clone(),
            data_name: experiment.dataset.clone(),
            experiment_id: experiment.id.clone(),
            master_address: worker.master_address.clone(),
            parameters: experiment.parameters.clone(),
        }
    };

    if let Err(e) = state.worker_rpc.run(worker, &request).await {
        // Not retried and not rolled back: the status stays Scheduled.
        warn!(
            experiment_id = %experiment_id,
            worker = %worker.address(),
            error = %e,
            "run dispatch failed"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────
