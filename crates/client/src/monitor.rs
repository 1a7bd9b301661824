//! Suite monitor: polls the master until every experiment is terminal.
//!
//! Blocks the calling task for the suite's entire duration. One suite at
//! a time; no cancellation beyond process termination.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use gauntlet_core::protocol::SuiteStatusResponse;

use crate::ui;

/// Where status snapshots come from; the live implementation is
/// [`crate::master_client::MasterSession`].
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_statuses(&self, suite_id: &str) -> Result<SuiteStatusResponse>;
}

/// Final tallies when a monitored suite reaches termination.
#[derive(Debug, PartialEq, Eq)]
pub struct MonitorReport {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    /// Status fetches performed, the initial snapshot included.
    pub polls: usize,
}

/// Poll the suite status on a heartbeat until every experiment reports a
/// terminal status. Fails immediately when the suite is unknown (the
/// master answers an empty experiment list).
pub async fn monitor_suite(
    source: &dyn StatusSource,
    suite_id: &str,
    heartbeat: Duration,
) -> Result<MonitorReport> {
    info!(">>> Starting run monitor");

    let initial = source.fetch_statuses(suite_id).await?;
    if initial.experiments.is_empty() {
        bail!("suite not found.");
    }

    let mut status_cache: HashMap<String, String> = HashMap::new();
    for experiment in &initial.experiments {
        debug!("Experiment {} - {}", experiment.id, experiment.status);
        status_cache.insert(experiment.id.clone(), experiment.status.clone());
    }

    let experiments_num = status_cache.len();
    let start_ts = Utc::now();
    let mut polls = 1usize;

    let report = loop {
        let current = source.fetch_statuses(suite_id).await?;
        polls += 1;
        for experiment in &current.experiments {
            if status_cache.get(&experiment.id) != Some(&experiment.status) {
                debug!("Experiment {} - {}", experiment.id, experiment.status);
                status_cache.insert(experiment.id.clone(), experiment.status.clone());
            }
        }

        let completed_num = status_cache.values().filter(|s| *s == "completed").count();
        let failed_num = status_cache.values().filter(|s| *s == "failed").count();
        ui::print_status_bar(start_ts, experiments_num, completed_num, failed_num);

        if status_cache
            .values()
            .all(|s| s == "completed" || s == "failed")
        {
            break MonitorReport {
                completed: completed_num,
                failed: failed_num,
                total: experiments_num,
                polls,
            };
        }
        tokio::time::sleep(heartbeat).await;
    };

    info!("<<< Run completed.");
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────
