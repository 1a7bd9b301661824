//! HTTP client for master → worker RPCs.
//!
//! Workers expose two endpoints: `setup/` (one-time per-suite environment
//! initialization) and `run/` (execute one experiment). Both take JSON and
//! answer with a bare status code.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;

use gauntlet_core::entity::Worker;
use gauntlet_core::protocol::{RunRequest, SetupRequest};

/// RPC surface the scheduling loop and the environment initializer use.
/// A trait so tests can drive both without a network.
#[async_trait]
pub trait WorkerRpc: Send + Sync {
    async fn setup(&self, worker: &Worker, request: &SetupRequest) -> Result<()>;
    async fn run(&self, worker: &Worker, request: &RunRequest) -> Result<()>;
}

/// Production implementation speaking HTTP via a shared connection pool.
pub struct HttpWorkerRpc {
    http: reqwest::Client,
}

impl HttpWorkerRpc {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    fn url(worker: &Worker, path: &str) -> String {
        let address = worker.address();
        if address.starts_with("http://") {
            format!("{}/{}", address.trim_end_matches('/'), path)
        } else {
            format!("http://{}/{}", address, path)
        }
    }

    async fn post_json<T: serde::Serialize>(&self, url: &str, body: &T) -> Result<()> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("worker not reachable at {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("worker returned {}: {}", status, body);
        }
        Ok(())
    }
}

impl Default for HttpWorkerRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerRpc for HttpWorkerRpc {
    async fn setup(&self, worker: &Worker, request: &SetupRequest) -> Result<()> {
        self.post_json(&Self::url(worker, "setup/"), request).await
    }

    async fn run(&self, worker: &Worker, request: &RunRequest) -> Result<()> {
        self.post_json(&Self::url(worker, "run/"), request).await
    }
}

/// Initialize every worker's environment for a suite, one worker at a
/// time. This is a hard barrier: the first failure aborts suite creation
/// and no scheduling happens.
pub async fn initialize_worker_envs(
    rpc: &Arc<dyn WorkerRpc>,
    workers: &[Worker],
    suite_id: &str,
    candidate_id: &str,
    requirements: &[String],
    datasets: &[String],
) -> Result<()> {
    for worker in workers {
        info!(
            "Setting up worker at {} on port {}",
            worker.hostname, worker.port
        );
        let request = SetupRequest {
            master_address: worker.master_address.clone(),
            suite_id: suite_id.to_string(),
            candidate_id: candidate_id.to_string(),
            requirements: requirements.to_vec(),
            datasets: datasets.to_vec(),
        };
        rpc.setup(worker, &request)
            .await
            .with_context(|| format!("worker initialization failed: {}", worker.address()))?;
        info!("worker {} initialized correctly", worker.id);
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedRpc {
        fail_on: Option<String>,
        setups: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WorkerRpc for ScriptedRpc {
        async fn setup(&self, worker: &Worker, _request: &SetupRequest) -> Result<()> {
            if self.fail_on.as_deref() == Some(worker.hostname.as_str()) {
                bail!("connection refused");
            }
            self.setups.lock().unwrap().push(worker.hostname.clone());
            Ok(())
        }

        async fn run(&self, _worker: &Worker, _request: &RunRequest) -> Result<()> {
            Ok(())
        }
    }

    fn workers() -> Vec<Worker> {
        vec![
            Worker::new("worker-a", 3291, "master:3290"),
            Worker::new("worker-b", 3291, "master:3290"),
            Worker::new("worker-c", 3291, "master:3290"),
        ]
    }

    #[tokio::test]
    async fn initializes_workers_in_sequence() {
        let rpc: Arc<dyn WorkerRpc> = Arc::new(ScriptedRpc {
            fail_on: None,
            setups: Mutex::new(Vec::new()),
        });
        initialize_worker_envs(&rpc, &workers(), "suite1", "cand1", &[], &["shuttle".into()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_setup_failure_aborts_the_barrier() {
        let scripted = Arc::new(ScriptedRpc {
            fail_on: Some("worker-b".to_string()),
            setups: Mutex::new(Vec::new()),
        });
        let rpc: Arc<dyn WorkerRpc> = scripted.clone();

        let result =
            initialize_worker_envs(&rpc, &workers(), "suite1", "cand1", &[], &[]).await;
        assert!(result.is_err());
        // worker-a was initialized, worker-c never reached
        assert_eq!(*scripted.setups.lock().unwrap(), vec!["worker-a".to_string()]);
    }

    #[test]
    fn urls_are_prefixed_once() {
        let worker = Worker::new("worker-a", 3291, "master:3290");
        assert_eq!(
            HttpWorkerRpc::url(&worker, "run/"),
            "http://worker-a:3291/run/"
        );
    }
}
