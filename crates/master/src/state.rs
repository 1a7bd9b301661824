//! Shared master state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use gauntlet_core::{Config, Registry};

use crate::worker_client::WorkerRpc;

/// State shared by every request handler and the scheduling loops.
///
/// The registry sits behind one coarse `RwLock`: every entity mutation
/// and every read feeding a scheduling decision goes through it.
pub struct AppState {
    pub config: Config,
    pub registry: RwLock<Registry>,
    /// RPC channel to workers; a trait object so the scheduling loop can
    /// run against a mock in tests.
    pub worker_rpc: Arc<dyn WorkerRpc>,
}

impl AppState {
    pub fn new(config: Config, worker_rpc: Arc<dyn WorkerRpc>) -> Self {
        Self {
            config,
            registry: RwLock::new(Registry::new()),
            worker_rpc,
        }
    }

    /// Working directory for a suite's artifacts.
    pub fn suite_dir(&self, suite_id: &str) -> PathBuf {
        self.config.storage.home_dir.join(suite_id)
    }

    /// Working directory for one experiment's result artifacts.
    pub fn experiment_dir(&self, suite_id: &str, experiment_id: &str) -> PathBuf {
        self.suite_dir(suite_id).join(experiment_id)
    }

    /// Directory for locally uploaded datasets.
    pub fn upload_dataset_dir(&self) -> PathBuf {
        self.config.storage.home_dir.join("dataset")
    }
}
