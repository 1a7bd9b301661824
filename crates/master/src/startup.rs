//! Server startup: shared state construction and the axum listener.

use std::sync::Arc;

use tracing::info;

use gauntlet_core::Config;

use crate::router::build_router;
use crate::state::AppState;
use crate::worker_client::{HttpWorkerRpc, WorkerRpc};

/// Build the shared application state with the production worker RPC.
pub fn build_app_state(config: Config) -> Arc<AppState> {
    let worker_rpc: Arc<dyn WorkerRpc> = Arc::new(HttpWorkerRpc::new());
    Arc::new(AppState::new(config, worker_rpc))
}

/// Bind the listener and serve until the process exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();

    let addr = format!("{}:{}", config.master.host, config.master.port);
    let state = build_app_state(config);
    let app = build_router(state);

    info!("gauntlet master listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
