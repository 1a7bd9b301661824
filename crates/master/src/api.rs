//! HTTP API handlers.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use gauntlet_core::error::GauntletError;

use crate::state::AppState;

pub mod artifacts;
pub mod doc;
pub mod experiment;
pub mod suite;

pub use artifacts::{get_candidate, get_dataset};
pub use experiment::{deliver_result, update_status};
pub use suite::{submit_suite, suite_dump, suite_status};

/// Map a core error onto the HTTP boundary. Handler-level errors become
/// responses here; nothing propagates into the runtime.
pub(crate) fn error_response(e: GauntletError) -> (StatusCode, String) {
    let status = match &e {
        GauntletError::SuiteNotFound(_)
        | GauntletError::CandidateNotFound(_)
        | GauntletError::DatasetNotFound(_)
        | GauntletError::ExperimentNotFound(_)
        | GauntletError::WorkerNotFound(_) => StatusCode::NOT_FOUND,
        GauntletError::InvalidParameter(_) | GauntletError::UnknownStatus(_) => {
            StatusCode::BAD_REQUEST
        }
        GauntletError::InvalidTransition { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Write bytes to a path, creating parent directories as needed.
pub(crate) async fn save_file(path: &Path, content: &[u8]) -> Result<(), GauntletError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub suites: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Master process status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let registry = state.registry.read().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        suites: registry.suites().len(),
    })
}
