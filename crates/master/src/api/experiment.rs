//! Worker → master experiment callbacks: status updates and result
//! delivery.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};

use gauntlet_core::entity::ExperimentStatus;
use gauntlet_core::protocol::StatusUpdate;

use crate::api;
use crate::state::AppState;

/// Apply a status reported by a worker to the experiment state machine.
#[utoipa::path(
    post,
    path = "/experiment/{experiment_id}/status",
    tag = "Experiments",
    params(("experiment_id" = String, Path, description = "Experiment id")),
    request_body(content = Object, description = "New status string"),
    responses(
        (status = 200, description = "Status applied"),
        (status = 400, description = "Unknown status string"),
        (status = 404, description = "Experiment not found"),
        (status = 409, description = "Illegal transition")
    )
)]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(experiment_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<StatusCode, (StatusCode, String)> {
    let status: ExperimentStatus = update.status.parse().map_err(api::error_response)?;

    let mut registry = state.registry.write().await;
    registry
        .experiment_mut(&experiment_id)
        .map_err(api::error_response)?
        .advance(status)
        .map_err(|e| {
            warn!(experiment_id = %experiment_id, error = %e, "status update rejected");
            api::error_response(e)
        })?;
    Ok(StatusCode::OK)
}

/// Receive the result artifacts for an experiment and mark it Completed.
///
/// When master and worker share a host the files may already be on disk;
/// existing files are left untouched and only the paths are recorded.
#[utoipa::path(
    post,
    path = "/experiment/{experiment_id}/result",
    tag = "Experiments",
    request_body(content = String, content_type = "multipart/form-data", description = "metrics.json and roc.png artifacts"),
    params(("experiment_id" = String, Path, description = "Experiment id")),
    responses(
        (status = 200, description = "Results stored, experiment completed"),
        (status = 404, description = "Experiment not found"),
        (status = 409, description = "Experiment already terminal")
    )
)]
pub async fn deliver_result(
    State(state): State<Arc<AppState>>,
    Path(experiment_id): Path<String>,
    mut multipart: Multipart,
) -> Result<StatusCode, (StatusCode, String)> {
    info!(experiment_id = %experiment_id, "saving experiment results");

    let suite_id = {
        let registry = state.registry.read().await;
        registry
            .experiment(&experiment_id)
            .map_err(api::error_response)?
            .suite_id
            .clone()
    };
    let base_dir = state.experiment_dir(&suite_id, &experiment_id);

    let mut metrics_part = None;
    let mut roc_part = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid part {}: {}", name, e)))?;
        match name.as_str() {
            "metrics.json" => metrics_part = Some(bytes.to_vec()),
            "roc.png" => roc_part = Some(bytes.to_vec()),
            _ => {}
        }
    }

    let metrics_path = base_dir.join("metrics.json");
    if !metrics_path.exists() {
        let content = metrics_part.ok_or((
            StatusCode::BAD_REQUEST,
            "missing metrics.json part".to_string(),
        ))?;
        api::save_file(&metrics_path, &content)
            .await
            .map_err(api::error_response)?;
    }

    let roc_path = base_dir.join("roc.png");
    if !roc_path.exists() {
        let content = roc_part.ok_or((
            StatusCode::BAD_REQUEST,
            "missing roc.png part".to_string(),
        ))?;
        api::save_file(&roc_path, &content)
            .await
            .map_err(api::error_response)?;
    }

    let mut registry = state.registry.write().await;
    let experiment = registry
        .experiment_mut(&experiment_id)
        .map_err(api::error_response)?;
    experiment.metrics_path = Some(metrics_path);
    experiment.roc_path = Some(roc_path);
    experiment
        .advance(ExperimentStatus::Completed)
        .map_err(|e| {
            warn!(experiment_id = %experiment_id, error = %e, "completion rejected");
            api::error_response(e)
        })?;
    Ok(StatusCode::OK)
}
