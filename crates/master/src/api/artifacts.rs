//! Artifact downloads for workers: candidate sources and dataset files.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api;
use crate::state::AppState;

/// Stream a candidate's source artifact.
#[utoipa::path(
    get,
    path = "/candidate/{candidate_id}",
    tag = "Artifacts",
    params(("candidate_id" = String, Path, description = "Candidate id")),
    responses(
        (status = 200, description = "Candidate source bytes"),
        (status = 404, description = "Candidate not found")
    )
)]
pub async fn get_candidate(
    State(state): State<Arc<AppState>>,
    Path(candidate_id): Path<String>,
) -> Result<Vec<u8>, (StatusCode, String)> {
    let source = {
        let registry = state.registry.read().await;
        registry
            .candidate(&candidate_id)
            .map_err(api::error_response)?
            .source
            .clone()
    };
    tokio::fs::read(&source)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, format!("candidate file unreadable: {}", e)))
}

/// Stream a dataset file: a catalog entry, or a locally uploaded dataset
/// stored under the master's home directory.
#[utoipa::path(
    get,
    path = "/dataset/{dataset_name}",
    tag = "Artifacts",
    params(("dataset_name" = String, Path, description = "Dataset name")),
    responses(
        (status = 200, description = "Dataset bytes"),
        (status = 404, description = "Dataset not found")
    )
)]
pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(dataset_name): Path<String>,
) -> Result<Vec<u8>, (StatusCode, String)> {
    let path = {
        let registry = state.registry.read().await;
        match registry.dataset_by_name(&dataset_name) {
            Some(dataset) => dataset.path.clone(),
            // Locally uploaded dataset
            None => state
                .upload_dataset_dir()
                .join(format!("{}.arff", dataset_name)),
        }
    };
    tokio::fs::read(&path)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, format!("dataset unreadable: {}", e)))
}
