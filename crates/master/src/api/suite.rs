//! Suite submission, status, and dump endpoints.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::Json;
use tracing::{info, warn};

use gauntlet_core::entity::{Candidate, Dataset, Experiment, Worker};
use gauntlet_core::params::generate_experiment_settings;
use gauntlet_core::protocol::{
    grid_from_entries, ArtifactSource, ExperimentStatusEntry, SuiteCreated, SuiteSettings,
    SuiteStatusResponse,
};
use gauntlet_core::registry::Registry;

use crate::scheduler::run_scheduling_loop;
use crate::state::AppState;
use crate::worker_client::initialize_worker_envs;
use crate::{api, export};

/// Multipart parts of a suite submission.
struct SubmissionParts {
    settings: SuiteSettings,
    candidate_source: Option<Vec<u8>>,
    data_source: Option<Vec<u8>>,
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionParts, (StatusCode, String)> {
    let mut settings = None;
    let mut candidate_source = None;
    let mut data_source = None;

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
            "suite_settings" => {
                settings = Some(serde_json::from_slice::<SuiteSettings>(&bytes).map_err(
                    |e| (StatusCode::BAD_REQUEST, format!("invalid suite settings: {}", e)),
                )?);
            }
            "candidate_source" => candidate_source = Some(bytes.to_vec()),
            "data_source" => data_source = Some(bytes.to_vec()),
            _ => {}
        }
    }

    let settings = settings.ok_or((
        StatusCode::BAD_REQUEST,
        "missing suite_settings part".to_string(),
    ))?;
    Ok(SubmissionParts {
        settings,
        candidate_source,
        data_source,
    })
}

/// Register every `.arff` file in the catalog directory as a dataset.
/// Runs once, on the first submission that finds the registry empty.
fn bootstrap_dataset_catalog(registry: &mut Registry, catalog_dir: &Path) {
    for entry in walkdir::WalkDir::new(catalog_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().map(|e| e == "arff").unwrap_or(false) {
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                registry.insert_dataset(Dataset::new(name, path.to_path_buf()));
            }
        }
    }
}

/// Save a locally uploaded dataset and return its registered name, or
/// resolve the remote selector (empty selector = the whole catalog).
async fn resolve_dataset_name(
    state: &AppState,
    parts: &SubmissionParts,
) -> Result<String, (StatusCode, String)> {
    if parts.settings.data.source == ArtifactSource::Local {
        let content = parts.data_source.as_deref().ok_or((
            StatusCode::BAD_REQUEST,
            "missing data_source part for local dataset".to_string(),
        ))?;
        let basename = Path::new(&parts.settings.data.url)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or((StatusCode::BAD_REQUEST, "invalid dataset path".to_string()))?
            .replace('_', "-");
        let path = state.upload_dataset_dir().join(&basename);
        api::save_file(&path, content)
            .await
            .map_err(api::error_response)?;
        Ok(basename.trim_end_matches(".arff").to_string())
    } else {
        Ok(parts.settings.data.url.clone())
    }
}

/// Create a new experiment suite from the settings encoded in the
/// multipart payload, initialize every worker, and start the scheduling
/// loop in the background.
#[utoipa::path(
    post,
    path = "/suite",
    tag = "Suites",
    request_body(content = String, content_type = "multipart/form-data", description = "suite_settings JSON plus optional candidate_source / data_source files"),
    responses(
        (status = 200, description = "Suite created and scheduling started", body = Object),
        (status = 400, description = "Malformed settings or parameter grid"),
        (status = 500, description = "Worker initialization failed")
    )
)]
pub async fn submit_suite(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SuiteCreated>, (StatusCode, String)> {
    let parts = read_submission(multipart).await?;

    // Validate the grid before creating any entity or contacting a worker:
    // a malformed parameter spec must abort the submission outright.
    let grid = grid_from_entries(&parts.settings.candidate_parameters)
        .map_err(api::error_response)?;

    let suite = {
        let mut registry = state.registry.write().await;
        registry.create_suite()
    };
    info!(suite_id = %suite.id, "creating experiment suite");

    let data_name = resolve_dataset_name(&state, &parts).await?;

    // Persist a local candidate artifact under the suite directory.
    let candidate_path = match parts.settings.candidate.source {
        ArtifactSource::Local => {
            let content = parts.candidate_source.as_deref().ok_or((
                StatusCode::BAD_REQUEST,
                "missing candidate_source part for local candidate".to_string(),
            ))?;
            let basename = Path::new(&parts.settings.candidate.url)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("candidate");
            let path = state.suite_dir(&suite.id).join(basename);
            api::save_file(&path, content)
                .await
                .map_err(api::error_response)?;
            path
        }
        ArtifactSource::Remote => {
            let path = PathBuf::from(&parts.settings.candidate.url);
            if !path.exists() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("candidate '{}' does not exist", parts.settings.candidate.url),
                ));
            }
            path
        }
    };

    let (experiment_ids, workers, candidate_id, dataset_names) = {
        let mut registry = state.registry.write().await;

        if !registry.has_datasets() {
            bootstrap_dataset_catalog(&mut registry, &state.config.storage.catalog_dir);
        }
        let dataset_names: Vec<String> = if data_name.is_empty() {
            registry.datasets().iter().map(|d| d.name.clone()).collect()
        } else {
            vec![data_name]
        };

        if !registry.has_workers() {
            for spec in &parts.settings.workers {
                registry.insert_worker(Worker::new(
                    &spec.hostname,
                    spec.port,
                    &parts.settings.master_address,
                ));
            }
        }
        let workers = registry.workers();

        let candidate = registry.insert_candidate(Candidate::new(
            &suite.id,
            candidate_path,
            grid.clone(),
            parts.settings.candidate_requirements.clone(),
        ));

        let experiment_ids: Vec<String> = generate_experiment_settings(&dataset_names, &grid)
            .iter()
            .map(|setting| {
                registry
                    .insert_experiment(Experiment::new(
                        &suite.id,
                        &candidate.id,
                        &setting.dataset_name,
                        &setting.parameters,
                    ))
                    .id
            })
            .collect();

        (experiment_ids, workers, candidate.id, dataset_names)
    };

    info!(
        suite_id = %suite.id,
        experiments = experiment_ids.len(),
        workers = workers.len(),
        "suite expanded"
    );

    initialize_worker_envs(
        &state.worker_rpc,
        &workers,
        &suite.id,
        &candidate_id,
        &parts.settings.candidate_requirements,
        &dataset_names,
    )
    .await
    .map_err(|e| {
        warn!(suite_id = %suite.id, error = %e, "suite creation aborted");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    tokio::spawn(run_scheduling_loop(
        state.clone(),
        experiment_ids,
        workers,
    ));

    Ok(Json(SuiteCreated { suite_id: suite.id }))
}

/// List a suite's experiments with their canonical status strings.
///
/// An unknown suite yields an empty list; clients treat that as "suite
/// not found".
#[utoipa::path(
    get,
    path = "/suite/{suite_id}/experiments",
    tag = "Suites",
    params(("suite_id" = String, Path, description = "Suite id")),
    responses(
        (status = 200, description = "Experiment ids and statuses", body = Object)
    )
)]
pub async fn suite_status(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(suite_id): axum::extract::Path<String>,
) -> Json<SuiteStatusResponse> {
    let registry = state.registry.read().await;
    let experiments = registry
        .experiments_by_suite(&suite_id)
        .iter()
        .map(|e| ExperimentStatusEntry {
            id: e.id.clone(),
            status: e.status.to_string(),
        })
        .collect();
    Json(SuiteStatusResponse {
        suite_id,
        experiments,
    })
}

/// Export the suite's completed results as CSV.
#[utoipa::path(
    get,
    path = "/suite/{suite_id}/dump",
    tag = "Suites",
    params(("suite_id" = String, Path, description = "Suite id")),
    responses(
        (status = 200, description = "CSV dump of completed experiments", body = String, content_type = "text/csv"),
        (status = 404, description = "Suite not found")
    )
)]
pub async fn suite_dump(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(suite_id): axum::extract::Path<String>,
) -> Result<([(header::HeaderName, &'static str); 1], String), (StatusCode, String)> {
    let registry = state.registry.read().await;
    let experiments = registry.experiments_by_suite(&suite_id);
    if experiments.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Suite not found: {}", suite_id),
        ));
    }

    let candidate_names: HashMap<String, String> = experiments
        .iter()
        .filter_map(|e| {
            registry
                .candidate(&e.candidate_id)
                .ok()
                .map(|c| (c.id.clone(), c.name.clone()))
        })
        .collect();

    let dump = export::build_dump(&experiments, &candidate_names).map_err(|e| {
        warn!(suite_id = %suite_id, error = %e, "dump export failed");
        api::error_response(e)
    })?;

    Ok(([(header::CONTENT_TYPE, "text/csv")], dump))
}
