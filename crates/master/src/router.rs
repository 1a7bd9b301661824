//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single
//! `Router`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Uploads carry whole datasets; give them room.
const UPLOAD_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/suite",
            post(api::submit_suite).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/suite/{suite_id}/experiments", get(api::suite_status))
        .route("/suite/{suite_id}/dump", get(api::suite_dump))
        .route("/candidate/{candidate_id}", get(api::get_candidate))
        .route("/dataset/{dataset_name}", get(api::get_dataset))
        .route(
            "/experiment/{experiment_id}/status",
            post(api::update_status),
        )
        .route(
            "/experiment/{experiment_id}/result",
            post(api::deliver_result).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use gauntlet_core::config::{Config, MasterConfig, SchedulerConfig, StorageConfig};
    use gauntlet_core::entity::Experiment;

    use crate::worker_client::HttpWorkerRpc;

    fn test_state() -> Arc<AppState> {
        let config = Config {
            master: MasterConfig {
                host: "127.0.0.1".to_string(),
                port: 3290,
                cors_origin: "*".to_string(),
                advertised_host: None,
            },
            storage: StorageConfig {
                home_dir: "gauntlet-home".into(),
                catalog_dir: "catalog".into(),
            },
            scheduler: SchedulerConfig { tick_ms: 100 },
        };
        Arc::new(AppState::new(config, Arc::new(HttpWorkerRpc::new())))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_suite_status_is_an_empty_list() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/suite/suitnope/experiments")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["suite_id"], "suitnope");
        assert!(json["experiments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn suite_status_lists_experiment_statuses() {
        let state = test_state();
        let suite_id = {
            let mut registry = state.registry.try_write().unwrap();
            let suite = registry.create_suite();
            registry.insert_experiment(Experiment::new(&suite.id, "cand1", "shuttle", "k=1"));
            suite.id
        };

        let app = build_router(state);
        let response = app
            .oneshot(
                Request::get(format!("/suite/{}/experiments", suite_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        let experiments = json["experiments"].as_array().unwrap();
        assert_eq!(experiments.len(), 1);
        assert_eq!(experiments[0]["status"], "created");
    }

    #[tokio::test]
    async fn status_update_from_worker_advances_the_experiment() {
        let state = test_state();
        let experiment_id = {
            let mut registry = state.registry.try_write().unwrap();
            let suite = registry.create_suite();
            let exp =
                registry.insert_experiment(Experiment::new(&suite.id, "cand1", "shuttle", "k=1"));
            exp.id
        };

        let app = build_router(state.clone());
        let response = app
            .oneshot(
                Request::post(format!("/experiment/{}/status", experiment_id))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"status": "scheduled"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let registry = state.registry.read().await;
        assert_eq!(
            registry.experiment(&experiment_id).unwrap().status.to_string(),
            "scheduled"
        );
    }

    #[tokio::test]
    async fn unknown_experiment_status_update_is_not_found() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/experiment/expenope/status")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"status": "running"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dump_of_unknown_suite_is_not_found() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/suite/suitnope/dump")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
