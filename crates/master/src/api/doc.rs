//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers into a single spec,
//! served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "gauntlet master API",
        version = "0.1.0",
        description = "Suite scheduling master for distributed anomaly-detection benchmarks.",
    ),
    tags(
        (name = "Health", description = "Master process status"),
        (name = "Suites", description = "Suite submission, status polling, and CSV dump"),
        (name = "Experiments", description = "Worker callbacks: status updates and result delivery"),
        (name = "Artifacts", description = "Candidate source and dataset downloads for workers"),
    ),
    paths(
        crate::api::health,
        crate::api::suite::submit_suite,
        crate::api::suite::suite_status,
        crate::api::suite::suite_dump,
        crate::api::experiment::update_status,
        crate::api::experiment::deliver_result,
        crate::api::artifacts::get_candidate,
        crate::api::artifacts::get_dataset,
    )
)]
pub struct ApiDoc;
