use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use common::api;

use crate::{
    app_state::AppState,
    error::ApiResult,
    persistence as db,
    services::targets as target_service,
    tasks::sweep::run_keepalive_sweep,
};

pub fn build_router() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/health", axum::routing::get(healthz))
        .route("/metrics", axum::routing::get(metrics))
        .route("/api/v1/targets", axum::routing::post(create_target))
        .route(
            "/api/v1/targets/{target_id}",
            axum::routing::delete(deactivate_target),
        )
        .route(
            "/api/v1/clients/{client_id}/targets",
            axum::routing::get(list_client_targets),
        )
        .route("/api/v1/sweep", axum::routing::post(run_sweep))
}

fn to_api_target(record: db::TargetRecord) -> api::Target {
    api::Target {
        id: record.id,
        client_id: record.client_id,
        url: record.url,
        duration_minutes: record.duration_minutes,
        created_at: record.created_at,
        expires_at: record.expires_at,
        is_active: record.is_active,
        last_ping_at: record.last_ping_at,
        last_ping_status: record.last_ping_status,
        ping_count: record.ping_count,
    }
}

/// Health response including version metadata and the schema state so
/// operators can verify a deployment before pointing traffic at it.
#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    schema_version: Option<i64>,
    target_schema_version: Option<i64>,
    pending_migrations: usize,
}

/// Aggregate outcome of one sweep invocation; no per-target detail.
#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct SweepResponse {
    pub probed: usize,
    pub failed_updates: usize,
    pub expired: u64,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check", body = HealthResponse)),
    tag = "system"
)]
pub(crate) async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::version::VERSION,
        schema_version: state.schema.latest_applied,
        target_schema_version: state.schema.latest_available,
        pending_migrations: state.schema.pending.len(),
    })
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, description = "Prometheus metrics", content_type = "text/plain")),
    tag = "system"
)]
pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics_handle.render();
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    )
}

#[utoipa::path(
    post,
    path = "/api/v1/targets",
    request_body = api::CreateTargetRequest,
    responses(
        (status = 201, description = "Target registered and probed", body = api::Target),
        (
            status = 400,
            description = "Rejected registration (invalid_url, invalid_duration, or quota_exceeded)",
            body = api::ErrorResponse
        )
    ),
    tag = "targets"
)]
pub(crate) async fn create_target(
    State(state): State<AppState>,
    Json(body): Json<api::CreateTargetRequest>,
) -> ApiResult<(StatusCode, Json<api::Target>)> {
    let record = target_service::admit_target(
        &state,
        target_service::AdmissionRequest {
            client_id: body.client_id,
            url: body.url,
            duration_minutes: body.duration_minutes,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(to_api_target(record))))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/targets",
    params(("client_id" = String, Path, description = "Opaque client identifier")),
    responses((status = 200, description = "The client's targets, newest first", body = [api::Target])),
    tag = "targets"
)]
pub(crate) async fn list_client_targets(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<Json<Vec<api::Target>>> {
    let records = target_service::list_targets(&state, &client_id).await?;
    Ok(Json(records.into_iter().map(to_api_target).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/targets/{target_id}",
    params(("target_id" = Uuid, Path, description = "Target identifier")),
    responses(
        (status = 200, description = "Target deactivated (idempotent)", body = api::Target),
        (status = 404, description = "Unknown target id", body = api::ErrorResponse)
    ),
    tag = "targets"
)]
pub(crate) async fn deactivate_target(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
) -> ApiResult<Json<api::Target>> {
    let record = target_service::deactivate_target(&state, target_id).await?;
    Ok(Json(to_api_target(record)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sweep",
    responses(
        (status = 200, description = "Sweep completed", body = SweepResponse),
        (status = 503, description = "Store unavailable", body = api::ErrorResponse)
    ),
    tag = "system"
)]
pub(crate) async fn run_sweep(State(state): State<AppState>) -> ApiResult<Json<SweepResponse>> {
    let report = run_keepalive_sweep(&state.db, &state.probe, Utc::now()).await?;
    info!(
        probed = report.probed,
        failed_updates = report.failed_updates,
        expired = report.expired,
        "sweep triggered via API"
    );
    Ok(Json(SweepResponse {
        probed: report.probed,
        failed_updates: report.failed_updates,
        expired: report.expired,
    }))
}
