#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use keepalive_server::{
    app_state::AppState,
    config::{ProbeConfig, SweepConfig},
    http::build_router,
    metrics::init_metrics_recorder,
    persistence::{self as db, migrations},
    probe::LivenessProbe,
};
use tower::ServiceExt;

pub async fn setup_app() -> (Router, db::Db) {
    setup_app_with(true).await
}

pub async fn setup_app_with(allow_insecure_targets: bool) -> (Router, db::Db) {
    let pool = migrations::init_pool("sqlite::memory:").await.expect("pool");
    let schema = migrations::run_migrations(&pool).await.expect("migrations");

    let state = AppState {
        db: pool.clone(),
        probe: LivenessProbe::new(Duration::from_secs(1)),
        probe_cfg: ProbeConfig {
            timeout_secs: 1,
            allow_insecure_targets,
        },
        sweep_cfg: SweepConfig { interval_secs: 0 },
        metrics_handle: init_metrics_recorder(),
        schema,
    };

    (build_router().with_state(state), pool)
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(value.to_string())).expect("request")
        }
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let payload = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };

    (status, payload)
}

pub async fn send_text(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();

    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub fn create_body(client_id: &str, url: &str, duration_minutes: i64) -> serde_json::Value {
    serde_json::json!({
        "client_id": client_id,
        "url": url,
        "duration_minutes": duration_minutes,
    })
}
