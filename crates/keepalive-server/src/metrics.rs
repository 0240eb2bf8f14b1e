use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static METRICS_HANDLE: std::sync::OnceLock<PrometheusHandle> = std::sync::OnceLock::new();

pub fn init_metrics_recorder() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .add_global_label("app_version", crate::version::VERSION)
                .install_recorder()
                .expect("metrics recorder already installed")
        })
        .clone()
}

pub fn record_build_info(snapshot: &crate::persistence::MigrationSnapshot) {
    gauge!(
        "keepalive_server_info",
        "version" => crate::version::VERSION,
        "schema_version" => snapshot
            .latest_applied
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string())
    )
    .set(1.0);

    gauge!("keepalive_server_migrations_pending").set(snapshot.pending.len() as f64);
}
