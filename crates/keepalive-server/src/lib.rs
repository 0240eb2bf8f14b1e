pub mod app_state;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod openapi;
pub mod persistence;
pub mod probe;
pub mod services;
pub mod tasks;
pub mod validation;
pub mod version;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app_state::AppState;
use crate::metrics::{init_metrics_recorder, record_build_info};
use crate::probe::LivenessProbe;

/// Boot the keepalive server: configuration, migrations, background sweep
/// loop, and the HTTP listener.
pub async fn run() -> Result<()> {
    let app_config = config::load()?;
    let metrics_handle = init_metrics_recorder();

    let db_pool = persistence::migrations::init_pool(&app_config.database.url).await?;
    let schema = persistence::migrations::run_migrations(&db_pool).await?;
    info!(
        schema_version = schema.latest_applied,
        target_version = schema.latest_available,
        "database schema ready"
    );
    record_build_info(&schema);

    let probe = LivenessProbe::new(Duration::from_secs(app_config.probe.timeout_secs.max(1)));

    let state = AppState {
        db: db_pool,
        probe,
        probe_cfg: app_config.probe.clone(),
        sweep_cfg: app_config.sweep.clone(),
        metrics_handle,
        schema,
    };

    if state.sweep_cfg.interval_secs > 0 {
        tokio::spawn(tasks::sweep::sweep_loop(state.clone()));
        info!(
            interval_secs = state.sweep_cfg.interval_secs,
            "built-in sweep loop started"
        );
    } else {
        info!("built-in sweep loop disabled; waiting for external sweep triggers");
    }

    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port)
        .parse()
        .map_err(|err| anyhow::anyhow!("invalid listen address: {}", err))?;

    let app = http::build_router().with_state(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "keepalive server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| anyhow::anyhow!("keepalive server failed: {err}"))?;

    Ok(())
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => stream.recv().await,
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                None
            }
        };
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        },
    }
}
