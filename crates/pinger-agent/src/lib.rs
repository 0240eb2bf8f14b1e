pub mod api_client;
pub mod config;
pub mod identity;
pub mod pinger;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

use std::env;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use common::api::{CreateTargetRequest, Target};

use crate::api_client::ApiClient;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMode {
    /// Run the session pinger until interrupted.
    Run,
    /// Register a new target and print it.
    Add { url: String, duration_minutes: i64 },
    /// Deactivate a target by id.
    Remove { id: Uuid },
    /// Print this client's targets.
    List,
}

pub fn parse_command() -> Result<CommandMode> {
    let mut args = env::args().skip(1);
    let Some(first) = args.next() else {
        return Ok(CommandMode::Run);
    };

    match first.as_str() {
        "run" => Ok(CommandMode::Run),
        "add" => {
            let url = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: pinger-agent add <url> <minutes>"))?;
            let minutes = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: pinger-agent add <url> <minutes>"))?
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("minutes must be an integer"))?;
            Ok(CommandMode::Add {
                url,
                duration_minutes: minutes,
            })
        }
        "remove" => {
            let id = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: pinger-agent remove <id>"))?
                .parse::<Uuid>()
                .map_err(|_| anyhow::anyhow!("id must be a UUID"))?;
            Ok(CommandMode::Remove { id })
        }
        "list" => Ok(CommandMode::List),
        "--help" | "-h" => {
            println!(
                "Usage: pinger-agent [run|add <url> <minutes>|remove <id>|list]\n\
                 Run without arguments to start the session pinger."
            );
            std::process::exit(0);
        }
        other => anyhow::bail!("unknown command: {other}"),
    }
}

pub async fn run(mode: CommandMode) -> Result<()> {
    let cfg = config::load()?;
    let client_id = identity::load_or_create_client_id(&cfg.client_id_path())?;
    let api = ApiClient::new(&cfg.server_url);

    match mode {
        CommandMode::Add {
            url,
            duration_minutes,
        } => {
            let target = api
                .create_target(&CreateTargetRequest {
                    client_id,
                    url,
                    duration_minutes,
                })
                .await?;
            println!(
                "registered {} -> {} (expires {})",
                target.id, target.url, target.expires_at
            );
            Ok(())
        }
        CommandMode::Remove { id } => {
            let target = api.deactivate_target(id).await?;
            println!("deactivated {} ({})", target.id, target.url);
            Ok(())
        }
        CommandMode::List => {
            let targets = api.list_targets(&client_id).await?;
            if targets.is_empty() {
                println!("no targets registered for {client_id}");
            }
            for target in targets {
                print_target(&target);
            }
            Ok(())
        }
        CommandMode::Run => run_session(cfg, client_id, api).await,
    }
}

fn print_target(target: &Target) {
    let state = if target.is_active { "active" } else { "inactive" };
    println!(
        "{} {} {} pings={} last_status={} expires={}",
        target.id, state, target.url, target.ping_count, target.last_ping_status, target.expires_at
    );
}

async fn run_session(cfg: config::AppConfig, client_id: String, api: ApiClient) -> Result<()> {
    info!(%client_id, server_url = %cfg.server_url, "session pinger starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (targets_tx, targets_rx) = watch::channel(Vec::new());

    let refresh_handle = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(pinger::refresh_loop(
            api,
            client_id,
            Duration::from_secs(cfg.refresh_interval_secs.max(1)),
            targets_tx,
            shutdown,
        ))
    };

    let pinger_handle = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(pinger::pinger_loop(
            reqwest::Client::new(),
            Duration::from_secs(cfg.ping_interval_secs.max(1)),
            Duration::from_secs(cfg.ping_timeout_secs.max(1)),
            targets_rx,
            shutdown,
        ))
    };

    shutdown_signal().await;
    info!("shutdown signal received, stopping session pinger");
    let _ = shutdown_tx.send(true);

    let _ = refresh_handle.await;
    let _ = pinger_handle.await;

    Ok(())
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
