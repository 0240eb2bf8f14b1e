use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use common::api::Target;

use crate::api_client::ApiClient;

/// Targets worth pinging from this session: active and not yet expired by the
/// local clock. The server sweep remains the authoritative timer; this filter
/// only avoids wasted requests.
pub fn pingable_targets(targets: &[Target], now: DateTime<Utc>) -> Vec<Target> {
    targets
        .iter()
        .filter(|t| t.is_active && t.expires_at > now)
        .cloned()
        .collect()
}

/// One best-effort ping. The response may be opaque or an error (cross-origin
/// style restrictions, sleeping hosts); the request leaving the session is all
/// this path promises, so every outcome is swallowed.
pub async fn send_keepalive_ping(client: &reqwest::Client, url: &str, timeout: Duration) {
    match tokio::time::timeout(timeout, client.head(url).send()).await {
        Ok(Ok(resp)) => debug!(%url, status = resp.status().as_u16(), "keepalive ping sent"),
        Ok(Err(err)) => debug!(%url, %err, "keepalive ping failed"),
        Err(_) => debug!(%url, "keepalive ping timed out"),
    }
}

/// Session-scoped redundant pinger. Pings the current set immediately and
/// then on a fixed cadence; any change to the set cancels the pending tick
/// and re-evaluates, and an empty set parks the loop with no timer armed.
/// Never writes anything back to the server.
pub async fn pinger_loop(
    client: reqwest::Client,
    ping_interval: Duration,
    ping_timeout: Duration,
    mut targets: watch::Receiver<Vec<Target>>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let snapshot = targets.borrow().clone();
        let active = pingable_targets(&snapshot, Utc::now());

        if active.is_empty() {
            tokio::select! {
                _ = shutdown.changed() => break,
                changed = targets.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            continue;
        }

        debug!(count = active.len(), "pinging tracked targets");
        for target in &active {
            send_keepalive_ping(&client, &target.url, ping_timeout).await;
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            changed = targets.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep(ping_interval) => {}
        }
    }

    Ok(())
}

/// Publishes the client's tracked target set into `targets_tx` on a fixed
/// cadence. Refresh failures are logged and retried next cycle; the pinger
/// keeps working from the last known set meanwhile.
pub async fn refresh_loop(
    api: ApiClient,
    client_id: String,
    refresh_interval: Duration,
    targets_tx: watch::Sender<Vec<Target>>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(refresh_interval);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                match api.list_targets(&client_id).await {
                    Ok(list) => {
                        // Only a real change should interrupt the pinger's cadence.
                        targets_tx.send_if_modified(|current| {
                            if *current != list {
                                *current = list;
                                true
                            } else {
                                false
                            }
                        });
                    }
                    Err(err) => warn!(?err, "target list refresh failed"),
                }
            }
        }
    }

    Ok(())
}
