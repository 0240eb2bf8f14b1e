use std::time::Duration;

use reqwest::header::USER_AGENT;
use tokio::time;
use tracing::debug;

pub use common::api::UNREACHABLE_STATUS;

/// Identifies keepalive traffic to the probed applications.
pub const PROBE_USER_AGENT: &str = concat!("pulsekeep-keepalive/", env!("CARGO_PKG_VERSION"));

/// Result of a single liveness probe. Never an error: an unreachable URL is a
/// normal outcome recorded with [`UNREACHABLE_STATUS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: i64,
    pub success: bool,
}

impl ProbeOutcome {
    pub fn unreachable() -> Self {
        Self {
            status: UNREACHABLE_STATUS,
            success: false,
        }
    }
}

/// Issues bounded HEAD requests against target URLs.
#[derive(Clone)]
pub struct LivenessProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn check(&self, url: &str) -> ProbeOutcome {
        let request = self
            .client
            .head(url)
            .header(USER_AGENT, PROBE_USER_AGENT)
            .send();

        match time::timeout(self.timeout, request).await {
            Ok(Ok(resp)) => {
                let status = resp.status();
                debug!(%url, status = status.as_u16(), "probe completed");
                ProbeOutcome {
                    status: status.as_u16() as i64,
                    success: status.is_success(),
                }
            }
            Ok(Err(err)) => {
                debug!(%url, %err, "probe failed");
                ProbeOutcome::unreachable()
            }
            Err(_) => {
                debug!(%url, timeout = ?self.timeout, "probe timed out");
                ProbeOutcome::unreachable()
            }
        }
    }
}
