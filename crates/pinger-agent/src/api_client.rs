use reqwest::StatusCode;
use tracing::warn;
use uuid::Uuid;

use common::api::{CreateTargetRequest, Target};

/// Error returned by registration API calls. Rejections keep the status and
/// body so callers can distinguish quota refusals from transport failures.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("server rejected request: {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Typed client for the keepalive server's registration API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn list_targets(&self, client_id: &str) -> Result<Vec<Target>, ApiError> {
        let url = format!("{}/api/v1/clients/{}/targets", self.base_url, client_id);
        let res = self.client.get(url).send().await?;
        let res = check_status(res).await?;
        Ok(res.json().await?)
    }

    pub async fn create_target(&self, req: &CreateTargetRequest) -> Result<Target, ApiError> {
        let url = format!("{}/api/v1/targets", self.base_url);
        let res = self.client.post(url).json(req).send().await?;
        let res = check_status(res).await?;
        Ok(res.json().await?)
    }

    pub async fn deactivate_target(&self, id: Uuid) -> Result<Target, ApiError> {
        let url = format!("{}/api/v1/targets/{}", self.base_url, id);
        let res = self.client.delete(url).send().await?;
        let res = check_status(res).await?;
        Ok(res.json().await?)
    }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    warn!(%status, body, "keepalive server returned an error");
    Err(ApiError::Rejected { status, body })
}
