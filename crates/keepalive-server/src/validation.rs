use url::Url;

use crate::error::{ApiResult, AppError};

pub const MIN_DURATION_MINUTES: i64 = 1;
pub const MAX_DURATION_MINUTES: i64 = 720;

/// Per-client cap on simultaneously active targets.
pub const MAX_ACTIVE_TARGETS: i64 = 3;

/// Validates that `raw` is an absolute URL with a host and an acceptable
/// scheme. Only `https` is admitted unless `allow_insecure` is set.
pub fn validate_target_url(raw: &str, allow_insecure: bool) -> ApiResult<Url> {
    let parsed = Url::parse(raw)
        .map_err(|_| AppError::invalid_url("url must be a valid absolute URL"))?;

    match parsed.scheme() {
        "https" => {}
        "http" if allow_insecure => {}
        _ => return Err(AppError::invalid_url("url must use the https scheme")),
    }

    if parsed.host_str().is_none() {
        return Err(AppError::invalid_url("url must include a host"));
    }

    Ok(parsed)
}

pub fn validate_duration_minutes(minutes: i64) -> ApiResult<()> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(AppError::invalid_duration(format!(
            "duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}

pub fn validate_client_id(client_id: &str) -> ApiResult<&str> {
    let trimmed = client_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("client_id is required"));
    }
    Ok(trimmed)
}
