use chrono::{Duration as ChronoDuration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{ApiResult, AppError};
use crate::persistence::{self as db, targets};
use crate::validation;

/// Domain-level admission request (HTTP wrappers convert into this).
#[derive(Clone, Debug)]
pub struct AdmissionRequest {
    pub client_id: String,
    pub url: String,
    pub duration_minutes: i64,
}

/// Admits a new target: validates, probes the URL once, and inserts the row
/// under the per-client quota. Nothing is persisted on any rejection path.
pub async fn admit_target(state: &AppState, req: AdmissionRequest) -> ApiResult<db::TargetRecord> {
    let client_id = validation::validate_client_id(&req.client_id)?.to_string();
    let url = req.url.trim().to_string();
    validation::validate_target_url(&url, state.probe_cfg.allow_insecure_targets)?;
    validation::validate_duration_minutes(req.duration_minutes)?;

    // The admission probe both tests the URL and counts as ping number one.
    let outcome = state.probe.check(&url).await;

    let created_at = Utc::now();
    let new = db::NewTarget {
        id: Uuid::new_v4(),
        client_id,
        url,
        duration_minutes: req.duration_minutes,
        created_at,
        expires_at: created_at + ChronoDuration::minutes(req.duration_minutes),
        last_ping_at: created_at,
        last_ping_status: outcome.status,
    };

    let Some(record) = targets::insert_target_within_quota(&state.db, new).await? else {
        return Err(AppError::quota_exceeded(format!(
            "maximum of {} active targets allowed per client",
            validation::MAX_ACTIVE_TARGETS
        )));
    };

    info!(
        target_id = %record.id,
        client_id = %record.client_id,
        initial_status = outcome.status,
        expires_at = %record.expires_at,
        "target admitted"
    );

    Ok(record)
}

/// All targets owned by `client_id`, newest first.
pub async fn list_targets(state: &AppState, client_id: &str) -> ApiResult<Vec<db::TargetRecord>> {
    let client_id = validation::validate_client_id(client_id)?;
    let records = targets::list_targets_for_client(&state.db, client_id).await?;
    Ok(records)
}

/// Marks a target inactive. Idempotent: deactivating an already-inactive
/// target returns its terminal record unchanged.
pub async fn deactivate_target(state: &AppState, id: Uuid) -> ApiResult<db::TargetRecord> {
    let Some(existing) = targets::get_target(&state.db, id).await? else {
        return Err(AppError::not_found("target not found"));
    };

    if !existing.is_active {
        return Ok(existing);
    }

    targets::deactivate_target(&state.db, id).await?;
    let record = targets::get_target(&state.db, id)
        .await?
        .ok_or_else(|| AppError::internal("target vanished during deactivation"))?;

    info!(target_id = %record.id, client_id = %record.client_id, "target deactivated");

    Ok(record)
}


#[cfg(test)]
mod tests {
    use super::test_support::{admission, setup_state};
    use super::*;
    use crate::persistence::targets as target_store;
    use common::api::UNREACHABLE_STATUS;
    use httpmock::Method::HEAD;
    use httpmock::MockServer;

    #[tokio::test]
    async fn admission_probes_once_and_seeds_counters() {
        let state = setup_state().await;
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(HEAD).path("/app");
            then.status(200);
        });

        let record = admit_target(&state, admission("client-a", &server.url("/app"), 60))
            .await
            .expect("admitted");

        assert_eq!(record.ping_count, 1);
        assert_eq!(record.last_ping_status, 200);
        assert!(record.is_active);
        assert_eq!(
            record.expires_at,
            record.created_at + chrono::Duration::minutes(60)
        );
        mock.assert();
    }

    #[tokio::test]
    async fn unreachable_url_is_still_admitted_with_sentinel_status() {
        let state = setup_state().await;

        // Port 1 refuses connections; the probe outcome is a normal result.
        let record = admit_target(&state, admission("client-a", "http://127.0.0.1:1/", 60))
            .await
            .expect("admitted");

        assert_eq!(record.last_ping_status, UNREACHABLE_STATUS);
        assert_eq!(record.ping_count, 1);
        assert!(record.is_active);
    }

    #[tokio::test]
    async fn rejects_non_https_url_without_persisting() {
        let mut state = setup_state().await;
        state.probe_cfg.allow_insecure_targets = false;

        let err = admit_target(&state, admission("client-a", "http://example.com", 60))
            .await
            .unwrap_err();
        assert_eq!(err.code, "invalid_url");
        assert_eq!(
            target_store::count_active_targets(&state.db, "client-a")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn rejects_out_of_range_durations() {
        let state = setup_state().await;
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(HEAD);
            then.status(200);
        });

        for minutes in [0, 721] {
            let err = admit_target(&state, admission("client-a", &server.url("/"), minutes))
                .await
                .unwrap_err();
            assert_eq!(err.code, "invalid_duration", "minutes: {minutes}");
        }

        for minutes in [1, 720] {
            admit_target(&state, admission(&format!("client-{minutes}"), &server.url("/"), minutes))
                .await
                .expect("boundary duration admitted");
        }
    }

    #[tokio::test]
    async fn quota_rejection_and_release() {
        let state = setup_state().await;
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(HEAD);
            then.status(200);
        });

        let mut first_id = None;
        for _ in 0..3 {
            let record = admit_target(&state, admission("client-a", &server.url("/"), 60))
                .await
                .expect("admitted");
            first_id.get_or_insert(record.id);
        }

        let err = admit_target(&state, admission("client-a", &server.url("/"), 60))
            .await
            .unwrap_err();
        assert_eq!(err.code, "quota_exceeded");

        deactivate_target(&state, first_id.unwrap())
            .await
            .expect("deactivated");
        admit_target(&state, admission("client-a", &server.url("/"), 60))
            .await
            .expect("slot freed");
    }

    #[tokio::test]
    async fn deactivate_unknown_target_is_not_found() {
        let state = setup_state().await;
        let err = deactivate_target(&state, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code, "not_found");
    }

    #[tokio::test]
    async fn deactivate_twice_returns_same_terminal_state() {
        let state = setup_state().await;
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(HEAD);
            then.status(200);
        });

        let record = admit_target(&state, admission("client-a", &server.url("/"), 60))
            .await
            .unwrap();

        let first = deactivate_target(&state, record.id).await.unwrap();
        assert!(!first.is_active);

        let second = deactivate_target(&state, record.id).await.unwrap();
        assert!(!second.is_active);
        assert_eq!(second.ping_count, first.ping_count);
        assert_eq!(second.expires_at, first.expires_at);
    }

    #[tokio::test]
    async fn list_returns_only_the_clients_targets() {
        let state = setup_state().await;
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(HEAD);
            then.status(200);
        });

        admit_target(&state, admission("client-a", &server.url("/a"), 60))
            .await
            .unwrap();
        admit_target(&state, admission("client-b", &server.url("/b"), 60))
            .await
            .unwrap();

        let listed = list_targets(&state, "client-a").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].url.ends_with("/a"));
    }
}
