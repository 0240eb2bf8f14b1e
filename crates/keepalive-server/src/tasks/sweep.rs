use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, warn};

use crate::Result;
use crate::app_state::AppState;
use crate::persistence::{self as db, targets as target_store};
use crate::probe::LivenessProbe;

#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    /// Targets whose probe outcome was persisted this invocation.
    pub probed: usize,
    /// Targets whose probe ran but whose update failed; the batch continues.
    pub failed_updates: usize,
    /// Targets retired by the expiry pass.
    pub expired: u64,
}

/// Built-in sweep trigger. The sweep itself is stateless; this loop only
/// supplies a cadence when no external scheduler invokes `POST /api/v1/sweep`.
pub async fn sweep_loop(state: AppState) {
    let sweep_interval = Duration::from_secs(state.sweep_cfg.interval_secs.max(1));
    let mut interval = tokio::time::interval(sweep_interval);

    loop {
        interval.tick().await;
        match run_keepalive_sweep(&state.db, &state.probe, Utc::now()).await {
            Ok(report) if report.probed > 0 || report.expired > 0 => {
                info!(
                    probed = report.probed,
                    failed_updates = report.failed_updates,
                    expired = report.expired,
                    "keepalive sweep completed"
                );
            }
            Ok(_) => {}
            Err(err) => {
                counter!("keepalive_sweep_failures_total").increment(1);
                warn!(?err, "keepalive sweep failed");
            }
        }
    }
}

/// One batch pass: probe every active, non-expired target, persist each
/// outcome, then retire everything whose lifetime has elapsed. Per-target
/// failures are isolated; the invocation fails only if the scan itself does.
pub async fn run_keepalive_sweep(
    db: &db::Db,
    probe: &LivenessProbe,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let pingable = target_store::list_pingable_targets(db, now).await?;
    let mut report = SweepReport::default();

    for target in &pingable {
        let outcome = probe.check(&target.url).await;
        counter!(
            "keepalive_probes_total",
            "outcome" => if outcome.success { "ok" } else { "unreachable" }
        )
        .increment(1);

        match target_store::record_ping(db, target.id, Utc::now(), outcome.status).await {
            // Deactivated since the snapshot; its counters stay final.
            Ok(0) => {}
            Ok(_) => report.probed += 1,
            Err(err) => {
                report.failed_updates += 1;
                warn!(
                    target_id = %target.id,
                    ?err,
                    "failed to persist probe outcome"
                );
            }
        }
    }

    // Re-read the clock so targets that elapsed while the batch was probing
    // are retired in the same invocation.
    let cutoff = Utc::now().max(now);
    report.expired = target_store::deactivate_expired(db, cutoff).await?;
    if report.expired > 0 {
        counter!("keepalive_targets_expired_total").increment(report.expired);
        info!(expired = report.expired, "targets expired");
    }

    counter!("keepalive_sweeps_total").increment(1);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::targets::test_support::{sample_target, setup_db};
    use crate::persistence::targets::{
        deactivate_target, get_target, insert_target_within_quota,
    };
    use chrono::Duration as ChronoDuration;
    use common::api::UNREACHABLE_STATUS;
    use httpmock::Method::HEAD;
    use httpmock::MockServer;

    fn test_probe() -> LivenessProbe {
        LivenessProbe::new(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn sweep_probes_active_targets_and_updates_counters() {
        let db = setup_db().await;
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(HEAD).path("/app");
            then.status(200);
        });

        let mut new = sample_target("client-a", 60);
        new.url = server.url("/app");
        let record = insert_target_within_quota(&db, new).await.unwrap().unwrap();

        let report = run_keepalive_sweep(&db, &test_probe(), Utc::now())
            .await
            .expect("sweep");

        assert_eq!(report.probed, 1);
        assert_eq!(report.failed_updates, 0);
        assert_eq!(report.expired, 0);
        mock.assert();

        let after = get_target(&db, record.id).await.unwrap().unwrap();
        assert_eq!(after.ping_count, 2);
        assert_eq!(after.last_ping_status, 200);
        assert!(after.is_active);
    }

    #[tokio::test]
    async fn unreachable_probe_persists_sentinel_and_keeps_target_active() {
        let db = setup_db().await;

        let mut new = sample_target("client-a", 60);
        new.url = "http://127.0.0.1:1/".into();
        let record = insert_target_within_quota(&db, new).await.unwrap().unwrap();

        let report = run_keepalive_sweep(&db, &test_probe(), Utc::now())
            .await
            .expect("sweep");

        assert_eq!(report.probed, 1);
        let after = get_target(&db, record.id).await.unwrap().unwrap();
        assert_eq!(after.last_ping_status, UNREACHABLE_STATUS);
        assert_eq!(after.ping_count, 2);
        assert!(after.is_active);
    }

    #[tokio::test]
    async fn one_unreachable_target_never_blocks_the_rest() {
        let db = setup_db().await;
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(HEAD).path("/healthy");
            then.status(200);
        });

        let mut dead = sample_target("client-a", 60);
        dead.url = "http://127.0.0.1:1/".into();
        // Probed first: expires soonest.
        dead.expires_at = Utc::now() + ChronoDuration::minutes(30);
        insert_target_within_quota(&db, dead).await.unwrap().unwrap();

        let mut healthy = sample_target("client-b", 60);
        healthy.url = server.url("/healthy");
        let healthy_record = insert_target_within_quota(&db, healthy)
            .await
            .unwrap()
            .unwrap();

        let report = run_keepalive_sweep(&db, &test_probe(), Utc::now())
            .await
            .expect("sweep");

        assert_eq!(report.probed, 2);
        mock.assert();
        let after = get_target(&db, healthy_record.id).await.unwrap().unwrap();
        assert_eq!(after.last_ping_status, 200);
    }

    #[tokio::test]
    async fn expired_targets_are_retired_even_when_never_probed() {
        let db = setup_db().await;
        let now = Utc::now();

        let mut elapsed = sample_target("client-a", 1);
        elapsed.created_at = now - ChronoDuration::minutes(10);
        elapsed.expires_at = now - ChronoDuration::minutes(9);
        // Unroutable on purpose: the expiry pass must not depend on probes.
        elapsed.url = "http://127.0.0.1:1/".into();
        let elapsed_id = elapsed.id;
        insert_target_within_quota(&db, elapsed).await.unwrap().unwrap();

        let report = run_keepalive_sweep(&db, &test_probe(), now)
            .await
            .expect("sweep");

        assert_eq!(report.probed, 0);
        assert_eq!(report.expired, 1);

        let after = get_target(&db, elapsed_id).await.unwrap().unwrap();
        assert!(!after.is_active);
        // The snapshot excluded it, so its counters never moved.
        assert_eq!(after.ping_count, 1);
    }

    #[tokio::test]
    async fn inactive_targets_are_never_probed_again() {
        let db = setup_db().await;
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(HEAD).path("/removed");
            then.status(200);
        });

        let mut new = sample_target("client-a", 60);
        new.url = server.url("/removed");
        let record = insert_target_within_quota(&db, new).await.unwrap().unwrap();
        deactivate_target(&db, record.id).await.unwrap();

        let report = run_keepalive_sweep(&db, &test_probe(), Utc::now())
            .await
            .expect("sweep");

        assert_eq!(report.probed, 0);
        assert_eq!(mock.hits(), 0);
        let after = get_target(&db, record.id).await.unwrap().unwrap();
        assert_eq!(after.ping_count, 1);
    }

    #[tokio::test]
    async fn sweep_is_idempotent_across_invocations() {
        let db = setup_db().await;
        let now = Utc::now();

        let mut elapsed = sample_target("client-a", 1);
        elapsed.created_at = now - ChronoDuration::minutes(10);
        elapsed.expires_at = now - ChronoDuration::minutes(9);
        elapsed.url = "http://127.0.0.1:1/".into();
        insert_target_within_quota(&db, elapsed).await.unwrap().unwrap();

        let first = run_keepalive_sweep(&db, &test_probe(), now).await.unwrap();
        assert_eq!(first.expired, 1);

        let second = run_keepalive_sweep(&db, &test_probe(), now).await.unwrap();
        assert_eq!(second.expired, 0);
        assert_eq!(second.probed, 0);
    }
}
