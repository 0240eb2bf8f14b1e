use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Db;
use crate::Result;
use crate::validation::MAX_ACTIVE_TARGETS;

#[derive(Debug, Clone, FromRow)]
pub struct TargetRecord {
    pub id: Uuid,
    pub client_id: String,
    pub url: String,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub last_ping_at: DateTime<Utc>,
    pub last_ping_status: i64,
    pub ping_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewTarget {
    pub id: Uuid,
    pub client_id: String,
    pub url: String,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_ping_at: DateTime<Utc>,
    pub last_ping_status: i64,
}

/// Inserts a target only while the owning client holds fewer than
/// [`MAX_ACTIVE_TARGETS`] active rows. The count and the insert execute as one
/// SQLite statement, so two racing admissions for the same client cannot both
/// observe a free slot. Returns `None` when the quota refused the insert.
pub async fn insert_target_within_quota(pool: &Db, new: NewTarget) -> Result<Option<TargetRecord>> {
    let result = sqlx::query(
        r#"
        INSERT INTO targets (
            id,
            client_id,
            url,
            duration_minutes,
            created_at,
            expires_at,
            is_active,
            last_ping_at,
            last_ping_status,
            ping_count
        )
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, 1
        WHERE (
            SELECT COUNT(*) FROM targets
            WHERE client_id = ?2 AND is_active = 1
        ) < ?9
        "#,
    )
    .bind(new.id)
    .bind(&new.client_id)
    .bind(&new.url)
    .bind(new.duration_minutes)
    .bind(new.created_at)
    .bind(new.expires_at)
    .bind(new.last_ping_at)
    .bind(new.last_ping_status)
    .bind(MAX_ACTIVE_TARGETS)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let record = get_target(pool, new.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("target insert did not return row"))?;
    Ok(Some(record))
}

pub async fn get_target(pool: &Db, id: Uuid) -> Result<Option<TargetRecord>> {
    let record = sqlx::query_as::<_, TargetRecord>(
        r#"
        SELECT
            id,
            client_id,
            url,
            duration_minutes,
            created_at,
            expires_at,
            is_active,
            last_ping_at,
            last_ping_status,
            ping_count
        FROM targets
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// All targets owned by `client_id`, newest first.
pub async fn list_targets_for_client(pool: &Db, client_id: &str) -> Result<Vec<TargetRecord>> {
    let records = sqlx::query_as::<_, TargetRecord>(
        r#"
        SELECT
            id,
            client_id,
            url,
            duration_minutes,
            created_at,
            expires_at,
            is_active,
            last_ping_at,
            last_ping_status,
            ping_count
        FROM targets
        WHERE client_id = ?1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Active targets whose lifetime has not yet elapsed as of `now`.
pub async fn list_pingable_targets(pool: &Db, now: DateTime<Utc>) -> Result<Vec<TargetRecord>> {
    let records = sqlx::query_as::<_, TargetRecord>(
        r#"
        SELECT
            id,
            client_id,
            url,
            duration_minutes,
            created_at,
            expires_at,
            is_active,
            last_ping_at,
            last_ping_status,
            ping_count
        FROM targets
        WHERE is_active = 1 AND expires_at > ?1
        ORDER BY expires_at ASC
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Records the outcome of one probe. Guarded by `is_active` so a row
/// deactivated mid-sweep keeps its final counters.
pub async fn record_ping(
    pool: &Db,
    id: Uuid,
    pinged_at: DateTime<Utc>,
    status: i64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE targets
        SET last_ping_at = ?2, last_ping_status = ?3, ping_count = ping_count + 1
        WHERE id = ?1 AND is_active = 1
        "#,
    )
    .bind(id)
    .bind(pinged_at)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn deactivate_target(pool: &Db, id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE targets
        SET is_active = 0
        WHERE id = ?1 AND is_active = 1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Retires every active target whose lifetime elapsed on or before `cutoff`.
pub async fn deactivate_expired(pool: &Db, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE targets
        SET is_active = 0
        WHERE is_active = 1 AND expires_at <= ?1
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn count_active_targets(pool: &Db, client_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM targets
        WHERE client_id = ?1 AND is_active = 1
        "#,
    )
    .bind(client_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
