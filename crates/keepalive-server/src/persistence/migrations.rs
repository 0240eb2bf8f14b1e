use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::migrate::{AppliedMigration, Migrate};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use super::Db;
use crate::Result;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MigrationLabel {
    pub version: i64,
    pub description: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MigrationSnapshot {
    pub latest_applied: Option<i64>,
    pub latest_available: Option<i64>,
    pub pending: Vec<MigrationLabel>,
}

pub async fn init_pool(database_url: &str) -> Result<Db> {
    let is_memory = database_url.starts_with("sqlite::memory");

    ensure_db_dir(database_url)?;

    let mut opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // An in-memory SQLite database is private to its connection, so pooling
    // more than one connection would scatter queries across unrelated empty
    // databases. A single pooled connection keeps the database coherent for
    // tests while exercising the same pool API as production.
    let pool_opts = if is_memory {
        opts = opts.shared_cache(true);
        SqlitePoolOptions::new().max_connections(1)
    } else {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_opts
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(opts)
        .await?;

    Ok(pool)
}

fn ensure_db_dir(database_url: &str) -> Result<()> {
    if let Some(path_str) = database_url.strip_prefix("sqlite://")
        && !database_url.starts_with("sqlite::memory")
    {
        let path = Path::new(path_str);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn latest_migration_version() -> Option<i64> {
    MIGRATOR.iter().map(|m| m.version).max()
}

pub async fn migration_snapshot(pool: &Db) -> Result<MigrationSnapshot> {
    let applied = fetch_applied_migrations(pool).await?;
    let applied_versions: HashSet<i64> = applied.iter().map(|m| m.version).collect();

    let pending: Vec<MigrationLabel> = MIGRATOR
        .iter()
        .filter(|m| !applied_versions.contains(&m.version))
        .map(|m| MigrationLabel {
            version: m.version,
            description: m.description.to_string(),
        })
        .collect();

    Ok(MigrationSnapshot {
        latest_applied: applied.iter().map(|m| m.version).max(),
        latest_available: latest_migration_version(),
        pending,
    })
}

pub async fn validate_migrations(pool: &Db) -> Result<()> {
    let applied = fetch_applied_migrations(pool).await?;
    let known: HashMap<i64, &sqlx::migrate::Migration> =
        MIGRATOR.iter().map(|m| (m.version, m)).collect();

    for migration in &applied {
        let Some(defined) = known.get(&migration.version) else {
            anyhow::bail!(
                "database has unknown migration version {}",
                migration.version
            );
        };

        if defined.checksum != migration.checksum {
            anyhow::bail!(
                "migration {} checksum mismatch between database and binary",
                migration.version
            );
        }
    }

    Ok(())
}

/// Applies pending migrations and returns the post-run snapshot.
pub async fn run_migrations(pool: &Db) -> Result<MigrationSnapshot> {
    let before = migration_snapshot(pool).await?;
    validate_migrations(pool).await?;

    if before.pending.is_empty() {
        return Ok(before);
    }

    MIGRATOR
        .run(pool)
        .await
        .context("applying database migrations failed")?;

    migration_snapshot(pool).await
}

async fn fetch_applied_migrations(pool: &Db) -> Result<Vec<AppliedMigration>> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table()
        .await
        .context("ensure migrations table exists")?;

    if let Some(version) = conn.dirty_version().await? {
        anyhow::bail!("database is in a dirty migration state at version {version}");
    }

    let applied = conn
        .list_applied_migrations()
        .await
        .context("list applied migrations")?;

    Ok(applied)
}
