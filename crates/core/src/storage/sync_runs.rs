use crate::ingest::sync::SyncSummary;
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Audit row for one feed sync. `summary` is `None` when the sync failed before counting.
pub async fn record_sync_run(
    pool: &sqlx::PgPool,
    provider: &str,
    started_at: DateTime<Utc>,
    summary: Option<&SyncSummary>,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let finished_at = Utc::now();
    let status = if error.is_some() { "error" } else { "success" };
    let counts = summary.copied().unwrap_or_default();

    sqlx::query(
        "INSERT INTO rating_sync_runs \
           (id, started_at, finished_at, provider, status, fetched, inserted, updated, skipped, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .persistent(false)
    .bind(id)
    .bind(started_at)
    .bind(finished_at)
    .bind(provider)
    .bind(status)
    .bind(counts.fetched as i64)
    .bind(counts.inserted as i64)
    .bind(counts.updated as i64)
    .bind(counts.skipped as i64)
    .bind(error)
    .execute(pool)
    .await
    .context("insert rating_sync_runs failed")?;

    Ok(id)
}
