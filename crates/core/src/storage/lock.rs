use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

// Advisory locks are scoped to the Postgres session, so the lock keeps hold of the connection
// it was taken on and releases on that same connection.
const SYNC_LOCK_KEY: i64 = 0x5354_4B53_594E; // "STKSYN"

/// Guard for the feed-sync advisory lock. Keeps two syncs from upserting the same rows at once.
pub struct SyncLock {
    conn: PoolConnection<Postgres>,
}

pub async fn try_acquire_sync_lock(pool: &sqlx::PgPool) -> anyhow::Result<Option<SyncLock>> {
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire connection for sync lock")?;

    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(SYNC_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={SYNC_LOCK_KEY})"))?;

    Ok(acquired.0.then_some(SyncLock { conn }))
}

impl SyncLock {
    pub async fn release(mut self) -> anyhow::Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(SYNC_LOCK_KEY)
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={SYNC_LOCK_KEY})"))?;
        Ok(())
    }
}
