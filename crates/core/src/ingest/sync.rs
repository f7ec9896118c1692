use crate::domain::rating_event::RatingEvent;
use crate::ingest::provider::{fetch_all, RatingFeedClient};
use crate::storage::lock::try_acquire_sync_lock;
use crate::storage::rating_events::{PgRatingEventStore, UpsertOutcome};
use crate::storage::sync_runs::record_sync_run;
use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

#[async_trait::async_trait]
pub trait RatingEventWriter: Send + Sync {
    async fn upsert(&self, event: &RatingEvent) -> Result<UpsertOutcome>;
}

#[async_trait::async_trait]
impl RatingEventWriter for PgRatingEventStore {
    async fn upsert(&self, event: &RatingEvent) -> Result<UpsertOutcome> {
        PgRatingEventStore::upsert(self, event).await
    }
}

/// Pull the whole feed and upsert it. A failed fetch aborts the sync; a failed row is
/// logged and counted as skipped.
pub async fn sync_from_feed(
    feed: &dyn RatingFeedClient,
    store: &dyn RatingEventWriter,
) -> Result<SyncSummary> {
    let events = fetch_all(feed).await?;
    let mut summary = SyncSummary {
        fetched: events.len(),
        ..Default::default()
    };

    for event in &events {
        if event.time.is_none() {
            tracing::debug!(ticker = %event.ticker, "skipping rating event without timestamp");
            summary.skipped += 1;
            continue;
        }

        match store.upsert(event).await {
            Ok(UpsertOutcome::Inserted) => summary.inserted += 1,
            Ok(UpsertOutcome::Updated) => summary.updated += 1,
            Ok(UpsertOutcome::Unchanged) => summary.unchanged += 1,
            Err(err) => {
                tracing::warn!(ticker = %event.ticker, error = %err, "failed to store rating event");
                summary.skipped += 1;
            }
        }
    }

    tracing::info!(
        provider = feed.provider_name(),
        fetched = summary.fetched,
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        "rating sync completed"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
pub struct RecordedSync {
    pub run_id: Uuid,
    pub summary: SyncSummary,
}

/// [`sync_from_feed`] into Postgres under the sync advisory lock, with an audit row for the
/// run whether it succeeds or not. `Ok(None)` when another sync already holds the lock.
pub async fn run_recorded_sync(
    pool: &sqlx::PgPool,
    feed: &dyn RatingFeedClient,
) -> Result<Option<RecordedSync>> {
    let Some(lock) = try_acquire_sync_lock(pool).await? else {
        tracing::warn!("sync lock not acquired; another sync in progress");
        return Ok(None);
    };

    let store = PgRatingEventStore::new(pool.clone());
    let provider = feed.provider_name();
    let started_at = chrono::Utc::now();

    let sync_result = sync_from_feed(feed, &store).await;

    let run_result = match &sync_result {
        Ok(summary) => record_sync_run(pool, provider, started_at, Some(summary), None).await,
        Err(err) => {
            tracing::error!(error = %err, "rating sync failed");
            record_sync_run(pool, provider, started_at, None, Some(&format!("{err:#}"))).await
        }
    };

    if let Err(e) = lock.release().await {
        tracing::warn!(error = %e, "failed to release sync lock");
    }

    let run_id = run_result?;
    let summary = sync_result?;
    tracing::info!(%run_id, inserted = summary.inserted, updated = summary.updated, "persisted sync run");
    Ok(Some(RecordedSync { run_id, summary }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::provider::tests::FakeFeed;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mimics the `(ticker, time)` upsert semantics of the Postgres store.
    #[derive(Default)]
    struct MemoryWriter {
        rows: Mutex<HashMap<(String, DateTime<Utc>), RatingEvent>>,
        fail_ticker: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl RatingEventWriter for MemoryWriter {
        async fn upsert(&self, event: &RatingEvent) -> Result<UpsertOutcome> {
            if self.fail_ticker == Some(event.ticker.as_str()) {
                anyhow::bail!("constraint violation");
            }
            let key = (event.ticker.clone(), event.time.unwrap());
            let mut rows = self.rows.lock().unwrap();
            Ok(match rows.insert(key, event.clone()) {
                None => UpsertOutcome::Inserted,
                Some(old) if old == *event => UpsertOutcome::Unchanged,
                Some(_) => UpsertOutcome::Updated,
            })
        }
    }

    fn feed() -> FakeFeed {
        FakeFeed::new(vec![(
            None,
            json!({
                "items": [
                    {"ticker": "AAA", "action": "upgraded", "time": "2026-02-10T00:00:00Z"},
                    {"ticker": "BBB", "action": "downgraded", "time": "2026-02-10T00:00:00Z"},
                    {"ticker": "CCC", "action": "initiated"},
                ],
            }),
        )])
    }

    #[tokio::test]
    async fn counts_inserted_and_skipped_events() {
        let writer = MemoryWriter::default();
        let summary = sync_from_feed(&feed(), &writer).await.unwrap();
        assert_eq!(
            summary,
            SyncSummary {
                fetched: 3,
                inserted: 2,
                updated: 0,
                unchanged: 0,
                skipped: 1,
            }
        );
    }

    #[tokio::test]
    async fn second_sync_reports_unchanged_rows() {
        let writer = MemoryWriter::default();
        sync_from_feed(&feed(), &writer).await.unwrap();
        let summary = sync_from_feed(&feed(), &writer).await.unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.unchanged, 2);
    }

    #[tokio::test]
    async fn row_failures_are_not_fatal() {
        let writer = MemoryWriter {
            fail_ticker: Some("AAA"),
            ..Default::default()
        };
        let summary = sync_from_feed(&feed(), &writer).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped, 2);
    }
}
