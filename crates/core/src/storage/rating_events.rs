use crate::domain::rating_event::{RatingEvent, StoredRatingEvent};
use crate::history::TickerHistorySource;
use crate::storage::browse::{contains_pattern, EventSort};
use anyhow::Context;
use chrono::{DateTime, Utc};

const SELECT_COLUMNS: &str = "SELECT ticker, company, brokerage, action, rating_from, rating_to, \
                              target_from, target_to, time FROM rating_events";

type EventRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
);

const SELECT_STORED_COLUMNS: &str = "SELECT id, ticker, company, brokerage, action, rating_from, \
                                     rating_to, target_from, target_to, time, created_at, \
                                     updated_at FROM rating_events";

type StoredRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn from_stored_row(row: StoredRow) -> StoredRatingEvent {
    let (
        id,
        ticker,
        company,
        brokerage,
        action,
        rating_from,
        rating_to,
        target_from,
        target_to,
        time,
        created_at,
        updated_at,
    ) = row;
    StoredRatingEvent {
        id,
        event: from_row((
            ticker,
            company,
            brokerage,
            action,
            rating_from,
            rating_to,
            target_from,
            target_to,
            time,
        )),
        created_at,
        updated_at,
    }
}

fn from_row(row: EventRow) -> RatingEvent {
    let (ticker, company, brokerage, action, rating_from, rating_to, target_from, target_to, time) =
        row;
    RatingEvent {
        ticker,
        company,
        brokerage,
        action,
        rating_from,
        rating_to,
        target_from,
        target_to,
        time: Some(time),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// `rating_events` table, keyed by `(ticker, time)`.
#[derive(Debug, Clone)]
pub struct PgRatingEventStore {
    pool: sqlx::PgPool,
}

impl PgRatingEventStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Full history for one ticker, most recent first.
    pub async fn find_by_ticker(&self, ticker: &str) -> anyhow::Result<Vec<StoredRatingEvent>> {
        let rows = sqlx::query_as::<_, StoredRow>(&format!(
            "{SELECT_STORED_COLUMNS} WHERE ticker = $1 ORDER BY time DESC, id DESC"
        ))
        .persistent(false)
        .bind(ticker.trim())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("query rating_events by ticker failed (ticker={ticker})"))?;

        Ok(rows.into_iter().map(from_stored_row).collect())
    }

    pub async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<StoredRatingEvent>> {
        let row = sqlx::query_as::<_, StoredRow>(&format!("{SELECT_STORED_COLUMNS} WHERE id = $1"))
            .persistent(false)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("query rating_events by id failed (id={id})"))?;

        Ok(row.map(from_stored_row))
    }

    /// One page of stored events. `sort` only ever yields whitelisted column names.
    pub async fn list(
        &self,
        sort: EventSort,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<StoredRatingEvent>> {
        let rows = sqlx::query_as::<_, StoredRow>(&format!(
            "{SELECT_STORED_COLUMNS} ORDER BY {} LIMIT $1 OFFSET $2",
            sort.order_by()
        ))
        .persistent(false)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list rating_events failed (limit={limit}, offset={offset})"))?;

        Ok(rows.into_iter().map(from_stored_row).collect())
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rating_events")
            .persistent(false)
            .fetch_one(&self.pool)
            .await
            .context("count rating_events failed")?;
        Ok(total)
    }

    /// Most recently stored rows first.
    pub async fn latest(&self, limit: i64) -> anyhow::Result<Vec<StoredRatingEvent>> {
        let rows = sqlx::query_as::<_, StoredRow>(&format!(
            "{SELECT_STORED_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .persistent(false)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("query latest rating_events failed (limit={limit})"))?;

        Ok(rows.into_iter().map(from_stored_row).collect())
    }

    /// Case-insensitive substring match on ticker or company, most recent first.
    pub async fn search(&self, query: &str, limit: i64) -> anyhow::Result<Vec<StoredRatingEvent>> {
        let rows = sqlx::query_as::<_, StoredRow>(&format!(
            "{SELECT_STORED_COLUMNS} WHERE ticker ILIKE $1 OR company ILIKE $1 \
             ORDER BY time DESC, id DESC LIMIT $2"
        ))
        .persistent(false)
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("search rating_events failed (query={query})"))?;

        Ok(rows.into_iter().map(from_stored_row).collect())
    }

    /// Exact match on `action` and/or `rating_to`; a `None` filter matches everything.
    /// Returns the page and the total number of matching rows.
    pub async fn filter(
        &self,
        action: Option<&str>,
        rating: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<StoredRatingEvent>, i64)> {
        const WHERE: &str = "WHERE ($1::text IS NULL OR action = $1) \
                             AND ($2::text IS NULL OR rating_to = $2)";

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM rating_events {WHERE}"))
                .persistent(false)
                .bind(action)
                .bind(rating)
                .fetch_one(&self.pool)
                .await
                .context("count filtered rating_events failed")?;

        let rows = sqlx::query_as::<_, StoredRow>(&format!(
            "{SELECT_STORED_COLUMNS} {WHERE} ORDER BY time DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .persistent(false)
        .bind(action)
        .bind(rating)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .with_context(|| {
            format!("filter rating_events failed (action={action:?}, rating={rating:?})")
        })?;

        Ok((rows.into_iter().map(from_stored_row).collect(), total))
    }

    pub async fn distinct_actions(&self) -> anyhow::Result<Vec<String>> {
        self.distinct_values("action").await
    }

    /// Distinct target ratings (`rating_to`).
    pub async fn distinct_ratings(&self) -> anyhow::Result<Vec<String>> {
        self.distinct_values("rating_to").await
    }

    async fn distinct_values(&self, column: &'static str) -> anyhow::Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT DISTINCT {column} FROM rating_events WHERE {column} <> '' ORDER BY {column}"
        ))
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("query distinct rating_events.{column} failed"))?;

        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    /// Insert a new `(ticker, time)` row, or update the stored one when any rating field
    /// differs. Events without a timestamp are rejected.
    pub async fn upsert(&self, event: &RatingEvent) -> anyhow::Result<UpsertOutcome> {
        let ticker = event.ticker.trim();
        anyhow::ensure!(!ticker.is_empty(), "ticker must be non-empty");
        let time = event
            .time
            .with_context(|| format!("rating event for {ticker} has no timestamp"))?;

        // xmax = 0 only for freshly inserted tuples. No row back means the WHERE filtered
        // the update out, i.e. nothing changed.
        let row: Option<(bool,)> = sqlx::query_as(
            "INSERT INTO rating_events \
               (ticker, company, brokerage, action, rating_from, rating_to, target_from, target_to, time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (ticker, time) DO UPDATE \
               SET company = EXCLUDED.company, brokerage = EXCLUDED.brokerage, \
                   action = EXCLUDED.action, rating_from = EXCLUDED.rating_from, \
                   rating_to = EXCLUDED.rating_to, target_from = EXCLUDED.target_from, \
                   target_to = EXCLUDED.target_to, updated_at = now() \
               WHERE (rating_events.target_from, rating_events.target_to, rating_events.action, \
                      rating_events.rating_from, rating_events.rating_to, rating_events.brokerage) \
                 IS DISTINCT FROM \
                     (EXCLUDED.target_from, EXCLUDED.target_to, EXCLUDED.action, \
                      EXCLUDED.rating_from, EXCLUDED.rating_to, EXCLUDED.brokerage) \
             RETURNING (xmax = 0)",
        )
        .persistent(false)
        .bind(ticker)
        .bind(&event.company)
        .bind(&event.brokerage)
        .bind(&event.action)
        .bind(&event.rating_from)
        .bind(&event.rating_to)
        .bind(&event.target_from)
        .bind(&event.target_to)
        .bind(time)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("upsert rating_events failed (ticker={ticker}, time={time})"))?;

        Ok(match row {
            Some((true,)) => UpsertOutcome::Inserted,
            Some((false,)) => UpsertOutcome::Updated,
            None => UpsertOutcome::Unchanged,
        })
    }
}

#[async_trait::async_trait]
impl TickerHistorySource for PgRatingEventStore {
    async fn find_events_since(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RatingEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!("{SELECT_COLUMNS} WHERE time > $1"))
            .persistent(false)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch rating events")?;

        tracing::debug!(%since, rows = rows.len(), "fetched rating events");
        Ok(rows.into_iter().map(from_row).collect())
    }
}
