use crate::domain::recommendation::Recommendation;
use crate::history::TickerHistorySource;
use crate::recommend::select::rank;
use crate::time::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const PRIMARY_WINDOW_DAYS: i64 = 30;
const FALLBACK_WINDOW_DAYS: i64 = 90;

/// Ranks tickers from the rating events a [`TickerHistorySource`] returns.
///
/// Looks at the last 30 days first and widens to 90 days only when that window is empty.
/// Fetch errors are returned as-is; nothing is scored in that case.
pub struct RecommendationEngine<S> {
    source: S,
    clock: Arc<dyn Clock>,
}

impl<S: TickerHistorySource> RecommendationEngine<S> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: S, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    /// Top recommendations by score; `limit == 0` means no truncation.
    pub async fn get_recommendations(&self, limit: usize) -> anyhow::Result<Vec<Recommendation>> {
        self.get_recommendations_at(limit, self.clock.now()).await
    }

    /// Like [`get_recommendations`](Self::get_recommendations), but windows and recency are
    /// measured from the caller's `now`, so callers can report the same instant.
    pub async fn get_recommendations_at(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Recommendation>> {
        let mut events = self
            .source
            .find_events_since(now - Duration::days(PRIMARY_WINDOW_DAYS))
            .await?;

        if events.is_empty() {
            tracing::debug!(
                window_days = FALLBACK_WINDOW_DAYS,
                "no recent rating events; widening window"
            );
            events = self
                .source
                .find_events_since(now - Duration::days(FALLBACK_WINDOW_DAYS))
                .await?;
        }

        if events.is_empty() {
            tracing::info!("no rating events available; returning no recommendations");
            return Ok(Vec::new());
        }

        let event_count = events.len();
        let recommendations = rank(events, now, limit);
        tracing::info!(
            event_count,
            count = recommendations.len(),
            limit,
            "generated recommendations"
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rating_event::RatingEvent;
    use crate::recommend::select::MINIMUM_ACCEPTED_SCORE;
    use crate::scoring::score_event;
    use crate::time::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 13, 12, 0, 0).unwrap()
    }

    /// Filters a fixed event list by `time > since`, recording each call.
    struct InMemorySource {
        events: Vec<RatingEvent>,
        calls: Mutex<Vec<DateTime<Utc>>>,
    }

    impl InMemorySource {
        fn new(events: Vec<RatingEvent>) -> Self {
            Self {
                events,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<DateTime<Utc>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl TickerHistorySource for InMemorySource {
        async fn find_events_since(
            &self,
            since: DateTime<Utc>,
        ) -> anyhow::Result<Vec<RatingEvent>> {
            self.calls.lock().unwrap().push(since);
            Ok(self
                .events
                .iter()
                .filter(|e| e.time.is_some_and(|t| t > since))
                .cloned()
                .collect())
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl TickerHistorySource for FailingSource {
        async fn find_events_since(&self, _: DateTime<Utc>) -> anyhow::Result<Vec<RatingEvent>> {
            anyhow::bail!("db down")
        }
    }

    fn event(
        ticker: &str,
        from: &str,
        to: &str,
        action: &str,
        rating_from: &str,
        rating_to: &str,
        days_ago: i64,
    ) -> RatingEvent {
        RatingEvent {
            ticker: ticker.to_string(),
            company: format!("{ticker} Corp"),
            brokerage: "Broker".to_string(),
            action: action.to_string(),
            rating_from: rating_from.to_string(),
            rating_to: rating_to.to_string(),
            target_from: from.to_string(),
            target_to: to.to_string(),
            time: Some(now() - Duration::days(days_ago)),
        }
    }

    fn engine(source: &Arc<InMemorySource>) -> RecommendationEngine<Arc<InMemorySource>> {
        RecommendationEngine::with_clock(Arc::clone(source), Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn widens_to_ninety_days_when_recent_window_is_empty() {
        let source = Arc::new(InMemorySource::new(vec![
            event("AAA", "$100", "$130", "Target raised", "Hold", "Buy", 40),
            event("BBB", "$100", "$80", "Downgraded", "Buy", "Sell", 60),
        ]));

        let recs = engine(&source).get_recommendations(0).await.unwrap();

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], now() - Duration::days(30));
        assert_eq!(calls[1], now() - Duration::days(90));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].event.ticker, "AAA");
    }

    #[tokio::test]
    async fn explicit_now_overrides_the_clock() {
        let source = Arc::new(InMemorySource::new(vec![event(
            "AAA", "$100", "$130", "upgraded", "Hold", "Buy", 1,
        )]));
        let later = now() + Duration::days(100);

        let recs = engine(&source).get_recommendations_at(0, later).await.unwrap();

        let calls = source.calls();
        assert_eq!(calls[0], later - Duration::days(30));
        assert_eq!(calls[1], later - Duration::days(90));
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn does_not_widen_when_recent_window_has_events() {
        let source = Arc::new(InMemorySource::new(vec![event(
            "AAA", "$100", "$130", "upgraded", "Hold", "Buy", 1,
        )]));

        engine(&source).get_recommendations(10).await.unwrap();
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_history_is_not_an_error() {
        let source = Arc::new(InMemorySource::new(Vec::new()));
        let recs = engine(&source).get_recommendations(10).await.unwrap();
        assert!(recs.is_empty());
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn fetch_errors_propagate_verbatim() {
        let engine = RecommendationEngine::with_clock(FailingSource, Arc::new(FixedClock(now())));
        let err = engine.get_recommendations(10).await.unwrap_err();
        assert_eq!(err.to_string(), "db down");
    }

    #[tokio::test]
    async fn limit_one_keeps_only_the_bullish_ticker() {
        let source = Arc::new(InMemorySource::new(vec![
            event("AAA", "$100", "$130", "upgraded", "Hold", "Buy", 1),
            event("BBB", "$100", "$80", "downgraded", "Buy", "Sell", 1),
        ]));

        let recs = engine(&source).get_recommendations(1).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].event.ticker, "AAA");
        assert!(recs[0].score >= MINIMUM_ACCEPTED_SCORE);
    }

    #[tokio::test]
    async fn bearish_ticker_is_filtered_when_a_bullish_one_passes() {
        let source = Arc::new(InMemorySource::new(vec![
            event("AAA", "$100", "$130", "upgraded", "Hold", "Buy", 1),
            event("BBB", "$100", "$80", "downgraded", "Buy", "Sell", 1),
        ]));

        let recs = engine(&source).get_recommendations(0).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].event.ticker, "AAA");
    }

    #[tokio::test]
    async fn representative_is_latest_and_whole_history_feeds_consensus() {
        let latest = event("AAA", "$100", "$125", "upgraded", "Hold", "Buy", 1);
        let older = event("AAA", "$120", "$90", "downgraded", "Buy", "Sell", 8);
        let oldest = event("AAA", "$130", "$120", "target lowered", "Buy", "Hold", 15);
        let source = Arc::new(InMemorySource::new(vec![
            older.clone(),
            latest.clone(),
            oldest.clone(),
        ]));

        let recs = engine(&source).get_recommendations(0).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].event, latest);

        let full_history = [latest.clone(), older, oldest];
        let with_history = score_event(&latest, &full_history, now());
        let alone = score_event(&latest, std::slice::from_ref(&latest), now());
        assert_eq!(recs[0].score, with_history.score);
        assert_ne!(
            with_history.features.history_consensus,
            alone.features.history_consensus
        );
    }

    #[tokio::test]
    async fn identical_input_gives_identical_output() {
        let source = Arc::new(InMemorySource::new(vec![
            event("AAA", "$100", "$130", "upgraded", "Hold", "Buy", 1),
            event("BBB", "$50", "$55", "reiterated buy", "Buy", "Buy", 3),
            event("CCC", "", "", "initiated", "", "Outperform", 9),
            event("BBB", "$48", "$50", "maintains", "Hold", "Buy", 12),
        ]));

        let first = engine(&source).get_recommendations(10).await.unwrap();
        let second = engine(&source).get_recommendations(10).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn results_are_sorted_and_bounded() {
        let source = Arc::new(InMemorySource::new(vec![
            event("AAA", "$100", "$130", "upgraded", "Hold", "Buy", 1),
            event("BBB", "$100", "$112", "target raised by", "Buy", "Buy", 2),
            event("CCC", "$100", "$104", "reiterated buy", "Buy", "Buy", 4),
        ]));

        let recs = engine(&source).get_recommendations(0).await.unwrap();
        assert!(!recs.is_empty());
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for rec in &recs {
            assert!((0.0..=100.0).contains(&rec.score));
        }
    }
}
