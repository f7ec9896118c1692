use crate::domain::rating_event::RatingEvent;
use crate::domain::recommendation::Recommendation;
use crate::scoring::score_event;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Recommendations below this score are dropped, unless that would drop all of them.
pub const MINIMUM_ACCEPTED_SCORE: f64 = 55.0;

/// Group events per ticker, each group sorted most-recent-first (missing timestamps last).
pub fn group_by_ticker(events: Vec<RatingEvent>) -> BTreeMap<String, Vec<RatingEvent>> {
    let mut by_ticker: BTreeMap<String, Vec<RatingEvent>> = BTreeMap::new();
    for event in events {
        by_ticker.entry(event.ticker.clone()).or_default().push(event);
    }
    for history in by_ticker.values_mut() {
        history.sort_by(|a, b| b.time.cmp(&a.time));
    }
    by_ticker
}

/// Score one representative event per ticker, filter, sort by score descending and keep at
/// most `limit` entries (`0` keeps everything).
pub fn rank(events: Vec<RatingEvent>, now: DateTime<Utc>, limit: usize) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = group_by_ticker(events)
        .into_values()
        .filter_map(|history| {
            let latest = history.first()?;
            let scored = score_event(latest, &history, now);
            Some(Recommendation {
                event: latest.clone(),
                score: scored.score,
                reason: scored.reason,
                confidence: scored.confidence,
            })
        })
        .collect();

    if recommendations
        .iter()
        .any(|r| r.score >= MINIMUM_ACCEPTED_SCORE)
    {
        recommendations.retain(|r| r.score >= MINIMUM_ACCEPTED_SCORE);
    } else {
        tracing::debug!(
            candidates = recommendations.len(),
            min_score = MINIMUM_ACCEPTED_SCORE,
            "no candidate reached the minimum score; keeping unfiltered list"
        );
    }

    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.event.ticker.cmp(&b.event.ticker))
    });

    if limit > 0 {
        recommendations.truncate(limit);
    }
    recommendations
}
