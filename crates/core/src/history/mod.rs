use crate::domain::rating_event::RatingEvent;
use chrono::{DateTime, Utc};

/// Read-only access to stored rating events.
#[async_trait::async_trait]
pub trait TickerHistorySource: Send + Sync {
    /// Every event with a timestamp strictly after `since`, in no particular order.
    async fn find_events_since(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RatingEvent>>;
}

#[async_trait::async_trait]
impl<T: TickerHistorySource + ?Sized> TickerHistorySource for std::sync::Arc<T> {
    async fn find_events_since(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<RatingEvent>> {
        (**self).find_events_since(since).await
    }
}
