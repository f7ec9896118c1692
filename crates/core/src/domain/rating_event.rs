use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single analyst-rating change for one ticker, as reported by a brokerage.
///
/// Text fields are kept verbatim from the upstream feed; scoring normalizes them on read.
/// Target prices are free-text currency strings and may be empty or non-numeric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingEvent {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub brokerage: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub rating_from: String,
    #[serde(default)]
    pub rating_to: String,
    #[serde(default)]
    pub target_from: String,
    #[serde(default)]
    pub target_to: String,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// A persisted [`RatingEvent`] with its row id and bookkeeping timestamps. Serializes flat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRatingEvent {
    pub id: i64,
    #[serde(flatten)]
    pub event: RatingEvent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn deserializes_feed_item_with_missing_fields() {
        let v = json!({
            "ticker": "AAPL",
            "action": "target raised by",
            "time": "2026-02-10T00:30:05Z",
        });

        let event: RatingEvent = serde_json::from_value(v).unwrap();
        assert_eq!(event.ticker, "AAPL");
        assert_eq!(event.target_to, "");
        assert_eq!(
            event.time,
            Some(Utc.with_ymd_and_hms(2026, 2, 10, 0, 30, 5).unwrap())
        );
    }

    #[test]
    fn deserializes_null_time_as_none() {
        let v = json!({"ticker": "AAPL", "time": null});
        let event: RatingEvent = serde_json::from_value(v).unwrap();
        assert!(event.time.is_none());
    }

    #[test]
    fn stored_event_serializes_flat() {
        let at = Utc.with_ymd_and_hms(2026, 2, 10, 0, 30, 5).unwrap();
        let stored = StoredRatingEvent {
            id: 42,
            event: RatingEvent {
                ticker: "AAPL".to_string(),
                time: Some(at),
                ..Default::default()
            },
            created_at: at,
            updated_at: at,
        };

        let v = serde_json::to_value(&stored).unwrap();
        assert_eq!(v["id"], 42);
        assert_eq!(v["ticker"], "AAPL");
        assert_eq!(v["time"], "2026-02-10T00:30:05Z");
        assert_eq!(v["created_at"], "2026-02-10T00:30:05Z");
        assert!(v.get("event").is_none());
    }
}
