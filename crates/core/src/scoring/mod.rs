//! Deterministic, explainable scoring of a single rating event against its ticker history.
//!
//! Pipeline: features → weighted raw score → calibration/confidence → reason text.
//! Every function here is pure; "now" is always passed in.

pub mod calibrate;
pub mod features;
pub mod price;
pub mod reason;
pub mod signals;
pub mod text;
pub mod weights;

use crate::domain::rating_event::RatingEvent;
use crate::domain::recommendation::Confidence;
use chrono::{DateTime, Utc};

pub use features::FeatureVector;
pub use weights::{WeightedFeature, FEATURE_WEIGHTS};

#[derive(Debug, Clone, PartialEq)]
pub struct EventScore {
    pub score: f64,
    pub reason: String,
    pub confidence: Confidence,
    pub features: FeatureVector,
}

/// Score `event` given its ticker `history` (most recent first).
pub fn score_event(event: &RatingEvent, history: &[RatingEvent], now: DateTime<Utc>) -> EventScore {
    let features = FeatureVector::extract(event, history, now);
    let (weighted, raw_score) = weights::score_with_weights(&features, event);
    let score = calibrate::calibrate_score(raw_score, features.data_quality);
    let confidence = calibrate::determine_confidence(score, history.len(), features.data_quality);
    let reason = reason::build_reason(&weighted);

    EventScore {
        score,
        reason,
        confidence,
        features,
    }
}
