use crate::domain::rating_event::RatingEvent;
use crate::scoring::features::FeatureVector;
use serde::Serialize;

/// Fixed scorer weights. They sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureWeights {
    pub price_direction: f64,
    pub price_momentum: f64,
    pub action_rating_combo: f64,
    pub rating_quality: f64,
    pub rating_change: f64,
    pub recency: f64,
    pub history_consensus: f64,
}

pub const FEATURE_WEIGHTS: FeatureWeights = FeatureWeights {
    price_direction: 0.36,
    price_momentum: 0.22,
    action_rating_combo: 0.20,
    rating_quality: 0.08,
    rating_change: 0.06,
    recency: 0.05,
    history_consensus: 0.03,
};

impl FeatureWeights {
    pub fn total(&self) -> f64 {
        self.price_direction
            + self.price_momentum
            + self.action_rating_combo
            + self.rating_quality
            + self.rating_change
            + self.recency
            + self.history_consensus
    }
}

/// One feature's share of the raw score, with the texts used to explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedFeature {
    pub label: &'static str,
    pub weight: f64,
    pub value: f64,
    pub positive_text: String,
    pub neutral_text: String,
    pub negative_text: String,
    pub contribution: f64,
}

impl WeightedFeature {
    fn new(
        label: &'static str,
        weight: f64,
        value: f64,
        positive_text: impl Into<String>,
        neutral_text: impl Into<String>,
        negative_text: impl Into<String>,
    ) -> Self {
        Self {
            label,
            weight,
            value,
            positive_text: positive_text.into(),
            neutral_text: neutral_text.into(),
            negative_text: negative_text.into(),
            contribution: value * weight,
        }
    }
}

/// Combine the feature vector into a raw score (roughly [-100, 100]) plus the per-feature
/// breakdown for the reason builder.
pub fn score_with_weights(
    features: &FeatureVector,
    event: &RatingEvent,
) -> (Vec<WeightedFeature>, f64) {
    let w = FEATURE_WEIGHTS;
    let transition = format!(
        "{} / {}\u{2192}{}",
        event.action, event.rating_from, event.rating_to
    );

    let weighted = vec![
        WeightedFeature::new(
            "Price direction",
            w.price_direction,
            features.price_direction,
            "Target price moved upward",
            "Target price is mostly unchanged",
            "Target price moved downward",
        ),
        WeightedFeature::new(
            "Price momentum",
            w.price_momentum,
            features.price_momentum,
            "Magnitude of target change is bullish",
            "Target change magnitude is small",
            "Magnitude of target change is bearish",
        ),
        WeightedFeature::new(
            "Action-rating combo",
            w.action_rating_combo,
            features.action_rating_combo,
            format!("Action and rating are aligned ({transition})"),
            "Action and rating combination is mixed",
            format!("Action and rating are bearish ({transition})"),
        ),
        WeightedFeature::new(
            "Rating quality",
            w.rating_quality,
            features.rating_quality,
            format!("Current rating is favorable ({})", event.rating_to),
            "Current rating is neutral",
            format!("Current rating is weak ({})", event.rating_to),
        ),
        WeightedFeature::new(
            "Rating change",
            w.rating_change,
            features.rating_change,
            "Rating improved",
            "Rating is unchanged",
            "Rating deteriorated",
        ),
        WeightedFeature::new(
            "Recency",
            w.recency,
            features.recency,
            "Very recent signal",
            "Moderately recent signal",
            "Signal is stale",
        ),
        WeightedFeature::new(
            "Consensus",
            w.history_consensus,
            features.history_consensus,
            "Recent history confirms bullish bias",
            "Recent history is mixed",
            "Recent history confirms bearish bias",
        ),
    ];

    let raw_score = weighted.iter().map(|f| f.contribution).sum();
    (weighted, raw_score)
}
