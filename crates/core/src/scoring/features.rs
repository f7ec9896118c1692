use crate::domain::rating_event::RatingEvent;
use crate::scoring::price::parse_price;
use crate::scoring::signals::{action_signal, rating_score};
use chrono::{DateTime, Utc};

/// Data-quality base when both target prices parse.
pub const PRICE_PAIR_QUALITY: f64 = 70.0;
/// Data-quality base when either target price is missing.
pub const MISSING_PRICE_QUALITY: f64 = 25.0;

/// Percent moves smaller than this are treated as noise.
const NOISE_PERCENT: f64 = 0.6;
const ALIGNMENT_THRESHOLD: f64 = 1500.0;
const RATING_STEP: f64 = 35.0;
const MAX_HISTORY_ITEMS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFluctuation {
    pub direction: f64,
    pub momentum: f64,
    pub percent_change: f64,
    pub has_price_pair: bool,
}

/// Per-event features. Everything is in [-100, 100] except `data_quality` ([0, 100]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub price_direction: f64,
    pub price_momentum: f64,
    pub action_rating_combo: f64,
    pub rating_quality: f64,
    pub rating_change: f64,
    pub recency: f64,
    pub history_consensus: f64,
    pub data_quality: f64,
}

impl FeatureVector {
    /// `history` is the ticker's events sorted most-recent-first (usually including `event`).
    pub fn extract(event: &RatingEvent, history: &[RatingEvent], now: DateTime<Utc>) -> Self {
        let (fluctuation, price_quality) = price_fluctuation(event);

        Self {
            price_direction: fluctuation.direction,
            price_momentum: fluctuation.momentum,
            action_rating_combo: action_rating_combo(event, &fluctuation),
            rating_quality: rating_quality(&event.rating_to),
            rating_change: rating_change(event),
            recency: recency(event, now),
            history_consensus: history_consensus(history),
            data_quality: data_quality(event, &fluctuation, price_quality),
        }
    }
}

/// Price direction/momentum from the target-price pair, falling back to the action signal
/// when a price is missing or the move is noise. Also returns the data-quality base.
pub fn price_fluctuation(event: &RatingEvent) -> (PriceFluctuation, f64) {
    let from = parse_price(&event.target_from);
    let to = parse_price(&event.target_to);
    let action = action_signal(&event.action);

    if from == 0.0 || to == 0.0 {
        let fluctuation = PriceFluctuation {
            direction: (action * 0.35).clamp(-100.0, 100.0),
            momentum: (action * 0.25).clamp(-100.0, 100.0),
            percent_change: 0.0,
            has_price_pair: false,
        };
        return (fluctuation, MISSING_PRICE_QUALITY);
    }

    let percent_change = (to - from) / from * 100.0;
    let (direction, momentum) = if percent_change.abs() < NOISE_PERCENT {
        (action * 0.15, action * 0.10)
    } else {
        ((percent_change / 14.0).tanh() * 100.0, percent_change * 4.5)
    };

    let fluctuation = PriceFluctuation {
        direction: direction.clamp(-100.0, 100.0),
        momentum: momentum.clamp(-100.0, 100.0),
        percent_change,
        has_price_pair: true,
    };
    (fluctuation, PRICE_PAIR_QUALITY)
}

/// Blend of action, current rating and rating transition, with agreement/disagreement
/// adjustments and a price-alignment term.
pub fn action_rating_combo(event: &RatingEvent, fluctuation: &PriceFluctuation) -> f64 {
    let action = action_signal(&event.action);
    let to_score = rating_score(&event.rating_to);
    let from_score = rating_score(&event.rating_from);
    let rating = rating_quality(&event.rating_to);
    let transition = ((to_score - from_score) * RATING_STEP).clamp(-100.0, 100.0);

    let mut combo = action * 0.44 + rating * 0.32 + transition * 0.24;

    if action >= 55.0 && transition >= 20.0 {
        combo += 18.0;
    }
    if action <= -55.0 && transition <= -20.0 {
        combo -= 18.0;
    }

    // Strong action with a flat rating: lean on where the rating already sits.
    if transition.abs() < 10.0 && action.abs() >= 70.0 {
        combo += if action > 0.0 {
            if to_score >= 3.5 {
                14.0
            } else if to_score <= 1.5 {
                -20.0
            } else {
                5.0
            }
        } else if to_score <= 1.5 {
            -14.0
        } else if to_score >= 3.5 {
            12.0
        } else {
            -5.0
        };
    }

    if action >= 55.0 && to_score <= 1.5 {
        combo -= 28.0;
    }
    if action <= -55.0 && to_score >= 3.8 {
        combo += 20.0;
    }

    if fluctuation.has_price_pair {
        let alignment = fluctuation.direction * action;
        if alignment > ALIGNMENT_THRESHOLD {
            combo += 10.0;
        } else if alignment < -ALIGNMENT_THRESHOLD {
            combo -= 12.0;
        }
    }

    combo.clamp(-100.0, 100.0)
}

/// Rating score rescaled from [0, 5] to [-100, 100].
pub fn rating_quality(rating: &str) -> f64 {
    (rating_score(rating) - 2.5) / 2.5 * 100.0
}

pub fn rating_change(event: &RatingEvent) -> f64 {
    let diff = rating_score(&event.rating_to) - rating_score(&event.rating_from);
    (diff * RATING_STEP).clamp(-100.0, 100.0)
}

pub fn recency(event: &RatingEvent, now: DateTime<Utc>) -> f64 {
    let Some(time) = event.time else {
        return -40.0;
    };

    let days = (now - time).num_seconds() as f64 / 86_400.0;
    if days < 3.0 {
        90.0
    } else if days < 7.0 {
        70.0
    } else if days < 14.0 {
        35.0
    } else if days < 30.0 {
        -10.0
    } else {
        -50.0
    }
}

fn history_weight(index: usize) -> f64 {
    (1.0 - index as f64 * 0.1).max(0.3)
}

/// Recency-weighted average of per-event signals over the most recent history entries.
pub fn history_consensus(history: &[RatingEvent]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut divisor = 0.0;
    for (i, item) in history.iter().take(MAX_HISTORY_ITEMS).enumerate() {
        let weight = history_weight(i);
        let (fluctuation, _) = price_fluctuation(item);
        let combo = action_rating_combo(item, &fluctuation);
        let combined = fluctuation.direction * 0.45
            + fluctuation.momentum * 0.20
            + combo * 0.25
            + rating_quality(&item.rating_to) * 0.10;
        total += combined * weight;
        divisor += weight;
    }

    (total / divisor).clamp(-100.0, 100.0)
}

fn data_quality(event: &RatingEvent, fluctuation: &PriceFluctuation, base: f64) -> f64 {
    let mut quality = base;
    if !event.rating_to.trim().is_empty() {
        quality += 20.0;
    }
    if !event.rating_from.trim().is_empty() {
        quality += 8.0;
    }
    if !event.action.trim().is_empty() {
        quality += 15.0;
    }
    if event.time.is_some() {
        quality += 12.0;
    }
    if fluctuation.has_price_pair && fluctuation.percent_change.abs() >= 2.0 {
        quality += 10.0;
    }
    quality.clamp(0.0, 100.0)
}
