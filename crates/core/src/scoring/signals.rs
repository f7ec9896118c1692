//! Static pattern tables mapping normalized action/rating text to numeric signals.
//!
//! Matching contract: every pattern that occurs as a substring of the normalized text is a
//! candidate; the longest pattern wins, and equal lengths resolve to table order. This keeps
//! generic terms ("buy") from overriding specific phrases ("speculative buy").

use crate::scoring::text::normalize_text;

/// Rating score used when the rating text is empty or matches nothing.
pub const DEFAULT_UNKNOWN_RATING: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct SignalPattern {
    pub pattern: &'static str,
    pub score: f64,
}

const fn p(pattern: &'static str, score: f64) -> SignalPattern {
    SignalPattern { pattern, score }
}

/// Rating text → [0, 5].
pub static RATING_SIGNALS: &[SignalPattern] = &[
    p("strong buy", 5.0),
    p("speculative buy", 4.5),
    p("market outperform", 4.0),
    p("sector outperform", 4.0),
    p("outperformer", 4.0),
    p("buy", 4.0),
    p("overweight", 3.5),
    p("outperform", 3.5),
    p("positive", 3.5),
    p("accumulate", 3.0),
    p("equal weight", 2.0),
    p("in line", 2.0),
    p("market perform", 2.0),
    p("sector perform", 2.0),
    p("neutral", 2.0),
    p("hold", 2.0),
    p("cautious", 1.5),
    p("underweight", 1.0),
    p("underperform", 0.5),
    p("sector underperform", 0.5),
    p("reduce", 0.5),
    p("sell", 0.0),
    p("strong sell", 0.0),
];

/// Action text → [-100, 100].
pub static ACTION_SIGNALS: &[SignalPattern] = &[
    p("target raised by", 92.0),
    p("target raised", 90.0),
    p("raises target", 90.0),
    p("raise target", 90.0),
    p("upgraded", 75.0),
    p("upgrade", 75.0),
    p("initiated with buy", 65.0),
    p("initiated", 30.0),
    p("reiterated buy", 40.0),
    p("reiterated", 15.0),
    p("maintains buy", 35.0),
    p("maintained buy", 35.0),
    p("maintains", 10.0),
    p("target lowered by", -92.0),
    p("target lowered", -90.0),
    p("lowers target", -90.0),
    p("lower target", -90.0),
    p("downgraded", -75.0),
    p("downgrade", -75.0),
    p("suspended", -60.0),
    p("removed", -50.0),
];

/// Longest-substring match over `table`. `normalized` must already be normalized.
pub fn longest_match(normalized: &str, table: &[SignalPattern]) -> Option<f64> {
    let mut best: Option<&SignalPattern> = None;
    for signal in table {
        if !normalized.contains(signal.pattern) {
            continue;
        }
        if best.map_or(true, |b| signal.pattern.len() > b.pattern.len()) {
            best = Some(signal);
        }
    }
    best.map(|s| s.score)
}

/// Action signal in [-100, 100]; unmatched or empty text is 0.
pub fn action_signal(action: &str) -> f64 {
    let normalized = normalize_text(action);
    if normalized.is_empty() {
        return 0.0;
    }
    longest_match(&normalized, ACTION_SIGNALS).unwrap_or(0.0)
}

/// Rating score in [0, 5]; unmatched or empty text is [`DEFAULT_UNKNOWN_RATING`].
pub fn rating_score(rating: &str) -> f64 {
    let normalized = normalize_text(rating);
    if normalized.is_empty() {
        return DEFAULT_UNKNOWN_RATING;
    }
    longest_match(&normalized, RATING_SIGNALS).unwrap_or(DEFAULT_UNKNOWN_RATING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speculative_buy_beats_generic_buy() {
        assert_eq!(rating_score("Speculative Buy"), 4.5);
        assert_eq!(rating_score("buy / speculative buy"), 4.5);
        assert_eq!(rating_score("Speculative-Buy (from Buy)"), 4.5);
    }

    #[test]
    fn longer_bearish_phrase_wins() {
        assert_eq!(rating_score("Sector Underperform"), 0.5);
        assert_eq!(rating_score("Strong Sell"), 0.0);
        assert_eq!(rating_score("Strong-Buy"), 5.0);
    }

    #[test]
    fn unknown_or_empty_rating_is_neutral_default() {
        assert_eq!(rating_score(""), DEFAULT_UNKNOWN_RATING);
        assert_eq!(rating_score("Top Pick?"), DEFAULT_UNKNOWN_RATING);
    }

    #[test]
    fn action_signal_prefers_specific_phrases() {
        assert_eq!(action_signal("Target raised by Goldman"), 92.0);
        assert_eq!(action_signal("target raised"), 90.0);
        assert_eq!(action_signal("Initiated with Buy"), 65.0);
        assert_eq!(action_signal("initiated by"), 30.0);
        assert_eq!(action_signal("Downgraded"), -75.0);
    }

    #[test]
    fn unmatched_action_is_zero() {
        assert_eq!(action_signal(""), 0.0);
        assert_eq!(action_signal("coverage note"), 0.0);
    }

    #[test]
    fn equal_length_matches_resolve_to_table_order() {
        let table = [p("abc", 1.0), p("bcd", 2.0)];
        assert_eq!(longest_match("abcd", &table), Some(1.0));
        assert_eq!(longest_match("xyz", &table), None);
    }
}
