use crate::scoring::weights::WeightedFeature;

pub const NO_SIGNIFICANT_CHANGES: &str = "No significant changes detected";

const EXPLAIN_THRESHOLD: f64 = 15.0;

/// Render each feature as `"<text> (<signed contribution> points)"`, joined with `". "`.
pub fn build_reason(weighted: &[WeightedFeature]) -> String {
    let parts: Vec<String> = weighted
        .iter()
        .map(|item| {
            let text = if item.value >= EXPLAIN_THRESHOLD {
                item.positive_text.as_str()
            } else if item.value <= -EXPLAIN_THRESHOLD {
                item.negative_text.as_str()
            } else if item.neutral_text.is_empty() {
                item.label
            } else {
                item.neutral_text.as_str()
            };
            format!("{text} ({:+.1} points)", item.contribution)
        })
        .collect();

    if parts.is_empty() {
        return NO_SIGNIFICANT_CHANGES.to_string();
    }
    parts.join(". ")
}
