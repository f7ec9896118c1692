use crate::domain::recommendation::Confidence;

/// Attenuate the raw score by data quality and map it onto the public [0, 100] band.
pub fn calibrate_score(raw_score: f64, data_quality: f64) -> f64 {
    let quality_factor = 0.78 + data_quality.clamp(0.0, 100.0) / 100.0 * 0.22;
    let adjusted = raw_score * quality_factor;
    ((adjusted + 100.0) / 2.0).clamp(0.0, 100.0)
}

pub fn determine_confidence(score: f64, history_count: usize, data_quality: f64) -> Confidence {
    if score >= 74.0 && history_count >= 4 && data_quality >= 72.0 {
        Confidence::High
    } else if score >= 58.0 && history_count >= 2 && data_quality >= 48.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_quality_maps_linearly() {
        assert_eq!(calibrate_score(0.0, 100.0), 50.0);
        assert_eq!(calibrate_score(100.0, 100.0), 100.0);
        assert_eq!(calibrate_score(-100.0, 100.0), 0.0);
    }

    #[test]
    fn low_quality_compresses_toward_midpoint() {
        let strong = calibrate_score(80.0, 100.0);
        let weak = calibrate_score(80.0, 0.0);
        assert!(weak < strong);
        assert!((weak - (80.0 * 0.78 + 100.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_always_bounded() {
        for raw in [-1e6, -150.0, -1.0, 0.0, 1.0, 150.0, 1e6] {
            for quality in [-10.0, 0.0, 50.0, 100.0, 200.0] {
                let s = calibrate_score(raw, quality);
                assert!((0.0..=100.0).contains(&s), "raw={raw} quality={quality} -> {s}");
            }
        }
    }

    #[test]
    fn confidence_tiers() {
        assert_eq!(determine_confidence(80.0, 4, 80.0), Confidence::High);
        assert_eq!(determine_confidence(80.0, 3, 80.0), Confidence::Medium);
        assert_eq!(determine_confidence(80.0, 4, 60.0), Confidence::Medium);
        assert_eq!(determine_confidence(60.0, 2, 48.0), Confidence::Medium);
        assert_eq!(determine_confidence(60.0, 1, 90.0), Confidence::Low);
        assert_eq!(determine_confidence(57.9, 10, 100.0), Confidence::Low);
    }
}
