/// Default and cap for a `limit` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl PageLimits {
    pub const RECOMMENDATIONS: Self = Self::new(10, 50);
    /// `/stocks`, `/stocks/search` and `/stocks/filter`.
    pub const STOCKS: Self = Self::new(50, 200);
    pub const LATEST: Self = Self::new(20, 100);

    const fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Recommendation limits, overridable through `RECOMMENDATIONS_MAX_LIMIT` and
    /// `RECOMMENDATIONS_DEFAULT_LIMIT`.
    pub fn recommendations_from_env() -> Self {
        let mut out = Self::RECOMMENDATIONS;

        if let Ok(s) = std::env::var("RECOMMENDATIONS_MAX_LIMIT") {
            if let Ok(n) = s.parse::<usize>() {
                if n >= 1 {
                    out.max_limit = n;
                }
            }
        }

        if let Ok(s) = std::env::var("RECOMMENDATIONS_DEFAULT_LIMIT") {
            if let Ok(n) = s.parse::<usize>() {
                if n >= 1 {
                    out.default_limit = n;
                }
            }
        }

        out.default_limit = out.default_limit.min(out.max_limit);
        out
    }

    /// Missing or non-positive requests get the default; larger ones are capped.
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n >= 1 => (n as u64).min(self.max_limit as u64) as usize,
            _ => self.default_limit,
        }
    }

    /// [`clamp`](Self::clamp) as a SQL `LIMIT` value.
    pub fn clamp_sql(&self, requested: Option<i64>) -> i64 {
        i64::try_from(self.clamp(requested)).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_requested_limit() {
        let limits = PageLimits::RECOMMENDATIONS;
        assert_eq!(limits.clamp(None), 10);
        assert_eq!(limits.clamp(Some(0)), 10);
        assert_eq!(limits.clamp(Some(-3)), 10);
        assert_eq!(limits.clamp(Some(1)), 1);
        assert_eq!(limits.clamp(Some(50)), 50);
        assert_eq!(limits.clamp(Some(500)), 50);
    }

    #[test]
    fn stock_listing_limits() {
        let stocks = PageLimits::STOCKS;
        assert_eq!(stocks.clamp_sql(None), 50);
        assert_eq!(stocks.clamp_sql(Some(0)), 50);
        assert_eq!(stocks.clamp_sql(Some(120)), 120);
        assert_eq!(stocks.clamp_sql(Some(1000)), 200);

        let latest = PageLimits::LATEST;
        assert_eq!(latest.clamp_sql(None), 20);
        assert_eq!(latest.clamp_sql(Some(-1)), 20);
        assert_eq!(latest.clamp_sql(Some(200)), 100);
    }
}
