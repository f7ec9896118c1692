use serde::Deserialize;
use stockstream_core::storage::EventSort;

/// Numeric query values are taken as strings so that junk falls back to defaults instead of
/// failing the whole request.
pub fn lenient_i64(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Negative or unparseable offsets start from the beginning.
pub fn clamp_offset(raw: Option<&str>) -> i64 {
    lenient_i64(raw).unwrap_or(0).max(0)
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    pub fn sort(&self) -> EventSort {
        EventSort::sanitize(self.sort.as_deref(), self.order.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
}

impl SearchQuery {
    /// The trimmed search term, or `None` when it is missing or blank.
    pub fn term(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub action: Option<String>,
    pub rating: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl FilterQuery {
    pub fn action(&self) -> Option<&str> {
        non_blank(self.action.as_deref())
    }

    pub fn rating(&self) -> Option<&str> {
        non_blank(self.rating.as_deref())
    }

    /// At least one of `action` / `rating` must be given.
    pub fn has_filter(&self) -> bool {
        self.action().is_some() || self.rating().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockstream_core::storage::{SortField, SortOrder};

    #[test]
    fn offsets_never_go_negative() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some("-5")), 0);
        assert_eq!(clamp_offset(Some("abc")), 0);
        assert_eq!(clamp_offset(Some(" 40 ")), 40);
    }

    #[test]
    fn list_query_sanitizes_sort() {
        let query = ListQuery {
            sort: Some("  INVALID_FIELD  ".to_string()),
            order: Some("  ASC ".to_string()),
            ..Default::default()
        };
        let sort = query.sort();
        assert_eq!(sort.field, SortField::Time);
        assert_eq!(sort.order, SortOrder::Asc);

        let query = ListQuery {
            sort: Some("Ticker".to_string()),
            ..Default::default()
        };
        assert_eq!(query.sort().field, SortField::Ticker);
        assert_eq!(query.sort().order, SortOrder::Desc);
    }

    #[test]
    fn blank_search_term_is_missing() {
        let query = SearchQuery {
            q: Some("   ".to_string()),
            limit: None,
        };
        assert!(query.term().is_none());

        let query = SearchQuery {
            q: Some(" apple ".to_string()),
            limit: None,
        };
        assert_eq!(query.term(), Some("apple"));
    }

    #[test]
    fn filter_needs_action_or_rating() {
        assert!(!FilterQuery::default().has_filter());

        let query = FilterQuery {
            action: Some(" ".to_string()),
            rating: Some("Buy".to_string()),
            ..Default::default()
        };
        assert!(query.has_filter());
        assert_eq!(query.action(), None);
        assert_eq!(query.rating(), Some("Buy"));
    }
}
