use crate::domain::rating_event::RatingEvent;
use serde::{Deserialize, Serialize};

/// One page of the upstream rating feed. An empty or absent `next_page` is the last page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingFeedPage {
    #[serde(default)]
    pub items: Vec<RatingEvent>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl RatingFeedPage {
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
