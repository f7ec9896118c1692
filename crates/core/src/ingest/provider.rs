use crate::config::Settings;
use crate::domain::rating_event::RatingEvent;
use crate::ingest::types::RatingFeedPage;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_PAGE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_PAGES: usize = 1000;
const MAX_BACKOFF_SHIFT: u32 = 5;

#[async_trait::async_trait]
pub trait RatingFeedClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Pause between consecutive pages in [`fetch_all`].
    fn page_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn max_pages(&self) -> usize {
        DEFAULT_MAX_PAGES
    }

    async fn fetch_page(&self, next_page: Option<&str>) -> Result<RatingFeedPage>;
}

/// Bearer-token JSON feed paginated through a `next_page` query parameter.
#[derive(Debug, Clone)]
pub struct HttpRatingFeed {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
    retries: u32,
    page_delay: Duration,
    max_pages: usize,
}

impl HttpRatingFeed {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings.require_rating_feed_url()?.to_string();
        let token = settings.rating_feed_token.clone();

        let timeout_secs = std::env::var("RATING_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("RATING_FEED_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_RETRIES);

        let page_delay_ms = std::env::var("RATING_FEED_PAGE_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PAGE_DELAY_MS);

        let max_pages = std::env::var("RATING_FEED_MAX_PAGES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_MAX_PAGES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build rating feed http client")?;

        Ok(Self {
            http,
            url,
            token,
            retries,
            page_delay: Duration::from_millis(page_delay_ms),
            max_pages,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, next_page: Option<&str>) -> Result<RatingFeedPage> {
        let mut req = self.http.get(&self.url).headers(self.headers()?);
        if let Some(page) = next_page {
            req = req.query(&[("next_page", page)]);
        }

        let res = req.send().await.context("rating feed request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read rating feed response")?;

        if !status.is_success() {
            anyhow::bail!("rating feed HTTP {status}: {text}");
        }

        serde_json::from_str::<RatingFeedPage>(&text)
            .with_context(|| format!("failed to parse rating feed page: {text}"))
    }
}

#[async_trait::async_trait]
impl RatingFeedClient for HttpRatingFeed {
    fn provider_name(&self) -> &'static str {
        "http_rating_feed"
    }

    fn page_delay(&self) -> Duration {
        self.page_delay
    }

    fn max_pages(&self) -> usize {
        self.max_pages
    }

    async fn fetch_page(&self, next_page: Option<&str>) -> Result<RatingFeedPage> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(next_page).await {
                Ok(page) => return Ok(page),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = retry_backoff(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "rating feed fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Exponential backoff after the given failed attempt (1-based): 1s, 2s, 4s, ... capped at 32s.
fn retry_backoff(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_secs(1u64 << shift)
}

/// Follow `next_page` links until the feed is exhausted. Items with an empty ticker are dropped.
pub async fn fetch_all(client: &dyn RatingFeedClient) -> Result<Vec<RatingEvent>> {
    let mut events = Vec::new();
    let mut next_page: Option<String> = None;
    let mut page_count: usize = 0;
    let mut dropped: usize = 0;

    loop {
        page_count += 1;
        anyhow::ensure!(
            page_count <= client.max_pages(),
            "rating feed exceeded {} pages",
            client.max_pages()
        );

        let page = client
            .fetch_page(next_page.as_deref())
            .await
            .with_context(|| format!("failed to fetch rating feed page {page_count}"))?;

        let page_len = page.items.len();
        let next = page.next_page_token().map(str::to_string);
        for item in page.items {
            if item.ticker.trim().is_empty() {
                dropped += 1;
                continue;
            }
            events.push(item);
        }
        tracing::debug!(page = page_count, items = page_len, "rating feed page fetched");

        match next {
            Some(token) => {
                next_page = Some(token);
                let delay = client.page_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            None => break,
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped rating feed items without a ticker");
    }
    tracing::info!(
        provider = client.provider_name(),
        pages = page_count,
        events = events.len(),
        "rating feed fetched"
    );
    Ok(events)
}
