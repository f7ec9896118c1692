pub mod domain;
pub mod history;
pub mod ingest;
pub mod recommend;
pub mod scoring;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub rating_feed_url: Option<String>,
        pub rating_feed_token: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                rating_feed_url: non_empty_var("RATING_FEED_URL"),
                rating_feed_token: non_empty_var("RATING_FEED_TOKEN"),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_rating_feed_url(&self) -> anyhow::Result<&str> {
            self.rating_feed_url
                .as_deref()
                .context("RATING_FEED_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
