use anyhow::Context;
use clap::Parser;
use std::num::NonZeroUsize;
use stockstream_core::ingest::provider::{fetch_all, HttpRatingFeed};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod preview;

#[derive(Debug, Parser)]
#[command(name = "stockstream_worker")]
struct Args {
    /// Fetch the rating feed and report counts without writing to the database.
    #[arg(long)]
    dry_run: bool,

    /// After syncing, log the top N recommendations computed from stored events. N >= 1.
    #[arg(long, value_name = "N")]
    preview: Option<NonZeroUsize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockstream_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let feed = HttpRatingFeed::from_settings(&settings)?;

    if args.dry_run {
        let events = fetch_all(&feed).await?;
        let undated = events.iter().filter(|e| e.time.is_none()).count();
        tracing::info!(
            dry_run = true,
            fetched = events.len(),
            undated,
            "rating feed dry run"
        );
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    stockstream_core::storage::migrate(&pool).await?;

    match stockstream_core::ingest::sync::run_recorded_sync(&pool, &feed).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(()),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return Err(e);
        }
    }

    if let Some(limit) = args.preview {
        let store = stockstream_core::storage::PgRatingEventStore::new(pool);
        preview::log_top_recommendations(store, limit.get()).await?;
    }

    Ok(())
}

fn init_sentry(settings: &stockstream_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
