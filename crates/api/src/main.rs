use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockstream_core::domain::recommendation::Recommendation;
use stockstream_core::ingest::provider::HttpRatingFeed;
use stockstream_core::recommend::RecommendationEngine;
use stockstream_core::scoring::weights::{FeatureWeights, FEATURE_WEIGHTS};
use stockstream_core::storage::PgRatingEventStore;
use stockstream_core::time::{Clock, SystemClock};

mod limits;
mod params;
mod stocks;

use limits::PageLimits;
use params::{lenient_i64, LimitQuery};

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

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match stockstream_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let feed = match HttpRatingFeed::from_settings(&settings) {
        Ok(feed) => Some(feed),
        Err(e) => {
            tracing::warn!(error = %e, "rating feed not configured; POST /api/v1/stocks/fetch disabled");
            None
        }
    };

    let state = AppState {
        pool,
        feed,
        clock: Arc::new(SystemClock),
        limits: PageLimits::recommendations_from_env(),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/recommendations", get(get_recommendations))
        .route("/api/v1/metadata", get(stocks::metadata))
        .route("/api/v1/stocks", get(stocks::list_stocks))
        .route("/api/v1/stocks/latest", get(stocks::latest_stocks))
        .route("/api/v1/stocks/search", get(stocks::search_stocks))
        .route("/api/v1/stocks/filter", get(stocks::filter_stocks))
        .route("/api/v1/stocks/fetch", post(stocks::fetch_stocks))
        .route("/api/v1/stocks/ticker/:ticker", get(stocks::ticker_history))
        .route("/api/v1/stocks/:id", get(stocks::stock_by_id))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    feed: Option<HttpRatingFeed>,
    clock: Arc<dyn Clock>,
    limits: PageLimits,
}

impl AppState {
    /// 503 while the API runs without a database.
    fn store(&self) -> Result<PgRatingEventStore, StatusCode> {
        self.pool
            .clone()
            .map(PgRatingEventStore::new)
            .ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[derive(Debug, Serialize)]
struct ApiRecommendations {
    recommendations: Vec<Recommendation>,
    generated_at: DateTime<Utc>,
    count: usize,
    criteria: FeatureWeights,
}

async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiRecommendations>, StatusCode> {
    let store = state.store()?;
    let limit = state.limits.clamp(lenient_i64(query.limit.as_deref()));
    let now = state.clock.now();
    let engine = RecommendationEngine::with_clock(store, Arc::clone(&state.clock));

    let recommendations = engine.get_recommendations_at(limit, now).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "failed to generate recommendations");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ApiRecommendations {
        count: recommendations.len(),
        recommendations,
        generated_at: now,
        criteria: FEATURE_WEIGHTS,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
