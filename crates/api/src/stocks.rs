use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::time::Instant;

use stockstream_core::domain::rating_event::StoredRatingEvent;
use stockstream_core::ingest::sync::run_recorded_sync;

use crate::limits::PageLimits;
use crate::params::{clamp_offset, lenient_i64, FilterQuery, LimitQuery, ListQuery, SearchQuery};
use crate::AppState;

fn internal_error(e: anyhow::Error, message: &'static str) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, "{message}");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Debug, Serialize)]
pub struct StockPage {
    data: Vec<StoredRatingEvent>,
    total: i64,
    limit: i64,
    offset: i64,
}

pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<StockPage>, StatusCode> {
    let store = state.store()?;
    let limit = PageLimits::STOCKS.clamp_sql(lenient_i64(query.limit.as_deref()));
    let offset = clamp_offset(query.offset.as_deref());

    let data = store
        .list(query.sort(), limit, offset)
        .await
        .map_err(|e| internal_error(e, "failed to list rating events"))?;
    let total = store
        .count()
        .await
        .map_err(|e| internal_error(e, "failed to count rating events"))?;

    Ok(Json(StockPage {
        data,
        total,
        limit,
        offset,
    }))
}

#[derive(Debug, Serialize)]
pub struct LatestStocks {
    data: Vec<StoredRatingEvent>,
    total: usize,
}

pub async fn latest_stocks(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<LatestStocks>, StatusCode> {
    let store = state.store()?;
    let limit = PageLimits::LATEST.clamp_sql(lenient_i64(query.limit.as_deref()));

    let data = store
        .latest(limit)
        .await
        .map_err(|e| internal_error(e, "failed to fetch latest rating events"))?;

    Ok(Json(LatestStocks {
        total: data.len(),
        data,
    }))
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    query: String,
    data: Vec<StoredRatingEvent>,
    total: usize,
}

pub async fn search_stocks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, StatusCode> {
    let store = state.store()?;
    let Some(term) = query.term() else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let limit = PageLimits::STOCKS.clamp_sql(lenient_i64(query.limit.as_deref()));

    let data = store.search(term, limit).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, query = term, "failed to search rating events");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(SearchResults {
        query: term.to_string(),
        total: data.len(),
        data,
    }))
}

#[derive(Debug, Serialize)]
pub struct AppliedFilters {
    action: Option<String>,
    rating: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilteredStocks {
    filters: AppliedFilters,
    data: Vec<StoredRatingEvent>,
    total: i64,
    limit: i64,
    offset: i64,
}

pub async fn filter_stocks(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<FilteredStocks>, StatusCode> {
    let store = state.store()?;
    if !query.has_filter() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let (action, rating) = (query.action(), query.rating());
    let limit = PageLimits::STOCKS.clamp_sql(lenient_i64(query.limit.as_deref()));
    let offset = clamp_offset(query.offset.as_deref());

    let (data, total) = store
        .filter(action, rating, limit, offset)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, ?action, ?rating, "failed to filter rating events");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(FilteredStocks {
        filters: AppliedFilters {
            action: action.map(str::to_string),
            rating: rating.map(str::to_string),
        },
        data,
        total,
        limit,
        offset,
    }))
}

#[derive(Debug, Serialize)]
pub struct TickerHistory {
    ticker: String,
    company: String,
    history: Vec<StoredRatingEvent>,
    total: usize,
}

pub async fn ticker_history(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<TickerHistory>, StatusCode> {
    let store = state.store()?;
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let history = store.find_by_ticker(ticker).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, ticker, "failed to fetch ticker history");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(latest) = history.first() else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(TickerHistory {
        ticker: ticker.to_string(),
        company: latest.event.company.clone(),
        total: history.len(),
        history,
    }))
}

pub async fn stock_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredRatingEvent>, StatusCode> {
    let store = state.store()?;
    let id: i64 = id.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?;

    let stock = store
        .find_by_id(id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, id, "failed to fetch rating event");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(stock))
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    actions: Vec<String>,
    ratings: Vec<String>,
}

pub async fn metadata(State(state): State<AppState>) -> Result<Json<Metadata>, StatusCode> {
    let store = state.store()?;

    let actions = store
        .distinct_actions()
        .await
        .map_err(|e| internal_error(e, "failed to fetch distinct actions"))?;
    let ratings = store
        .distinct_ratings()
        .await
        .map_err(|e| internal_error(e, "failed to fetch distinct ratings"))?;

    Ok(Json(Metadata { actions, ratings }))
}

#[derive(Debug, Serialize)]
pub struct FetchReport {
    message: &'static str,
    run_id: String,
    total_new: usize,
    total_updated: usize,
    total_unchanged: usize,
    total_skipped: usize,
    total_fetched: usize,
    duration_ms: u128,
}

/// Runs one feed sync in the request. 409 while another sync holds the lock.
pub async fn fetch_stocks(State(state): State<AppState>) -> Result<Json<FetchReport>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let Some(feed) = &state.feed else {
        tracing::warn!("rating feed not configured; refusing sync request");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let started = Instant::now();
    let recorded = run_recorded_sync(pool, feed)
        .await
        .map_err(|e| internal_error(e, "rating sync request failed"))?
        .ok_or(StatusCode::CONFLICT)?;

    let summary = recorded.summary;
    Ok(Json(FetchReport {
        message: "Data fetched successfully",
        run_id: recorded.run_id.to_string(),
        total_new: summary.inserted,
        total_updated: summary.updated,
        total_unchanged: summary.unchanged,
        total_skipped: summary.skipped,
        total_fetched: summary.fetched,
        duration_ms: started.elapsed().as_millis(),
    }))
}
