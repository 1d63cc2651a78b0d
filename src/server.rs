//! HTTP surface for listing search
//!
//! Routes:
//! - `GET /search?q=&limit=&<filter>=` ranked listings
//! - `GET /suggest?q=&limit=` completions
//! - `GET /stats` performance and cache counters
//! - `GET /health` liveness

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, PerformanceStats, SearchCache, SearchFilters};
use crate::error::AppError;
use crate::listing::PropertyListing;
use crate::search::MatchResult;
use crate::service::{CacheStatus, SearchService};

/// Query parameters that are not filters
const RESERVED_PARAMS: [&str; 2] = ["q", "limit"];

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
}

impl AppState {
    pub fn new(service: Arc<SearchService>) -> Self {
        Self { service }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search_handler))
        .route("/suggest", get(suggest_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreFailed(msg) => {
                warn!("Listing store failed: {}", msg);
                StatusCode::BAD_GATEWAY
            }
            AppError::ConfigError(msg) | AppError::Internal(msg) => {
                error!("Request failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({ "error": self.error_code(), "message": self.message() });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    total: usize,
    results: Vec<MatchResult<PropertyListing>>,
    cache: CacheStatus,
    response_time_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestResponse {
    query: String,
    suggestions: Vec<String>,
    cache: CacheStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    performance: PerformanceStats,
    cache: CacheStats,
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let query = params.get("q").cloned().unwrap_or_default();
    let limit = parse_limit(&params)?;
    let filters: SearchFilters = params
        .iter()
        .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
        .collect();

    let outcome = state.service.search(&query, &filters, limit)?;
    let response_time_ms = u64::try_from(outcome.response_time.as_millis()).unwrap_or(u64::MAX);
    debug!(
        "GET /search q={:?} -> {} results ({})",
        query,
        outcome.results.len(),
        outcome.cache_status.as_str()
    );

    let mut headers = HeaderMap::new();
    headers.insert("x-cache", HeaderValue::from_static(outcome.cache_status.as_str()));
    headers.insert("x-response-time", HeaderValue::from(response_time_ms));
    let max_age = state.service.cache().config().search_ttl.as_secs();
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    let body = SearchResponse {
        query,
        total: outcome.total,
        results: outcome.results,
        cache: outcome.cache_status,
        response_time_ms,
    };
    Ok((headers, Json(body)).into_response())
}

async fn suggest_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let query = params.get("q").cloned().unwrap_or_default();
    let limit = parse_limit(&params)?;

    let outcome = state.service.suggest(&query, limit)?;

    let mut headers = HeaderMap::new();
    headers.insert("x-cache", HeaderValue::from_static(outcome.cache_status.as_str()));

    let body = SuggestResponse {
        query,
        suggestions: outcome.suggestions,
        cache: outcome.cache_status,
    };
    Ok((headers, Json(body)).into_response())
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.service.cache();
    Json(StatsResponse {
        performance: cache.performance_stats(),
        cache: cache.stats(),
    })
}

async fn health_handler() -> &'static str {
    "ok"
}

fn parse_limit(params: &HashMap<String, String>) -> Result<Option<usize>, AppError> {
    match params.get("limit").map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| AppError::InvalidInput(format!("limit must be a non-negative integer, got {:?}", raw))),
    }
}

/// Periodically drop expired cache entries
pub fn spawn_cache_sweeper(
    cache: Arc<SearchCache<PropertyListing>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                debug!("Cache sweep removed {} entries", removed);
            }
        }
    })
}

/// Bind and serve until Ctrl-C
pub async fn serve(service: Arc<SearchService>, bind: &str, sweep_every: Duration) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;

    let sweeper = spawn_cache_sweeper(Arc::clone(service.cache()), sweep_every);
    let app = router(AppState::new(service));

    info!("Listening on http://{}", addr);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server error");

    sweeper.abort();
    result
}
