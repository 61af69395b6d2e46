//! API Handlers
//!
//! HTTP request handlers for each cache sidecar endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{ResponseCache, AUTHORIZE_PREFIX, RESPONSE_PREFIX};
use crate::config::CacheSettings;
use crate::error::{CacheError, Result};
use crate::models::{
    ApiTransaction, AuthorizeResponse, HealthResponse, ReportRequest, ReportResponse,
    StatsResponse, StoredResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }

    /// Builds a fresh cache from settings.
    pub fn from_settings(settings: CacheSettings) -> Result<Self> {
        Ok(Self::new(Arc::new(ResponseCache::new(settings)?)))
    }
}

/// Handler for GET /authorize/:app_key
pub async fn get_authorize_handler(
    State(state): State<AppState>,
    Path(app_key): Path<String>,
) -> Result<Json<AuthorizeResponse>> {
    state
        .cache
        .get_authorize_for(&app_key)?
        .map(Json)
        .ok_or_else(|| CacheError::NotFound(format!("{}/{}", AUTHORIZE_PREFIX, app_key)))
}

/// Handler for PUT /authorize/:app_key
pub async fn put_authorize_handler(
    State(state): State<AppState>,
    Path(app_key): Path<String>,
    Json(decision): Json<AuthorizeResponse>,
) -> Result<Json<StoredResponse>> {
    state.cache.add_authorized_response(&app_key, decision)?;
    Ok(Json(StoredResponse::new(format!(
        "{}/{}",
        AUTHORIZE_PREFIX, app_key
    ))))
}

/// Handler for GET /response/:app_id/:timestamp
pub async fn get_transaction_handler(
    State(state): State<AppState>,
    Path((app_id, timestamp)): Path<(String, String)>,
) -> Result<Json<ApiTransaction>> {
    state
        .cache
        .get_transaction_for(&app_id, &timestamp)?
        .map(Json)
        .ok_or_else(|| {
            CacheError::NotFound(format!("{}/{}/{}", RESPONSE_PREFIX, app_id, timestamp))
        })
}

/// Handler for POST /report
///
/// Per-transaction failures come back in the body with a 200.
pub async fn report_handler(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ReportResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidKey(error_msg));
    }

    let outcome = state.cache.report(&req.transactions)?;
    Ok(Json(ReportResponse::from(outcome)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    Ok(Json(StatsResponse::from(state.cache.stats()?)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(!state.cache.is_closed()))
}
