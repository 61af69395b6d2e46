//! API Routes
//!
//! Configures the Axum router with all cache sidecar endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_authorize_handler, get_transaction_handler, health_handler, put_authorize_handler,
    report_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/authorize/:app_key",
            get(get_authorize_handler).put(put_authorize_handler),
        )
        .route("/response/:app_id/:timestamp", get(get_transaction_handler))
        .route("/report", post(report_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
