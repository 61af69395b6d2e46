//! API Module
//!
//! HTTP handlers and routing for the cache sidecar.
//!
//! # Endpoints
//! - `GET /authorize/:app_key` - Cached authorization decision
//! - `PUT /authorize/:app_key` - Store an authorization decision
//! - `GET /response/:app_id/:timestamp` - Recorded transaction
//! - `POST /report` - Record a batch of transactions
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
