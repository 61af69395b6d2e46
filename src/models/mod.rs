//! Payload records and HTTP request/response models
//!
//! `authorize` and `transaction` are the values the cache stores;
//! `requests` and `responses` are the DTOs of the HTTP sidecar.

pub mod authorize;
pub mod requests;
pub mod responses;
pub mod transaction;

// Re-export commonly used types
pub use authorize::{AuthorizeResponse, UsageReport};
pub use requests::ReportRequest;
pub use responses::{HealthResponse, ReportResponse, StatsResponse, StoredResponse};
pub use transaction::ApiTransaction;
