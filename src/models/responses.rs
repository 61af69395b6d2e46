//! Response DTOs for the cache sidecar API

use serde::Serialize;

use crate::cache::{CacheStats, ReportOutcome};

/// Response body for PUT /authorize/:app_key
#[derive(Debug, Clone, Serialize)]
pub struct StoredResponse {
    pub message: String,
    pub path: String,
}

impl StoredResponse {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("Stored '{}'", path),
            path,
        }
    }
}

/// One rejected transaction of a report batch.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFailureBody {
    pub index: usize,
    pub app_id: String,
    pub timestamp: String,
    pub error: String,
}

/// Response body for POST /report
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub recorded: usize,
    pub failures: Vec<ReportFailureBody>,
}

impl From<ReportOutcome> for ReportResponse {
    fn from(outcome: ReportOutcome) -> Self {
        Self {
            recorded: outcome.recorded,
            failures: outcome
                .failures
                .into_iter()
                .map(|failure| ReportFailureBody {
                    index: failure.index,
                    app_id: failure.app_id,
                    timestamp: failure.timestamp,
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" while the cache is open, "closed" afterwards
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(open: bool) -> Self {
        Self {
            status: if open { "healthy" } else { "closed" }.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
