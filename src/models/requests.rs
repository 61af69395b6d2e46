//! Request DTOs for the cache sidecar API

use serde::Deserialize;

use crate::models::ApiTransaction;

/// Request body for POST /report
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    /// Transactions to record, in order
    pub transactions: Vec<ApiTransaction>,
}

impl ReportRequest {
    /// Returns an error message if the batch is unusable as a whole.
    ///
    /// Individual malformed transactions are not rejected here; they are
    /// reported per entry by the cache.
    pub fn validate(&self) -> Option<String> {
        if self.transactions.is_empty() {
            return Some("Report must contain at least one transaction".to_string());
        }
        None
    }
}
