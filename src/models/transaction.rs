//! Usage report transaction payload

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One usage transaction queued for reporting.
///
/// `app_id` and `timestamp` form its cache key; `metrics` is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTransaction {
    pub app_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub metrics: HashMap<String, String>,
}

impl ApiTransaction {
    pub fn new(app_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            timestamp: timestamp.into(),
            metrics: HashMap::new(),
        }
    }

    /// Adds a metric value, builder style.
    pub fn with_metric(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }
}
