//! Authorization decision payload
//!
//! The cache never inspects these fields; they travel as one value.

use serde::{Deserialize, Serialize};

/// Decision returned by the gateway for one application key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    /// Whether the application may proceed
    pub authorized: bool,
    /// Plan the application is subscribed to
    #[serde(default)]
    pub plan: Option<String>,
    /// Denial reason, if any
    #[serde(default)]
    pub reason: Option<String>,
    /// Usage counters attached to the decision
    #[serde(default)]
    pub usage_reports: Vec<UsageReport>,
}

impl AuthorizeResponse {
    pub fn authorized(plan: impl Into<String>) -> Self {
        Self {
            authorized: true,
            plan: Some(plan.into()),
            reason: None,
            usage_reports: Vec::new(),
        }
    }

    /// True if any attached usage counter is over its limit.
    pub fn has_exceeded_limits(&self) -> bool {
        self.usage_reports.iter().any(UsageReport::has_exceeded)
    }
}

/// One metric's usage over a period, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub metric: String,
    pub period: String,
    pub period_start: String,
    pub period_end: String,
    pub current_value: String,
    pub max_value: String,
}

impl UsageReport {
    /// Current value exceeds max; unparsable counters never count as exceeded.
    pub fn has_exceeded(&self) -> bool {
        match (
            self.current_value.trim().parse::<u64>(),
            self.max_value.trim().parse::<u64>(),
        ) {
            (Ok(current), Ok(max)) => current > max,
            _ => false,
        }
    }
}
