//! Expiration Policy Module
//!
//! Wall-clock TTLs for cached entries. Only the authorization branch
//! enforces expiry; the report TTL is kept as a setting but not applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::validate_ttl;
use crate::error::Result;

// == Expiration Policy ==
/// Active TTL settings. Changes apply to subsequent inserts only.
#[derive(Debug)]
pub struct ExpirationPolicy {
    authorize_ttl_ms: AtomicU64,
    report_ttl_ms: AtomicU64,
}

impl ExpirationPolicy {
    pub fn new(authorize_ttl: Duration, report_ttl: Duration) -> Result<Self> {
        validate_ttl("authorize", authorize_ttl)?;
        validate_ttl("report", report_ttl)?;
        Ok(Self {
            authorize_ttl_ms: AtomicU64::new(authorize_ttl.as_millis() as u64),
            report_ttl_ms: AtomicU64::new(report_ttl.as_millis() as u64),
        })
    }

    pub fn authorize_ttl(&self) -> Duration {
        Duration::from_millis(self.authorize_ttl_ms.load(Ordering::Relaxed))
    }

    pub fn report_ttl(&self) -> Duration {
        Duration::from_millis(self.report_ttl_ms.load(Ordering::Relaxed))
    }

    pub fn set_authorize_ttl(&self, ttl: Duration) -> Result<()> {
        validate_ttl("authorize", ttl)?;
        self.authorize_ttl_ms
            .store(ttl.as_millis() as u64, Ordering::Relaxed);
        Ok(())
    }

    pub fn set_report_ttl(&self, ttl: Duration) -> Result<()> {
        validate_ttl("report", ttl)?;
        self.report_ttl_ms
            .store(ttl.as_millis() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Absolute expiry for an authorization written at `now_ms`.
    pub fn authorize_expiry_from(&self, now_ms: u64) -> u64 {
        now_ms.saturating_add(self.authorize_ttl_ms.load(Ordering::Relaxed))
    }
}

/// An entry is expired once the current time reaches its expiry.
pub fn is_expired(expiry_ms: u64, now_ms: u64) -> bool {
    now_ms >= expiry_ms
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
