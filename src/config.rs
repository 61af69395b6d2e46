//! Configuration Module
//!
//! Handles loading and validating cache and server configuration from
//! environment variables. Invalid values are rejected, never clamped.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default TTL for both authorization and report entries.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_millis(500);

/// Default node bound of the authorization eviction region.
pub const DEFAULT_AUTHORIZE_MAX_NODES: usize = 10_000;

// == Cache Settings ==
/// Settings consumed by [`crate::cache::ResponseCache`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// TTL stamped on authorization entries
    pub authorize_ttl: Duration,
    /// TTL kept for report entries; not enforced on the report branch
    pub report_ttl: Duration,
    /// Maximum node count of the authorization region
    pub authorize_max_nodes: usize,
    /// Optional bound for the report branch, `None` = unbounded
    pub report_max_nodes: Option<usize>,
}

impl CacheSettings {
    /// Rejects zero TTLs and zero node bounds.
    pub fn validate(&self) -> Result<()> {
        validate_ttl("authorize", self.authorize_ttl)?;
        validate_ttl("report", self.report_ttl)?;
        validate_max_nodes("authorize", self.authorize_max_nodes)?;
        if let Some(max) = self.report_max_nodes {
            validate_max_nodes("report", max)?;
        }
        Ok(())
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            authorize_ttl: DEFAULT_EXPIRATION,
            report_ttl: DEFAULT_EXPIRATION,
            authorize_max_nodes: DEFAULT_AUTHORIZE_MAX_NODES,
            report_max_nodes: None,
        }
    }
}

/// Checks a TTL is usable as an expiration interval.
///
/// Expiry is tracked in whole milliseconds, so anything below 1 ms is
/// rejected rather than truncated to zero.
pub fn validate_ttl(name: &str, ttl: Duration) -> Result<()> {
    if ttl.as_millis() == 0 {
        return Err(CacheError::InvalidConfig(format!(
            "{} expiration interval must be at least 1ms, got {:?}",
            name, ttl
        )));
    }
    if u64::try_from(ttl.as_millis()).is_err() {
        return Err(CacheError::InvalidConfig(format!(
            "{} expiration interval is too large",
            name
        )));
    }
    Ok(())
}

fn validate_max_nodes(name: &str, max_nodes: usize) -> Result<()> {
    if max_nodes == 0 {
        return Err(CacheError::InvalidConfig(format!(
            "{} max nodes must be greater than zero",
            name
        )));
    }
    Ok(())
}

// == Server Config ==
/// Full process configuration for the cache sidecar.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache engine settings
    pub cache: CacheSettings,
    /// HTTP server port
    pub server_port: u16,
    /// Interval between background expiry sweeps
    pub sweep_interval: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `AUTHORIZE_TTL_MS` - Authorization TTL in milliseconds (default: 500)
    /// - `REPORT_TTL_MS` - Report TTL in milliseconds (default: 500)
    /// - `AUTHORIZE_MAX_NODES` - Authorization region bound (default: 10000)
    /// - `REPORT_MAX_NODES` - Report branch bound (default: unbounded)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL_MS` - Expiry sweep frequency in milliseconds (default: 1000)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let cache = CacheSettings {
            authorize_ttl: env_millis("AUTHORIZE_TTL_MS")?
                .unwrap_or(defaults.cache.authorize_ttl),
            report_ttl: env_millis("REPORT_TTL_MS")?.unwrap_or(defaults.cache.report_ttl),
            authorize_max_nodes: env_parse("AUTHORIZE_MAX_NODES")?
                .unwrap_or(defaults.cache.authorize_max_nodes),
            report_max_nodes: env_parse("REPORT_MAX_NODES")?,
        };
        cache.validate()?;

        let sweep_interval =
            env_millis("SWEEP_INTERVAL_MS")?.unwrap_or(defaults.sweep_interval);
        if sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "SWEEP_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            cache,
            server_port: env_parse("SERVER_PORT")?.unwrap_or(defaults.server_port),
            sweep_interval,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            server_port: 3000,
            sweep_interval: Duration::from_secs(1),
        }
    }
}

/// Parses an optional variable; present but malformed is an error.
fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            CacheError::InvalidConfig(format!("{} has invalid value '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    match env_parse::<i64>(name)? {
        Some(ms) if ms < 0 => Err(CacheError::InvalidConfig(format!(
            "{} must not be negative, got {}",
            name, ms
        ))),
        Some(ms) => Ok(Some(Duration::from_millis(ms as u64))),
        None => Ok(None),
    }
}
