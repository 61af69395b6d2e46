//! Expiry Sweep Task
//!
//! Lookups already drop expired authorizations lazily; the sweep keeps
//! entries that are never read again from piling up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::error::CacheError;

/// Spawns a task that periodically purges expired authorization entries.
///
/// The task stops by itself once the cache is closed; the returned
/// handle can also be aborted during shutdown.
pub fn spawn_sweep_task(cache: Arc<ResponseCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {}ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.purge_expired() {
                Ok(0) => debug!("Expiry sweep: no expired entries found"),
                Ok(removed) => info!("Expiry sweep: removed {} expired entries", removed),
                Err(CacheError::Closed) => {
                    info!("Cache closed, stopping expiry sweep task");
                    break;
                }
                Err(e) => debug!("Expiry sweep failed: {}", e),
            }
        }
    })
}
