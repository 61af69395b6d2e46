//! Gateway Client Module
//!
//! Orchestration above the cache: answers authorization from the cache
//! and falls back to the gateway transport on a miss. The cache itself
//! never talks to the network.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{ReportOutcome, ResponseCache};
use crate::error::Result;
use crate::models::{ApiTransaction, AuthorizeResponse};

// == Transport ==
/// Network collaborator that fetches authorization decisions.
///
/// Implementations own their own retry policy, if any.
pub trait Transport: Send + Sync {
    fn authorize(&self, host_url: &str, provider_key: &str, app_key: &str) -> Result<AuthorizeResponse>;
}

// == Gateway Client ==
pub struct GatewayClient<T: Transport> {
    host_url: String,
    provider_key: String,
    transport: T,
    cache: Arc<ResponseCache>,
}

impl<T: Transport> GatewayClient<T> {
    pub fn new(
        host_url: impl Into<String>,
        provider_key: impl Into<String>,
        transport: T,
        cache: Arc<ResponseCache>,
    ) -> Self {
        let host_url = host_url.into();
        info!("Gateway client created for {}", host_url);
        Self {
            host_url,
            provider_key: provider_key.into(),
            transport,
            cache,
        }
    }

    /// Cached decision for `app_key`, fetched and cached on a miss.
    ///
    /// A transport failure is returned as is and nothing is cached.
    pub fn authorize(&self, app_key: &str) -> Result<AuthorizeResponse> {
        if let Some(decision) = self.cache.get_authorize_for(app_key)? {
            return Ok(decision);
        }

        debug!("Authorization cache miss for '{}', asking gateway", app_key);
        let decision = self
            .transport
            .authorize(&self.host_url, &self.provider_key, app_key)?;
        self.cache
            .add_authorized_response(app_key, decision.clone())?;
        Ok(decision)
    }

    /// Queues transactions in the cache for a later flush.
    pub fn report(&self, transactions: &[ApiTransaction]) -> Result<ReportOutcome> {
        self.cache.report(transactions)
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}
