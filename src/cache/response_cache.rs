//! Response Cache Module
//!
//! Public cache operations: authorization decisions under
//! `/authorize/{app_key}` with TTL and an LRU bound, and usage
//! transactions under `/response/{app_id}` keyed by their timestamp.

use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::expiration::{current_timestamp_ms, is_expired};
use crate::cache::{
    CacheStats, ExpirationPolicy, FieldValue, Fields, NodePath, RegionConfig, TreeStore,
    AUTHORIZE_PREFIX, AUTH_RESPONSE_FIELD, EXPIRATION_FIELD, RESPONSE_PREFIX,
};
use crate::config::CacheSettings;
use crate::error::{CacheError, Result};
use crate::models::{ApiTransaction, AuthorizeResponse};

// == Report Outcome ==
/// Result of recording a batch of transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    /// Transactions written to the cache
    pub recorded: usize,
    /// Transactions that could not be written, in batch order
    pub failures: Vec<ReportFailure>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A transaction rejected from a report batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFailure {
    /// Position in the submitted batch
    pub index: usize,
    pub app_id: String,
    pub timestamp: String,
    pub error: CacheError,
}

// == Response Cache ==
/// Thread-safe cache facade owning a single [`TreeStore`].
///
/// After [`close`](Self::close) every operation fails with
/// [`CacheError::Closed`].
#[derive(Debug)]
pub struct ResponseCache {
    store: RwLock<Option<TreeStore>>,
    expiration: ExpirationPolicy,
    stats: Mutex<CacheStats>,
    authorize_root: NodePath,
    response_root: NodePath,
}

impl ResponseCache {
    // == Constructor ==
    /// Creates a cache with the authorization region bounded by
    /// `settings.authorize_max_nodes`. The report branch is only bounded
    /// when `settings.report_max_nodes` is set.
    pub fn new(settings: CacheSettings) -> Result<Self> {
        settings.validate()?;

        let authorize_root = NodePath::parse(AUTHORIZE_PREFIX);
        let response_root = NodePath::parse(RESPONSE_PREFIX);

        let mut regions = vec![RegionConfig::new(
            authorize_root.clone(),
            settings.authorize_max_nodes,
        )?];
        if let Some(max_nodes) = settings.report_max_nodes {
            regions.push(RegionConfig::new(response_root.clone(), max_nodes)?);
        }

        let store = TreeStore::new(regions)?;
        let expiration = ExpirationPolicy::new(settings.authorize_ttl, settings.report_ttl)?;

        info!(
            "Response cache created: authorize_ttl={}ms, authorize_max_nodes={}, report_max_nodes={:?}",
            settings.authorize_ttl.as_millis(),
            settings.authorize_max_nodes,
            settings.report_max_nodes
        );

        Ok(Self {
            store: RwLock::new(Some(store)),
            expiration,
            stats: Mutex::new(CacheStats::new()),
            authorize_root,
            response_root,
        })
    }

    // == Authorization ==
    /// Returns the live decision for `app_key`, `None` on a miss.
    ///
    /// An expired entry is a miss and is removed on the spot.
    pub fn get_authorize_for(&self, app_key: &str) -> Result<Option<AuthorizeResponse>> {
        let path = self.authorize_root.child(app_key)?;
        let now = current_timestamp_ms();

        self.with_store(|store| {
            let entry = store.read_node(&path, |fields| {
                let decision = match fields.get(AUTH_RESPONSE_FIELD) {
                    Some(FieldValue::Authorization(decision)) => Some(decision.clone()),
                    _ => None,
                };
                (decision, expiry_of(fields))
            });

            match entry {
                Some((Some(decision), Some(expiry))) if !is_expired(expiry, now) => {
                    store.touch(&path);
                    self.stats.lock().record_hit();
                    Some(decision)
                }
                Some((_, Some(expiry))) if is_expired(expiry, now) => {
                    let removed = store.remove_node_if(&path, |fields| {
                        expiry_of(fields) == Some(expiry)
                    });
                    debug!("Authorization {} expired at {}", path, expiry);
                    let mut stats = self.stats.lock();
                    stats.record_expirations(removed.len());
                    stats.record_miss();
                    None
                }
                _ => {
                    self.stats.lock().record_miss();
                    None
                }
            }
        })
    }

    /// Stores `decision` for `app_key`, replacing any previous decision
    /// and stamping expiry = now + authorize TTL.
    pub fn add_authorized_response(&self, app_key: &str, decision: AuthorizeResponse) -> Result<()> {
        let path = self.authorize_root.child(app_key)?;
        let expiry = self
            .expiration
            .authorize_expiry_from(current_timestamp_ms());

        let evicted = self.with_store(|store| {
            store.put_fields(
                &path,
                vec![
                    (
                        AUTH_RESPONSE_FIELD.to_string(),
                        FieldValue::Authorization(decision),
                    ),
                    (EXPIRATION_FIELD.to_string(), FieldValue::Timestamp(expiry)),
                ],
            )
        })?;

        debug!("Cached authorization {} until {}", path, expiry);
        if !evicted.is_empty() {
            debug!("Evicted {} least recently used authorizations", evicted.len());
            self.stats.lock().record_evictions(evicted.len());
        }
        Ok(())
    }

    // == Transactions ==
    /// Returns the transaction recorded for `app_id` at `timestamp`.
    pub fn get_transaction_for(&self, app_id: &str, timestamp: &str) -> Result<Option<ApiTransaction>> {
        let path = self.response_root.child(app_id)?;
        validate_timestamp(app_id, timestamp)?;

        self.with_store(|store| match store.get(&path, timestamp) {
            Some(FieldValue::Transaction(transaction)) => {
                store.touch(&path);
                Some(transaction)
            }
            _ => None,
        })
    }

    /// Records each transaction under `/response/{app_id}`, field = its
    /// timestamp. A malformed transaction is reported in the outcome and
    /// does not stop the rest of the batch.
    pub fn report(&self, transactions: &[ApiTransaction]) -> Result<ReportOutcome> {
        self.with_store(|store| {
            let mut outcome = ReportOutcome::default();

            for (index, transaction) in transactions.iter().enumerate() {
                match self.record_transaction(store, transaction) {
                    Ok(()) => outcome.recorded += 1,
                    Err(error) => {
                        warn!(
                            "Report entry {} for app '{}' rejected: {}",
                            index, transaction.app_id, error
                        );
                        outcome.failures.push(ReportFailure {
                            index,
                            app_id: transaction.app_id.clone(),
                            timestamp: transaction.timestamp.clone(),
                            error,
                        });
                    }
                }
            }

            outcome
        })
    }

    fn record_transaction(&self, store: &TreeStore, transaction: &ApiTransaction) -> Result<()> {
        validate_timestamp(&transaction.app_id, &transaction.timestamp)?;
        let path = self.response_root.child(&transaction.app_id)?;

        let evicted = store.put(
            &path,
            transaction.timestamp.clone(),
            FieldValue::Transaction(transaction.clone()),
        );

        debug!("Put transaction into cache as {}/{}", path, transaction.timestamp);
        if !evicted.is_empty() {
            debug!("Evicted {} least recently used report nodes", evicted.len());
            self.stats.lock().record_report_evictions(evicted.len());
        }
        Ok(())
    }

    // == Expiration Settings ==
    /// Changes the authorization TTL for subsequent inserts.
    pub fn set_authorize_expiration_interval(&self, ttl: Duration) -> Result<()> {
        self.ensure_open()?;
        self.expiration.set_authorize_ttl(ttl)?;
        info!("Authorize expiration interval set to {}ms", ttl.as_millis());
        Ok(())
    }

    /// Changes the report TTL setting. Report entries do not expire; the
    /// value is kept for callers that flush on their own schedule.
    pub fn set_report_expiration_interval(&self, ttl: Duration) -> Result<()> {
        self.ensure_open()?;
        self.expiration.set_report_ttl(ttl)?;
        info!("Report expiration interval set to {}ms", ttl.as_millis());
        Ok(())
    }

    pub fn authorize_expiration_interval(&self) -> Duration {
        self.expiration.authorize_ttl()
    }

    pub fn report_expiration_interval(&self) -> Duration {
        self.expiration.report_ttl()
    }

    // == Maintenance ==
    /// Removes every expired authorization entry now.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = current_timestamp_ms();

        let removed = self.with_store(|store| {
            store
                .paths_under(&self.authorize_root)
                .into_iter()
                .map(|path| {
                    store
                        .remove_node_if(&path, |fields| {
                            expiry_of(fields).is_some_and(|expiry| is_expired(expiry, now))
                        })
                        .len()
                })
                .sum::<usize>()
        })?;

        self.stats.lock().record_expirations(removed);
        Ok(removed)
    }

    /// Snapshot of counters and current entry counts.
    pub fn stats(&self) -> Result<CacheStats> {
        self.with_store(|store| {
            let mut stats = self.stats.lock().clone();
            stats.authorize_entries = store.count_nodes_under(&self.authorize_root);
            stats.report_transactions = store.count_fields_under(&self.response_root);
            stats
        })
    }

    // == Lifecycle ==
    /// Tears down the store. Calling it again is a no-op.
    ///
    /// Operations already running finish first; later ones get
    /// [`CacheError::Closed`].
    pub fn close(&self) {
        let taken = self.store.write().take();
        match taken {
            Some(store) => {
                store.clear();
                info!("Response cache closed");
            }
            None => debug!("Response cache already closed"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.store.read().is_none()
    }

    fn ensure_open(&self) -> Result<()> {
        self.with_store(|_| ())
    }

    fn with_store<R>(&self, f: impl FnOnce(&TreeStore) -> R) -> Result<R> {
        let guard = self.store.read();
        let store = guard.as_ref().ok_or(CacheError::Closed)?;
        Ok(f(store))
    }

}

/// Rejects the empty timestamp, which cannot name a transaction field.
fn validate_timestamp(app_id: &str, timestamp: &str) -> Result<()> {
    if timestamp.is_empty() {
        return Err(CacheError::InvalidKey(format!(
            "empty timestamp for app '{}'",
            app_id
        )));
    }
    Ok(())
}

fn expiry_of(fields: &Fields) -> Option<u64> {
    match fields.get(EXPIRATION_FIELD) {
        Some(FieldValue::Timestamp(expiry)) => Some(*expiry),
        _ => None,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::{self, sleep};

    fn cache_with(max_nodes: usize, ttl_ms: u64) -> ResponseCache {
        ResponseCache::new(CacheSettings {
            authorize_ttl: Duration::from_millis(ttl_ms),
            authorize_max_nodes: max_nodes,
            ..CacheSettings::default()
        })
        .unwrap()
    }

    fn decision(plan: &str) -> AuthorizeResponse {
        AuthorizeResponse::authorized(plan)
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let result = ResponseCache::new(CacheSettings {
            authorize_max_nodes: 0,
            ..CacheSettings::default()
        });
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_authorize_hit_and_miss() {
        let cache = cache_with(100, 60_000);

        assert_eq!(cache.get_authorize_for("X").unwrap(), None);
        cache.add_authorized_response("X", decision("Basic")).unwrap();
        assert_eq!(cache.get_authorize_for("X").unwrap(), Some(decision("Basic")));

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.authorize_entries, 1);
    }

    #[test]
    fn test_authorize_ttl_expiry() {
        let cache = cache_with(100, 500);

        cache.add_authorized_response("X", decision("Basic")).unwrap();
        assert!(cache.get_authorize_for("X").unwrap().is_some());

        sleep(Duration::from_millis(600));

        assert_eq!(cache.get_authorize_for("X").unwrap(), None);
        let stats = cache.stats().unwrap();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.authorize_entries, 0);
    }

    #[test]
    fn test_lru_bound_evicts_oldest() {
        let cache = cache_with(3, 60_000);

        for key in ["A", "B", "C", "D"] {
            cache.add_authorized_response(key, decision(key)).unwrap();
        }

        assert_eq!(cache.get_authorize_for("A").unwrap(), None);
        for key in ["B", "C", "D"] {
            assert_eq!(cache.get_authorize_for(key).unwrap(), Some(decision(key)));
        }
        assert_eq!(cache.stats().unwrap().evictions, 1);
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let cache = cache_with(3, 60_000);

        for key in ["A", "B", "C"] {
            cache.add_authorized_response(key, decision(key)).unwrap();
        }
        assert!(cache.get_authorize_for("A").unwrap().is_some());
        cache.add_authorized_response("D", decision("D")).unwrap();

        assert!(cache.get_authorize_for("A").unwrap().is_some());
        assert_eq!(cache.get_authorize_for("B").unwrap(), None);
        assert!(cache.get_authorize_for("C").unwrap().is_some());
        assert!(cache.get_authorize_for("D").unwrap().is_some());
    }

    #[test]
    fn test_overwrite_replaces_decision_and_expiry() {
        let cache = cache_with(100, 300);

        cache.add_authorized_response("X", decision("Old")).unwrap();
        sleep(Duration::from_millis(200));
        cache
            .set_authorize_expiration_interval(Duration::from_millis(1_000))
            .unwrap();
        cache.add_authorized_response("X", decision("New")).unwrap();

        // Past the first entry's TTL, inside the second's
        sleep(Duration::from_millis(300));
        assert_eq!(cache.get_authorize_for("X").unwrap(), Some(decision("New")));
        assert_eq!(cache.stats().unwrap().authorize_entries, 1);
    }

    #[test]
    fn test_ttl_change_is_not_retroactive() {
        let cache = cache_with(100, 60_000);

        cache.add_authorized_response("X", decision("Basic")).unwrap();
        cache
            .set_authorize_expiration_interval(Duration::from_millis(1))
            .unwrap();
        sleep(Duration::from_millis(20));

        assert!(cache.get_authorize_for("X").unwrap().is_some());
    }

    #[test]
    fn test_invalid_app_key() {
        let cache = cache_with(100, 60_000);
        assert!(matches!(
            cache.add_authorized_response("a/b", decision("x")),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            cache.get_authorize_for(""),
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_report_accumulates_transactions() {
        let cache = cache_with(100, 60_000);
        let t1 = ApiTransaction::new("1", "t1").with_metric("hits", "1");
        let t2 = ApiTransaction::new("1", "t2").with_metric("hits", "2");

        let outcome = cache.report(&[t1.clone(), t2.clone()]).unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.recorded, 2);
        assert_eq!(cache.get_transaction_for("1", "t1").unwrap(), Some(t1));
        assert_eq!(cache.get_transaction_for("1", "t2").unwrap(), Some(t2));
        assert_eq!(cache.get_transaction_for("1", "t3").unwrap(), None);
        assert_eq!(cache.get_transaction_for("2", "t1").unwrap(), None);
    }

    #[test]
    fn test_report_branch_is_unbounded() {
        let cache = ResponseCache::new(CacheSettings::default()).unwrap();
        let transactions: Vec<_> = (0..10_050)
            .map(|i| ApiTransaction::new("1", format!("t{}", i)))
            .collect();

        let outcome = cache.report(&transactions).unwrap();

        assert_eq!(outcome.recorded, 10_050);
        assert!(cache.get_transaction_for("1", "t0").unwrap().is_some());
        assert!(cache.get_transaction_for("1", "t10049").unwrap().is_some());
        let stats = cache.stats().unwrap();
        assert_eq!(stats.report_transactions, 10_050);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_report_bound_hook() {
        let cache = ResponseCache::new(CacheSettings {
            report_max_nodes: Some(2),
            ..CacheSettings::default()
        })
        .unwrap();

        let batch: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|app| ApiTransaction::new(*app, "t1"))
            .collect();
        cache.report(&batch).unwrap();

        assert_eq!(cache.get_transaction_for("a", "t1").unwrap(), None);
        assert!(cache.get_transaction_for("c", "t1").unwrap().is_some());

        let stats = cache.stats().unwrap();
        assert_eq!(stats.report_evictions, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_report_failure_does_not_abort_batch() {
        let cache = cache_with(100, 60_000);
        let batch = vec![
            ApiTransaction::new("1", "t1"),
            ApiTransaction::new("", "t2"),
            ApiTransaction::new("1", ""),
            ApiTransaction::new("1", "t4"),
        ];

        let outcome = cache.report(&batch).unwrap();

        assert_eq!(outcome.recorded, 2);
        let failed: Vec<_> = outcome.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![1, 2]);
        assert!(matches!(outcome.failures[0].error, CacheError::InvalidKey(_)));
        assert!(cache.get_transaction_for("1", "t4").unwrap().is_some());
    }

    #[test]
    fn test_empty_timestamp_lookup_is_invalid() {
        let cache = cache_with(100, 60_000);
        cache.report(&[ApiTransaction::new("1", "t1")]).unwrap();

        assert!(matches!(
            cache.get_transaction_for("1", ""),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            cache.get_transaction_for("", "t1"),
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_sub_millisecond_ttl_rejected() {
        let result = ResponseCache::new(CacheSettings {
            authorize_ttl: Duration::from_micros(500),
            ..CacheSettings::default()
        });
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));

        let cache = cache_with(100, 60_000);
        assert!(matches!(
            cache.set_authorize_expiration_interval(Duration::from_micros(900)),
            Err(CacheError::InvalidConfig(_))
        ));
        assert_eq!(
            cache.authorize_expiration_interval(),
            Duration::from_millis(60_000)
        );

        cache.add_authorized_response("X", decision("Basic")).unwrap();
        assert!(cache.get_authorize_for("X").unwrap().is_some());
    }

    #[test]
    fn test_purge_expired() {
        let cache = cache_with(100, 100);
        cache.add_authorized_response("old", decision("x")).unwrap();
        sleep(Duration::from_millis(150));
        cache
            .set_authorize_expiration_interval(Duration::from_secs(60))
            .unwrap();
        cache.add_authorized_response("fresh", decision("y")).unwrap();

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.stats().unwrap().authorize_entries, 1);
        assert!(cache.get_authorize_for("fresh").unwrap().is_some());
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let cache = cache_with(100, 60_000);
        cache.add_authorized_response("X", decision("Basic")).unwrap();

        cache.close();
        cache.close();

        assert!(cache.is_closed());
        assert_eq!(cache.get_authorize_for("X"), Err(CacheError::Closed));
        assert_eq!(
            cache.add_authorized_response("X", decision("Basic")),
            Err(CacheError::Closed)
        );
        assert_eq!(cache.get_transaction_for("1", "t1"), Err(CacheError::Closed));
        assert_eq!(
            cache.report(&[ApiTransaction::new("1", "t1")]),
            Err(CacheError::Closed)
        );
        assert_eq!(
            cache.set_authorize_expiration_interval(Duration::from_secs(1)),
            Err(CacheError::Closed)
        );
        assert_eq!(
            cache.set_report_expiration_interval(Duration::from_secs(1)),
            Err(CacheError::Closed)
        );
        assert_eq!(cache.purge_expired(), Err(CacheError::Closed));
        assert_eq!(cache.stats(), Err(CacheError::Closed));
    }

    #[test]
    fn test_close_races_with_operations() {
        let cache = Arc::new(cache_with(10, 60_000));
        let workers: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("{}-{}", t, i);
                        match cache.add_authorized_response(&key, decision("x")) {
                            Ok(()) | Err(CacheError::Closed) => {}
                            Err(other) => panic!("unexpected error: {}", other),
                        }
                        match cache.get_authorize_for(&key) {
                            Ok(_) | Err(CacheError::Closed) => {}
                            Err(other) => panic!("unexpected error: {}", other),
                        }
                    }
                })
            })
            .collect();

        sleep(Duration::from_millis(5));
        cache.close();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(cache.is_closed());
        assert_eq!(cache.get_authorize_for("0-0"), Err(CacheError::Closed));
    }

    #[test]
    fn test_report_ttl_setting_is_kept() {
        let cache = cache_with(100, 60_000);
        cache
            .set_report_expiration_interval(Duration::from_millis(50))
            .unwrap();
        assert_eq!(cache.report_expiration_interval(), Duration::from_millis(50));

        cache.report(&[ApiTransaction::new("1", "t1")]).unwrap();
        sleep(Duration::from_millis(100));
        assert!(cache.get_transaction_for("1", "t1").unwrap().is_some());

        assert!(matches!(
            cache.set_report_expiration_interval(Duration::ZERO),
            Err(CacheError::InvalidConfig(_))
        ));
    }
}
