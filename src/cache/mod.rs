//! Cache Module
//!
//! Hierarchical node store with TTL expiration on authorization entries
//! and an LRU-bounded authorization region.

mod expiration;
mod lru;
mod path;
mod region;
mod response_cache;
mod stats;
mod tree;


// Re-export public types
pub use expiration::{current_timestamp_ms, ExpirationPolicy};
pub use lru::LruTracker;
pub use path::NodePath;
pub use region::{EvictionRegion, RegionConfig};
pub use response_cache::{ReportFailure, ReportOutcome, ResponseCache};
pub use stats::CacheStats;
pub use tree::{FieldValue, Fields, TreeStore};

// == Key Namespace ==
/// Branch holding authorization decisions, one node per app key.
pub const AUTHORIZE_PREFIX: &str = "/authorize";

/// Branch holding report transactions, one node per app id.
pub const RESPONSE_PREFIX: &str = "/response";

/// Field carrying the authorization decision.
pub const AUTH_RESPONSE_FIELD: &str = "auth_response";

/// Field carrying the absolute expiry in Unix milliseconds.
pub const EXPIRATION_FIELD: &str = "expiration";
