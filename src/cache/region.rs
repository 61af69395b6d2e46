//! Eviction Region Module
//!
//! A bounded subtree of the key space with LRU recency tracking.

use parking_lot::Mutex;

use crate::cache::{LruTracker, NodePath};
use crate::error::{CacheError, Result};

// == Region Config ==
/// Root of the governed subtree and its node bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub root: NodePath,
    pub max_nodes: usize,
}

impl RegionConfig {
    pub fn new(root: NodePath, max_nodes: usize) -> Result<Self> {
        if max_nodes == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "eviction region {} needs max_nodes > 0",
                root
            )));
        }
        Ok(Self { root, max_nodes })
    }
}

// == Eviction Region ==
/// Live region state: config plus the recency list of governed nodes.
///
/// The tracker mutex also serializes structural writes inside the
/// region, which is what makes insert-then-evict atomic.
#[derive(Debug)]
pub struct EvictionRegion {
    config: RegionConfig,
    pub(crate) tracker: Mutex<LruTracker<NodePath>>,
}

impl EvictionRegion {
    pub fn new(config: RegionConfig) -> Self {
        Self {
            config,
            tracker: Mutex::new(LruTracker::new()),
        }
    }

    pub fn root(&self) -> &NodePath {
        &self.config.root
    }

    pub fn max_nodes(&self) -> usize {
        self.config.max_nodes
    }

    /// True if `path` lies strictly inside the region.
    pub fn governs(&self, path: &NodePath) -> bool {
        self.config.root.is_ancestor_of(path)
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.tracker.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.lock().is_empty()
    }

    /// Refreshes recency of a still-tracked node.
    pub fn promote(&self, path: &NodePath) -> bool {
        self.tracker.lock().promote(path)
    }
}
