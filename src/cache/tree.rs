//! Tree Store Module
//!
//! Hierarchical key-value store: nodes addressed by [`NodePath`], each
//! holding named fields. Nodes under a configured [`EvictionRegion`] are
//! bounded by that region's LRU policy.
//!
//! Locking: the node map sits behind an `RwLock` and every node behind
//! its own `Mutex`. Field reads and writes on an existing node take the
//! map read lock plus the node lock, so different paths proceed in
//! parallel while writes to one path serialize. Creating or removing
//! nodes takes the map write lock briefly. Region trackers are always
//! locked before the node map.

use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::cache::{EvictionRegion, LruTracker, NodePath, RegionConfig};
use crate::error::{CacheError, Result};
use crate::models::{ApiTransaction, AuthorizeResponse};

// == Field Value ==
/// A value stored under a node field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Authorization(AuthorizeResponse),
    Transaction(ApiTransaction),
    /// Absolute Unix timestamp in milliseconds
    Timestamp(u64),
}

/// Field map of one node.
pub type Fields = HashMap<String, FieldValue>;

#[derive(Debug, Default)]
struct Node {
    fields: Fields,
    children: HashSet<String>,
}

type NodeMap = HashMap<NodePath, Mutex<Node>>;

// == Tree Store ==
#[derive(Debug)]
pub struct TreeStore {
    nodes: RwLock<NodeMap>,
    regions: Vec<EvictionRegion>,
}

impl TreeStore {
    // == Constructor ==
    /// Creates an empty store with the given eviction regions.
    ///
    /// Regions may not nest or share a root.
    pub fn new(regions: Vec<RegionConfig>) -> Result<Self> {
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.root == b.root
                    || a.root.is_ancestor_of(&b.root)
                    || b.root.is_ancestor_of(&a.root)
                {
                    return Err(CacheError::InvalidConfig(format!(
                        "eviction regions {} and {} overlap",
                        a.root, b.root
                    )));
                }
            }
        }

        Ok(Self {
            nodes: RwLock::new(HashMap::new()),
            regions: regions.into_iter().map(EvictionRegion::new).collect(),
        })
    }

    // == Get ==
    /// Returns a copy of `field` under `path`, `None` on a miss.
    pub fn get(&self, path: &NodePath, field: &str) -> Option<FieldValue> {
        self.read_node(path, |fields| fields.get(field).cloned())
            .flatten()
    }

    /// Runs `f` over the fields of `path` while holding the node lock.
    pub fn read_node<R>(&self, path: &NodePath, f: impl FnOnce(&Fields) -> R) -> Option<R> {
        let nodes = self.nodes.read();
        let node = nodes.get(path)?;
        let guard = node.lock();
        let result = f(&guard.fields);
        Some(result)
    }

    // == Put ==
    /// Sets one field, creating the node and its ancestors as needed.
    ///
    /// Returns the paths evicted to keep the owning region in bounds.
    pub fn put(&self, path: &NodePath, field: impl Into<String>, value: FieldValue) -> Vec<NodePath> {
        self.put_fields(path, vec![(field.into(), value)])
    }

    /// Sets several fields under a single node lock.
    ///
    /// Inside a region the write, the recency update and any evictions
    /// happen under the region lock, so the bound holds when this returns.
    pub fn put_fields(&self, path: &NodePath, fields: Vec<(String, FieldValue)>) -> Vec<NodePath> {
        let Some(region) = self.region_for(path) else {
            self.write_fields(path, fields);
            return Vec::new();
        };

        let mut tracker = region.tracker.lock();
        self.write_fields(path, fields);
        tracker.touch(path.clone());

        let mut evicted = Vec::new();
        while tracker.len() > region.max_nodes() {
            let Some(oldest) = tracker.evict_oldest() else {
                break;
            };
            let removed = detach(&mut self.nodes.write(), &oldest);
            for removed_path in &removed {
                tracker.remove(removed_path);
            }
            evicted.extend(removed);
        }
        evicted
    }

    // == Touch ==
    /// Refreshes recency of a governed path. No-op outside regions or
    /// when the node is no longer tracked.
    pub fn touch(&self, path: &NodePath) -> bool {
        match self.region_for(path) {
            Some(region) => region.promote(path),
            None => false,
        }
    }

    // == Remove ==
    /// Detaches a node and all its descendants.
    ///
    /// Returns every removed path; empty if the node did not exist.
    pub fn remove_node(&self, path: &NodePath) -> Vec<NodePath> {
        self.remove_node_if(path, |_| true)
    }

    /// Detaches a node only if `pred` holds for its fields at removal time.
    pub fn remove_node_if(&self, path: &NodePath, pred: impl FnOnce(&Fields) -> bool) -> Vec<NodePath> {
        let mut trackers = self.lock_affected_regions(path);
        let mut nodes = self.nodes.write();

        let matches = match nodes.get_mut(path) {
            Some(node) => pred(&node.get_mut().fields),
            None => false,
        };
        if !matches {
            return Vec::new();
        }

        let removed = detach(&mut nodes, path);
        for (region, tracker) in trackers.iter_mut() {
            for removed_path in &removed {
                if region.governs(removed_path) {
                    tracker.remove(removed_path);
                }
            }
        }
        removed
    }

    // == Introspection ==
    /// Paths strictly below `prefix`.
    pub fn paths_under(&self, prefix: &NodePath) -> Vec<NodePath> {
        self.nodes
            .read()
            .keys()
            .filter(|path| prefix.is_ancestor_of(path))
            .cloned()
            .collect()
    }

    pub fn count_nodes_under(&self, prefix: &NodePath) -> usize {
        self.nodes
            .read()
            .keys()
            .filter(|path| prefix.is_ancestor_of(path))
            .count()
    }

    /// Total fields held by nodes strictly below `prefix`.
    pub fn count_fields_under(&self, prefix: &NodePath) -> usize {
        self.nodes
            .read()
            .iter()
            .filter(|(path, _)| prefix.is_ancestor_of(path))
            .map(|(_, node)| node.lock().fields.len())
            .sum()
    }

    /// Number of nodes, the root included once created.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Region rooted exactly at `root`.
    pub fn region(&self, root: &NodePath) -> Option<&EvictionRegion> {
        self.regions.iter().find(|region| region.root() == root)
    }

    // == Clear ==
    /// Releases every node and forgets all recency state. Idempotent.
    pub fn clear(&self) {
        let mut trackers: Vec<_> = self.regions.iter().map(|r| r.tracker.lock()).collect();
        self.nodes.write().clear();
        for tracker in trackers.iter_mut() {
            tracker.clear();
        }
    }

    fn region_for(&self, path: &NodePath) -> Option<&EvictionRegion> {
        self.regions.iter().find(|region| region.governs(path))
    }

    /// Locks, in configuration order, every region a removal of `path`
    /// can touch: the one governing it and any it contains.
    fn lock_affected_regions(
        &self,
        path: &NodePath,
    ) -> Vec<(&EvictionRegion, MutexGuard<'_, LruTracker<NodePath>>)> {
        self.regions
            .iter()
            .filter(|region| {
                region.governs(path) || region.root() == path || path.is_ancestor_of(region.root())
            })
            .map(|region| (region, region.tracker.lock()))
            .collect()
    }

    fn write_fields(&self, path: &NodePath, fields: Vec<(String, FieldValue)>) {
        {
            let nodes = self.nodes.read();
            if let Some(node) = nodes.get(path) {
                node.lock().fields.extend(fields);
                return;
            }
        }

        let mut nodes = self.nodes.write();
        ensure_path(&mut nodes, path);
        if let Some(node) = nodes.get_mut(path) {
            node.get_mut().fields.extend(fields);
        }
    }
}

/// Creates `path` and any missing ancestors, linking each to its parent.
fn ensure_path(nodes: &mut NodeMap, path: &NodePath) {
    if nodes.contains_key(path) {
        return;
    }
    if let Some(parent) = path.parent() {
        ensure_path(nodes, &parent);
        if let (Some(parent_node), Some(name)) = (nodes.get_mut(&parent), path.last()) {
            parent_node.get_mut().children.insert(name.to_string());
        }
    }
    nodes.insert(path.clone(), Mutex::new(Node::default()));
}

/// Removes `path` and its subtree from the map.
fn detach(nodes: &mut NodeMap, path: &NodePath) -> Vec<NodePath> {
    let mut removed = Vec::new();
    let Some(node) = nodes.remove(path) else {
        return removed;
    };

    if let (Some(parent), Some(name)) = (path.parent(), path.last()) {
        if let Some(parent_node) = nodes.get_mut(&parent) {
            parent_node.get_mut().children.remove(name);
        }
    }

    let mut pending = vec![(path.clone(), node.into_inner())];
    while let Some((current, node)) = pending.pop() {
        for name in node.children {
            if let Ok(child) = current.child(&name) {
                if let Some(child_node) = nodes.remove(&child) {
                    pending.push((child, child_node.into_inner()));
                }
            }
        }
        removed.push(current);
    }
    removed
}
