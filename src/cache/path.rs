//! Node Path Module
//!
//! Slash-delimited addresses for nodes in the tree store.

use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, Result};

// == Node Path ==
/// Normalized hierarchical path, e.g. `/authorize/my-app-key`.
///
/// Empty segments are dropped on parse, so `"authorize/x/"` and
/// `"//authorize//x"` address the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The root node `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a path string, ignoring empty segments.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns the path of a direct child.
    ///
    /// The segment must be non-empty and must not contain `/`, otherwise
    /// a caller-supplied key could address a node outside its branch.
    pub fn child(&self, segment: &str) -> Result<Self> {
        if segment.is_empty() {
            return Err(CacheError::InvalidKey(format!(
                "empty segment under {}",
                self
            )));
        }
        if segment.contains('/') {
            return Err(CacheError::InvalidKey(format!(
                "segment '{}' contains '/'",
                segment
            )));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Returns the parent path, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment, `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::parse(s))
    }
}
