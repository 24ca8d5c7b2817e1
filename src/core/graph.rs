//! Host dependency-graph interface boundary.
//!
//! The graph proper (topological execution, rule lookup) is the host's
//! business; this module carries only what parameter tasks consume: a node
//! table with file/directory/param kinds, ordered prerequisite lists, the
//! graph-wide force-rebuild flag, and the [`Stamp`] timestamp used for
//! "is any prerequisite newer" comparisons.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{GraphError, Result};

/// A node's effective timestamp.
///
/// `Late` is the sentinel for "never built": it orders after every concrete
/// time, so a node without an on-disk artifact is always considered newer
/// than its dependents and always older-than-required itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    At(SystemTime),
    Late,
}

impl Stamp {
    /// The stamp of an on-disk path: its mtime, or `Late` when absent.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(mtime) => Stamp::At(mtime),
            Err(_) => Stamp::Late,
        }
    }
}

impl Ord for Stamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        match (self, other) {
            (Stamp::Late, Stamp::Late) => Ordering::Equal,
            (Stamp::Late, Stamp::At(_)) => Ordering::Greater,
            (Stamp::At(_), Stamp::Late) => Ordering::Less,
            (Stamp::At(a), Stamp::At(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Stamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// What a graph node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An existing file; never built by this crate.
    File(PathBuf),
    /// A directory created (with parents) on demand.
    Directory(PathBuf),
    /// A parameter task; behavior lives in the registry.
    Param,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    prereqs: Vec<String>,
}

/// Node table and prerequisite lists for one graph instance.
///
/// Prerequisites are ordered and may repeat; removal drops every occurrence.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
    /// Graph-wide "force full rebuild" override.
    pub force_rebuild: bool,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn define(&mut self, name: &str, kind: NodeKind) {
        self.nodes.entry(name.to_string()).or_insert(Node {
            kind,
            prereqs: Vec::new(),
        });
    }

    /// Define a file node. Keeps an existing node untouched.
    pub fn define_file(&mut self, name: &str, path: PathBuf) {
        self.define(name, NodeKind::File(path));
    }

    /// Define a directory node. Keeps an existing node untouched.
    pub fn define_directory(&mut self, name: &str, path: PathBuf) {
        self.define(name, NodeKind::Directory(path));
    }

    /// Define a parameter node. Keeps an existing node untouched.
    pub fn define_param(&mut self, name: &str) {
        self.define(name, NodeKind::Param);
    }

    /// Whether a node exists.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// The kind of a node.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` if the node doesn't exist.
    pub fn kind(&self, name: &str) -> Result<&NodeKind> {
        Ok(&self.node(name)?.kind)
    }

    /// The ordered prerequisite list of a node.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` if the node doesn't exist.
    pub fn prereqs(&self, name: &str) -> Result<&[String]> {
        Ok(&self.node(name)?.prereqs)
    }

    /// Append a prerequisite.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` if the node doesn't exist.
    pub fn add_prereq(&mut self, name: &str, prereq: &str) -> Result<()> {
        self.node_mut(name)?.prereqs.push(prereq.to_string());
        Ok(())
    }

    /// Remove every occurrence of a prerequisite.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` if the node doesn't exist.
    pub fn remove_prereq(&mut self, name: &str, prereq: &str) -> Result<()> {
        self.node_mut(name)?.prereqs.retain(|p| p != prereq);
        Ok(())
    }

    fn node(&self, name: &str) -> Result<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()).into())
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()).into())
    }
}
