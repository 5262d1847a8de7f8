//! The attributed directed multigraph.
//!
//! # Overview
//!
//! A [`Graph`] owns a node table and an edge table; nodes carry their
//! adjacency as plain key sets, and edges are keyed by (source, target).
//! This arena-and-index shape keeps both sides of every edge in one place,
//! so the node/edge cross-references that the wire format exposes can never
//! dangle: every mutation updates the node table, the edge table, and both
//! endpoints' adjacency together.
//!
//! # Invariants
//!
//! - Node keys are unique case-insensitively.
//! - For every edge (s, t): s's `targets` contains t, t's `sources`
//!   contains s, and the edge table has exactly one entry under (s, t).
//! - At most one edge per ordered pair; self-edges are permitted (one).
//!
//! Mutators fail loudly on invariant violations (duplicate node, duplicate
//! edge, missing endpoint) and leave the graph unchanged. Removal
//! operations are lenient: absent nodes and edges are silently skipped.

mod builder;

pub use builder::GraphBuilder;

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::keys::{Key, KeyMap, KeySet, KeySetMap};
use crate::metadata::Metadata;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Structural role of a node, derived from its adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// No incoming edges, at least one outgoing.
    Seed,
    /// At least one incoming edge, none outgoing.
    Sink,
    /// No edges at all.
    Loose,
    /// Both incoming and outgoing edges.
    Other,
}

impl NodeKind {
    /// Lowercase name used in CSV output and property values.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Sink => "sink",
            Self::Loose => "loose",
            Self::Other => "other",
        }
    }
}

/// A graph node: a stable key, metadata, and adjacency in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    key: Key,
    metadata: Metadata,
    sources: KeySet,
    targets: KeySet,
}

impl Node {
    fn new(key: &str, metadata: Metadata) -> Self {
        Self {
            key: Key::new(key),
            metadata,
            sources: KeySet::new(),
            targets: KeySet::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Keys of nodes with an edge into this one.
    #[must_use]
    pub fn sources(&self) -> &KeySet {
        &self.sources
    }

    /// Keys of nodes this one has an edge to.
    #[must_use]
    pub fn targets(&self) -> &KeySet {
        &self.targets
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match (self.sources.is_empty(), self.targets.is_empty()) {
            (true, false) => NodeKind::Seed,
            (false, true) => NodeKind::Sink,
            (true, true) => NodeKind::Loose,
            (false, false) => NodeKind::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// A directed edge. Endpoint keys use the spelling stored in the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: String,
    target: String,
    metadata: Metadata,
}

impl Edge {
    fn new(source: String, target: String, metadata: Metadata) -> Self {
        Self {
            source,
            target,
            metadata,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// An attributed directed graph with case-insensitive node keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    metadata: Metadata,
    nodes: KeyMap<Node>,
    edges: KeyMap<KeyMap<Edge>>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    // ── node access ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(KeyMap::len).sum()
    }

    #[must_use]
    pub fn has_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    #[must_use]
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Nodes in ascending case-insensitive key order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node keys (stored spelling) in ascending case-insensitive order.
    pub fn node_keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys()
    }

    /// All node keys as a set.
    #[must_use]
    pub fn key_set(&self) -> KeySet {
        self.nodes.key_set()
    }

    /// The spelling under which a key is stored, if the node exists.
    fn canonical(&self, key: &str) -> Option<String> {
        self.nodes.get(key).map(|n| n.key().to_string())
    }

    // ── node mutation ───────────────────────────────────────────────────────

    /// Add a node. Fails when a node with that key (any spelling) exists.
    pub fn add_node(&mut self, key: &str, metadata: Option<Metadata>) -> Result<&mut Node> {
        if self.nodes.contains_key(key) {
            return Err(GraphError::DuplicateNode {
                key: key.to_string(),
            });
        }
        Ok(self
            .nodes
            .entry_or_insert_with(key, || Node::new(key, metadata.unwrap_or_default())))
    }

    /// Remove a single node and its incident edges. Returns `false` when the
    /// node was not present.
    pub fn remove_node(&mut self, key: &str) -> bool {
        let existed = self.has_node(key);
        if existed {
            let mut single = KeySet::new();
            single.insert(key);
            self.remove_nodes(&single);
        }
        existed
    }

    /// Drop every listed node, then scrub dangling references from the
    /// remaining nodes in one pass. The scrub never touches the removed
    /// side; those nodes no longer exist.
    pub fn remove_nodes(&mut self, keys: &KeySet) {
        let mut removed = KeySet::new();
        for key in keys.iter() {
            if self.nodes.remove(key).is_some() {
                removed.insert(key);
            }
        }
        if removed.is_empty() {
            return;
        }
        debug!(count = removed.len(), "removed nodes, scrubbing edges");

        for key in removed.iter() {
            self.edges.remove(key);
        }
        for (_, node) in self.nodes.iter_mut() {
            node.sources.retain(|s| !removed.contains(s));
            node.targets.retain(|t| !removed.contains(t));
        }
        self.edges.retain(|_, inner| {
            inner.retain(|target, _| !removed.contains(target));
            !inner.is_empty()
        });
    }

    /// Remove every node whose key is not in `keep`.
    pub fn remove_other_nodes(&mut self, keep: &KeySet) {
        let doomed = self.key_set().difference(keep);
        self.remove_nodes(&doomed);
    }

    // ── edges ───────────────────────────────────────────────────────────────

    /// Create an edge. Fails when either endpoint is missing or the edge
    /// already exists.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        metadata: Option<Metadata>,
    ) -> Result<&mut Edge> {
        let source_key = self
            .canonical(source)
            .ok_or_else(|| GraphError::missing_node(source))?;
        let target_key = self
            .canonical(target)
            .ok_or_else(|| GraphError::missing_node(target))?;
        if self.edge(source, target).is_some() {
            return Err(GraphError::DuplicateEdge {
                edge_source: source_key,
                target: target_key,
            });
        }

        if let Some(node) = self.nodes.get_mut(source) {
            node.targets.insert(target_key.as_str());
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.sources.insert(source_key.as_str());
        }

        let inner = self
            .edges
            .entry_or_insert_with(source_key.as_str(), KeyMap::new);
        Ok(inner.entry_or_insert_with(target_key.as_str(), || {
            Edge::new(source_key.clone(), target_key.clone(), metadata.unwrap_or_default())
        }))
    }

    /// Like [`Self::connect`], but an existing edge absorbs the metadata
    /// (properties overwritten, tag sets unioned) instead of failing.
    pub fn connect_or_merge(
        &mut self,
        source: &str,
        target: &str,
        metadata: Option<Metadata>,
    ) -> Result<&mut Edge> {
        if self.edge(source, target).is_some() {
            let Some(edge) = self
                .edges
                .get_mut(source)
                .and_then(|inner| inner.get_mut(target))
            else {
                return Err(GraphError::missing_node(source));
            };
            if let Some(incoming) = metadata {
                edge.metadata.import(&incoming, true, true);
            }
            Ok(edge)
        } else {
            self.connect(source, target, metadata)
        }
    }

    /// Lenient edge lookup; `None` when either endpoint or the edge is
    /// absent.
    #[must_use]
    pub fn edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges.get(source)?.get(target)
    }

    /// Edge lookup that fails when either endpoint is missing; `Ok(None)`
    /// means both nodes exist but are not connected.
    pub fn find_edge(&self, source: &str, target: &str) -> Result<Option<&Edge>> {
        if !self.has_node(source) {
            return Err(GraphError::missing_node(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::missing_node(target));
        }
        Ok(self.edge(source, target))
    }

    /// All edges, ordered by source key then target key.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().flat_map(KeyMap::values)
    }

    /// Remove one edge, updating both endpoints. `None` when absent (even
    /// when the endpoints themselves are absent).
    pub fn disconnect(&mut self, source: &str, target: &str) -> Option<Edge> {
        let removed = self.edges.get_mut(source)?.remove(target)?;
        if self.edges.get(source).is_some_and(KeyMap::is_empty) {
            self.edges.remove(source);
        }
        if let Some(node) = self.nodes.get_mut(source) {
            node.targets.remove(target);
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.sources.remove(source);
        }
        Some(removed)
    }

    /// Remove every edge into `target`. No-op on an absent node.
    pub fn disconnect_all_sources(&mut self, target: &str) -> Vec<Edge> {
        let sources: Vec<String> = self
            .node(target)
            .map(|n| n.sources.iter().map(str::to_string).collect())
            .unwrap_or_default();
        sources
            .iter()
            .filter_map(|source| self.disconnect(source, target))
            .collect()
    }

    /// Remove every edge out of `source`. No-op on an absent node.
    pub fn disconnect_all_targets(&mut self, source: &str) -> Vec<Edge> {
        let targets: Vec<String> = self
            .node(source)
            .map(|n| n.targets.iter().map(str::to_string).collect())
            .unwrap_or_default();
        targets
            .iter()
            .filter_map(|target| self.disconnect(source, target))
            .collect()
    }

    /// Keep only the outgoing edges of `source` whose target is in `keep`;
    /// disconnect the rest, updating both sides.
    pub fn disconnect_targets_except(&mut self, source: &str, keep: &KeySet) -> Vec<Edge> {
        let doomed: Vec<String> = self
            .node(source)
            .map(|n| {
                n.targets
                    .iter()
                    .filter(|t| !keep.contains(t))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        doomed
            .iter()
            .filter_map(|target| self.disconnect(source, target))
            .collect()
    }

    /// Apply a keep-map: each source present in `keep` retains only the
    /// listed targets; sources absent from the map lose all targets when
    /// `disconnect_missing`, and are left untouched otherwise.
    pub fn disconnect_targets_except_map(&mut self, keep: &KeySetMap, disconnect_missing: bool) {
        let sources: Vec<String> = self.nodes.keys().map(str::to_string).collect();
        for source in sources {
            match keep.get(&source) {
                Some(keep_set) => {
                    self.disconnect_targets_except(&source, keep_set);
                }
                None if disconnect_missing => {
                    self.disconnect_all_targets(&source);
                }
                None => {}
            }
        }
    }

    // ── queries ─────────────────────────────────────────────────────────────

    /// Group nodes into classes. Nodes the projector maps to `None` are
    /// skipped; within a class, keys keep the graph's iteration order.
    pub fn classify_nodes(
        &self,
        mut projector: impl FnMut(&Node) -> Option<String>,
    ) -> KeyMap<Vec<String>> {
        let mut classes: KeyMap<Vec<String>> = KeyMap::new();
        for node in self.nodes.values() {
            if let Some(class) = projector(node) {
                classes
                    .entry_or_insert_with(class.as_str(), Vec::new)
                    .push(node.key().to_string());
            }
        }
        classes
    }

    /// An owned copy of the outgoing adjacency (source key → target keys).
    /// Independent of later mutation; every node appears, sinks with an
    /// empty set.
    #[must_use]
    pub fn edges_snapshot(&self) -> KeySetMap {
        let mut map = KeySetMap::new();
        for node in self.nodes.values() {
            map.insert(node.key(), node.targets.clone());
        }
        map
    }

    /// An owned copy of the incoming adjacency (target key → source keys).
    #[must_use]
    pub fn sources_snapshot(&self) -> KeySetMap {
        let mut map = KeySetMap::new();
        for node in self.nodes.values() {
            map.insert(node.key(), node.sources.clone());
        }
        map
    }

    /// Keys of nodes carrying `tag` under `tag_key`.
    #[must_use]
    pub fn find_tagged_nodes(&self, tag: &str, tag_key: &str) -> KeySet {
        let mut single = KeySet::new();
        single.insert(tag);
        self.find_tagged_nodes_any(&single, tag_key)
    }

    /// Keys of nodes carrying any of `tags` under `tag_key`.
    #[must_use]
    pub fn find_tagged_nodes_any(&self, tags: &KeySet, tag_key: &str) -> KeySet {
        self.nodes
            .values()
            .filter(|node| node.metadata.has_any_tag(tag_key, tags))
            .map(Node::key)
            .collect()
    }

    /// Fill this graph through an injected [`GraphBuilder`].
    pub fn populate(&mut self, builder: &mut dyn GraphBuilder) -> Result<()> {
        builder.build(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
