//! Snapshot-based graph analysis: reach and domain closures.
//!
//! # Overview
//!
//! A [`GraphAnalyzer`] copies the adjacency of a live graph into owned key
//! sets at construction time. Analyses then run against the snapshot, so
//! the graph can be mutated or dropped without invalidating an analyzer,
//! and an analyzer can never mutate the graph it came from.
//!
//! The closure computation is a DFS with an in-progress guard. On meeting a
//! guarded node the traversal has found a cycle: with a [`CycleEdges`] sink
//! the offending edge is recorded and cut (the closure is then exact for
//! the remaining acyclic subgraph); without one the closure fails with
//! [`GraphError::CycleDetected`] naming the guard chain.

use tracing::{debug, instrument};

use graphops_core::error::{GraphError, Result};
use graphops_core::keys::{KeySet, KeySetMap, MapView};
use graphops_core::Graph;

// ---------------------------------------------------------------------------
// CycleEdges
// ---------------------------------------------------------------------------

/// Collected cycle-closing edges, in discovery order.
///
/// The traversal visits roots and neighbors in ascending case-insensitive
/// key order, so the recorded edge per cycle is the back edge that order
/// discovers first.
#[derive(Debug, Clone, Default)]
pub struct CycleEdges {
    edges: Vec<(String, String)>,
}

impl CycleEdges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, source: &str, target: &str) {
        self.edges.push((source.to_string(), target.to_string()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<(String, String)> {
        self.edges
    }
}

// ---------------------------------------------------------------------------
// Power map computation
// ---------------------------------------------------------------------------

struct Closure<'a> {
    edges: &'a KeySetMap,
    power: KeySetMap,
    guard: KeySet,
    guard_chain: Vec<String>,
}

impl Closure<'_> {
    /// Depth-first visit computing the set of nodes reachable from `node`
    /// (excluding itself). Recursion depth is bounded by the longest
    /// acyclic path.
    fn visit(&mut self, node: &str, cycles: &mut Option<&mut CycleEdges>) -> Result<()> {
        self.guard.insert(node);
        self.guard_chain.push(node.to_string());

        let mut set = KeySet::new();
        let edges = self.edges;
        if let Some(nexts) = edges.get(node) {
            for next in nexts.iter() {
                if self.guard.contains(next) {
                    // Cycle: either record the closing edge and cut it, or
                    // fail naming the chain that led here.
                    match cycles {
                        Some(sink) => {
                            sink.push(node, next);
                            continue;
                        }
                        None => return Err(GraphError::cycle(&self.guard_chain, next)),
                    }
                }
                set.insert(next);
                if !self.power.contains_key(next) {
                    self.visit(next, cycles)?;
                }
                if let Some(reach) = self.power.get(next) {
                    set.union_with(reach);
                }
            }
        }

        self.guard.remove(node);
        self.guard_chain.pop();
        self.power.insert(node, set);
        Ok(())
    }
}

/// Compute the power map of `edges` over `nodes`: each node mapped to the
/// set of nodes transitively reachable from it, excluding itself.
///
/// With a `cycles` sink, every cycle contributes at least one recorded edge
/// and the result is the exact closure of the graph minus the recorded
/// edges. Without one, any cycle fails the computation.
pub fn calculate_power_map(
    nodes: &KeySet,
    edges: &KeySetMap,
    mut cycles: Option<&mut CycleEdges>,
) -> Result<KeySetMap> {
    let mut closure = Closure {
        edges,
        power: KeySetMap::new(),
        guard: KeySet::new(),
        guard_chain: Vec::new(),
    };
    for node in nodes.iter() {
        if !closure.power.contains_key(node) {
            closure.visit(node, &mut cycles)?;
        }
    }
    Ok(closure.power)
}

// ---------------------------------------------------------------------------
// GraphAnalyzer
// ---------------------------------------------------------------------------

/// An adjacency snapshot with cached reach/domain closures.
///
/// Not shareable across threads while a closure is being computed on first
/// access; the engine is single-threaded by design.
#[derive(Debug, Clone)]
pub struct GraphAnalyzer {
    nodes: KeySet,
    /// target key → source keys
    source_edges: KeySetMap,
    /// source key → target keys
    target_edges: KeySetMap,
    seeds: KeySet,
    sinks: KeySet,
    reach: Option<KeySetMap>,
    domain: Option<KeySetMap>,
}

impl GraphAnalyzer {
    /// Snapshot `graph`. The analyzer holds copies only and is independent
    /// of the graph's lifetime and later mutation.
    #[must_use]
    pub fn new(graph: &Graph) -> Self {
        let target_edges = graph.edges_snapshot();
        let source_edges = graph.sources_snapshot();
        let nodes = graph.key_set();

        let empty_image =
            |map: &KeySetMap, key: &str| map.get(key).is_none_or(KeySet::is_empty);
        let seeds = nodes
            .iter()
            .filter(|n| empty_image(&source_edges, n))
            .collect();
        let sinks = nodes
            .iter()
            .filter(|n| empty_image(&target_edges, n))
            .collect();

        Self {
            nodes,
            source_edges,
            target_edges,
            seeds,
            sinks,
            reach: None,
            domain: None,
        }
    }

    // ── snapshot access ─────────────────────────────────────────────────────

    #[must_use]
    pub fn nodes(&self) -> &KeySet {
        &self.nodes
    }

    /// Nodes with no incoming edges.
    #[must_use]
    pub fn seeds(&self) -> &KeySet {
        &self.seeds
    }

    /// Nodes with no outgoing edges.
    #[must_use]
    pub fn sinks(&self) -> &KeySet {
        &self.sinks
    }

    #[must_use]
    pub fn target_edges_map(&self) -> &KeySetMap {
        &self.target_edges
    }

    #[must_use]
    pub fn source_edges_map(&self) -> &KeySetMap {
        &self.source_edges
    }

    #[must_use]
    pub fn target_edges(&self) -> MapView<'_> {
        MapView::new(&self.target_edges)
    }

    #[must_use]
    pub fn source_edges(&self) -> MapView<'_> {
        MapView::new(&self.source_edges)
    }

    // ── counts ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.target_edges.pair_count()
    }

    #[must_use]
    pub fn seed_count(&self) -> usize {
        self.seeds.len()
    }

    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    // ── closures ────────────────────────────────────────────────────────────

    /// Each node mapped to its descendants. Computed once and cached; the
    /// sink is only filled on the computing call.
    #[instrument(skip_all)]
    pub fn reach_map(&mut self, cycles: Option<&mut CycleEdges>) -> Result<&KeySetMap> {
        if self.reach.is_none() {
            let map = calculate_power_map(&self.nodes, &self.target_edges, cycles)?;
            debug!(nodes = map.len(), "reach map computed");
            self.reach = Some(map);
        }
        Ok(self.reach.get_or_insert_with(KeySetMap::new))
    }

    /// Each node mapped to its ancestors. Computed once and cached.
    #[instrument(skip_all)]
    pub fn domain_map(&mut self, cycles: Option<&mut CycleEdges>) -> Result<&KeySetMap> {
        if self.domain.is_none() {
            let map = calculate_power_map(&self.nodes, &self.source_edges, cycles)?;
            debug!(nodes = map.len(), "domain map computed");
            self.domain = Some(map);
        }
        Ok(self.domain.get_or_insert_with(KeySetMap::new))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
