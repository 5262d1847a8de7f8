//! Targeted removal of edges and nodes.
//!
//! Pruning is lenient by design: absent endpoints and already-missing
//! edges are no-ops, so the same prune can be applied to a family of
//! snapshots without caring which of them still carry the offending edge.

use tracing::debug;

use graphops_core::{Edge, Graph};

/// Remove one edge. Idempotent; `None` when the edge (or either endpoint)
/// is absent.
pub fn prune_edge(graph: &mut Graph, source: &str, target: &str) -> Option<Edge> {
    graph.disconnect(source, target)
}

/// Remove every edge into `target`. No-op on an absent node.
pub fn prune_into(graph: &mut Graph, target: &str) -> Vec<Edge> {
    let removed = graph.disconnect_all_sources(target);
    debug!(target, count = removed.len(), "pruned incoming edges");
    removed
}

/// Remove every edge out of `source`. No-op on an absent node.
pub fn prune_out_of(graph: &mut Graph, source: &str) -> Vec<Edge> {
    let removed = graph.disconnect_all_targets(source);
    debug!(source, count = removed.len(), "pruned outgoing edges");
    removed
}

/// Remove a node with all its edges. Returns `false` when it was absent.
pub fn prune_node(graph: &mut Graph, key: &str) -> bool {
    let removed = graph.remove_node(key);
    if removed {
        debug!(key, "pruned node");
    }
    removed
}
