//! Tag-based node filtering.

use tracing::{debug, instrument};

use graphops_core::keys::KeySet;
use graphops_core::Graph;

/// Whether matching nodes are the ones kept or the ones dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep matching nodes, drop everything else.
    Include,
    /// Drop matching nodes, keep everything else.
    Exclude,
}

/// Filter the graph by tags under `tag_key` (the empty key selects unkeyed
/// tags). Node removal scrubs dangling edges, so the result never carries
/// an edge to a dropped node. Returns the number of nodes removed.
#[instrument(skip(graph, tags))]
pub fn filter_by_tags(graph: &mut Graph, tags: &KeySet, tag_key: &str, mode: FilterMode) -> usize {
    let before = graph.node_count();
    let selected = graph.find_tagged_nodes_any(tags, tag_key);
    match mode {
        FilterMode::Include => graph.remove_other_nodes(&selected),
        FilterMode::Exclude => graph.remove_nodes(&selected),
    }
    let removed = before - graph.node_count();
    debug!(removed, ?mode, "filtered by tags");
    removed
}
