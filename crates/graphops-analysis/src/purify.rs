//! Edge purification: the transitive-reduction-like rewrite.
//!
//! # Overview
//!
//! An edge (s, t) is redundant when t is already reachable from s through
//! some other direct target of s. Classic purification computes the reach
//! map and keeps, per source, only the targets that survive
//! `not_in_self_projection`; on a DAG this is exactly the transitive
//! reduction.
//!
//! Cyclic graphs have two ways through:
//!
//! - **Classic with cycle marking**: the reach closure records and cuts
//!   cycle-closing edges, purification runs on the remaining acyclic
//!   subgraph, and the cut edges are re-added afterwards tagged `cyclelink`
//!   with a `color` property for visualization.
//! - **SCC mode**: purify the component quotient (a DAG, so the reduction
//!   is exact), keep every intra-component edge, and keep an
//!   inter-component edge only when its quotient edge survived.

use tracing::{debug, instrument};

use graphops_core::error::Result;
use graphops_core::keys::{KeySet, KeySetMap, MapView};
use graphops_core::{Graph, UNKEYED};

use crate::analyzer::{CycleEdges, GraphAnalyzer};
use crate::scc::SccAnalysis;

/// Unkeyed tag put on re-added cycle edges.
pub const CYCLE_TAG: &str = "cyclelink";
/// Color given to re-added cycle edges.
const CYCLE_COLOR: &str = "red";

/// What a purification pass did.
#[derive(Debug, Clone, Default)]
pub struct PurifyReport {
    /// Edges removed from the graph.
    pub removed_edges: usize,
    /// Cycle edges that were cut, re-added, and tagged (classic mode with
    /// cycle marking only).
    pub cycle_edges: Vec<(String, String)>,
}

/// Classic purification.
///
/// Without `mark_cycles` a cyclic graph fails with
/// [`graphops_core::GraphError::CycleDetected`]; with it, cycle edges are
/// collected, the reduction runs on the acyclic remainder, and the cycle
/// edges come back tagged.
#[instrument(skip(graph))]
pub fn purify(graph: &mut Graph, mark_cycles: bool) -> Result<PurifyReport> {
    let before = graph.edge_count();
    let mut analyzer = GraphAnalyzer::new(graph);
    let targets = analyzer.target_edges_map().clone();

    let mut cycles = CycleEdges::new();
    let reach = if mark_cycles {
        analyzer.reach_map(Some(&mut cycles))?
    } else {
        analyzer.reach_map(None)?
    };

    let purified = MapView::new(reach).not_in_self_projection_map(&targets);
    graph.disconnect_targets_except_map(&purified, true);

    let cycle_edges = cycles.into_vec();
    for (source, target) in &cycle_edges {
        let edge = graph.connect_or_merge(source, target, None)?;
        let metadata = edge.metadata_mut();
        metadata.tags_mut(UNKEYED).insert(CYCLE_TAG);
        metadata.set_property("color", Some(CYCLE_COLOR));
    }

    let report = PurifyReport {
        removed_edges: before - graph.edge_count(),
        cycle_edges,
    };
    debug!(removed = report.removed_edges, cycles = report.cycle_edges.len(), "purified");
    Ok(report)
}

/// SCC-mode purification.
///
/// All intra-component edges survive; an inter-component edge survives only
/// when the corresponding edge of the purified quotient DAG does.
#[instrument(skip(graph))]
pub fn purify_scc(graph: &mut Graph) -> Result<PurifyReport> {
    let before = graph.edge_count();
    let analyzer = GraphAnalyzer::new(graph);
    let scc = SccAnalysis::compute(&analyzer);

    // The quotient has no cycles, so its purification is exact.
    let mut quotient = scc.component_graph(graph)?;
    purify(&mut quotient, false)?;

    let mut keep = KeySetMap::new();
    for node in graph.nodes() {
        let Some(from) = scc.component_for_node(node.key()) else {
            continue;
        };
        let keep_set = keep.entry_or_insert_with(node.key(), KeySet::new);
        for target in node.targets().iter() {
            let Some(to) = scc.component_for_node(target) else {
                continue;
            };
            let survives =
                from.index == to.index || quotient.edge(&from.name, &to.name).is_some();
            if survives {
                keep_set.insert(target);
            }
        }
    }
    graph.disconnect_targets_except_map(&keep, true);

    let report = PurifyReport {
        removed_edges: before - graph.edge_count(),
        cycle_edges: Vec::new(),
    };
    debug!(removed = report.removed_edges, "scc-purified");
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
