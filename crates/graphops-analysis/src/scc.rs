//! Strongly connected components via Tarjan's algorithm.
//!
//! # Overview
//!
//! The classic single-pass Tarjan: DFS-entry indices, lowlink tracking, an
//! explicit stack with an on-stack set, and a component emitted every time
//! a root (`lowlink == index`) returns. Tarjan emits components in reverse
//! topological order of the quotient DAG; the result list is reversed so
//! callers see forward topological order, where a component always precedes
//! the components it reaches.
//!
//! Roots and neighbors are visited in ascending case-insensitive key order,
//! so indices, component order, and names are deterministic for a given
//! graph.

use tracing::{debug, instrument};

use graphops_core::error::Result;
use graphops_core::keys::{KeyMap, KeySet, KeySetMap};
use graphops_core::{Graph, Metadata};

use crate::analyzer::GraphAnalyzer;

/// Default component name prefix.
pub const DEFAULT_PREFIX: &str = "SCC-";

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// One strongly connected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Zero-based position in forward topological order.
    pub index: usize,
    /// Assigned name (see [`SccAnalysis::compute_named`]).
    pub name: String,
    /// Member node keys, sorted case-insensitively.
    pub nodes: Vec<String>,
}

impl Component {
    /// `true` when the component is a dependency cycle (more than one node).
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        self.nodes.len() > 1
    }
}

// ---------------------------------------------------------------------------
// Tarjan state
// ---------------------------------------------------------------------------

struct Tarjan<'a> {
    edges: &'a KeySetMap,
    index: KeyMap<usize>,
    lowlink: KeyMap<usize>,
    stack: Vec<String>,
    on_stack: KeySet,
    next_index: usize,
    emitted: Vec<Vec<String>>,
}

impl Tarjan<'_> {
    fn strongconnect(&mut self, v: &str) {
        self.index.insert(v, self.next_index);
        self.lowlink.insert(v, self.next_index);
        self.next_index += 1;
        self.stack.push(v.to_string());
        self.on_stack.insert(v);

        let edges = self.edges;
        if let Some(neighbors) = edges.get(v) {
            for w in neighbors.iter() {
                if !self.index.contains_key(w) {
                    self.strongconnect(w);
                    let w_low = self.lowlink.get(w).copied().unwrap_or(0);
                    if let Some(v_low) = self.lowlink.get_mut(v) {
                        *v_low = (*v_low).min(w_low);
                    }
                } else if self.on_stack.contains(w) {
                    let w_index = self.index.get(w).copied().unwrap_or(0);
                    if let Some(v_low) = self.lowlink.get_mut(v) {
                        *v_low = (*v_low).min(w_index);
                    }
                }
            }
        }

        if self.lowlink.get(v) == self.index.get(v) {
            let fold = v.to_lowercase();
            let mut component = Vec::new();
            while let Some(top) = self.stack.pop() {
                self.on_stack.remove(&top);
                let is_root = top.to_lowercase() == fold;
                component.push(top);
                if is_root {
                    break;
                }
            }
            component.sort_by_key(|key| key.to_lowercase());
            self.emitted.push(component);
        }
    }
}

// ---------------------------------------------------------------------------
// SccAnalysis
// ---------------------------------------------------------------------------

/// The components of a snapshot, in forward topological order, with name
/// and per-node indexes.
#[derive(Debug, Clone)]
pub struct SccAnalysis {
    components: Vec<Component>,
    by_name: KeyMap<usize>,
    for_node: KeyMap<usize>,
}

impl SccAnalysis {
    /// Compute with the default `SCC-` prefix.
    #[must_use]
    pub fn compute(analyzer: &GraphAnalyzer) -> Self {
        Self::compute_named(analyzer, Some(DEFAULT_PREFIX))
    }

    /// Compute, naming components `prefix + zero-padded index` (width 3 up
    /// to 999 components, 4 up to 9999, 5 beyond). With no prefix, a
    /// component is named after its first node, suffixed `+N-1` when it has
    /// more than one.
    #[instrument(skip_all)]
    #[must_use]
    pub fn compute_named(analyzer: &GraphAnalyzer, prefix: Option<&str>) -> Self {
        let mut tarjan = Tarjan {
            edges: analyzer.target_edges_map(),
            index: KeyMap::new(),
            lowlink: KeyMap::new(),
            stack: Vec::new(),
            on_stack: KeySet::new(),
            next_index: 0,
            emitted: Vec::new(),
        };
        for node in analyzer.nodes().iter() {
            if !tarjan.index.contains_key(node) {
                tarjan.strongconnect(node);
            }
        }

        // Emission order is reverse topological; flip it.
        tarjan.emitted.reverse();
        let total = tarjan.emitted.len();
        debug!(components = total, "tarjan finished");

        let mut components = Vec::with_capacity(total);
        let mut by_name = KeyMap::new();
        let mut for_node = KeyMap::new();
        for (index, nodes) in tarjan.emitted.into_iter().enumerate() {
            let name = component_name(prefix, index, total, &nodes);
            by_name.insert(name.as_str(), index);
            for node in &nodes {
                for_node.insert(node.as_str(), index);
            }
            components.push(Component { index, name, nodes });
        }

        Self {
            components,
            by_name,
            for_node,
        }
    }

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.by_name.get(name).map(|&i| &self.components[i])
    }

    #[must_use]
    pub fn component_for_node(&self, key: &str) -> Option<&Component> {
        self.for_node.get(key).map(|&i| &self.components[i])
    }

    /// Components that are dependency cycles, in topological order.
    pub fn cycles(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.is_cycle())
    }

    /// Materialize the quotient DAG: one node per component (carrying an
    /// `sccindex` property and, for cycles, a `sublabel` with the member
    /// count), and one edge per pair of distinct components connected in
    /// `source`. Duplicate cross-component edges merge; component-level
    /// self-edges are suppressed; source nodes without a component are
    /// tolerated and their edges ignored.
    pub fn component_graph(&self, source: &Graph) -> Result<Graph> {
        let mut quotient = Graph::new();
        for component in &self.components {
            let mut metadata = Metadata::new();
            metadata.set_property("sccindex", Some(&component.index.to_string()));
            if component.is_cycle() {
                let sublabel = format!("({} nodes)", component.nodes.len());
                metadata.set_property("sublabel", Some(&sublabel));
            }
            quotient.add_node(&component.name, Some(metadata))?;
        }

        for node in source.nodes() {
            let Some(from) = self.component_for_node(node.key()) else {
                continue;
            };
            for target in node.targets().iter() {
                let Some(to) = self.component_for_node(target) else {
                    continue;
                };
                if from.index == to.index {
                    continue;
                }
                quotient.connect_or_merge(&from.name, &to.name, None)?;
            }
        }
        Ok(quotient)
    }
}

fn component_name(prefix: Option<&str>, index: usize, total: usize, nodes: &[String]) -> String {
    match prefix {
        Some(prefix) => {
            let width = if total <= 999 {
                3
            } else if total <= 9999 {
                4
            } else {
                5
            };
            format!("{prefix}{index:0width$}")
        }
        None => {
            let first = nodes.first().map(String::as_str).unwrap_or_default();
            if nodes.len() > 1 {
                format!("{first}+{}", nodes.len() - 1)
            } else {
                first.to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
