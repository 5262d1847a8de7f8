#![forbid(unsafe_code)]
//! graphops-analysis: the algorithms over `graphops-core` graphs.
//!
//! - [`analyzer`] — adjacency snapshots, reach/domain closures, counts.
//! - [`scc`] — Tarjan components in forward topological order and the
//!   component quotient graph.
//! - [`classify`] — node classifiers and the supergraph quotient.
//! - [`purify`] / [`prune`] / [`filter`] — graph rewrites.
//! - [`dot`] — scoped GraphViz emission.
//!
//! # Conventions
//!
//! - **Errors**: `graphops_core::GraphError` results propagate with `?`.
//! - **Logging**: `tracing` macros; no subscriber is installed here.

pub mod analyzer;
pub mod classify;
pub mod dot;
pub mod filter;
pub mod prune;
pub mod purify;
pub mod scc;

pub use analyzer::{calculate_power_map, CycleEdges, GraphAnalyzer};
pub use classify::{super_graph, MapClassifier, NodeClassifier, PropertyClassifier};
pub use dot::{graph_to_dot, write_graph, DotOptions, DotWriter};
pub use filter::{filter_by_tags, FilterMode};
pub use purify::{purify, purify_scc, PurifyReport};
pub use scc::{Component, SccAnalysis, DEFAULT_PREFIX};
