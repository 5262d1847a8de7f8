//! Subcommand implementations.

pub mod csv;
pub mod cycles;
pub mod dot;
pub mod filter;
pub mod prune;
pub mod purify;
pub mod scc;
pub mod stats;
pub mod supergraph;
pub mod tags;

use std::path::Path;

use anyhow::{Context, Result};

use graphops_core::{serialize, Graph};

/// Load a graph snapshot, wrapping failures with the file name.
pub(crate) fn load_graph(path: &Path) -> Result<Graph> {
    serialize::load(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Save a graph snapshot, wrapping failures with the file name.
pub(crate) fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    serialize::save(graph, path).with_context(|| format!("failed to write {}", path.display()))
}
