//! Injection seam for graph population.
//!
//! The probing front-ends that discover assemblies and read their metadata
//! live outside this crate; they plug in here. The core only ever sees a
//! builder filling a [`Graph`] it already owns, so the same pipeline runs
//! on probed graphs, deserialized snapshots, and hand-built test fixtures.

use crate::error::Result;
use crate::graph::Graph;

/// A single-capability contract: fill a graph with nodes and edges.
pub trait GraphBuilder {
    /// Add this builder's nodes and edges to `graph`.
    ///
    /// Builders may be called on a non-empty graph; additions merge with
    /// what is already there, and the usual mutation invariants apply.
    fn build(&mut self, graph: &mut Graph) -> Result<()>;
}

/// Closures are builders, which keeps test fixtures and one-off fills terse.
impl<F> GraphBuilder for F
where
    F: FnMut(&mut Graph) -> Result<()>,
{
    fn build(&mut self, graph: &mut Graph) -> Result<()> {
        self(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_builders() {
        let mut graph = Graph::new();
        let mut builder = |g: &mut Graph| -> Result<()> {
            g.add_node("only", None)?;
            Ok(())
        };
        graph.populate(&mut builder).expect("populate");
        assert!(graph.has_node("only"));
    }
}
