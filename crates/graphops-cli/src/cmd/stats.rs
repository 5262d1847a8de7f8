//! `graphops stats` — analyzer counts for a graph.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use graphops_analysis::GraphAnalyzer;

use crate::cmd::load_graph;
use crate::output::{render, OutputMode};

/// Arguments for `graphops stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    nodes: usize,
    edges: usize,
    seeds: usize,
    sinks: usize,
}

/// Execute `graphops stats`.
pub fn run(args: &StatsArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;
    let analyzer = GraphAnalyzer::new(&graph);

    let payload = StatsOutput {
        nodes: analyzer.node_count(),
        edges: analyzer.edge_count(),
        seeds: analyzer.seed_count(),
        sinks: analyzer.sink_count(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &StatsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "nodes: {}", payload.nodes)?;
    writeln!(w, "edges: {}", payload.edges)?;
    writeln!(w, "seeds: {}", payload.seeds)?;
    writeln!(w, "sinks: {}", payload.sinks)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_human_prints_every_count() {
        let payload = StatsOutput {
            nodes: 4,
            edges: 3,
            seeds: 1,
            sinks: 2,
        };
        let mut out = Vec::new();
        render_human(&payload, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("nodes: 4"));
        assert!(text.contains("sinks: 2"));
    }
}
