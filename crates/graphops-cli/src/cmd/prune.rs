//! `graphops prune` — remove specific edges or a node.
//!
//! `--source` and `--target` together name one edge; `--target` alone
//! drops every incoming edge, `--source` alone every outgoing one.
//! `--node` removes the node with all its edges. Absent keys are no-ops.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use graphops_analysis::prune::{prune_edge, prune_into, prune_node, prune_out_of};

use crate::cmd::{load_graph, save_graph};
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops prune`.
#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output (default: `<input>.pruned.graph.json`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Source of the edge(s) to remove.
    #[arg(long, conflicts_with = "node")]
    source: Option<String>,

    /// Target of the edge(s) to remove.
    #[arg(long, conflicts_with = "node")]
    target: Option<String>,

    /// Remove this node with all its edges.
    #[arg(long)]
    node: Option<String>,
}

#[derive(Debug, Serialize)]
struct PruneOutput {
    removed_edges: usize,
    removed_nodes: usize,
    output: String,
}

/// Execute `graphops prune`.
pub fn run(args: &PruneArgs, mode: OutputMode) -> Result<()> {
    let mut graph = load_graph(&args.input)?;

    let mut removed_edges = 0;
    let mut removed_nodes = 0;
    match (&args.node, &args.source, &args.target) {
        (Some(node), _, _) => {
            let before = graph.edge_count();
            if prune_node(&mut graph, node) {
                removed_nodes = 1;
            }
            removed_edges = before - graph.edge_count();
        }
        (None, Some(source), Some(target)) => {
            removed_edges = usize::from(prune_edge(&mut graph, source, target).is_some());
        }
        (None, Some(source), None) => {
            removed_edges = prune_out_of(&mut graph, source).len();
        }
        (None, None, Some(target)) => {
            removed_edges = prune_into(&mut graph, target).len();
        }
        (None, None, None) => {
            bail!("nothing to prune: pass --node, or --source and/or --target");
        }
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, ".pruned.graph.json"));
    save_graph(&graph, &output)?;

    let payload = PruneOutput {
        removed_edges,
        removed_nodes,
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &PruneOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "Removed {} edges, {} nodes",
        payload.removed_edges, payload.removed_nodes
    )?;
    writeln!(w, "Wrote {}", payload.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_human_reports_counts() {
        let payload = PruneOutput {
            removed_edges: 2,
            removed_nodes: 1,
            output: "deps.pruned.graph.json".into(),
        };
        let mut out = Vec::new();
        render_human(&payload, &mut out).expect("render");
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Removed 2 edges, 1 nodes"));
    }
}
