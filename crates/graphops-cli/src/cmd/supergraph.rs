//! `graphops supergraph` — fold the graph along a property classification.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use graphops_analysis::{super_graph, PropertyClassifier};

use crate::cmd::{load_graph, save_graph};
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops supergraph`.
#[derive(Args, Debug)]
pub struct SupergraphArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output (default: `<input>.super.graph.json`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Property whose value classifies each node; nodes without it are
    /// skipped.
    #[arg(long = "by")]
    by: String,

    /// Record member node keys as `node` keyed tags on each class.
    #[arg(long)]
    add_nodes: bool,
}

#[derive(Debug, Serialize)]
struct SupergraphOutput {
    classes: usize,
    edges: usize,
    output: String,
}

/// Execute `graphops supergraph`.
pub fn run(args: &SupergraphArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;

    let classifier = PropertyClassifier::new(args.by.as_str());
    let quotient = super_graph(&graph, &classifier, args.add_nodes)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, ".super.graph.json"));
    save_graph(&quotient, &output)?;

    let payload = SupergraphOutput {
        classes: quotient.node_count(),
        edges: quotient.edge_count(),
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &SupergraphOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{} classes, {} super-edges",
        payload.classes, payload.edges
    )?;
    writeln!(w, "Wrote {}", payload.output)?;
    Ok(())
}
