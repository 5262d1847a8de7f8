//! `graphops dot` — GraphViz emission.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use graphops_analysis::{write_graph, DotOptions};

use crate::cmd::load_graph;
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops dot`.
#[derive(Args, Debug)]
pub struct DotArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output (default: `<input>.dot`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Graph ID written into the DOT header.
    #[arg(long)]
    id: Option<String>,

    /// Left-to-right layout (`rankdir=LR`).
    #[arg(long)]
    horizontal: bool,

    /// Emit an undirected graph (`--` edges).
    #[arg(long)]
    undirected: bool,

    /// Group nodes into clusters by this property's value.
    #[arg(long)]
    cluster_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct DotOutput {
    nodes: usize,
    edges: usize,
    output: String,
}

/// Execute `graphops dot`.
pub fn run(args: &DotArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;

    let options = DotOptions {
        id: args.id.clone(),
        directed: !args.undirected,
        horizontal: args.horizontal,
        cluster_by: args.cluster_by.clone(),
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, ".dot"));
    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = write_graph(&graph, &options, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", output.display()))?;
    writer.flush()?;

    let payload = DotOutput {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &DotOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "Wrote {} ({} nodes, {} edges)",
        payload.output, payload.nodes, payload.edges
    )
}
