//! `graphops filter` — keep or drop nodes by tag.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use graphops_analysis::{filter_by_tags, FilterMode};
use graphops_core::keys::KeySet;

use crate::cmd::{load_graph, save_graph};
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops filter`.
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output (default: `<input>.filtered.graph.json`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Tags to match (any of them).
    #[arg(required = true)]
    tags: Vec<String>,

    /// Tag key to match under; the default matches unkeyed tags.
    #[arg(long, default_value = "")]
    tag_key: String,

    /// Drop matching nodes instead of keeping them.
    #[arg(long)]
    exclude: bool,
}

#[derive(Debug, Serialize)]
struct FilterOutput {
    removed_nodes: usize,
    remaining_nodes: usize,
    output: String,
}

/// Execute `graphops filter`.
pub fn run(args: &FilterArgs, mode: OutputMode) -> Result<()> {
    let mut graph = load_graph(&args.input)?;

    let tags: KeySet = args.tags.iter().collect();
    let filter_mode = if args.exclude {
        FilterMode::Exclude
    } else {
        FilterMode::Include
    };
    let removed = filter_by_tags(&mut graph, &tags, &args.tag_key, filter_mode);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, ".filtered.graph.json"));
    save_graph(&graph, &output)?;

    let payload = FilterOutput {
        removed_nodes: removed,
        remaining_nodes: graph.node_count(),
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &FilterOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "Removed {} nodes, {} remain",
        payload.removed_nodes, payload.remaining_nodes
    )?;
    writeln!(w, "Wrote {}", payload.output)?;
    Ok(())
}
