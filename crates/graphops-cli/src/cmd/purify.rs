//! `graphops purify` — drop redundant edges.
//!
//! Classic mode runs the transitive-reduction-like rewrite directly and
//! needs an acyclic graph unless `--mark-cycles` collects and tags the
//! cycle edges. `--scc` purifies the component quotient instead, which
//! tolerates cycles by construction.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use graphops_analysis::{purify, purify_scc};

use crate::cmd::{load_graph, save_graph};
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops purify`.
#[derive(Args, Debug)]
pub struct PurifyArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output (default: `<input>.pure.graph.json`, or
    /// `<input>.sccpure.graph.json` with `--scc`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Purify the SCC quotient: intra-component edges all survive.
    #[arg(long)]
    scc: bool,

    /// In classic mode, collect cycle edges instead of failing; they come
    /// back tagged `cyclelink` and colored for DOT output.
    #[arg(long, conflicts_with = "scc")]
    mark_cycles: bool,
}

#[derive(Debug, Serialize)]
struct PurifyOutput {
    removed_edges: usize,
    cycle_edges: Vec<(String, String)>,
    output: String,
}

/// Execute `graphops purify`.
pub fn run(args: &PurifyArgs, mode: OutputMode) -> Result<()> {
    let mut graph = load_graph(&args.input)?;

    let report = if args.scc {
        purify_scc(&mut graph)?
    } else {
        purify(&mut graph, args.mark_cycles)?
    };

    let suffix = if args.scc {
        ".sccpure.graph.json"
    } else {
        ".pure.graph.json"
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, suffix));
    save_graph(&graph, &output)?;

    let payload = PurifyOutput {
        removed_edges: report.removed_edges,
        cycle_edges: report.cycle_edges,
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &PurifyOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Removed {} redundant edges", payload.removed_edges)?;
    if !payload.cycle_edges.is_empty() {
        writeln!(w, "Tagged {} cycle edges:", payload.cycle_edges.len())?;
        for (source, target) in &payload.cycle_edges {
            writeln!(w, "  {source} -> {target}")?;
        }
    }
    writeln!(w, "Wrote {}", payload.output)?;
    Ok(())
}
