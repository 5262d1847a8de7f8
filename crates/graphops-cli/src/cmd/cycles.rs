//! `graphops cycles` — report dependency cycles.
//!
//! A cycle is a strongly connected component with more than one node, or a
//! single node with a self-edge.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use graphops_analysis::{GraphAnalyzer, SccAnalysis};

use crate::cmd::load_graph;
use crate::output::{render, OutputMode};

/// Arguments for `graphops cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<Vec<String>>,
}

/// Execute `graphops cycles`.
pub fn run(args: &CyclesArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;
    let scc = SccAnalysis::compute(&GraphAnalyzer::new(&graph));

    let cycles: Vec<Vec<String>> = scc
        .components()
        .iter()
        .filter(|component| {
            component.is_cycle()
                || component
                    .nodes
                    .first()
                    .is_some_and(|key| graph.edge(key, key).is_some())
        })
        .map(|component| component.nodes.clone())
        .collect();

    render(mode, &CyclesOutput { cycles }, render_human)
}

fn render_human(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No dependency cycles found.")?;
        return Ok(());
    }
    writeln!(w, "Dependency cycles ({})", payload.cycles.len())?;
    for (index, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "\nCycle {}:", index + 1)?;
        for key in cycle {
            writeln!(w, "  - {key}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_human_no_cycles() {
        let payload = CyclesOutput { cycles: Vec::new() };
        let mut out = Vec::new();
        render_human(&payload, &mut out).expect("render");
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("No dependency cycles found."));
    }

    #[test]
    fn render_human_lists_members() {
        let payload = CyclesOutput {
            cycles: vec![vec!["a".to_string(), "b".to_string()]],
        };
        let mut out = Vec::new();
        render_human(&payload, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Cycle 1:"));
        assert!(text.contains("  - a"));
        assert!(text.contains("  - b"));
    }
}
