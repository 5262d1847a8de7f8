//! `graphops scc` — strongly connected components and the quotient graph.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use graphops_analysis::{GraphAnalyzer, SccAnalysis};

use crate::cmd::{load_graph, save_graph};
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops scc`.
#[derive(Args, Debug)]
pub struct SccArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output for the component graph (default: `<input>.scc.graph.json`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Name components after their first node instead of `SCC-NNN`.
    #[arg(long)]
    name_by_node: bool,
}

#[derive(Debug, Serialize)]
struct ComponentOutput {
    index: usize,
    name: String,
    nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SccOutput {
    components: Vec<ComponentOutput>,
    cycles: usize,
    output: String,
}

/// Execute `graphops scc`.
pub fn run(args: &SccArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;
    let analyzer = GraphAnalyzer::new(&graph);
    let scc = if args.name_by_node {
        SccAnalysis::compute_named(&analyzer, None)
    } else {
        SccAnalysis::compute(&analyzer)
    };

    let quotient = scc.component_graph(&graph)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, ".scc.graph.json"));
    save_graph(&quotient, &output)?;

    let payload = SccOutput {
        components: scc
            .components()
            .iter()
            .map(|c| ComponentOutput {
                index: c.index,
                name: c.name.clone(),
                nodes: c.nodes.clone(),
            })
            .collect(),
        cycles: scc.cycles().count(),
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn render_human(payload: &SccOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{} components, {} cycles",
        payload.components.len(),
        payload.cycles
    )?;
    for component in &payload.components {
        if component.nodes.len() > 1 {
            writeln!(
                w,
                "  {} ({} nodes): {}",
                component.name,
                component.nodes.len(),
                component.nodes.join(", ")
            )?;
        } else {
            writeln!(w, "  {}: {}", component.name, component.nodes.join(", "))?;
        }
    }
    writeln!(w, "Wrote {}", payload.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_human_shows_components_and_output() {
        let payload = SccOutput {
            components: vec![
                ComponentOutput {
                    index: 0,
                    name: "SCC-000".into(),
                    nodes: vec!["a".into(), "b".into()],
                },
                ComponentOutput {
                    index: 1,
                    name: "SCC-001".into(),
                    nodes: vec!["c".into()],
                },
            ],
            cycles: 1,
            output: "deps.scc.graph.json".into(),
        };
        let mut out = Vec::new();
        render_human(&payload, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("2 components, 1 cycles"));
        assert!(text.contains("SCC-000 (2 nodes): a, b"));
        assert!(text.contains("SCC-001: c"));
        assert!(text.contains("Wrote deps.scc.graph.json"));
    }
}
