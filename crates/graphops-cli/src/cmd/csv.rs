//! `graphops csv` — node listing as CSV.
//!
//! Columns: `node,kind,sources,targets,tags`, one row per node in key
//! order. The tags column joins the node's unkeyed tags with spaces.
//! Fields are RFC 4180 quoted when they need it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use graphops_core::{Graph, UNKEYED};

use crate::cmd::load_graph;
use crate::output::{render, OutputMode};
use crate::paths;

/// Arguments for `graphops csv`.
#[derive(Args, Debug)]
pub struct CsvArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output (default: `<input>.nodes.csv`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CsvOutput {
    rows: usize,
    output: String,
}

/// Execute `graphops csv`.
pub fn run(args: &CsvArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::derive_output(&args.input, ".nodes.csv"));
    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    write_csv(&graph, &mut writer)?;
    writer.flush()?;

    let payload = CsvOutput {
        rows: graph.node_count(),
        output: output.display().to_string(),
    };
    render(mode, &payload, render_human)
}

fn write_csv(graph: &Graph, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "node,kind,sources,targets,tags")?;
    for node in graph.nodes() {
        let tags = node
            .metadata()
            .try_tags(UNKEYED)
            .map(|set| set.iter().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        writeln!(
            w,
            "{},{},{},{},{}",
            csv_field(node.key()),
            node.kind().as_str(),
            node.sources().len(),
            node.targets().len(),
            csv_field(&tags)
        )?;
    }
    Ok(())
}

/// Quote a field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_human(payload: &CsvOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Wrote {} ({} rows)", payload.output, payload.rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn write_csv_emits_header_and_sorted_rows() {
        let mut graph = Graph::new();
        graph.add_node("b", None).expect("add");
        graph.add_node("A", None).expect("add");
        graph.connect("A", "b", None).expect("connect");
        graph
            .node_mut("A")
            .unwrap()
            .metadata_mut()
            .tags_mut(UNKEYED)
            .insert("seed");

        let mut out = Vec::new();
        write_csv(&graph, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "node,kind,sources,targets,tags",
                "A,seed,0,1,seed",
                "b,sink,1,0,",
            ]
        );
    }
}
