//! `graphops tags` — list the tags used in a graph.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cmd::load_graph;
use crate::output::{render, OutputMode};

/// Arguments for `graphops tags`.
#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Input graph (`*.graph.json`).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,
}

#[derive(Debug, Serialize)]
struct TagCount {
    /// Tag key; empty string for unkeyed tags.
    key: String,
    tag: String,
    nodes: usize,
}

#[derive(Debug, Serialize)]
struct TagsOutput {
    tags: Vec<TagCount>,
}

/// Execute `graphops tags`.
pub fn run(args: &TagsArgs, mode: OutputMode) -> Result<()> {
    let graph = load_graph(&args.input)?;

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for node in graph.nodes() {
        let metadata = node.metadata();
        for key in metadata.tag_keys() {
            let Some(tags) = metadata.try_tags(key) else {
                continue;
            };
            for tag in tags.iter() {
                *counts
                    .entry((key.to_lowercase(), tag.to_lowercase()))
                    .or_insert(0) += 1;
            }
        }
    }

    let payload = TagsOutput {
        tags: counts
            .into_iter()
            .map(|((key, tag), nodes)| TagCount { key, tag, nodes })
            .collect(),
    };

    render(mode, &payload, render_human)
}

fn render_human(payload: &TagsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.tags.is_empty() {
        writeln!(w, "No tags found.")?;
        return Ok(());
    }
    writeln!(w, "Tags ({})", payload.tags.len())?;
    for entry in &payload.tags {
        if entry.key.is_empty() {
            writeln!(w, "  {} ({} nodes)", entry.tag, entry.nodes)?;
        } else {
            writeln!(w, "  {}:{} ({} nodes)", entry.key, entry.tag, entry.nodes)?;
        }
    }
    Ok(())
}
