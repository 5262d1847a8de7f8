//! Filename conventions: `*.graph.json` inputs with derivable outputs.

use std::path::{Path, PathBuf};

/// The canonical graph snapshot extension.
pub const GRAPH_SUFFIX: &str = ".graph.json";

/// Derive an output path from an input path by swapping the `.graph.json`
/// suffix (or, failing that, the extension) for `suffix`.
///
/// `deps.graph.json` + `.pure.graph.json` → `deps.pure.graph.json`;
/// `deps.graph.json` + `.dot` → `deps.dot`.
#[must_use]
pub fn derive_output(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = if name.to_ascii_lowercase().ends_with(GRAPH_SUFFIX) {
        name[..name.len() - GRAPH_SUFFIX.len()].to_string()
    } else {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name)
    };
    input.with_file_name(format!("{stem}{suffix}"))
}
