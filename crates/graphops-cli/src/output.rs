//! Shared output layer: human/JSON parity for every subcommand.
//!
//! Each command handler builds a `Serialize` payload and a human renderer;
//! [`render`] dispatches on the mode. Errors go to stderr in the same two
//! shapes, carrying the machine-readable category code when the failure
//! came out of the graph engine.

use std::io::{self, Write};

use serde::Serialize;

use graphops_core::GraphError;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON, one object per invocation.
    Json,
}

impl OutputMode {
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value to stdout in the requested format. In human
/// mode the provided closure formats the value.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// A structured error payload for JSON mode.
#[derive(Debug, Serialize)]
struct ErrorPayload<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'a str>,
}

/// Render a failure to stderr. Returns nothing: callers exit non-zero.
pub fn render_failure(mode: OutputMode, error: &anyhow::Error) {
    let error_code = error
        .downcast_ref::<GraphError>()
        .map(|graph_error| graph_error.kind().code());
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": ErrorPayload {
                    message: format!("{error:#}"),
                    error_code,
                }
            });
            if serde_json::to_writer_pretty(&mut out, &wrapper).is_ok() {
                let _ = writeln!(out);
            }
        }
        OutputMode::Human => {
            let _ = writeln!(out, "error: {error:#}");
        }
    }
}
