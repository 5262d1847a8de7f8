//! Error types shared by the graph model and the analyses.

use crate::keys::KeySet;

/// Broad error category, for callers that branch on kind rather than
/// matching individual variants (exit codes, JSON error payloads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A mutation would break a graph invariant; the graph is unchanged.
    InvariantViolation,
    /// A closure ran into a cycle and no cycle sink was provided.
    CycleDetected,
    /// Structurally damaged input; the load fails cleanly.
    MalformedInput,
    /// A lookup that is documented to fail did.
    NotFound,
    /// File read/write failure, surfaced unchanged.
    Io,
}

impl ErrorKind {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvariantViolation => "invariant_violation",
            Self::CycleDetected => "cycle_detected",
            Self::MalformedInput => "malformed_input",
            Self::NotFound => "not_found",
            Self::Io => "io_error",
        }
    }
}

/// Errors produced by graph mutations, closures, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node `{key}` already exists")]
    DuplicateNode { key: String },

    #[error("edge `{edge_source}` -> `{target}` already exists")]
    DuplicateEdge { edge_source: String, target: String },

    #[error("node `{key}` not found")]
    MissingNode { key: String },

    #[error("cycle detected through: {}", chain.join(" -> "))]
    CycleDetected {
        /// The guard chain at the moment the cycle closed, ending with the
        /// node that was revisited.
        chain: Vec<String>,
    },

    #[error("node `{key}` classified as both `{existing}` and `{incoming}`")]
    ConflictingClassification {
        key: String,
        existing: String,
        incoming: String,
    },

    #[error("malformed graph input: {reason}")]
    MalformedInput { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Build the cycle error from the in-progress guard chain plus the node
    /// that closed the cycle.
    #[must_use]
    pub fn cycle(guard_chain: &[String], closing: &str) -> Self {
        let mut chain = guard_chain.to_vec();
        chain.push(closing.to_string());
        Self::CycleDetected { chain }
    }

    /// The category this error falls into.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateNode { .. }
            | Self::DuplicateEdge { .. }
            | Self::ConflictingClassification { .. } => ErrorKind::InvariantViolation,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::MalformedInput { .. } | Self::Json(_) => ErrorKind::MalformedInput,
            Self::MissingNode { .. } => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Convenience constructor for a missing-node failure.
    #[must_use]
    pub fn missing_node(key: &str) -> Self {
        Self::MissingNode {
            key: key.to_string(),
        }
    }

    /// The nodes named by a [`GraphError::CycleDetected`], for callers that
    /// want to report the offending component.
    #[must_use]
    pub fn cycle_nodes(&self) -> Option<KeySet> {
        match self {
            Self::CycleDetected { chain } => Some(chain.iter().collect()),
            _ => None,
        }
    }
}

/// Result alias used across the workspace's library crates.
pub type Result<T> = std::result::Result<T, GraphError>;
