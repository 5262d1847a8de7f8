#![forbid(unsafe_code)]
//! graphops-core: the attributed directed graph model.
//!
//! Case-insensitive key primitives ([`keys`]), the metadata bag
//! ([`metadata`]), the graph itself ([`graph`]), and JSON persistence
//! ([`serialize`]). Analyses live in the `graphops-analysis` crate.
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::GraphError`] results; helpers propagate with
//!   `?`, nothing is caught internally.
//! - **Logging**: `tracing` macros; no subscriber is installed here.

pub mod error;
pub mod graph;
pub mod keys;
pub mod metadata;
pub mod serialize;

pub use error::{ErrorKind, GraphError, Result};
pub use graph::{Edge, Graph, GraphBuilder, Node, NodeKind};
pub use keys::{Key, KeyMap, KeySet, KeySetMap, MapView};
pub use metadata::{Metadata, UNKEYED};
