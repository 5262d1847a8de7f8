//! JSON persistence for graphs.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "nodes": {
//!     "<nodeKey>": {
//!       "<prop>": "<value>",
//!       "tags": ["<tag>"],
//!       "keytags": { "<key>": "<tag>" },
//!       "targets": { "<targetKey>": { "<edgeProp>": "<value>" } }
//!     }
//!   },
//!   "<graphProp>": "<value>",
//!   "tags": [],
//!   "keytags": {}
//! }
//! ```
//!
//! Output is deterministic: nodes in ascending case-insensitive key order,
//! per-node targets likewise, and the file ends with a single trailing
//! newline. Metadata follows the best-effort rules of
//! [`Metadata::fill_from_object`]; structural damage (non-object JSON, an
//! edge referencing a missing node) fails the whole load with
//! [`GraphError::MalformedInput`] and retains no partial state.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{GraphError, Result};
use crate::graph::{Graph, GraphBuilder};
use crate::metadata::Metadata;

/// Field names never treated as graph properties.
const GRAPH_RESERVED: &[&str] = &["nodes"];
/// Field names never treated as node properties.
const NODE_RESERVED: &[&str] = &["key", "targets"];

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Project metadata into a JSON object, dropping properties that would
/// collide with reserved field names.
fn metadata_object(metadata: &Metadata, reserved: &[&str]) -> Map<String, Value> {
    let mut object = Map::new();
    metadata.add_to_object(&mut object);
    object.retain(|field, _| !reserved.iter().any(|r| r.eq_ignore_ascii_case(field)));
    object
}

/// Encode a graph as a JSON value.
#[must_use]
pub fn to_value(graph: &Graph) -> Value {
    let mut nodes = Map::new();
    for node in graph.nodes() {
        let mut node_object = metadata_object(node.metadata(), NODE_RESERVED);
        if !node.targets().is_empty() {
            let mut targets = Map::new();
            for target in node.targets().iter() {
                let edge_object = graph
                    .edge(node.key(), target)
                    .map(|edge| metadata_object(edge.metadata(), &[]))
                    .unwrap_or_default();
                targets.insert(target.to_string(), Value::Object(edge_object));
            }
            node_object.insert("targets".to_string(), Value::Object(targets));
        }
        nodes.insert(node.key().to_string(), Value::Object(node_object));
    }

    let mut root = Map::new();
    root.insert("nodes".to_string(), Value::Object(nodes));
    for (field, value) in metadata_object(graph.metadata(), GRAPH_RESERVED) {
        root.insert(field, value);
    }
    Value::Object(root)
}

/// Render a graph as pretty-printed JSON with the trailing newline.
pub fn to_string_pretty(graph: &Graph) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&to_value(graph))?;
    out.push('\n');
    Ok(out)
}

/// Write a graph to `writer` as pretty-printed JSON plus trailing newline.
pub fn write_to(graph: &Graph, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &to_value(graph))?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Save a graph to `path`, creating or truncating the file.
#[instrument(skip(graph), fields(path = %path.display()))]
pub fn save(graph: &Graph, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_to(graph, &mut writer)?;
    writer.flush()?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph saved"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn malformed(reason: impl Into<String>) -> GraphError {
    GraphError::MalformedInput {
        reason: reason.into(),
    }
}

/// Decode a graph from a JSON value.
///
/// # Errors
///
/// [`GraphError::MalformedInput`] when the value is not an object, a node or
/// `targets` entry is not an object, an edge references a node that does not
/// exist, or duplicate (case-insensitive) keys collide.
pub fn from_value(value: &Value) -> Result<Graph> {
    let Some(root) = value.as_object() else {
        return Err(malformed("graph JSON is not an object"));
    };

    let mut graph = Graph::new();
    graph.metadata_mut().fill_from_object(root, GRAPH_RESERVED);

    let empty = Map::new();
    let nodes = match root.get("nodes") {
        None => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return Err(malformed("`nodes` is not an object")),
    };

    // First every node, then every edge, so targets can point anywhere in
    // the file regardless of declaration order.
    for (key, node_value) in nodes {
        let Some(node_object) = node_value.as_object() else {
            return Err(malformed(format!("node `{key}` is not an object")));
        };
        let mut metadata = Metadata::new();
        metadata.fill_from_object(node_object, NODE_RESERVED);
        graph
            .add_node(key, Some(metadata))
            .map_err(|e| malformed(e.to_string()))?;
    }

    for (key, node_value) in nodes {
        let Some(node_object) = node_value.as_object() else {
            continue;
        };
        let targets = match node_object.get("targets") {
            None => continue,
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(malformed(format!("targets of node `{key}` is not an object")));
            }
        };
        for (target, edge_value) in targets {
            if !graph.has_node(target) {
                return Err(malformed(format!(
                    "edge `{key}` -> `{target}` references a missing node"
                )));
            }
            let mut metadata = Metadata::new();
            if let Some(edge_object) = edge_value.as_object() {
                metadata.fill_from_object(edge_object, &[]);
            }
            graph
                .connect(key, target, Some(metadata))
                .map_err(|e| malformed(e.to_string()))?;
        }
    }

    Ok(graph)
}

/// Parse a graph from JSON text.
pub fn from_str(text: &str) -> Result<Graph> {
    let value: Value = serde_json::from_str(text)?;
    from_value(&value)
}

/// Load a graph from a JSON file.
#[instrument(fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Graph> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value: Value = serde_json::from_reader(reader)?;
    let graph = from_value(&value)?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

// ---------------------------------------------------------------------------
// JsonGraphBuilder
// ---------------------------------------------------------------------------

/// A [`GraphBuilder`] that merges a JSON snapshot into the target graph.
///
/// Nodes already present absorb the file's metadata; edges merge through
/// [`Graph::connect_or_merge`]. On an empty graph this is equivalent to
/// [`load`].
#[derive(Debug, Clone)]
pub struct JsonGraphBuilder {
    path: PathBuf,
}

impl JsonGraphBuilder {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GraphBuilder for JsonGraphBuilder {
    fn build(&mut self, graph: &mut Graph) -> Result<()> {
        let loaded = load(&self.path)?;
        for node in loaded.nodes() {
            if graph.has_node(node.key()) {
                if let Some(existing) = graph.node_mut(node.key()) {
                    existing.metadata_mut().import(node.metadata(), true, true);
                }
            } else {
                graph.add_node(node.key(), Some(node.metadata().clone()))?;
            }
        }
        for edge in loaded.edges() {
            graph.connect_or_merge(edge.source(), edge.target(), Some(edge.metadata().clone()))?;
        }
        graph.metadata_mut().import(loaded.metadata(), true, true);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node("A", None).expect("add A");
        graph.add_node("B", None).expect("add B");
        graph.add_node("C", None).expect("add C");
        graph.connect("A", "B", None).expect("A->B");
        graph.connect("A", "C", None).expect("A->C");
        graph.connect("B", "C", None).expect("B->C");

        let md = graph.node_mut("A").unwrap().metadata_mut();
        md.set_property("module", Some("m1"));
        md.tags_mut("").insert("seed");
        graph
    }

    #[test]
    fn serializes_targets_in_sorted_order() {
        let graph = sample_graph();
        let value = to_value(&graph);

        let targets = value["nodes"]["A"]["targets"]
            .as_object()
            .expect("targets object");
        let keys: Vec<&String> = targets.keys().collect();
        assert_eq!(keys, vec!["B", "C"]);

        let node_keys: Vec<&String> = value["nodes"].as_object().unwrap().keys().collect();
        assert_eq!(node_keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn round_trip_preserves_the_graph() {
        let graph = sample_graph();
        let text = to_string_pretty(&graph).expect("serialize");
        let back = from_str(&text).expect("deserialize");
        assert_eq!(graph, back);
    }

    #[test]
    fn output_ends_with_single_newline() {
        let text = to_string_pretty(&sample_graph()).expect("serialize");
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn node_order_is_case_insensitive() {
        let mut graph = Graph::new();
        graph.add_node("beta", None).expect("add");
        graph.add_node("Alpha", None).expect("add");
        graph.add_node("GAMMA", None).expect("add");

        let value = to_value(&graph);
        let keys: Vec<&String> = value["nodes"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Alpha", "beta", "GAMMA"]);
    }

    #[test]
    fn graph_metadata_lands_at_top_level() {
        let mut graph = Graph::new();
        graph.metadata_mut().set_property("title", Some("deps"));
        graph.metadata_mut().tags_mut("").insert("snapshot");

        let value = to_value(&graph);
        assert_eq!(value["title"], json!("deps"));
        assert_eq!(value["tags"], json!(["snapshot"]));
    }

    #[test]
    fn unknown_top_level_fields_become_properties() {
        let graph = from_value(&json!({
            "nodes": {},
            "generator": "probe-1.2",
            "count": 3,
        }))
        .expect("load");
        assert_eq!(graph.metadata().property("generator"), Some("probe-1.2"));
        assert_eq!(graph.metadata().property("count"), None);
        assert_eq!(graph.metadata().property("nodes"), None);
    }

    #[test]
    fn single_element_keyed_tag_collapses_to_string() {
        let mut graph = Graph::new();
        graph.add_node("n", None).expect("add");
        let md = graph.node_mut("n").unwrap().metadata_mut();
        md.tags_mut("color").insert("red");
        md.tags_mut("refs").insert("a");
        md.tags_mut("refs").insert("b");

        let value = to_value(&graph);
        assert_eq!(value["nodes"]["n"]["keytags"]["color"], json!("red"));
        assert_eq!(value["nodes"]["n"]["keytags"]["refs"], json!(["a", "b"]));

        let back = from_value(&value).expect("load");
        assert_eq!(graph, back);
    }

    #[test]
    fn edge_metadata_round_trips() {
        let mut graph = Graph::new();
        graph.add_node("a", None).expect("add");
        graph.add_node("b", None).expect("add");
        graph.connect("a", "b", None).expect("connect");
        let edge_md = graph.connect_or_merge("a", "b", None).expect("edge");
        edge_md.metadata_mut().set_property("color", Some("red"));
        edge_md.metadata_mut().tags_mut("").insert("cyclelink");

        let value = to_value(&graph);
        assert_eq!(value["nodes"]["a"]["targets"]["b"]["color"], json!("red"));

        let back = from_value(&value).expect("load");
        assert_eq!(graph, back);
    }

    #[test]
    fn non_object_root_is_malformed() {
        let err = from_value(&json!([1, 2, 3])).expect_err("array");
        assert!(matches!(err, GraphError::MalformedInput { .. }));
        let err = from_str("42").expect_err("scalar");
        assert!(matches!(err, GraphError::MalformedInput { .. }));
    }

    #[test]
    fn edge_to_missing_node_is_malformed() {
        let err = from_value(&json!({
            "nodes": { "a": { "targets": { "ghost": {} } } }
        }))
        .expect_err("dangling edge");
        assert!(matches!(err, GraphError::MalformedInput { .. }));
    }

    #[test]
    fn duplicate_case_insensitive_node_keys_are_malformed() {
        let err = from_value(&json!({
            "nodes": { "a": {}, "A": {} }
        }))
        .expect_err("duplicate");
        assert!(matches!(err, GraphError::MalformedInput { .. }));
    }

    #[test]
    fn missing_nodes_field_yields_empty_graph() {
        let graph = from_value(&json!({ "title": "empty" })).expect("load");
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.metadata().property("title"), Some("empty"));
    }

    #[test]
    fn reserved_node_fields_are_not_properties() {
        let graph = from_value(&json!({
            "nodes": {
                "a": { "key": "spoof", "targets": {}, "real": "yes" }
            }
        }))
        .expect("load");
        let node = graph.node("a").expect("node");
        assert_eq!(node.metadata().property("key"), None);
        assert_eq!(node.metadata().property("targets"), None);
        assert_eq!(node.metadata().property("real"), Some("yes"));
    }

    #[test]
    fn json_builder_merges_into_existing_graph() {
        let dir = std::env::temp_dir().join("graphops-core-builder-test");
        std::fs::create_dir_all(&dir).expect("tempdir");
        let path = dir.join("merge.graph.json");

        let mut on_disk = Graph::new();
        on_disk.add_node("a", None).expect("add");
        on_disk.add_node("b", None).expect("add");
        on_disk.connect("a", "b", None).expect("connect");
        save(&on_disk, &path).expect("save");

        let mut graph = Graph::new();
        graph.add_node("a", None).expect("add");
        graph
            .node_mut("a")
            .unwrap()
            .metadata_mut()
            .set_property("local", Some("1"));

        let mut builder = JsonGraphBuilder::new(&path);
        graph.populate(&mut builder).expect("populate");

        assert_eq!(graph.node_count(), 2);
        assert!(graph.edge("a", "b").is_some());
        assert_eq!(
            graph.node("a").unwrap().metadata().property("local"),
            Some("1")
        );

        std::fs::remove_file(&path).ok();
    }
}
