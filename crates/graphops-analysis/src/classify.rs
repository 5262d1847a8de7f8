//! Node classification and the supergraph quotient.
//!
//! A classifier is a single capability: map a node to an optional class
//! name (`None` skips the node). [`super_graph`] then folds a graph along
//! any classification: one node per class, one edge per pair of classes
//! that any original cross-class edge connects.

use tracing::instrument;

use graphops_core::error::{GraphError, Result};
use graphops_core::keys::{KeyMap, KeySetMap};
use graphops_core::{Graph, Metadata, Node};

/// Tag key used by [`super_graph`] to record member nodes.
const NODE_TAG_KEY: &str = "node";

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

/// Maps a node to the class it belongs to, or `None` to skip it.
pub trait NodeClassifier {
    fn classify(&self, node: &Node) -> Option<String>;

    /// Group a whole graph: class → node keys, preserving the graph's
    /// iteration order within each class.
    fn classify_all(&self, graph: &Graph) -> KeyMap<Vec<String>> {
        graph.classify_nodes(|node| self.classify(node))
    }
}

/// Classifies by the value of a metadata property; nodes where the property
/// is missing or empty are skipped.
#[derive(Debug, Clone)]
pub struct PropertyClassifier {
    property: String,
}

impl PropertyClassifier {
    #[must_use]
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

impl NodeClassifier for PropertyClassifier {
    fn classify(&self, node: &Node) -> Option<String> {
        node.metadata()
            .property(&self.property)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Classifies through an explicit node-key → class mapping.
#[derive(Debug, Clone, Default)]
pub struct MapClassifier {
    classes: KeyMap<String>,
}

impl MapClassifier {
    /// Build from direct key → class assignments.
    #[must_use]
    pub fn from_assignments(classes: KeyMap<String>) -> Self {
        Self { classes }
    }

    /// Build from a class → members mapping. Fails when a node is claimed
    /// by two different classes; listing a node twice under one class is
    /// fine.
    pub fn from_groups(groups: &KeySetMap) -> Result<Self> {
        let mut classes: KeyMap<String> = KeyMap::new();
        for (class, members) in groups.iter() {
            for member in members.iter() {
                if let Some(existing) = classes.get(member) {
                    if existing.to_lowercase() != class.to_lowercase() {
                        return Err(GraphError::ConflictingClassification {
                            key: member.to_string(),
                            existing: existing.clone(),
                            incoming: class.to_string(),
                        });
                    }
                } else {
                    classes.insert(member, class.to_string());
                }
            }
        }
        Ok(Self { classes })
    }
}

impl NodeClassifier for MapClassifier {
    fn classify(&self, node: &Node) -> Option<String> {
        self.classes.get(node.key()).cloned()
    }
}

// ---------------------------------------------------------------------------
// SuperGraph
// ---------------------------------------------------------------------------

/// Build the quotient graph of `graph` under `classifier`.
///
/// Each class becomes one node carrying a `sublabel` property with its
/// member count (and, with `add_nodes`, a `node` keyed tag per member).
/// Each original edge whose endpoints are classified into two different
/// classes contributes a super-edge; duplicates and class-level self-edges
/// are dropped, as are edges to unclassified targets.
#[instrument(skip_all)]
pub fn super_graph(
    graph: &Graph,
    classifier: &dyn NodeClassifier,
    add_nodes: bool,
) -> Result<Graph> {
    let adjacency = graph.edges_snapshot();
    let classification = classifier.classify_all(graph);

    let mut class_of: KeyMap<String> = KeyMap::new();
    for (class, members) in classification.iter() {
        for member in members {
            class_of.insert(member.as_str(), class.to_string());
        }
    }

    let mut quotient = Graph::new();
    for (class, members) in classification.iter() {
        let mut metadata = Metadata::new();
        let sublabel = format!("({} nodes)", members.len());
        metadata.set_property("sublabel", Some(&sublabel));
        if add_nodes {
            let tag_set = metadata.tags_mut(NODE_TAG_KEY);
            for member in members {
                tag_set.insert(member.as_str());
            }
        }
        quotient.add_node(class, Some(metadata))?;
    }

    for (class, members) in classification.iter() {
        for member in members {
            let Some(targets) = adjacency.get(member) else {
                continue;
            };
            for target in targets.iter() {
                let Some(target_class) = class_of.get(target) else {
                    continue;
                };
                if target_class.to_lowercase() == class.to_lowercase() {
                    continue;
                }
                if quotient.edge(class, target_class).is_none() {
                    quotient.connect(class, target_class, None)?;
                }
            }
        }
    }
    Ok(quotient)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
