//! GraphViz DOT emission.
//!
//! # Overview
//!
//! [`DotWriter`] is a scoped writer: the caller pushes a scope for the
//! top-level graph, each subgraph, each node attribute block, and each edge
//! attribute block; [`DotWriter::end`] emits the matching terminator (`]`
//! or `}`) at the correct indent. Attribute values are quoted unless they
//! look HTML-like (`<…>`), which GraphViz requires to stay bare.
//!
//! [`write_graph`] sits on top and renders a whole [`Graph`]
//! deterministically: nodes in key order (optionally grouped into
//! `cluster` subgraphs by a property), then edges in (source, target)
//! order. A node's `sublabel` property becomes an extra italic,
//! left-aligned label line; `color` properties pass through on nodes and
//! edges.

use std::io::{self, Write};

use graphops_core::{Graph, Metadata};

// ---------------------------------------------------------------------------
// DotWriter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Graph,
    Subgraph,
    Block,
}

/// Scoped writer producing DOT syntax.
#[derive(Debug)]
pub struct DotWriter<W: Write> {
    out: W,
    scopes: Vec<Scope>,
    directed: bool,
}

impl<W: Write> DotWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            scopes: Vec::new(),
            directed: true,
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.scopes.len())
    }

    /// Open the top-level graph: `digraph` or `graph`, with an optional ID.
    pub fn begin_graph(&mut self, id: Option<&str>, directed: bool) -> io::Result<()> {
        self.directed = directed;
        let keyword = if directed { "digraph" } else { "graph" };
        match id {
            Some(id) => writeln!(self.out, "{keyword} {} {{", quote(id)),
            None => writeln!(self.out, "{keyword} {{"),
        }?;
        self.scopes.push(Scope::Graph);
        Ok(())
    }

    /// Open a subgraph. IDs starting with `cluster` get cluster semantics
    /// from GraphViz; `None` opens an anonymous subgraph (useful for
    /// same-rank groups).
    pub fn begin_subgraph(&mut self, id: Option<&str>) -> io::Result<()> {
        let indent = self.indent();
        match id {
            Some(id) => writeln!(self.out, "{indent}subgraph {} {{", quote(id)),
            None => writeln!(self.out, "{indent}{{"),
        }?;
        self.scopes.push(Scope::Subgraph);
        Ok(())
    }

    /// Open a node attribute block: `"id" [`.
    pub fn begin_node(&mut self, id: &str) -> io::Result<()> {
        let indent = self.indent();
        writeln!(self.out, "{indent}{} [", quote(id))?;
        self.scopes.push(Scope::Block);
        Ok(())
    }

    /// Open an edge attribute block: `"from" -> "to" [`.
    pub fn begin_edge(&mut self, from: &str, to: &str) -> io::Result<()> {
        let indent = self.indent();
        writeln!(
            self.out,
            "{indent}{} {} {} [",
            quote(from),
            self.edge_op(),
            quote(to)
        )?;
        self.scopes.push(Scope::Block);
        Ok(())
    }

    /// Write an attribute in the current scope. Inside graph and subgraph
    /// scopes this is a statement (`name=value;`); inside node and edge
    /// blocks it is a list entry.
    pub fn attribute(&mut self, name: &str, value: &str) -> io::Result<()> {
        let indent = self.indent();
        let terminator = match self.scopes.last() {
            Some(Scope::Block) => "",
            _ => ";",
        };
        writeln!(self.out, "{indent}{name}={}{terminator}", format_value(value))
    }

    /// Write a bare node statement with no attributes.
    pub fn node(&mut self, id: &str) -> io::Result<()> {
        let indent = self.indent();
        writeln!(self.out, "{indent}{};", quote(id))
    }

    /// Write a bare edge statement with no attributes.
    pub fn edge(&mut self, from: &str, to: &str) -> io::Result<()> {
        let indent = self.indent();
        writeln!(self.out, "{indent}{} {} {};", quote(from), self.edge_op(), quote(to))
    }

    /// Close the innermost scope, emitting `]` for attribute blocks and `}`
    /// for graphs and subgraphs at the enclosing indent.
    pub fn end(&mut self) -> io::Result<()> {
        let Some(scope) = self.scopes.pop() else {
            return Ok(());
        };
        let indent = self.indent();
        match scope {
            Scope::Block => writeln!(self.out, "{indent}]"),
            Scope::Graph | Scope::Subgraph => writeln!(self.out, "{indent}}}"),
        }
    }

    /// Close every open scope and hand the writer back.
    pub fn finish(mut self) -> io::Result<W> {
        while !self.scopes.is_empty() {
            self.end()?;
        }
        Ok(self.out)
    }

    fn edge_op(&self) -> &'static str {
        if self.directed {
            "->"
        } else {
            "--"
        }
    }
}

/// Quote and escape an identifier.
fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Attribute values are quoted unless they are HTML-like (`<…>`).
fn format_value(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('<') && value.ends_with('>') {
        value.to_string()
    } else {
        quote(value)
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Whole-graph emission
// ---------------------------------------------------------------------------

/// Options for [`write_graph`].
#[derive(Debug, Clone)]
pub struct DotOptions {
    /// Graph ID written after `digraph` / `graph`.
    pub id: Option<String>,
    /// Emit `digraph` with `->` edges (default), or `graph` with `--`.
    pub directed: bool,
    /// Set `rankdir=LR` for left-to-right layout.
    pub horizontal: bool,
    /// Group nodes into `cluster` subgraphs by this property's value.
    pub cluster_by: Option<String>,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            id: None,
            directed: true,
            horizontal: false,
            cluster_by: None,
        }
    }
}

/// The label for a node: plain key, or an HTML-like label carrying the
/// `sublabel` property as an extra italic, left-aligned line.
fn node_label(key: &str, metadata: &Metadata) -> String {
    match metadata.property("sublabel") {
        Some(sublabel) => format!(
            "<{}<BR ALIGN=\"LEFT\"/><I>{}</I><BR ALIGN=\"LEFT\"/>>",
            html_escape(key),
            html_escape(sublabel)
        ),
        None => key.to_string(),
    }
}

fn write_node<W: Write>(writer: &mut DotWriter<W>, key: &str, metadata: &Metadata) -> io::Result<()> {
    let label = node_label(key, metadata);
    let color = metadata.property("color");
    if label == key && color.is_none() {
        return writer.node(key);
    }
    writer.begin_node(key)?;
    writer.attribute("label", &label)?;
    if let Some(color) = color {
        writer.attribute("color", color)?;
    }
    writer.end()
}

/// Cluster IDs may only contain what GraphViz tolerates everywhere.
fn sanitize_id(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Render a whole graph as deterministic DOT.
pub fn write_graph<W: Write>(graph: &Graph, options: &DotOptions, out: W) -> io::Result<W> {
    let mut writer = DotWriter::new(out);
    writer.begin_graph(options.id.as_deref(), options.directed)?;
    if options.horizontal {
        writer.attribute("rankdir", "LR")?;
    }

    match &options.cluster_by {
        None => {
            for node in graph.nodes() {
                write_node(&mut writer, node.key(), node.metadata())?;
            }
        }
        Some(property) => {
            let class_of = |metadata: &Metadata| {
                metadata
                    .property(property)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let classes = graph.classify_nodes(|n| class_of(n.metadata()));
            for node in graph.nodes() {
                if class_of(node.metadata()).is_none() {
                    write_node(&mut writer, node.key(), node.metadata())?;
                }
            }
            for (class, members) in classes.iter() {
                writer.begin_subgraph(Some(&format!("cluster_{}", sanitize_id(class))))?;
                writer.attribute("label", class)?;
                for member in members {
                    if let Some(node) = graph.node(member) {
                        write_node(&mut writer, node.key(), node.metadata())?;
                    }
                }
                writer.end()?;
            }
        }
    }

    for edge in graph.edges() {
        match edge.metadata().property("color") {
            None => writer.edge(edge.source(), edge.target())?,
            Some(color) => {
                writer.begin_edge(edge.source(), edge.target())?;
                writer.attribute("color", color)?;
                writer.end()?;
            }
        }
    }

    writer.finish()
}

/// Render to a string.
#[must_use]
pub fn graph_to_dot(graph: &Graph, options: &DotOptions) -> String {
    match write_graph(graph, options, Vec::new()) {
        Ok(buffer) => String::from_utf8_lossy(&buffer).into_owned(),
        // Writing into a Vec cannot fail.
        Err(_) => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
