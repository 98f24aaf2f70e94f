use std::fmt::{self, Display};
use std::path::Path;

use anyhow::anyhow;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

pub const GRAPH_NAME: &str = "ER_diagram";
pub const RANK_DIR: &str = "LR";
pub const NODE_SHAPE: &str = "egg";
pub const NODE_STYLE: &str = "rounded, filled, bold";
pub const NODE_COLOR: &str = "#BD2027";
pub const NODE_FILL_COLOR: &str = "#e8e8e8";

/// An insertion-ordered, deduplicated set of table nodes and labeled join
/// edges, accumulated one statement at a time and rendered once at the end
/// of a run.
///
/// Both `add_node` and `add_edge` follow an accept-first-write policy: the
/// first occurrence of a node or of a `(from, to)` pair wins, and later
/// duplicates are discarded along with their labels.
#[derive(Debug, Clone, Default)]
pub struct ErGraph {
    nodes: IndexSet<String>,
    edges: IndexMap<(String, String), Option<String>>,
}

#[derive(Serialize)]
pub struct GraphDump<'a> {
    nodes: Vec<&'a str>,
    edges: Vec<EdgeDump<'a>>,
}

#[derive(Serialize)]
struct EdgeDump<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
}

impl ErGraph {
    pub fn add_node(&mut self, name: &str) {
        if !self.nodes.contains(name) {
            self.nodes.insert(name.to_owned());
        }
    }

    pub fn add_edge(&mut self, from: &str, to: &str, label: Option<&str>) {
        self.edges
            .entry((from.to_owned(), to.to_owned()))
            .or_insert_with(|| label.map(str::to_owned));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, Option<&str>)> {
        self.edges
            .iter()
            .map(|((from, to), label)| (from.as_str(), to.as_str(), label.as_deref()))
    }

    /// A serializable view of the accumulated nodes and edges.
    pub fn dump(&self) -> GraphDump<'_> {
        GraphDump {
            nodes: self.nodes().collect(),
            edges: self
                .edges()
                .map(|(from, to, label)| EdgeDump { from, to, label })
                .collect(),
        }
    }

    /// The graph as Graphviz DOT source.
    pub fn to_dot(&self) -> String {
        self.to_string()
    }

    /// One-shot render of the DOT artifact to disk.
    pub fn write_dot(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_dot())
            .map_err(|err| anyhow!("Failed to write DOT file {}: {}", path.display(), err))
    }
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl Display for ErGraph {
    /// Formats the graph as a left-to-right directed Graphviz layout, every
    /// node drawn with the same rounded, filled, bordered styling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {GRAPH_NAME} {{")?;
        writeln!(f, "    rankdir={RANK_DIR}")?;
        for node in self.nodes() {
            writeln!(
                f,
                "    \"{}\" [shape={NODE_SHAPE}, style=\"{NODE_STYLE}\", color=\"{NODE_COLOR}\", fillcolor=\"{NODE_FILL_COLOR}\"]",
                escape(node)
            )?;
        }
        for (from, to, label) in self.edges() {
            match label {
                Some(label) => writeln!(
                    f,
                    "    \"{}\" -> \"{}\" [label=\"{}\"]",
                    escape(from),
                    escape(to),
                    escape(label)
                )?,
                None => writeln!(f, "    \"{}\" -> \"{}\"", escape(from), escape(to))?,
            }
        }
        write!(f, "}}")
    }
}
