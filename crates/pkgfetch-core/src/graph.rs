//! Package dependency graph: node model and arena-backed graph.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::package::PackageVer;

/// Lifecycle state of a node.
///
/// Only `Unresolved`, `Cached` and `UpToDate` are written by the resolution
/// engine. The remaining states belong to other build stages and pass
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Unresolved,
    Cached,
    UpToDate,
    Build,
    Meta,
    Unknown,
}

impl NodeState {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Unresolved => "unresolved",
            NodeState::Cached => "cached",
            NodeState::UpToDate => "uptodate",
            NodeState::Build => "build",
            NodeState::Meta => "meta",
            NodeState::Unknown => "unknown",
        }
    }

    /// Whether this state carries a resolved artifact.
    pub fn is_resolved(self) -> bool {
        matches!(self, NodeState::Cached | NodeState::UpToDate)
    }
}

/// Whether a node needs a build step downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeType {
    #[default]
    Normal,
    PreBuilt,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Normal => "normal",
            NodeType::PreBuilt => "prebuilt",
        }
    }
}

/// What a node represents in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// A run-time requirement: something that must be installed.
    #[default]
    Run,
    /// A build action producing packages.
    Build,
    /// A synthetic target grouping other nodes.
    Goal,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Run => "run",
            NodeKind::Build => "build",
            NodeKind::Goal => "goal",
        }
    }
}

/// Error returned when an enum attribute has an unknown value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseAttrError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! impl_from_str {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseAttrError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseAttrError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_from_str!(
    NodeState,
    "state",
    [
        NodeState::Unresolved,
        NodeState::Cached,
        NodeState::UpToDate,
        NodeState::Build,
        NodeState::Meta,
        NodeState::Unknown,
    ]
);
impl_from_str!(NodeType, "type", [NodeType::Normal, NodeType::PreBuilt]);
impl_from_str!(NodeKind, "kind", [NodeKind::Run, NodeKind::Build, NodeKind::Goal]);

/// A vertex in the package dependency graph.
///
/// Equality compares the node's meaning and ignores [`PkgNode::source`].
#[derive(Debug, Clone)]
pub struct PkgNode {
    /// Unique identifier within the graph file.
    pub id: String,
    pub spec: PackageVer,
    /// Discovered dynamically during the build rather than declared up front.
    pub implicit: bool,
    pub state: NodeState,
    pub node_type: NodeType,
    pub kind: NodeKind,
    /// Resolved artifact. `None` while the node is unresolved.
    pub artifact_path: Option<PathBuf>,
    /// Attributes owned by other tools, preserved verbatim.
    pub extra: BTreeMap<String, String>,
    /// How the node was spelled in the file it was read from.
    pub source: Option<NodeSource>,
}

/// The text a node statement was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSource {
    /// The statement line, without its line terminator.
    pub line: String,
    /// Attributes in file order, values as written.
    pub attrs: Vec<(String, String)>,
}

impl PartialEq for PkgNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.spec == other.spec
            && self.implicit == other.implicit
            && self.state == other.state
            && self.node_type == other.node_type
            && self.kind == other.kind
            && self.artifact_path == other.artifact_path
            && self.extra == other.extra
    }
}

impl Eq for PkgNode {}

impl PkgNode {
    /// A fresh unresolved run node for `spec`.
    pub fn unresolved(id: impl Into<String>, spec: PackageVer) -> Self {
        Self {
            id: id.into(),
            spec,
            implicit: false,
            state: NodeState::Unresolved,
            node_type: NodeType::Normal,
            kind: NodeKind::Run,
            artifact_path: None,
            extra: BTreeMap::new(),
            source: None,
        }
    }

    pub fn is_unresolved_run(&self) -> bool {
        self.kind == NodeKind::Run && self.state == NodeState::Unresolved
    }
}

impl fmt::Display for PkgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}-{}", self.spec, self.kind, self.state)?;
        if self.implicit {
            f.write_str(", implicit")?;
        }
        f.write_str(")")
    }
}

/// Package dependency graph backed by a petgraph arena.
///
/// An edge `a -> b` means `a` depends on `b`. The graph structure is fixed
/// once loaded; only node fields are mutated, through [`PkgGraph::node_mut`].
#[derive(Debug, Clone, Default)]
pub struct PkgGraph {
    /// Edge weights hold the statement line an edge was read from.
    graph: DiGraph<PkgNode, Option<String>>,
    index: HashMap<String, NodeIndex>,
    header: Option<String>,
}

impl PkgGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or retrieve a node. If the id already exists, returns the existing index.
    pub fn add_node(&mut self, node: PkgNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Add a dependency edge from `dependent` to `dependency`.
    pub fn add_edge(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        self.add_edge_from_source(dependent, dependency, None);
    }

    /// Add an edge, remembering the statement line it was read from.
    pub fn add_edge_from_source(
        &mut self,
        dependent: NodeIndex,
        dependency: NodeIndex,
        line: Option<String>,
    ) {
        if !self
            .graph
            .edges(dependent)
            .any(|e| e.target() == dependency)
        {
            self.graph.add_edge(dependent, dependency, line);
        }
    }

    /// The `digraph ... {` line the graph was read from, if any.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn set_header(&mut self, line: impl Into<String>) {
        self.header = Some(line.into());
    }

    /// Look up a node by id.
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &PkgNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut PkgNode {
        &mut self.graph[idx]
    }

    /// All node indices in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All run-time nodes.
    pub fn run_nodes(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].kind == NodeKind::Run)
            .collect()
    }

    /// Run-time nodes still waiting for an artifact.
    pub fn unresolved_run_nodes(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].is_unresolved_run())
            .collect()
    }

    pub fn has_unresolved_nodes(&self) -> bool {
        self.graph
            .node_weights()
            .any(PkgNode::is_unresolved_run)
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut dependents: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
            .collect();
        dependents.sort();
        dependents
    }

    /// All edges as `(dependent, dependency, source line)`, in insertion order.
    pub fn edges_with_source(&self) -> Vec<(NodeIndex, NodeIndex, Option<&str>)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight().as_deref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
