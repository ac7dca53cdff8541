//! Operation: summarize the resolution state of a graph file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use pkgfetch_core::dot;

/// An unresolved run node and who is waiting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedNode {
    pub id: String,
    pub spec: String,
    pub implicit: bool,
    pub dependents: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphStatus {
    pub total: usize,
    pub run_nodes: usize,
    /// Run node count per state name.
    pub states: BTreeMap<String, usize>,
    pub unresolved: Vec<UnresolvedNode>,
}

impl GraphStatus {
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

impl fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} node(s), {} run-time",
            self.total, self.run_nodes
        )?;
        for (state, count) in &self.states {
            writeln!(f, "  {state}: {count}")?;
        }
        if self.unresolved.is_empty() {
            return Ok(());
        }
        writeln!(f, "unresolved:")?;
        for node in &self.unresolved {
            write!(f, "  {}", node.spec)?;
            if node.implicit {
                write!(f, " (implicit)")?;
            }
            if !node.dependents.is_empty() {
                write!(f, " <- {}", node.dependents.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Load the graph at `path` and report its run nodes by state.
pub fn graph_status(path: &Path) -> miette::Result<GraphStatus> {
    let graph = dot::read_graph(path)?;
    let run_nodes = graph.run_nodes();

    let mut states: BTreeMap<String, usize> = BTreeMap::new();
    for &idx in &run_nodes {
        *states.entry(graph.node(idx).state.to_string()).or_insert(0) += 1;
    }

    let unresolved = graph
        .unresolved_run_nodes()
        .into_iter()
        .map(|idx| {
            let node = graph.node(idx);
            UnresolvedNode {
                id: node.id.clone(),
                spec: node.spec.to_string(),
                implicit: node.implicit,
                dependents: graph
                    .dependents_of(idx)
                    .into_iter()
                    .map(|d| graph.node(d).spec.to_string())
                    .collect(),
            }
        })
        .collect();

    Ok(GraphStatus {
        total: graph.len(),
        run_nodes: run_nodes.len(),
        states,
        unresolved,
    })
}
