//! Graph file IO: a line-oriented subset of Graphviz DOT.
//!
//! ```text
//! digraph dependencies {
//!     "1" [spec="bash >= 5.1", implicit="false", state="unresolved", type="normal", kind="run", path=""];
//!     "2" [spec="glibc", implicit="false", state="cached", type="normal", kind="run", path="/out/glibc-2.35-1.x86_64.rpm", arch="x86_64"];
//!     "1" -> "2";
//! }
//! ```
//!
//! Every statement sits on its own line. Attributes other than the six the
//! engine interprets are kept in [`PkgNode::extra`].
//!
//! Writing is lossless for a graph that was read from a file. The header,
//! edge lines and the lines of nodes whose values did not change are written
//! back byte for byte. A changed node keeps its attribute order, and every
//! attribute whose value still means the same is written as it was spelled.
//! Nodes are written before edges, and comments are not kept.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use pkgfetch_util::errors::PkgfetchError;

use crate::graph::{NodeKind, NodeSource, NodeState, NodeType, PkgGraph, PkgNode};
use crate::package::PackageVer;

const ATTR_SPEC: &str = "spec";
const ATTR_IMPLICIT: &str = "implicit";
const ATTR_STATE: &str = "state";
const ATTR_TYPE: &str = "type";
const ATTR_KIND: &str = "kind";
const ATTR_PATH: &str = "path";

/// A syntax or consistency error in a graph file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct DotError {
    pub line: usize,
    pub message: String,
}

/// Read a graph file from disk.
pub fn read_graph(path: &Path) -> miette::Result<PkgGraph> {
    let content = std::fs::read_to_string(path).map_err(|e| PkgfetchError::GraphIo {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let graph = parse_graph(&content).map_err(|e| PkgfetchError::GraphIo {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    tracing::debug!(
        "Loaded graph '{}' ({} nodes, {} edges)",
        path.display(),
        graph.len(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Write a graph file to disk, creating parent directories as needed.
pub fn write_graph(graph: &PkgGraph, path: &Path) -> miette::Result<()> {
    let io_err = |e: std::io::Error| PkgfetchError::GraphIo {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        pkgfetch_util::fs::ensure_dir(parent).map_err(io_err)?;
    }
    std::fs::write(path, to_dot_string(graph)).map_err(io_err)?;
    tracing::debug!("Wrote graph '{}'", path.display());
    Ok(())
}

/// Render the graph in the DOT subset understood by [`parse_graph`].
pub fn to_dot_string(graph: &PkgGraph) -> String {
    let mut out = String::new();
    out.push_str(graph.header().unwrap_or("digraph dependencies {"));
    out.push('\n');
    for idx in graph.node_indices() {
        let _ = writeln!(out, "{}", node_line(graph.node(idx)));
    }
    for (from, to, line) in graph.edges_with_source() {
        match line {
            Some(line) => {
                let _ = writeln!(out, "{line}");
            }
            None => {
                let _ = writeln!(
                    out,
                    "\t{} -> {};",
                    quote(&graph.node(from).id),
                    quote(&graph.node(to).id)
                );
            }
        }
    }
    out.push_str("}\n");
    out
}

fn node_line(node: &PkgNode) -> String {
    if let Some(source) = &node.source {
        let unchanged = node_from_attrs(node.id.clone(), source.attrs.clone())
            .is_ok_and(|read| read == *node);
        if unchanged {
            return source.line.clone();
        }
    }
    let rendered: Vec<String> = node_attrs(node)
        .iter()
        .map(|(k, v)| format!("{k}={}", quote(v)))
        .collect();
    format!("\t{} [{}];", quote(&node.id), rendered.join(", "))
}

/// The six interpreted attributes in their canonical spelling.
fn interpreted_attrs(node: &PkgNode) -> [(&'static str, String); 6] {
    let path = node
        .artifact_path
        .as_deref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    [
        (ATTR_SPEC, node.spec.to_string()),
        (ATTR_IMPLICIT, node.implicit.to_string()),
        (ATTR_STATE, node.state.to_string()),
        (ATTR_TYPE, node.node_type.to_string()),
        (ATTR_KIND, node.kind.to_string()),
        (ATTR_PATH, path),
    ]
}

/// Attributes for a node that has to be re-rendered.
///
/// Attributes the node was read with come first, in file order. A value that
/// still decodes to the node's current value keeps its original spelling.
/// Interpreted attributes the file left out are added only when they differ
/// from the default, then any new extra attributes follow sorted by key.
fn node_attrs(node: &PkgNode) -> Vec<(String, String)> {
    let interpreted = interpreted_attrs(node);
    let Some(source) = &node.source else {
        let mut attrs: Vec<(String, String)> = interpreted
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        attrs.extend(node.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        return attrs;
    };

    let mut attrs = Vec::new();
    let mut written = HashSet::new();
    for (key, raw) in &source.attrs {
        let current = interpreted
            .iter()
            .find(|(k, _)| *k == key.as_str())
            .map(|(_, v)| v.clone())
            .or_else(|| node.extra.get(key).cloned());
        // An extra attribute dropped since the node was read.
        let Some(current) = current else { continue };
        let value = if spells_same_value(node, key, raw) {
            raw.clone()
        } else {
            current
        };
        attrs.push((key.clone(), value));
        written.insert(key.as_str());
    }

    let defaults = interpreted_attrs(&PkgNode::unresolved(node.id.clone(), node.spec.clone()));
    for ((key, value), (_, default)) in interpreted.iter().zip(defaults.iter()) {
        if !written.contains(key) && value != default {
            attrs.push((key.to_string(), value.clone()));
        }
    }
    for (key, value) in &node.extra {
        if !written.contains(key.as_str()) {
            attrs.push((key.clone(), value.clone()));
        }
    }
    attrs
}

/// Whether `raw` as the value of `key` decodes to what `node` holds now.
fn spells_same_value(node: &PkgNode, key: &str, raw: &str) -> bool {
    match key {
        ATTR_SPEC => raw.parse::<PackageVer>().is_ok_and(|v| v == node.spec),
        ATTR_IMPLICIT => raw.parse::<bool>().is_ok_and(|v| v == node.implicit),
        ATTR_STATE => raw.parse::<NodeState>().is_ok_and(|v| v == node.state),
        ATTR_TYPE => raw.parse::<NodeType>().is_ok_and(|v| v == node.node_type),
        ATTR_KIND => raw.parse::<NodeKind>().is_ok_and(|v| v == node.kind),
        ATTR_PATH => {
            let path = Some(raw).filter(|p| !p.is_empty()).map(PathBuf::from);
            path == node.artifact_path
        }
        _ => node.extra.get(key).map(String::as_str) == Some(raw),
    }
}

/// Parse the DOT subset produced by [`to_dot_string`].
pub fn parse_graph(content: &str) -> Result<PkgGraph, DotError> {
    let mut graph = PkgGraph::new();
    let mut opened = false;
    let mut closed = false;

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let err = |message: String| DotError {
            line: line_no,
            message,
        };
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }
        if closed {
            return Err(err("content after closing brace".into()));
        }
        if !opened {
            if line.starts_with("digraph") && line.ends_with('{') {
                opened = true;
                graph.set_header(raw);
                continue;
            }
            return Err(err("expected `digraph <name> {`".into()));
        }
        if line == "}" {
            closed = true;
            continue;
        }

        let stmt = line.strip_suffix(';').unwrap_or(line).trim();
        let mut cursor = Cursor::new(stmt);
        let first = cursor.ident().map_err(err)?;
        cursor.skip_ws();

        if cursor.eat("->") {
            cursor.skip_ws();
            let second = cursor.ident().map_err(err)?;
            cursor.expect_end().map_err(err)?;
            let from = graph
                .find(&first)
                .ok_or_else(|| err(format!("edge references unknown node '{first}'")))?;
            let to = graph
                .find(&second)
                .ok_or_else(|| err(format!("edge references unknown node '{second}'")))?;
            graph.add_edge_from_source(from, to, Some(raw.to_string()));
        } else {
            let attrs = cursor.attr_list().map_err(err)?;
            cursor.expect_end().map_err(err)?;
            if graph.find(&first).is_some() {
                return Err(err(format!("duplicate node '{first}'")));
            }
            let mut node = node_from_attrs(first, attrs.clone()).map_err(err)?;
            node.source = Some(NodeSource {
                line: raw.to_string(),
                attrs,
            });
            graph.add_node(node);
        }
    }

    if !opened || !closed {
        return Err(DotError {
            line: content.lines().count(),
            message: "unterminated digraph".into(),
        });
    }
    Ok(graph)
}

fn node_from_attrs(id: String, attrs: Vec<(String, String)>) -> Result<PkgNode, String> {
    let mut attrs: BTreeMap<String, String> = attrs.into_iter().collect();
    let spec_str = attrs
        .remove(ATTR_SPEC)
        .ok_or_else(|| format!("node '{id}' has no `{ATTR_SPEC}` attribute"))?;
    let spec: PackageVer = spec_str.parse().map_err(|e| format!("node '{id}': {e}"))?;
    let mut node = PkgNode::unresolved(id, spec);

    if let Some(v) = attrs.remove(ATTR_IMPLICIT) {
        node.implicit = v
            .parse()
            .map_err(|_| format!("node '{}': bad boolean '{v}'", node.id))?;
    }
    if let Some(v) = attrs.remove(ATTR_STATE) {
        node.state = v.parse().map_err(|e| format!("node '{}': {e}", node.id))?;
    }
    if let Some(v) = attrs.remove(ATTR_TYPE) {
        node.node_type = v.parse().map_err(|e| format!("node '{}': {e}", node.id))?;
    }
    if let Some(v) = attrs.remove(ATTR_KIND) {
        node.kind = v.parse().map_err(|e| format!("node '{}': {e}", node.id))?;
    }
    node.artifact_path = attrs
        .remove(ATTR_PATH)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    node.extra = attrs;
    Ok(node)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Minimal tokenizer over a single statement.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(r) => {
                self.rest = r;
                true
            }
            None => false,
        }
    }

    fn expect_end(&mut self) -> Result<(), String> {
        self.skip_ws();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(format!("unexpected trailing input '{}'", self.rest))
        }
    }

    /// A quoted string or a bare identifier.
    fn ident(&mut self) -> Result<String, String> {
        self.skip_ws();
        if self.eat("\"") {
            return self.quoted_tail();
        }
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'))
            .unwrap_or(self.rest.len());
        // `-` is legal in bare ids, so `a->b` must stop before the operator.
        let end = self.rest.find("->").map_or(end, |arrow| arrow.min(end));
        if end == 0 {
            return Err(format!("expected identifier at '{}'", self.rest));
        }
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(word.to_string())
    }

    fn quoted_tail(&mut self) -> Result<String, String> {
        let mut out = String::new();
        let mut chars = self.rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &self.rest[i + 1..];
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                _ => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    /// `[key=value, key=value]`, in the order written.
    fn attr_list(&mut self) -> Result<Vec<(String, String)>, String> {
        let mut attrs: Vec<(String, String)> = Vec::new();
        self.skip_ws();
        if !self.eat("[") {
            return Err(format!("expected `->` or `[` at '{}'", self.rest));
        }
        loop {
            self.skip_ws();
            if self.eat("]") {
                return Ok(attrs);
            }
            let key = self.ident()?;
            self.skip_ws();
            if !self.eat("=") {
                return Err(format!("expected `=` after attribute '{key}'"));
            }
            let value = self.ident()?;
            if attrs.iter().any(|(k, _)| *k == key) {
                return Err(format!("attribute '{key}' given twice"));
            }
            attrs.push((key, value));
            self.skip_ws();
            let _ = self.eat(",") || self.eat(";");
        }
    }
}
