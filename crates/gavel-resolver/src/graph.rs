//! The resolved dependency graph and per-node resolution states.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Lifecycle of a node during graph building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Resolving,
    Resolved,
    Failed,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::Pending => "pending",
            NodeState::Resolving => "resolving",
            NodeState::Resolved => "resolved",
            NodeState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A resolved artifact: winning coordinate, provenance, payload reference,
/// and the ordering metadata the assembler ties on.
#[derive(Debug, Clone)]
pub struct ArtifactNode {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,

    /// Name of the repository source that served the descriptor.
    pub source: String,
    pub jar_url: Option<String>,
    pub checksum: Option<String>,

    /// Declaration index of the first root that required this node.
    pub root_rank: usize,
    /// Discovery sequence within the pass.
    pub seq: usize,
}

impl ArtifactNode {
    /// Identity key (`group:artifact`, classifier-extended), no version.
    pub fn key(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}", self.group, self.artifact, c),
            None => format!("{}:{}", self.group, self.artifact),
        }
    }
}

impl fmt::Display for ArtifactNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(ref c) = self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}

/// A reference to a direct dependency of a resolved node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// The resolved dependency graph, backed by petgraph. Edges point from a
/// node to the artifacts it requires.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<ArtifactNode, ()>,
    /// Identity key → node index (one node per identity).
    index: HashMap<String, NodeIndex>,
    /// Root nodes in declaration order.
    pub roots: Vec<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Add a node, or return the existing index for its identity.
    pub fn add_node(&mut self, node: ArtifactNode) -> NodeIndex {
        let key = node.key();
        if let Some(&idx) = self.index.get(&key) {
            // Identity already present: keep the earliest root rank.
            let existing = &mut self.graph[idx];
            existing.root_rank = existing.root_rank.min(node.root_rank);
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    /// Lower a node's root rank when an earlier-declared root reaches it.
    pub fn merge_root_rank(&mut self, idx: NodeIndex, rank: usize) {
        let node = &mut self.graph[idx];
        node.root_rank = node.root_rank.min(rank);
    }

    /// Record a root node (declaration order).
    pub fn add_root(&mut self, idx: NodeIndex) {
        if !self.roots.contains(&idx) {
            self.roots.push(idx);
        }
    }

    /// Add a requires edge, deduplicated.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if from != to && !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ArtifactNode {
        &self.graph[idx]
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect()
    }

    /// Reverse edges: who requires this node.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Render the dependency tree rooted at each declaration.
    pub fn render_tree(&self) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        for &root in &self.roots {
            output.push_str(&format!("{}\n", self.graph[root]));
            visited.insert(root);
            let deps = self.dependencies_of(root);
            let count = deps.len();
            for (i, dep) in deps.into_iter().enumerate() {
                self.render_subtree(&mut output, dep, "", i == count - 1, &mut visited);
            }
            visited.remove(&root);
        }
        output
    }

    fn render_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, dep) in deps.into_iter().enumerate() {
            self.render_subtree(output, dep, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(group: &str, artifact: &str, version: &str) -> ArtifactNode {
        ArtifactNode {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier: None,
            source: "test".to_string(),
            jar_url: None,
            checksum: None,
            root_rank: 0,
            seq: 0,
        }
    }

    #[test]
    fn add_and_find_by_identity() {
        let mut g = DependencyGraph::new();
        let idx = g.add_node(make_node("org.example", "lib", "1.0"));
        assert_eq!(g.find("org.example:lib"), Some(idx));
        assert_eq!(g.node(idx).version, "1.0");
    }

    #[test]
    fn one_node_per_identity() {
        let mut g = DependencyGraph::new();
        let a = g.add_node(make_node("org.example", "lib", "1.0"));
        let b = g.add_node(make_node("org.example", "lib", "1.0"));
        assert_eq!(a, b);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn reusing_identity_keeps_earliest_root_rank() {
        let mut g = DependencyGraph::new();
        let mut first = make_node("org.example", "lib", "1.0");
        first.root_rank = 3;
        let idx = g.add_node(first);

        let mut again = make_node("org.example", "lib", "1.0");
        again.root_rank = 1;
        g.add_node(again);
        assert_eq!(g.node(idx).root_rank, 1);
    }

    #[test]
    fn edges_deduplicate() {
        let mut g = DependencyGraph::new();
        let a = g.add_node(make_node("org.a", "a", "1.0"));
        let b = g.add_node(make_node("org.b", "b", "1.0"));
        g.add_edge(a, b);
        g.add_edge(a, b);
        assert_eq!(g.dependencies_of(a).len(), 1);
        assert_eq!(g.dependents_of(b), vec![a]);
    }

    #[test]
    fn tree_rendering() {
        let mut g = DependencyGraph::new();
        let root = g.add_node(make_node("com.example", "app", "1.0"));
        g.add_root(root);
        let a = g.add_node(make_node("org.a", "a", "1.0"));
        let b = g.add_node(make_node("org.b", "b", "2.0"));
        g.add_edge(root, a);
        g.add_edge(a, b);

        let tree = g.render_tree();
        assert!(tree.contains("com.example:app:1.0"));
        assert!(tree.contains("org.a:a:1.0"));
        assert!(tree.contains("org.b:b:2.0"));
    }
}
