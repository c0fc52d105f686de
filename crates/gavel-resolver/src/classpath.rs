//! Deterministic classpath assembly from a resolved dependency graph.
//!
//! Entries are emitted in topological order, dependencies before anything
//! that requires them. Ties are broken by the declaration index of the
//! earliest root that reached the node, then by discovery order, so the
//! same graph always assembles to the same classpath.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use gavel_util::errors::{GavelError, GavelResult};
use petgraph::graph::NodeIndex;

use crate::graph::{ArtifactRef, DependencyGraph};

/// One artifact on the assembled classpath.
#[derive(Debug, Clone)]
pub struct ClasspathEntry {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    /// Name of the repository source that resolved this entry.
    pub source: String,
    pub jar_url: Option<String>,
    pub checksum: Option<String>,
    /// Direct dependencies, all of which precede this entry.
    pub requires: Vec<ArtifactRef>,
}

impl ClasspathEntry {
    pub fn coordinate(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}:{}", self.group, self.artifact, self.version, c),
            None => format!("{}:{}:{}", self.group, self.artifact, self.version),
        }
    }
}

/// The fully assembled classpath, ordered for loading.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    entries: Vec<ClasspathEntry>,
}

impl Classpath {
    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClasspathEntry> {
        self.entries.iter()
    }

    /// Position of an artifact on the classpath, by group and artifact name.
    pub fn position_of(&self, group: &str, artifact: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.group == group && e.artifact == artifact)
    }
}

impl fmt::Display for Classpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.coordinate())?;
        }
        Ok(())
    }
}

/// Assemble a resolved graph into classpath order.
///
/// Kahn's algorithm over the requires edges: a node becomes ready once every
/// dependency has been emitted, and the ready set drains lowest
/// `(root_rank, seq)` first.
pub fn assemble(graph: &DependencyGraph) -> GavelResult<Classpath> {
    let mut pending: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|idx| (idx, graph.dependencies_of(idx).len()))
        .collect();

    let mut ready: BinaryHeap<Reverse<(usize, usize, NodeIndex)>> = BinaryHeap::new();
    for (&idx, &deps) in &pending {
        if deps == 0 {
            let node = graph.node(idx);
            ready.push(Reverse((node.root_rank, node.seq, idx)));
        }
    }

    let mut entries = Vec::with_capacity(graph.len());
    while let Some(Reverse((_, _, idx))) = ready.pop() {
        pending.remove(&idx);
        entries.push(entry_for(graph, idx));

        for dependent in graph.dependents_of(idx) {
            if let Some(deps) = pending.get_mut(&dependent) {
                *deps -= 1;
                if *deps == 0 {
                    let node = graph.node(dependent);
                    ready.push(Reverse((node.root_rank, node.seq, dependent)));
                }
            }
        }
    }

    // Leftover nodes mean a requires edge never drained, which the walk's
    // cycle check should have caught upstream.
    if !pending.is_empty() {
        let mut stuck: Vec<NodeIndex> = pending.keys().copied().collect();
        stuck.sort_by_key(|&idx| graph.node(idx).seq);
        let node = graph.node(stuck[0]);
        return Err(GavelError::AssemblyIncomplete {
            identity: node.key(),
            state: format!("{} dependencies still unordered", pending[&stuck[0]]),
        }
        .into());
    }

    Ok(Classpath { entries })
}

fn entry_for(graph: &DependencyGraph, idx: NodeIndex) -> ClasspathEntry {
    let node = graph.node(idx);
    let mut require_indices = graph.dependencies_of(idx);
    require_indices.sort_by_key(|&dep| graph.node(dep).seq);

    ClasspathEntry {
        group: node.group.clone(),
        artifact: node.artifact.clone(),
        version: node.version.clone(),
        classifier: node.classifier.clone(),
        source: node.source.clone(),
        jar_url: node.jar_url.clone(),
        checksum: node.checksum.clone(),
        requires: require_indices
            .into_iter()
            .map(|dep| {
                let dep_node = graph.node(dep);
                ArtifactRef {
                    group: dep_node.group.clone(),
                    artifact: dep_node.artifact.clone(),
                    version: dep_node.version.clone(),
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ArtifactNode;

    fn node(group: &str, artifact: &str, version: &str, root_rank: usize, seq: usize) -> ArtifactNode {
        ArtifactNode {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier: None,
            source: "test".to_string(),
            jar_url: None,
            checksum: None,
            root_rank,
            seq,
        }
    }

    fn coordinates(classpath: &Classpath) -> Vec<String> {
        classpath.iter().map(|e| e.coordinate()).collect()
    }

    #[test]
    fn dependencies_precede_dependents() {
        let mut g = DependencyGraph::new();
        let app = g.add_node(node("com.example", "app", "1.0", 0, 0));
        let lib = g.add_node(node("org.lib", "lib", "2.0", 0, 1));
        let base = g.add_node(node("org.base", "base", "3.0", 0, 2));
        g.add_root(app);
        g.add_edge(app, lib);
        g.add_edge(lib, base);

        let classpath = assemble(&g).unwrap();
        assert_eq!(
            coordinates(&classpath),
            vec!["org.base:base:3.0", "org.lib:lib:2.0", "com.example:app:1.0"]
        );
    }

    #[test]
    fn ties_break_by_root_declaration_order() {
        let mut g = DependencyGraph::new();
        // Two independent roots, declared second-rank first in discovery.
        let b = g.add_node(node("org.b", "b", "1.0", 1, 0));
        let a = g.add_node(node("org.a", "a", "1.0", 0, 1));
        g.add_root(b);
        g.add_root(a);

        let classpath = assemble(&g).unwrap();
        assert_eq!(coordinates(&classpath), vec!["org.a:a:1.0", "org.b:b:1.0"]);
    }

    #[test]
    fn shared_dependency_appears_once_before_both_dependents() {
        let mut g = DependencyGraph::new();
        let a = g.add_node(node("org.a", "a", "1.0", 0, 0));
        let b = g.add_node(node("org.b", "b", "1.0", 1, 1));
        let shared = g.add_node(node("org.shared", "shared", "1.0", 0, 2));
        g.add_root(a);
        g.add_root(b);
        g.add_edge(a, shared);
        g.add_edge(b, shared);

        let classpath = assemble(&g).unwrap();
        let shared_pos = classpath.position_of("org.shared", "shared").unwrap();
        assert!(shared_pos < classpath.position_of("org.a", "a").unwrap());
        assert!(shared_pos < classpath.position_of("org.b", "b").unwrap());
        assert_eq!(classpath.len(), 3);
    }

    #[test]
    fn entries_carry_their_requirements() {
        let mut g = DependencyGraph::new();
        let app = g.add_node(node("com.example", "app", "1.0", 0, 0));
        let lib = g.add_node(node("org.lib", "lib", "2.0", 0, 1));
        g.add_root(app);
        g.add_edge(app, lib);

        let classpath = assemble(&g).unwrap();
        let app_entry = classpath
            .iter()
            .find(|e| e.artifact == "app")
            .unwrap();
        assert_eq!(app_entry.requires.len(), 1);
        assert_eq!(app_entry.requires[0].artifact, "lib");
        assert_eq!(app_entry.requires[0].version, "2.0");
    }

    #[test]
    fn assembly_is_deterministic() {
        let build = || {
            let mut g = DependencyGraph::new();
            let a = g.add_node(node("org.a", "a", "1.0", 0, 0));
            let b = g.add_node(node("org.b", "b", "1.0", 1, 1));
            let c = g.add_node(node("org.c", "c", "1.0", 0, 2));
            let d = g.add_node(node("org.d", "d", "1.0", 1, 3));
            g.add_root(a);
            g.add_root(b);
            g.add_edge(a, c);
            g.add_edge(b, d);
            g.add_edge(b, c);
            g
        };
        let first = coordinates(&assemble(&build()).unwrap());
        let second = coordinates(&assemble(&build()).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn unresolved_edges_fail_assembly() {
        let mut g = DependencyGraph::new();
        // Manually wire a cycle, which resolution would normally reject.
        let a = g.add_node(node("org.a", "a", "1.0", 0, 0));
        let b = g.add_node(node("org.b", "b", "1.0", 0, 1));
        g.add_edge(a, b);
        g.add_edge(b, a);

        let err = assemble(&g).unwrap_err();
        assert!(err.to_string().contains("org.a:a"));
    }
}
