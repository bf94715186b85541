// Dependency graph between the modules of a project

use crate::analysis::imports::ImportClassifier;
use crate::analysis::tree::{ModuleTree, NodeId};
use crate::error::Result;
use crate::parser::{ImportDeclaration, ImportExtractor};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Module tree plus the analysis results computed over it.
///
/// Edges live only on the nodes (`dependencies` / `dependents`); there is no
/// separate edge store to keep in sync.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub tree: ModuleTree,
    /// Working set in pre-order
    pub nodes: Vec<NodeId>,
    /// Cycle groups, indexed by `CycleId`
    pub cycles: Vec<Vec<NodeId>>,
    pub topological_order: Vec<NodeId>,
}

/// A dependency edge: `from` imports `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

impl DependencyGraph {
    /// Graph over every node of the tree, without edges
    pub fn new(tree: ModuleTree) -> Self {
        let nodes = tree.flatten();
        Self {
            tree,
            nodes,
            cycles: Vec::new(),
            topological_order: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// All edges, derived from each node's dependency list
    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .flat_map(|&from| {
                self.tree
                    .node(from)
                    .dependencies
                    .iter()
                    .map(move |&to| Edge { from, to })
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|&id| self.tree.node(id).dependencies.len())
            .sum()
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.tree.node(id).dependencies.len()
    }

    /// Node with exactly this path, if it is in the working set
    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        self.tree.find(path).filter(|id| self.contains(*id))
    }

    /// Node by dotted qualified name, falling back to the plain name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .copied()
            .find(|&id| self.tree.qualified_name(id) == name)
            .or_else(|| {
                self.nodes
                    .iter()
                    .copied()
                    .find(|&id| self.tree.node(id).name == name)
            })
    }

    /// Nodes without dependencies
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&id| self.tree.node(id).dependencies.is_empty())
            .collect()
    }

    /// Nodes nothing depends on
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&id| self.tree.node(id).dependents.is_empty())
            .collect()
    }

    pub fn transitive_dependencies(&self, id: NodeId) -> HashSet<NodeId> {
        self.tree.transitive_dependencies(id)
    }

    pub fn transitive_dependents(&self, id: NodeId) -> HashSet<NodeId> {
        self.tree.transitive_dependents(id)
    }

    /// Shortest chain of imports leading from `from` to `to`, both included
    pub fn path_between(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }

        let mut previous: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        previous.insert(from, from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to];
                let mut step = to;
                while step != from {
                    step = previous[&step];
                    path.push(step);
                }
                path.reverse();
                return Some(path);
            }
            for &next in &self.tree.node(current).dependencies {
                if self.contains(next) && !previous.contains_key(&next) {
                    previous.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Members of the cycle group containing `id`
    pub fn cycle_members(&self, id: NodeId) -> &[NodeId] {
        match self.tree.node(id).cycle_group {
            Some(group) => self.cycles.get(group.0).map(Vec::as_slice).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Drop edges, imports, cycles and ordering
    pub fn clear_analysis(&mut self) {
        self.tree.clear_analysis();
        self.cycles.clear();
        self.topological_order.clear();
    }

    pub fn into_tree(self) -> ModuleTree {
        self.tree
    }
}

/// Extracts imports from every node and links the nodes they resolve to
pub struct DependencyGraphBuilder {
    extractor: ImportExtractor,
    classifier: ImportClassifier,
}

impl DependencyGraphBuilder {
    pub fn new(classifier: ImportClassifier) -> Result<Self> {
        Ok(Self {
            extractor: ImportExtractor::new()?,
            classifier,
        })
    }

    /// Build the dependency graph for a scanned tree
    pub fn build(&mut self, tree: ModuleTree) -> DependencyGraph {
        let mut graph = DependencyGraph::new(tree);
        let working_set: HashSet<NodeId> = graph.nodes.iter().copied().collect();
        let project_root = graph.tree.node(graph.root()).path.clone();

        // Step 1: extract imports
        for &id in &graph.nodes {
            let imports = match graph.tree.node(id).content.as_deref() {
                Some(content) => self.extractor.extract_lenient(content),
                None => Vec::new(),
            };
            graph.tree.node_mut(id).imports = imports;
        }

        // Step 2: resolve internal imports to nodes
        let mut edges = Vec::new();
        for &id in &graph.nodes {
            let node = graph.tree.node(id);
            for import in self.classifier.internal(&node.imports) {
                let target = resolve_target(&project_root, node.import_base_dir(), import)
                    .into_iter()
                    .filter_map(|path| graph.tree.find(&path))
                    .find(|target| working_set.contains(target));

                match target {
                    Some(target) if target != id => edges.push((id, target)),
                    Some(_) => {}
                    None => trace!("Unresolved import in {}: {}", node.name, import),
                }
            }
        }

        // Step 3: link
        for (from, to) in edges {
            graph.tree.add_dependency(from, to);
        }

        debug!(
            "Built dependency graph: {} nodes, {} edges",
            graph.nodes.len(),
            graph.edge_count()
        );
        graph
    }
}

/// Candidate node paths for an import, in preference order
fn resolve_target(project_root: &Path, base_dir: &Path, import: &ImportDeclaration) -> Vec<PathBuf> {
    let parts: Vec<&str> = import.components().collect();

    if import.is_relative() {
        let mut dir = base_dir.to_path_buf();
        for _ in 1..import.relative_level {
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => return Vec::new(),
            }
        }

        if parts.is_empty() {
            return package_candidate(&dir).into_iter().collect();
        }

        let target = parts.iter().fold(dir, |path, part| path.join(part));
        let mut candidates: Vec<PathBuf> = package_candidate(&target).into_iter().collect();
        candidates.push(module_file(&target));
        return candidates;
    }

    if parts.is_empty() {
        return Vec::new();
    }
    let target = parts
        .iter()
        .fold(project_root.to_path_buf(), |path, part| path.join(part));
    vec![module_file(&target)]
}

/// `<p>` when `<p>/__init__.py` exists
fn package_candidate(dir: &Path) -> Option<PathBuf> {
    dir.join("__init__.py").is_file().then(|| dir.to_path_buf())
}

/// `<p>.py`
fn module_file(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".py");
    PathBuf::from(name)
}
