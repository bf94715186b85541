// Module tree: the arena of modules and packages of a project

use crate::parser::ImportDeclaration;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a node in a `ModuleTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Index into `DependencyGraph::cycles`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub usize);

/// Documentation progress of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocState {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for DocState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocState::Pending => "pending",
            DocState::InProgress => "in_progress",
            DocState::Completed => "completed",
            DocState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A Python module (`.py` file) or package (directory with `__init__.py`)
#[derive(Debug, Clone)]
pub struct ModuleNode {
    /// File path for modules, directory path for packages and the root
    pub path: PathBuf,
    pub name: String,
    pub is_package: bool,
    pub is_root: bool,
    pub children: Vec<NodeId>,
    /// Source text; `__init__.py` text for packages
    pub content: Option<String>,
    pub documentation: Option<String>,
    pub processed: bool,
    pub state: DocState,
    /// Nodes this one imports
    pub dependencies: Vec<NodeId>,
    /// Nodes importing this one
    pub dependents: Vec<NodeId>,
    pub imports: Vec<ImportDeclaration>,
    pub cycle_group: Option<CycleId>,
    pub is_cycle_representative: bool,
}

impl ModuleNode {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, is_package: bool) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_package,
            is_root: false,
            children: Vec::new(),
            content: None,
            documentation: None,
            processed: false,
            state: DocState::Pending,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            imports: Vec::new(),
            cycle_group: None,
            is_cycle_representative: false,
        }
    }

    /// The file whose text describes this node
    pub fn source_file(&self) -> PathBuf {
        if self.is_package {
            self.path.join("__init__.py")
        } else {
            self.path.clone()
        }
    }

    /// Directory that relative imports of this node start from
    pub fn import_base_dir(&self) -> &Path {
        if self.is_package || self.is_root {
            &self.path
        } else {
            self.path.parent().unwrap_or(&self.path)
        }
    }

    /// Documented, with non-empty text
    pub fn is_completed(&self) -> bool {
        self.processed
            && self
                .documentation
                .as_deref()
                .is_some_and(|doc| !doc.trim().is_empty())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_root {
            "Project"
        } else if self.is_package {
            "Package"
        } else {
            "Module"
        }
    }

    /// Record generated documentation
    pub fn complete(&mut self, documentation: String) {
        self.documentation = Some(documentation);
        self.processed = true;
        self.state = DocState::Completed;
    }
}

impl PartialEq for ModuleNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ModuleNode {}

/// Arena holding every node of a project, addressed by `NodeId`
#[derive(Debug, Clone)]
pub struct ModuleTree {
    nodes: Vec<ModuleNode>,
    index: HashMap<PathBuf, NodeId>,
    root: NodeId,
}

impl ModuleTree {
    /// Create a tree containing only the root node
    pub fn new(root: ModuleNode) -> Self {
        let mut root = root;
        root.is_root = true;
        let mut index = HashMap::new();
        index.insert(root.path.clone(), NodeId(0));
        Self {
            nodes: vec![root],
            index,
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &ModuleNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ModuleNode {
        &mut self.nodes[id.0]
    }

    /// Attach a node under `parent`. A node whose path is already present is
    /// not added again; the existing id is returned.
    pub fn add_child(&mut self, parent: NodeId, node: ModuleNode) -> NodeId {
        if let Some(&existing) = self.index.get(&node.path) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.path.clone(), id);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Look up a node by its path
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// All ids in arena order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ModuleNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Record that `from` imports `to`. Both edge lists are updated; adding
    /// an existing edge changes nothing.
    pub fn add_dependency(&mut self, from: NodeId, to: NodeId) {
        if !self.nodes[from.0].dependencies.contains(&to) {
            self.nodes[from.0].dependencies.push(to);
        }
        if !self.nodes[to.0].dependents.contains(&from) {
            self.nodes[to.0].dependents.push(from);
        }
    }

    /// Remove the edge `from -> to` from both edge lists
    pub fn remove_dependency(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].dependencies.retain(|&d| d != to);
        self.nodes[to.0].dependents.retain(|&d| d != from);
    }

    /// Pre-order traversal starting at the root
    pub fn flatten(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Children before parents, root last
    pub fn post_order(&self) -> Vec<NodeId> {
        fn visit(tree: &ModuleTree, id: NodeId, out: &mut Vec<NodeId>) {
            for &child in &tree.node(id).children {
                visit(tree, child, out);
            }
            out.push(id);
        }
        let mut order = Vec::with_capacity(self.nodes.len());
        visit(self, self.root, &mut order);
        order
    }

    /// Dotted name relative to the project root, e.g. `app.models.user`
    pub fn qualified_name(&self, id: NodeId) -> String {
        let node = self.node(id);
        if node.is_root {
            return node.name.clone();
        }
        let root_path = &self.node(self.root).path;
        let relative = node.path.strip_prefix(root_path).unwrap_or(&node.path);
        let mut parts: Vec<String> = relative
            .iter()
            .map(|c| c.to_string_lossy().to_string())
            .collect();
        if let Some(last) = parts.last_mut() {
            if let Some(stem) = last.strip_suffix(".py") {
                *last = stem.to_string();
            }
        }
        if parts.is_empty() {
            node.name.clone()
        } else {
            parts.join(".")
        }
    }

    /// Every node reachable through dependency edges
    pub fn transitive_dependencies(&self, id: NodeId) -> HashSet<NodeId> {
        self.reachable(id, |n| &n.dependencies)
    }

    /// Every node that reaches this one through dependency edges
    pub fn transitive_dependents(&self, id: NodeId) -> HashSet<NodeId> {
        self.reachable(id, |n| &n.dependents)
    }

    fn reachable(&self, start: NodeId, edges: impl Fn(&ModuleNode) -> &Vec<NodeId>) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = edges(self.node(start)).clone();
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(edges(self.node(id)).iter().copied());
            }
        }
        seen
    }

    /// Reset analysis results on every node
    pub fn clear_analysis(&mut self) {
        for node in &mut self.nodes {
            node.dependencies.clear();
            node.dependents.clear();
            node.imports.clear();
            node.cycle_group = None;
            node.is_cycle_representative = false;
        }
    }
}
