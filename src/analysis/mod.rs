// Analysis module: module tree, imports and the dependency graph

pub mod analyzer;
pub mod graph;
pub mod imports;
pub mod metrics;
pub mod scanner;
pub mod tree;

pub use analyzer::{OrderedNodes, detect_cycles, documentation_order, fallback_order, find_cycle_groups, topological_order};
pub use graph::*;
pub use imports::*;
pub use metrics::*;
pub use scanner::{ProjectFile, TreeBuilder, read_project_files};
pub use tree::*;

use crate::config::AnalysisConfig;
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Runs the analysis pipeline: scan, extract imports, link, find cycles
pub struct ProjectAnalyzer {
    config: AnalysisConfig,
}

impl ProjectAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Scan the project into a module tree
    pub fn scan(&self, root: &Path) -> Result<ModuleTree> {
        TreeBuilder::from_config(&self.config)?.build(root)
    }

    /// Link the nodes of a scanned tree
    pub fn build_graph(&self, tree: ModuleTree) -> Result<DependencyGraph> {
        let root_path = tree.node(tree.root()).path.clone();
        let classifier = ImportClassifier::from_config(root_path, &self.config);
        let mut builder = DependencyGraphBuilder::new(classifier)?;
        Ok(builder.build(tree))
    }

    /// Scan, link and analyze a project
    pub fn analyze(&self, root: &Path) -> Result<(DependencyGraph, OrderedNodes)> {
        let tree = self.scan(root)?;
        let mut graph = self.build_graph(tree)?;
        let ordered = analyzer::analyze(&mut graph);

        info!(
            "Analyzed {} nodes, {} edges, {} cycle groups",
            graph.nodes.len(),
            graph.edge_count(),
            graph.cycles.len()
        );
        Ok((graph, ordered))
    }
}
