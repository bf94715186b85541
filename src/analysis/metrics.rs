// Metrics and health checks for dependency graphs
//
// Reports:
// - Node and edge counts
// - Dependencies per node (average, min, max, histogram)
// - Cycle groups, orphaned nodes and heavily coupled nodes

use crate::analysis::analyzer::find_cycle_groups;
use crate::analysis::graph::DependencyGraph;
use serde::Serialize;
use std::collections::BTreeMap;

/// Nodes with more dependencies than this get a warning
pub const MAX_DEPENDENCIES: usize = 10;

/// Summary numbers for a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphMetrics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub average_dependencies: f64,
    pub max_dependencies: usize,
    pub min_dependencies: usize,
    /// Number of dependencies -> number of nodes with that many
    pub dependency_distribution: BTreeMap<usize, usize>,
    pub cycle_count: usize,
}

impl GraphMetrics {
    /// Calculate metrics over the working set
    pub fn calculate(graph: &DependencyGraph) -> Self {
        if graph.nodes.is_empty() {
            return Self::default();
        }

        let counts: Vec<usize> = graph.nodes.iter().map(|&id| graph.out_degree(id)).collect();
        let total_edges: usize = counts.iter().sum();

        let mut dependency_distribution = BTreeMap::new();
        for &count in &counts {
            *dependency_distribution.entry(count).or_insert(0) += 1;
        }

        Self {
            total_nodes: counts.len(),
            total_edges,
            average_dependencies: total_edges as f64 / counts.len() as f64,
            max_dependencies: counts.iter().copied().max().unwrap_or(0),
            min_dependencies: counts.iter().copied().min().unwrap_or(0),
            dependency_distribution,
            cycle_count: find_cycle_groups(graph).len(),
        }
    }
}

/// Result of checking a dependency graph for problems
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphValidation {
    /// False when the graph contains cycle groups
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl GraphValidation {
    /// Validate the graph; cycles are found here, whether or not they were
    /// already marked
    pub fn validate(graph: &DependencyGraph) -> Self {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        for group in find_cycle_groups(graph) {
            let names: Vec<String> = group.iter().map(|&id| graph.tree.qualified_name(id)).collect();
            issues.push(format!("Circular dependency: {}", names.join(" <-> ")));
        }

        for &id in &graph.nodes {
            let node = graph.tree.node(id);
            let name = graph.tree.qualified_name(id);

            if !node.is_root && node.dependencies.is_empty() && node.dependents.is_empty() {
                warnings.push(format!("Orphaned node: {}", name));
            }

            if node.dependencies.len() > MAX_DEPENDENCIES {
                warnings.push(format!(
                    "High dependency count: {} has {} dependencies",
                    name,
                    node.dependencies.len()
                ));
            }
        }

        Self {
            is_valid: issues.is_empty(),
            issues,
            warnings,
        }
    }
}
