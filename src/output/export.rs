// Analysis report for the `graph` command (text and JSON)

use crate::analysis::{DependencyGraph, GraphMetrics, GraphValidation, OrderedNodes};
use crate::error::Result;
use serde::Serialize;
use std::fmt::Write;

/// A node as exported in the report
#[derive(Debug, Clone, Serialize)]
pub struct ExportedNode {
    pub name: String,
    pub kind: &'static str,
    pub path: String,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub cycle_group: Option<usize>,
    pub is_cycle_representative: bool,
}

/// Everything the analysis knows about a project, by qualified name
#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    pub project: String,
    pub nodes: Vec<ExportedNode>,
    pub order: Vec<String>,
    pub used_fallback: bool,
    pub cycles: Vec<Vec<String>>,
    pub metrics: GraphMetrics,
    pub validation: GraphValidation,
}

impl GraphReport {
    pub fn new(graph: &DependencyGraph, ordered: &OrderedNodes) -> Self {
        let name = |id| graph.tree.qualified_name(id);

        let nodes = graph
            .nodes
            .iter()
            .map(|&id| {
                let node = graph.tree.node(id);
                ExportedNode {
                    name: name(id),
                    kind: node.kind_label(),
                    path: node.path.display().to_string(),
                    dependencies: node.dependencies.iter().map(|&d| name(d)).collect(),
                    dependents: node.dependents.iter().map(|&d| name(d)).collect(),
                    cycle_group: node.cycle_group.map(|c| c.0),
                    is_cycle_representative: node.is_cycle_representative,
                }
            })
            .collect();

        Self {
            project: graph.tree.node(graph.root()).name.clone(),
            nodes,
            order: ordered.nodes.iter().map(|&id| name(id)).collect(),
            used_fallback: ordered.used_fallback,
            cycles: graph
                .cycles
                .iter()
                .map(|group| group.iter().map(|&id| name(id)).collect())
                .collect(),
            metrics: GraphMetrics::calculate(graph),
            validation: GraphValidation::validate(graph),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Project: {}", self.project);
        let _ = writeln!(
            out,
            "Nodes: {}  Edges: {}  Cycles: {}",
            self.metrics.total_nodes, self.metrics.total_edges, self.metrics.cycle_count
        );
        let _ = writeln!(
            out,
            "Dependencies per node: avg {:.2}, min {}, max {}",
            self.metrics.average_dependencies,
            self.metrics.min_dependencies,
            self.metrics.max_dependencies
        );

        let _ = writeln!(
            out,
            "\nProcessing order{}:",
            if self.used_fallback { " (fallback)" } else { "" }
        );
        for (i, name) in self.order.iter().enumerate() {
            let _ = writeln!(out, "  {:>3}. {}", i + 1, name);
        }

        if !self.cycles.is_empty() {
            let _ = writeln!(out, "\nCycle groups:");
            for group in &self.cycles {
                let _ = writeln!(out, "  - {}", group.join(" <-> "));
            }
        }

        let _ = writeln!(
            out,
            "\nValidation: {}",
            if self.validation.is_valid { "ok" } else { "invalid" }
        );
        for issue in &self.validation.issues {
            let _ = writeln!(out, "  issue: {}", issue);
        }
        for warning in &self.validation.warnings {
            let _ = writeln!(out, "  warning: {}", warning);
        }

        out
    }
}
