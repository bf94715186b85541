// Diagram generation for dependency graphs
//
// Generates Mermaid flowcharts and Graphviz DOT files of module dependencies.

use crate::analysis::{DependencyGraph, NodeId};

/// Diagram generator for creating Mermaid and DOT diagrams
pub struct DiagramGenerator {
    /// Layout direction (TB, LR, BT, RL)
    direction: String,
}

impl DiagramGenerator {
    /// Create a new diagram generator
    pub fn new() -> Self {
        Self {
            direction: "TB".to_string(),
        }
    }

    /// Set layout direction
    pub fn with_direction(mut self, dir: &str) -> Self {
        self.direction = dir.to_string();
        self
    }

    /// Dependency graph with an arrow from each module to what it imports.
    /// Members of cycle groups get the `cycle` class.
    pub fn generate_dependency_graph(&self, graph: &DependencyGraph) -> String {
        let mut lines = Vec::new();
        lines.push(format!("graph {}", self.direction));

        for &id in &graph.nodes {
            let node = graph.tree.node(id);
            let safe_id = self.node_id(graph, id);
            let label = graph.tree.qualified_name(id);
            let shape = if node.is_root {
                format!("{}[[\"{}\"]]", safe_id, label)
            } else if node.is_package {
                format!("{}[/\"{}\"/]", safe_id, label)
            } else {
                format!("{}[\"{}\"]", safe_id, label)
            };
            let style = if node.cycle_group.is_some() { ":::cycle" } else { "" };
            lines.push(format!("    {}{}", shape, style));
        }

        for edge in graph.edges() {
            lines.push(format!(
                "    {} --> {}",
                self.node_id(graph, edge.from),
                self.node_id(graph, edge.to)
            ));
        }

        if !graph.cycles.is_empty() {
            lines.push("    classDef cycle fill:#fdd,stroke:#c33".to_string());
        }

        lines.join("\n")
    }

    /// Graphviz digraph of the same graph, nodes quoted by qualified name
    pub fn generate_dot(&self, graph: &DependencyGraph) -> String {
        let mut lines = vec![
            "digraph dependencies {".to_string(),
            format!("    rankdir={};", self.direction),
            "    node [shape=box];".to_string(),
        ];

        for &id in &graph.nodes {
            let node = graph.tree.node(id);
            let mut attributes = Vec::new();
            if node.is_root {
                attributes.push("shape=doubleoctagon");
            } else if node.is_package {
                attributes.push("shape=folder");
            }
            if node.cycle_group.is_some() {
                attributes.push("color=red");
            }
            let name = dot_quote(&graph.tree.qualified_name(id));
            if attributes.is_empty() {
                lines.push(format!("    {};", name));
            } else {
                lines.push(format!("    {} [{}];", name, attributes.join(", ")));
            }
        }

        for edge in graph.edges() {
            lines.push(format!(
                "    {} -> {};",
                dot_quote(&graph.tree.qualified_name(edge.from)),
                dot_quote(&graph.tree.qualified_name(edge.to))
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }

    fn node_id(&self, graph: &DependencyGraph, id: NodeId) -> String {
        if graph.tree.node(id).is_root {
            "project_root".to_string()
        } else {
            sanitize_id(&graph.tree.qualified_name(id))
        }
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn dot_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
