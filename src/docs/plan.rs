// Processing plans: the order in which nodes are documented

use crate::analysis::{DependencyGraph, ModuleTree, NodeId, documentation_order};
use std::fmt::Write;

/// Order of documentation for one run.
///
/// Nodes outside cycles come first (dependencies before dependents when
/// possible), then each cycle group as a unit with its representative first,
/// then the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationPlan {
    pub ordered: Vec<NodeId>,
    /// True when `ordered` is sorted by dependency count instead of topologically
    pub used_fallback: bool,
    pub cycle_groups: Vec<Vec<NodeId>>,
    pub root: NodeId,
}

impl DocumentationPlan {
    /// Plan from an analyzed graph; cycle detection must have run
    pub fn dependency_aware(graph: &DependencyGraph) -> Self {
        let root = graph.root();
        let members: Vec<NodeId> = graph
            .nodes
            .iter()
            .copied()
            .filter(|&id| id != root && graph.tree.node(id).cycle_group.is_none())
            .collect();
        let ordered = documentation_order(graph, &members);

        let cycle_groups = graph
            .cycles
            .iter()
            .map(|group| {
                let mut members: Vec<NodeId> =
                    group.iter().copied().filter(|&id| id != root).collect();
                if let Some(pos) = members
                    .iter()
                    .position(|&id| graph.tree.node(id).is_cycle_representative)
                {
                    let representative = members.remove(pos);
                    members.insert(0, representative);
                }
                members
            })
            .filter(|members| !members.is_empty())
            .collect();

        Self {
            ordered: ordered.nodes,
            used_fallback: ordered.used_fallback,
            cycle_groups,
            root,
        }
    }

    /// Children before parents, root last
    pub fn tree_order(tree: &ModuleTree) -> Self {
        let root = tree.root();
        Self {
            ordered: tree.post_order().into_iter().filter(|&id| id != root).collect(),
            used_fallback: false,
            cycle_groups: Vec::new(),
            root,
        }
    }

    /// Every node in processing order
    pub fn sequence(&self) -> Vec<NodeId> {
        let mut all = self.ordered.clone();
        all.extend(self.cycle_groups.iter().flatten().copied());
        all.push(self.root);
        all
    }

    pub fn len(&self) -> usize {
        self.ordered.len() + self.cycle_groups.iter().map(Vec::len).sum::<usize>() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Numbered listing for dry runs
    pub fn render(&self, tree: &ModuleTree) -> String {
        let mut out = String::new();
        let mut step = 0;
        let mut line = |out: &mut String, label: String| {
            step += 1;
            let _ = writeln!(out, "{:>4}. {}", step, label);
        };

        for &id in &self.ordered {
            let node = tree.node(id);
            line(&mut out, format!("{} ({})", tree.qualified_name(id), node.kind_label()));
        }
        for (index, group) in self.cycle_groups.iter().enumerate() {
            for (i, &id) in group.iter().enumerate() {
                let role = if i == 0 { ", representative" } else { "" };
                line(
                    &mut out,
                    format!(
                        "{} ({}, cycle group {}{})",
                        tree.qualified_name(id),
                        tree.node(id).kind_label(),
                        index + 1,
                        role
                    ),
                );
            }
        }
        line(&mut out, format!("{} (Project)", tree.node(self.root).name));
        out
    }
}
