// Graph analysis: cycle groups and processing order

use crate::analysis::graph::DependencyGraph;
use crate::analysis::tree::{CycleId, NodeId};
use crate::error::{Error, Result};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A processing order and how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedNodes {
    pub nodes: Vec<NodeId>,
    /// True when the members were not acyclic and were sorted by out-degree
    pub used_fallback: bool,
}

/// Petgraph view of `members`, with edges pointing from dependency to
/// dependent. Edges leaving the member set are ignored.
fn to_digraph(
    graph: &DependencyGraph,
    members: &[NodeId],
) -> (DiGraph<NodeId, ()>, HashMap<NodeId, NodeIndex>) {
    let mut digraph = DiGraph::with_capacity(members.len(), 0);
    let mut indices = HashMap::with_capacity(members.len());

    for &id in members {
        indices.entry(id).or_insert_with(|| digraph.add_node(id));
    }

    for &id in members {
        for dep in &graph.tree.node(id).dependencies {
            if let Some(&dep_idx) = indices.get(dep) {
                digraph.update_edge(dep_idx, indices[&id], ());
            }
        }
    }

    (digraph, indices)
}

/// Cycle groups of the working set, without touching the graph.
///
/// A group is a strongly connected component with at least two nodes, its
/// members in working-set order. Groups are sorted by their first member.
pub fn find_cycle_groups(graph: &DependencyGraph) -> Vec<Vec<NodeId>> {
    let position: HashMap<NodeId, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    let (digraph, _) = to_digraph(graph, &graph.nodes);
    let mut groups: Vec<Vec<NodeId>> = tarjan_scc(&digraph)
        .into_iter()
        .filter(|scc| scc.len() >= 2)
        .map(|scc| {
            let mut members: Vec<NodeId> = scc.into_iter().map(|idx| digraph[idx]).collect();
            members.sort_by_key(|id| position[id]);
            members
        })
        .collect();
    groups.sort_by_key(|group| position[&group[0]]);
    groups
}

/// Find the cycle groups of the working set and mark their members.
///
/// The member with the most dependencies represents its group (first in
/// working-set order on ties). Earlier marks are cleared first.
pub fn detect_cycles(graph: &mut DependencyGraph) -> &[Vec<NodeId>] {
    for &id in &graph.nodes {
        let node = graph.tree.node_mut(id);
        node.cycle_group = None;
        node.is_cycle_representative = false;
    }

    let groups = find_cycle_groups(graph);

    for (index, group) in groups.iter().enumerate() {
        let mut representative = group[0];
        for &member in group {
            graph.tree.node_mut(member).cycle_group = Some(CycleId(index));
            if graph.out_degree(member) > graph.out_degree(representative) {
                representative = member;
            }
        }
        graph.tree.node_mut(representative).is_cycle_representative = true;
        debug!(
            "Cycle group {} with {} members, represented by {}",
            index,
            group.len(),
            graph.tree.node(representative).name
        );
    }

    graph.cycles = groups;
    &graph.cycles
}

/// Order `members` so every dependency comes before its dependents
pub fn topological_order(graph: &DependencyGraph, members: &[NodeId]) -> Result<Vec<NodeId>> {
    let (digraph, _) = to_digraph(graph, members);

    toposort(&digraph, None)
        .map(|order| order.into_iter().map(|idx| digraph[idx]).collect())
        .map_err(|cycle| {
            let culprit = cycle.node_id();
            let names = tarjan_scc(&digraph)
                .into_iter()
                .find(|scc| scc.contains(&culprit))
                .unwrap_or_else(|| vec![culprit])
                .into_iter()
                .map(|idx| graph.tree.qualified_name(digraph[idx]))
                .collect();
            Error::CycleDetected(names)
        })
}

/// Members sorted by ascending number of dependencies, keeping the input
/// order among equals
pub fn fallback_order(graph: &DependencyGraph, members: &[NodeId]) -> Vec<NodeId> {
    let mut order = members.to_vec();
    order.sort_by_key(|&id| graph.out_degree(id));
    order
}

/// Topological order when possible, otherwise the fallback order
pub fn documentation_order(graph: &DependencyGraph, members: &[NodeId]) -> OrderedNodes {
    match topological_order(graph, members) {
        Ok(nodes) => OrderedNodes {
            nodes,
            used_fallback: false,
        },
        Err(e) => {
            warn!("{}; falling back to dependency-count order", e);
            OrderedNodes {
                nodes: fallback_order(graph, members),
                used_fallback: true,
            }
        }
    }
}

/// Detect cycles and record an order over the whole working set
pub fn analyze(graph: &mut DependencyGraph) -> OrderedNodes {
    detect_cycles(graph);
    let members = graph.nodes.clone();
    let ordered = documentation_order(graph, &members);
    graph.topological_order = ordered.nodes.clone();
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tree::{ModuleNode, ModuleTree};

    /// Root plus one module per name, without edges
    fn graph_with(names: &[&str]) -> (DependencyGraph, Vec<NodeId>) {
        let mut tree = ModuleTree::new(ModuleNode::new("/proj", "proj", false));
        let root = tree.root();
        let ids = names
            .iter()
            .map(|n| tree.add_child(root, ModuleNode::new(format!("/proj/{}.py", n), *n, false)))
            .collect();
        (DependencyGraph::new(tree), ids)
    }

    fn position(order: &[NodeId], id: NodeId) -> usize {
        order.iter().position(|&n| n == id).unwrap()
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let (mut graph, ids) = graph_with(&["utils", "models", "main"]);
        graph.tree.add_dependency(ids[1], ids[0]);
        graph.tree.add_dependency(ids[2], ids[1]);

        assert!(detect_cycles(&mut graph).is_empty());
        assert!(graph.nodes.iter().all(|&id| graph.tree.node(id).cycle_group.is_none()));
    }

    #[test]
    fn test_topological_order_respects_dependencies() {
        let (mut graph, ids) = graph_with(&["main", "models", "utils"]);
        let (main, models, utils) = (ids[0], ids[1], ids[2]);
        graph.tree.add_dependency(main, models);
        graph.tree.add_dependency(main, utils);
        graph.tree.add_dependency(models, utils);

        let order = topological_order(&graph, &ids).unwrap();
        assert_eq!(order, vec![utils, models, main]);
    }

    #[test]
    fn test_topological_order_ignores_outside_edges() {
        let (mut graph, ids) = graph_with(&["a", "b", "c"]);
        graph.tree.add_dependency(ids[0], ids[1]);
        graph.tree.add_dependency(ids[1], ids[0]);
        graph.tree.add_dependency(ids[2], ids[0]);

        // the cycle lies outside the member set
        let order = topological_order(&graph, &[ids[2]]).unwrap();
        assert_eq!(order, vec![ids[2]]);
    }

    #[test]
    fn test_two_node_cycle() {
        let (mut graph, ids) = graph_with(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        graph.tree.add_dependency(a, b);
        graph.tree.add_dependency(b, a);

        let cycles = detect_cycles(&mut graph).to_vec();
        assert_eq!(cycles, vec![vec![a, b]]);
        assert_eq!(graph.tree.node(a).cycle_group, Some(CycleId(0)));
        assert_eq!(graph.tree.node(b).cycle_group, Some(CycleId(0)));
        // tie on out-degree: first member wins
        assert!(graph.tree.node(a).is_cycle_representative);
        assert!(!graph.tree.node(b).is_cycle_representative);
    }

    #[test]
    fn test_representative_has_most_dependencies() {
        let (mut graph, ids) = graph_with(&["a", "b", "c", "d"]);
        let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
        graph.tree.add_dependency(a, b);
        graph.tree.add_dependency(b, c);
        graph.tree.add_dependency(c, a);
        graph.tree.add_dependency(c, d);

        detect_cycles(&mut graph);
        assert_eq!(graph.cycles, vec![vec![a, b, c]]);
        assert!(graph.tree.node(c).is_cycle_representative);
        assert_eq!(graph.tree.node(d).cycle_group, None);
    }

    #[test]
    fn test_cycle_membership_is_symmetric() {
        let (mut graph, ids) = graph_with(&["a", "b", "c", "x", "y"]);
        graph.tree.add_dependency(ids[0], ids[1]);
        graph.tree.add_dependency(ids[1], ids[2]);
        graph.tree.add_dependency(ids[2], ids[0]);
        graph.tree.add_dependency(ids[3], ids[4]);
        graph.tree.add_dependency(ids[4], ids[3]);

        detect_cycles(&mut graph);
        assert_eq!(graph.cycles.len(), 2);
        for group in &graph.cycles {
            let gid = graph.tree.node(group[0]).cycle_group;
            assert!(group.iter().all(|&m| graph.tree.node(m).cycle_group == gid));
            assert_eq!(
                group.iter().filter(|&&m| graph.tree.node(m).is_cycle_representative).count(),
                1
            );
        }
    }

    #[test]
    fn test_redetect_clears_old_marks() {
        let (mut graph, ids) = graph_with(&["a", "b"]);
        graph.tree.add_dependency(ids[0], ids[1]);
        graph.tree.add_dependency(ids[1], ids[0]);
        detect_cycles(&mut graph);

        graph.tree.remove_dependency(ids[1], ids[0]);
        assert!(detect_cycles(&mut graph).is_empty());
        assert!(!graph.tree.node(ids[0]).is_cycle_representative);
        assert!(graph.tree.node(ids[1]).cycle_group.is_none());
    }

    #[test]
    fn test_cycle_error_names_members() {
        let (mut graph, ids) = graph_with(&["a", "b"]);
        graph.tree.add_dependency(ids[0], ids[1]);
        graph.tree.add_dependency(ids[1], ids[0]);

        match topological_order(&graph, &ids) {
            Err(Error::CycleDetected(mut names)) => {
                names.sort();
                assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_order_is_stable_by_dependency_count() {
        let (mut graph, ids) = graph_with(&["a", "b", "c", "d"]);
        let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
        graph.tree.add_dependency(a, b);
        graph.tree.add_dependency(a, c);
        graph.tree.add_dependency(b, a);

        let order = fallback_order(&graph, &ids);
        assert_eq!(order, vec![c, d, b, a]);
    }

    #[test]
    fn test_documentation_order_falls_back_on_cycle() {
        let (mut graph, ids) = graph_with(&["a", "b"]);
        graph.tree.add_dependency(ids[0], ids[1]);
        graph.tree.add_dependency(ids[1], ids[0]);

        let ordered = documentation_order(&graph, &ids);
        assert!(ordered.used_fallback);
        assert_eq!(ordered.nodes.len(), 2);
    }

    #[test]
    fn test_analyze_records_order() {
        let (mut graph, ids) = graph_with(&["main", "utils"]);
        graph.tree.add_dependency(ids[0], ids[1]);

        let ordered = analyze(&mut graph);
        assert!(!ordered.used_fallback);
        assert_eq!(graph.topological_order.len(), 3);
        assert!(position(&graph.topological_order, ids[1]) < position(&graph.topological_order, ids[0]));
    }
}
