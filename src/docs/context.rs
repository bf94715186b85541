// Context handed to prompts: dependency summaries and child documentation

use crate::analysis::{ModuleTree, NodeId};
use crate::llm::ChildDoc;

/// Shorten documentation to at most `max_chars` characters
pub fn summarize(documentation: &str, max_chars: usize) -> String {
    let trimmed = documentation.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut summary: String = trimmed.chars().take(max_chars).collect();
    summary.push_str("...");
    summary
}

/// Summaries of the completed dependencies of a node.
///
/// Only generated documentation is used, never source text. Dependencies in
/// the node's own cycle group are left out. Returns an empty string when
/// there is nothing to report.
pub fn dependency_context(tree: &ModuleTree, id: NodeId, max_chars: usize) -> String {
    let node = tree.node(id);

    let entries: Vec<String> = node
        .dependencies
        .iter()
        .filter_map(|&dep| {
            let dep_node = tree.node(dep);
            if node.cycle_group.is_some() && dep_node.cycle_group == node.cycle_group {
                return None;
            }
            if !dep_node.is_completed() {
                return None;
            }
            let documentation = dep_node.documentation.as_deref()?;
            Some(format!(
                "**{}**: {}",
                tree.qualified_name(dep),
                summarize(documentation, max_chars)
            ))
        })
        .collect();

    if entries.is_empty() {
        String::new()
    } else {
        format!("\n\n**Dependencies:**\n{}", entries.join("\n"))
    }
}

/// Documentation of the completed direct children, in tree order
pub fn child_docs(tree: &ModuleTree, id: NodeId) -> Vec<ChildDoc> {
    tree.node(id)
        .children
        .iter()
        .filter_map(|&child| {
            let node = tree.node(child);
            if !node.is_completed() {
                return None;
            }
            Some(ChildDoc {
                name: node.name.clone(),
                documentation: node.documentation.clone()?,
            })
        })
        .collect()
}
