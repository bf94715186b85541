// Post-run reporting: project structure and documentation coverage

use crate::analysis::{DocState, ModuleTree, NodeId};
use serde::Serialize;
use std::fmt::Write;

/// Documentation shorter than this is reported as suspiciously short
pub const SHORT_DOC_CHARS: usize = 50;

/// Indented outline of the project, children sorted by name
pub fn render_summary(tree: &ModuleTree) -> String {
    let mut out = String::new();
    render_node(tree, tree.root(), 0, &mut out);
    out
}

fn render_node(tree: &ModuleTree, id: NodeId, depth: usize, out: &mut String) {
    let node = tree.node(id);
    let _ = writeln!(out, "{}- {} ({})", "  ".repeat(depth), node.name, node.kind_label());

    let mut children = node.children.clone();
    children.sort_by(|a, b| tree.node(*a).name.cmp(&tree.node(*b).name));
    for child in children {
        render_node(tree, child, depth + 1, out);
    }
}

/// Coverage of a documentation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentationReport {
    pub total: usize,
    pub documented: usize,
    pub failed: Vec<String>,
    pub missing: Vec<String>,
    pub short: Vec<String>,
}

impl DocumentationReport {
    pub fn from_tree(tree: &ModuleTree) -> Self {
        let mut report = Self::default();

        for id in tree.flatten() {
            let node = tree.node(id);
            let name = if node.is_root {
                node.name.clone()
            } else {
                tree.qualified_name(id)
            };
            report.total += 1;

            if node.state == DocState::Failed {
                report.failed.push(name);
            } else if node.is_completed() {
                report.documented += 1;
                let length = node
                    .documentation
                    .as_deref()
                    .map(|d| d.trim().chars().count())
                    .unwrap_or(0);
                if length < SHORT_DOC_CHARS {
                    report.short.push(name);
                }
            } else {
                report.missing.push(name);
            }
        }

        report
    }

    pub fn is_complete(&self) -> bool {
        self.documented == self.total
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Documented {}/{} nodes", self.documented, self.total);
        for name in &self.failed {
            let _ = writeln!(out, "  failed: {}", name);
        }
        for name in &self.missing {
            let _ = writeln!(out, "  missing: {}", name);
        }
        for name in &self.short {
            let _ = writeln!(out, "  short: {}", name);
        }
        out
    }
}
