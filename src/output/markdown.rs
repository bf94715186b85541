// Markdown persistence for generated documentation

use crate::analysis::{ModuleTree, NodeId};
use crate::error::{Error, Result};
use crate::output::DocumentationSink;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used for packages, the root and lone modules
pub const DOC_FILE_NAME: &str = "DOCUMENTATION.md";

/// Writes `# <name> Documentation` files next to the sources, or mirrored
/// under an output directory
#[derive(Debug, Clone, Default)]
pub struct MarkdownWriter {
    output_dir: Option<PathBuf>,
}

impl MarkdownWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the project layout under `dir`
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Where the documentation of a node is written.
    ///
    /// Packages and the root get `DOCUMENTATION.md` in their directory. A
    /// module gets `DOCUMENTATION.md` only when it is the only module of a
    /// plain directory; otherwise `<name>_DOCUMENTATION.md`, so files never
    /// collide.
    pub fn target_path(&self, tree: &ModuleTree, id: NodeId) -> PathBuf {
        let node = tree.node(id);
        let root_dir = &tree.node(tree.root()).path;

        let (dir, file_name) = if node.is_package || node.is_root {
            (node.path.clone(), DOC_FILE_NAME.to_string())
        } else {
            let dir = node.path.parent().unwrap_or(root_dir).to_path_buf();
            let shared = dir == *root_dir
                || dir.join("__init__.py").exists()
                || count_modules(&dir) > 1;
            let file_name = if shared {
                format!("{}_{}", node.name, DOC_FILE_NAME)
            } else {
                DOC_FILE_NAME.to_string()
            };
            (dir, file_name)
        };

        let dir = match &self.output_dir {
            Some(out) => out.join(dir.strip_prefix(root_dir).unwrap_or(&dir)),
            None => dir,
        };
        dir.join(file_name)
    }
}

/// Number of `.py` files other than `__init__.py` in a directory
fn count_modules(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    let name = e.file_name();
                    let name = name.to_string_lossy();
                    name.ends_with(".py") && name != "__init__.py"
                })
                .count()
        })
        .unwrap_or(0)
}

impl DocumentationSink for MarkdownWriter {
    fn save(&mut self, tree: &ModuleTree, id: NodeId, documentation: &str) -> Result<PathBuf> {
        let path = self.target_path(tree, id);
        let name = &tree.node(id).name;

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::persistence(&path, e))?;
        }
        let text = format!("# {} Documentation\n\n{}", name, documentation);
        std::fs::write(&path, text).map_err(|e| Error::persistence(&path, e))?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
