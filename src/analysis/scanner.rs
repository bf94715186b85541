// Project scanner: builds the module tree from a directory

use crate::analysis::tree::{ModuleNode, ModuleTree, NodeId};
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory and file names never scanned
const IGNORED_NAMES: &[&str] = &[
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    ".idea",
    ".DS_Store",
    "node_modules",
    "build",
    "dist",
    ".pytest_cache",
    ".mypy_cache",
];

/// Project-level files fed to the project prompt, in prompt order
const PROJECT_FILES: &[&str] = &[
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "README.md",
    "README.rst",
    "requirements.txt",
    "requirements-dev.txt",
    "Pipfile",
    "poetry.lock",
];

/// A project-level file such as `README.md`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFile {
    pub name: String,
    pub content: String,
}

/// Builds a `ModuleTree` by walking a project directory
pub struct TreeBuilder {
    exclude: Vec<glob::Pattern>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            exclude: Vec::new(),
        }
    }

    /// Scanner honoring the configured exclude patterns
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { exclude })
    }

    /// Whether an entry name is skipped while scanning
    pub fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.')
            || IGNORED_NAMES.contains(&name)
            || self.exclude.iter().any(|p| p.matches(name))
    }

    /// Scan `root` into a tree. Directories containing `__init__.py` become
    /// packages; other directories are transparent and their modules attach
    /// to the nearest package above them.
    pub fn build(&self, root: &Path) -> Result<ModuleTree> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::InvalidPath(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        let root_is_package = root.join("__init__.py").is_file();

        let mut root_node = ModuleNode::new(&root, root_name, root_is_package);
        if root_is_package {
            root_node.content = Some(read_content(&root.join("__init__.py")));
        }
        let mut tree = ModuleTree::new(root_node);

        // Directory -> node its entries attach to
        let mut attach: HashMap<PathBuf, NodeId> = HashMap::new();
        attach.insert(root.clone(), tree.root());

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored_entry(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let Some(parent) = path.parent().and_then(|p| attach.get(p).copied()) else {
                continue;
            };

            if entry.file_type().is_dir() {
                let init = path.join("__init__.py");
                if init.is_file() {
                    let name = entry.file_name().to_string_lossy().to_string();
                    let mut node = ModuleNode::new(path, name.clone(), true);
                    node.content = Some(read_content(&init));
                    let id = tree.add_child(parent, node);
                    attach.insert(path.to_path_buf(), id);
                    debug!("Added package: {}", name);
                } else {
                    attach.insert(path.to_path_buf(), parent);
                }
            } else if is_python_module(path) {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let mut node = ModuleNode::new(path, name.clone(), false);
                node.content = Some(read_content(path));
                tree.add_child(parent, node);
                debug!("Added module: {}", name);
            }
        }

        info!(
            "Built module tree for {} with {} nodes",
            tree.node(tree.root()).name,
            tree.len()
        );
        Ok(tree)
    }

    fn is_ignored_entry(&self, entry: &DirEntry) -> bool {
        self.is_ignored(&entry.file_name().to_string_lossy())
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `.py` files other than `__init__.py`
fn is_python_module(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| ext == "py")
        && path.file_name().is_some_and(|name| name != "__init__.py")
}

/// File text, or a placeholder naming the file when it cannot be read
fn read_content(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            format!("# Error reading file: {}", path.display())
        }
    }
}

/// Read the project-level files present in `root`
pub fn read_project_files(root: &Path) -> Vec<ProjectFile> {
    PROJECT_FILES
        .iter()
        .filter_map(|name| {
            let path = root.join(name);
            if !path.is_file() {
                return None;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => Some(ProjectFile {
                    name: name.to_string(),
                    content,
                }),
                Err(e) => {
                    warn!("Could not read {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();

        // project/
        //   main.py
        //   app/__init__.py
        //   app/models.py
        //   scripts/tool.py        (plain directory)
        //   __pycache__/cached.py
        //   .hidden/secret.py
        let app = dir.path().join("app");
        let scripts = dir.path().join("scripts");
        let cache = dir.path().join("__pycache__");
        let hidden = dir.path().join(".hidden");
        for d in [&app, &scripts, &cache, &hidden] {
            fs::create_dir_all(d).unwrap();
        }
        fs::write(dir.path().join("main.py"), "import app").unwrap();
        fs::write(app.join("__init__.py"), "\"\"\"App package.\"\"\"").unwrap();
        fs::write(app.join("models.py"), "class User: pass").unwrap();
        fs::write(scripts.join("tool.py"), "print('hi')").unwrap();
        fs::write(cache.join("cached.py"), "").unwrap();
        fs::write(hidden.join("secret.py"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "not python").unwrap();

        dir
    }

    fn names(tree: &ModuleTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| tree.node(id).name.clone()).collect()
    }

    #[test]
    fn test_build_tree_structure() {
        let dir = create_test_project();
        let tree = TreeBuilder::new().build(dir.path()).unwrap();
        let root = tree.node(tree.root());

        assert!(root.is_root);
        assert!(!root.is_package);
        // sorted by file name; scripts/ is transparent
        assert_eq!(names(&tree, &root.children), vec!["app", "main", "tool"]);

        let app = tree.node(root.children[0]);
        assert!(app.is_package);
        assert_eq!(app.content.as_deref(), Some("\"\"\"App package.\"\"\""));
        assert_eq!(names(&tree, &app.children), vec!["models"]);
    }

    #[test]
    fn test_module_content_loaded() {
        let dir = create_test_project();
        let tree = TreeBuilder::new().build(dir.path()).unwrap();
        let main = tree
            .iter()
            .find(|(_, n)| n.name == "main")
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(tree.node(main).content.as_deref(), Some("import app"));
    }

    #[test]
    fn test_ignored_directories_skipped() {
        let dir = create_test_project();
        let tree = TreeBuilder::new().build(dir.path()).unwrap();
        assert!(tree.iter().all(|(_, n)| n.name != "cached" && n.name != "secret"));
    }

    #[test]
    fn test_only_ignored_content_gives_empty_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("__pycache__/x.py"), "").unwrap();

        let tree = TreeBuilder::new().build(dir.path()).unwrap();
        assert!(tree.node(tree.root()).children.is_empty());
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = create_test_project();
        let config = AnalysisConfig {
            exclude: vec!["scripts".to_string(), "mod*.py".to_string()],
            ..AnalysisConfig::default()
        };
        let tree = TreeBuilder::from_config(&config).unwrap().build(dir.path()).unwrap();
        assert!(tree.iter().all(|(_, n)| n.name != "tool" && n.name != "models"));
    }

    #[test]
    fn test_root_package() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("__init__.py"), "VERSION = 1").unwrap();
        fs::write(dir.path().join("core.py"), "").unwrap();

        let tree = TreeBuilder::new().build(dir.path()).unwrap();
        let root = tree.node(tree.root());
        assert!(root.is_package);
        assert_eq!(root.content.as_deref(), Some("VERSION = 1"));
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let result = TreeBuilder::new().build(Path::new("/nonexistent/project"));
        assert!(matches!(result, Err(Error::PathNotFound(_))));
    }

    #[test]
    fn test_file_root_is_invalid() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.py");
        fs::write(&file, "").unwrap();
        assert!(matches!(TreeBuilder::new().build(&file), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_read_project_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# Demo").unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]").unwrap();
        fs::write(dir.path().join("other.cfg"), "").unwrap();

        let files = read_project_files(dir.path());
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["pyproject.toml", "README.md"]);
        assert_eq!(files[1].content, "# Demo");
    }
}
