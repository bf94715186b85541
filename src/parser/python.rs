// Python import extraction using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::ImportDeclaration;
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Extracts import declarations from Python source without evaluating it
pub struct ImportExtractor {
    parser: Parser,
}

impl ImportExtractor {
    /// Create a new extractor with the Python grammar loaded
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::other(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Extract imports from a file the caller knows to be valid Python.
    /// Syntax errors are reported.
    pub fn extract_file(&mut self, path: &Path) -> Result<Vec<ImportDeclaration>> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
        })?;
        self.extract_from(&source, path)
    }

    /// Strict extraction: a syntax error yields `Error::Parse`
    pub fn extract(&mut self, source: &str) -> Result<Vec<ImportDeclaration>> {
        self.extract_from(source, Path::new("<source>"))
    }

    /// Lenient extraction for directory scans: unparseable input yields no
    /// imports instead of an error
    pub fn extract_lenient(&mut self, source: &str) -> Vec<ImportDeclaration> {
        match self.extract(source) {
            Ok(imports) => imports,
            Err(e) => {
                debug!("Ignoring imports of unparseable source: {}", e);
                Vec::new()
            }
        }
    }

    fn extract_from(&mut self, source: &str, path: &Path) -> Result<Vec<ImportDeclaration>> {
        let tree = self.parse_tree(source, path)?;
        let root = tree.root_node();

        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => {
                    let pos = node.start_position();
                    format!("invalid syntax at line {}, column {}", pos.row + 1, pos.column + 1)
                }
                None => "invalid syntax".to_string(),
            };
            return Err(Error::parse(PathBuf::from(path), message));
        }

        Ok(collect_imports(root, source.as_bytes()))
    }

    fn parse_tree(&mut self, source: &str, path: &Path) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(PathBuf::from(path), "parser produced no syntax tree"))
    }
}

/// Depth-first search for the first error or missing node
fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

/// Walk the whole tree in source order; imports nested in functions,
/// classes and conditionals are included
fn collect_imports(root: Node, source: &[u8]) -> Vec<ImportDeclaration> {
    let mut imports = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => imports.extend(parse_import(&node, source)),
            "import_from_statement" | "future_import_statement" => {
                imports.extend(parse_import_from(&node, source))
            }
            _ => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.children(&mut cursor).collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }

    imports
}

fn text<'a>(node: &Node, source: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

/// `(name, alias)` of an `aliased_import` node
fn parse_aliased(node: &Node, source: &[u8]) -> Option<(String, Option<String>)> {
    let mut name = None;
    let mut alias = None;
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" if name.is_none() => name = Some(text(&child, source)?.to_string()),
            "identifier" => {
                if name.is_none() {
                    name = Some(text(&child, source)?.to_string());
                } else {
                    alias = Some(text(&child, source)?.to_string());
                }
            }
            _ => {}
        }
    }

    name.map(|n| (n, alias))
}

/// Parse `import a.b as c, d`: one declaration per imported module
fn parse_import(node: &Node, source: &[u8]) -> Vec<ImportDeclaration> {
    let line = node.start_position().row + 1;
    let mut imports = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                if let Some(module) = text(&child, source) {
                    imports.push(ImportDeclaration::import(module, None, line));
                }
            }
            "aliased_import" => {
                if let Some((module, alias)) = parse_aliased(&child, source) {
                    imports.push(ImportDeclaration::import(&module, alias.as_deref(), line));
                }
            }
            _ => {}
        }
    }

    imports
}

/// Parse `from ..x import a as b, c`: one declaration per imported name
fn parse_import_from(node: &Node, source: &[u8]) -> Vec<ImportDeclaration> {
    let line = node.start_position().row + 1;
    let mut module = String::new();
    let mut level = 0;
    let mut names: Vec<(String, Option<String>)> = Vec::new();
    let mut seen_import_keyword = false;

    if node.kind() == "future_import_statement" {
        module = "__future__".to_string();
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import" => seen_import_keyword = true,
            "relative_import" => {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    match inner.kind() {
                        "import_prefix" => {
                            level = text(&inner, source)
                                .map(|dots| dots.chars().filter(|c| *c == '.').count())
                                .unwrap_or(0);
                        }
                        "dotted_name" => {
                            module = text(&inner, source).unwrap_or_default().to_string();
                        }
                        _ => {}
                    }
                }
            }
            "dotted_name" => {
                let Some(name) = text(&child, source) else { continue };
                if seen_import_keyword {
                    names.push((name.to_string(), None));
                } else {
                    module = name.to_string();
                }
            }
            "aliased_import" => {
                if let Some(pair) = parse_aliased(&child, source) {
                    names.push(pair);
                }
            }
            "wildcard_import" => names.push(("*".to_string(), None)),
            _ => {}
        }
    }

    names
        .into_iter()
        .map(|(item, alias)| {
            ImportDeclaration::from_import(&module, &item, alias.as_deref(), level, line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extract(source: &str) -> Vec<ImportDeclaration> {
        let mut extractor = ImportExtractor::new().unwrap();
        extractor.extract(source).unwrap()
    }

    #[test]
    fn test_extractor_new() {
        assert!(ImportExtractor::new().is_ok());
    }

    #[test]
    fn test_empty_source() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_simple_import() {
        let imports = extract("import os");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "os");
        assert!(!imports[0].is_from);
        assert!(!imports[0].is_relative());
        assert_eq!(imports[0].line, 1);
    }

    #[test]
    fn test_alias_kept_apart_from_module() {
        let imports = extract("import os as sys2");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "os");
        assert_eq!(imports[0].alias.as_deref(), Some("sys2"));
    }

    #[test]
    fn test_multiple_modules_in_one_statement() {
        let imports = extract("import os, numpy as np, xml.etree");
        let modules: Vec<_> = imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["os", "numpy", "xml.etree"]);
        assert_eq!(imports[1].alias.as_deref(), Some("np"));
        assert_eq!(imports[2].alias, None);
    }

    #[test]
    fn test_from_import() {
        let imports = extract("from os import path, getcwd as cwd");
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().all(|i| i.module == "os" && i.is_from));
        assert_eq!(imports[0].items, vec!["path".to_string()]);
        assert_eq!(imports[1].items, vec!["getcwd".to_string()]);
        assert_eq!(imports[1].alias.as_deref(), Some("cwd"));
    }

    #[test]
    fn test_relative_import_levels() {
        let imports = extract("from ..utils import helper\nfrom .models import User");
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].module, "utils");
        assert_eq!(imports[0].relative_level, 2);
        assert_eq!(imports[1].module, "models");
        assert_eq!(imports[1].relative_level, 1);
        assert_eq!(imports[1].line, 2);
    }

    #[test]
    fn test_bare_relative_import() {
        let imports = extract("from . import models");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "");
        assert_eq!(imports[0].relative_level, 1);
        assert!(imports[0].is_relative());
        assert_eq!(imports[0].items, vec!["models".to_string()]);
    }

    #[test]
    fn test_wildcard_import() {
        let imports = extract("from pkg.core import *");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].items, vec!["*".to_string()]);
    }

    #[test]
    fn test_parenthesized_from_import() {
        let imports = extract("from pkg import (\n    alpha,\n    beta,\n)");
        let items: Vec<_> = imports.iter().flat_map(|i| i.items.clone()).collect();
        assert_eq!(items, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_future_import() {
        let imports = extract("from __future__ import annotations");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "__future__");
    }

    #[test]
    fn test_nested_imports_are_found() {
        let source = r#"
import os

def load():
    import json
    if True:
        from .cache import store
    return json

class Loader:
    try:
        import yaml
    except ImportError:
        yaml = None
"#;
        let modules: Vec<_> = extract(source).into_iter().map(|i| i.module).collect();
        assert_eq!(modules, vec!["os", "json", "cache", "yaml"]);
    }

    #[test]
    fn test_strict_mode_reports_syntax_error() {
        let mut extractor = ImportExtractor::new().unwrap();
        let result = extractor.extract("import os\ndef broken(:\n    pass\n");
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_lenient_mode_returns_empty() {
        let mut extractor = ImportExtractor::new().unwrap();
        let imports = extractor.extract_lenient("import os\ndef broken(:\n    pass\n");
        assert!(imports.is_empty());
    }

    #[test]
    fn test_extract_file_names_path_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.py");
        std::fs::write(&path, "class (:\n").unwrap();

        let mut extractor = ImportExtractor::new().unwrap();
        let err = extractor.extract_file(&path).unwrap_err();
        assert!(err.to_string().contains("junk.py"));
    }

    #[test]
    fn test_extract_file_ok() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ok.py");
        std::fs::write(&path, "from .models import User\n").unwrap();

        let mut extractor = ImportExtractor::new().unwrap();
        let imports = extractor.extract_file(&path).unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "models");
    }
}
