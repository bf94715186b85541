// Syntax-level records extracted from Python source files.
//
// These stay plain data: the extractor produces them, the classifier and
// graph builder only read them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One imported name of an `import` or `from ... import` statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    /// Dotted module name; empty for `from . import x`
    pub module: String,
    /// Local alias from an `as` clause
    pub alias: Option<String>,
    /// Whether this came from a `from ... import` statement
    pub is_from: bool,
    /// Names imported by the `from` form
    pub items: Vec<String>,
    /// 1-based line of the statement
    pub line: usize,
    /// Number of leading dots; 0 for absolute imports
    pub relative_level: usize,
}

impl ImportDeclaration {
    /// `import module [as alias]`
    pub fn import(module: &str, alias: Option<&str>, line: usize) -> Self {
        Self {
            module: module.to_string(),
            alias: alias.map(str::to_string),
            is_from: false,
            items: Vec::new(),
            line,
            relative_level: 0,
        }
    }

    /// `from [dots]module import item [as alias]`
    pub fn from_import(
        module: &str,
        item: &str,
        alias: Option<&str>,
        relative_level: usize,
        line: usize,
    ) -> Self {
        Self {
            module: module.to_string(),
            alias: alias.map(str::to_string),
            is_from: true,
            items: vec![item.to_string()],
            line,
            relative_level,
        }
    }

    pub fn is_relative(&self) -> bool {
        self.relative_level > 0
    }

    /// First component of the dotted module name
    pub fn top_level(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }

    /// Dotted module path split into components (empty for `from . import x`)
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.module.split('.').filter(|part| !part.is_empty())
    }
}

impl fmt::Display for ImportDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dots = ".".repeat(self.relative_level);
        if self.is_from {
            let items = if self.items.is_empty() {
                "*".to_string()
            } else {
                self.items.join(", ")
            };
            write!(f, "from {}{} import {}", dots, self.module, items)?;
        } else {
            write!(f, "import {}", self.module)?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " as {}", alias)?;
        }
        Ok(())
    }
}
