// Import classification for Python modules
//
// Decides whether an import refers to code inside the project (and may
// become a dependency edge) or to something outside it:
// - Relative imports are always internal
// - Standard library and well-known third-party packages are external
// - Modules found under the project root are internal
// - Anything else follows the configured policy

use crate::config::{AnalysisConfig, UnknownImportPolicy};
use crate::parser::ImportDeclaration;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Where an import points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportScope {
    /// Part of the project being documented
    Internal,
    /// Standard library or third-party package
    External,
}

/// Classifies imports relative to a project root
#[derive(Debug, Clone)]
pub struct ImportClassifier {
    project_root: PathBuf,
    known_external: HashSet<String>,
    unknown_policy: UnknownImportPolicy,
}

impl ImportClassifier {
    /// Create a classifier with the built-in external module set
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            known_external: Self::builtin_external_modules(),
            unknown_policy: UnknownImportPolicy::default(),
        }
    }

    /// Create a classifier honoring the analysis settings
    pub fn from_config(project_root: impl Into<PathBuf>, config: &AnalysisConfig) -> Self {
        Self::new(project_root)
            .with_known_external(config.known_external.iter().cloned())
            .with_unknown_policy(config.unknown_imports)
    }

    /// Add top-level module names to treat as external
    pub fn with_known_external(mut self, modules: impl IntoIterator<Item = String>) -> Self {
        self.known_external.extend(modules);
        self
    }

    pub fn with_unknown_policy(mut self, policy: UnknownImportPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Python standard library plus packages common enough to never be
    /// project code
    fn builtin_external_modules() -> HashSet<String> {
        let stdlib = [
            "abc", "aifc", "argparse", "array", "ast", "asynchat", "asyncio",
            "asyncore", "atexit", "audioop", "base64", "bdb", "binascii",
            "binhex", "bisect", "builtins", "bz2", "calendar", "cgi", "cgitb",
            "chunk", "cmath", "cmd", "code", "codecs", "codeop", "collections",
            "colorsys", "compileall", "concurrent", "configparser", "contextlib",
            "contextvars", "copy", "copyreg", "cProfile", "crypt", "csv",
            "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal",
            "difflib", "dis", "distutils", "doctest", "email", "encodings",
            "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput",
            "fnmatch", "fractions", "ftplib", "functools", "gc", "getopt",
            "getpass", "gettext", "glob", "graphlib", "grp", "gzip", "hashlib",
            "heapq", "hmac", "html", "http", "imaplib", "imghdr", "imp",
            "importlib", "inspect", "io", "ipaddress", "itertools", "json",
            "keyword", "lib2to3", "linecache", "locale", "logging", "lzma",
            "mailbox", "marshal", "math", "mimetypes", "mmap", "modulefinder",
            "multiprocessing", "netrc", "numbers", "operator", "optparse", "os",
            "pathlib", "pdb", "pickle", "pickletools", "pipes", "pkgutil",
            "platform", "plistlib", "poplib", "posix", "pprint", "profile",
            "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc", "queue",
            "quopri", "random", "re", "readline", "reprlib", "resource",
            "rlcompleter", "runpy", "sched", "secrets", "select", "selectors",
            "shelve", "shlex", "shutil", "signal", "site", "smtplib", "socket",
            "socketserver", "sqlite3", "ssl", "stat", "statistics", "string",
            "stringprep", "struct", "subprocess", "symtable", "sys", "sysconfig",
            "syslog", "tabnanny", "tarfile", "tempfile", "termios", "textwrap",
            "threading", "time", "timeit", "tkinter", "token", "tokenize",
            "tomllib", "trace", "traceback", "tracemalloc", "tty", "turtle",
            "types", "typing", "unicodedata", "unittest", "urllib", "uuid",
            "venv", "warnings", "wave", "weakref", "webbrowser", "winreg",
            "wsgiref", "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib",
            "typing_extensions", "_thread", "__future__",
        ];
        let third_party = [
            "pydantic", "numpy", "pandas", "matplotlib", "requests", "flask",
            "django", "sqlalchemy", "pytest", "mock", "pytest_mock", "yaml",
            "click", "attr", "attrs", "scipy", "sklearn", "torch", "google",
        ];
        stdlib
            .iter()
            .chain(third_party.iter())
            .map(|s| s.to_string())
            .collect()
    }

    /// Whether the top-level component of a module name is known external
    pub fn is_known_external(&self, module: &str) -> bool {
        let top_level = module.split('.').next().unwrap_or(module);
        self.known_external.contains(top_level)
    }

    /// Whether `<root>/<a/b/c>.py` or `<root>/<a/b/c>/__init__.py` exists
    pub fn exists_in_project(&self, module: &str) -> bool {
        if module.is_empty() {
            return false;
        }
        let base = module
            .split('.')
            .fold(self.project_root.clone(), |path, part| path.join(part));
        base.with_extension("py").is_file() || base.join("__init__.py").is_file()
    }

    /// Classify a single import declaration
    pub fn classify(&self, import: &ImportDeclaration) -> ImportScope {
        if import.is_relative() {
            return ImportScope::Internal;
        }

        if self.is_known_external(&import.module) {
            return ImportScope::External;
        }

        if self.exists_in_project(&import.module) {
            return ImportScope::Internal;
        }

        match self.unknown_policy {
            UnknownImportPolicy::Internal => ImportScope::Internal,
            UnknownImportPolicy::External => ImportScope::External,
        }
    }

    /// Imports of a node that may produce dependency edges
    pub fn internal<'a>(&self, imports: &'a [ImportDeclaration]) -> Vec<&'a ImportDeclaration> {
        imports
            .iter()
            .filter(|i| self.classify(i) == ImportScope::Internal)
            .collect()
    }

    /// Summarize a set of imports
    pub fn statistics<'a>(
        &self,
        imports: impl IntoIterator<Item = &'a ImportDeclaration>,
    ) -> ImportStatistics {
        let mut stats = ImportStatistics::default();
        for import in imports {
            stats.total += 1;
            if import.is_relative() {
                stats.relative += 1;
            }
            match self.classify(import) {
                ImportScope::Internal => stats.internal += 1,
                ImportScope::External => {
                    stats.external += 1;
                    stats.external_modules.insert(import.top_level().to_string());
                }
            }
        }
        stats
    }
}

/// Counts of imports by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStatistics {
    pub total: usize,
    pub relative: usize,
    pub internal: usize,
    pub external: usize,
    /// Top-level names of external modules, sorted
    pub external_modules: BTreeSet<String>,
}
