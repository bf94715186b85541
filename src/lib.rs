//! genai-docs - Generate dependency-aware documentation for Python projects
//!
//! Scans a Python project into a module tree, links modules through their
//! imports, and documents every node with a language model so that each
//! module is written after the modules it depends on.

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod llm;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{DependencyGraph, ModuleNode, ModuleTree, NodeId, ProjectAnalyzer};
pub use cache::DocumentationCache;
pub use config::Config;
pub use docs::{DocumentationPlan, DocumentationScheduler, RunSummary};
pub use error::{Error, Result};
pub use llm::{Documenter, LlmClient, TextGenerator};
pub use output::{DocumentationSink, MarkdownWriter};
