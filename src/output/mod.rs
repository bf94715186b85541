// Output module: documentation files, diagrams and reports

pub mod diagrams;
pub mod export;
pub mod markdown;

pub use diagrams::*;
pub use export::*;
pub use markdown::*;

use crate::analysis::{ModuleTree, NodeId};
use crate::error::Result;
use std::path::PathBuf;

/// Destination for generated documentation
pub trait DocumentationSink {
    /// Persist the documentation of one node and return where it went
    fn save(&mut self, tree: &ModuleTree, id: NodeId, documentation: &str) -> Result<PathBuf>;
}
