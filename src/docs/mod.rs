// Documentation generation: ordering, prompt context and the run loop

pub mod context;
pub mod plan;
pub mod report;
pub mod scheduler;

pub use context::{child_docs, dependency_context, summarize};
pub use plan::DocumentationPlan;
pub use report::{DocumentationReport, render_summary};
pub use scheduler::{DocumentationScheduler, RunSummary};
