//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generate dependency-aware documentation for Python projects
#[derive(Parser, Debug)]
#[command(name = "genai-docs")]
#[command(about = "Generate dependency-aware documentation for Python projects")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Document a project, dependencies before dependents
    Generate {
        /// Path to the project root
        path: PathBuf,

        /// Mirror documentation under this directory instead of next to the sources
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Print the processing plan without generating anything
        #[arg(long)]
        dry_run: bool,

        /// Regenerate documentation even when cached or already present
        #[arg(short, long)]
        force: bool,

        /// Disable the documentation cache
        #[arg(long)]
        no_cache: bool,

        /// Document children before parents, ignoring imports
        #[arg(long)]
        no_dependency_graph: bool,

        /// Model name for the configured provider
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the dependency analysis of a project
    Graph {
        /// Path to the project root
        path: PathBuf,

        /// Report format
        #[arg(long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Json,
    Mermaid,
    /// Graphviz DOT
    Dot,
}
