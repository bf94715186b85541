//! CLI module for genai-docs

mod args;

pub use args::{Args, Command, GraphFormat};

use crate::analysis::{ModuleTree, ProjectAnalyzer, detect_cycles, read_project_files};
use crate::cache::DocumentationCache;
use crate::config::{CliOverrides, Config};
use crate::docs::{DocumentationPlan, DocumentationReport, DocumentationScheduler, RunSummary, render_summary};
use crate::error::Result;
use crate::llm::{Documenter, LlmClient};
use crate::output::{DiagramGenerator, GraphReport, MarkdownWriter};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(args.verbose());

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.class(), e);
            ExitCode::FAILURE
        }
    }
}

impl Args {
    fn verbose(&self) -> bool {
        match &self.command {
            Command::Generate { verbose, .. } | Command::Graph { verbose, .. } => *verbose,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            path,
            output,
            config,
            verbose,
            dry_run,
            force,
            no_cache,
            no_dependency_graph,
            model,
        } => {
            let mut cfg = Config::discover(config.as_deref(), &path)?;
            cfg.apply_env();
            cfg.merge_cli(CliOverrides {
                output,
                model,
                no_cache,
                no_dependency_graph,
            });
            cfg.validate()?;

            let options = GenerateOptions {
                verbose,
                dry_run,
                force,
            };
            generate(&path, &cfg, options)
        }

        Command::Graph {
            path,
            format,
            config,
            verbose: _,
        } => {
            let mut cfg = Config::discover(config.as_deref(), &path)?;
            cfg.apply_env();
            cfg.validate()?;
            graph(&path, &cfg, format)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GenerateOptions {
    verbose: bool,
    dry_run: bool,
    force: bool,
}

fn generate(path: &Path, cfg: &Config, options: GenerateOptions) -> Result<()> {
    if !options.dry_run {
        cfg.require_api_key()?;
    }
    let analyzer = ProjectAnalyzer::new(cfg.analysis.clone());

    println!("Building module tree for {}", path.display());
    let tree = analyzer.scan(path)?;
    let root_path = tree.node(tree.root()).path.clone();
    let project_files = read_project_files(&root_path);
    let writer = MarkdownWriter::new().with_output_dir(cfg.output.directory.clone());

    if options.dry_run {
        return dry_run(&analyzer, cfg, tree, &writer);
    }

    let client = LlmClient::new(cfg.llm.clone())?;
    info!("Using {:?} model {}", cfg.llm.provider, client.model());

    let cache = if cfg.cache.enabled {
        Some(DocumentationCache::open(&cfg.cache_dir(&root_path)))
    } else {
        None
    };

    let mut scheduler = DocumentationScheduler::new(Documenter::new(client)?, writer)
        .with_cache(cache)
        .with_force(options.force)
        .with_verbose(options.verbose)
        .with_context_chars(cfg.output.context_chars)
        .with_project_name(cfg.project.name.clone());

    let (tree, summary) = if cfg.analysis.dependency_graph {
        let mut graph = analyzer.build_graph(tree)?;
        println!("\nDocumenting in dependency order...");
        let summary = scheduler.run_dependency_aware(&mut graph, &project_files)?;
        (graph.into_tree(), summary)
    } else {
        let mut tree = tree;
        println!("\nDocumenting bottom-up, leaves first...");
        let summary = scheduler.run_tree_order(&mut tree, &project_files)?;
        (tree, summary)
    };

    print_outcome(&tree, &summary);
    Ok(())
}

fn dry_run(
    analyzer: &ProjectAnalyzer,
    cfg: &Config,
    tree: ModuleTree,
    writer: &MarkdownWriter,
) -> Result<()> {
    let (tree, plan) = if cfg.analysis.dependency_graph {
        let mut graph = analyzer.build_graph(tree)?;
        detect_cycles(&mut graph);
        let plan = DocumentationPlan::dependency_aware(&graph);
        (graph.into_tree(), plan)
    } else {
        let plan = DocumentationPlan::tree_order(&tree);
        (tree, plan)
    };

    println!("\n--- DRY RUN: Documentation Plan ---");
    if plan.used_fallback {
        println!("(dependency order unavailable, sorted by dependency count)");
    }
    print!("{}", plan.render(&tree));

    println!("\nFiles that would be written:");
    for id in plan.sequence() {
        println!("  {}", writer.target_path(&tree, id).display());
    }

    println!("\nProject structure:");
    print!("{}", render_summary(&tree));
    Ok(())
}

fn print_outcome(tree: &ModuleTree, summary: &RunSummary) {
    println!("\n--- Documentation Complete ---");
    println!(
        "Generated: {}  Cached: {}  Skipped: {}",
        summary.generated, summary.cached, summary.skipped
    );
    if summary.cycle_groups > 0 {
        println!("Cycle groups documented as units: {}", summary.cycle_groups);
    }
    if summary.used_fallback {
        println!("Dependency order unavailable; sorted by dependency count");
    }

    println!("\nProject structure:");
    print!("{}", render_summary(tree));

    let report = DocumentationReport::from_tree(tree);
    println!();
    print!("{}", report.render());
    if report.is_complete() {
        println!("\nDocumentation generation completed successfully");
    } else {
        println!("\nDocumentation generation completed with issues");
    }
}

fn graph(path: &Path, cfg: &Config, format: GraphFormat) -> Result<()> {
    let analyzer = ProjectAnalyzer::new(cfg.analysis.clone());
    let (graph, ordered) = analyzer.analyze(path)?;

    match format {
        GraphFormat::Text => print!("{}", GraphReport::new(&graph, &ordered).render_text()),
        GraphFormat::Json => println!("{}", GraphReport::new(&graph, &ordered).to_json()?),
        GraphFormat::Mermaid => {
            println!("{}", DiagramGenerator::new().generate_dependency_graph(&graph))
        }
        GraphFormat::Dot => println!("{}", DiagramGenerator::new().generate_dot(&graph)),
    }
    Ok(())
}
