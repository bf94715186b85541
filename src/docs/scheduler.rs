// Documentation scheduler: drives generation bottom-up

use crate::analysis::{DependencyGraph, DocState, ModuleTree, NodeId, ProjectFile, detect_cycles};
use crate::cache::DocumentationCache;
use crate::docs::context::{child_docs, dependency_context};
use crate::docs::plan::DocumentationPlan;
use crate::error::{Error, Result};
use crate::llm::{Documenter, TextGenerator};
use crate::output::DocumentationSink;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Nodes sent to the generator
    pub generated: usize,
    /// Nodes served from the cache
    pub cached: usize,
    /// Nodes already documented and left alone
    pub skipped: usize,
    /// Files written, in order
    pub written: Vec<PathBuf>,
    pub used_fallback: bool,
    pub cycle_groups: usize,
}

/// Generates and persists documentation node by node.
///
/// A node is documented only after everything it is ordered after; the first
/// failure stops the run and leaves the node marked `Failed`.
pub struct DocumentationScheduler<G, S> {
    documenter: Documenter<G>,
    sink: S,
    cache: Option<DocumentationCache>,
    force: bool,
    verbose: bool,
    context_chars: usize,
    project_name: Option<String>,
    /// Nodes generated (not served from the cache) during the current run
    regenerated: HashSet<NodeId>,
}

impl<G: TextGenerator, S: DocumentationSink> DocumentationScheduler<G, S> {
    pub fn new(documenter: Documenter<G>, sink: S) -> Self {
        Self {
            documenter,
            sink,
            cache: None,
            force: false,
            verbose: false,
            context_chars: 2000,
            project_name: None,
            regenerated: HashSet::new(),
        }
    }

    pub fn with_cache(mut self, cache: Option<DocumentationCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Regenerate nodes that are already documented, bypassing the cache
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Show a progress bar
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_context_chars(mut self, chars: usize) -> Self {
        self.context_chars = chars;
        self
    }

    /// Name used in the project prompt instead of the root directory name
    pub fn with_project_name(mut self, name: Option<String>) -> Self {
        self.project_name = name;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn cache(&self) -> Option<&DocumentationCache> {
        self.cache.as_ref()
    }

    pub fn documenter(&self) -> &Documenter<G> {
        &self.documenter
    }

    /// Document a graph in dependency order: plain nodes, then cycle groups,
    /// then the root
    pub fn run_dependency_aware(
        &mut self,
        graph: &mut DependencyGraph,
        project_files: &[ProjectFile],
    ) -> Result<RunSummary> {
        self.regenerated.clear();
        detect_cycles(graph);
        let plan = DocumentationPlan::dependency_aware(graph);
        graph.topological_order = plan.ordered.clone();

        if plan.used_fallback {
            warn!("Dependency order unavailable; documenting by dependency count");
        }
        info!(
            "Documenting {} nodes ({} cycle groups)",
            plan.len(),
            plan.cycle_groups.len()
        );

        let mut summary = RunSummary {
            used_fallback: plan.used_fallback,
            cycle_groups: plan.cycle_groups.len(),
            ..RunSummary::default()
        };
        let progress = self.progress_bar(plan.len());

        for &id in &plan.ordered {
            self.document_node(&mut graph.tree, id, project_files, true, &mut summary, &progress)?;
        }

        for group in &plan.cycle_groups {
            debug!("Documenting cycle group of {} nodes", group.len());
            for &id in group {
                self.document_node(&mut graph.tree, id, project_files, true, &mut summary, &progress)?;
            }
        }

        self.document_node(&mut graph.tree, plan.root, project_files, false, &mut summary, &progress)?;

        if let Some(pb) = progress {
            pb.finish_with_message("Documentation complete");
        }
        Ok(summary)
    }

    /// Document a tree children-first, without dependency context
    pub fn run_tree_order(
        &mut self,
        tree: &mut ModuleTree,
        project_files: &[ProjectFile],
    ) -> Result<RunSummary> {
        self.regenerated.clear();
        let plan = DocumentationPlan::tree_order(tree);
        info!("Documenting {} nodes in tree order", plan.len());

        let mut summary = RunSummary::default();
        let progress = self.progress_bar(plan.len());

        for id in plan.sequence() {
            self.document_node(tree, id, project_files, false, &mut summary, &progress)?;
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Documentation complete");
        }
        Ok(summary)
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    }

    fn document_node(
        &mut self,
        tree: &mut ModuleTree,
        id: NodeId,
        project_files: &[ProjectFile],
        with_dependencies: bool,
        summary: &mut RunSummary,
        progress: &Option<ProgressBar>,
    ) -> Result<()> {
        let name = tree.qualified_name(id);
        if let Some(pb) = progress {
            pb.set_message(name.clone());
        }

        if tree.node(id).is_completed() && !self.force {
            debug!("Skipping {}: already documented", name);
            summary.skipped += 1;
            if let Some(pb) = progress {
                pb.inc(1);
            }
            return Ok(());
        }

        tree.node_mut(id).state = DocState::InProgress;
        let context = if with_dependencies {
            dependency_context(tree, id, self.context_chars)
        } else {
            String::new()
        };

        let outcome = self
            .produce(tree, id, project_files, &context)
            .and_then(|(documentation, from_cache)| {
                let path = self.sink.save(tree, id, &documentation)?;
                Ok((documentation, from_cache, path))
            });

        let (documentation, from_cache, path) = match outcome {
            Ok(done) => done,
            Err(e) => {
                tree.node_mut(id).state = DocState::Failed;
                return Err(Error::generation(name, e));
            }
        };

        if from_cache {
            summary.cached += 1;
        } else {
            summary.generated += 1;
            self.regenerated.insert(id);
            self.remember(tree, id, &documentation);
        }
        info!("Documented {} -> {}", name, path.display());
        summary.written.push(path);
        tree.node_mut(id).complete(documentation);

        if let Some(pb) = progress {
            pb.inc(1);
        }
        Ok(())
    }

    /// Cached text when valid, otherwise a generation call
    fn produce(
        &self,
        tree: &ModuleTree,
        id: NodeId,
        project_files: &[ProjectFile],
        context: &str,
    ) -> Result<(String, bool)> {
        let node = tree.node(id);

        if self.cacheable(tree, id) {
            if let Some(cache) = &self.cache {
                let key = node.path.display().to_string();
                if let Some(documentation) = cache.lookup(&key, &node.source_file()) {
                    debug!("Cache hit for {}", node.name);
                    return Ok((documentation, true));
                }
            }
        }

        let prompt = self.prompt_for(tree, id, project_files, context)?;
        let documentation = self.documenter.generate(&prompt)?;
        Ok((documentation, false))
    }

    /// Whether the cache may answer for a node. The root is built from its
    /// children's documentation and is never cached; a package is not
    /// either once one of its children was regenerated in this run.
    fn cacheable(&self, tree: &ModuleTree, id: NodeId) -> bool {
        let node = tree.node(id);
        if self.force || node.is_root {
            return false;
        }
        !node.is_package || !node.children.iter().any(|c| self.regenerated.contains(c))
    }

    fn prompt_for(
        &self,
        tree: &ModuleTree,
        id: NodeId,
        project_files: &[ProjectFile],
        context: &str,
    ) -> Result<String> {
        let node = tree.node(id);
        let name = tree.qualified_name(id);

        if node.is_root {
            let project_name = self.project_name.as_deref().unwrap_or(&node.name);
            self.documenter
                .project_prompt(project_name, project_files, &child_docs(tree, id))
        } else if node.is_package {
            let pending = node
                .children
                .iter()
                .filter(|&&c| !tree.node(c).is_completed())
                .count();
            if pending > 0 {
                debug!(
                    "Package {} documented before {} of its children; they are left out",
                    name, pending
                );
            }
            self.documenter.package_prompt(
                &name,
                &child_docs(tree, id),
                node.content.as_deref(),
                context,
            )
        } else {
            self.documenter
                .module_prompt(&name, node.content.as_deref(), context)
        }
    }

    fn remember(&mut self, tree: &ModuleTree, id: NodeId, documentation: &str) {
        let Some(cache) = self.cache.as_mut() else {
            return;
        };
        let node = tree.node(id);
        let source = node.source_file();
        if node.is_root || !source.is_file() {
            return;
        }
        let key = node.path.display().to_string();
        if let Err(e) = cache.store(&key, &source, documentation) {
            warn!("Could not update cache for {}: {}", node.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ModuleNode;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Answers `Docs for <first line>` and remembers every prompt
    #[derive(Default)]
    struct Recorder {
        prompts: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl TextGenerator for Recorder {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            if let Some(marker) = self.fail_on {
                if prompt.contains(marker) {
                    return Err(Error::llm("quota exhausted"));
                }
            }
            let title = prompt.lines().next().unwrap_or_default();
            Ok(format!("Docs for {}", title))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Vec<(String, String)>,
    }

    impl DocumentationSink for MemorySink {
        fn save(&mut self, tree: &ModuleTree, id: NodeId, documentation: &str) -> Result<PathBuf> {
            let name = tree.qualified_name(id);
            self.saved.push((name.clone(), documentation.to_string()));
            Ok(PathBuf::from(format!("{}.md", name)))
        }
    }

    fn scheduler(generator: Recorder) -> DocumentationScheduler<Recorder, MemorySink> {
        DocumentationScheduler::new(Documenter::new(generator).unwrap(), MemorySink::default())
    }

    fn names(sink: &MemorySink) -> Vec<&str> {
        sink.saved.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn layered_graph() -> (DependencyGraph, Vec<NodeId>) {
        let mut tree = ModuleTree::new(ModuleNode::new("/proj", "proj", false));
        let root = tree.root();
        let main = tree.add_child(root, ModuleNode::new("/proj/main.py", "main", false));
        let models = tree.add_child(root, ModuleNode::new("/proj/models.py", "models", false));
        let utils = tree.add_child(root, ModuleNode::new("/proj/utils.py", "utils", false));
        tree.node_mut(utils).content = Some("def helper(): pass".to_string());
        tree.add_dependency(main, models);
        tree.add_dependency(main, utils);
        tree.add_dependency(models, utils);
        (DependencyGraph::new(tree), vec![main, models, utils])
    }

    #[test]
    fn test_dependencies_documented_first() {
        let (mut graph, ids) = layered_graph();
        let mut scheduler = scheduler(Recorder::default());

        let summary = scheduler.run_dependency_aware(&mut graph, &[]).unwrap();

        assert_eq!(names(scheduler.sink()), vec!["utils", "models", "main", "proj"]);
        assert_eq!(summary.generated, 4);
        assert_eq!(summary.written.len(), 4);
        assert!(!summary.used_fallback);
        assert_eq!(graph.topological_order, vec![ids[2], ids[1], ids[0]]);
        assert!(graph.tree.iter().all(|(_, n)| n.state == DocState::Completed));
    }

    #[test]
    fn test_prompt_carries_dependency_docs_not_source() {
        let (mut graph, _) = layered_graph();
        let mut scheduler = scheduler(Recorder::default());
        scheduler.run_dependency_aware(&mut graph, &[]).unwrap();

        let prompts = scheduler.documenter().generator().prompts.borrow();
        let models_prompt = &prompts[1];
        assert!(models_prompt.contains("\"models\""));
        assert!(models_prompt.contains("**utils**: Docs for"));
        assert!(!models_prompt.contains("**main**"));

        let main_prompt = &prompts[2];
        assert!(main_prompt.contains("**Dependencies:**"));
        assert!(main_prompt.contains("**models**"));
        assert!(main_prompt.contains("**utils**"));
        assert!(!main_prompt.contains("def helper"));
    }

    #[test]
    fn test_cycle_group_after_acyclic_nodes() {
        let mut tree = ModuleTree::new(ModuleNode::new("/proj", "proj", false));
        let root = tree.root();
        let a = tree.add_child(root, ModuleNode::new("/proj/a.py", "a", false));
        let b = tree.add_child(root, ModuleNode::new("/proj/b.py", "b", false));
        let c = tree.add_child(root, ModuleNode::new("/proj/c.py", "c", false));
        tree.add_dependency(a, b);
        tree.add_dependency(b, a);
        tree.add_dependency(a, c);
        let mut graph = DependencyGraph::new(tree);
        let mut scheduler = scheduler(Recorder::default());

        let summary = scheduler.run_dependency_aware(&mut graph, &[]).unwrap();

        assert_eq!(names(scheduler.sink()), vec!["c", "a", "b", "proj"]);
        assert_eq!(summary.cycle_groups, 1);
        let prompts = scheduler.documenter().generator().prompts.borrow();
        // a sees c but not its cycle partner b
        assert!(prompts[1].contains("**c**"));
        assert!(!prompts[1].contains("**b**"));
        assert!(!prompts[2].contains("**a**"));
    }

    #[test]
    fn test_failure_stops_run_and_marks_node() {
        let (mut graph, ids) = layered_graph();
        let generator = Recorder {
            fail_on: Some("models"),
            ..Recorder::default()
        };
        let mut scheduler = scheduler(generator);

        let err = scheduler.run_dependency_aware(&mut graph, &[]).unwrap_err();

        assert!(err.is_generation_failure());
        assert!(err.to_string().contains("models"));
        assert_eq!(graph.tree.node(ids[1]).state, DocState::Failed);
        assert_eq!(graph.tree.node(ids[0]).state, DocState::Pending);
        assert_eq!(names(scheduler.sink()), vec!["utils"]);
    }

    #[test]
    fn test_completed_nodes_are_skipped_unless_forced() {
        let (mut graph, ids) = layered_graph();
        graph.tree.node_mut(ids[2]).complete("Existing".to_string());

        let mut plain = scheduler(Recorder::default());
        let summary = plain.run_dependency_aware(&mut graph, &[]).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.generated, 3);
        assert_eq!(graph.tree.node(ids[2]).documentation.as_deref(), Some("Existing"));

        let mut forced = scheduler(Recorder::default()).with_force(true);
        let summary = forced.run_dependency_aware(&mut graph, &[]).unwrap();
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.generated, 4);
    }

    #[test]
    fn test_cache_hit_skips_generation() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("utils.py");
        std::fs::write(&source, "X = 1\n").unwrap();

        let mut tree = ModuleTree::new(ModuleNode::new(dir.path(), "proj", false));
        let root = tree.root();
        let utils = tree.add_child(root, ModuleNode::new(&source, "utils", false));
        let cache_dir = dir.path().join(".cache");
        let mut cache = DocumentationCache::open(&cache_dir);
        cache
            .store(&source.display().to_string(), &source, "Cached utils")
            .unwrap();

        let mut scheduler = scheduler(Recorder::default()).with_cache(Some(cache));
        let mut graph = DependencyGraph::new(tree);
        let summary = scheduler.run_dependency_aware(&mut graph, &[]).unwrap();

        assert_eq!(summary.cached, 1);
        assert_eq!(summary.generated, 1);
        assert_eq!(graph.tree.node(utils).documentation.as_deref(), Some("Cached utils"));
        assert_eq!(scheduler.sink().saved[0].1, "Cached utils");
        assert_eq!(scheduler.documenter().generator().prompts.borrow().len(), 1);
    }

    #[test]
    fn test_generated_docs_are_cached() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("utils.py");
        std::fs::write(&source, "X = 1\n").unwrap();

        let mut tree = ModuleTree::new(ModuleNode::new(dir.path(), "proj", false));
        let root = tree.root();
        tree.add_child(root, ModuleNode::new(&source, "utils", false));
        let cache = DocumentationCache::open(&dir.path().join(".cache"));

        let mut scheduler = scheduler(Recorder::default()).with_cache(Some(cache));
        scheduler.run_tree_order(&mut tree, &[]).unwrap();

        let cache = scheduler.cache().unwrap();
        assert!(cache.is_cached(&source.display().to_string(), &source));
        // the root is a directory and is never cached
        assert_eq!(cache.stats().total_entries, 1);
    }

    fn package_project(dir: &std::path::Path) -> ModuleTree {
        let mut tree = ModuleTree::new(ModuleNode::new(dir, "proj", true));
        let root = tree.root();
        let pkg = tree.add_child(root, ModuleNode::new(dir.join("pkg"), "pkg", true));
        tree.add_child(pkg, ModuleNode::new(dir.join("pkg/a.py"), "a", false));
        tree.add_child(root, ModuleNode::new(dir.join("b.py"), "b", false));
        tree
    }

    fn run_cached(dir: &std::path::Path) -> (RunSummary, Vec<String>) {
        let mut tree = package_project(dir);
        let cache = DocumentationCache::open(&dir.join(".cache"));
        let mut scheduler = scheduler(Recorder::default()).with_cache(Some(cache));
        let summary = scheduler.run_tree_order(&mut tree, &[]).unwrap();
        let saved = scheduler.sink().saved.iter().map(|(n, _)| n.clone()).collect();
        let prompts = scheduler.documenter().generator().prompts.borrow().len();
        assert_eq!(prompts, summary.generated);
        (summary, saved)
    }

    #[test]
    fn test_root_and_packages_follow_edited_children() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("__init__.py"), "").unwrap();
        std::fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        std::fs::write(dir.path().join("pkg/a.py"), "X = 1\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "Y = 2\n").unwrap();

        let (first, _) = run_cached(dir.path());
        assert_eq!(first.generated, 4);
        assert_eq!(first.cached, 0);

        // unchanged sources: only the root is generated again
        let (second, _) = run_cached(dir.path());
        assert_eq!(second.cached, 3);
        assert_eq!(second.generated, 1);

        std::fs::write(dir.path().join("pkg/a.py"), "X = 1\nZ = 3\n").unwrap();
        let (third, saved) = run_cached(dir.path());
        assert_eq!(third.generated, 3);
        assert_eq!(third.cached, 1);
        assert_eq!(saved, vec!["pkg.a", "pkg", "b", "proj"]);

        // the root package is never stored
        let cache = DocumentationCache::open(&dir.path().join(".cache"));
        let root_key = dir.path().display().to_string();
        assert!(cache.get(&root_key).is_none());
        assert_eq!(cache.stats().total_entries, 3);
    }

    #[test]
    fn test_package_prompt_leaves_out_undocumented_children() {
        let mut tree = ModuleTree::new(ModuleNode::new("/proj", "proj", false));
        let root = tree.root();
        let pkg = tree.add_child(root, ModuleNode::new("/proj/app", "app", true));
        let done = tree.add_child(pkg, ModuleNode::new("/proj/app/done.py", "done", false));
        tree.add_child(pkg, ModuleNode::new("/proj/app/later.py", "later", false));
        tree.node_mut(done).complete("Done docs".to_string());

        let scheduler = scheduler(Recorder::default());
        let prompt = scheduler.prompt_for(&tree, pkg, &[], "").unwrap();
        assert!(prompt.contains("Sub-module/Package: done"));
        assert!(!prompt.contains("later"));
    }

    #[test]
    fn test_tree_order_children_first() {
        let mut tree = ModuleTree::new(ModuleNode::new("/proj", "proj", false));
        let root = tree.root();
        let pkg = tree.add_child(root, ModuleNode::new("/proj/app", "app", true));
        tree.add_child(pkg, ModuleNode::new("/proj/app/models.py", "models", false));

        let mut scheduler = scheduler(Recorder::default());
        scheduler.run_tree_order(&mut tree, &[]).unwrap();

        assert_eq!(names(scheduler.sink()), vec!["app.models", "app", "proj"]);
        let prompts = scheduler.documenter().generator().prompts.borrow();
        assert!(prompts[1].contains("Docs for"));
        assert!(!prompts[1].contains("**Dependencies:**"));
    }
}
