// Prompt builders for projects, packages and modules

use crate::analysis::ProjectFile;
use crate::error::Result;
use crate::llm::TextGenerator;
use serde::Serialize;
use tera::{Context, Tera};

/// Documentation of a direct child, fed to its parent's prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildDoc {
    pub name: String,
    pub documentation: String,
}

/// Renders prompts from embedded templates and sends them to a generator
pub struct Documenter<G> {
    generator: G,
    tera: Tera,
}

impl<G: TextGenerator> Documenter<G> {
    pub fn new(generator: G) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("project.md", include_str!("../../templates/project.md.tera")),
            ("package.md", include_str!("../../templates/package.md.tera")),
            ("module.md", include_str!("../../templates/module.md.tera")),
        ])?;
        Ok(Self { generator, tera })
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn project_prompt(
        &self,
        project_name: &str,
        project_files: &[ProjectFile],
        children: &[ChildDoc],
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("project_name", project_name);
        context.insert("project_files", project_files);
        context.insert("children", children);
        Ok(self.tera.render("project.md", &context)?)
    }

    pub fn package_prompt(
        &self,
        name: &str,
        children: &[ChildDoc],
        init_content: Option<&str>,
        dependency_context: &str,
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("name", name);
        context.insert("children", children);
        context.insert("init_content", init_content.unwrap_or_default().trim());
        context.insert("dependency_context", dependency_context);
        Ok(self.tera.render("package.md", &context)?)
    }

    pub fn module_prompt(
        &self,
        name: &str,
        content: Option<&str>,
        dependency_context: &str,
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("name", name);
        context.insert("content", content.unwrap_or_default().trim());
        context.insert("dependency_context", dependency_context);
        Ok(self.tera.render("module.md", &context)?)
    }

    /// Send a rendered prompt to the generator
    pub fn generate(&self, prompt: &str) -> Result<String> {
        self.generator.generate(prompt)
    }
}
