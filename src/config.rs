use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the project root
pub const CONFIG_FILE_NAME: &str = "genai-docs.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub cache: CacheConfig,
}

/// Project metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Overrides the root directory name in the project documentation
    pub name: Option<String>,
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    /// Falls back to the provider's environment variable when unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    /// Attempts per prompt, including the first one
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_secs: u64,
}

/// Supported generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl LlmProvider {
    /// Environment variable holding the API key, if the provider needs one
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Gemini => Some("GOOGLE_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-2.0-flash",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Ollama => "llama3",
        }
    }
}

/// Dependency analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Use dependency-aware ordering instead of plain tree post-order
    pub dependency_graph: bool,
    /// How imports that are neither known-external nor found on disk are treated
    pub unknown_imports: UnknownImportPolicy,
    /// Extra top-level module names to treat as external
    pub known_external: Vec<String>,
    /// Extra glob patterns (matched against entry names) to skip while scanning
    pub exclude: Vec<String>,
}

/// Classification applied to imports the classifier cannot place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownImportPolicy {
    /// Assume the import belongs to the project; the graph builder drops it
    /// later if it does not resolve to a module
    #[default]
    Internal,
    External,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Mirror documentation under this directory instead of next to the sources
    pub directory: Option<PathBuf>,
    /// Maximum characters of each dependency's documentation fed as context
    pub context_chars: usize,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to `<project>/.genai-docs`
    pub directory: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: LlmProvider::default().default_model().to_string(),
            api_key: None,
            api_url: None,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            timeout_secs: 120,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dependency_graph: true,
            unknown_imports: UnknownImportPolicy::default(),
            known_external: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            context_chars: 2000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

/// Command-line overrides, applied last
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub model: Option<String>,
    pub no_cache: bool,
    pub no_dependency_graph: bool,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or `genai-docs.toml` from the project
    /// root when it exists, or defaults
    pub fn discover(explicit: Option<&Path>, project_root: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let candidate = project_root.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::load(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `GENAI_MODEL` and the provider's API key variable
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("GENAI_MODEL").filter(|m| !m.is_empty()) {
            self.llm.model = model;
        }
        if self.llm.api_key.is_none() {
            if let Some(var) = self.llm.provider.api_key_var() {
                self.llm.api_key = lookup(var).filter(|k| !k.is_empty());
            }
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, overrides: CliOverrides) {
        if let Some(out) = overrides.output {
            self.output.directory = Some(out);
        }

        if let Some(model) = overrides.model {
            self.llm.model = model;
        }

        if overrides.no_cache {
            self.cache.enabled = false;
        }

        if overrides.no_dependency_graph {
            self.analysis.dependency_graph = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm.max_retries == 0 {
            return Err(Error::config_validation("llm.max_retries must be at least 1"));
        }

        if self.llm.max_retries > 10 {
            return Err(Error::config_validation("llm.max_retries cannot exceed 10"));
        }

        if self.llm.max_delay_ms < self.llm.base_delay_ms {
            return Err(Error::config_validation(
                "llm.max_delay_ms must not be smaller than llm.base_delay_ms",
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(Error::config_validation("llm.model must not be empty"));
        }

        if self.output.context_chars == 0 {
            return Err(Error::config_validation("output.context_chars must be at least 1"));
        }

        for pattern in &self.analysis.exclude {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }

    /// Fail before any processing when the provider needs a key and none is set
    pub fn require_api_key(&self) -> Result<()> {
        match self.llm.provider.api_key_var() {
            Some(var) if self.llm.api_key.is_none() => Err(Error::MissingApiKey {
                var: var.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Directory holding the documentation cache for a project
    pub fn cache_dir(&self, project_root: &Path) -> PathBuf {
        self.cache
            .directory
            .clone()
            .unwrap_or_else(|| project_root.join(".genai-docs"))
    }
}
