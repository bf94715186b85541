use std::path::PathBuf;
use thiserror::Error;

/// genai-docs error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("{var} environment variable is required (export {var}='your-api-key-here')")]
    MissingApiKey { var: String },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Dependency cycle detected among: {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Failed to document {node}: {source}")]
    Generation {
        node: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for genai-docs operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Error::Llm(msg.into())
    }

    /// Wrap an error raised while documenting a node
    pub fn generation(node: impl Into<String>, source: Error) -> Self {
        Error::Generation {
            node: node.into(),
            source: Box::new(source),
        }
    }

    /// Create a persistence error
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Failure class reported by the CLI
    pub fn class(&self) -> &'static str {
        match self {
            Error::ConfigParse(_)
            | Error::ConfigValidation(_)
            | Error::MissingApiKey { .. }
            | Error::PathNotFound(_)
            | Error::InvalidPath(_) => "configuration",
            Error::Parse { .. } => "parse",
            Error::Llm(_) | Error::Generation { .. } | Error::Template(_) => "generation",
            Error::Persistence { .. } => "persistence",
            Error::CycleDetected(_) => "dependency-graph",
            Error::Io(_) | Error::Json(_) | Error::GlobPattern(_) | Error::WalkDir(_) => "io",
            Error::Other(_) => "runtime",
        }
    }

    /// Whether the error came from the generation backend or persistence
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Error::Llm(_) | Error::Generation { .. } | Error::Persistence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = Error::PathNotFound(PathBuf::from("/some/path"));
        assert_eq!(err.to_string(), "Path not found: /some/path");
        assert_eq!(err.class(), "configuration");
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("/foo/bar.py", "unexpected token");
        assert!(err.to_string().contains("/foo/bar.py"));
        assert!(err.to_string().contains("unexpected token"));
        assert_eq!(err.class(), "parse");
    }

    #[test]
    fn test_missing_api_key_display() {
        let err = Error::MissingApiKey {
            var: "GOOGLE_API_KEY".to_string(),
        };
        assert!(err.to_string().starts_with("GOOGLE_API_KEY environment variable is required"));
        assert_eq!(err.class(), "configuration");
    }

    #[test]
    fn test_cycle_detected_display() {
        let err = Error::CycleDetected(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Dependency cycle detected among: a, b");
    }

    #[test]
    fn test_generation_wraps_source() {
        let err = Error::generation("pkg.utils", Error::llm("quota exceeded"));
        assert_eq!(
            err.to_string(),
            "Failed to document pkg.utils: LLM error: quota exceeded"
        );
        assert_eq!(err.class(), "generation");
        assert!(err.is_generation_failure());
    }

    #[test]
    fn test_persistence_is_generation_failure() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::persistence("/out/DOCUMENTATION.md", io_err);
        assert!(err.is_generation_failure());
        assert_eq!(err.class(), "persistence");
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
        assert_eq!(err.class(), "runtime");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
