//! Error types for plugindoc.
//!
//! Library crates use [`PluginDocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all plugindoc operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginDocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The external documentation extractor could not be run.
    #[error("extractor error: {0}")]
    Extractor(String),

    /// Malformed JSON from the extractor or a package manifest.
    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A required field was missing from extracted metadata or a manifest.
    #[error("lookup error: {message}")]
    Lookup { message: String },

    /// Network/HTTP error while fetching badges.
    #[error("network error: {0}")]
    Network(String),

    /// Cache storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input (malformed query path, bad plugin name, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PluginDocError>;

impl PluginDocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a lookup error from any displayable message.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `serde_json::Error` with the file it came from.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PluginDocError::config("missing [typedoc] command");
        assert_eq!(err.to_string(), "config error: missing [typedoc] command");

        let err = PluginDocError::lookup("package.json has no version");
        assert!(err.to_string().contains("no version"));
    }

    #[test]
    fn json_error_keeps_parser_message() {
        let source = serde_json::from_str::<serde_json::Value>("").unwrap_err();
        let err = PluginDocError::json("/tmp/out.json", source);
        let msg = err.to_string();
        assert!(msg.contains("out.json"));
        assert!(msg.contains("EOF"));
    }
}
