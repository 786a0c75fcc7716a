//! Result and error types for Heatline

use thiserror::Error;

/// Result type for Heatline operations
pub type HeatlineResult<T> = Result<T, HeatlineError>;

/// Errors that can occur while collecting, attributing or emitting coverage
#[derive(Debug, Error)]
pub enum HeatlineError {
    /// The collector could not produce a raw snapshot
    #[error("Coverage collector failed: {message}")]
    Collector {
        /// Error message
        message: String,
    },

    /// A source file could not be parsed for call ranges
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File that failed to parse
        path: String,
        /// Parser message
        message: String,
    },

    /// Requested display path does not exist on disk
    #[error("{path} not found")]
    FileNotFound {
        /// Missing path
        path: String,
    },

    /// Requested file has no coverage entry
    #[error("There is no coverage result for {path}")]
    EmptyResult {
        /// Path without coverage
        path: String,
    },

    /// A shared lock was poisoned by a panicking holder
    #[error("Lock poisoned: {what}")]
    LockPoisoned {
        /// Which lock
        what: &'static str,
    },

    /// The emitter task ended abnormally
    #[error("Emitter task failed: {message}")]
    EmitterTask {
        /// Join error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid exclusion glob
    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HeatlineError {
    /// Create a collector error
    #[must_use]
    pub fn collector(message: impl Into<String>) -> Self {
        Self::Collector {
            message: message.into(),
        }
    }

    /// Create a parse error for a file
    #[must_use]
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
