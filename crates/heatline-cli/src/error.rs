//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Viewer server error
    #[error("Server error: {message}")]
    Server {
        /// Error message
        message: String,
    },

    /// Requested file cannot be shown
    #[error("{message}")]
    NotShown {
        /// Explanation from the engine
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Heatline library error
    #[error("Heatline error: {0}")]
    Heatline(#[from] heatline::HeatlineError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a server error
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Create a not-shown error
    #[must_use]
    pub fn not_shown(message: impl Into<String>) -> Self {
        Self::NotShown {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("no project root");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("no project root"));
    }

    #[test]
    fn test_server_error() {
        let err = CliError::server("address in use");
        assert_eq!(err.to_string(), "Server error: address in use");
    }

    #[test]
    fn test_not_shown_is_verbatim() {
        let err = CliError::not_shown("There is no coverage result for a.rs");
        assert_eq!(err.to_string(), "There is no coverage result for a.rs");
    }

    #[test]
    fn test_heatline_error_from() {
        let err: CliError = heatline::HeatlineError::collector("tracefile missing").into();
        assert!(err.to_string().starts_with("Heatline error"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
