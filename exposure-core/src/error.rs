//! Error types for exposure-core
//!
//! Fact derivation itself never fails; these errors cover loading inputs
//! and running batches.

use thiserror::Error;

/// Error type for loading and batch operations
#[derive(Debug, Error)]
pub enum ExposureError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A session line could not be parsed
    #[error("Invalid session on line {line}: {source}")]
    SessionLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Repository fixture is inconsistent
    #[error("Invalid fixture: {0}")]
    Fixture(String),

    /// An aggregation task panicked or was cancelled
    #[error("Aggregation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for exposure operations
pub type Result<T> = std::result::Result<T, ExposureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExposureError::Fixture("duplicate device".into());
        assert_eq!(err.to_string(), "Invalid fixture: duplicate device");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ExposureError = io_err.into();
        assert!(matches!(err, ExposureError::Io(_)));
    }

    #[test]
    fn test_session_line_reports_line_number() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ExposureError::SessionLine { line: 3, source };
        assert!(err.to_string().starts_with("Invalid session on line 3"));
    }
}
