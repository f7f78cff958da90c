// ============================================================
// Layer 3 — Pipeline Error Taxonomy
// ============================================================
// Errors raised by the library layers (domain, data, infra).
//
//   Config     — invalid size / threshold / padding mode.
//                Fatal at pipeline construction.
//   Validation — mismatched batch shapes. A caller contract
//                violation, also fatal.
//   Parse      — a malformed corpus line. Always recovered
//                locally: the line is skipped and counted.
//
// There is no encoding error: a token that cannot be mapped
// resolves to the unknown id instead.
//
// The application and CLI layers wrap these in anyhow.

use thiserror::Error;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for library operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Batch shape mismatch.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed corpus record.
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialisation error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// True for errors that only affect a single corpus line.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_parse_errors_are_recoverable() {
        assert!(PipelineError::parse("bad line").is_recoverable());
        assert!(!PipelineError::config("batch_size").is_recoverable());
        assert!(!PipelineError::validation("3 != 4").is_recoverable());
    }

    #[test]
    fn test_message_names_the_problem() {
        let e = PipelineError::config("batch_size must be > 0");
        assert_eq!(e.to_string(), "configuration error: batch_size must be > 0");
    }
}
