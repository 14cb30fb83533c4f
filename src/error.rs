//! Error types.
//!
//! Construction failures (`ConfigError`) are fatal: no policy and no
//! processor exist afterwards. `ProcessingError` covers structurally invalid
//! input handed to a running processor. Individual attributes never error.

use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes, shared with log output.
pub const ERR_REGEX_COMPILATION: &str = "error_regex_compilation";
pub const ERR_INVALID_SUMMARY: &str = "error_invalid_summary";
pub const ERR_CONFIG_PARSE: &str = "error_config_parse";
pub const ERR_CONFIG_IO: &str = "error_config_io";
pub const ERR_TRACE_PROCESSING: &str = "error_trace_processing";
pub const ERR_PROCESSOR_STOPPED: &str = "error_processor_stopped";

/// Invalid policy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("blocked value pattern {pattern:?} failed to compile: {source}")]
    RegexCompilation {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown summary level {0:?} (expected debug, info or silent)")]
    InvalidSummary(String),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::RegexCompilation { .. } => ERR_REGEX_COMPILATION,
            ConfigError::InvalidSummary(_) => ERR_INVALID_SUMMARY,
            ConfigError::Parse(_) => ERR_CONFIG_PARSE,
            ConfigError::Io { .. } => ERR_CONFIG_IO,
        }
    }
}

/// Structurally invalid input to a processor.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The encoded batch could not be decoded into spans.
    #[error("malformed span batch: {0}")]
    MalformedBatch(#[source] serde_json::Error),

    /// The redacted batch could not be encoded for the host.
    #[error("failed to encode span batch: {0}")]
    Encode(#[source] serde_json::Error),

    /// `process` was called after `shutdown`.
    #[error("processor has been shut down")]
    Stopped,
}

impl ProcessingError {
    pub fn code(&self) -> &'static str {
        match self {
            ProcessingError::MalformedBatch(_) | ProcessingError::Encode(_) => ERR_TRACE_PROCESSING,
            ProcessingError::Stopped => ERR_PROCESSOR_STOPPED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = regex::Regex::new("(").unwrap_err();
        let config_err = ConfigError::RegexCompilation {
            pattern: "(".to_string(),
            source: err,
        };
        assert_eq!(config_err.code(), "error_regex_compilation");
        assert!(config_err.to_string().contains("\"(\""));

        assert_eq!(ProcessingError::Stopped.code(), "error_processor_stopped");
    }
}
