//! Raw redaction configuration.
//!
//! Mirrors the processor's configuration document:
//!
//! ```json
//! {
//!   "allowed_keys": ["http.method"],
//!   "blocked_values": ["\\d{3}-\\d{2}-\\d{4}"],
//!   "dry_run": false,
//!   "limits": { "max_value_length": 256, "limit_exceptions": ["trace.id"] },
//!   "metric_tags": ["service.name"],
//!   "summary": "info"
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Verbosity of the bookkeeping attributes written onto spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLevel {
    /// Counts plus the full list of affected keys.
    Debug,
    /// Counts only.
    #[default]
    Info,
    /// Nothing is written back.
    Silent,
}

impl SummaryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLevel::Debug => "debug",
            SummaryLevel::Info => "info",
            SummaryLevel::Silent => "silent",
        }
    }

    /// Resolve the configured summary string. Empty means `Info`.
    pub fn resolve(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(SummaryLevel::Info);
        }
        trimmed.parse()
    }
}

impl FromStr for SummaryLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(SummaryLevel::Debug),
            "info" => Ok(SummaryLevel::Info),
            "silent" => Ok(SummaryLevel::Silent),
            _ => Err(ConfigError::InvalidSummary(s.to_string())),
        }
    }
}

impl fmt::Display for SummaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value length limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum value length in characters. `0` disables truncation.
    pub max_value_length: usize,
    /// Keys whose values are never truncated.
    pub limit_exceptions: Vec<String>,
}

/// Processor configuration before compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub allowed_keys: Vec<String>,
    pub blocked_values: Vec<String>,
    pub dry_run: bool,
    pub limits: Limits,
    pub metric_tags: Vec<String>,
    /// One of `debug`, `info`, `silent`; empty means `info`.
    pub summary: String,
}

impl RawConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("CONFIG_READ path={} bytes={}", path.display(), contents.len());
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = RawConfig::from_json_str(
            r#"{
                "allowed_keys": ["http.method", "ssn"],
                "blocked_values": ["\\d{3}-\\d{2}-\\d{4}"],
                "dry_run": true,
                "limits": {"max_value_length": 5, "limit_exceptions": ["trace.id"]},
                "metric_tags": ["service.name"],
                "summary": "debug"
            }"#,
        )
        .unwrap();

        assert_eq!(config.allowed_keys, vec!["http.method", "ssn"]);
        assert_eq!(config.blocked_values, vec![r"\d{3}-\d{2}-\d{4}"]);
        assert!(config.dry_run);
        assert_eq!(config.limits.max_value_length, 5);
        assert_eq!(config.limits.limit_exceptions, vec!["trace.id"]);
        assert_eq!(config.metric_tags, vec!["service.name"]);
        assert_eq!(config.summary, "debug");
    }

    #[test]
    fn test_missing_fields_default() {
        let config = RawConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RawConfig::default());
        assert_eq!(config.limits.max_value_length, 0);
    }

    #[test]
    fn test_negative_length_rejected() {
        let err = RawConfig::from_json_str(r#"{"limits": {"max_value_length": -1}}"#).unwrap_err();
        assert_eq!(err.code(), "error_config_parse");
    }

    #[test]
    fn test_missing_file() {
        let err = RawConfig::from_json_file("/nonexistent/redaction.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_summary_resolution() {
        assert_eq!(SummaryLevel::resolve("").unwrap(), SummaryLevel::Info);
        assert_eq!(SummaryLevel::resolve("  ").unwrap(), SummaryLevel::Info);
        assert_eq!(SummaryLevel::resolve("DEBUG").unwrap(), SummaryLevel::Debug);
        assert_eq!(SummaryLevel::resolve("silent").unwrap(), SummaryLevel::Silent);
        assert!(matches!(
            SummaryLevel::resolve("verbose"),
            Err(ConfigError::InvalidSummary(_))
        ));
    }
}
