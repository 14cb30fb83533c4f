//! Policy compilation.
//!
//! Turns a `RawConfig` into an immutable `Policy`. Any invalid blocked-value
//! pattern aborts compilation; no partial policy is ever returned.

use std::collections::{BTreeSet, HashSet};

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::config::{RawConfig, SummaryLevel};
use crate::error::ConfigError;

use super::model::{BlockMatcher, Policy, BOOKKEEPING_KEYS};

impl Policy {
    pub fn compile(config: &RawConfig) -> Result<Self, ConfigError> {
        compile_policy(config)
    }
}

/// Compile a raw configuration into a policy.
pub fn compile_policy(config: &RawConfig) -> Result<Policy, ConfigError> {
    let summary_level = SummaryLevel::resolve(&config.summary)?;

    let allowed_keys = make_allow_list(config);
    let block_matchers = make_block_matchers(config)?;
    let truncation_exceptions = make_truncation_exceptions(config);
    let metric_tag_keys: BTreeSet<String> = config.metric_tags.iter().cloned().collect();

    let mut policy = Policy {
        allowed_keys,
        block_matchers,
        max_value_length: config.limits.max_value_length,
        truncation_exceptions,
        dry_run: config.dry_run,
        summary_level,
        metric_tag_keys,
        fingerprint: String::new(),
    };
    policy.fingerprint = compute_fingerprint(&policy);

    if policy.dry_run {
        log::info!("DRY_RUN_ENABLED fingerprint={}", policy.fingerprint);
    }

    log::info!(
        "POLICY_COMPILED fingerprint={} allowed_keys={} blocked_patterns={} max_value_length={} limit_exceptions={} metric_tags={} summary={}",
        policy.fingerprint,
        policy.allowed_keys.len(),
        policy.block_matchers.len(),
        policy.max_value_length,
        policy.truncation_exceptions.len(),
        policy.metric_tag_keys.len(),
        policy.summary_level
    );

    Ok(policy)
}

/// User allowed keys plus the bookkeeping keys.
fn make_allow_list(config: &RawConfig) -> HashSet<String> {
    config
        .allowed_keys
        .iter()
        .cloned()
        .chain(BOOKKEEPING_KEYS.iter().map(|k| k.to_string()))
        .collect()
}

/// Precompile blocked patterns, deduplicated and sorted by pattern text.
fn make_block_matchers(config: &RawConfig) -> Result<Vec<BlockMatcher>, ConfigError> {
    let patterns: BTreeSet<&String> = config.blocked_values.iter().collect();

    let mut matchers = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let regex = Regex::new(pattern).map_err(|source| {
            log::error!(
                "POLICY_REGEX_INVALID code={} pattern={:?} error={}",
                crate::error::ERR_REGEX_COMPILATION,
                pattern,
                source
            );
            ConfigError::RegexCompilation {
                pattern: pattern.clone(),
                source,
            }
        })?;
        matchers.push(BlockMatcher::new(pattern.clone(), regex));
    }
    Ok(matchers)
}

fn make_truncation_exceptions(config: &RawConfig) -> HashSet<String> {
    config.limits.limit_exceptions.iter().cloned().collect()
}

fn compute_fingerprint(policy: &Policy) -> String {
    let mut hasher = Sha256::new();

    let mut section = |name: &str, items: Vec<&str>| {
        hasher.update(name.as_bytes());
        for item in items {
            hasher.update([0x1fu8]);
            hasher.update(item.as_bytes());
        }
        hasher.update([0x1eu8]);
    };

    let mut allowed: Vec<&str> = policy.allowed_keys.iter().map(String::as_str).collect();
    allowed.sort_unstable();
    section("allowed_keys", allowed);

    section(
        "blocked_values",
        policy.block_matchers.iter().map(BlockMatcher::pattern).collect(),
    );

    let mut exceptions: Vec<&str> = policy
        .truncation_exceptions
        .iter()
        .map(String::as_str)
        .collect();
    exceptions.sort_unstable();
    section("limit_exceptions", exceptions);

    section(
        "metric_tags",
        policy.metric_tag_keys.iter().map(String::as_str).collect(),
    );

    let max_len = policy.max_value_length.to_string();
    let dry_run = policy.dry_run.to_string();
    section(
        "scalars",
        vec![max_len.as_str(), dry_run.as_str(), policy.summary_level.as_str()],
    );

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    fn config() -> RawConfig {
        RawConfig {
            allowed_keys: vec!["http.method".to_string(), "ssn".to_string()],
            blocked_values: vec![r"\d{3}-\d{2}-\d{4}".to_string(), "4[0-9]{12}".to_string()],
            limits: Limits {
                max_value_length: 5,
                limit_exceptions: vec!["trace.id".to_string()],
            },
            metric_tags: vec!["service.name".to_string()],
            ..RawConfig::default()
        }
    }

    #[test]
    fn test_bookkeeping_keys_always_allowed() {
        let policy = compile_policy(&RawConfig::default()).unwrap();
        assert_eq!(policy.allowed_keys().len(), BOOKKEEPING_KEYS.len());
        for key in BOOKKEEPING_KEYS {
            assert!(policy.is_allowed(key));
        }
        assert!(!policy.is_allowed("user.email"));
    }

    #[test]
    fn test_compile_fields() {
        let policy = compile_policy(&config()).unwrap();
        assert!(policy.is_allowed("http.method"));
        assert!(policy.is_blocked("123-45-6789"));
        assert!(!policy.is_blocked("GET"));
        assert_eq!(policy.max_value_length(), 5);
        assert!(policy.is_truncation_exempt("trace.id"));
        assert!(!policy.dry_run());
        assert_eq!(policy.summary_level(), SummaryLevel::Info);
        assert!(policy.metric_tag_keys().contains("service.name"));
        assert_eq!(policy.fingerprint().len(), 64);
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let mut raw = config();
        raw.blocked_values.push("(unclosed".to_string());

        match compile_policy(&raw) {
            Err(ConfigError::RegexCompilation { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected regex compilation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_summary_fails() {
        let mut raw = config();
        raw.summary = "loud".to_string();
        assert!(matches!(
            compile_policy(&raw),
            Err(ConfigError::InvalidSummary(_))
        ));
    }

    #[test]
    fn test_fingerprint_ignores_order_and_duplicates() {
        let a = compile_policy(&config()).unwrap();

        let mut raw = config();
        raw.allowed_keys.reverse();
        raw.allowed_keys.push("ssn".to_string());
        raw.blocked_values.reverse();
        let b = compile_policy(&raw).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.block_matchers().len(), b.block_matchers().len());

        raw.dry_run = true;
        let c = compile_policy(&raw).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_mutates_data() {
        let mut raw = config();
        assert!(compile_policy(&raw).unwrap().mutates_data());

        raw.dry_run = true;
        assert!(compile_policy(&raw).unwrap().mutates_data());

        raw.summary = "silent".to_string();
        assert!(!compile_policy(&raw).unwrap().mutates_data());
    }
}
