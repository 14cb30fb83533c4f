//! Compiled redaction policy.
//!
//! A `Policy` is built once by the compiler and never mutated afterwards, so
//! it can be shared read-only (e.g. behind an `Arc`) by concurrent batches.

use std::collections::{BTreeSet, HashSet};

use regex::Regex;

use crate::config::SummaryLevel;

/// Bookkeeping attribute keys written onto processed spans.
pub const REDACTED_KEYS: &str = "redacted_keys";
pub const REDACTED_KEY_COUNT: &str = "redacted_key_count";
pub const MASKED_VALUES: &str = "masked_values";
pub const MASKED_VALUE_COUNT: &str = "masked_value_count";
pub const TRUNCATED_VALUES: &str = "truncated_values";
pub const TRUNCATED_VALUE_COUNT: &str = "truncated_value_count";

/// Always part of the allow-set, whatever the user configured.
pub const BOOKKEEPING_KEYS: [&str; 6] = [
    REDACTED_KEYS,
    REDACTED_KEY_COUNT,
    MASKED_VALUES,
    MASKED_VALUE_COUNT,
    TRUNCATED_VALUES,
    TRUNCATED_VALUE_COUNT,
];

/// Replacement for values matching a blocked pattern.
pub const MASK_MARKER: &str = "****";

/// A compiled blocked-value pattern.
#[derive(Debug, Clone)]
pub struct BlockMatcher {
    pattern: String,
    regex: Regex,
}

impl BlockMatcher {
    pub(crate) fn new(pattern: String, regex: Regex) -> Self {
        Self { pattern, regex }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Immutable, validated redaction policy.
#[derive(Debug, Clone)]
pub struct Policy {
    pub(crate) allowed_keys: HashSet<String>,
    pub(crate) block_matchers: Vec<BlockMatcher>,
    pub(crate) max_value_length: usize,
    pub(crate) truncation_exceptions: HashSet<String>,
    pub(crate) dry_run: bool,
    pub(crate) summary_level: SummaryLevel,
    pub(crate) metric_tag_keys: BTreeSet<String>,
    pub(crate) fingerprint: String,
}

impl Policy {
    pub fn is_allowed(&self, key: &str) -> bool {
        self.allowed_keys.contains(key)
    }

    pub fn allowed_keys(&self) -> &HashSet<String> {
        &self.allowed_keys
    }

    pub fn block_matchers(&self) -> &[BlockMatcher] {
        &self.block_matchers
    }

    /// True if any blocked pattern matches. Matchers are a union, so order
    /// does not matter.
    pub fn is_blocked(&self, value: &str) -> bool {
        self.block_matchers.iter().any(|m| m.is_match(value))
    }

    /// `0` means unlimited.
    pub fn max_value_length(&self) -> usize {
        self.max_value_length
    }

    pub fn is_truncation_exempt(&self, key: &str) -> bool {
        self.truncation_exceptions.contains(key)
    }

    pub fn truncation_exceptions(&self) -> &HashSet<String> {
        &self.truncation_exceptions
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn summary_level(&self) -> SummaryLevel {
        self.summary_level
    }

    /// Whether affected keys are listed, not just counted.
    pub fn records_keys(&self) -> bool {
        self.summary_level == SummaryLevel::Debug
    }

    pub fn metric_tag_keys(&self) -> &BTreeSet<String> {
        &self.metric_tag_keys
    }

    /// Hex SHA-256 over the canonical policy contents. Identical for
    /// configurations that differ only in list order or duplicates.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether processing can ever write to a span.
    pub fn mutates_data(&self) -> bool {
        !(self.dry_run && self.summary_level == SummaryLevel::Silent)
    }
}
