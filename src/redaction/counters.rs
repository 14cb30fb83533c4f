//! Redaction counters.
//!
//! Created fresh for every span, merged into the batch aggregate, and
//! optionally written back onto the span as bookkeeping attributes.

use serde::Serialize;

use crate::config::SummaryLevel;
use crate::policy::{
    BOOKKEEPING_KEYS, MASKED_VALUES, MASKED_VALUE_COUNT, REDACTED_KEYS, REDACTED_KEY_COUNT,
    TRUNCATED_VALUES, TRUNCATED_VALUE_COUNT,
};
use crate::span::{AttributeValue, Attributes};

/// What the engine did (or would do, in dry run) to a span or batch.
///
/// Key lists are only populated at `debug` summary level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionCounters {
    pub redacted_keys: Vec<String>,
    pub redacted_key_count: u64,
    pub masked_values: Vec<String>,
    pub masked_value_count: u64,
    pub truncated_values: Vec<String>,
    pub truncated_value_count: u64,
}

impl RedactionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_redacted(&mut self, key: &str, record_key: bool) {
        self.redacted_key_count += 1;
        if record_key {
            self.redacted_keys.push(key.to_string());
        }
    }

    pub(crate) fn record_masked(&mut self, key: &str, record_key: bool) {
        self.masked_value_count += 1;
        if record_key {
            self.masked_values.push(key.to_string());
        }
    }

    pub(crate) fn record_truncated(&mut self, key: &str, record_key: bool) {
        self.truncated_value_count += 1;
        if record_key {
            self.truncated_values.push(key.to_string());
        }
    }

    /// True when nothing was redacted, masked or truncated.
    pub fn is_empty(&self) -> bool {
        self.redacted_key_count == 0 && self.masked_value_count == 0 && self.truncated_value_count == 0
    }

    /// Sum counts and concatenate key lists.
    pub fn merge(&mut self, other: &RedactionCounters) {
        self.redacted_key_count += other.redacted_key_count;
        self.masked_value_count += other.masked_value_count;
        self.truncated_value_count += other.truncated_value_count;
        self.redacted_keys.extend(other.redacted_keys.iter().cloned());
        self.masked_values.extend(other.masked_values.iter().cloned());
        self.truncated_values.extend(other.truncated_values.iter().cloned());
    }

    /// Copy without key lists.
    pub fn counts_only(&self) -> Self {
        Self {
            redacted_key_count: self.redacted_key_count,
            masked_value_count: self.masked_value_count,
            truncated_value_count: self.truncated_value_count,
            ..Self::default()
        }
    }

    /// Write bookkeeping attributes onto a span.
    ///
    /// Bookkeeping left by an earlier pass is dropped first, so the span only
    /// describes this pass. Counts are written when non-zero; key lists only
    /// at `debug`. Nothing is written or dropped at `silent`.
    pub fn write_bookkeeping(&self, attributes: &mut Attributes, level: SummaryLevel) {
        if level == SummaryLevel::Silent {
            return;
        }
        for key in BOOKKEEPING_KEYS {
            attributes.remove(key);
        }
        let with_keys = level == SummaryLevel::Debug;

        let groups = [
            (REDACTED_KEY_COUNT, self.redacted_key_count, REDACTED_KEYS, &self.redacted_keys),
            (MASKED_VALUE_COUNT, self.masked_value_count, MASKED_VALUES, &self.masked_values),
            (
                TRUNCATED_VALUE_COUNT,
                self.truncated_value_count,
                TRUNCATED_VALUES,
                &self.truncated_values,
            ),
        ];

        for (count_key, count, list_key, keys) in groups {
            if count == 0 {
                continue;
            }
            attributes.insert(count_key, AttributeValue::Int(saturating_i64(count)));
            if with_keys && !keys.is_empty() {
                attributes.insert(
                    list_key,
                    AttributeValue::Array(keys.iter().map(|k| AttributeValue::from(k.as_str())).collect()),
                );
            }
        }
    }
}

fn saturating_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
