//! Per-span redaction.
//!
//! Each attribute goes through three steps, in this order:
//! 1. Key filtering - keys outside the allow-set are removed
//! 2. Value masking - values matching a blocked pattern become `****`
//! 3. Truncation - values longer than the limit are cut (unless exempt)
//!
//! Outcomes are planned first and applied afterwards, so dry run computes
//! the same counters while leaving the span untouched.

use std::collections::BTreeMap;

use crate::logging::structured::LogContext;
use crate::policy::{Policy, MASK_MARKER};
use crate::span::{AttributeValue, Attributes, Span};

use super::counters::RedactionCounters;

/// Metric tag key to canonical value.
pub type Dimensions = BTreeMap<String, String>;

/// Planned change to one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeAction {
    Remove,
    Replace(String),
}

/// Outcome of redacting a single span.
#[derive(Debug, Clone, Default)]
pub struct SpanRedaction {
    pub counters: RedactionCounters,
    /// Metric tag values as the span carries them after redaction.
    pub dimensions: Dimensions,
}

/// Compute the actions for a set of attributes without applying them.
///
/// Attributes absent from the returned list are kept unchanged.
pub fn plan_redaction(
    policy: &Policy,
    attributes: &Attributes,
) -> (Vec<(String, AttributeAction)>, SpanRedaction) {
    let record_keys = policy.records_keys();
    let max_len = policy.max_value_length();

    let mut actions = Vec::new();
    let mut redaction = SpanRedaction::default();

    for (key, value) in attributes.iter() {
        if !policy.is_allowed(key) {
            redaction.counters.record_redacted(key, record_keys);
            actions.push((key.to_string(), AttributeAction::Remove));
            continue;
        }

        let mut text = value.canonical_string();
        let mut changed = false;

        let mut masked = false;
        if policy.is_blocked(&text) {
            text = MASK_MARKER.to_string();
            masked = true;
            changed = true;
            redaction.counters.record_masked(key, record_keys);
        }

        if max_len > 0 && !policy.is_truncation_exempt(key) {
            if let Some(truncated) = truncate_chars(&text, max_len) {
                text = truncated;
                changed = true;
                redaction.counters.record_truncated(key, record_keys);

                // A cut value can match an end-anchored pattern it did not
                // match whole.
                if !masked && policy.is_blocked(&text) {
                    text = truncate_chars(MASK_MARKER, max_len)
                        .unwrap_or_else(|| MASK_MARKER.to_string());
                    redaction.counters.record_masked(key, record_keys);
                }
            }
        }

        if policy.metric_tag_keys().contains(key) {
            redaction.dimensions.insert(key.to_string(), text.clone());
        }

        if changed {
            actions.push((key.to_string(), AttributeAction::Replace(text)));
        }
    }

    (actions, redaction)
}

/// Redact a span in place (or only count, in dry run).
pub fn redact_span(policy: &Policy, span: &mut Span, ctx: &LogContext) -> SpanRedaction {
    let (actions, redaction) = plan_redaction(policy, &span.attributes);

    if !policy.dry_run() {
        apply_actions(&mut span.attributes, actions);
    }

    if !redaction.counters.is_empty() {
        log::debug!(
            "{} SPAN_REDACTED redacted={} masked={} truncated={} dry_run={}",
            ctx,
            redaction.counters.redacted_key_count,
            redaction.counters.masked_value_count,
            redaction.counters.truncated_value_count,
            policy.dry_run()
        );
    }

    redaction
}

fn apply_actions(attributes: &mut Attributes, actions: Vec<(String, AttributeAction)>) {
    for (key, action) in actions {
        match action {
            AttributeAction::Remove => {
                attributes.remove(&key);
            }
            AttributeAction::Replace(text) => {
                attributes.insert(key, AttributeValue::String(text));
            }
        }
    }
}

/// First `max` characters of `s`, or `None` if it already fits.
fn truncate_chars(s: &str, max: usize) -> Option<String> {
    s.char_indices().nth(max).map(|(idx, _)| s[..idx].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Limits, RawConfig};

    fn policy(raw: RawConfig) -> Policy {
        Policy::compile(&raw).unwrap()
    }

    fn ctx() -> LogContext {
        LogContext::new("test-batch").with_span("span-1")
    }

    #[test]
    fn test_key_filtering() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["http.method".to_string()],
            summary: "debug".to_string(),
            ..RawConfig::default()
        });
        let mut span = Span::new(
            "s1",
            [("http.method", "GET"), ("user.email", "a@b.com")].into_iter().collect(),
        );

        let result = redact_span(&policy, &mut span, &ctx());

        assert_eq!(span.attributes.len(), 1);
        assert!(!span.attributes.contains_key("user.email"));
        assert_eq!(result.counters.redacted_key_count, 1);
        assert_eq!(result.counters.redacted_keys, vec!["user.email"]);
    }

    #[test]
    fn test_keys_not_listed_below_debug() {
        let policy = policy(RawConfig::default());
        let mut span = Span::new("s1", [("user.email", "a@b.com")].into_iter().collect());

        let result = redact_span(&policy, &mut span, &ctx());
        assert_eq!(result.counters.redacted_key_count, 1);
        assert!(result.counters.redacted_keys.is_empty());
    }

    #[test]
    fn test_masking_non_string_value() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["card".to_string(), "port".to_string()],
            blocked_values: vec![r"^4\d{15}$".to_string()],
            ..RawConfig::default()
        });
        let mut attrs = Attributes::new();
        attrs.insert("card", AttributeValue::Int(4111111111111111));
        attrs.insert("port", AttributeValue::Int(8080));
        let mut span = Span::new("s1", attrs);

        let result = redact_span(&policy, &mut span, &ctx());

        assert_eq!(result.counters.masked_value_count, 1);
        assert_eq!(span.attributes.get("card"), Some(&AttributeValue::from("****")));
        // Untouched values keep their type.
        assert_eq!(span.attributes.get("port"), Some(&AttributeValue::Int(8080)));
    }

    #[test]
    fn test_mask_then_truncate() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["token".to_string()],
            blocked_values: vec!["secret".to_string()],
            limits: Limits {
                max_value_length: 2,
                limit_exceptions: vec![],
            },
            summary: "debug".to_string(),
            ..RawConfig::default()
        });
        let mut span = Span::new("s1", [("token", "my-secret")].into_iter().collect());

        let result = redact_span(&policy, &mut span, &ctx());

        assert_eq!(span.attributes.get("token"), Some(&AttributeValue::from("**")));
        assert_eq!(result.counters.masked_values, vec!["token"]);
        assert_eq!(result.counters.truncated_values, vec!["token"]);
    }

    #[test]
    fn test_truncated_value_matching_pattern_is_masked() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["ssn".to_string()],
            blocked_values: vec![r"^\d{3}-\d{2}-\d{4}$".to_string()],
            limits: Limits {
                max_value_length: 11,
                limit_exceptions: vec![],
            },
            summary: "silent".to_string(),
            ..RawConfig::default()
        });
        let mut span = Span::new("s1", [("ssn", "123-45-67890")].into_iter().collect());

        let result = redact_span(&policy, &mut span, &ctx());

        assert_eq!(span.attributes.get("ssn"), Some(&AttributeValue::from("****")));
        assert_eq!(result.counters.masked_value_count, 1);
        assert_eq!(result.counters.truncated_value_count, 1);

        // A second pass finds nothing left to do.
        let before = span.clone();
        let again = redact_span(&policy, &mut span, &ctx());
        assert!(again.counters.is_empty());
        assert_eq!(span, before);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["greeting".to_string(), "flag".to_string()],
            limits: Limits {
                max_value_length: 3,
                limit_exceptions: vec![],
            },
            ..RawConfig::default()
        });
        let mut attrs = Attributes::new();
        attrs.insert("greeting", "héllo");
        attrs.insert("flag", true);
        let mut span = Span::new("s1", attrs);

        let result = redact_span(&policy, &mut span, &ctx());

        assert_eq!(span.attributes.get("greeting"), Some(&AttributeValue::from("hél")));
        // "true" is four characters, so the bool becomes a truncated string.
        assert_eq!(span.attributes.get("flag"), Some(&AttributeValue::from("tru")));
        assert_eq!(result.counters.truncated_value_count, 2);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["note".to_string()],
            ..RawConfig::default()
        });
        let long = "x".repeat(10_000);
        let mut span = Span::new("s1", [("note", long.as_str())].into_iter().collect());

        let result = redact_span(&policy, &mut span, &ctx());
        assert!(result.counters.is_empty());
        assert_eq!(span.attributes.get("note"), Some(&AttributeValue::from(long.as_str())));
    }

    #[test]
    fn test_dry_run_plans_without_applying() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["ssn".to_string()],
            blocked_values: vec![r"\d{3}-\d{2}-\d{4}".to_string()],
            dry_run: true,
            ..RawConfig::default()
        });
        let mut span = Span::new(
            "s1",
            [("ssn", "123-45-6789"), ("user.email", "a@b.com")].into_iter().collect(),
        );
        let original = span.clone();

        let result = redact_span(&policy, &mut span, &ctx());

        assert_eq!(span, original);
        assert_eq!(result.counters.redacted_key_count, 1);
        assert_eq!(result.counters.masked_value_count, 1);
    }

    #[test]
    fn test_dimensions_use_redacted_values() {
        let policy = policy(RawConfig {
            allowed_keys: vec!["service.name".to_string(), "user.id".to_string()],
            blocked_values: vec!["^u-".to_string()],
            metric_tags: vec![
                "service.name".to_string(),
                "user.id".to_string(),
                "user.email".to_string(),
            ],
            ..RawConfig::default()
        });
        let mut span = Span::new(
            "s1",
            [
                ("service.name", "checkout"),
                ("user.id", "u-42"),
                ("user.email", "a@b.com"),
                ("http.route", "/pay"),
            ]
            .into_iter()
            .collect(),
        );

        let result = redact_span(&policy, &mut span, &ctx());

        let expected: Dimensions = [
            ("service.name".to_string(), "checkout".to_string()),
            ("user.id".to_string(), "****".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(result.dimensions, expected);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdefgh", 5), Some("abcde".to_string()));
        assert_eq!(truncate_chars("abcde", 5), None);
        assert_eq!(truncate_chars("", 1), None);
    }
}
