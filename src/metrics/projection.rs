//! Metric projection of batch reports.

use serde::Serialize;

use crate::policy::Policy;
use crate::redaction::{BatchReport, Dimensions};

pub const METRIC_REDACTED_KEYS: &str = "redaction.redacted_key_count";
pub const METRIC_MASKED_VALUES: &str = "redaction.masked_value_count";
pub const METRIC_TRUNCATED_VALUES: &str = "redaction.truncated_value_count";

/// A count metric with its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSample {
    pub name: &'static str,
    pub value: u64,
    pub dimensions: Dimensions,
}

/// Turn a batch report into metric samples.
///
/// Only dimensions whose key is a configured metric tag survive, which
/// bounds cardinality. Zero counts are not emitted.
pub fn project(report: &BatchReport, policy: &Policy) -> Vec<MetricSample> {
    let tag_keys = policy.metric_tag_keys();
    let mut samples = Vec::new();

    for (dimensions, counts) in &report.by_dimensions {
        let dimensions: Dimensions = dimensions
            .iter()
            .filter(|(key, _)| tag_keys.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (name, value) in [
            (METRIC_REDACTED_KEYS, counts.redacted_key_count),
            (METRIC_MASKED_VALUES, counts.masked_value_count),
            (METRIC_TRUNCATED_VALUES, counts.truncated_value_count),
        ] {
            if value > 0 {
                samples.push(MetricSample {
                    name,
                    value,
                    dimensions: dimensions.clone(),
                });
            }
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use crate::redaction::{RedactionCounters, SpanRedaction};

    #[test]
    fn test_project_filters_dimensions() {
        let policy = Policy::compile(&RawConfig {
            metric_tags: vec!["service.name".to_string()],
            ..RawConfig::default()
        })
        .unwrap();

        let mut counters = RedactionCounters::new();
        counters.record_redacted("user.email", false);
        counters.record_masked("ssn", false);

        let mut redaction = SpanRedaction {
            counters,
            dimensions: Dimensions::new(),
        };
        redaction
            .dimensions
            .insert("service.name".to_string(), "checkout".to_string());
        redaction
            .dimensions
            .insert("user.id".to_string(), "u-42".to_string());

        let mut report = BatchReport::new();
        report.record(redaction);

        let samples = project(&report, &policy);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, METRIC_REDACTED_KEYS);
        assert_eq!(samples[1].name, METRIC_MASKED_VALUES);
        for sample in &samples {
            assert_eq!(sample.value, 1);
            assert_eq!(sample.dimensions.len(), 1);
            assert_eq!(sample.dimensions["service.name"], "checkout");
        }
    }

    #[test]
    fn test_project_empty_report() {
        let policy = Policy::compile(&RawConfig::default()).unwrap();
        assert!(project(&BatchReport::new(), &policy).is_empty());
    }
}
