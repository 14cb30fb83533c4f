//! Metric sinks.
//!
//! Batches may be processed concurrently, so sinks must accept samples from
//! several threads at once.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::redaction::Dimensions;

use super::projection::MetricSample;

/// Receives projected samples from the processor.
pub trait MetricsSink: Send + Sync {
    fn record(&self, samples: &[MetricSample]);
}

/// Writes every sample to the log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn record(&self, samples: &[MetricSample]) {
        for sample in samples {
            log::debug!(
                "METRIC_SAMPLE name={} value={} dimensions={:?}",
                sample.name,
                sample.value,
                sample.dimensions
            );
        }
    }
}

/// Cumulative counters keyed by metric name and dimensions.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    totals: Mutex<BTreeMap<(String, Dimensions), u64>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for one metric and dimension set.
    pub fn get(&self, name: &str, dimensions: &Dimensions) -> u64 {
        self.totals
            .lock()
            .get(&(name.to_string(), dimensions.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of a metric across all dimension sets.
    pub fn total(&self, name: &str) -> u64 {
        self.totals
            .lock()
            .iter()
            .filter(|((metric, _), _)| metric == name)
            .map(|(_, value)| *value)
            .sum()
    }

    pub fn snapshot(&self) -> Vec<(String, Dimensions, u64)> {
        self.totals
            .lock()
            .iter()
            .map(|((name, dims), value)| (name.clone(), dims.clone(), *value))
            .collect()
    }
}

impl MetricsSink for CounterRegistry {
    fn record(&self, samples: &[MetricSample]) {
        if samples.is_empty() {
            return;
        }
        let mut totals = self.totals.lock();
        for sample in samples {
            *totals
                .entry((sample.name.to_string(), sample.dimensions.clone()))
                .or_insert(0) += sample.value;
        }
    }
}
