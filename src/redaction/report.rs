//! Batch-level aggregation of span redactions.

use std::collections::BTreeMap;

use serde::Serialize;

use super::counters::RedactionCounters;
use super::engine::{Dimensions, SpanRedaction};

/// Aggregate result of processing one batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub span_count: usize,
    /// Sum over all spans, key lists included at `debug`.
    pub totals: RedactionCounters,
    /// Counts (no key lists) grouped by metric dimensions.
    #[serde(skip)]
    pub by_dimensions: BTreeMap<Dimensions, RedactionCounters>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, redaction: SpanRedaction) {
        self.span_count += 1;
        self.totals.merge(&redaction.counters);
        if !redaction.counters.is_empty() {
            self.by_dimensions
                .entry(redaction.dimensions)
                .or_default()
                .merge(&redaction.counters.counts_only());
        }
    }
}
