//! Pipeline context management.
//!
//! Provides batch and span context for logging.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for a batch of spans.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub batch_id: String,
    pub received_at: DateTime<Utc>,
    pub span_count: usize,
}

impl BatchContext {
    pub fn new(span_count: usize) -> Self {
        let batch_id = format!("batch-{}", &Uuid::new_v4().to_string()[..8]);

        Self {
            batch_id,
            received_at: Utc::now(),
            span_count,
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.batch_id)
    }

    /// Log context for one span of this batch.
    pub fn span_context(&self, span_id: &str) -> LogContext {
        LogContext::new(&self.batch_id).with_span(span_id)
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.received_at).num_milliseconds()
    }
}
