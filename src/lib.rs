//! Span Redact Core - Attribute redaction for distributed-trace spans
//!
//! This crate strips PII and secrets from span attributes before spans leave
//! a process boundary. Given a compiled policy it:
//!
//! 1. **Filters** - removes attribute keys outside the allow-set
//! 2. **Masks** - replaces values matching blocked patterns with `****`
//! 3. **Truncates** - cuts values longer than the configured limit
//!
//! and records bookkeeping counters describing what it did. A dry-run mode
//! computes the counters without touching the spans.
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `config` - Raw processor configuration
//! - `policy` - Policy compilation and the immutable compiled policy
//! - `span` - Span and typed attribute model
//! - `redaction` - Per-span redaction engine and counters
//! - `pipeline` - Batch processing and processor lifecycle
//! - `metrics` - Metric projection with bounded dimensions
//! - `logging` - Structured logging with batch context
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use span_redact_core::{
//!     Attributes, LogSink, RawConfig, RedactionProcessor, Span, TracesProcessor,
//! };
//!
//! let config = RawConfig::from_json_str(r#"{"allowed_keys": ["http.method"]}"#).unwrap();
//! let processor = RedactionProcessor::new(&config, Arc::new(LogSink)).unwrap();
//! processor.start();
//!
//! let attributes: Attributes = [("http.method", "GET"), ("user.email", "a@b.com")]
//!     .into_iter()
//!     .collect();
//! let spans = processor.process(vec![Span::new("span-1", attributes)]).unwrap();
//! assert!(!spans[0].attributes.contains_key("user.email"));
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod policy;
pub mod redaction;
pub mod span;

#[cfg(feature = "python")]
mod python;

pub use config::{Limits, RawConfig, SummaryLevel};
pub use error::{ConfigError, ProcessingError};
pub use metrics::{CounterRegistry, LogSink, MetricSample, MetricsSink};
pub use pipeline::{process_batch, BatchContext, Capabilities, RedactionProcessor, TracesProcessor};
pub use policy::{Policy, BOOKKEEPING_KEYS, MASK_MARKER};
pub use redaction::{redact_span, BatchReport, Dimensions, RedactionCounters, SpanRedaction};
pub use span::{AttributeValue, Attributes, KeyValue, Span};

/// Initialize the default logger. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
