//! Pipeline orchestration module.
//!
//! Batch processing and the processor lifecycle a trace pipeline drives:
//! - Batch context for log correlation
//! - Per-span redaction and bookkeeping write-back
//! - Counter aggregation and metric projection

pub mod context;
pub mod processor;

pub use context::*;
pub use processor::*;
