//! Metrics module.
//!
//! Projects batch redaction counts onto metric samples whose dimensions are
//! limited to the configured metric tag keys, and hands them to a sink.

pub mod projection;
pub mod sink;

pub use projection::*;
pub use sink::*;
