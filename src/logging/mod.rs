//! Structured logging with batch and span context.
//!
//! Provides logging macros and utilities that include batch_id and span_id
//! in every log message for easy correlation.

pub mod structured;

pub use structured::*;
