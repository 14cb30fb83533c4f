//! Redaction module.
//!
//! - `counters` - per-span and per-batch bookkeeping of what was redacted
//! - `engine` - the per-span filter, mask and truncate algorithm
//! - `report` - batch aggregate grouped by metric dimensions

pub mod counters;
pub mod engine;
pub mod report;

pub use counters::*;
pub use engine::*;
pub use report::*;
