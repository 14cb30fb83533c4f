//! Redaction policy module.
//!
//! - `model` - the immutable compiled policy and bookkeeping key names
//! - `compiler` - turns a `RawConfig` into a validated `Policy`

pub mod compiler;
pub mod model;

pub use compiler::*;
pub use model::*;
