//! Span model.
//!
//! The minimal view of a trace span the redaction engine needs: identity
//! plus a typed attribute map.

pub mod attributes;
pub mod model;

pub use attributes::*;
pub use model::*;
