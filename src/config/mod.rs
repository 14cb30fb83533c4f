//! Configuration module.
//!
//! Raw, user-facing processor configuration as read from JSON. Validation
//! happens when the configuration is compiled into a `Policy`.

pub mod raw;

pub use raw::*;
