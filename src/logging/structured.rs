//! Structured logging utilities.
//!
//! Provides context-aware logging with batch_id and span_id included
//! in every log message.

use std::fmt;

/// Logging context for a batch of spans.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub batch_id: String,
    pub span_id: Option<String>,
}

impl LogContext {
    pub fn new(batch_id: &str) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            span_id: None,
        }
    }

    pub fn with_span(&self, span_id: &str) -> Self {
        Self {
            batch_id: self.batch_id.clone(),
            span_id: Some(span_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span_id {
            Some(sid) => write!(f, "[batch={}] [span={}]", self.batch_id, sid),
            None => write!(f, "[batch={}]", self.batch_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::log::info!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::log::warn!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::log::debug!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}
