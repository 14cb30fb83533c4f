//! Span records handed to the processor by the host.

use serde::{Deserialize, Serialize};

use super::attributes::Attributes;

/// A unit of trace telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub name: String,
    pub attributes: Attributes,
}

impl Span {
    pub fn new(span_id: &str, attributes: Attributes) -> Self {
        Self {
            span_id: span_id.to_string(),
            attributes,
            ..Self::default()
        }
    }

    /// Identifier used in log lines.
    pub fn log_id(&self) -> &str {
        if self.span_id.is_empty() {
            "unknown"
        } else {
            &self.span_id
        }
    }
}

/// Decode a JSON array of spans.
pub fn decode_batch(json: &str) -> Result<Vec<Span>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Encode spans as a JSON array.
pub fn encode_batch(spans: &[Span]) -> Result<String, serde_json::Error> {
    serde_json::to_string(spans)
}
