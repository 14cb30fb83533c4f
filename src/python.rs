//! Python bindings.
//!
//! Lets Python-hosted pipelines run the redaction engine over JSON-encoded
//! span batches.

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::RawConfig;
use crate::metrics::LogSink;
use crate::pipeline::RedactionProcessor;
use crate::span::{decode_batch, encode_batch};

/// Redact a batch of spans.
///
/// # Arguments
/// * `config_json` - Processor configuration document
/// * `spans_json` - JSON array of spans
///
/// # Returns
/// (redacted spans as JSON, dict of aggregate counters)
#[pyfunction]
fn redact_batch(py: Python<'_>, config_json: &str, spans_json: &str) -> PyResult<(String, Py<PyAny>)> {
    crate::init_logger();

    let config =
        RawConfig::from_json_str(config_json).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let processor = RedactionProcessor::new(&config, Arc::new(LogSink))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let spans = decode_batch(spans_json).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let (spans, report) = processor
        .process_with_report(spans)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let encoded = encode_batch(&spans).map_err(|e| PyValueError::new_err(e.to_string()))?;

    let counters = PyDict::new(py);
    counters.set_item("span_count", report.span_count)?;
    counters.set_item("redacted_key_count", report.totals.redacted_key_count)?;
    counters.set_item("masked_value_count", report.totals.masked_value_count)?;
    counters.set_item("truncated_value_count", report.totals.truncated_value_count)?;
    counters.set_item("redacted_keys", report.totals.redacted_keys)?;
    counters.set_item("masked_values", report.totals.masked_values)?;
    counters.set_item("truncated_values", report.totals.truncated_values)?;

    Ok((encoded, counters.into()))
}

/// Python module definition
#[pymodule]
fn span_redact_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(redact_batch, m)?)?;
    Ok(())
}
