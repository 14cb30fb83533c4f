//! Batch processing and the host-facing processor.
//!
//! `process_batch` runs the redaction engine over every span of a batch,
//! writes bookkeeping attributes and aggregates counters.
//! `RedactionProcessor` wraps it in the lifecycle a trace pipeline expects:
//! construct, start, process (repeatedly, possibly concurrently), shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{RawConfig, SummaryLevel};
use crate::error::{ConfigError, ProcessingError, ERR_TRACE_PROCESSING};
use crate::metrics::{project, MetricsSink};
use crate::policy::Policy;
use crate::redaction::{redact_span, BatchReport};
use crate::span::{decode_batch, encode_batch, Span};
use crate::{log_debug, log_info, log_warn};

use super::context::BatchContext;

/// What a processor may do to the data it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub mutates_data: bool,
}

/// Narrow interface a trace pipeline drives.
pub trait TracesProcessor: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Signal readiness. Idempotent.
    fn start(&self);

    /// Process one batch, returning the same spans in the same order.
    fn process(&self, batch: Vec<Span>) -> Result<Vec<Span>, ProcessingError>;

    /// Stop accepting batches. Idempotent.
    fn shutdown(&self);
}

/// Redact every span in a batch, in order.
///
/// Bookkeeping attributes are written unless the policy is in dry run or
/// the summary level is `silent`.
pub fn process_batch(policy: &Policy, ctx: &BatchContext, spans: &mut [Span]) -> BatchReport {
    let write_back = !policy.dry_run() && policy.summary_level() != SummaryLevel::Silent;
    let mut report = BatchReport::new();

    for span in spans.iter_mut() {
        let span_ctx = ctx.span_context(span.log_id());
        let redaction = redact_span(policy, span, &span_ctx);

        if write_back {
            redaction
                .counters
                .write_bookkeeping(&mut span.attributes, policy.summary_level());
        }

        report.record(redaction);
    }

    report
}

/// Redaction processor registered with a trace pipeline.
pub struct RedactionProcessor {
    policy: Arc<Policy>,
    sink: Arc<dyn MetricsSink>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl RedactionProcessor {
    /// Compile the configuration and build a processor.
    pub fn new(config: &RawConfig, sink: Arc<dyn MetricsSink>) -> Result<Self, ConfigError> {
        let policy = Policy::compile(config).map_err(|e| {
            log::error!(
                "PROCESSOR_CREATE_FAILED code={} error={}",
                e.code(),
                e
            );
            e
        })?;
        Ok(Self::with_policy(Arc::new(policy), sink))
    }

    /// Build a processor around an already compiled policy.
    pub fn with_policy(policy: Arc<Policy>, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            policy,
            sink,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Process a batch and also return the aggregate counters.
    pub fn process_with_report(
        &self,
        batch: Vec<Span>,
    ) -> Result<(Vec<Span>, BatchReport), ProcessingError> {
        let ctx = BatchContext::new(batch.len());
        self.run_batch(ctx, batch)
    }

    fn run_batch(
        &self,
        ctx: BatchContext,
        mut batch: Vec<Span>,
    ) -> Result<(Vec<Span>, BatchReport), ProcessingError> {
        if self.is_stopped() {
            return Err(ProcessingError::Stopped);
        }

        let log_ctx = ctx.log_context();
        log_debug!(
            log_ctx,
            "BATCH_RECEIVED",
            spans = ctx.span_count,
            dry_run = self.policy.dry_run(),
        );

        let report = process_batch(&self.policy, &ctx, &mut batch);

        let samples = project(&report, &self.policy);
        self.sink.record(&samples);

        if report.totals.is_empty() {
            log_debug!(log_ctx, "BATCH_COMPLETE", spans = report.span_count);
        } else {
            log_info!(
                log_ctx,
                "BATCH_COMPLETE",
                spans = report.span_count,
                redacted = report.totals.redacted_key_count,
                masked = report.totals.masked_value_count,
                truncated = report.totals.truncated_value_count,
                dry_run = self.policy.dry_run(),
                elapsed_ms = ctx.elapsed_ms(),
            );
        }

        Ok((batch, report))
    }

    /// Process a JSON-encoded batch (an array of spans).
    ///
    /// Attribute values of an unexpected shape are kept in canonical string
    /// form; only a batch that is not an array of span objects is rejected.
    pub fn process_json(&self, batch_json: &str) -> Result<String, ProcessingError> {
        let mut ctx = BatchContext::new(0);
        let batch = decode_batch(batch_json).map_err(|e| {
            log_warn!(
                ctx.log_context(),
                "BATCH_DECODE_FAILED",
                code = ERR_TRACE_PROCESSING,
                error = e.to_string(),
            );
            ProcessingError::MalformedBatch(e)
        })?;
        ctx.span_count = batch.len();

        let (batch, _) = self.run_batch(ctx, batch)?;
        encode_batch(&batch).map_err(ProcessingError::Encode)
    }
}

impl TracesProcessor for RedactionProcessor {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            mutates_data: self.policy.mutates_data(),
        }
    }

    fn start(&self) {
        if !self.started.swap(true, Ordering::AcqRel) {
            log::info!(
                "PROCESSOR_STARTED fingerprint={} dry_run={} summary={}",
                self.policy.fingerprint(),
                self.policy.dry_run(),
                self.policy.summary_level()
            );
        }
    }

    fn process(&self, batch: Vec<Span>) -> Result<Vec<Span>, ProcessingError> {
        self.process_with_report(batch).map(|(batch, _)| batch)
    }

    fn shutdown(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            log::info!("PROCESSOR_SHUTDOWN fingerprint={}", self.policy.fingerprint());
        }
    }
}
