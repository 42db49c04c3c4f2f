//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    BATCH_SIZE, MESSAGES_FAILED_TOTAL, MESSAGES_SENT_TOTAL, SEND_REQUESTS_TOTAL, UPSTREAM_LATENCY,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Ok,
    ValidationError,
    UpstreamError,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Ok => "ok",
            RequestOutcome::ValidationError => "validation_error",
            RequestOutcome::UpstreamError => "upstream_error",
        }
    }
}

/// Helper struct for recording push metrics
pub struct PushMetrics;

impl PushMetrics {
    /// Record the outcome of one `/send` request
    pub fn record_request(outcome: RequestOutcome) {
        SEND_REQUESTS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
    }

    /// Record the per-message counts of a completed batch
    pub fn record_batch(sent: u64, failed: u64) {
        MESSAGES_SENT_TOTAL.inc_by(sent);
        MESSAGES_FAILED_TOTAL.inc_by(failed);
        BATCH_SIZE.observe((sent + failed) as f64);
    }

    pub fn observe_upstream_latency(elapsed: Duration) {
        UPSTREAM_LATENCY.observe(elapsed.as_secs_f64());
    }
}
