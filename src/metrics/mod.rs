//! Prometheus metrics for the push gateway.
//!
//! - Send request outcomes (ok, validation error, upstream error)
//! - Per-message delivery counts
//! - Batch size and upstream batch latency

mod helpers;

pub use helpers::{encode_metrics, PushMetrics, RequestOutcome};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "fcm_gateway";

lazy_static! {
    /// `/send` requests by outcome
    pub static ref SEND_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_send_requests_total", METRIC_PREFIX),
        "Total send requests by outcome",
        &["outcome"]
    ).unwrap();

    /// Messages accepted by FCM
    pub static ref MESSAGES_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_sent_total", METRIC_PREFIX),
        "Total messages accepted by FCM"
    ).unwrap();

    /// Messages rejected by FCM
    pub static ref MESSAGES_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Total messages rejected by FCM or lost in transport"
    ).unwrap();

    /// Recipients per batch
    pub static ref BATCH_SIZE: Histogram = register_histogram!(
        format!("{}_batch_size", METRIC_PREFIX),
        "Number of recipients per batch",
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0]
    ).unwrap();

    /// Wall time of one upstream batch-send
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        format!("{}_upstream_latency_seconds", METRIC_PREFIX),
        "Upstream batch-send latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
}
