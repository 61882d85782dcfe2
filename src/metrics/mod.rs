//! Prometheus metrics for the messaging service.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    TextEncoder,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "courier";

lazy_static! {
    /// Total send requests by content kind (template, raw, resend)
    pub static ref SENDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sends_total", METRIC_PREFIX),
        "Total send requests",
        &["kind"]
    ).unwrap();

    /// Total adapter calls that failed
    pub static ref SEND_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_send_failures_total", METRIC_PREFIX),
        "Total delivery adapter failures"
    ).unwrap();

    /// Resend requests rejected because an attempt was already in flight
    pub static ref SEND_CONFLICTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_send_conflicts_total", METRIC_PREFIX),
        "Send requests rejected by the per-message in-flight guard"
    ).unwrap();

    /// Latency of delivery adapter calls
    pub static ref PROVIDER_SEND_LATENCY: Histogram = register_histogram!(
        format!("{}_provider_send_latency_seconds", METRIC_PREFIX),
        "Delivery adapter call latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    /// Webhook status events by outcome
    pub static ref WEBHOOK_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_webhook_events_total", METRIC_PREFIX),
        "Provider status events by reconciliation outcome",
        &["outcome"]
    ).unwrap();

    /// Current message counts by status
    pub static ref MESSAGES_BY_STATUS: IntGaugeVec = register_int_gauge_vec!(
        format!("{}_messages_by_status", METRIC_PREFIX),
        "Message counts by current status",
        &["status"]
    ).unwrap();

    /// Number of active templates
    pub static ref TEMPLATES_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_templates_active", METRIC_PREFIX),
        "Number of active message templates"
    ).unwrap();
}

/// Encode all registered metrics in Prometheus text format
pub fn encode_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    encoder.encode_to_string(&families)
}
