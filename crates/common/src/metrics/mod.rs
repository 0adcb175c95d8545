//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all VOC Atlas metrics
pub const METRICS_PREFIX: &str = "vocatlas";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Membership filter metrics
    describe_counter!(
        format!("{}_filter_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of subclass membership filter runs"
    );

    describe_histogram!(
        format!("{}_filter_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Membership filter latency in seconds"
    );

    describe_gauge!(
        format!("{}_filter_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of records returned by the last filter run"
    );

    // Catalog writes
    describe_counter!(
        format!("{}_records_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total catalog records created"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a membership filter run
pub fn record_filter(filter: &str, duration_secs: f64, result_count: usize) {
    counter!(
        format!("{}_filter_queries_total", METRICS_PREFIX),
        "filter" => filter.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_filter_duration_seconds", METRICS_PREFIX),
        "filter" => filter.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_filter_results_count", METRICS_PREFIX),
        "filter" => filter.to_string()
    )
    .set(result_count as f64);
}

/// Helper to record a created catalog record
pub fn record_created(resource: &str) {
    counter!(
        format!("{}_records_created_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(1);
}
