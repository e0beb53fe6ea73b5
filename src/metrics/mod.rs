// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    UPSTREAM_CALLS,
    UPSTREAM_DURATION,
    IMAGE_CONVERSIONS,
};

/// Helper to record gateway request metrics
pub fn record_request(route: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[route, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[route])
        .observe(duration_secs);
}

/// Helper to record upstream call metrics
pub fn record_upstream_call(operation: &str, outcome: &str, duration_secs: f64) {
    UPSTREAM_CALLS
        .with_label_values(&[operation, outcome])
        .inc();

    UPSTREAM_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

pub fn record_image_conversion(outcome: &str) {
    IMAGE_CONVERSIONS.with_label_values(&[outcome]).inc();
}
