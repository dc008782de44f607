use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static LOOKUP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "restaurant_lookup_requests_total",
        "Restaurant lookup requests by operation",
        &["operation"]
    )
    .expect("register lookup_requests_total")
});

pub static LOOKUP_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "restaurant_lookup_failures_total",
        "Restaurant lookup requests that returned an error",
        &["operation"]
    )
    .expect("register lookup_failures_total")
});

pub static LOOKUP_RESULTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "restaurant_lookup_results_total",
        "Restaurants returned across all searches"
    )
    .expect("register lookup_results_total")
});

pub static LOOKUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "restaurant_lookup_duration_seconds",
        "Service call duration in seconds",
        &["operation"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("register lookup_duration")
});

/// Counts one call of `operation` and returns a timer observing its duration when dropped.
pub fn start(operation: &str) -> prometheus::HistogramTimer {
    LOOKUP_REQUESTS_TOTAL.with_label_values(&[operation]).inc();
    LOOKUP_DURATION.with_label_values(&[operation]).start_timer()
}

pub fn record_results(count: usize) {
    LOOKUP_RESULTS_TOTAL.inc_by(count as u64);
}

pub fn record_failure(operation: &str) {
    LOOKUP_FAILURES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
