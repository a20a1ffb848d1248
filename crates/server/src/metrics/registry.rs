// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use lazy_static::lazy_static;
use prometheus::proto::MetricFamily;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramVec, Registry, TextEncoder, register_counter,
    register_counter_vec, register_gauge, register_histogram_vec,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new_custom(Some("xcm_monitor".to_string()), None)
        .expect("Failed to create Prometheus registry");

    pub static ref HTTP_REQUESTS: Counter = register_counter!(
        "http_requests",
        "Total number of HTTP requests"
    )
    .expect("Failed to create http_requests counter");

    pub static ref HTTP_REQUEST_SUCCESS: Counter = register_counter!(
        "http_request_success",
        "Number of successful HTTP requests"
    )
    .expect("Failed to create http_request_success counter");

    pub static ref HTTP_REQUEST_ERROR: Counter = register_counter!(
        "http_request_error",
        "Number of HTTP request errors"
    )
    .expect("Failed to create http_request_error counter");

    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "request_duration_seconds",
        "Duration of HTTP requests in seconds",
        &["method", "route", "status_code"],
        vec![0.1, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0]
    )
    .expect("Failed to create request_duration_seconds histogram");

    pub static ref RESPONSE_SIZE_BYTES: HistogramVec = register_histogram_vec!(
        "response_size_bytes",
        "Size of HTTP responses in bytes",
        &["method", "route", "status_code"],
        vec![100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0, 100000.0, 500000.0, 1000000.0, 5000000.0]
    )
    .expect("Failed to create response_size_bytes histogram");

    pub static ref RESPONSE_SIZE_BYTES_SECONDS: HistogramVec = register_histogram_vec!(
        "response_size_bytes_seconds",
        "Ratio of response size to latency",
        &["method", "route", "status_code"],
        vec![64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0, 16384.0, 32768.0, 65536.0, 131072.0, 262144.0]
    )
    .expect("Failed to create response_size_bytes_seconds histogram");

    /// Waypoint notifications emitted by the matching engine, labelled by kind
    /// (sent/received/relayed/timeout/hop).
    pub static ref WAYPOINTS_EMITTED: CounterVec = register_counter_vec!(
        "waypoints_emitted_total",
        "Total number of waypoint notifications emitted by the matching engine",
        &["kind"]
    )
    .expect("Failed to create waypoints_emitted_total counter");

    /// Current number of active subscriptions held by the switchboard.
    pub static ref SUBSCRIPTIONS_ACTIVE: Gauge = register_gauge!(
        "subscriptions_active",
        "Current number of active subscriptions"
    )
    .expect("Failed to create subscriptions_active gauge");

    /// Current number of chains with a live finalized-block connection.
    pub static ref CHAINS_CONNECTED: Gauge = register_gauge!(
        "chains_connected",
        "Current number of chains with a live block source connection"
    )
    .expect("Failed to create chains_connected gauge");

    /// Block events that looked like XCM activity but failed extraction.
    pub static ref EXTRACTOR_DECODE_ERRORS: Counter = register_counter!(
        "extractor_decode_errors_total",
        "Total number of blocks that failed to decode into chain events"
    )
    .expect("Failed to create extractor_decode_errors_total counter");
}

/// Initialize metrics by registering them with the custom registry
pub fn init() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS.clone()))
            .expect("Failed to register http_requests");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_SUCCESS.clone()))
            .expect("Failed to register http_request_success");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_ERROR.clone()))
            .expect("Failed to register http_request_error");
        REGISTRY
            .register(Box::new(REQUEST_DURATION_SECONDS.clone()))
            .expect("Failed to register request_duration_seconds");
        REGISTRY
            .register(Box::new(RESPONSE_SIZE_BYTES.clone()))
            .expect("Failed to register response_size_bytes");
        REGISTRY
            .register(Box::new(RESPONSE_SIZE_BYTES_SECONDS.clone()))
            .expect("Failed to register response_size_bytes_seconds");
        REGISTRY
            .register(Box::new(WAYPOINTS_EMITTED.clone()))
            .expect("Failed to register waypoints_emitted_total");
        REGISTRY
            .register(Box::new(SUBSCRIPTIONS_ACTIVE.clone()))
            .expect("Failed to register subscriptions_active");
        REGISTRY
            .register(Box::new(CHAINS_CONNECTED.clone()))
            .expect("Failed to register chains_connected");
        REGISTRY
            .register(Box::new(EXTRACTOR_DECODE_ERRORS.clone()))
            .expect("Failed to register extractor_decode_errors_total");
        xcm_monitor_engine::metrics::register_into(&REGISTRY)
            .expect("Failed to register engine error counters");
    });
}

/// Gather all metrics as Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Gather all metric families, for callers that want structured access
/// rather than the text exposition format.
pub fn gather_metric_families() -> Result<Vec<MetricFamily>, Box<dyn std::error::Error>> {
    Ok(REGISTRY.gather())
}
