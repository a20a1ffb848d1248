// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use xcm_monitor_server::metrics;

#[test]
fn test_metrics_initialization() {
    metrics::init();

    let result = metrics::gather_metrics();
    assert!(result.is_ok());

    let metrics_text = result.unwrap();
    assert!(!metrics_text.is_empty());

    assert!(
        metrics_text.contains("xcm_monitor_http_requests"),
        "Should contain xcm_monitor_http_requests"
    );
    assert!(
        metrics_text.contains("xcm_monitor_http_request_success"),
        "Should contain xcm_monitor_http_request_success"
    );
    assert!(
        metrics_text.contains("xcm_monitor_http_request_error"),
        "Should contain xcm_monitor_http_request_error"
    );
}

#[test]
fn test_http_metrics_increment() {
    use xcm_monitor_server::metrics::registry::{
        HTTP_REQUEST_ERROR, HTTP_REQUEST_SUCCESS, HTTP_REQUESTS,
    };

    metrics::init();

    let initial_total = HTTP_REQUESTS.get();
    let initial_success = HTTP_REQUEST_SUCCESS.get();
    let initial_error = HTTP_REQUEST_ERROR.get();

    HTTP_REQUESTS.inc();
    HTTP_REQUEST_SUCCESS.inc();
    HTTP_REQUEST_ERROR.inc();

    assert_eq!(HTTP_REQUESTS.get(), initial_total + 1.0);
    assert_eq!(HTTP_REQUEST_SUCCESS.get(), initial_success + 1.0);
    assert_eq!(HTTP_REQUEST_ERROR.get(), initial_error + 1.0);
}

#[test]
fn test_waypoint_counter_has_kind_label() {
    use xcm_monitor_server::metrics::registry::WAYPOINTS_EMITTED;

    metrics::init();
    WAYPOINTS_EMITTED.with_label_values(&["sent"]).inc();

    let metrics_text = metrics::gather_metrics().unwrap();
    assert!(metrics_text.contains("xcm_monitor_waypoints_emitted_total"));
    assert!(metrics_text.contains("kind=\"sent\""));
}

#[test]
fn test_histogram_metrics() {
    use xcm_monitor_server::metrics::registry::REQUEST_DURATION_SECONDS;

    metrics::init();

    REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/v1/health", "200"])
        .observe(0.5);

    REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/v1/version", "200"])
        .observe(1.2);

    let metrics_text = metrics::gather_metrics().unwrap();
    assert!(metrics_text.contains("xcm_monitor_request_duration_seconds"));
    assert!(metrics_text.contains("bucket"));
}
