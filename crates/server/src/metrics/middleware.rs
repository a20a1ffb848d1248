// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use std::time::Instant;

use crate::state::AppState;

use super::registry::{
    HTTP_REQUEST_ERROR, HTTP_REQUEST_SUCCESS, HTTP_REQUESTS, REQUEST_DURATION_SECONDS,
    RESPONSE_SIZE_BYTES, RESPONSE_SIZE_BYTES_SECONDS, WAYPOINTS_EMITTED,
};

/// Normalize a route path for use as a metric label, folding in sorted
/// query parameter names (values blanked) when enabled. Used as a
/// fallback when axum's `MatchedPath` isn't available (e.g. 404s).
///
/// If include_query_params is true and query_string is provided, appended
/// query parameter names (sorted, values blanked) are folded into the label.
fn normalize_route(path: &str, query_string: Option<&str>, include_query_params: bool) -> String {
    let mut normalized = path.to_string();

    if include_query_params
        && let Some(query) = query_string
        && !query.is_empty()
    {
        let mut params: Vec<String> = query
            .split('&')
            .filter_map(|pair| pair.split('=').next().map(|name| name.to_string()))
            .collect();
        params.sort();

        let query_params = params
            .iter()
            .map(|name| format!("{}=<?>", name))
            .collect::<Vec<_>>()
            .join("&");

        normalized = format!("{}?{}", normalized, query_params);
    }

    normalized
}

/// Metrics middleware for tracking HTTP requests
pub async fn metrics_middleware(
    State(state): State<AppState>,
    matched_path: Option<MatchedPath>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path();
    if path == "/metrics" || path == "/metrics.json" {
        return Ok(next.run(req).await);
    }

    HTTP_REQUESTS.inc();

    let start = Instant::now();
    let method = req.method().to_string();
    let query_string = req.uri().query();
    let include_query_params = state.config.metrics.include_queryparams;

    let route = matched_path
        .as_ref()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| normalize_route(path, query_string, include_query_params));

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status();
    let status_code = status.as_u16().to_string();

    if status.is_client_error() || status.is_server_error() {
        HTTP_REQUEST_ERROR.inc();
    } else if status.is_success() {
        HTTP_REQUEST_SUCCESS.inc();
    }

    REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &route, &status_code])
        .observe(duration);

    let (parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let response_size = bytes.len() as f64;

    if response_size > 0.0 {
        RESPONSE_SIZE_BYTES
            .with_label_values(&[&method, &route, &status_code])
            .observe(response_size);

        if duration > 0.0 {
            let ratio = response_size / duration;
            RESPONSE_SIZE_BYTES_SECONDS
                .with_label_values(&[&method, &route, &status_code])
                .observe(ratio);
        }
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

/// Records one waypoint notification against the `waypoints_emitted_total`
/// counter, labelled by kind. Called from the webhook notifier so emission
/// counts reflect what actually left the process, not just what the engine
/// computed internally.
pub fn record_waypoint_emitted(kind: &str) {
    WAYPOINTS_EMITTED.with_label_values(&[kind]).inc();
}
