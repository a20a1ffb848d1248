//! Root endpoint handler.
//!
//! Returns API information and a list of all available routes,
//! similar to substrate-api-sidecar's root endpoint.

use crate::state::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

/// Handler for GET /
///
/// Returns API metadata and a list of all available routes.
pub async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    let routes = state.route_registry.routes();

    Json(json!({
        "docs": "https://github.com/paritytech/xcm-monitor",
        "github": "https://github.com/paritytech/xcm-monitor",
        "version": env!("CARGO_PKG_VERSION"),
        "listen": format!("{}:{}", state.config.http.bind_host, state.config.http.port),
        "routes": routes
    }))
}
