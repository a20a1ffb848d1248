// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{logging::http_logger_middleware, routes, state::AppState};
use axum::{Router, middleware, routing::get};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub fn create_app(state: AppState) -> Router {
    let request_limit = state.config.http.request_limit;
    let metrics_enabled = state.config.metrics.enabled;
    let registry = &state.route_registry;

    let v1_routes = Router::new()
        .route("/", get(routes::root::root_handler))
        .merge(routes::health::routes(registry))
        .merge(routes::version::routes(registry))
        .merge(routes::capabilities::routes(registry))
        .merge(routes::subscriptions::routes(registry))
        .with_state(state.clone());

    let v1_routes = if metrics_enabled {
        v1_routes.layer(middleware::from_fn_with_state(
            state.clone(),
            crate::metrics::metrics_middleware,
        ))
    } else {
        v1_routes
    };

    let mut app = Router::new().nest("/v1", v1_routes);

    if metrics_enabled {
        app = app.merge(routes::metrics::routes());
    }

    app.layer(middleware::from_fn(http_logger_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(request_limit))
        .with_state(state)
}
