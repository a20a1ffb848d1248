// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::{
    handlers::subscriptions,
    routes::{API_VERSION, RegisterRoute, RouteRegistry},
    state::AppState,
};

/// Subscription CRUD surface backing the switchboard: create, inspect,
/// replace, remove, and patch individual filter fields on a running
/// subscription without tearing it down first.
pub fn routes(registry: &RouteRegistry) -> Router<AppState> {
    Router::new()
        .route_registered(
            registry,
            API_VERSION,
            "/subscriptions",
            "get",
            get(subscriptions::list_subscriptions),
        )
        .route_registered(
            registry,
            API_VERSION,
            "/subscriptions",
            "post",
            post(subscriptions::create_subscription),
        )
        .route_registered(
            registry,
            API_VERSION,
            "/subscriptions/:id",
            "get",
            get(subscriptions::get_subscription),
        )
        .route_registered(
            registry,
            API_VERSION,
            "/subscriptions/:id",
            "put",
            put(subscriptions::update_subscription),
        )
        .route_registered(
            registry,
            API_VERSION,
            "/subscriptions/:id",
            "delete",
            delete(subscriptions::delete_subscription),
        )
        .route_registered(
            registry,
            API_VERSION,
            "/subscriptions/:id",
            "patch",
            patch(subscriptions::patch_subscription),
        )
}
