// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::Path, extract::State, http::StatusCode, response::Json};
use xcm_monitor_engine::Subscription;

use crate::state::AppState;

/// `GET /v1/subscriptions/{id}`.
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>, StatusCode> {
    state
        .switchboard
        .get(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
