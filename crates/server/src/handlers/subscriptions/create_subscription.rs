// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::State, http::StatusCode, response::Json};
use xcm_monitor_engine::Subscription;

use super::error::SubscriptionApiError;
use crate::state::AppState;

/// `POST /v1/subscriptions` -- registers a new subscription descriptor
/// and begins monitoring it immediately.
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(descriptor): Json<Subscription>,
) -> Result<(StatusCode, Json<Subscription>), SubscriptionApiError> {
    state.switchboard.subscribe(descriptor.clone()).await?;
    Ok((StatusCode::CREATED, Json(descriptor)))
}
