// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::Path, extract::State, response::Json};
use xcm_monitor_engine::Subscription;

use super::error::SubscriptionApiError;
use crate::state::AppState;

/// `PUT /v1/subscriptions/{id}` -- full-descriptor replace: tears down
/// every observer leg and re-derives them from the new descriptor.
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut descriptor): Json<Subscription>,
) -> Result<Json<Subscription>, SubscriptionApiError> {
    descriptor.id = id;
    state.switchboard.update_subscription(descriptor.clone()).await?;
    Ok(Json(descriptor))
}
