// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::Path, extract::State, http::StatusCode};

use super::error::SubscriptionApiError;
use crate::state::AppState;

/// `DELETE /v1/subscriptions/{id}` -- idempotent; always succeeds,
/// whether or not `id` was known.
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, SubscriptionApiError> {
    state.switchboard.unsubscribe(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
