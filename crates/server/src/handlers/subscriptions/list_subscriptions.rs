// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::State, response::Json};
use xcm_monitor_engine::Subscription;

use crate::state::AppState;

/// `GET /v1/subscriptions` -- every currently-monitored subscription,
/// persisted or ephemeral.
pub async fn list_subscriptions(State(state): State<AppState>) -> Json<Vec<Subscription>> {
    Json(state.switchboard.list().await)
}
