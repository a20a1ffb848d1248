// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_chains: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

/// Reports process liveness plus a coarse view of chain connectivity:
/// `connected_chains` counts configured chains with a live `BlockSource`
/// connection, `uptime` is seconds since the process started.
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "ok".to_string(),
        connected_chains: Some(state.block_source.connected_chains()),
        uptime: Some(state.started_at.elapsed().as_secs()),
    };

    (StatusCode::ACCEPTED, Json(response))
}
