// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use xcm_monitor_engine::WaypointKind;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub chains: Vec<String>,
    pub waypoint_kinds: Vec<WaypointKind>,
}

/// Reports which chains this instance is configured to watch and which
/// waypoint kinds it knows how to emit, so a client can validate a
/// subscription descriptor before submitting it.
pub async fn get_capabilities(State(state): State<AppState>) -> (StatusCode, Json<CapabilitiesResponse>) {
    let chains = state
        .config
        .chains
        .urls
        .iter()
        .map(|chain| chain.network_id.clone())
        .collect();

    let response = CapabilitiesResponse {
        chains,
        waypoint_kinds: vec![
            WaypointKind::Sent,
            WaypointKind::Received,
            WaypointKind::Relayed,
            WaypointKind::Timeout,
            WaypointKind::Hop,
        ],
    };

    (StatusCode::OK, Json(response))
}
