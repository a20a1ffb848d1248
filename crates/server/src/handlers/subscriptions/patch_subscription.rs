// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{extract::Path, extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use std::collections::HashSet;
use xcm_monitor_engine::{EventFilter, NetworkId, SenderFilter};

use super::error::SubscriptionApiError;
use crate::state::AppState;

/// Partial update body: only the fields present are applied, each through
/// the matching `Switchboard::update_*` call.
#[derive(Debug, Default, Deserialize)]
pub struct PatchSubscriptionBody {
    pub senders: Option<SenderFilter>,
    pub destinations: Option<HashSet<NetworkId>>,
    pub events: Option<EventFilter>,
}

/// `PATCH /v1/subscriptions/{id}` -- applies whichever of `senders`,
/// `destinations`, `events` are present in the body, leaving the rest of
/// the descriptor untouched.
pub async fn patch_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatchSubscriptionBody>,
) -> Result<StatusCode, SubscriptionApiError> {
    if let Some(senders) = body.senders {
        state.switchboard.update_senders(&id, senders).await?;
    }
    if let Some(destinations) = body.destinations {
        state.switchboard.update_destinations(&id, destinations).await?;
    }
    if let Some(events) = body.events {
        state.switchboard.update_events(&id, events).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
